//! Quantities located in a transcript

use serde::{Deserialize, Serialize};

/// Units a spoken quantity can be anchored by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Meters,
    Degrees,
}

impl Unit {
    /// Characters that mark the end of a quantity in this unit.
    pub fn markers(&self) -> &'static [char] {
        match self {
            Unit::Meters => &['米'],
            Unit::Degrees => &['度', '°'],
        }
    }

    pub fn is_marker(&self, c: char) -> bool {
        self.markers().contains(&c)
    }
}

/// A numeral expression found in front of a unit marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// The expression as it appeared in the transcript
    pub text: String,
    /// Parsed magnitude (sign not yet applied)
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(text: &str, unit: Unit) -> Self {
        Self {
            text: text.to_string(),
            value: crate::numerals::parse(text),
            unit,
        }
    }
}
