//! Structured commands produced from transcripts

use serde::{Deserialize, Serialize};

/// A calculator command recognised in one transcript.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Set the target distance in meters
    SetDistance { meters: f64 },
    /// Set the aim angle in degrees (may be negative)
    SetAngle { degrees: f64 },
    /// Press the calculate control
    TriggerCalculation,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetDistance { .. } => "set_distance",
            Command::SetAngle { .. } => "set_angle",
            Command::TriggerCalculation => "trigger_calculation",
        }
    }

    /// The numeric payload, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Command::SetDistance { meters } => Some(*meters),
            Command::SetAngle { degrees } => Some(*degrees),
            Command::TriggerCalculation => None,
        }
    }
}
