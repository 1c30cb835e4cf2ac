//! Command extraction from free-form transcripts

use crate::entities::{Quantity, Unit};
use crate::negative::NegativeSenseDetector;
use crate::Command;
use tracing::debug;

/// Words that trigger a calculation (short and long form).
pub const CALCULATE_KEYWORDS: &[&str] = &["计算", "计算角度"];

/// Result of extracting a command
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// The recognised command
    pub command: Command,
    /// Transcript the command was extracted from
    pub text: String,
    /// The quantity the command was built from, if any
    pub quantity: Option<Quantity>,
}

/// The command shapes, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Distance,
    Angle,
    Calculate,
}

/// First match wins: a transcript naming both a distance and an angle only
/// yields the distance.
pub const MATCH_ORDER: [Matcher; 3] = [Matcher::Distance, Matcher::Angle, Matcher::Calculate];

/// Turns transcripts into [`Command`]s.
#[derive(Debug, Clone, Default)]
pub struct CommandExtractor {
    negative: NegativeSenseDetector,
}

impl CommandExtractor {
    pub fn new(negative: NegativeSenseDetector) -> Self {
        Self { negative }
    }

    /// Extract at most one command from `transcript`.
    pub fn extract(&self, transcript: &str) -> Option<Command> {
        self.parse(transcript).map(|r| r.command)
    }

    /// Like [`extract`](Self::extract) but keeps the matched quantity.
    pub fn parse(&self, transcript: &str) -> Option<ParseResult> {
        let text = transcript.trim();
        let found = MATCH_ORDER
            .iter()
            .find_map(|matcher| self.try_match(*matcher, text));
        if found.is_none() {
            debug!(transcript = text, "no command recognised");
        }
        found
    }

    fn try_match(&self, matcher: Matcher, text: &str) -> Option<ParseResult> {
        let (command, quantity) = match matcher {
            Matcher::Distance => {
                let quantity = Quantity::new(find_quantity(text, Unit::Meters)?, Unit::Meters);
                let command = Command::SetDistance {
                    meters: quantity.value,
                };
                (command, Some(quantity))
            }
            Matcher::Angle => {
                let quantity = Quantity::new(find_quantity(text, Unit::Degrees)?, Unit::Degrees);
                let degrees = if self.negative.is_negative(text) {
                    -quantity.value.abs()
                } else {
                    quantity.value
                };
                (Command::SetAngle { degrees }, Some(quantity))
            }
            Matcher::Calculate => {
                if !CALCULATE_KEYWORDS.iter().any(|k| text.contains(k)) {
                    return None;
                }
                (Command::TriggerCalculation, None)
            }
        };

        debug!(
            ?matcher,
            command = command.name(),
            source = ?quantity.as_ref().map(|q| q.text.as_str()),
            "command matched"
        );
        Some(ParseResult {
            command,
            text: text.to_string(),
            quantity,
        })
    }
}

fn is_run_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '零' | '一' | '二' | '两' | '三' | '四' | '五' | '六' | '七' | '八' | '九' | '十' | '百' | '千' | '万')
}

fn is_fraction_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '零' | '一' | '二' | '两' | '三' | '四' | '五' | '六' | '七' | '八' | '九')
}

/// Locate the leftmost numeral expression directly followed (modulo
/// whitespace) by a marker of `unit`.
///
/// An expression is either a run of Chinese digits/units and Arabic digits with
/// an optional `点` fraction, or an Arabic decimal `\d+\.\d+`.
pub fn find_quantity(text: &str, unit: Unit) -> Option<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map_or(text.len(), |(b, _)| *b);
    let char_at = |i: usize| chars.get(i).map(|(_, c)| *c);
    let scan = |from: usize, pred: fn(char) -> bool| {
        let mut end = from;
        while char_at(end).is_some_and(pred) {
            end += 1;
        }
        end
    };
    let unit_follows = |from: usize| {
        let mut i = from;
        while char_at(i).is_some_and(char::is_whitespace) {
            i += 1;
        }
        char_at(i).is_some_and(|c| unit.is_marker(c))
    };

    for start in 0..chars.len() {
        let run_end = scan(start, is_run_char);
        if run_end > start {
            if char_at(run_end) == Some('点') {
                let frac_end = scan(run_end + 1, is_fraction_char);
                if frac_end > run_end + 1 && unit_follows(frac_end) {
                    return Some(&text[byte_at(start)..byte_at(frac_end)]);
                }
            }
            if unit_follows(run_end) {
                return Some(&text[byte_at(start)..byte_at(run_end)]);
            }
        }

        let int_end = scan(start, |c| c.is_ascii_digit());
        if int_end > start && char_at(int_end) == Some('.') {
            let frac_end = scan(int_end + 1, |c| c.is_ascii_digit());
            if frac_end > int_end + 1 && unit_follows(frac_end) {
                return Some(&text[byte_at(start)..byte_at(frac_end)]);
            }
        }
    }
    None
}
