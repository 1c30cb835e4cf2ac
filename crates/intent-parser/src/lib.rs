//! Intent Parser for Voice Commands
//!
//! This crate turns speech transcriptions into structured calculator commands:
//! it parses spoken Chinese and Arabic numerals, detects a spoken negative sign
//! and finds the distance/angle/calculate command in a free-form transcript.

mod command;
mod entities;
pub mod negative;
pub mod numerals;
mod parser;

pub use command::Command;
pub use entities::{Quantity, Unit};
pub use negative::NegativeSenseDetector;
pub use numerals::NumeralToken;
pub use parser::{find_quantity, CommandExtractor, Matcher, ParseResult, CALCULATE_KEYWORDS};

/// Extract a command with the default homophone set.
pub fn parse_command(text: &str) -> Option<ParseResult> {
    CommandExtractor::default().parse(text)
}

/// Render a parse outcome for logs and the console.
pub fn describe_command(text: &str) -> String {
    match parse_command(text) {
        Some(result) => match result.quantity {
            Some(q) => format!("Parsed: {:?} (source: {})", result.command, q.text),
            None => format!("Parsed: {:?}", result.command),
        },
        None => "No command recognised".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_commands() {
        let test_cases = vec![
            ("距离150米", Command::SetDistance { meters: 150.0 }),
            ("三百五十米", Command::SetDistance { meters: 350.0 }),
            ("角度30度", Command::SetAngle { degrees: 30.0 }),
            ("付35度", Command::SetAngle { degrees: -35.0 }),
            ("计算", Command::TriggerCalculation),
        ];

        for (text, expected) in test_cases {
            let result = parse_command(text).unwrap();
            assert_eq!(result.command, expected, "{text}");
        }
    }

    #[test]
    fn test_describe_command() {
        assert_eq!(
            describe_command("距离150米"),
            "Parsed: SetDistance { meters: 150.0 } (source: 150)"
        );
        assert_eq!(describe_command("计算"), "Parsed: TriggerCalculation");
        assert_eq!(describe_command("你好"), "No command recognised");
    }
}
