//! Spoken numeral parsing (Chinese positional numerals and Arabic decimals)

/// A single lexical unit of a Chinese numeral expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumeralToken {
    /// A digit value 0-9.
    Digit(u8),
    /// A positional multiplier: 10, 100, 1 000 or 10 000.
    Unit(u32),
    /// The decimal marker `点`.
    Point,
}

impl NumeralToken {
    pub fn from_char(c: char) -> Option<Self> {
        let token = match c {
            '零' => Self::Digit(0),
            '一' => Self::Digit(1),
            '二' | '两' => Self::Digit(2),
            '三' => Self::Digit(3),
            '四' => Self::Digit(4),
            '五' => Self::Digit(5),
            '六' => Self::Digit(6),
            '七' => Self::Digit(7),
            '八' => Self::Digit(8),
            '九' => Self::Digit(9),
            '0'..='9' => Self::Digit(c as u8 - b'0'),
            '十' => Self::Unit(10),
            '百' => Self::Unit(100),
            '千' => Self::Unit(1_000),
            '万' => Self::Unit(10_000),
            '点' => Self::Point,
            _ => return None,
        };
        Some(token)
    }

    pub fn is_digit(&self) -> bool {
        matches!(self, Self::Digit(_))
    }
}

/// Parse a spoken quantity expression.
///
/// Plain Arabic decimals (`150`, `1.5`) go through [`parse_arabic`], anything
/// else through [`parse_chinese`]. Malformed input yields `0.0`.
pub fn parse(expression: &str) -> f64 {
    if is_arabic(expression.trim()) {
        parse_arabic(expression)
    } else {
        parse_chinese(expression)
    }
}

/// `^\d+\.?\d*$`
pub fn is_arabic(text: &str) -> bool {
    let (int, frac) = match text.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (text, ""),
    };
    !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an Arabic decimal, ignoring any character that is neither a digit nor
/// a dot. The longest leading `digits[.digits]` prefix wins; no digits gives 0.
pub fn parse_arabic(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let int_len = cleaned.bytes().take_while(u8::is_ascii_digit).count();
    let mut end = int_len;
    if cleaned[int_len..].starts_with('.') {
        let frac_len = cleaned[int_len + 1..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if frac_len > 0 || int_len > 0 {
            end = int_len + 1 + frac_len;
        }
    }

    let number = &cleaned[..end];
    if number.bytes().any(|b| b.is_ascii_digit()) {
        number.parse::<f64>().unwrap_or(0.0)
    } else {
        0.0
    }
}

/// Parse a Chinese positional numeral such as `三十五`, `一千二百` or `二十五点八`.
///
/// A unit of higher magnitude than the previous one folds everything
/// accumulated so far (`三十五万` = (30 + 5) × 10 000); a unit of the same or
/// lower magnitude adds `digit × unit`. A unit with no digit in front of it
/// counts as one of that unit (`十` = 10) unless it is folding a non-zero total
/// (`十万` = 100 000). After `点` every digit is a fractional digit.
/// Unrecognised characters are skipped.
pub fn parse_chinese(text: &str) -> f64 {
    let mut result: f64 = 0.0;
    let mut pending: u8 = 0;
    let mut last_unit: u32 = 1;
    let mut fraction: u64 = 0;
    let mut fraction_len: i32 = 0;
    let mut in_fraction = false;

    for token in text.chars().filter_map(NumeralToken::from_char) {
        match token {
            NumeralToken::Point => in_fraction = true,
            NumeralToken::Digit(d) if in_fraction => {
                fraction = fraction.saturating_mul(10).saturating_add(u64::from(d));
                fraction_len += 1;
            }
            NumeralToken::Digit(d) => pending = d,
            NumeralToken::Unit(unit) => {
                let magnitude = f64::from(unit);
                let folding = unit > last_unit;
                let digit = match pending {
                    0 if folding && result > 0.0 => 0.0,
                    0 => 1.0,
                    d => f64::from(d),
                };
                if folding {
                    result = (result + digit) * magnitude;
                } else {
                    result += digit * magnitude;
                }
                pending = 0;
                last_unit = unit;
            }
        }
    }

    result += f64::from(pending);
    if fraction > 0 {
        result += fraction as f64 / 10f64.powi(fraction_len);
    }
    result
}
