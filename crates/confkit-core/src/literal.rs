//! Scalar literal parsing
//!
//! Converts the text produced by a whole-leaf placeholder substitution into a
//! typed value. Recognized forms:
//! - `true` / `false` (lowercase only)
//! - decimal integers: `8080`, `-10`
//! - prefixed integers: `0b111010`, `0o61`, `0xF3B` (any prefix case), with an
//!   optional leading `-`
//! - decimal floats: `0.9`, `.1314`, `1.`, `2.5e-3`
//! - a double-quoted text, which is unquoted and kept as a string
//!
//! Everything else, including the empty string, stays a string.

use crate::value::Value;

/// A parsed numeric literal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// The number as f64 (integers are widened)
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(i) => Value::Integer(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// Parse a substituted text into its typed value
pub fn parse_literal(text: &str) -> Value {
    if let Some(inner) = unquote(text) {
        return Value::String(inner.to_string());
    }
    if let Some(b) = parse_bool(text) {
        return Value::Bool(b);
    }
    match parse_number(text) {
        Some(n) => n.into(),
        None => Value::String(text.to_string()),
    }
}

/// Parse `true` or `false`, exactly
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse any numeric literal, integer forms first
pub fn parse_number(text: &str) -> Option<Number> {
    parse_integer(text)
        .map(Number::Integer)
        .or_else(|| parse_float(text).map(Number::Float))
}

/// Parse a decimal or prefixed (`0b`, `0o`, `0x`) integer literal
///
/// Returns `None` for malformed input and for values outside the i64 range.
pub fn parse_integer(text: &str) -> Option<i64> {
    let (negative, body) = split_sign(text);

    let (radix, digits) = match body.get(..2) {
        Some("0b") | Some("0B") => (2, &body[2..]),
        Some("0o") | Some("0O") => (8, &body[2..]),
        Some("0x") | Some("0X") => (16, &body[2..]),
        _ => (10, body),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = i128::from(u64::from_str_radix(digits, radix).ok()?);
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).ok()
}

/// Parse a decimal float literal
///
/// Requires a fractional part or an exponent, so plain integers are left to
/// [`parse_integer`]. Words such as `inf` or `nan` are not floats here.
pub fn parse_float(text: &str) -> Option<f64> {
    let (_, body) = split_sign(text);

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };
    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (mantissa, None),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !fraction.is_none_or(all_digits) {
        return None;
    }
    if whole.is_empty() && fraction.is_none_or(str::is_empty) {
        return None;
    }
    match exponent {
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if exp.is_empty() || !all_digits(exp) {
                return None;
            }
        }
        None if fraction.is_none() => return None,
        None => {}
    }

    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

fn unquote(text: &str) -> Option<&str> {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_integers() {
        assert_eq!(parse_integer("8080"), Some(8080));
        assert_eq!(parse_integer("-10"), Some(-10));
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("0755"), Some(755));
    }

    #[test]
    fn test_parse_prefixed_integers() {
        assert_eq!(parse_integer("0b111010"), Some(58));
        assert_eq!(parse_integer("-0b111010"), Some(-58));
        assert_eq!(parse_integer("0B101"), Some(5));
        assert_eq!(parse_integer("0o61"), Some(49));
        assert_eq!(parse_integer("-0o61"), Some(-49));
        assert_eq!(parse_integer("0O17"), Some(15));
        assert_eq!(parse_integer("0xF3B"), Some(3899));
        assert_eq!(parse_integer("-0xF3B"), Some(-3899));
        assert_eq!(parse_integer("0Xff"), Some(255));
    }

    #[test]
    fn test_parse_integer_rejects_malformed() {
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("-"), None);
        assert_eq!(parse_integer("0x"), None);
        assert_eq!(parse_integer("0b102"), None);
        assert_eq!(parse_integer("0o8"), None);
        assert_eq!(parse_integer("0xG1"), None);
        assert_eq!(parse_integer("+5"), None);
        assert_eq!(parse_integer("1_000"), None);
        assert_eq!(parse_integer(" 1"), None);
        assert_eq!(parse_integer("--1"), None);
        assert_eq!(parse_integer("12ab"), None);
    }

    #[test]
    fn test_parse_integer_range() {
        assert_eq!(parse_integer("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_integer("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_integer("9223372036854775808"), None);
        assert_eq!(parse_integer("-0x8000000000000000"), Some(i64::MIN));
        assert_eq!(parse_integer("0xFFFFFFFFFFFFFFFFF"), None);
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(parse_float("0.9"), Some(0.9));
        assert_eq!(parse_float(".1314"), Some(0.1314));
        assert_eq!(parse_float("-.1314"), Some(-0.1314));
        assert_eq!(parse_float("1."), Some(1.0));
        assert_eq!(parse_float("2.5e-3"), Some(0.0025));
        assert_eq!(parse_float("1e3"), Some(1000.0));
    }

    #[test]
    fn test_parse_float_rejects_non_floats() {
        assert_eq!(parse_float("10"), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("-."), None);
        assert_eq!(parse_float("1.2.3"), None);
        assert_eq!(parse_float("127.0.0.1"), None);
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("1e"), None);
        assert_eq!(parse_float("e5"), None);
        assert_eq!(parse_float("1e999"), None);
        assert_eq!(parse_float("0x1.5"), None);
    }

    #[test]
    fn test_parse_bool_is_case_sensitive() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("True"), None);
        assert_eq!(parse_bool("1"), None);
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("8080"), Value::Integer(8080));
        assert_eq!(parse_literal("0.9"), Value::Float(0.9));
        assert_eq!(parse_literal("true"), Value::Bool(true));
        assert_eq!(parse_literal("TRUE"), Value::String("TRUE".into()));
        assert_eq!(parse_literal(""), Value::String(String::new()));
        assert_eq!(
            parse_literal("http://example.com"),
            Value::String("http://example.com".into())
        );
        assert_eq!(parse_literal("v1.2.3"), Value::String("v1.2.3".into()));
    }

    #[test]
    fn test_parse_literal_quoted_stays_string() {
        assert_eq!(parse_literal("\"8080\""), Value::String("8080".into()));
        assert_eq!(parse_literal("\"\""), Value::String(String::new()));
        assert_eq!(parse_literal("\""), Value::String("\"".into()));
    }

    #[test]
    fn test_number_as_f64() {
        assert_eq!(Number::Integer(3).as_f64(), 3.0);
        assert_eq!(parse_number("0x10"), Some(Number::Integer(16)));
        assert_eq!(parse_number("1.5"), Some(Number::Float(1.5)));
        assert_eq!(parse_number("abc"), None);
    }
}
