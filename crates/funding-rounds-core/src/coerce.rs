//! Parse-with-default helpers for the input boundary.
//!
//! Everything that arrives from a persisted snapshot or a form field passes
//! through here exactly once. Malformed values never raise: they fall back to
//! the caller's default so the engine only ever sees well-formed decimals.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::types::{Month, Shares};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Division that yields zero instead of failing when the denominator is
/// non-positive or the quotient overflows.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// `pct` percent of `value`, or zero when the product cannot be represented.
pub fn percent_of(value: Decimal, pct: Decimal) -> Decimal {
    value
        .checked_mul(pct / HUNDRED)
        .unwrap_or(Decimal::ZERO)
}

/// Percentage change from `from` to `to`.
///
/// `None` when `from` is not positive or the change overflows a `Decimal`.
pub fn percent_change(from: Decimal, to: Decimal) -> Option<Decimal> {
    if from <= Decimal::ZERO {
        return None;
    }
    to.checked_sub(from)?
        .checked_div(from)?
        .checked_mul(HUNDRED)
}

/// Round a share count to the nearest whole share, halves away from zero.
pub fn round_shares(value: Decimal) -> Shares {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse the leading numeric prefix of a string (`"12.5%"` → 12.5).
///
/// Accepts an optional sign, digits and a single decimal point. Returns
/// `None` when no digit is found before the first non-numeric character.
pub fn parse_decimal_prefix(raw: &str) -> Option<Decimal> {
    let s = raw.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return None;
    }
    let candidate = s[..end].trim_end_matches('.');
    Decimal::from_str(candidate).ok()
}

fn decimal_from_number(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Best-effort decimal from any JSON value. `None` for non-numeric input.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => decimal_from_number(n),
        Value::String(s) => parse_decimal_prefix(s),
        _ => None,
    }
}

/// Decimal from a JSON value, or `default` when missing or non-numeric.
pub fn decimal_or(value: Option<&Value>, default: Decimal) -> Decimal {
    value.and_then(decimal_from_value).unwrap_or(default)
}

/// Non-negative decimal; negative or non-numeric input becomes `default`.
pub fn non_negative_or(value: Option<&Value>, default: Decimal) -> Decimal {
    match value.and_then(decimal_from_value) {
        Some(d) if d >= Decimal::ZERO => d,
        _ => default,
    }
}

/// Strictly positive decimal; anything else becomes `default`.
pub fn positive_or(value: Option<&Value>, default: Decimal) -> Decimal {
    match value.and_then(decimal_from_value) {
        Some(d) if d > Decimal::ZERO => d,
        _ => default,
    }
}

/// Positive whole number (fractional part truncated), or `default`.
pub fn positive_u64_or(value: Option<&Value>, default: u64) -> u64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            decimal_from_number(n)
                .filter(|d| !d.is_sign_negative())
                .and_then(|d| u64::from_str(&d.trunc().to_string()).ok())
        }),
        Some(Value::String(s)) => parse_decimal_prefix(s).and_then(|d| {
            if d.is_sign_negative() {
                None
            } else {
                u64::from_str(&d.trunc().to_string()).ok()
            }
        }),
        _ => None,
    };
    match parsed {
        Some(n) if n > 0 => n,
        _ => default,
    }
}

/// Trimmed, non-empty string from a JSON value.
///
/// Numbers are accepted and rendered as text, so `"timing": 12` survives.
pub fn text_or_none(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// JSON number for a decimal: an integer when the value is whole, otherwise
/// the nearest `f64`.
pub fn decimal_to_json(value: Decimal) -> Value {
    if value.fract().is_zero() {
        if let Some(i) = value.to_i64() {
            return Value::from(i);
        }
    }
    value.to_f64().map(Value::from).unwrap_or(Value::Null)
}

/// Extract the month encoded in a free-text timing label.
///
/// The first run of ASCII digits wins: `"Month 11"` → 11, `"M12 / Q4"` → 12.
/// Labels without digits, or with a number too large for a month, yield `None`.
pub fn parse_timing_month(timing: &str) -> Option<Month> {
    let start = timing.find(|c: char| c.is_ascii_digit())?;
    let digits: &str = timing[start..]
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or_default();
    Month::from_str(digits).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_safe_div_zero_denominator() {
        assert_eq!(safe_div(dec!(100), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_div(dec!(100), dec!(-5)), Decimal::ZERO);
        assert_eq!(safe_div(dec!(100), dec!(4)), dec!(25));
    }

    #[test]
    fn test_safe_div_overflow_yields_zero() {
        assert_eq!(safe_div(Decimal::MAX, dec!(0.0001)), Decimal::ZERO);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec!(0.124254), dec!(50)), dec!(0.062127));
        assert_eq!(percent_of(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percent_of(Decimal::MAX, dec!(200)), Decimal::ZERO);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(dec!(2), dec!(3)), Some(dec!(50)));
        assert_eq!(percent_change(dec!(4), dec!(1)), Some(dec!(-75)));
        assert_eq!(percent_change(Decimal::ZERO, dec!(3)), None);
        // Near-zero start price: the ratio fits but times 100 does not.
        assert_eq!(percent_change(dec!(0.00000000000000000000000009), dec!(405)), None);
    }

    #[test]
    fn test_round_shares_half_away_from_zero() {
        assert_eq!(round_shares(dec!(1052631.5789)), dec!(1052632));
        assert_eq!(round_shares(dec!(2.5)), dec!(3));
        assert_eq!(round_shares(dec!(3.5)), dec!(4));
        assert_eq!(round_shares(dec!(7.49)), dec!(7));
    }

    #[test]
    fn test_decimal_prefix_parsing() {
        assert_eq!(parse_decimal_prefix("12abc"), Some(dec!(12)));
        assert_eq!(parse_decimal_prefix("  12.5%"), Some(dec!(12.5)));
        assert_eq!(parse_decimal_prefix("-3"), Some(dec!(-3)));
        assert_eq!(parse_decimal_prefix("7."), Some(dec!(7)));
        assert_eq!(parse_decimal_prefix("abc"), None);
        assert_eq!(parse_decimal_prefix(""), None);
        assert_eq!(parse_decimal_prefix("-"), None);
    }

    #[test]
    fn test_decimal_or_defaults() {
        assert_eq!(decimal_or(Some(&json!(60000)), Decimal::ZERO), dec!(60000));
        assert_eq!(decimal_or(Some(&json!(0.05)), Decimal::ZERO), dec!(0.05));
        assert_eq!(decimal_or(Some(&json!("15")), Decimal::ZERO), dec!(15));
        assert_eq!(decimal_or(Some(&json!(null)), dec!(7)), dec!(7));
        assert_eq!(decimal_or(Some(&json!(true)), dec!(7)), dec!(7));
        assert_eq!(decimal_or(Some(&json!([1, 2])), dec!(7)), dec!(7));
        assert_eq!(decimal_or(None, dec!(7)), dec!(7));
    }

    #[test]
    fn test_non_negative_and_positive() {
        assert_eq!(non_negative_or(Some(&json!(-10)), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(non_negative_or(Some(&json!(0)), dec!(5)), Decimal::ZERO);
        assert_eq!(positive_or(Some(&json!(0)), dec!(0.05)), dec!(0.05));
        assert_eq!(positive_or(Some(&json!(0.1)), dec!(0.05)), dec!(0.1));
    }

    #[test]
    fn test_positive_u64_or() {
        assert_eq!(positive_u64_or(Some(&json!(1_000_000)), 1), 1_000_000);
        assert_eq!(positive_u64_or(Some(&json!(2500.9)), 1), 2500);
        assert_eq!(positive_u64_or(Some(&json!("42 shares")), 1), 42);
        assert_eq!(positive_u64_or(Some(&json!(0)), 99), 99);
        assert_eq!(positive_u64_or(Some(&json!(-5)), 99), 99);
        assert_eq!(positive_u64_or(Some(&json!("x")), 99), 99);
    }

    #[test]
    fn test_text_or_none() {
        assert_eq!(text_or_none(Some(&json!("  Month 3 "))), Some("Month 3".into()));
        assert_eq!(text_or_none(Some(&json!(12))), Some("12".into()));
        assert_eq!(text_or_none(Some(&json!(""))), None);
        assert_eq!(text_or_none(Some(&json!(null))), None);
        assert_eq!(text_or_none(None), None);
    }

    #[test]
    fn test_decimal_to_json() {
        assert_eq!(decimal_to_json(dec!(60000)), json!(60000));
        assert_eq!(decimal_to_json(dec!(60000.00)), json!(60000));
        assert_eq!(decimal_to_json(dec!(0.05)), json!(0.05));
    }

    #[test]
    fn test_parse_timing_month() {
        assert_eq!(parse_timing_month("Month 11"), Some(11));
        assert_eq!(parse_timing_month("12"), Some(12));
        assert_eq!(parse_timing_month("M36 (Q4 2027)"), Some(36));
        assert_eq!(parse_timing_month("Founding"), None);
        assert_eq!(parse_timing_month(""), None);
        assert_eq!(parse_timing_month("99999999999999999999"), None);
    }
}
