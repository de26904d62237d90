use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Headline figures, most specific first. The first one present wins.
const HEADLINE_KEYS: [&str; 6] = [
    "final_stock_price",
    "cash_per_share",
    "exit_price",
    "final_valuation",
    "eps",
    "final_post_valuation",
];

/// Print the single headline number of a result.
///
/// Looks inside the `result` envelope (or a report's `ownership` section),
/// then falls back to the first field as `key: value`.
pub fn print_minimal(value: &Value) {
    let body = value
        .as_object()
        .and_then(|m| m.get("result").or_else(|| m.get("ownership")))
        .unwrap_or(value);

    let Value::Object(map) = body else {
        println!("{}", format_minimal(body));
        return;
    };

    let headline = HEADLINE_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null());
    match headline {
        Some(val) => println!("{}", format_minimal(val)),
        None => match map.iter().next() {
            Some((key, val)) => println!("{}: {}", key, format_minimal(val)),
            None => println!("{}", format_minimal(body)),
        },
    }
}

/// Decimal strings are shown to six places; other values as-is.
fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => match Decimal::from_str(s) {
            Ok(d) => d.round_dp(6).normalize().to_string(),
            Err(_) => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
