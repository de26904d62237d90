use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalars of an object go into one Field/Value table; arrays of objects and
/// nested objects each get their own titled table below it.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_section(None, result);
                for (key, val) in map {
                    if !is_envelope_key(key) {
                        print_section(Some(key), val);
                    }
                }
                print_envelope(map);
            } else {
                print_section(None, value);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn is_envelope_key(key: &str) -> bool {
    matches!(
        key,
        "result" | "warnings" | "methodology" | "assumptions" | "metadata"
    )
}

fn print_section(title: Option<&str>, value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(title) = title {
                println!("\n{}", title.bold());
            }
            print_object(map);
        }
        Value::Array(arr) => {
            if let Some(title) = title {
                println!("\n{}", title.bold());
            }
            print_array_table(arr);
        }
        other => match title {
            Some(title) => println!("{}: {}", title, format_value(other)),
            None => println!("{}", format_value(other)),
        },
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalars = 0;
    let mut nested = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.iter().any(Value::is_object) => nested.push((key, val)),
            Value::Object(obj) if !obj.contains_key("kind") => nested.push((key, val)),
            _ => {
                builder.push_record([key.as_str(), &format_value(val)]);
                scalars += 1;
            }
        }
    }
    if scalars > 0 {
        println!("{}", Table::from(builder));
    }
    for (key, val) in nested {
        print_section(Some(key), val);
    }
}

fn print_envelope(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow());
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        // Rows can omit optional fields, so gather headers across all of them.
        let mut headers: Vec<String> = first.keys().cloned().collect();
        for item in arr.iter().skip(1) {
            if let Value::Object(map) = item {
                for key in map.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
        }

        let mut builder = Builder::default();
        builder.push_record(&headers);
        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(map) => {
            // Tagged enums such as the cap-table holder.
            if let Some(Value::String(kind)) = map.get("kind") {
                return kind.clone();
            }
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}
