use serde_json::Value;
use std::io::{self, Read};

/// JSON piped on stdin. `None` when stdin is a terminal or blank.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Ok(None);
    }

    let value = serde_json::from_str(buffer.trim())
        .map_err(|e| format!("Failed to parse JSON from stdin: {}", e))?;
    tracing::debug!(bytes = buffer.len(), "read project from stdin");
    Ok(Some(value))
}
