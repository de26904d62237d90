pub mod file;
pub mod stdin;

use serde_json::Value;

use funding_rounds_core::project::{ProjectSnapshot, ProjectState};

/// Project document from `--input` or stdin, in the saved-project format.
pub fn read_project(
    input: Option<&str>,
    command: &str,
) -> Result<ProjectState, Box<dyn std::error::Error>> {
    let value: Value = if let Some(path) = input {
        file::read_json_value(path)?
    } else if let Some(data) = stdin::read_stdin()? {
        data
    } else {
        return Err(format!("--input <project.json> or stdin required for {}", command).into());
    };
    Ok(ProjectSnapshot::from_json(&value)?.into_state())
}
