use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;
use serde_json::Value;

use funding_rounds_core::coerce;
use funding_rounds_core::ownership::build_ownership_table;
use funding_rounds_core::phases::build_phase_projection;
use funding_rounds_core::project::{ProjectSnapshot, ProjectState};
use funding_rounds_core::rounds::{recalculate, DilutionInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse a project in the saved-project format.
fn parse_project(project_json: &str) -> NapiResult<ProjectState> {
    let value: Value = serde_json::from_str(project_json).map_err(to_napi_error)?;
    let snapshot = ProjectSnapshot::from_json(&value).map_err(to_napi_error)?;
    Ok(snapshot.into_state())
}

/// Optional overrides for a phase projection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhaseRequest {
    phase: Option<String>,
    /// Number or numeric string.
    distribution_rate: Option<Value>,
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

#[napi]
pub fn recalculate_rounds(project_json: String) -> NapiResult<String> {
    let state = parse_project(&project_json)?;
    let output = recalculate(&DilutionInput {
        capitalization: state.capitalization().clone(),
        rounds: state.inputs().to_vec(),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Re-save a project: repaired ids, recomputed cached fields, fresh timestamp.
#[napi]
pub fn normalize_project(project_json: String) -> NapiResult<String> {
    let state = parse_project(&project_json)?;
    ProjectSnapshot::from_state(&state)
        .to_json_string()
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Ownership and phases
// ---------------------------------------------------------------------------

#[napi]
pub fn ownership_table(project_json: String) -> NapiResult<String> {
    let state = parse_project(&project_json)?;
    let output = build_ownership_table(state.capitalization(), state.rounds());
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// `request_json` may name a `phase` and a `distributionRate`; the project's
/// own settings are used for whatever it omits.
#[napi]
pub fn project_phase(project_json: String, request_json: Option<String>) -> NapiResult<String> {
    let state = parse_project(&project_json)?;
    let request: PhaseRequest = match request_json {
        Some(text) if !text.trim().is_empty() => {
            serde_json::from_str(&text).map_err(to_napi_error)?
        }
        _ => PhaseRequest::default(),
    };

    let key = request
        .phase
        .unwrap_or_else(|| state.current_phase().to_string());
    let rate = request
        .distribution_rate
        .as_ref()
        .and_then(coerce::decimal_from_value)
        .unwrap_or_else(|| state.distribution_rate());
    let output = build_phase_projection(
        &key,
        state.phases(),
        state.rounds(),
        state.capitalization(),
        rate,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn investor_summary(project_json: String) -> NapiResult<String> {
    let state = parse_project(&project_json)?;
    let summary = state
        .investor_summary()
        .ok_or_else(|| to_napi_error("project has no rounds to summarise"))?;
    serde_json::to_string(&serde_json::json!({
        "summary": summary,
        "markers": state.markers(),
    }))
    .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Full report
// ---------------------------------------------------------------------------

#[napi]
pub fn project_report(project_json: String) -> NapiResult<String> {
    let state = parse_project(&project_json)?;
    serde_json::to_string(&state.view()).map_err(to_napi_error)
}
