use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use funding_rounds_core::ownership::build_ownership_table;
use funding_rounds_core::phases::build_phase_projection;
use funding_rounds_core::rounds::{self, DilutionInput};

use crate::input;

/// Arguments for a full dilution recalculation
#[derive(Args)]
pub struct RecalcArgs {
    /// Path to project JSON (saved-project format); stdin if omitted
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the exit cap table
#[derive(Args)]
pub struct OwnershipArgs {
    /// Path to project JSON (saved-project format); stdin if omitted
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a phase projection
#[derive(Args)]
pub struct PhaseArgs {
    /// Path to project JSON (saved-project format); stdin if omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Phase key (defaults to the project's current phase)
    #[arg(long)]
    pub phase: Option<String>,

    /// Share of EPS paid out as cash, 0-100 (defaults to the project's rate)
    #[arg(long)]
    pub distribution_rate: Option<Decimal>,
}

/// Arguments for the investor summary
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to project JSON (saved-project format); stdin if omitted
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the full project report
#[derive(Args)]
pub struct ReportArgs {
    /// Path to project JSON (saved-project format); stdin if omitted
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_recalc(args: RecalcArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = input::read_project(args.input.as_deref(), "recalc")?;
    let result = rounds::recalculate(&DilutionInput {
        capitalization: state.capitalization().clone(),
        rounds: state.inputs().to_vec(),
    });
    Ok(serde_json::to_value(result)?)
}

pub fn run_ownership(args: OwnershipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = input::read_project(args.input.as_deref(), "ownership table")?;
    let result = build_ownership_table(state.capitalization(), state.rounds());
    Ok(serde_json::to_value(result)?)
}

pub fn run_phase(args: PhaseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = input::read_project(args.input.as_deref(), "phase projection")?;
    let key = args
        .phase
        .unwrap_or_else(|| state.current_phase().to_string());
    let rate = args
        .distribution_rate
        .unwrap_or_else(|| state.distribution_rate());

    let result = build_phase_projection(
        &key,
        state.phases(),
        state.rounds(),
        state.capitalization(),
        rate,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = input::read_project(args.input.as_deref(), "investor summary")?;
    let summary = state
        .investor_summary()
        .ok_or("project has no rounds to summarise")?;
    Ok(json!({
        "result": summary,
        "markers": state.markers(),
    }))
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = input::read_project(args.input.as_deref(), "project report")?;
    Ok(serde_json::to_value(state.view())?)
}
