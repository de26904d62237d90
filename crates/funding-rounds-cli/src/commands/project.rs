use std::path::PathBuf;

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use funding_rounds_core::project::{
    default_project, JsonFileStore, PhasePatch, ProjectSession, RoundPatch,
};
use funding_rounds_core::rounds::{Capitalization, RoundId};
use funding_rounds_core::types::Month;

use crate::input::file;

/// Project file shared by every editing command
#[derive(Args)]
pub struct ProjectFile {
    /// Path to the project file (created with the default plan if missing)
    #[arg(long, default_value = "project.json")]
    pub project: PathBuf,
}

/// Arguments for creating a project file
#[derive(Args)]
pub struct InitArgs {
    #[command(flatten)]
    pub file: ProjectFile,

    /// Project name
    #[arg(long)]
    pub name: Option<String>,

    /// Founders' shares before any round
    #[arg(long)]
    pub initial_shares: Option<u64>,

    /// Founders' price per share
    #[arg(long)]
    pub initial_price: Option<Decimal>,

    /// Overwrite an existing project file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for appending a round
#[derive(Args)]
pub struct AddRoundArgs {
    #[command(flatten)]
    pub file: ProjectFile,

    /// Round name (defaults to "Series A", "Series B", ... by id)
    #[arg(long)]
    pub name: Option<String>,

    /// Cash raised
    #[arg(long)]
    pub funding: Option<Decimal>,

    /// Percentage of the post-round company sold, 0-100
    #[arg(long)]
    pub sold: Option<Decimal>,

    /// Timing label, e.g. "Month 24"
    #[arg(long)]
    pub timing: Option<String>,
}

/// Arguments for editing a round
#[derive(Args)]
pub struct UpdateRoundArgs {
    #[command(flatten)]
    pub file: ProjectFile,

    /// Round id
    #[arg(long)]
    pub id: u64,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub funding: Option<Decimal>,

    #[arg(long)]
    pub sold: Option<Decimal>,

    /// Timing label; an empty string clears it
    #[arg(long)]
    pub timing: Option<String>,

    /// Free-text notes; an empty string clears them
    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for deleting a round
#[derive(Args)]
pub struct DeleteRoundArgs {
    #[command(flatten)]
    pub file: ProjectFile,

    /// Round id
    #[arg(long)]
    pub id: u64,
}

/// Arguments for moving a round
#[derive(Args)]
pub struct MoveRoundArgs {
    #[command(flatten)]
    pub file: ProjectFile,

    /// Round id
    #[arg(long)]
    pub id: u64,

    /// New 1-based position in the round order
    #[arg(long)]
    pub position: usize,
}

/// Arguments for re-sorting rounds by timing
#[derive(Args)]
pub struct SortRoundsArgs {
    #[command(flatten)]
    pub file: ProjectFile,
}

/// Arguments for changing the founders' capitalization
#[derive(Args)]
pub struct SetCapitalArgs {
    #[command(flatten)]
    pub file: ProjectFile,

    #[arg(long)]
    pub initial_shares: u64,

    #[arg(long)]
    pub initial_price: Decimal,
}

/// Arguments for selecting or editing a phase
#[derive(Args)]
pub struct SetPhaseArgs {
    #[command(flatten)]
    pub file: ProjectFile,

    /// Phase key, e.g. "weak" or "veryGood"
    #[arg(long)]
    pub key: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub month: Option<Month>,

    #[arg(long)]
    pub members: Option<u64>,

    /// Annual profit at this phase
    #[arg(long, allow_hyphen_values = true)]
    pub annual_profit: Option<Decimal>,

    #[arg(long)]
    pub target: Option<String>,
}

/// Arguments for setting the cash distribution rate
#[derive(Args)]
pub struct SetDistributionArgs {
    #[command(flatten)]
    pub file: ProjectFile,

    /// Share of EPS paid out as cash, 0-100
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Decimal,
}

fn open(file: &ProjectFile) -> Result<ProjectSession<JsonFileStore>, Box<dyn std::error::Error>> {
    let path = file::absolute(&file.project)?;
    let session = ProjectSession::open(JsonFileStore::new(&path)).map_err(|e| {
        format!(
            "could not read '{}' ({}); fix the file or recreate it with `rounds init --force`",
            path.display(),
            e
        )
    })?;
    Ok(session)
}

/// The session's view, or the save error if the edit could not be written.
fn finish(session: ProjectSession<JsonFileStore>) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(err) = session.last_save_error() {
        return Err(format!("project updated in memory but not saved: {}", err).into());
    }
    Ok(serde_json::to_value(session.view())?)
}

pub fn run_init(args: InitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let path = file::absolute(&args.file.project)?;
    if path.exists() && !args.force {
        return Err(format!(
            "'{}' already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    let mut state = default_project();
    if let Some(name) = args.name {
        state.rename(name);
    }
    if args.initial_shares.is_some() || args.initial_price.is_some() {
        let current = state.capitalization().clone();
        state.set_capitalization(Capitalization::new(
            args.initial_shares.unwrap_or(current.initial_shares),
            args.initial_price.unwrap_or(current.initial_price),
        )?);
    }

    let mut session = ProjectSession::with_state(state, JsonFileStore::new(path));
    session.save();
    finish(session)
}

pub fn run_add_round(args: AddRoundArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = open(&args.file)?;
    if args.name.is_none() && args.funding.is_none() && args.sold.is_none() && args.timing.is_none()
    {
        session.add_round();
    } else {
        session.add_round_with(
            args.name.as_deref().unwrap_or_default(),
            args.funding.unwrap_or(Decimal::ZERO),
            args.sold.unwrap_or(Decimal::ZERO),
            args.timing.as_deref(),
        );
    }
    finish(session)
}

pub fn run_update_round(args: UpdateRoundArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = open(&args.file)?;
    session.update_round(
        RoundId(args.id),
        RoundPatch {
            name: args.name,
            funding_amount: args.funding,
            sold_percentage: args.sold,
            timing: args.timing,
            notes: args.notes,
        },
    )?;
    finish(session)
}

pub fn run_delete_round(args: DeleteRoundArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = open(&args.file)?;
    session.delete_round(RoundId(args.id))?;
    finish(session)
}

pub fn run_move_round(args: MoveRoundArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.position == 0 {
        return Err("--position is 1-based".into());
    }
    let mut session = open(&args.file)?;
    session.move_round(RoundId(args.id), args.position - 1)?;
    finish(session)
}

pub fn run_sort_rounds(args: SortRoundsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = open(&args.file)?;
    if !session.sort_by_timing() {
        tracing::info!("rounds already in timing order");
    }
    finish(session)
}

pub fn run_set_capital(args: SetCapitalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let capitalization = Capitalization::new(args.initial_shares, args.initial_price)?;
    let mut session = open(&args.file)?;
    session.set_capitalization(capitalization);
    finish(session)
}

pub fn run_set_phase(args: SetPhaseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = open(&args.file)?;
    let patch = PhasePatch {
        name: args.name,
        month: args.month,
        members: args.members,
        annual_profit: args.annual_profit,
        target: args.target,
    };
    let has_edits = patch.name.is_some()
        || patch.month.is_some()
        || patch.members.is_some()
        || patch.annual_profit.is_some()
        || patch.target.is_some();
    if has_edits {
        session.update_phase(&args.key, patch)?;
    }
    session.set_current_phase(&args.key)?;
    finish(session)
}

pub fn run_set_distribution(
    args: SetDistributionArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = open(&args.file)?;
    session.set_distribution_rate(args.rate);
    finish(session)
}
