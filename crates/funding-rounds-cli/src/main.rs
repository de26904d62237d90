mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analysis::{OwnershipArgs, PhaseArgs, RecalcArgs, ReportArgs, SummaryArgs};
use commands::project::{
    AddRoundArgs, DeleteRoundArgs, InitArgs, MoveRoundArgs, SetCapitalArgs, SetDistributionArgs,
    SetPhaseArgs, SortRoundsArgs, UpdateRoundArgs,
};

/// Sequential funding-round dilution and investor-return modelling
#[derive(Parser)]
#[command(
    name = "rounds",
    version,
    about = "Sequential funding-round dilution and investor-return modelling",
    long_about = "A CLI for modelling a startup's funding rounds with decimal precision. \
                  Recomputes dilution, valuations and share prices across the round \
                  sequence, builds the exit cap table, and projects per-share returns \
                  at each growth phase."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine decisions to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recalculate every round of a project
    Recalc(RecalcArgs),
    /// Exit cap table at the last round's valuation
    Ownership(OwnershipArgs),
    /// Per-share cash and reinvestment at a growth phase
    Phase(PhaseArgs),
    /// Entry/exit prices and phase markers for investors
    Summary(SummaryArgs),
    /// Rounds, cap table, projection and summary in one document
    Report(ReportArgs),
    /// Create a project file with the default plan
    Init(InitArgs),
    /// Append a round to a project file
    AddRound(AddRoundArgs),
    /// Edit a round in a project file
    UpdateRound(UpdateRoundArgs),
    /// Delete a round from a project file
    DeleteRound(DeleteRoundArgs),
    /// Move a round to another position
    MoveRound(MoveRoundArgs),
    /// Reorder rounds by the month in their timing
    SortRounds(SortRoundsArgs),
    /// Change the founders' shares and price
    SetCapital(SetCapitalArgs),
    /// Select (and optionally edit) the current phase
    SetPhase(SetPhaseArgs),
    /// Set the share of EPS paid out as cash
    SetDistribution(SetDistributionArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Recalc(args) => commands::analysis::run_recalc(args),
        Commands::Ownership(args) => commands::analysis::run_ownership(args),
        Commands::Phase(args) => commands::analysis::run_phase(args),
        Commands::Summary(args) => commands::analysis::run_summary(args),
        Commands::Report(args) => commands::analysis::run_report(args),
        Commands::Init(args) => commands::project::run_init(args),
        Commands::AddRound(args) => commands::project::run_add_round(args),
        Commands::UpdateRound(args) => commands::project::run_update_round(args),
        Commands::DeleteRound(args) => commands::project::run_delete_round(args),
        Commands::MoveRound(args) => commands::project::run_move_round(args),
        Commands::SortRounds(args) => commands::project::run_sort_rounds(args),
        Commands::SetCapital(args) => commands::project::run_set_capital(args),
        Commands::SetPhase(args) => commands::project::run_set_phase(args),
        Commands::SetDistribution(args) => commands::project::run_set_distribution(args),
        Commands::Version => {
            println!("rounds {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
