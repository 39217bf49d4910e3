mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::optimization::{AssetLocationArgs, ProjectionArgs, SubstitutionArgs};
use commands::review::ReviewArgs;
use commands::taxation::{
    DragArgs, EquityPlanCeilingArgs, IncomeTaxArgs, RetirementDeductionArgs, TaxArgs,
};
use commands::RateOverride;

/// Tax-aware wrapper optimisation for French household portfolios
#[derive(Parser)]
#[command(
    name = "fintax",
    version,
    about = "Tax-aware wrapper optimisation for French household portfolios",
    long_about = "A CLI for comparing the taxation of PEA, CTO, assurance-vie, PER and \
                  IS holdings with decimal precision. Computes gain taxation, annual tax \
                  drag, asset-location scores, fee substitutions and full portfolio reviews."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Rate table file (JSON/YAML) replacing the shipped one
    #[arg(long, global = true)]
    rates: Option<String>,

    /// Log engine decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Tax on a realised gain in one wrapper
    Tax(TaxArgs),
    /// Deductible share of a retirement-plan contribution and its exit rates
    RetirementDeduction(RetirementDeductionArgs),
    /// Room left under the PEA contribution ceiling
    PeaCeiling(EquityPlanCeilingArgs),
    /// Household income tax under the quotient system
    IncomeTax(IncomeTaxArgs),
    /// Annual tax drag of a position on its yield
    Drag(DragArgs),
    /// Score how well asset classes sit in their wrappers
    AssetLocation(AssetLocationArgs),
    /// Propose cheaper catalog funds for expensive lines
    Substitutions(SubstitutionArgs),
    /// Compound a recurring annual saving
    Projection(ProjectionArgs),
    /// Full portfolio review: costs, placements, substitutions, savings
    Review(ReviewArgs),
    /// Print the rate table in force
    Rates,
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

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "fintax_core=debug,fintax=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let rates = match cli.rates.as_deref().map(input::file::read_value).transpose() {
        Ok(value) => RateOverride(value),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Tax(args) => commands::taxation::run_tax(args, &rates),
        Commands::RetirementDeduction(args) => {
            commands::taxation::run_retirement_deduction(args, &rates)
        }
        Commands::PeaCeiling(args) => commands::taxation::run_equity_plan_ceiling(args, &rates),
        Commands::IncomeTax(args) => commands::taxation::run_income_tax(args, &rates),
        Commands::Drag(args) => commands::taxation::run_drag(args, &rates),
        Commands::AssetLocation(args) => commands::optimization::run_asset_location(args),
        Commands::Substitutions(args) => commands::optimization::run_substitutions(args),
        Commands::Projection(args) => commands::optimization::run_projection(args),
        Commands::Review(args) => commands::review::run_review(args, &rates),
        Commands::Rates => commands::taxation::run_rates(&rates),
        Commands::Version => {
            println!("fintax {}", env!("CARGO_PKG_VERSION"));
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
