use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fintax_core::optimization::asset_location::{self, AssetLocationInput};
use fintax_core::optimization::substitution::{self, SubstitutionInput};
use fintax_core::time_value::{self, ProjectionInput};

use crate::input;

/// Arguments for the asset-location score
#[derive(Args)]
pub struct AssetLocationArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the fee substitution proposals
#[derive(Args)]
pub struct SubstitutionArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for compounding a recurring saving
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ProjectionArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount saved each year
    #[arg(long)]
    pub annual_amount: Option<Decimal>,

    /// Horizon in years
    #[arg(long, default_value = "10")]
    pub years: u32,

    /// Reinvestment yield, e.g. 0.05
    #[arg(long = "yield", default_value = "0.05")]
    pub assumed_yield: Decimal,
}

pub fn run_asset_location(args: AssetLocationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let location_input: AssetLocationInput = input::load(args.input.as_deref(), "asset-location")?;
    let output = asset_location::analyze_asset_location(&location_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_substitutions(args: SubstitutionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let substitution_input: SubstitutionInput = input::load(args.input.as_deref(), "substitutions")?;
    let output = substitution::recommend_substitutions(&substitution_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_projection(args: ProjectionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let projection_input = match args.annual_amount {
        Some(annual_amount) if args.input.is_none() => ProjectionInput {
            annual_amount,
            years: args.years,
            assumed_yield: args.assumed_yield,
        },
        _ => input::load(args.input.as_deref(), "projection (or --annual-amount)")?,
    };
    let output = time_value::project_savings(&projection_input)?;
    Ok(serde_json::to_value(output)?)
}
