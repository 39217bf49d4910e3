use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fintax_core::taxation::computer::{
    self, EquityPlanCeilingInput, RetirementDeductionInput, TaxInput,
};
use fintax_core::taxation::drag::{self, DragInput};
use fintax_core::taxation::income_tax::{self, IncomeTaxInput};
use fintax_core::taxation::rate_table::RateTable;
use fintax_core::{MaritalStatus, TaxpayerProfile, WrapperType};

use super::{parse_marital_status, parse_wrapper, RateOverride};
use crate::input;

/// Taxpayer flags shared by the flag-driven commands.
#[derive(Args)]
pub struct ProfileArgs {
    /// Marginal income-tax rate (TMI), e.g. 0.30
    #[arg(long)]
    pub marginal_rate: Option<Decimal>,

    /// Marital status: single, married, pacsed, divorced, widowed
    #[arg(long, value_parser = parse_marital_status, default_value = "single")]
    pub marital_status: MaritalStatus,

    /// Opt into the progressive scale for securities-account income
    #[arg(long)]
    pub progressive: bool,

    /// Professional annual income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Retirement deduction already used this year
    #[arg(long)]
    pub deduction_used: Option<Decimal>,
}

impl ProfileArgs {
    fn to_profile(&self) -> Result<TaxpayerProfile, Box<dyn std::error::Error>> {
        Ok(TaxpayerProfile {
            marginal_rate: self
                .marginal_rate
                .ok_or("--marginal-rate is required (or provide --input)")?,
            marital_status: self.marital_status,
            use_progressive_option: self.progressive,
            professional_annual_income: self.income.unwrap_or(Decimal::ZERO),
            retirement_deduction_used: self.deduction_used.unwrap_or(Decimal::ZERO),
        })
    }
}

/// Arguments for the tax on a realised gain
#[derive(Args)]
pub struct TaxArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Wrapper code: PEA, CTO, AV, PER, IS
    #[arg(long, value_parser = parse_wrapper)]
    pub wrapper: Option<WrapperType>,

    /// Realised gain to tax
    #[arg(long)]
    pub base: Option<Decimal>,

    /// Holding age in years
    #[arg(long, default_value = "0")]
    pub age: Decimal,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

/// Arguments for the retirement-plan deduction
#[derive(Args)]
pub struct RetirementDeductionArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Contribution paid into the retirement plan
    #[arg(long)]
    pub contribution: Option<Decimal>,

    /// Age at the first annuity payment, to price the annuity exit
    #[arg(long)]
    pub annuitant_age: Option<u32>,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

/// Arguments for the PEA contribution ceiling check
#[derive(Args)]
pub struct EquityPlanCeilingArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Contributions the plan has already received
    #[arg(long, default_value = "0")]
    pub paid_in: Decimal,

    /// New contribution to check
    #[arg(long)]
    pub contribution: Option<Decimal>,
}

/// Arguments for the household income tax
#[derive(Args)]
pub struct IncomeTaxArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Net taxable household income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Household parts (quotient familial)
    #[arg(long, default_value = "1")]
    pub parts: Decimal,
}

/// Arguments for the annual tax drag
#[derive(Args)]
pub struct DragArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_tax(args: TaxArgs, rates: &RateOverride) -> Result<Value, Box<dyn std::error::Error>> {
    let document = match (&args.wrapper, args.base) {
        (Some(wrapper), Some(base)) if args.input.is_none() => serde_json::to_value(TaxInput {
            wrapper: *wrapper,
            profile: args.profile.to_profile()?,
            holding_age_years: args.age,
            taxable_base: base,
            rate_table: RateTable::default(),
        })?,
        _ => input::load_value(args.input.as_deref(), "tax (or --wrapper and --base)")?,
    };
    let tax_input: TaxInput = rates.parse(document)?;
    let output = computer::calculate_tax(&tax_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_retirement_deduction(
    args: RetirementDeductionArgs,
    rates: &RateOverride,
) -> Result<Value, Box<dyn std::error::Error>> {
    let document = match args.contribution {
        Some(contribution) if args.input.is_none() => {
            serde_json::to_value(RetirementDeductionInput {
                profile: args.profile.to_profile()?,
                contribution,
                annuitant_age: args.annuitant_age,
                rate_table: RateTable::default(),
            })?
        }
        _ => input::load_value(args.input.as_deref(), "retirement-deduction (or --contribution)")?,
    };
    let deduction_input: RetirementDeductionInput = rates.parse(document)?;
    let output = computer::calculate_retirement_deduction(&deduction_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_equity_plan_ceiling(
    args: EquityPlanCeilingArgs,
    rates: &RateOverride,
) -> Result<Value, Box<dyn std::error::Error>> {
    let document = match args.contribution {
        Some(contribution) if args.input.is_none() => serde_json::to_value(EquityPlanCeilingInput {
            paid_in: args.paid_in,
            contribution,
            rate_table: RateTable::default(),
        })?,
        _ => input::load_value(args.input.as_deref(), "pea-ceiling (or --contribution)")?,
    };
    let ceiling_input: EquityPlanCeilingInput = rates.parse(document)?;
    let output = computer::calculate_equity_plan_ceiling(&ceiling_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_income_tax(args: IncomeTaxArgs, rates: &RateOverride) -> Result<Value, Box<dyn std::error::Error>> {
    let document = match args.income {
        Some(income) if args.input.is_none() => serde_json::to_value(IncomeTaxInput {
            taxable_income: income,
            household_parts: args.parts,
            rate_table: RateTable::default(),
        })?,
        _ => input::load_value(args.input.as_deref(), "income-tax (or --income)")?,
    };
    let income_input: IncomeTaxInput = rates.parse(document)?;
    let output = income_tax::calculate_income_tax(&income_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_drag(args: DragArgs, rates: &RateOverride) -> Result<Value, Box<dyn std::error::Error>> {
    let document = input::load_value(args.input.as_deref(), "drag")?;
    let drag_input: DragInput = rates.parse(document)?;
    let output = drag::calculate_annual_drag(&drag_input)?;
    Ok(serde_json::to_value(output)?)
}

/// Print the rate table in force: the `--rates` file when given, otherwise
/// the shipped one.
pub fn run_rates(rates: &RateOverride) -> Result<Value, Box<dyn std::error::Error>> {
    let table: RateTable = match &rates.0 {
        Some(value) => serde_json::from_value(value.clone())?,
        None => RateTable::default(),
    };
    table.validate()?;
    Ok(serde_json::to_value(table)?)
}
