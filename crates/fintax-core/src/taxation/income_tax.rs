//! Progressive income tax under the household-quotient system: income is
//! split into parts, taxed per part on the bracket scale, then multiplied
//! back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FintaxError;
use crate::taxation::rate_table::RateTable;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FintaxResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxResult {
    pub taxable_income: Money,
    pub household_parts: Decimal,
    /// Income per part.
    pub quotient: Money,
    pub gross_tax: Money,
    /// Gross tax over taxable income, zero for zero income.
    pub average_rate: Rate,
    /// Rate of the bracket the quotient falls in.
    pub marginal_rate: Rate,
}

fn validate_household(income: Money, parts: Decimal) -> FintaxResult<()> {
    if income < Decimal::ZERO {
        return Err(FintaxError::invalid("taxable_income", "cannot be negative"));
    }
    if parts <= Decimal::ZERO {
        return Err(FintaxError::invalid("household_parts", "must be positive"));
    }
    Ok(())
}

/// Tax on one part's income, bracket by bracket.
fn tax_per_part(quotient: Money, table: &RateTable) -> Money {
    table
        .income_tax_brackets
        .iter()
        .filter(|b| quotient > b.lower)
        .map(|b| {
            let top = b.upper.map_or(quotient, |upper| quotient.min(upper));
            (top - b.lower) * b.rate
        })
        .sum()
}

/// Bracket rate applying to a quotient. A quotient sitting exactly on a
/// bracket's lower bound takes that bracket's rate.
fn quotient_marginal_rate(quotient: Money, table: &RateTable) -> Rate {
    table
        .income_tax_brackets
        .iter()
        .rev()
        .find(|b| quotient >= b.lower)
        .map(|b| b.rate)
        .unwrap_or(Decimal::ZERO)
}

pub fn compute_income_tax(
    taxable_income: Money,
    household_parts: Decimal,
    table: &RateTable,
) -> FintaxResult<IncomeTaxResult> {
    validate_household(taxable_income, household_parts)?;

    let quotient = taxable_income / household_parts;
    let gross_tax = tax_per_part(quotient, table) * household_parts;
    let average_rate = if taxable_income.is_zero() {
        Decimal::ZERO
    } else {
        gross_tax / taxable_income
    };

    Ok(IncomeTaxResult {
        taxable_income,
        household_parts,
        quotient,
        gross_tax,
        average_rate,
        marginal_rate: quotient_marginal_rate(quotient, table),
    })
}

/// Marginal rate for a household, always a rung of the table's ladder. Lets a
/// caller build a profile from taxable income alone.
pub fn marginal_rate_for_income(
    taxable_income: Money,
    household_parts: Decimal,
    table: &RateTable,
) -> FintaxResult<Rate> {
    validate_household(taxable_income, household_parts)?;
    Ok(quotient_marginal_rate(taxable_income / household_parts, table))
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxInput {
    pub taxable_income: Money,
    pub household_parts: Decimal,
    #[serde(default)]
    pub rate_table: RateTable,
}

pub fn calculate_income_tax(input: &IncomeTaxInput) -> FintaxResult<ComputationOutput<IncomeTaxResult>> {
    input.rate_table.validate()?;
    debug!(income = %input.taxable_income, parts = %input.household_parts, "calculate_income_tax");

    let result = compute_income_tax(input.taxable_income, input.household_parts, &input.rate_table)?;

    let mut warnings = Vec::new();
    if input.household_parts.fract() != Decimal::ZERO
        && (input.household_parts * Decimal::TWO).fract() != Decimal::ZERO
    {
        warnings.push(format!(
            "{} household parts is not a multiple of one half.",
            input.household_parts
        ));
    }

    Ok(with_metadata(
        "Progressive scale: tax = parts x scale(income / parts); no ceiling on the quotient benefit",
        &serde_json::json!({
            "taxable_income": input.taxable_income.to_string(),
            "household_parts": input.household_parts.to_string(),
            "brackets": &input.rate_table.income_tax_brackets,
        }),
        warnings,
        Some(input.rate_table.fiscal_year),
        result,
    ))
}
