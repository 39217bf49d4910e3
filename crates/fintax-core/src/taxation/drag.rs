//! Annual tax drag: the tax a holding pays each year on its running yield,
//! before any withdrawal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assumptions::{check_fraction, check_yield, MarketAssumptions};
use crate::error::FintaxError;
use crate::profile::{TaxpayerProfile, WrapperType};
use crate::taxation::computer::{apply_rate, compute_tax, TaxComputationResult};
use crate::taxation::rate_table::RateTable;
use crate::taxation::resolver::{DurationTier, ResolvedRate};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::FintaxResult;

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// A balance held in one wrapper, as seen by the drag estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragPosition {
    pub wrapper: WrapperType,
    pub balance: Money,
    /// Expected annual yield of the holding, as a decimal.
    pub assumed_yield: Rate,
    pub holding_age_years: Years,
    /// Euro-fund share of a life-insurance contract. Falls back to the
    /// market assumption when absent; ignored for other wrappers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub euro_fund_fraction: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragEstimate {
    pub drag_amount: Money,
    pub taxable_base: Money,
    pub computation: TaxComputationResult,
    /// Always set, so a zero drag is never mistaken for a missing figure.
    pub explanation: String,
}

/// Annual tax paid by a position on its yield.
///
/// Equity plans, securities accounts and corporate holdings are taxed on
/// `balance x assumed_yield`. A life-insurance contract only pays the social
/// levy each year, on the euro-fund interest. Retirement plans defer
/// everything to exit and report a zero drag. A negative yield produces no
/// gain and therefore no drag.
pub fn estimate_annual_drag(
    position: &DragPosition,
    profile: &TaxpayerProfile,
    table: &RateTable,
    assumptions: &MarketAssumptions,
) -> FintaxResult<DragEstimate> {
    if position.balance < Decimal::ZERO {
        return Err(FintaxError::invalid("position.balance", "cannot be negative"));
    }
    if position.holding_age_years < Decimal::ZERO {
        return Err(FintaxError::invalid(
            "position.holding_age_years",
            "cannot be negative",
        ));
    }
    check_yield("position.assumed_yield", position.assumed_yield)?;
    if let Some(fraction) = position.euro_fund_fraction {
        check_fraction("position.euro_fund_fraction", fraction)?;
    }
    table.validate()?;
    profile.validate(&table.marginal_rate_ladder())?;

    let gain = (position.balance * position.assumed_yield).max(Decimal::ZERO);

    let (computation, explanation) = match position.wrapper {
        WrapperType::EquitySavingsPlan
        | WrapperType::SecuritiesAccount
        | WrapperType::CorporateHolding => {
            let computation = compute_tax(
                position.wrapper,
                profile,
                position.holding_age_years,
                gain,
                table,
            )?;
            let explanation = format!(
                "{} yield of {} taxed at {} ({})",
                position.wrapper,
                gain,
                computation.effective_rate,
                computation.duration_tier
            );
            (computation, explanation)
        }
        WrapperType::LifeInsurance => {
            let fraction = position
                .euro_fund_fraction
                .unwrap_or(assumptions.euro_fund_fraction);
            let interest =
                (position.balance * fraction * assumptions.euro_fund_yield).max(Decimal::ZERO);
            let levy_only = ResolvedRate {
                income_tax_rate: Decimal::ZERO,
                social_levy_rate: table.social_levy_rate,
                tier: DurationTier::LifeInsuranceEuroFundLevy,
            };
            let explanation = format!(
                "Social levy on euro-fund interest only ({} of the balance at {}); \
                 unit-linked gains are taxed on withdrawal",
                fraction, assumptions.euro_fund_yield
            );
            (apply_rate(levy_only, interest, Decimal::ZERO), explanation)
        }
        WrapperType::RetirementSavingsPlan => {
            let deferred = ResolvedRate {
                income_tax_rate: Decimal::ZERO,
                social_levy_rate: Decimal::ZERO,
                tier: DurationTier::RetirementDeferred,
            };
            (
                apply_rate(deferred, gain, Decimal::ZERO),
                "No annual drag: retirement plan gains are taxed only at exit".to_string(),
            )
        }
    };

    Ok(DragEstimate {
        drag_amount: computation.tax_due,
        taxable_base: computation.taxable_base,
        computation,
        explanation,
    })
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragInput {
    pub position: DragPosition,
    pub profile: TaxpayerProfile,
    #[serde(default)]
    pub rate_table: RateTable,
    #[serde(default)]
    pub assumptions: MarketAssumptions,
}

pub fn calculate_annual_drag(input: &DragInput) -> FintaxResult<ComputationOutput<DragEstimate>> {
    input.rate_table.validate()?;
    input.assumptions.validate()?;
    debug!(
        wrapper = %input.position.wrapper,
        balance = %input.position.balance,
        "calculate_annual_drag"
    );

    let estimate = estimate_annual_drag(
        &input.position,
        &input.profile,
        &input.rate_table,
        &input.assumptions,
    )?;

    let mut warnings = Vec::new();
    if input.position.assumed_yield < Decimal::ZERO {
        warnings.push("Negative assumed yield: no taxable gain this year.".into());
    }
    if input.position.euro_fund_fraction.is_some()
        && input.position.wrapper != WrapperType::LifeInsurance
    {
        warnings.push(format!(
            "euro_fund_fraction ignored for a {} position.",
            input.position.wrapper
        ));
    }

    Ok(with_metadata(
        "Annual tax drag: tax on one year of yield under the wrapper's current tier",
        &serde_json::json!({
            "position": &input.position,
            "assumptions": &input.assumptions,
        }),
        warnings,
        Some(input.rate_table.fiscal_year),
        estimate,
    ))
}
