use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FintaxError;
use crate::profile::{TaxpayerProfile, WrapperType};
use crate::taxation::rate_table::RateTable;
use crate::taxation::resolver::{
    resolve_rate, resolve_retirement_exit, DurationTier, ResolvedRate, RetirementExit,
};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::FintaxResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxComputationResult {
    /// Always `income_tax_rate + social_levy_rate`.
    pub effective_rate: Rate,
    pub income_tax_rate: Rate,
    pub social_levy_rate: Rate,
    pub taxable_base: Money,
    /// Portion of the base absorbed by an allowance.
    pub allowance_applied: Money,
    /// Base actually taxed, after the allowance.
    pub adjusted_base: Money,
    pub tax_due: Money,
    pub duration_tier: DurationTier,
    /// Article the tier's rates come from.
    pub legal_reference: String,
    /// A withdrawal under this tier closes the plan.
    pub closes_plan: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementDeduction {
    pub deductible_cap: Money,
    /// Cap left after deductions already used this year, never negative.
    pub headroom: Money,
    pub deductible_amount: Money,
    pub non_deductible_amount: Money,
    pub tax_saving: Money,
    pub legal_reference: String,
}

/// Room left under the equity-plan contribution ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPlanCeilingCheck {
    pub ceiling: Money,
    pub paid_in: Money,
    pub contribution: Money,
    pub within_ceiling: bool,
    /// Room before the contribution, never negative.
    pub remaining_capacity: Money,
    pub accepted_contribution: Money,
    pub excess_contribution: Money,
    pub legal_reference: String,
}

const RETIREMENT_DEDUCTION_REFERENCE: &str = "CGI art. 163 quatervicies";
const EQUITY_PLAN_CEILING_REFERENCE: &str = "CGI art. 163 quinquies D";

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Apply resolved rates to a base, after subtracting `allowance` (floored at
/// zero).
pub fn apply_rate(resolved: ResolvedRate, taxable_base: Money, allowance: Money) -> TaxComputationResult {
    let adjusted_base = (taxable_base - allowance.max(Decimal::ZERO)).max(Decimal::ZERO);
    let effective_rate = resolved.effective_rate();
    TaxComputationResult {
        effective_rate,
        income_tax_rate: resolved.income_tax_rate,
        social_levy_rate: resolved.social_levy_rate,
        taxable_base,
        allowance_applied: taxable_base - adjusted_base,
        adjusted_base,
        tax_due: adjusted_base * effective_rate,
        duration_tier: resolved.tier,
        legal_reference: resolved.tier.legal_reference().to_string(),
        closes_plan: resolved.tier.closes_plan(),
    }
}

/// Tax due on `taxable_base` realised in `wrapper` after `holding_age` years.
///
/// Only the long life-insurance tier carries an allowance; every other
/// wrapper and tier taxes the full base. The table, the profile, the age and
/// the base are all validated first.
pub fn compute_tax(
    wrapper: WrapperType,
    profile: &TaxpayerProfile,
    holding_age: Years,
    taxable_base: Money,
    table: &RateTable,
) -> FintaxResult<TaxComputationResult> {
    if taxable_base < Decimal::ZERO {
        return Err(FintaxError::invalid("taxable_base", "cannot be negative"));
    }
    if holding_age < Decimal::ZERO {
        return Err(FintaxError::invalid("holding_age_years", "cannot be negative"));
    }
    table.validate()?;
    profile.validate(&table.marginal_rate_ladder())?;

    let resolved = resolve_rate(wrapper, profile, holding_age, table);
    let allowance = match resolved.tier {
        DurationTier::LifeInsuranceLong => table.life_insurance_allowance(profile.marital_status),
        _ => Decimal::ZERO,
    };
    Ok(apply_rate(resolved, taxable_base, allowance))
}

/// Deductible share of a retirement-plan contribution and the income tax it
/// saves.
///
/// The cap is the larger of the table's floor and the income share of
/// professional income, bounded by the table's ceiling when one is set.
pub fn compute_retirement_deduction(
    profile: &TaxpayerProfile,
    contribution: Money,
    table: &RateTable,
) -> FintaxResult<RetirementDeduction> {
    if contribution < Decimal::ZERO {
        return Err(FintaxError::invalid("contribution", "cannot be negative"));
    }
    table.validate()?;
    profile.validate(&table.marginal_rate_ladder())?;

    let rules = &table.retirement;
    let income_cap = profile.professional_annual_income * rules.deduction_income_share;
    let mut deductible_cap = income_cap.max(rules.deduction_floor);
    if let Some(ceiling) = rules.deduction_ceiling {
        deductible_cap = deductible_cap.min(ceiling);
    }

    let headroom = (deductible_cap - profile.retirement_deduction_used).max(Decimal::ZERO);
    let deductible_amount = contribution.min(headroom);

    Ok(RetirementDeduction {
        deductible_cap,
        headroom,
        deductible_amount,
        non_deductible_amount: contribution - deductible_amount,
        tax_saving: deductible_amount * profile.marginal_rate,
        legal_reference: RETIREMENT_DEDUCTION_REFERENCE.to_string(),
    })
}

/// Check a new contribution against the equity-plan ceiling, given what the
/// plan has already received.
pub fn check_equity_plan_ceiling(
    paid_in: Money,
    contribution: Money,
    table: &RateTable,
) -> FintaxResult<EquityPlanCeilingCheck> {
    if paid_in < Decimal::ZERO {
        return Err(FintaxError::invalid("paid_in", "cannot be negative"));
    }
    if contribution < Decimal::ZERO {
        return Err(FintaxError::invalid("contribution", "cannot be negative"));
    }
    table.validate()?;

    let ceiling = table.equity_plan.contribution_ceiling;
    let remaining_capacity = (ceiling - paid_in).max(Decimal::ZERO);
    let accepted_contribution = contribution.min(remaining_capacity);
    Ok(EquityPlanCeilingCheck {
        ceiling,
        paid_in,
        contribution,
        within_ceiling: paid_in + contribution <= ceiling,
        remaining_capacity,
        accepted_contribution,
        excess_contribution: contribution - accepted_contribution,
        legal_reference: EQUITY_PLAN_CEILING_REFERENCE.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Envelope entry points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxInput {
    pub wrapper: WrapperType,
    pub profile: TaxpayerProfile,
    pub holding_age_years: Years,
    pub taxable_base: Money,
    #[serde(default)]
    pub rate_table: RateTable,
}

/// Tax on a realised gain, wrapped with methodology and warnings.
pub fn calculate_tax(input: &TaxInput) -> FintaxResult<ComputationOutput<TaxComputationResult>> {
    input.rate_table.validate()?;
    debug!(wrapper = %input.wrapper, base = %input.taxable_base, "calculate_tax");

    let result = compute_tax(
        input.wrapper,
        &input.profile,
        input.holding_age_years,
        input.taxable_base,
        &input.rate_table,
    )?;

    let mut warnings = Vec::new();
    if result.closes_plan {
        warnings.push(format!(
            "A PEA withdrawal before {} years closes the plan.",
            input.rate_table.equity_plan.exemption_years
        ));
    }
    if input.wrapper == WrapperType::RetirementSavingsPlan {
        warnings.push(
            "Retirement plan gains are taxed at exit only; the rate shown is the lump-sum exit."
                .into(),
        );
    }
    if input.wrapper == WrapperType::CorporateHolding {
        warnings.push("Corporate tax rate used as a comparison proxy, not personal taxation.".into());
    }
    if result.allowance_applied > Decimal::ZERO && result.tax_due.is_zero() {
        warnings.push(format!(
            "Gain of {} fully covered by the life-insurance allowance.",
            input.taxable_base
        ));
    }

    Ok(with_metadata(
        &format!(
            "Wrapper taxation ({}): tax = max(0, base - allowance) x (income tax + social levy)",
            result.duration_tier
        ),
        &serde_json::json!({
            "wrapper": input.wrapper.code(),
            "holding_age_years": input.holding_age_years.to_string(),
            "marginal_rate": input.profile.marginal_rate.to_string(),
            "progressive_option": input.profile.use_progressive_option,
            "fiscal_year": input.rate_table.fiscal_year,
        }),
        warnings,
        Some(input.rate_table.fiscal_year),
        result,
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementDeductionInput {
    pub profile: TaxpayerProfile,
    pub contribution: Money,
    /// Age at first annuity payment, to price the annuity exit alongside the
    /// lump sum.
    #[serde(default)]
    pub annuitant_age: Option<u32>,
    #[serde(default)]
    pub rate_table: RateTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementDeductionOutput {
    pub deduction: RetirementDeduction,
    pub lump_sum_exit: ResolvedRate,
    pub annuity_exit: Option<ResolvedRate>,
}

/// Entry-side deduction of a retirement contribution, with the exit rates it
/// will eventually face.
pub fn calculate_retirement_deduction(
    input: &RetirementDeductionInput,
) -> FintaxResult<ComputationOutput<RetirementDeductionOutput>> {
    input.rate_table.validate()?;
    debug!(contribution = %input.contribution, "calculate_retirement_deduction");

    let deduction = compute_retirement_deduction(&input.profile, input.contribution, &input.rate_table)?;
    let lump_sum_exit =
        resolve_retirement_exit(RetirementExit::LumpSum, &input.profile, &input.rate_table);
    let annuity_exit = input.annuitant_age.map(|annuitant_age| {
        resolve_retirement_exit(
            RetirementExit::Annuity { annuitant_age },
            &input.profile,
            &input.rate_table,
        )
    });

    let mut warnings = Vec::new();
    if deduction.non_deductible_amount > Decimal::ZERO {
        warnings.push(format!(
            "{} of the contribution exceeds the remaining deduction headroom and saves no tax.",
            deduction.non_deductible_amount
        ));
    }
    if input.profile.marginal_rate.is_zero() {
        warnings.push(
            "Zero marginal rate: the contribution saves no income tax at entry.".into(),
        );
    }

    Ok(with_metadata(
        "Retirement deduction: cap = max(floor, income share x professional income), \
         bounded by the ceiling; saving = min(contribution, headroom) x marginal rate",
        &serde_json::json!({
            "contribution": input.contribution.to_string(),
            "professional_annual_income": input.profile.professional_annual_income.to_string(),
            "retirement_deduction_used": input.profile.retirement_deduction_used.to_string(),
            "annuitant_age": input.annuitant_age,
        }),
        warnings,
        Some(input.rate_table.fiscal_year),
        RetirementDeductionOutput {
            deduction,
            lump_sum_exit,
            annuity_exit,
        },
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPlanCeilingInput {
    /// Contributions the plan has already received.
    pub paid_in: Money,
    pub contribution: Money,
    #[serde(default)]
    pub rate_table: RateTable,
}

pub fn calculate_equity_plan_ceiling(
    input: &EquityPlanCeilingInput,
) -> FintaxResult<ComputationOutput<EquityPlanCeilingCheck>> {
    debug!(paid_in = %input.paid_in, contribution = %input.contribution, "calculate_equity_plan_ceiling");
    let check = check_equity_plan_ceiling(input.paid_in, input.contribution, &input.rate_table)?;

    let mut warnings = Vec::new();
    if !check.within_ceiling {
        warnings.push(format!(
            "{} of the contribution exceeds the PEA ceiling of {}.",
            check.excess_contribution, check.ceiling
        ));
    }

    Ok(with_metadata(
        "PEA ceiling: accepted = min(contribution, max(0, ceiling - paid in))",
        &serde_json::json!({
            "paid_in": input.paid_in.to_string(),
            "contribution": input.contribution.to_string(),
        }),
        warnings,
        Some(input.rate_table.fiscal_year),
        check,
    ))
}
