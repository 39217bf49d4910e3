//! Fee substitution: swap expensive lines for the cheapest catalog fund of
//! the same asset class that the wrapper may hold.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::assumptions::MarketAssumptions;
use crate::identifier::{check_isin, IsinStatus};
use crate::optimization::catalog::{CatalogInstrument, InstrumentCatalog};
use crate::profile::{Holding, InstrumentLine, WrapperType};
use crate::time_value::future_value_of_annuity;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FintaxResult;

/// Horizon over which a yearly fee saving is compounded.
pub const SAVING_HORIZON_YEARS: u32 = 10;

const PERCENT: Decimal = dec!(100);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionProposal {
    /// Position of the holding in the caller's list.
    pub holding_index: usize,
    pub current_wrapper: WrapperType,
    pub current_line: InstrumentLine,
    pub recommended: CatalogInstrument,
    /// Fee difference in percentage points.
    pub fee_reduction_pct: Decimal,
    pub annual_saving: Money,
    /// Annual saving reinvested each year over the saving horizon.
    pub ten_year_saving: Money,
}

/// Yearly fee a line pays.
pub fn annual_fee(line: &InstrumentLine) -> Money {
    line.amount * line.fee_rate_pct / PERCENT
}

/// One proposal per line whose fee exceeds the cheapest eligible catalog
/// fund of its category, largest annual saving first.
///
/// Lines with no eligible candidate, or no positive saving, are skipped.
/// Equal savings keep holding then line order. Fails only when compounding a
/// saving leaves the decimal range.
pub fn propose_substitutions(
    holdings: &[Holding],
    catalog: &InstrumentCatalog,
    reinvestment_yield: Rate,
) -> FintaxResult<Vec<SubstitutionProposal>> {
    let mut proposals = Vec::new();
    for (holding_index, holding) in holdings.iter().enumerate() {
        for line in &holding.lines {
            let Some(candidate) = catalog.cheapest_eligible(&line.category, holding.wrapper) else {
                trace!(category = %line.category, wrapper = %holding.wrapper, "no eligible substitute");
                continue;
            };
            if candidate.fee_rate_pct >= line.fee_rate_pct {
                continue;
            }
            let fee_reduction_pct = line.fee_rate_pct - candidate.fee_rate_pct;
            let annual_saving = line.amount * fee_reduction_pct / PERCENT;
            if annual_saving <= Decimal::ZERO {
                continue;
            }
            proposals.push(SubstitutionProposal {
                holding_index,
                current_wrapper: holding.wrapper,
                current_line: line.clone(),
                recommended: candidate.clone(),
                fee_reduction_pct,
                annual_saving,
                ten_year_saving: future_value_of_annuity(
                    annual_saving,
                    SAVING_HORIZON_YEARS,
                    reinvestment_yield,
                )?,
            });
        }
    }
    proposals.sort_by(|a, b| b.annual_saving.cmp(&a.annual_saving));
    Ok(proposals)
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionInput {
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub catalog: InstrumentCatalog,
    #[serde(default)]
    pub assumptions: MarketAssumptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionOutput {
    pub proposals: Vec<SubstitutionProposal>,
    pub total_annual_saving: Money,
    pub total_ten_year_saving: Money,
    pub lines_reviewed: usize,
}

pub fn recommend_substitutions(
    input: &SubstitutionInput,
) -> FintaxResult<ComputationOutput<SubstitutionOutput>> {
    for (i, holding) in input.holdings.iter().enumerate() {
        holding.validate_amounts(i)?;
    }
    input.assumptions.validate()?;
    debug!(holdings = input.holdings.len(), "recommend_substitutions");

    let proposals = propose_substitutions(
        &input.holdings,
        &input.catalog,
        input.assumptions.reinvestment_yield,
    )?;
    let total_annual_saving = proposals.iter().map(|p| p.annual_saving).sum();
    let total_ten_year_saving = proposals.iter().map(|p| p.ten_year_saving).sum();
    let lines_reviewed = input.holdings.iter().map(|h| h.lines.len()).sum();

    let mut warnings = Vec::new();
    for holding in &input.holdings {
        for line in &holding.lines {
            if let Some(code) = &line.identifier {
                if check_isin(code) != IsinStatus::Valid {
                    warnings.push(format!("'{}' has an invalid ISIN ({code}).", line.name));
                }
            }
        }
    }

    Ok(with_metadata(
        "Fee substitution: cheapest eligible catalog fund per category; \
         saving = amount x fee difference / 100, compounded over 10 years",
        &serde_json::json!({
            "reinvestment_yield": input.assumptions.reinvestment_yield.to_string(),
            "horizon_years": SAVING_HORIZON_YEARS,
            "catalog_size": input.catalog.instruments.len(),
        }),
        warnings,
        None,
        SubstitutionOutput {
            proposals,
            total_annual_saving,
            total_ten_year_saving,
            lines_reviewed,
        },
    ))
}
