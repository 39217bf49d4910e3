//! Whole-portfolio review: per-holding cost of ownership, placement quality,
//! fee substitutions, relocation gains and a savings summary, in one call.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assumptions::{check_yield, MarketAssumptions};
use crate::identifier::{check_isin, IsinStatus};
use crate::optimization::asset_location::{
    allocations_from_holdings, assess_placements, holding_wrappers, score_portfolio,
    AllocationQuality, PlacementAssessment, PriorityTable,
};
use crate::optimization::catalog::InstrumentCatalog;
use crate::optimization::substitution::{annual_fee, propose_substitutions, SubstitutionProposal};
use crate::profile::{Holding, TaxpayerProfile, WrapperType};
use crate::taxation::drag::{estimate_annual_drag, DragEstimate, DragPosition};
use crate::taxation::rate_table::RateTable;
use crate::time_value::future_value_of_annuity;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::FintaxResult;

fn default_assumed_yield() -> Rate {
    dec!(0.02)
}

fn default_projection_years() -> u32 {
    10
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReviewInput {
    pub profile: TaxpayerProfile,
    pub holdings: Vec<Holding>,
    /// Valuation date; holding ages are measured up to it.
    pub as_of: NaiveDate,
    /// Annual yield taxed by the drag estimate.
    #[serde(default = "default_assumed_yield")]
    pub assumed_yield: Rate,
    /// Horizon for the compounded fee saving.
    #[serde(default = "default_projection_years")]
    pub projection_years: u32,
    /// Wrappers the household may use. Defaults to the ones already held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_wrappers: Option<Vec<WrapperType>>,
    #[serde(default)]
    pub rate_table: RateTable,
    #[serde(default)]
    pub priority_table: PriorityTable,
    #[serde(default)]
    pub catalog: InstrumentCatalog,
    #[serde(default)]
    pub assumptions: MarketAssumptions,
}

/// Yearly cost of one holding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingCost {
    pub holding_index: usize,
    pub wrapper: WrapperType,
    pub balance: Money,
    pub age_years: Years,
    pub annual_fees: Money,
    pub drag: DragEstimate,
    /// Fees that the holding's substitution proposals would remove.
    pub avoidable_fees: Money,
    /// Fees plus tax drag.
    pub total_annual_cost: Money,
}

/// Drag saved by moving one placement to its recommended wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationGain {
    pub category: String,
    pub amount: Money,
    pub held_wrapper: WrapperType,
    pub recommended_wrapper: WrapperType,
    pub current_drag: Money,
    pub recommended_drag: Money,
    /// `current_drag - recommended_drag`, floored at zero.
    pub annual_gain: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub total_balance: Money,
    pub total_annual_fees: Money,
    pub total_annual_drag: Money,
    pub annual_fee_saving: Money,
    pub projection_years: u32,
    /// Annual fee saving reinvested over `projection_years`.
    pub compounded_fee_saving: Money,
    pub annual_relocation_gain: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReview {
    pub holdings: Vec<HoldingCost>,
    pub placements: Vec<PlacementAssessment>,
    pub location_score: Decimal,
    pub proposals: Vec<SubstitutionProposal>,
    pub relocations: Vec<RelocationGain>,
    pub summary: SavingsSummary,
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

pub fn review_portfolio(input: &PortfolioReviewInput) -> FintaxResult<ComputationOutput<PortfolioReview>> {
    validate_input(input)?;
    debug!(
        holdings = input.holdings.len(),
        as_of = %input.as_of,
        "review_portfolio"
    );

    let mut warnings = Vec::new();
    if input.holdings.is_empty() {
        warnings.push("Empty portfolio: nothing to review.".to_string());
    }

    let proposals = propose_substitutions(
        &input.holdings,
        &input.catalog,
        input.assumptions.reinvestment_yield,
    )?;

    // Per-holding cost of ownership
    let mut holdings = Vec::with_capacity(input.holdings.len());
    for (i, holding) in input.holdings.iter().enumerate() {
        let age_years = holding.age_years(input.as_of);
        let drag = drag_for(holding.wrapper, holding.balance, age_years, input)?;
        let annual_fees: Money = holding.lines.iter().map(annual_fee).sum();
        let avoidable_fees: Money = proposals
            .iter()
            .filter(|p| p.holding_index == i)
            .map(|p| p.annual_saving)
            .sum();

        let lines_total: Money = holding.lines.iter().map(|l| l.amount).sum();
        if lines_total > holding.balance {
            warnings.push(format!(
                "holdings[{i}]: lines total {lines_total} exceeds the balance {}.",
                holding.balance
            ));
        }
        for line in &holding.lines {
            if let Some(code) = &line.identifier {
                let status = check_isin(code);
                if status != IsinStatus::Valid {
                    warn!(identifier = %code, ?status, "invalid identifier");
                    warnings.push(format!(
                        "holdings[{i}]: '{}' has an invalid ISIN ({code}); priced on amount and fee only.",
                        line.name
                    ));
                }
            }
        }

        holdings.push(HoldingCost {
            holding_index: i,
            wrapper: holding.wrapper,
            balance: holding.balance,
            age_years,
            annual_fees,
            total_annual_cost: annual_fees + drag.drag_amount,
            drag,
            avoidable_fees,
        });
    }

    // Placement quality
    let allocations = allocations_from_holdings(&input.holdings);
    let available = input
        .available_wrappers
        .clone()
        .unwrap_or_else(|| holding_wrappers(&input.holdings));
    let placements = assess_placements(&allocations, &available, &input.priority_table);
    let location_score = score_portfolio(&allocations, &input.priority_table)?;

    for p in &placements {
        if !p.known_category {
            warn!(category = %p.category, "unknown category, fallback ordering");
            warnings.push(format!(
                "Unknown category '{}': fallback wrapper ordering used.",
                p.category
            ));
        }
        if let Some(rec) = p.recommended_wrapper {
            if !p.recommendation_ranked {
                warn!(category = %p.category, wrapper = %rec, "fallback recommendation");
                warnings.push(format!(
                    "No ranked wrapper available for '{}'; {} is only a fallback.",
                    p.category, rec
                ));
            }
        }
    }

    let relocations = relocation_gains(&placements, input)?;

    let total_annual_fees: Money = holdings.iter().map(|h| h.annual_fees).sum();
    let total_annual_drag: Money = holdings.iter().map(|h| h.drag.drag_amount).sum();
    let annual_fee_saving: Money = proposals.iter().map(|p| p.annual_saving).sum();
    let summary = SavingsSummary {
        total_balance: input.holdings.iter().map(|h| h.balance).sum(),
        total_annual_fees,
        total_annual_drag,
        annual_fee_saving,
        projection_years: input.projection_years,
        compounded_fee_saving: future_value_of_annuity(
            annual_fee_saving,
            input.projection_years,
            input.assumptions.reinvestment_yield,
        )?,
        annual_relocation_gain: relocations.iter().map(|r| r.annual_gain).sum(),
    };

    Ok(with_metadata(
        "Portfolio review: annual fees + tax drag per holding, amount-weighted location score, \
         cheapest eligible substitutes, drag saved by relocating non-optimal placements",
        &serde_json::json!({
            "as_of": input.as_of.to_string(),
            "assumed_yield": input.assumed_yield.to_string(),
            "projection_years": input.projection_years,
            "available_wrappers": &available,
            "assumptions": &input.assumptions,
        }),
        warnings,
        Some(input.rate_table.fiscal_year),
        PortfolioReview {
            holdings,
            placements,
            location_score,
            proposals,
            relocations,
            summary,
        },
    ))
}

fn validate_input(input: &PortfolioReviewInput) -> FintaxResult<()> {
    input.rate_table.validate()?;
    input.priority_table.validate()?;
    input.assumptions.validate()?;
    input.profile.validate(&input.rate_table.marginal_rate_ladder())?;
    check_yield("assumed_yield", input.assumed_yield)?;
    for (i, holding) in input.holdings.iter().enumerate() {
        holding.validate(i, input.as_of)?;
    }
    Ok(())
}

fn drag_for(
    wrapper: WrapperType,
    balance: Money,
    age_years: Years,
    input: &PortfolioReviewInput,
) -> FintaxResult<DragEstimate> {
    estimate_annual_drag(
        &DragPosition {
            wrapper,
            balance,
            assumed_yield: input.assumed_yield,
            holding_age_years: age_years,
            euro_fund_fraction: None,
        },
        &input.profile,
        &input.rate_table,
        &input.assumptions,
    )
}

/// Age of the oldest holding of `wrapper`, zero when none is held.
fn oldest_age(wrapper: WrapperType, input: &PortfolioReviewInput) -> Years {
    input
        .holdings
        .iter()
        .filter(|h| h.wrapper == wrapper)
        .map(|h| h.age_years(input.as_of))
        .max()
        .unwrap_or(Decimal::ZERO)
}

fn relocation_gains(
    placements: &[PlacementAssessment],
    input: &PortfolioReviewInput,
) -> FintaxResult<Vec<RelocationGain>> {
    let mut gains = Vec::new();
    for p in placements {
        if p.quality == AllocationQuality::Optimal {
            continue;
        }
        let Some(recommended) = p.recommended_wrapper else {
            continue;
        };
        if recommended == p.wrapper {
            continue;
        }
        let current = drag_for(p.wrapper, p.amount, oldest_age(p.wrapper, input), input)?;
        let target = drag_for(recommended, p.amount, oldest_age(recommended, input), input)?;
        gains.push(RelocationGain {
            category: p.category.clone(),
            amount: p.amount,
            held_wrapper: p.wrapper,
            recommended_wrapper: recommended,
            current_drag: current.drag_amount,
            recommended_drag: target.drag_amount,
            annual_gain: (current.drag_amount - target.drag_amount).max(Decimal::ZERO),
        });
    }
    Ok(gains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::catalog::categories::*;
    use crate::profile::{InstrumentLine, MaritalStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(category: &str, amount: Money, fee: Decimal) -> InstrumentLine {
        InstrumentLine {
            identifier: None,
            name: format!("{category} fund"),
            amount,
            fee_rate_pct: fee,
            category: category.to_string(),
        }
    }

    fn input(holdings: Vec<Holding>) -> PortfolioReviewInput {
        PortfolioReviewInput {
            profile: TaxpayerProfile {
                marginal_rate: dec!(0.30),
                marital_status: MaritalStatus::Married,
                use_progressive_option: false,
                professional_annual_income: dec!(70_000),
                retirement_deduction_used: Decimal::ZERO,
            },
            holdings,
            as_of: date(2024, 6, 30),
            assumed_yield: dec!(0.02),
            projection_years: 10,
            available_wrappers: None,
            rate_table: RateTable::default(),
            priority_table: PriorityTable::default(),
            catalog: InstrumentCatalog::default(),
            assumptions: MarketAssumptions::default(),
        }
    }

    #[test]
    fn test_empty_portfolio_warns_and_scores_zero() {
        let out = review_portfolio(&input(vec![])).unwrap();
        assert_eq!(out.result.location_score, Decimal::ZERO);
        assert!(out.result.proposals.is_empty());
        assert!(out.warnings.iter().any(|w| w.contains("Empty portfolio")));
    }

    #[test]
    fn test_future_opening_date_rejected() {
        let h = Holding {
            wrapper: WrapperType::SecuritiesAccount,
            opened_on: date(2025, 1, 1),
            balance: dec!(1_000),
            lines: vec![],
        };
        assert!(review_portfolio(&input(vec![h])).is_err());
    }

    #[test]
    fn test_holding_cost_adds_fees_and_drag() {
        let h = Holding {
            wrapper: WrapperType::SecuritiesAccount,
            opened_on: date(2020, 1, 1),
            balance: dec!(10_000),
            lines: vec![line(GLOBAL_EQUITY, dec!(10_000), dec!(0.50))],
        };
        let out = review_portfolio(&input(vec![h])).unwrap();
        let cost = &out.result.holdings[0];
        assert_eq!(cost.annual_fees, dec!(50));
        // 200 of yield at the 30% flat tax
        assert_eq!(cost.drag.drag_amount, dec!(60));
        assert_eq!(cost.total_annual_cost, dec!(110));
        // 10,000 x (0.50 - 0.18) / 100
        assert_eq!(cost.avoidable_fees, dec!(32));
    }

    #[test]
    fn test_relocation_gain_for_world_equity_in_securities_account() {
        let cto = Holding {
            wrapper: WrapperType::SecuritiesAccount,
            opened_on: date(2020, 1, 1),
            balance: dec!(50_000),
            lines: vec![line(GLOBAL_EQUITY, dec!(50_000), dec!(0.18))],
        };
        let av = Holding {
            wrapper: WrapperType::LifeInsurance,
            opened_on: date(2010, 1, 1),
            balance: dec!(20_000),
            lines: vec![line(EURO_FUND, dec!(20_000), dec!(0.60))],
        };
        let out = review_portfolio(&input(vec![cto, av])).unwrap();
        let r = &out.result.relocations;
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].held_wrapper, WrapperType::SecuritiesAccount);
        assert_eq!(r[0].recommended_wrapper, WrapperType::LifeInsurance);
        // 1,000 x 30% = 300 against 50,000 x 30% x 1.5% x 17.2% = 38.7
        assert_eq!(r[0].current_drag, dec!(300));
        assert_eq!(r[0].recommended_drag, dec!(38.7));
        assert_eq!(r[0].annual_gain, dec!(261.3));
        assert_eq!(out.result.summary.annual_relocation_gain, dec!(261.3));
    }

    #[test]
    fn test_invalid_identifier_is_a_warning_not_an_error() {
        let mut l = line(US_EQUITY, dec!(5_000), dec!(0.30));
        l.identifier = Some("IE00B5BMR088".into());
        let h = Holding {
            wrapper: WrapperType::LifeInsurance,
            opened_on: date(2019, 3, 1),
            balance: dec!(5_000),
            lines: vec![l],
        };
        let out = review_portfolio(&input(vec![h])).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("invalid ISIN")));
        assert_eq!(out.result.proposals.len(), 1);
    }

    #[test]
    fn test_summary_compounds_fee_saving() {
        let h = Holding {
            wrapper: WrapperType::LifeInsurance,
            opened_on: date(2015, 1, 1),
            balance: dec!(100_000),
            lines: vec![line(US_EQUITY, dec!(100_000), dec!(1.07))],
        };
        let out = review_portfolio(&input(vec![h])).unwrap();
        let s = &out.result.summary;
        assert_eq!(s.annual_fee_saving, dec!(1_000));
        assert_eq!(
            s.compounded_fee_saving,
            future_value_of_annuity(dec!(1_000), 10, dec!(0.05)).unwrap()
        );
    }

    #[test]
    fn test_wrapper_without_lines_is_available_for_recommendation() {
        let av = Holding {
            wrapper: WrapperType::LifeInsurance,
            opened_on: date(2012, 1, 1),
            balance: dec!(80_000),
            lines: vec![],
        };
        let cto = Holding {
            wrapper: WrapperType::SecuritiesAccount,
            opened_on: date(2020, 1, 1),
            balance: dec!(20_000),
            lines: vec![line(EURO_GOVERNMENT_BONDS, dec!(20_000), dec!(0.09))],
        };
        let out = review_portfolio(&input(vec![av, cto])).unwrap();
        let p = &out.result.placements[0];
        assert_eq!(p.wrapper, WrapperType::SecuritiesAccount);
        assert_eq!(p.recommended_wrapper, Some(WrapperType::LifeInsurance));
        assert!(p.recommendation_ranked);
        assert_eq!(out.result.relocations.len(), 1);
        assert_eq!(out.result.relocations[0].recommended_wrapper, WrapperType::LifeInsurance);
    }

    #[test]
    fn test_overflowing_projection_horizon_is_rejected() {
        let h = Holding {
            wrapper: WrapperType::LifeInsurance,
            opened_on: date(2015, 1, 1),
            balance: dec!(100_000),
            lines: vec![line(US_EQUITY, dec!(100_000), dec!(1.07))],
        };
        let mut review = input(vec![h]);
        review.projection_years = 2_000;
        assert!(review_portfolio(&review).is_err());
    }
}
