//! Asset location: which wrapper each asset class should sit in, how well an
//! existing allocation follows that ranking, and a 0-100 portfolio score.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::error::FintaxError;
use crate::optimization::catalog::categories;
use crate::profile::{Holding, WrapperType};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::FintaxResult;

// ---------------------------------------------------------------------------
// Priority table
// ---------------------------------------------------------------------------

/// Preferred wrappers per asset class, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityTable {
    pub priorities: BTreeMap<String, Vec<WrapperType>>,
    /// Ordering used for categories missing from `priorities`.
    pub fallback: Vec<WrapperType>,
}

impl Default for PriorityTable {
    fn default() -> Self {
        use categories::*;
        use crate::profile::WrapperType::*;

        let equity_plan_first = vec![
            EquitySavingsPlan,
            LifeInsurance,
            SecuritiesAccount,
            RetirementSavingsPlan,
            CorporateHolding,
        ];
        let foreign_equity = vec![
            LifeInsurance,
            SecuritiesAccount,
            RetirementSavingsPlan,
            CorporateHolding,
            EquitySavingsPlan,
        ];
        let bonds = vec![
            LifeInsurance,
            RetirementSavingsPlan,
            SecuritiesAccount,
            CorporateHolding,
            EquitySavingsPlan,
        ];
        let euro_bonds = vec![
            LifeInsurance,
            RetirementSavingsPlan,
            SecuritiesAccount,
            CorporateHolding,
        ];
        let real_estate = vec![
            LifeInsurance,
            SecuritiesAccount,
            CorporateHolding,
            RetirementSavingsPlan,
        ];

        let mut priorities = BTreeMap::new();
        priorities.insert(EUROPEAN_EQUITY.to_string(), equity_plan_first.clone());
        priorities.insert(FRENCH_EQUITY.to_string(), equity_plan_first);
        priorities.insert(GLOBAL_EQUITY.to_string(), foreign_equity.clone());
        priorities.insert(US_EQUITY.to_string(), foreign_equity.clone());
        priorities.insert(EMERGING_EQUITY.to_string(), foreign_equity);
        priorities.insert(BONDS.to_string(), bonds.clone());
        priorities.insert(GLOBAL_BONDS.to_string(), bonds);
        priorities.insert(EURO_CORPORATE_BONDS.to_string(), euro_bonds.clone());
        priorities.insert(EURO_GOVERNMENT_BONDS.to_string(), euro_bonds);
        priorities.insert(
            EURO_FUND.to_string(),
            vec![LifeInsurance, RetirementSavingsPlan],
        );
        priorities.insert(REAL_ESTATE.to_string(), real_estate.clone());
        priorities.insert(EUROPEAN_REAL_ESTATE.to_string(), real_estate);
        priorities.insert(
            GOLD.to_string(),
            vec![SecuritiesAccount, LifeInsurance, CorporateHolding],
        );

        PriorityTable {
            priorities,
            fallback: vec![
                SecuritiesAccount,
                LifeInsurance,
                EquitySavingsPlan,
                RetirementSavingsPlan,
                CorporateHolding,
            ],
        }
    }
}

impl PriorityTable {
    /// Wrappers for `category`, best first. Unknown categories get the
    /// fallback ordering.
    pub fn rank_wrappers(&self, category: &str) -> &[WrapperType] {
        self.priorities
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&self.fallback)
    }

    pub fn is_known(&self, category: &str) -> bool {
        self.priorities.contains_key(category)
    }

    pub fn validate(&self) -> FintaxResult<()> {
        if self.fallback.is_empty() {
            return Err(FintaxError::invalid(
                "priority_table.fallback",
                "cannot be empty",
            ));
        }
        let lists = self
            .priorities
            .iter()
            .map(|(k, v)| (format!("priority_table.priorities[{k}]"), v))
            .chain(std::iter::once(("priority_table.fallback".to_string(), &self.fallback)));
        for (field, list) in lists {
            for (i, w) in list.iter().enumerate() {
                if list[..i].contains(w) {
                    return Err(FintaxError::invalid(field, format!("{w} listed twice")));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Placement quality
// ---------------------------------------------------------------------------

/// Ordered best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationQuality {
    Optimal,
    Acceptable,
    Suboptimal,
}

impl AllocationQuality {
    /// Rank 0 is optimal, rank 1 acceptable, anything else (or unranked)
    /// suboptimal.
    pub fn from_rank(rank: Option<usize>) -> Self {
        match rank {
            Some(0) => AllocationQuality::Optimal,
            Some(1) => AllocationQuality::Acceptable,
            _ => AllocationQuality::Suboptimal,
        }
    }

    /// Score weight of a placement.
    pub fn points(self) -> Decimal {
        match self {
            AllocationQuality::Optimal => dec!(100),
            AllocationQuality::Acceptable => dec!(70),
            AllocationQuality::Suboptimal => dec!(40),
        }
    }
}

impl fmt::Display for AllocationQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AllocationQuality::Optimal => "optimal",
            AllocationQuality::Acceptable => "acceptable",
            AllocationQuality::Suboptimal => "suboptimal",
        };
        f.write_str(s)
    }
}

pub fn evaluate_placement(category: &str, held: WrapperType, table: &PriorityTable) -> AllocationQuality {
    let rank = table.rank_wrappers(category).iter().position(|w| *w == held);
    AllocationQuality::from_rank(rank)
}

/// Best-ranked wrapper for `category` among `available`.
///
/// When no ranked wrapper is available, returns the first available one;
/// callers that need to tell the two cases apart check membership in
/// [`PriorityTable::rank_wrappers`]. `None` only when `available` is empty.
pub fn recommend_wrapper(
    category: &str,
    available: &[WrapperType],
    table: &PriorityTable,
) -> Option<WrapperType> {
    table
        .rank_wrappers(category)
        .iter()
        .find(|w| available.contains(*w))
        .or_else(|| available.first())
        .copied()
}

// ---------------------------------------------------------------------------
// Portfolio score
// ---------------------------------------------------------------------------

/// Amount held in one wrapper for one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub wrapper: WrapperType,
    pub category: String,
    pub amount: Money,
}

/// Amount-weighted placement score in [0, 100]: optimal money counts 100,
/// acceptable 70, suboptimal 40. An empty or all-zero portfolio scores 0.
pub fn score_portfolio(allocations: &[Allocation], table: &PriorityTable) -> FintaxResult<Decimal> {
    let mut total = Decimal::ZERO;
    let mut weighted = Decimal::ZERO;
    for (i, a) in allocations.iter().enumerate() {
        if a.amount < Decimal::ZERO {
            return Err(FintaxError::invalid(
                format!("allocations[{i}].amount"),
                "cannot be negative",
            ));
        }
        total += a.amount;
        weighted += a.amount * evaluate_placement(&a.category, a.wrapper, table).points();
    }
    if total.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok(weighted / total)
}

/// Sum instrument lines by (wrapper, category), in wrapper then category
/// order. Holdings without lines contribute nothing.
pub fn allocations_from_holdings(holdings: &[Holding]) -> Vec<Allocation> {
    let mut grouped: BTreeMap<(WrapperType, &str), Money> = BTreeMap::new();
    for holding in holdings {
        for line in &holding.lines {
            *grouped
                .entry((holding.wrapper, line.category.as_str()))
                .or_insert(Decimal::ZERO) += line.amount;
        }
    }
    grouped
        .into_iter()
        .map(|((wrapper, category), amount)| Allocation {
            wrapper,
            category: category.to_string(),
            amount,
        })
        .collect()
}

/// Distinct wrappers the household holds, in first-seen order, including
/// holdings reported without line detail.
pub fn holding_wrappers(holdings: &[Holding]) -> Vec<WrapperType> {
    let mut held = Vec::new();
    for h in holdings {
        if !held.contains(&h.wrapper) {
            held.push(h.wrapper);
        }
    }
    held
}

/// Distinct wrappers present in `allocations`, in first-seen order.
pub fn wrappers_held(allocations: &[Allocation]) -> Vec<WrapperType> {
    let mut held = Vec::new();
    for a in allocations {
        if !held.contains(&a.wrapper) {
            held.push(a.wrapper);
        }
    }
    held
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementAssessment {
    pub wrapper: WrapperType,
    pub category: String,
    pub amount: Money,
    pub quality: AllocationQuality,
    /// Position of `wrapper` in the category's ranking, if listed.
    pub rank: Option<usize>,
    pub recommended_wrapper: Option<WrapperType>,
    /// False when the recommendation is the first available wrapper because
    /// none of the ranked ones is available.
    pub recommendation_ranked: bool,
    pub known_category: bool,
}

pub fn assess_placements(
    allocations: &[Allocation],
    available: &[WrapperType],
    table: &PriorityTable,
) -> Vec<PlacementAssessment> {
    allocations
        .iter()
        .map(|a| {
            let ranking = table.rank_wrappers(&a.category);
            let rank = ranking.iter().position(|w| *w == a.wrapper);
            let recommended_wrapper = recommend_wrapper(&a.category, available, table);
            PlacementAssessment {
                wrapper: a.wrapper,
                category: a.category.clone(),
                amount: a.amount,
                quality: AllocationQuality::from_rank(rank),
                rank,
                recommended_wrapper,
                recommendation_ranked: recommended_wrapper.is_some_and(|w| ranking.contains(&w)),
                known_category: table.is_known(&a.category),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetLocationInput {
    pub allocations: Vec<Allocation>,
    /// Wrappers the household can use. Defaults to the ones already held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_wrappers: Option<Vec<WrapperType>>,
    #[serde(default)]
    pub priority_table: PriorityTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetLocationOutput {
    pub placements: Vec<PlacementAssessment>,
    pub score: Decimal,
    pub total_amount: Money,
}

pub fn analyze_asset_location(
    input: &AssetLocationInput,
) -> FintaxResult<ComputationOutput<AssetLocationOutput>> {
    input.priority_table.validate()?;
    debug!(allocations = input.allocations.len(), "analyze_asset_location");

    let score = score_portfolio(&input.allocations, &input.priority_table)?;
    let available = input
        .available_wrappers
        .clone()
        .unwrap_or_else(|| wrappers_held(&input.allocations));
    let placements = assess_placements(&input.allocations, &available, &input.priority_table);
    let total_amount = input.allocations.iter().map(|a| a.amount).sum();

    let mut warnings = Vec::new();
    if input.allocations.is_empty() {
        warnings.push("No allocations supplied; score is 0.".into());
    }
    for p in &placements {
        if !p.known_category {
            warnings.push(format!(
                "Unknown category '{}': fallback wrapper ordering used.",
                p.category
            ));
        }
        if !p.recommendation_ranked && p.recommended_wrapper.is_some() {
            warnings.push(format!(
                "No ranked wrapper available for '{}'; recommendation is a fallback.",
                p.category
            ));
        }
    }

    Ok(with_metadata(
        "Asset location: rank 0 optimal (100), rank 1 acceptable (70), otherwise suboptimal (40); \
         score weighted by amount",
        &serde_json::json!({
            "available_wrappers": &available,
            "fallback_ordering": &input.priority_table.fallback,
        }),
        warnings,
        None,
        AssetLocationOutput {
            placements,
            score,
            total_amount,
        },
    ))
}
