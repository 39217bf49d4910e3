use chrono::NaiveDate;
use fintax_core::optimization::asset_location::{
    self, Allocation, AllocationQuality, AssetLocationInput, PriorityTable,
};
use fintax_core::optimization::catalog::{categories, CatalogInstrument, InstrumentCatalog};
use fintax_core::optimization::substitution::{self, SubstitutionInput};
use fintax_core::{Holding, InstrumentLine, MarketAssumptions, WrapperType};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Helpers
// ===========================================================================

fn line(name: &str, category: &str, amount: Decimal, fee: Decimal) -> InstrumentLine {
    InstrumentLine {
        identifier: None,
        name: name.to_string(),
        amount,
        fee_rate_pct: fee,
        category: category.to_string(),
    }
}

fn holding(wrapper: WrapperType, lines: Vec<InstrumentLine>) -> Holding {
    Holding {
        wrapper,
        opened_on: NaiveDate::from_ymd_opt(2019, 9, 1).unwrap(),
        balance: lines.iter().map(|l| l.amount).sum(),
        lines,
    }
}

fn alloc(wrapper: WrapperType, category: &str, amount: Decimal) -> Allocation {
    Allocation {
        wrapper,
        category: category.to_string(),
        amount,
    }
}

// ===========================================================================
// Asset location
// ===========================================================================

#[test]
fn test_allocations_grouped_by_wrapper_and_category() {
    let holdings = vec![
        holding(
            WrapperType::LifeInsurance,
            vec![
                line("A", categories::BONDS, dec!(10_000), dec!(0.5)),
                line("B", categories::BONDS, dec!(5_000), dec!(0.5)),
            ],
        ),
        holding(
            WrapperType::EquitySavingsPlan,
            vec![line("C", categories::FRENCH_EQUITY, dec!(7_000), dec!(0.25))],
        ),
    ];
    let allocations = asset_location::allocations_from_holdings(&holdings);
    assert_eq!(
        allocations,
        vec![
            alloc(WrapperType::EquitySavingsPlan, categories::FRENCH_EQUITY, dec!(7_000)),
            alloc(WrapperType::LifeInsurance, categories::BONDS, dec!(15_000)),
        ]
    );
}

#[test]
fn test_concentration_in_bad_wrapper_hurts_more() {
    let t = PriorityTable::default();
    let small_mistake = [
        alloc(WrapperType::LifeInsurance, categories::GLOBAL_EQUITY, dec!(95_000)),
        alloc(WrapperType::EquitySavingsPlan, categories::GOLD, dec!(5_000)),
    ];
    let big_mistake = [
        alloc(WrapperType::LifeInsurance, categories::GLOBAL_EQUITY, dec!(5_000)),
        alloc(WrapperType::EquitySavingsPlan, categories::GOLD, dec!(95_000)),
    ];
    let small = asset_location::score_portfolio(&small_mistake, &t).unwrap();
    let big = asset_location::score_portfolio(&big_mistake, &t).unwrap();
    assert_eq!(small, dec!(97));
    assert_eq!(big, dec!(43));
}

#[test]
fn test_injected_priority_table() {
    let mut t = PriorityTable::default();
    t.priorities.insert(
        "Crypto".to_string(),
        vec![WrapperType::CorporateHolding, WrapperType::SecuritiesAccount],
    );
    assert_eq!(
        asset_location::evaluate_placement("Crypto", WrapperType::SecuritiesAccount, &t),
        AllocationQuality::Acceptable
    );
}

#[test]
fn test_location_envelope_with_explicit_available_wrappers() {
    let out = asset_location::analyze_asset_location(&AssetLocationInput {
        allocations: vec![alloc(WrapperType::SecuritiesAccount, categories::EURO_CORPORATE_BONDS, dec!(30_000))],
        available_wrappers: Some(vec![WrapperType::SecuritiesAccount, WrapperType::RetirementSavingsPlan]),
        priority_table: PriorityTable::default(),
    })
    .unwrap();
    let p = &out.result.placements[0];
    assert_eq!(p.quality, AllocationQuality::Suboptimal);
    assert_eq!(p.recommended_wrapper, Some(WrapperType::RetirementSavingsPlan));
    assert!(p.recommendation_ranked);
    assert_eq!(out.result.score, dec!(40));
}

// ===========================================================================
// Substitutions
// ===========================================================================

#[test]
fn test_injected_catalog_is_used() {
    let catalog = InstrumentCatalog::new(vec![CatalogInstrument {
        identifier: "FR0007052782".into(),
        name: "House CAC fund".into(),
        category: categories::FRENCH_EQUITY.into(),
        fee_rate_pct: dec!(0.05),
        pea_eligible: true,
        fund_size: None,
    }]);
    let holdings = [holding(
        WrapperType::EquitySavingsPlan,
        vec![line("Bank CAC", categories::FRENCH_EQUITY, dec!(40_000), dec!(0.25))],
    )];
    let p = substitution::propose_substitutions(&holdings, &catalog, dec!(0.05)).unwrap();
    assert_eq!(p.len(), 1);
    assert_eq!(p[0].annual_saving, dec!(80));
}

#[test]
fn test_zero_yield_saving_is_linear() {
    let holdings = [holding(
        WrapperType::SecuritiesAccount,
        vec![line("Gold ETC", categories::GOLD, dec!(10_000), dec!(0.40))],
    )];
    let p = substitution::propose_substitutions(&holdings, &InstrumentCatalog::default(), Decimal::ZERO).unwrap();
    assert_eq!(p[0].annual_saving, dec!(28));
    assert_eq!(p[0].ten_year_saving, dec!(280));
}

#[test]
fn test_substitution_envelope_from_json_document() {
    let json = r#"{
        "holdings": [{
            "wrapper": "PEA",
            "opened_on": "2017-05-02",
            "balance": "30000",
            "lines": [
                { "name": "Bank Europe", "amount": "30000", "fee_rate_pct": "1.2", "category": "Actions Europe" }
            ]
        }]
    }"#;
    let input: SubstitutionInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.assumptions, MarketAssumptions::default());
    let out = substitution::recommend_substitutions(&input).unwrap();
    let p = &out.result.proposals[0];
    assert_eq!(p.recommended.identifier, "FR0013412012");
    // 30,000 x (1.2 - 0.18) / 100
    assert_eq!(out.result.total_annual_saving, dec!(306));
}
