use chrono::NaiveDate;
use fintax_core::diagnostic::review::{self, PortfolioReviewInput};
use fintax_core::taxation::computer::{self, RetirementDeductionInput};
use fintax_core::taxation::drag::{self, DragPosition};
use fintax_core::taxation::rate_table::RateTable;
use fintax_core::{holding_age_years, MaritalStatus, MarketAssumptions, TaxpayerProfile, WrapperType};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// End-to-end scenarios
// ===========================================================================

fn married_at_30() -> TaxpayerProfile {
    TaxpayerProfile {
        marginal_rate: dec!(0.30),
        marital_status: MaritalStatus::Married,
        use_progressive_option: false,
        professional_annual_income: dec!(60_000),
        retirement_deduction_used: Decimal::ZERO,
    }
}

#[test]
fn test_equity_plan_opened_three_years_ago_drag() {
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let opened = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
    let e = drag::estimate_annual_drag(
        &DragPosition {
            wrapper: WrapperType::EquitySavingsPlan,
            balance: dec!(100_000),
            assumed_yield: dec!(0.02),
            holding_age_years: holding_age_years(opened, as_of),
            euro_fund_fraction: None,
        },
        &married_at_30(),
        &RateTable::fy2024(),
        &MarketAssumptions::default(),
    )
    .unwrap();
    // 100,000 x 0.02 x 0.472
    assert_eq!(e.drag_amount, dec!(944.0));
}

#[test]
fn test_life_insurance_ten_years_married_allowance_covers_gain() {
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let opened = NaiveDate::from_ymd_opt(2014, 6, 1).unwrap();
    let r = computer::compute_tax(
        WrapperType::LifeInsurance,
        &married_at_30(),
        holding_age_years(opened, as_of),
        dec!(2_000),
        &RateTable::fy2024(),
    )
    .unwrap();
    assert_eq!(r.tax_due, Decimal::ZERO);
    assert_eq!(r.allowance_applied, dec!(2_000));
}

#[test]
fn test_retirement_contribution_saves_three_thousand() {
    let out = computer::calculate_retirement_deduction(&RetirementDeductionInput {
        profile: TaxpayerProfile {
            professional_annual_income: dec!(120_000),
            ..married_at_30()
        },
        contribution: dec!(10_000),
        annuitant_age: None,
        rate_table: RateTable::default(),
    })
    .unwrap();
    assert_eq!(out.result.deduction.tax_saving, dec!(3_000));
    assert!(out.result.annuity_exit.is_none());
}

#[test]
fn test_full_review_from_json_document() {
    let json = r#"{
        "profile": { "marginal_rate": "0.30", "marital_status": "married", "professional_annual_income": "85000" },
        "as_of": "2024-06-30",
        "holdings": [
            {
                "wrapper": "PEA",
                "opened_on": "2016-02-15",
                "balance": "60000",
                "lines": [
                    { "identifier": "FR0007052782", "name": "Amundi CAC 40", "amount": "20000", "fee_rate_pct": "0.25", "category": "Actions France" },
                    { "name": "Bank Europe Fund", "amount": "40000", "fee_rate_pct": "1.60", "category": "Actions Europe" }
                ]
            },
            {
                "wrapper": "CTO",
                "opened_on": "2022-01-10",
                "balance": "30000",
                "lines": [
                    { "identifier": "LU1681043599", "name": "Amundi MSCI World", "amount": "30000", "fee_rate_pct": "0.18", "category": "Actions Monde" }
                ]
            },
            {
                "wrapper": "AV",
                "opened_on": "2012-09-01",
                "balance": "50000",
                "lines": [
                    { "name": "Euro fund", "amount": "50000", "fee_rate_pct": "0.60", "category": "Fonds Euro" }
                ]
            }
        ]
    }"#;
    let input: PortfolioReviewInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.assumed_yield, dec!(0.02));
    assert_eq!(input.projection_years, 10);

    let out = review::review_portfolio(&input).unwrap();
    let r = &out.result;

    assert_eq!(r.holdings.len(), 3);
    assert_eq!(r.summary.total_balance, dec!(140_000));

    // Only the bank fund has a cheaper eligible substitute: 40,000 x 1.42 / 100
    assert_eq!(r.proposals.len(), 1);
    assert_eq!(r.proposals[0].recommended.identifier, "FR0013412012");
    assert_eq!(r.summary.annual_fee_saving, dec!(568));
    assert_eq!(r.holdings[0].avoidable_fees, dec!(568));

    // Mature PEA pays social levy only on 1,200 of yield
    assert_eq!(r.holdings[0].drag.drag_amount, dec!(206.4));
    // CTO flat tax on 600
    assert_eq!(r.holdings[1].drag.drag_amount, dec!(180));

    // World equity held in the CTO is acceptable, the rest optimal:
    // (110,000 x 100 + 30,000 x 70) / 140,000
    let expected_score = dec!(13_100_000) / dec!(140_000);
    assert_eq!(r.location_score, expected_score);

    assert_eq!(r.relocations.len(), 1);
    assert_eq!(r.relocations[0].recommended_wrapper, WrapperType::LifeInsurance);
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
}
