//! Household-level inputs shared by every engine module: wrapper types, the
//! taxpayer profile, holdings and their instrument lines.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FintaxError;
use crate::types::{Money, Rate, Years};
use crate::FintaxResult;

const DAYS_PER_YEAR: Decimal = dec!(365.25);

// ---------------------------------------------------------------------------
// Wrapper types
// ---------------------------------------------------------------------------

/// Investment wrapper ("enveloppe") holding a household's assets.
///
/// Closed set: every rule in the engine matches on all five variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WrapperType {
    /// PEA: equity savings plan, income-tax exempt after five years.
    #[serde(rename = "PEA")]
    EquitySavingsPlan,
    /// CTO: ordinary securities account.
    #[serde(rename = "CTO")]
    SecuritiesAccount,
    /// AV: life-insurance contract.
    #[serde(rename = "AV")]
    LifeInsurance,
    /// PER: retirement savings plan with deductible contributions.
    #[serde(rename = "PER")]
    RetirementSavingsPlan,
    /// IS: shares held through a company subject to corporate tax.
    #[serde(rename = "IS")]
    CorporateHolding,
}

impl WrapperType {
    pub const ALL: [WrapperType; 5] = [
        WrapperType::EquitySavingsPlan,
        WrapperType::SecuritiesAccount,
        WrapperType::LifeInsurance,
        WrapperType::RetirementSavingsPlan,
        WrapperType::CorporateHolding,
    ];

    /// Short market code ("PEA", "CTO", ...).
    pub fn code(self) -> &'static str {
        match self {
            WrapperType::EquitySavingsPlan => "PEA",
            WrapperType::SecuritiesAccount => "CTO",
            WrapperType::LifeInsurance => "AV",
            WrapperType::RetirementSavingsPlan => "PER",
            WrapperType::CorporateHolding => "IS",
        }
    }
}

impl fmt::Display for WrapperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Taxpayer profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
    /// Civil partnership (PACS).
    Pacsed,
    Divorced,
    Widowed,
}

impl MaritalStatus {
    /// Married and pacsed households file jointly and get the couple
    /// life-insurance allowance.
    pub fn is_joint(self) -> bool {
        match self {
            MaritalStatus::Married | MaritalStatus::Pacsed => true,
            MaritalStatus::Single | MaritalStatus::Divorced | MaritalStatus::Widowed => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxpayerProfile {
    /// Marginal income-tax rate (TMI). Must sit on the rate table's ladder.
    pub marginal_rate: Rate,
    pub marital_status: MaritalStatus,
    /// Opt into the progressive scale instead of the flat tax on CTO income.
    #[serde(default)]
    pub use_progressive_option: bool,
    #[serde(default)]
    pub professional_annual_income: Money,
    /// Retirement-plan deduction already consumed this year.
    #[serde(default)]
    pub retirement_deduction_used: Money,
}

impl TaxpayerProfile {
    /// Reject profiles whose marginal rate is off the ladder or whose money
    /// fields are negative.
    pub fn validate(&self, ladder: &[Rate]) -> FintaxResult<()> {
        if !ladder.contains(&self.marginal_rate) {
            let rungs: Vec<String> = ladder.iter().map(|r| r.to_string()).collect();
            return Err(FintaxError::invalid(
                "profile.marginal_rate",
                format!(
                    "{} is not on the marginal-rate ladder [{}]",
                    self.marginal_rate,
                    rungs.join(", ")
                ),
            ));
        }
        if self.professional_annual_income < Decimal::ZERO {
            return Err(FintaxError::invalid(
                "profile.professional_annual_income",
                "cannot be negative",
            ));
        }
        if self.retirement_deduction_used < Decimal::ZERO {
            return Err(FintaxError::invalid(
                "profile.retirement_deduction_used",
                "cannot be negative",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Holdings
// ---------------------------------------------------------------------------

/// One position inside a wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentLine {
    /// ISIN-shaped code, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub name: String,
    pub amount: Money,
    /// Annual management fee in percent (0.18 = 0.18%).
    pub fee_rate_pct: Decimal,
    /// Asset-class label, e.g. "Actions Monde".
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub wrapper: WrapperType,
    pub opened_on: NaiveDate,
    pub balance: Money,
    #[serde(default)]
    pub lines: Vec<InstrumentLine>,
}

impl Holding {
    /// Age of the holding at `as_of`, in years.
    pub fn age_years(&self, as_of: NaiveDate) -> Years {
        holding_age_years(self.opened_on, as_of)
    }

    /// Reject negative money, negative fees and opening dates after `as_of`.
    /// `index` only labels the error path.
    pub fn validate(&self, index: usize, as_of: NaiveDate) -> FintaxResult<()> {
        if self.opened_on > as_of {
            return Err(FintaxError::invalid(
                format!("holdings[{index}].opened_on"),
                format!("{} is after the valuation date {}", self.opened_on, as_of),
            ));
        }
        self.validate_amounts(index)
    }

    /// Money and fee checks only, for callers that have no valuation date.
    pub fn validate_amounts(&self, index: usize) -> FintaxResult<()> {
        if self.balance < Decimal::ZERO {
            return Err(FintaxError::invalid(
                format!("holdings[{index}].balance"),
                "cannot be negative",
            ));
        }
        for (j, line) in self.lines.iter().enumerate() {
            if line.amount < Decimal::ZERO {
                return Err(FintaxError::invalid(
                    format!("holdings[{index}].lines[{j}].amount"),
                    "cannot be negative",
                ));
            }
            if line.fee_rate_pct < Decimal::ZERO {
                return Err(FintaxError::invalid(
                    format!("holdings[{index}].lines[{j}].fee_rate_pct"),
                    "cannot be negative",
                ));
            }
        }
        Ok(())
    }
}

/// Years elapsed between `opened_on` and `as_of`, clamped at zero so clock
/// skew never yields a negative age.
pub fn holding_age_years(opened_on: NaiveDate, as_of: NaiveDate) -> Years {
    let days = (as_of - opened_on).num_days();
    (Decimal::from(days) / DAYS_PER_YEAR).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> Vec<Rate> {
        vec![dec!(0), dec!(0.11), dec!(0.30), dec!(0.41), dec!(0.45)]
    }

    fn profile() -> TaxpayerProfile {
        TaxpayerProfile {
            marginal_rate: dec!(0.30),
            marital_status: MaritalStatus::Married,
            use_progressive_option: false,
            professional_annual_income: dec!(60_000),
            retirement_deduction_used: Decimal::ZERO,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_wrapper_codes_round_trip_through_serde() {
        for wrapper in WrapperType::ALL {
            let json = serde_json::to_string(&wrapper).unwrap();
            assert_eq!(json, format!("\"{}\"", wrapper.code()));
            let back: WrapperType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, wrapper);
        }
    }

    #[test]
    fn test_unknown_wrapper_code_is_rejected() {
        let parsed: Result<WrapperType, _> = serde_json::from_str("\"LIVRET_A\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_joint_statuses() {
        assert!(MaritalStatus::Married.is_joint());
        assert!(MaritalStatus::Pacsed.is_joint());
        assert!(!MaritalStatus::Single.is_joint());
        assert!(!MaritalStatus::Divorced.is_joint());
        assert!(!MaritalStatus::Widowed.is_joint());
    }

    #[test]
    fn test_profile_off_ladder_rejected() {
        let mut p = profile();
        p.marginal_rate = dec!(0.25);
        let err = p.validate(&ladder()).unwrap_err();
        assert!(err.to_string().contains("profile.marginal_rate"));
    }

    #[test]
    fn test_profile_negative_income_rejected() {
        let mut p = profile();
        p.professional_annual_income = dec!(-1);
        assert!(p.validate(&ladder()).is_err());
        assert!(profile().validate(&ladder()).is_ok());
    }

    #[test]
    fn test_age_is_clamped_at_zero() {
        assert_eq!(holding_age_years(date(2024, 6, 1), date(2024, 1, 1)), Decimal::ZERO);
    }

    #[test]
    fn test_age_in_years() {
        // 1461 days = 4 * 365.25
        let age = holding_age_years(date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(age, dec!(4));
    }

    #[test]
    fn test_future_opening_date_rejected() {
        let h = Holding {
            wrapper: WrapperType::EquitySavingsPlan,
            opened_on: date(2025, 1, 1),
            balance: dec!(1_000),
            lines: vec![],
        };
        let err = h.validate(3, date(2024, 1, 1)).unwrap_err();
        assert!(err.to_string().contains("holdings[3].opened_on"));
    }

    #[test]
    fn test_negative_line_fee_rejected() {
        let h = Holding {
            wrapper: WrapperType::SecuritiesAccount,
            opened_on: date(2020, 1, 1),
            balance: dec!(1_000),
            lines: vec![InstrumentLine {
                identifier: None,
                name: "Fund".into(),
                amount: dec!(1_000),
                fee_rate_pct: dec!(-0.1),
                category: "Actions Monde".into(),
            }],
        };
        let err = h.validate(0, date(2024, 1, 1)).unwrap_err();
        assert!(err.to_string().contains("lines[0].fee_rate_pct"));
    }
}
