//! Fiscal-year rate tables. Tax law changes every year, so every constant the
//! resolver and computer use lives here and travels as a value.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FintaxError;
use crate::profile::MaritalStatus;
use crate::types::{Money, Rate, Years};
use crate::FintaxResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One slice of the progressive income-tax scale, per household part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub lower: Money,
    /// `None` for the open-ended top bracket.
    pub upper: Option<Money>,
    pub rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPlanRules {
    /// Holding age from which PEA gains leave income tax.
    pub exemption_years: Years,
    /// Cap on cumulative contributions to a standard PEA.
    #[serde(default = "default_equity_plan_ceiling")]
    pub contribution_ceiling: Money,
}

fn default_equity_plan_ceiling() -> Money {
    dec!(150_000)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeInsuranceRules {
    /// Start of the middle tier (inclusive).
    pub mid_tier_years: Years,
    /// Start of the long tier (inclusive); the allowance applies from here.
    pub long_tier_years: Years,
    pub short_tier_rate: Rate,
    pub mid_tier_rate: Rate,
    pub long_tier_rate: Rate,
    pub allowance_single: Money,
    pub allowance_joint: Money,
}

/// Taxable share of an annuity for annuitants aged `from_age` and over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnuityBand {
    pub from_age: u32,
    pub taxable_fraction: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementRules {
    /// Minimum deduction cap whatever the professional income.
    pub deduction_floor: Money,
    /// Upper bound on the cap; `None` leaves the income-based cap unbounded.
    #[serde(default)]
    pub deduction_ceiling: Option<Money>,
    /// Share of professional income that may be deducted.
    pub deduction_income_share: Rate,
    /// Ascending by `from_age`, first band starting at zero.
    pub annuity_bands: Vec<AnnuityBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub fiscal_year: i32,
    pub income_tax_brackets: Vec<TaxBracket>,
    pub social_levy_rate: Rate,
    /// Income-tax share of the flat tax (PFU).
    pub flat_tax_income_rate: Rate,
    /// Corporate tax rate, used as the IS comparison proxy.
    pub corporate_tax_rate: Rate,
    pub equity_plan: EquityPlanRules,
    pub life_insurance: LifeInsuranceRules,
    pub retirement: RetirementRules,
}

// ---------------------------------------------------------------------------
// Shipped tables
// ---------------------------------------------------------------------------

impl RateTable {
    /// Rates applicable in 2024 (2023 income).
    pub fn fy2024() -> Self {
        RateTable {
            fiscal_year: 2024,
            income_tax_brackets: vec![
                TaxBracket { lower: dec!(0), upper: Some(dec!(11_294)), rate: dec!(0) },
                TaxBracket { lower: dec!(11_294), upper: Some(dec!(28_797)), rate: dec!(0.11) },
                TaxBracket { lower: dec!(28_797), upper: Some(dec!(82_341)), rate: dec!(0.30) },
                TaxBracket { lower: dec!(82_341), upper: Some(dec!(177_106)), rate: dec!(0.41) },
                TaxBracket { lower: dec!(177_106), upper: None, rate: dec!(0.45) },
            ],
            social_levy_rate: dec!(0.172),
            flat_tax_income_rate: dec!(0.128),
            corporate_tax_rate: dec!(0.25),
            equity_plan: EquityPlanRules {
                exemption_years: dec!(5),
                contribution_ceiling: dec!(150_000),
            },
            life_insurance: LifeInsuranceRules {
                mid_tier_years: dec!(4),
                long_tier_years: dec!(8),
                short_tier_rate: dec!(0.35),
                mid_tier_rate: dec!(0.15),
                long_tier_rate: dec!(0.075),
                allowance_single: dec!(4_600),
                allowance_joint: dec!(9_200),
            },
            retirement: RetirementRules {
                deduction_floor: dec!(4_399),
                deduction_ceiling: Some(dec!(35_194)),
                deduction_income_share: dec!(0.10),
                annuity_bands: vec![
                    AnnuityBand { from_age: 0, taxable_fraction: dec!(0.70) },
                    AnnuityBand { from_age: 50, taxable_fraction: dec!(0.50) },
                    AnnuityBand { from_age: 60, taxable_fraction: dec!(0.40) },
                    AnnuityBand { from_age: 70, taxable_fraction: dec!(0.30) },
                ],
            },
        }
    }

    /// Income-tax plus social-levy share of the flat tax (30% in 2024).
    pub fn flat_tax_rate(&self) -> Rate {
        self.flat_tax_income_rate + self.social_levy_rate
    }

    /// Distinct bracket rates, in bracket order. A profile's marginal rate
    /// must be one of these.
    pub fn marginal_rate_ladder(&self) -> Vec<Rate> {
        let mut ladder: Vec<Rate> = Vec::with_capacity(self.income_tax_brackets.len());
        for bracket in &self.income_tax_brackets {
            if !ladder.contains(&bracket.rate) {
                ladder.push(bracket.rate);
            }
        }
        ladder
    }

    /// Life-insurance allowance for the household's filing status.
    pub fn life_insurance_allowance(&self, status: MaritalStatus) -> Money {
        if status.is_joint() {
            self.life_insurance.allowance_joint
        } else {
            self.life_insurance.allowance_single
        }
    }

    /// Check the table is internally consistent before it is used.
    pub fn validate(&self) -> FintaxResult<()> {
        validate_brackets(&self.income_tax_brackets)?;

        check_rate("rate_table.social_levy_rate", self.social_levy_rate)?;
        check_rate("rate_table.flat_tax_income_rate", self.flat_tax_income_rate)?;
        check_rate("rate_table.corporate_tax_rate", self.corporate_tax_rate)?;

        let li = &self.life_insurance;
        check_rate("rate_table.life_insurance.short_tier_rate", li.short_tier_rate)?;
        check_rate("rate_table.life_insurance.mid_tier_rate", li.mid_tier_rate)?;
        check_rate("rate_table.life_insurance.long_tier_rate", li.long_tier_rate)?;
        if li.mid_tier_years <= Decimal::ZERO || li.long_tier_years <= li.mid_tier_years {
            return Err(FintaxError::invalid(
                "rate_table.life_insurance",
                "tier boundaries must satisfy 0 < mid_tier_years < long_tier_years",
            ));
        }
        if li.allowance_single < Decimal::ZERO || li.allowance_joint < Decimal::ZERO {
            return Err(FintaxError::invalid(
                "rate_table.life_insurance",
                "allowances cannot be negative",
            ));
        }
        if self.equity_plan.exemption_years < Decimal::ZERO {
            return Err(FintaxError::invalid(
                "rate_table.equity_plan.exemption_years",
                "cannot be negative",
            ));
        }
        if self.equity_plan.contribution_ceiling <= Decimal::ZERO {
            return Err(FintaxError::invalid(
                "rate_table.equity_plan.contribution_ceiling",
                "must be positive",
            ));
        }

        let ret = &self.retirement;
        check_rate("rate_table.retirement.deduction_income_share", ret.deduction_income_share)?;
        if ret.deduction_floor < Decimal::ZERO {
            return Err(FintaxError::invalid(
                "rate_table.retirement.deduction_floor",
                "cannot be negative",
            ));
        }
        if let Some(ceiling) = ret.deduction_ceiling {
            if ceiling < ret.deduction_floor {
                return Err(FintaxError::invalid(
                    "rate_table.retirement.deduction_ceiling",
                    "cannot be below the deduction floor",
                ));
            }
        }
        validate_annuity_bands(&ret.annuity_bands)?;

        // Combined rates must stay within [0, 1] for every wrapper.
        let top_marginal = self
            .income_tax_brackets
            .iter()
            .map(|b| b.rate)
            .max()
            .unwrap_or(Decimal::ZERO);
        let combined = [
            ("marginal rate + social levy", top_marginal + self.social_levy_rate),
            ("flat tax", self.flat_tax_rate()),
            (
                "life insurance + social levy",
                li.short_tier_rate.max(li.mid_tier_rate).max(li.long_tier_rate)
                    + self.social_levy_rate,
            ),
        ];
        for (label, rate) in combined {
            if rate > Decimal::ONE {
                return Err(FintaxError::invalid(
                    "rate_table",
                    format!("{label} exceeds 100% ({rate})"),
                ));
            }
        }
        Ok(())
    }
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable::fy2024()
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn check_rate(field: &str, rate: Rate) -> FintaxResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(FintaxError::invalid(field, "must be between 0 and 1"));
    }
    Ok(())
}

fn validate_brackets(brackets: &[TaxBracket]) -> FintaxResult<()> {
    let Some(first) = brackets.first() else {
        return Err(FintaxError::invalid(
            "rate_table.income_tax_brackets",
            "at least one bracket is required",
        ));
    };
    if !first.lower.is_zero() {
        return Err(FintaxError::invalid(
            "rate_table.income_tax_brackets[0].lower",
            "the first bracket must start at zero",
        ));
    }
    for (i, bracket) in brackets.iter().enumerate() {
        check_rate(&format!("rate_table.income_tax_brackets[{i}].rate"), bracket.rate)?;
        match (bracket.upper, brackets.get(i + 1)) {
            (Some(upper), Some(next)) => {
                if upper <= bracket.lower || upper != next.lower {
                    return Err(FintaxError::invalid(
                        format!("rate_table.income_tax_brackets[{i}].upper"),
                        "brackets must be ascending and contiguous",
                    ));
                }
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(FintaxError::invalid(
                    format!("rate_table.income_tax_brackets[{i}].upper"),
                    "the top bracket must be open-ended",
                ));
            }
            (None, Some(_)) => {
                return Err(FintaxError::invalid(
                    format!("rate_table.income_tax_brackets[{i}].upper"),
                    "only the top bracket may be open-ended",
                ));
            }
        }
    }
    Ok(())
}

fn validate_annuity_bands(bands: &[AnnuityBand]) -> FintaxResult<()> {
    match bands.first() {
        Some(first) if first.from_age == 0 => {}
        _ => {
            return Err(FintaxError::invalid(
                "rate_table.retirement.annuity_bands",
                "the first band must start at age 0",
            ))
        }
    }
    for (i, band) in bands.iter().enumerate() {
        check_rate(
            &format!("rate_table.retirement.annuity_bands[{i}].taxable_fraction"),
            band.taxable_fraction,
        )?;
        if i > 0 && band.from_age <= bands[i - 1].from_age {
            return Err(FintaxError::invalid(
                format!("rate_table.retirement.annuity_bands[{i}].from_age"),
                "bands must be strictly ascending",
            ));
        }
    }
    Ok(())
}
