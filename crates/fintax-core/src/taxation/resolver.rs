//! Rate resolution: which income-tax and social-levy rates apply to a gain
//! realised in a given wrapper, for a given taxpayer and holding age.
//!
//! Tier boundaries are inclusive on the upper side: a PEA exactly five years
//! old is already exempt, a life-insurance contract exactly eight years old
//! already gets the long-tier rate and allowance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use crate::profile::{TaxpayerProfile, WrapperType};
use crate::taxation::rate_table::RateTable;
use crate::types::{Rate, Years};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The rule that produced a resolved rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationTier {
    /// PEA younger than the exemption age: marginal rate + social levy.
    EquityPlanBeforeExemption,
    /// PEA at or past the exemption age: social levy only.
    EquityPlanExempt,
    /// CTO under the flat tax.
    FlatTax,
    /// CTO with the progressive-scale option.
    ProgressiveScale,
    LifeInsuranceShort,
    LifeInsuranceMid,
    /// Long tier, after the annual allowance.
    LifeInsuranceLong,
    /// Annual social levy on the euro-fund sleeve of a life-insurance contract.
    LifeInsuranceEuroFundLevy,
    RetirementLumpSum,
    RetirementAnnuity,
    /// PER while still accumulating: nothing is taxed until exit.
    RetirementDeferred,
    CorporateFlat,
}

impl DurationTier {
    pub fn label(self) -> &'static str {
        match self {
            DurationTier::EquityPlanBeforeExemption => "PEA before exemption age",
            DurationTier::EquityPlanExempt => "PEA past exemption age",
            DurationTier::FlatTax => "flat tax",
            DurationTier::ProgressiveScale => "progressive scale option",
            DurationTier::LifeInsuranceShort => "life insurance, short tier",
            DurationTier::LifeInsuranceMid => "life insurance, middle tier",
            DurationTier::LifeInsuranceLong => "life insurance, long tier",
            DurationTier::LifeInsuranceEuroFundLevy => "life insurance, annual euro-fund levy",
            DurationTier::RetirementLumpSum => "retirement plan, lump-sum exit",
            DurationTier::RetirementAnnuity => "retirement plan, annuity exit",
            DurationTier::RetirementDeferred => "retirement plan, taxation deferred to exit",
            DurationTier::CorporateFlat => "corporate tax proxy",
        }
    }

    /// Article of the French tax code (CGI) or social-security code (CSS)
    /// that sets the tier's rates.
    pub fn legal_reference(self) -> &'static str {
        match self {
            DurationTier::EquityPlanBeforeExemption => "CGI art. 150-0 A, II-1",
            DurationTier::EquityPlanExempt => "CGI art. 157, 5 bis",
            DurationTier::FlatTax => "CGI art. 200 A, 1",
            DurationTier::ProgressiveScale => "CGI art. 200 A, 2",
            DurationTier::LifeInsuranceShort
            | DurationTier::LifeInsuranceMid
            | DurationTier::LifeInsuranceLong => "CGI art. 125-0 A",
            DurationTier::LifeInsuranceEuroFundLevy => "CSS art. L136-7",
            DurationTier::RetirementLumpSum | DurationTier::RetirementDeferred => {
                "CGI art. 163 quatervicies"
            }
            DurationTier::RetirementAnnuity => "CGI art. 158, 6",
            DurationTier::CorporateFlat => "CGI art. 219",
        }
    }

    /// A withdrawal taxed under this tier closes the plan.
    pub fn closes_plan(self) -> bool {
        matches!(self, DurationTier::EquityPlanBeforeExemption)
    }
}

impl fmt::Display for DurationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An income-tax rate and a social-levy rate, and the tier that set them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub income_tax_rate: Rate,
    pub social_levy_rate: Rate,
    pub tier: DurationTier,
}

impl ResolvedRate {
    pub fn effective_rate(&self) -> Rate {
        self.income_tax_rate + self.social_levy_rate
    }
}

/// How money leaves a retirement plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RetirementExit {
    LumpSum,
    /// Life annuity; the taxable share depends on the age at first payment.
    Annuity { annuitant_age: u32 },
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the rates applicable to a gain realised in `wrapper` after
/// `age` years. The age is expected non-negative; callers validate it.
///
/// A retirement plan resolves to its lump-sum exit; use
/// [`resolve_retirement_exit`] for the annuity case.
pub fn resolve_rate(
    wrapper: WrapperType,
    profile: &TaxpayerProfile,
    age: Years,
    table: &RateTable,
) -> ResolvedRate {
    let social = table.social_levy_rate;

    let resolved = match wrapper {
        WrapperType::EquitySavingsPlan => {
            if age >= table.equity_plan.exemption_years {
                ResolvedRate {
                    income_tax_rate: Decimal::ZERO,
                    social_levy_rate: social,
                    tier: DurationTier::EquityPlanExempt,
                }
            } else {
                ResolvedRate {
                    income_tax_rate: profile.marginal_rate,
                    social_levy_rate: social,
                    tier: DurationTier::EquityPlanBeforeExemption,
                }
            }
        }
        WrapperType::SecuritiesAccount => {
            if profile.use_progressive_option {
                ResolvedRate {
                    income_tax_rate: profile.marginal_rate,
                    social_levy_rate: social,
                    tier: DurationTier::ProgressiveScale,
                }
            } else {
                ResolvedRate {
                    income_tax_rate: table.flat_tax_income_rate,
                    social_levy_rate: social,
                    tier: DurationTier::FlatTax,
                }
            }
        }
        WrapperType::LifeInsurance => {
            let li = &table.life_insurance;
            let (income_tax_rate, tier) = if age >= li.long_tier_years {
                (li.long_tier_rate, DurationTier::LifeInsuranceLong)
            } else if age >= li.mid_tier_years {
                (li.mid_tier_rate, DurationTier::LifeInsuranceMid)
            } else {
                (li.short_tier_rate, DurationTier::LifeInsuranceShort)
            };
            ResolvedRate {
                income_tax_rate,
                social_levy_rate: social,
                tier,
            }
        }
        WrapperType::RetirementSavingsPlan => {
            resolve_retirement_exit(RetirementExit::LumpSum, profile, table)
        }
        WrapperType::CorporateHolding => ResolvedRate {
            income_tax_rate: table.corporate_tax_rate,
            social_levy_rate: Decimal::ZERO,
            tier: DurationTier::CorporateFlat,
        },
    };

    trace!(%wrapper, %age, tier = %resolved.tier, "resolved rate");
    resolved
}

/// Rates on money leaving a retirement plan.
///
/// Lump sum: marginal rate plus social levy on the whole amount. Annuity:
/// only the age-banded taxable fraction is taxed, so both components are
/// scaled by that fraction.
pub fn resolve_retirement_exit(
    exit: RetirementExit,
    profile: &TaxpayerProfile,
    table: &RateTable,
) -> ResolvedRate {
    match exit {
        RetirementExit::LumpSum => ResolvedRate {
            income_tax_rate: profile.marginal_rate,
            social_levy_rate: table.social_levy_rate,
            tier: DurationTier::RetirementLumpSum,
        },
        RetirementExit::Annuity { annuitant_age } => {
            let fraction = annuity_taxable_fraction(annuitant_age, table);
            ResolvedRate {
                income_tax_rate: fraction * profile.marginal_rate,
                social_levy_rate: fraction * table.social_levy_rate,
                tier: DurationTier::RetirementAnnuity,
            }
        }
    }
}

/// Taxable share of an annuity first paid at `annuitant_age`. A table with no
/// bands taxes the whole annuity.
pub fn annuity_taxable_fraction(annuitant_age: u32, table: &RateTable) -> Rate {
    table
        .retirement
        .annuity_bands
        .iter()
        .rev()
        .find(|band| annuitant_age >= band.from_age)
        .map(|band| band.taxable_fraction)
        .unwrap_or(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::MaritalStatus;
    use rust_decimal_macros::dec;

    fn profile(marginal_rate: Rate) -> TaxpayerProfile {
        TaxpayerProfile {
            marginal_rate,
            marital_status: MaritalStatus::Single,
            use_progressive_option: false,
            professional_annual_income: Decimal::ZERO,
            retirement_deduction_used: Decimal::ZERO,
        }
    }

    fn resolve(wrapper: WrapperType, p: &TaxpayerProfile, age: Years) -> ResolvedRate {
        resolve_rate(wrapper, p, age, &RateTable::fy2024())
    }

    #[test]
    fn test_pea_boundary_belongs_to_exempt_tier() {
        let p = profile(dec!(0.30));
        let before = resolve(WrapperType::EquitySavingsPlan, &p, dec!(4.99));
        assert_eq!(before.income_tax_rate, dec!(0.30));
        assert_eq!(before.social_levy_rate, dec!(0.172));
        assert_eq!(before.tier, DurationTier::EquityPlanBeforeExemption);

        let at = resolve(WrapperType::EquitySavingsPlan, &p, dec!(5));
        assert_eq!(at.income_tax_rate, Decimal::ZERO);
        assert_eq!(at.social_levy_rate, dec!(0.172));
        assert_eq!(at.tier, DurationTier::EquityPlanExempt);
    }

    #[test]
    fn test_cto_flat_tax_ignores_age() {
        let p = profile(dec!(0.45));
        for age in [dec!(0), dec!(3), dec!(20)] {
            let r = resolve(WrapperType::SecuritiesAccount, &p, age);
            assert_eq!(r.income_tax_rate, dec!(0.128));
            assert_eq!(r.effective_rate(), dec!(0.30));
            assert_eq!(r.tier, DurationTier::FlatTax);
        }
    }

    #[test]
    fn test_cto_progressive_option_uses_marginal_rate() {
        let mut p = profile(dec!(0.11));
        p.use_progressive_option = true;
        let r = resolve(WrapperType::SecuritiesAccount, &p, dec!(1));
        assert_eq!(r.effective_rate(), dec!(0.282));
        assert_eq!(r.tier, DurationTier::ProgressiveScale);
    }

    #[test]
    fn test_life_insurance_tiers_and_boundaries() {
        let p = profile(dec!(0.30));
        let cases = [
            (dec!(0), dec!(0.35), DurationTier::LifeInsuranceShort),
            (dec!(3.99), dec!(0.35), DurationTier::LifeInsuranceShort),
            (dec!(4), dec!(0.15), DurationTier::LifeInsuranceMid),
            (dec!(7.99), dec!(0.15), DurationTier::LifeInsuranceMid),
            (dec!(8), dec!(0.075), DurationTier::LifeInsuranceLong),
            (dec!(25), dec!(0.075), DurationTier::LifeInsuranceLong),
        ];
        for (age, rate, tier) in cases {
            let r = resolve(WrapperType::LifeInsurance, &p, age);
            assert_eq!(r.income_tax_rate, rate, "age {age}");
            assert_eq!(r.social_levy_rate, dec!(0.172));
            assert_eq!(r.tier, tier);
        }
    }

    #[test]
    fn test_retirement_plan_resolves_to_lump_sum() {
        let p = profile(dec!(0.41));
        let r = resolve(WrapperType::RetirementSavingsPlan, &p, dec!(12));
        assert_eq!(r.income_tax_rate, dec!(0.41));
        assert_eq!(r.social_levy_rate, dec!(0.172));
        assert_eq!(r.tier, DurationTier::RetirementLumpSum);
    }

    #[test]
    fn test_annuity_fraction_bands() {
        let t = RateTable::fy2024();
        assert_eq!(annuity_taxable_fraction(45, &t), dec!(0.70));
        assert_eq!(annuity_taxable_fraction(49, &t), dec!(0.70));
        assert_eq!(annuity_taxable_fraction(50, &t), dec!(0.50));
        assert_eq!(annuity_taxable_fraction(59, &t), dec!(0.50));
        assert_eq!(annuity_taxable_fraction(60, &t), dec!(0.40));
        assert_eq!(annuity_taxable_fraction(69, &t), dec!(0.40));
        assert_eq!(annuity_taxable_fraction(70, &t), dec!(0.30));
        assert_eq!(annuity_taxable_fraction(95, &t), dec!(0.30));
    }

    #[test]
    fn test_annuity_exit_scales_both_components() {
        let p = profile(dec!(0.30));
        let r = resolve_retirement_exit(
            RetirementExit::Annuity { annuitant_age: 65 },
            &p,
            &RateTable::fy2024(),
        );
        // 40% of (30% + 17.2%)
        assert_eq!(r.income_tax_rate, dec!(0.12));
        assert_eq!(r.social_levy_rate, dec!(0.0688));
        assert_eq!(r.effective_rate(), dec!(0.1888));
        assert_eq!(r.tier, DurationTier::RetirementAnnuity);
    }

    #[test]
    fn test_corporate_proxy_has_no_social_levy() {
        let p = profile(dec!(0.45));
        let r = resolve(WrapperType::CorporateHolding, &p, dec!(2));
        assert_eq!(r.income_tax_rate, dec!(0.25));
        assert_eq!(r.social_levy_rate, Decimal::ZERO);
        assert_eq!(r.tier, DurationTier::CorporateFlat);
    }

    #[test]
    fn test_only_early_equity_plan_withdrawal_closes_the_plan() {
        let p = profile(dec!(0.30));
        assert!(resolve(WrapperType::EquitySavingsPlan, &p, dec!(2)).tier.closes_plan());
        assert!(!resolve(WrapperType::EquitySavingsPlan, &p, dec!(5)).tier.closes_plan());
        assert!(!resolve(WrapperType::LifeInsurance, &p, dec!(2)).tier.closes_plan());
    }

    #[test]
    fn test_every_tier_cites_its_article() {
        let p = profile(dec!(0.30));
        for wrapper in WrapperType::ALL {
            let tier = resolve(wrapper, &p, dec!(3)).tier;
            assert!(!tier.legal_reference().is_empty(), "{tier}");
        }
        assert_eq!(DurationTier::FlatTax.legal_reference(), "CGI art. 200 A, 1");
        assert_eq!(DurationTier::CorporateFlat.legal_reference(), "CGI art. 219");
    }

    #[test]
    fn test_every_wrapper_decomposes_its_effective_rate() {
        let p = profile(dec!(0.41));
        for wrapper in WrapperType::ALL {
            for age in [dec!(0), dec!(4), dec!(5), dec!(8), dec!(30)] {
                let r = resolve(wrapper, &p, age);
                assert_eq!(r.effective_rate(), r.income_tax_rate + r.social_levy_rate);
                assert!(r.effective_rate() >= Decimal::ZERO && r.effective_rate() <= Decimal::ONE);
            }
        }
    }
}
