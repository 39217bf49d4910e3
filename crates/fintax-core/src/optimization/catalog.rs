//! Reference list of low-cost funds used as substitution candidates.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::profile::WrapperType;
use crate::types::Money;

/// Asset-class labels shared by the catalog and the priority table. Holdings
/// may carry any label; these are the ones the shipped tables know.
pub mod categories {
    pub const GLOBAL_EQUITY: &str = "Actions Monde";
    pub const EUROPEAN_EQUITY: &str = "Actions Europe";
    pub const FRENCH_EQUITY: &str = "Actions France";
    pub const US_EQUITY: &str = "Actions USA";
    pub const EMERGING_EQUITY: &str = "Actions Émergents";
    pub const BONDS: &str = "Obligations";
    pub const EURO_CORPORATE_BONDS: &str = "Obligations Euro IG";
    pub const EURO_GOVERNMENT_BONDS: &str = "Obligations Euro Souveraines";
    pub const GLOBAL_BONDS: &str = "Obligations Monde";
    pub const EURO_FUND: &str = "Fonds Euro";
    pub const REAL_ESTATE: &str = "Immobilier";
    pub const EUROPEAN_REAL_ESTATE: &str = "Immobilier Europe";
    pub const GOLD: &str = "Or";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogInstrument {
    pub identifier: String,
    pub name: String,
    pub category: String,
    /// Annual management fee in percent.
    pub fee_rate_pct: Decimal,
    pub pea_eligible: bool,
    /// Assets under management, in euros. Breaks fee ties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_size: Option<Money>,
}

impl CatalogInstrument {
    /// Whether the instrument may be held in `wrapper`. Only the equity
    /// savings plan restricts what it holds.
    pub fn eligible_for(&self, wrapper: WrapperType) -> bool {
        match wrapper {
            WrapperType::EquitySavingsPlan => self.pea_eligible,
            WrapperType::SecuritiesAccount
            | WrapperType::LifeInsurance
            | WrapperType::RetirementSavingsPlan
            | WrapperType::CorporateHolding => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentCatalog {
    pub instruments: Vec<CatalogInstrument>,
}

impl InstrumentCatalog {
    pub fn new(instruments: Vec<CatalogInstrument>) -> Self {
        InstrumentCatalog { instruments }
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a CatalogInstrument> + 'a {
        self.instruments.iter().filter(move |i| i.category == category)
    }

    /// Cheapest instrument of `category` that `wrapper` may hold.
    ///
    /// Equal fees go to the larger fund, then to the earlier catalog entry.
    pub fn cheapest_eligible(&self, category: &str, wrapper: WrapperType) -> Option<&CatalogInstrument> {
        self.instruments
            .iter()
            .filter(|i| i.category == category && i.eligible_for(wrapper))
            .fold(None, |best: Option<&CatalogInstrument>, candidate| match best {
                Some(b)
                    if candidate.fee_rate_pct > b.fee_rate_pct
                        || (candidate.fee_rate_pct == b.fee_rate_pct
                            && candidate.fund_size <= b.fund_size) =>
                {
                    Some(b)
                }
                _ => Some(candidate),
            })
    }

    pub fn find(&self, identifier: &str) -> Option<&CatalogInstrument> {
        self.instruments.iter().find(|i| i.identifier == identifier)
    }
}

fn etf(
    identifier: &str,
    name: &str,
    category: &str,
    fee_rate_pct: Decimal,
    pea_eligible: bool,
    fund_size: Money,
) -> CatalogInstrument {
    CatalogInstrument {
        identifier: identifier.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        fee_rate_pct,
        pea_eligible,
        fund_size: Some(fund_size),
    }
}

impl Default for InstrumentCatalog {
    fn default() -> Self {
        use categories::*;

        InstrumentCatalog::new(vec![
            etf("LU1681043599", "Amundi MSCI World UCITS ETF", GLOBAL_EQUITY, dec!(0.18), false, dec!(5_000_000_000)),
            etf("IE00B4L5Y983", "iShares Core MSCI World UCITS ETF", GLOBAL_EQUITY, dec!(0.20), false, dec!(60_000_000_000)),
            etf("IE00BK5BQT80", "Vanguard FTSE All-World UCITS ETF", GLOBAL_EQUITY, dec!(0.22), false, dec!(15_000_000_000)),
            etf("FR0013412012", "Amundi PEA MSCI Europe UCITS ETF", EUROPEAN_EQUITY, dec!(0.18), true, dec!(500_000_000)),
            etf("FR0011871110", "Lyxor PEA Europe (STOXX 600) UCITS ETF", EUROPEAN_EQUITY, dec!(0.20), true, dec!(800_000_000)),
            etf("DE0002635307", "iShares STOXX Europe 600 UCITS ETF", EUROPEAN_EQUITY, dec!(0.20), false, dec!(7_000_000_000)),
            etf("FR0007052782", "Amundi CAC 40 UCITS ETF", FRENCH_EQUITY, dec!(0.25), true, dec!(2_000_000_000)),
            etf("FR0007056841", "Lyxor CAC 40 (DR) UCITS ETF", FRENCH_EQUITY, dec!(0.25), true, dec!(1_500_000_000)),
            etf("LU1681048804", "Amundi S&P 500 UCITS ETF", US_EQUITY, dec!(0.15), false, dec!(8_000_000_000)),
            etf("IE00B5BMR087", "iShares Core S&P 500 UCITS ETF", US_EQUITY, dec!(0.07), false, dec!(75_000_000_000)),
            etf("IE00B3XXRP09", "Vanguard S&P 500 UCITS ETF", US_EQUITY, dec!(0.07), false, dec!(45_000_000_000)),
            etf("LU1681045370", "Amundi MSCI Emerging Markets UCITS ETF", EMERGING_EQUITY, dec!(0.20), false, dec!(2_000_000_000)),
            etf("IE00BKM4GZ66", "iShares Core MSCI EM IMI UCITS ETF", EMERGING_EQUITY, dec!(0.18), false, dec!(20_000_000_000)),
            etf("IE00B3VVMM84", "Vanguard FTSE Emerging Markets UCITS ETF", EMERGING_EQUITY, dec!(0.22), false, dec!(8_000_000_000)),
            etf("IE00B3F81R35", "iShares Core Euro Corporate Bond UCITS ETF", EURO_CORPORATE_BONDS, dec!(0.20), false, dec!(15_000_000_000)),
            etf("LU1650490474", "Amundi Euro Corporate Bond UCITS ETF", EURO_CORPORATE_BONDS, dec!(0.16), false, dec!(2_000_000_000)),
            etf("IE00BZ163L38", "Vanguard EUR Corporate Bond UCITS ETF", EURO_CORPORATE_BONDS, dec!(0.09), false, dec!(5_000_000_000)),
            etf("IE00B4WXJJ64", "iShares Core Euro Government Bond UCITS ETF", EURO_GOVERNMENT_BONDS, dec!(0.09), false, dec!(10_000_000_000)),
            etf("LU1650487413", "Lyxor Euro Government Bond UCITS ETF", EURO_GOVERNMENT_BONDS, dec!(0.17), false, dec!(3_000_000_000)),
            etf("IE00B3F81409", "iShares Core Global Aggregate Bond UCITS ETF", GLOBAL_BONDS, dec!(0.10), false, dec!(8_000_000_000)),
            etf("IE00BG47KH54", "Vanguard Global Aggregate Bond UCITS ETF", GLOBAL_BONDS, dec!(0.10), false, dec!(5_000_000_000)),
            etf("IE00B1FZS350", "iShares Developed Markets Property Yield UCITS ETF", REAL_ESTATE, dec!(0.59), false, dec!(1_500_000_000)),
            etf("FR0010791160", "Amundi ETF FTSE EPRA Europe Real Estate UCITS ETF", EUROPEAN_REAL_ESTATE, dec!(0.35), true, dec!(800_000_000)),
            etf("FR0013416716", "Amundi Physical Gold ETC", GOLD, dec!(0.15), false, dec!(3_000_000_000)),
            etf("IE00B4ND3602", "iShares Physical Gold ETC", GOLD, dec!(0.12), false, dec!(18_000_000_000)),
        ])
    }
}
