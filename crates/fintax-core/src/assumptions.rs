//! Market-level defaults that are estimates rather than law.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FintaxError;
use crate::types::Rate;
use crate::FintaxResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAssumptions {
    /// Share of a life-insurance contract held in the guaranteed euro fund.
    pub euro_fund_fraction: Rate,
    /// Annual yield credited to the euro fund.
    pub euro_fund_yield: Rate,
    /// Yield at which saved fees are assumed to be reinvested.
    pub reinvestment_yield: Rate,
}

impl Default for MarketAssumptions {
    fn default() -> Self {
        MarketAssumptions {
            euro_fund_fraction: dec!(0.30),
            euro_fund_yield: dec!(0.015),
            reinvestment_yield: dec!(0.05),
        }
    }
}

impl MarketAssumptions {
    pub fn validate(&self) -> FintaxResult<()> {
        check_fraction("assumptions.euro_fund_fraction", self.euro_fund_fraction)?;
        check_yield("assumptions.euro_fund_yield", self.euro_fund_yield)?;
        check_yield("assumptions.reinvestment_yield", self.reinvestment_yield)
    }
}

pub(crate) fn check_fraction(field: &str, value: Rate) -> FintaxResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(FintaxError::invalid(field, "must be between 0 and 1"));
    }
    Ok(())
}

pub(crate) fn check_yield(field: &str, value: Rate) -> FintaxResult<()> {
    if value <= Decimal::NEGATIVE_ONE {
        return Err(FintaxError::invalid(field, "must be greater than -100%"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(MarketAssumptions::default().validate().is_ok());
    }

    #[test]
    fn test_fraction_above_one_rejected() {
        let a = MarketAssumptions {
            euro_fund_fraction: dec!(1.2),
            ..MarketAssumptions::default()
        };
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_total_loss_yield_rejected() {
        let a = MarketAssumptions {
            reinvestment_yield: Decimal::NEGATIVE_ONE,
            ..MarketAssumptions::default()
        };
        assert!(a.validate().is_err());
    }
}
