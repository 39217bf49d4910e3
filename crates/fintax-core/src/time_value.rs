use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::error::FintaxError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FintaxResult;

/// Future value of a recurring annual amount reinvested at `assumed_yield`,
/// each payment made at year end.
///
/// `annual * ((1 + r)^n - 1) / r`, or `annual * n` when `r` is zero.
/// Returns zero when either the amount or the horizon is zero, and an error
/// when the result leaves the `Decimal` range.
pub fn future_value_of_annuity(annual_amount: Money, years: u32, assumed_yield: Rate) -> FintaxResult<Money> {
    if annual_amount.is_zero() || years == 0 {
        return Ok(Decimal::ZERO);
    }
    if assumed_yield.is_zero() {
        return annual_amount
            .checked_mul(Decimal::from(years))
            .ok_or_else(|| overflow(years));
    }

    (Decimal::ONE + assumed_yield)
        .checked_powu(u64::from(years))
        .and_then(|growth| (growth - Decimal::ONE).checked_div(assumed_yield))
        .and_then(|factor| annual_amount.checked_mul(factor))
        .ok_or_else(|| overflow(years))
}

/// Cumulative value at the end of each year, year 1 first, built by carrying
/// the previous year forward: `v(n) = v(n-1) * (1 + r) + annual`.
pub fn accumulation_schedule(annual_amount: Money, years: u32, assumed_yield: Rate) -> FintaxResult<Vec<Money>> {
    let growth = Decimal::ONE + assumed_yield;
    let mut schedule = Vec::with_capacity(years as usize);
    let mut value = Decimal::ZERO;
    for _ in 0..years {
        value = value
            .checked_mul(growth)
            .and_then(|v| v.checked_add(annual_amount))
            .ok_or_else(|| overflow(years))?;
        schedule.push(value);
    }
    Ok(schedule)
}

fn overflow(years: u32) -> FintaxError {
    FintaxError::invalid(
        "years",
        format!("a {years}-year horizon overflows the decimal range at this yield"),
    )
}

/// Longest horizon `project_savings` will lay out year by year.
pub const MAX_PROJECTION_YEARS: u32 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub annual_amount: Money,
    pub years: u32,
    pub assumed_yield: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub future_value: Money,
    /// Sum of the undiscounted payments.
    pub total_contributed: Money,
    pub compounding_gain: Money,
    /// Cumulative value at the end of each year, year 1 first.
    pub year_by_year: Vec<Money>,
}

/// Compound a recurring annual saving over a horizon.
pub fn project_savings(input: &ProjectionInput) -> FintaxResult<ComputationOutput<ProjectionOutput>> {
    if input.annual_amount < Decimal::ZERO {
        return Err(FintaxError::invalid("annual_amount", "cannot be negative"));
    }
    if input.assumed_yield <= Decimal::NEGATIVE_ONE {
        return Err(FintaxError::invalid(
            "assumed_yield",
            "must be greater than -100%",
        ));
    }

    if input.years > MAX_PROJECTION_YEARS {
        return Err(FintaxError::invalid(
            "years",
            format!("cannot exceed {MAX_PROJECTION_YEARS}"),
        ));
    }

    let future_value = future_value_of_annuity(input.annual_amount, input.years, input.assumed_yield)?;
    let total_contributed = input
        .annual_amount
        .checked_mul(Decimal::from(input.years))
        .ok_or_else(|| overflow(input.years))?;
    let year_by_year = accumulation_schedule(input.annual_amount, input.years, input.assumed_yield)?;

    let mut warnings = Vec::new();
    if input.assumed_yield < Decimal::ZERO {
        warnings.push("Negative reinvestment yield: projected value is below the sum saved.".into());
    }

    Ok(with_metadata(
        "Future value of an ordinary annuity: A * ((1 + r)^n - 1) / r, linear when r = 0",
        input,
        warnings,
        None,
        ProjectionOutput {
            future_value,
            total_contributed,
            compounding_gain: future_value - total_contributed,
            year_by_year,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_amount_or_horizon_is_zero() {
        assert_eq!(future_value_of_annuity(Decimal::ZERO, 10, dec!(0.05)).unwrap(), Decimal::ZERO);
        assert_eq!(future_value_of_annuity(dec!(100), 0, dec!(0.05)).unwrap(), Decimal::ZERO);
        assert_eq!(future_value_of_annuity(dec!(100), 0, Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_is_linear() {
        assert_eq!(future_value_of_annuity(dec!(250), 8, Decimal::ZERO).unwrap(), dec!(2_000));
    }

    #[test]
    fn test_two_years_at_ten_percent() {
        // 100 + 100 * 1.1 = 210
        assert_eq!(future_value_of_annuity(dec!(100), 2, dec!(0.10)).unwrap(), dec!(210));
    }

    #[test]
    fn test_ten_years_at_five_percent() {
        // 1000 * (1.05^10 - 1) / 0.05 = 12577.89...
        let fv = future_value_of_annuity(dec!(1_000), 10, dec!(0.05)).unwrap();
        assert!((fv - dec!(12_577.89)).abs() < dec!(0.01), "got {fv}");
    }

    #[test]
    fn test_projection_schedule_ends_at_future_value() {
        let out = project_savings(&ProjectionInput {
            annual_amount: dec!(500),
            years: 5,
            assumed_yield: dec!(0.03),
        })
        .unwrap();
        let r = &out.result;
        assert_eq!(r.year_by_year.len(), 5);
        let last = *r.year_by_year.last().unwrap();
        assert!((last - r.future_value).abs() < dec!(0.000001), "{last} vs {}", r.future_value);
        assert_eq!(r.total_contributed, dec!(2_500));
        assert!(r.compounding_gain > Decimal::ZERO);
    }

    #[test]
    fn test_projection_rejects_negative_amount() {
        let input = ProjectionInput {
            annual_amount: dec!(-1),
            years: 5,
            assumed_yield: dec!(0.03),
        };
        assert!(project_savings(&input).is_err());
    }

    #[test]
    fn test_schedule_carries_each_year_forward() {
        let s = accumulation_schedule(dec!(100), 3, dec!(0.10)).unwrap();
        assert_eq!(s, vec![dec!(100), dec!(210), dec!(331)]);
    }

    #[test]
    fn test_long_horizon_overflow_is_an_error() {
        assert!(future_value_of_annuity(dec!(100), 1_500, dec!(0.05)).is_err());
        let input = ProjectionInput {
            annual_amount: dec!(100),
            years: 900,
            assumed_yield: dec!(0.10),
        };
        match project_savings(&input) {
            Err(FintaxError::InvalidInput { field, reason }) => {
                assert_eq!(field, "years");
                assert!(reason.contains("overflows"));
            }
            other => panic!("expected an invalid years error, got {other:?}"),
        }
    }

    #[test]
    fn test_projection_horizon_is_capped() {
        let input = ProjectionInput {
            annual_amount: dec!(100),
            years: MAX_PROJECTION_YEARS + 1,
            assumed_yield: dec!(-0.5),
        };
        match project_savings(&input) {
            Err(FintaxError::InvalidInput { field, .. }) => assert_eq!(field, "years"),
            other => panic!("expected an invalid years error, got {other:?}"),
        }
    }

    #[test]
    fn test_long_horizon_at_zero_yield_stays_linear() {
        let fv = future_value_of_annuity(dec!(100), 1_500, Decimal::ZERO).unwrap();
        assert_eq!(fv, dec!(150_000));
    }
}
