use serde_json::Value;

use super::{result_of, scalar};

/// Headline figure of each command, as a dotted path into the result.
const HEADLINE_PATHS: [&str; 11] = [
    "tax_due",
    "drag_amount",
    "deduction.tax_saving",
    "gross_tax",
    "score",
    "total_annual_saving",
    "future_value",
    "remaining_capacity",
    "summary.annual_fee_saving",
    "fiscal_year",
    "location_score",
];

/// Print just the key answer value from the output, falling back to the
/// first field of the result.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    for path in HEADLINE_PATHS {
        if let Some(val) = lookup(result, path) {
            if !val.is_null() {
                println!("{}", scalar(val));
                return;
            }
        }
    }

    if let Some((key, val)) = result.as_object().and_then(|m| m.iter().next()) {
        println!("{}: {}", key, scalar(val));
        return;
    }

    println!("{}", scalar(result));
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}
