use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use fintax_core::diagnostic::review::{self, PortfolioReviewInput};

use super::RateOverride;
use crate::input;

/// Arguments for the full portfolio review
#[derive(Args)]
pub struct ReviewArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Valuation date (YYYY-MM-DD), replacing the document's `as_of`
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_review(args: ReviewArgs, rates: &RateOverride) -> Result<Value, Box<dyn std::error::Error>> {
    let mut document = input::load_value(args.input.as_deref(), "review")?;
    if let (Some(as_of), Some(map)) = (args.as_of, document.as_object_mut()) {
        map.insert("as_of".to_string(), Value::String(as_of.to_string()));
    }
    let review_input: PortfolioReviewInput = rates.parse(document)?;
    let output = review::review_portfolio(&review_input)?;
    Ok(serde_json::to_value(output)?)
}
