use napi::Result as NapiResult;
use napi_derive::napi;

use fintax_core::identifier::{check_isin, IsinStatus};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Taxation
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_tax(input_json: String) -> NapiResult<String> {
    let input: fintax_core::taxation::computer::TaxInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fintax_core::taxation::computer::calculate_tax(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn retirement_deduction(input_json: String) -> NapiResult<String> {
    let input: fintax_core::taxation::computer::RetirementDeductionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fintax_core::taxation::computer::calculate_retirement_deduction(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn equity_plan_ceiling(input_json: String) -> NapiResult<String> {
    let input: fintax_core::taxation::computer::EquityPlanCeilingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fintax_core::taxation::computer::calculate_equity_plan_ceiling(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn income_tax(input_json: String) -> NapiResult<String> {
    let input: fintax_core::taxation::income_tax::IncomeTaxInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fintax_core::taxation::income_tax::calculate_income_tax(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn annual_drag(input_json: String) -> NapiResult<String> {
    let input: fintax_core::taxation::drag::DragInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fintax_core::taxation::drag::calculate_annual_drag(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Shipped rate table, as JSON.
#[napi]
pub fn default_rate_table() -> NapiResult<String> {
    serde_json::to_string(&fintax_core::taxation::rate_table::RateTable::default())
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Optimisation
// ---------------------------------------------------------------------------

#[napi]
pub fn asset_location(input_json: String) -> NapiResult<String> {
    let input: fintax_core::optimization::asset_location::AssetLocationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fintax_core::optimization::asset_location::analyze_asset_location(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn fee_substitutions(input_json: String) -> NapiResult<String> {
    let input: fintax_core::optimization::substitution::SubstitutionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fintax_core::optimization::substitution::recommend_substitutions(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_savings(input_json: String) -> NapiResult<String> {
    let input: fintax_core::time_value::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fintax_core::time_value::project_savings(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Shipped instrument catalog, as JSON.
#[napi]
pub fn default_catalog() -> NapiResult<String> {
    serde_json::to_string(&fintax_core::optimization::catalog::InstrumentCatalog::default())
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

#[napi]
pub fn review_portfolio(input_json: String) -> NapiResult<String> {
    let input: fintax_core::diagnostic::review::PortfolioReviewInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fintax_core::diagnostic::review::review_portfolio(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// "valid", "malformed" or "bad_checksum".
#[napi]
pub fn isin_status(code: String) -> String {
    match check_isin(&code) {
        IsinStatus::Valid => "valid",
        IsinStatus::Malformed => "malformed",
        IsinStatus::BadChecksum => "bad_checksum",
    }
    .to_string()
}
