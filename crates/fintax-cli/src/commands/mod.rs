pub mod optimization;
pub mod review;
pub mod taxation;

use serde::de::DeserializeOwned;
use serde_json::Value;

use fintax_core::{MaritalStatus, WrapperType};

/// Rate table supplied with the global `--rates` flag.
pub struct RateOverride(pub Option<Value>);

impl RateOverride {
    /// Replace the document's `rate_table` member, when an override is set.
    pub fn apply(&self, mut document: Value) -> Value {
        if let (Some(rates), Some(map)) = (&self.0, document.as_object_mut()) {
            map.insert("rate_table".to_string(), rates.clone());
        }
        document
    }

    /// Apply the override and deserialise the document.
    pub fn parse<T: DeserializeOwned>(&self, document: Value) -> Result<T, Box<dyn std::error::Error>> {
        Ok(serde_json::from_value(self.apply(document))?)
    }
}

/// Parse a wrapper code such as `PEA` or `av`.
pub fn parse_wrapper(s: &str) -> Result<WrapperType, String> {
    serde_json::from_value(Value::String(s.to_uppercase()))
        .map_err(|_| format!("unknown wrapper '{s}' (expected PEA, CTO, AV, PER or IS)"))
}

/// Parse a marital status such as `married` or `pacsed`.
pub fn parse_marital_status(s: &str) -> Result<MaritalStatus, String> {
    serde_json::from_value(Value::String(s.to_lowercase())).map_err(|_| {
        format!("unknown marital status '{s}' (expected single, married, pacsed, divorced or widowed)")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapper_codes_are_case_insensitive() {
        assert_eq!(parse_wrapper("pea").unwrap(), WrapperType::EquitySavingsPlan);
        assert_eq!(parse_wrapper("IS").unwrap(), WrapperType::CorporateHolding);
        assert!(parse_wrapper("ISA").is_err());
    }

    #[test]
    fn test_marital_status() {
        assert_eq!(parse_marital_status("Pacsed").unwrap(), MaritalStatus::Pacsed);
        assert!(parse_marital_status("engaged").is_err());
    }

    #[test]
    fn test_override_replaces_rate_table() {
        let rates = RateOverride(Some(json!({ "fiscal_year": 2025 })));
        let doc = rates.apply(json!({ "taxable_base": "100", "rate_table": { "fiscal_year": 2024 } }));
        assert_eq!(doc["rate_table"]["fiscal_year"], 2025);
        assert_eq!(doc["taxable_base"], "100");
    }

    #[test]
    fn test_no_override_leaves_document() {
        let doc = json!({ "taxable_base": "100" });
        assert_eq!(RateOverride(None).apply(doc.clone()), doc);
    }
}
