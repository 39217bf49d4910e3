pub mod asset_location;
pub mod catalog;
pub mod substitution;
