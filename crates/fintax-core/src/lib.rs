//! Tax-aware wrapper optimisation for French household portfolios.
//!
//! Every entry point is a pure function of its arguments: rate tables,
//! priority tables and the instrument catalog are passed in as values, and the
//! valuation date is always explicit.

pub mod assumptions;
pub mod error;
pub mod identifier;
pub mod profile;
pub mod time_value;
pub mod types;

#[cfg(feature = "taxation")]
pub mod taxation;

#[cfg(feature = "optimization")]
pub mod optimization;

#[cfg(feature = "diagnostic")]
pub mod diagnostic;

pub use assumptions::MarketAssumptions;
pub use error::FintaxError;
pub use profile::*;
pub use types::*;

/// Standard result type for all fintax operations
pub type FintaxResult<T> = Result<T, FintaxError>;
