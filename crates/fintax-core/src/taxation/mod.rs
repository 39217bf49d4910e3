pub mod computer;
pub mod drag;
pub mod income_tax;
pub mod rate_table;
pub mod resolver;
