mod engine;
mod types;

pub use engine::{
    COUNTRIES, REFERENCE_BRACKETS, find_country, format_currency, run_comparison, top_percent,
};
pub use types::{ComparisonResult, Country, Currency, Inputs, ReferencePoint};
