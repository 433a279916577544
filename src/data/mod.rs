//! Data module - sales CSV loading, normalization and filtering

mod filter;
mod loader;
pub mod schema;

pub use filter::FilterSelection;
pub use loader::{load_sales_table, unique_values, CacheKey, DataLoader, LoadOptions};

#[cfg(test)]
pub(crate) use loader::tests as fixtures;
