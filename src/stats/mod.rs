//! Stats module - KPI aggregation and report building

mod kpi;
mod report;

pub use kpi::{CategoryValue, GroupedValues, PaymentShare};
pub use report::{format_currency, SalesReport};
