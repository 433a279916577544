//! KPI Calculator Module
//! Sums, counts, means and best-of aggregates over a filtered sales view.

use crate::data::schema::display;
use polars::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("No sales match the current selection")]
    EmptySelection,
    #[error("Column '{0}' not found in sales table")]
    ColumnMissing(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Headline metrics shown at the top of the report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kpis {
    pub total_revenue: f64,
    pub sale_count: usize,
    pub gross_income: f64,
}

/// One aggregated value for a category (city, product line, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryValue {
    pub label: String,
    pub value: f64,
}

/// Share of revenue for a payment method.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentShare {
    pub label: String,
    pub total: f64,
    /// Percentage of the total revenue, 0..=100.
    pub percent: f64,
}

/// Values aggregated over two keys, laid out for grouped bar charts.
///
/// `values[g][c]` is the total for group `groups[g]` and category
/// `categories[c]`; missing combinations are zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedValues {
    pub categories: Vec<String>,
    pub groups: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl GroupedValues {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() || self.groups.is_empty()
    }

    /// Largest single value, 0 when empty.
    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }
}

/// Aggregation helpers over the display-named sales table.
pub struct KpiCalculator;

impl KpiCalculator {
    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, StatsError> {
        df.column(name)
            .map_err(|_| StatsError::ColumnMissing(name.to_string()))
    }

    fn sum_column(df: &DataFrame, name: &str) -> Result<f64, StatsError> {
        let values = Self::column(df, name)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.sum().unwrap_or(0.0))
    }

    /// Per-key (sum, count of non-null values) in ascending key order.
    /// Keys of any dtype are compared by their text form; dates sort
    /// chronologically as ISO text. Rows with a null key are skipped.
    fn keyed_totals(
        df: &DataFrame,
        keys: &[&str],
        value: &str,
    ) -> Result<BTreeMap<Vec<String>, (f64, usize)>, StatsError> {
        let key_columns = keys
            .iter()
            .map(|k| -> Result<Column, StatsError> {
                Ok(Self::column(df, k)?.cast(&DataType::String)?)
            })
            .collect::<Result<Vec<Column>, StatsError>>()?;
        let key_values = key_columns
            .iter()
            .map(|c| c.str())
            .collect::<PolarsResult<Vec<_>>>()?;

        let values = Self::column(df, value)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut totals: BTreeMap<Vec<String>, (f64, usize)> = BTreeMap::new();
        for i in 0..df.height() {
            let key: Option<Vec<String>> = key_values
                .iter()
                .map(|ca| ca.get(i).map(str::to_string))
                .collect();
            let Some(key) = key else {
                continue;
            };

            // The key counts even when its value is missing
            let entry = totals.entry(key).or_insert((0.0, 0));
            if let Some(v) = values.get(i).filter(|v| !v.is_nan()) {
                entry.0 += v;
                entry.1 += 1;
            }
        }

        Ok(totals)
    }

    /// Total revenue, number of sales and gross income.
    pub fn compute_kpis(df: &DataFrame) -> Result<Kpis, StatsError> {
        let invoices = Self::column(df, display::INVOICE_ID)?;

        Ok(Kpis {
            total_revenue: Self::sum_column(df, display::TOTAL)?,
            sale_count: invoices.len() - invoices.null_count(),
            gross_income: Self::sum_column(df, display::GROSS_INCOME)?,
        })
    }

    /// Sum of `value` per distinct `key`, in ascending key order.
    pub fn sum_by(df: &DataFrame, key: &str, value: &str) -> Result<Vec<CategoryValue>, StatsError> {
        Ok(Self::keyed_totals(df, &[key], value)?
            .into_iter()
            .map(|(mut k, (sum, _))| CategoryValue {
                label: k.remove(0),
                value: sum,
            })
            .collect())
    }

    /// Mean of `value` per distinct `key`, in ascending key order. Keys with
    /// no non-null value have no mean and are left out.
    pub fn mean_by(
        df: &DataFrame,
        key: &str,
        value: &str,
    ) -> Result<Vec<CategoryValue>, StatsError> {
        Ok(Self::keyed_totals(df, &[key], value)?
            .into_iter()
            .filter(|(_, (_, count))| *count > 0)
            .map(|(mut k, (sum, count))| CategoryValue {
                label: k.remove(0),
                value: sum / count as f64,
            })
            .collect())
    }

    /// Key with the largest summed `value`. Ties go to the first key in
    /// ascending order.
    pub fn best_by(df: &DataFrame, key: &str, value: &str) -> Result<CategoryValue, StatsError> {
        Self::sum_by(df, key, value)?
            .into_iter()
            .reduce(|best, next| if next.value > best.value { next } else { best })
            .ok_or(StatsError::EmptySelection)
    }

    /// Product line with the most units sold.
    pub fn best_selling_product(df: &DataFrame) -> Result<CategoryValue, StatsError> {
        Self::best_by(df, display::PRODUCT_LINE, display::QUANTITY)
    }

    /// Product line with the highest gross income.
    pub fn most_profitable_product(df: &DataFrame) -> Result<CategoryValue, StatsError> {
        Self::best_by(df, display::PRODUCT_LINE, display::GROSS_INCOME)
    }

    /// Revenue per payment method with its percentage of the total.
    pub fn payment_shares(df: &DataFrame) -> Result<Vec<PaymentShare>, StatsError> {
        let totals = Self::sum_by(df, display::PAYMENT, display::TOTAL)?;
        let grand_total: f64 = totals.iter().map(|t| t.value).sum();

        Ok(totals
            .into_iter()
            .map(|t| PaymentShare {
                percent: if grand_total > 0.0 {
                    t.value / grand_total * 100.0
                } else {
                    0.0
                },
                label: t.label,
                total: t.value,
            })
            .collect())
    }

    /// Sum of `value` per (`category`, `group`) pair, both in ascending order.
    pub fn sum_by_pair(
        df: &DataFrame,
        category: &str,
        group: &str,
        value: &str,
    ) -> Result<GroupedValues, StatsError> {
        let totals = Self::keyed_totals(df, &[category, group], value)?;

        let mut categories: Vec<String> = totals.keys().map(|k| k[0].clone()).collect();
        categories.dedup();
        let mut groups: Vec<String> = totals.keys().map(|k| k[1].clone()).collect();
        groups.sort();
        groups.dedup();

        let mut values = vec![vec![0.0; categories.len()]; groups.len()];
        for (key, (sum, _)) in &totals {
            // Both lists are sorted and deduplicated, so the lookups succeed
            if let (Ok(c), Ok(g)) = (
                categories.binary_search(&key[0]),
                groups.binary_search(&key[1]),
            ) {
                values[g][c] = *sum;
            }
        }

        Ok(GroupedValues {
            categories,
            groups,
            values,
        })
    }
}
