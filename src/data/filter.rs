//! Sales Filter Module
//! Derives the filtered view for the current sidebar selection.

use crate::data::schema::display;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Column '{0}' not found in sales table")]
    ColumnMissing(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to access selection file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid selection file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Current sidebar selection. An empty set means "no restriction".
///
/// Saved as JSON next to exported charts; missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub month: String,
    pub cities: Vec<String>,
    pub genders: Vec<String>,
    pub customer_types: Vec<String>,
}

impl FilterSelection {
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame, FilterError> {
        filter_sales(
            df,
            &self.month,
            &self.cities,
            &self.genders,
            &self.customer_types,
        )
    }

    /// Read a selection saved with [`FilterSelection::save`].
    pub fn from_file(path: &Path) -> Result<Self, FilterError> {
        let text = std::fs::read_to_string(path).map_err(|source| FilterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| FilterError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), FilterError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| FilterError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| FilterError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Rows whose value in `column` is one of `allowed`, or `None` when the
/// set is empty and the dimension should not restrict anything.
fn membership(column: &str, allowed: &[String]) -> Option<Expr> {
    allowed
        .iter()
        .map(|value| col(column).eq(lit(value.as_str())))
        .reduce(|acc, expr| acc.or(expr))
}

/// Filter the sales table by month and the optional city, gender and
/// customer-type sets. Row order and columns are preserved.
pub fn filter_sales(
    df: &DataFrame,
    month: &str,
    cities: &[String],
    genders: &[String],
    customer_types: &[String],
) -> Result<DataFrame, FilterError> {
    for name in [
        display::MONTH,
        display::CITY,
        display::GENDER,
        display::CUSTOMER_TYPE,
    ] {
        if df.get_column_index(name).is_none() {
            return Err(FilterError::ColumnMissing(name.to_string()));
        }
    }

    let mut predicate = col(display::MONTH).eq(lit(month));
    for (column, allowed) in [
        (display::CITY, cities),
        (display::GENDER, genders),
        (display::CUSTOMER_TYPE, customer_types),
    ] {
        if let Some(expr) = membership(column, allowed) {
            predicate = predicate.and(expr);
        }
    }

    let filtered = df.clone().lazy().filter(predicate).collect()?;

    debug!(
        month,
        cities = cities.len(),
        genders = genders.len(),
        customer_types = customer_types.len(),
        rows = filtered.height(),
        "Filtered sales table"
    );
    Ok(filtered)
}
