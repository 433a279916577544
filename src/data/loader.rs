//! Sales CSV Loader Module
//! Reads the sales file with Polars, normalizes it and memoizes the result.

use crate::data::schema::{self, display, raw, COLUMN_RENAMES};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Missing column '{0}' in CSV header")]
    MissingColumn(String),
    #[error("Invalid date '{value}' in row {row}")]
    InvalidDate { row: usize, value: String },
}

/// How the sales file is laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub separator: u8,
    pub decimal_comma: bool,
    /// chrono format string for the date column.
    pub date_format: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            separator: b';',
            decimal_comma: true,
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

/// Year-month bucket for a date, month not zero-padded ("2019-1").
pub fn month_bucket(date: NaiveDate) -> String {
    format!("{}-{}", date.year(), date.month())
}

/// Days from 0001-01-01 to 1970-01-01, the origin Polars counts dates from.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Load and normalize a sales file.
///
/// Rows are sorted by date (stable), the month bucket is derived, every
/// column is renamed to its display name and payment methods are translated.
/// Any unparsable cell fails the whole load.
pub fn load_sales_table(path: &Path, options: &LoadOptions) -> Result<DataFrame, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    check_header(path, options.separator)?;

    let mut df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_separator(options.separator)
        .with_decimal_comma(options.decimal_comma)
        .with_dtype_overwrite(Some(Arc::new(schema::raw_schema())))
        .finish()?
        .collect()?;

    // Parse dates up front so a bad row is reported by position
    let dates = parse_dates(&df, &options.date_format)?;
    let buckets: Vec<String> = dates.iter().copied().map(month_bucket).collect();
    let days: Vec<i32> = dates.iter().copied().map(epoch_days).collect();

    let date_column = Column::new(raw::DATE.into(), days).cast(&DataType::Date)?;
    df.with_column(date_column)?;
    df.with_column(Column::new(raw::MONTH.into(), buckets))?;

    let mut df = df.sort(
        [raw::DATE],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;

    for (raw_name, display_name) in COLUMN_RENAMES {
        df.rename(raw_name, display_name.into())?;
    }

    let payments: Vec<Option<String>> = df
        .column(display::PAYMENT)?
        .str()?
        .into_iter()
        .map(|value| value.map(|v| schema::translate_payment(v).to_string()))
        .collect();
    df.with_column(Column::new(display::PAYMENT.into(), payments))?;

    info!(
        path = %path.display(),
        rows = df.height(),
        "Loaded sales table"
    );
    Ok(df)
}

/// Every raw column must be named in the header line.
fn check_header(path: &Path, separator: u8) -> Result<(), LoadError> {
    let io_error = |source: std::io::Error| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::open(path).map_err(io_error)?;
    let mut header = String::new();
    BufReader::new(file).read_line(&mut header).map_err(io_error)?;

    let header = header.trim_start_matches('\u{feff}');
    let columns: Vec<&str> = header
        .trim_end()
        .split(char::from(separator))
        .map(|c| c.trim().trim_matches('"'))
        .collect();

    for name in schema::raw_schema().iter_names() {
        if !columns.contains(&name.as_str()) {
            return Err(LoadError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

fn parse_dates(df: &DataFrame, format: &str) -> Result<Vec<NaiveDate>, LoadError> {
    let column = df.column(raw::DATE)?.str()?;

    column
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let text = value.unwrap_or_default().trim();
            NaiveDate::parse_from_str(text, format).map_err(|_| LoadError::InvalidDate {
                row: i + 1,
                value: text.to_string(),
            })
        })
        .collect()
}

/// Distinct non-null values of a column, in order of first appearance.
pub fn unique_values(df: &DataFrame, column: &str) -> Vec<String> {
    let Ok(values) = df.column(column).and_then(|c| c.cast(&DataType::String)) else {
        return Vec::new();
    };
    let Ok(values) = values.str() else {
        return Vec::new();
    };

    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .flatten()
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

/// Identity of a file on disk at a point in time.
///
/// Take the key before reading the file, so a change made during the read
/// leaves the cached table stale rather than mislabeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

impl CacheKey {
    pub fn for_path(path: &Path) -> Result<Self, LoadError> {
        let metadata = fs::metadata(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_path_buf())
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

/// Loads the sales table once and reuses it while the file is unchanged.
pub struct DataLoader {
    options: LoadOptions,
    cached: Option<(CacheKey, DataFrame)>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl DataLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            cached: None,
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load the table at `path`, returning the cached copy when the file
    /// has the same modification time and length as last time.
    pub fn load(&mut self, path: &Path) -> Result<&DataFrame, LoadError> {
        let key = CacheKey::for_path(path)?;

        let hit = matches!(&self.cached, Some((cached_key, _)) if *cached_key == key);
        if hit {
            debug!(path = %path.display(), "Sales table cache hit");
        } else {
            let df = load_sales_table(path, &self.options)?;
            self.cached = Some((key, df));
        }

        self.cached
            .as_ref()
            .map(|(_, df)| df)
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
    }

    /// Whether `load(path)` would be served from the cache.
    pub fn is_fresh(&self, path: &Path) -> bool {
        match (&self.cached, CacheKey::for_path(path)) {
            (Some((cached_key, _)), Ok(key)) => *cached_key == key,
            _ => false,
        }
    }

    /// Record a table loaded elsewhere (used for background loading).
    /// `key` must have been taken before the file was read.
    pub fn store(&mut self, key: CacheKey, df: DataFrame) {
        self.cached = Some((key, df));
    }

    /// Drop the cached table so the next load reads the file again.
    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            debug!("Sales table cache invalidated");
        }
    }

    /// Get a reference to the cached table.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.cached.as_ref().map(|(_, df)| df)
    }

    /// Unique values of a column of the cached table.
    pub fn get_unique_values(&self, column: &str) -> Vec<String> {
        self.get_dataframe()
            .map(|df| unique_values(df, column))
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub const HEADER: &str = "Invoice ID;Branch;City;Customer type;Gender;Product line;Unit price;Quantity;Tax 5%;Total;Date;Time;Payment;cogs;gross margin percentage;gross income;Rating";

    /// Write a CSV fixture with the standard header.
    pub fn write_csv(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    pub fn sample_rows() -> Vec<&'static str> {
        vec![
            "750-67-8428;A;Yangon;Member;Female;Health and beauty;74,69;7;26,1415;548,9715;05/01/2019;13:08;Ewallet;522,83;4,761904762;26,1415;9,1",
            "226-31-3081;C;Naypyitaw;Normal;Female;Electronic accessories;15,28;5;3,82;80,22;08/03/2019;10:29;Cash;76,4;4,761904762;3,82;9,6",
            "631-41-3108;A;Yangon;Normal;Male;Home and lifestyle;46,33;7;16,2155;340,5255;03/03/2019;13:23;Credit card;324,31;4,761904762;16,2155;7,4",
            "123-19-1176;A;Yangon;Member;Male;Health and beauty;58,22;8;23,288;489,048;27/01/2019;20:33;Ewallet;465,76;4,761904762;23,288;8,4",
            "373-73-7910;A;Mandalay;Normal;Male;Sports and travel;86,31;7;30,2085;634,3785;08/02/2019;10:37;Bank transfer;604,17;4,761904762;30,2085;5,3",
        ]
    }

    pub fn sample_table() -> DataFrame {
        let file = write_csv(&sample_rows());
        load_sales_table(file.path(), &LoadOptions::default()).unwrap()
    }

    fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
        NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
    }

    fn dates(df: &DataFrame) -> Vec<NaiveDate> {
        df.column(display::DATE)
            .unwrap()
            .cast(&DataType::Int32)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .map(|d| date_from_epoch_days(d.unwrap()).unwrap())
            .collect()
    }

    fn strings(df: &DataFrame, column: &str) -> Vec<String> {
        df.column(column)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect()
    }

    #[test]
    fn loads_and_renames_all_columns() {
        let df = sample_table();
        assert_eq!(df.height(), 5);

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for (_, display_name) in COLUMN_RENAMES {
            assert!(names.contains(&display_name.to_string()), "{display_name}");
        }
        assert_eq!(names.len(), COLUMN_RENAMES.len());
        assert_eq!(df.column(display::DATE).unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn rows_sorted_by_date_with_matching_bucket() {
        let df = sample_table();
        let dates = dates(&df);

        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2019, 1, 5).unwrap());

        let buckets = strings(&df, display::MONTH);
        for (date, bucket) in dates.iter().zip(&buckets) {
            assert_eq!(bucket, &format!("{}-{}", date.year(), date.month()));
        }
        assert_eq!(buckets, vec!["2019-1", "2019-1", "2019-2", "2019-3", "2019-3"]);
    }

    #[test]
    fn same_day_rows_keep_file_order() {
        let file = write_csv(&[
            "B-1;A;Yangon;Member;Female;Food and beverages;10,00;1;0,5;10,5;02/01/2019;10:00;Cash;10;4,76;0,5;7",
            "A-1;A;Yangon;Member;Female;Food and beverages;10,00;1;0,5;10,5;01/01/2019;10:00;Cash;10;4,76;0,5;7",
            "B-2;A;Yangon;Member;Female;Food and beverages;10,00;1;0,5;10,5;02/01/2019;11:00;Cash;10;4,76;0,5;7",
            "B-3;A;Yangon;Member;Female;Food and beverages;10,00;1;0,5;10,5;02/01/2019;09:00;Cash;10;4,76;0,5;7",
        ]);
        let df = load_sales_table(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(strings(&df, display::INVOICE_ID), vec!["A-1", "B-1", "B-2", "B-3"]);
    }

    #[test]
    fn decimal_comma_values_parse() {
        let df = sample_table();
        let totals = df.column(display::TOTAL).unwrap().f64().unwrap().clone();
        // First row after sorting is the 2019-01-05 sale
        assert!((totals.get(0).unwrap() - 548.9715).abs() < 1e-9);
    }

    #[test]
    fn payment_methods_translated() {
        let df = sample_table();
        let payments = strings(&df, display::PAYMENT);
        assert_eq!(
            payments,
            vec![
                "Carteira Digital",
                "Carteira Digital",
                "Bank transfer",
                "Cartão de Crédito",
                "Dinheiro",
            ]
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_sales_table(Path::new("/nonexistent/sales.csv"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn bad_date_fails_whole_load() {
        let mut rows = sample_rows();
        rows.push("999-00-0000;A;Yangon;Member;Female;Health and beauty;1,0;1;0,05;1,05;2019-13-45;13:08;Cash;1;4,76;0,05;5");
        let file = write_csv(&rows);

        match load_sales_table(file.path(), &LoadOptions::default()) {
            Err(LoadError::InvalidDate { row, value }) => {
                assert_eq!(row, 6);
                assert_eq!(value, "2019-13-45");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn bad_number_fails_whole_load() {
        let file = write_csv(&[
            "750-67-8428;A;Yangon;Member;Female;Health and beauty;abc;7;26,1415;548,9715;05/01/2019;13:08;Ewallet;522,83;4,76;26,1415;9,1",
        ]);
        let err = load_sales_table(file.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn missing_header_column_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Invoice ID;City").unwrap();
        writeln!(file, "1;Yangon").unwrap();
        file.flush().unwrap();

        let err = load_sales_table(file.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(_)));
    }

    #[test]
    fn unique_values_keep_first_appearance_order() {
        let df = sample_table();
        assert_eq!(
            unique_values(&df, display::CITY),
            vec!["Yangon", "Mandalay", "Naypyitaw"]
        );
        assert_eq!(unique_values(&df, display::MONTH), vec!["2019-1", "2019-2", "2019-3"]);
        assert!(unique_values(&df, "missing").is_empty());
    }

    #[test]
    fn loader_caches_until_invalidated() {
        let file = write_csv(&sample_rows());
        let mut loader = DataLoader::default();

        assert!(!loader.is_fresh(file.path()));
        assert_eq!(loader.load(file.path()).unwrap().height(), 5);
        assert!(loader.is_fresh(file.path()));

        loader.invalidate();
        assert!(!loader.is_fresh(file.path()));
        assert!(loader.get_dataframe().is_none());
    }

    #[test]
    fn loader_reloads_when_file_changes() {
        let mut file = write_csv(&sample_rows()[..2]);
        let mut loader = DataLoader::default();
        assert_eq!(loader.load(file.path()).unwrap().height(), 2);

        // Appending changes the length, which invalidates the key
        writeln!(file, "{}", sample_rows()[2]).unwrap();
        file.flush().unwrap();

        assert!(!loader.is_fresh(file.path()));
        assert_eq!(loader.load(file.path()).unwrap().height(), 3);
    }

    #[test]
    fn stored_table_goes_stale_when_file_changed_during_load() {
        let mut file = write_csv(&sample_rows()[..2]);
        let key = CacheKey::for_path(file.path()).unwrap();
        let df = load_sales_table(file.path(), &LoadOptions::default()).unwrap();

        // The file changes before the loaded table reaches the cache
        writeln!(file, "{}", sample_rows()[2]).unwrap();
        file.flush().unwrap();

        let mut loader = DataLoader::default();
        loader.store(key, df);
        assert!(loader.get_dataframe().is_some());
        assert!(!loader.is_fresh(file.path()));
        assert_eq!(loader.load(file.path()).unwrap().height(), 3);
    }

    #[test]
    fn stored_table_survives_file_removal() {
        let file = write_csv(&sample_rows());
        let key = CacheKey::for_path(file.path()).unwrap();
        let df = load_sales_table(file.path(), &LoadOptions::default()).unwrap();
        let path = file.path().to_path_buf();
        drop(file);

        let mut loader = DataLoader::default();
        loader.store(key, df);
        assert_eq!(loader.get_dataframe().map(|df| df.height()), Some(5));
        assert!(!loader.is_fresh(&path));
    }
}
