//! Sales Data Loader Module
//! Fetches the historical sales CSV once and normalizes it with Polars.

use polars::prelude::*;
use reqwest::blocking::Client;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const VEHICLE_TYPE: &str = "Vehicle_Type";
pub const SALES: &str = "Automobile_Sales";
pub const AD_SPEND: &str = "Advertising_Expenditure";
pub const UNEMPLOYMENT: &str = "Unemployment_Rate";
pub const RECESSION: &str = "Recession";

/// Columns every dataset must provide, in canonical spelling.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    YEAR,
    MONTH,
    VEHICLE_TYPE,
    SALES,
    AD_SPEND,
    UNEMPLOYMENT,
    RECESSION,
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data unavailable from {location}: {reason}")]
    DataUnavailable { location: String, reason: String },
    #[error("Malformed CSV: {0}")]
    Malformed(#[from] PolarsError),
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Dataset contains no rows")]
    Empty,
}

/// Where the CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    Path(PathBuf),
}

impl DataSource {
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(location.to_string())
        } else {
            DataSource::Path(PathBuf::from(location))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => f.write_str(url),
            DataSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Target dtype of a canonical column.
fn canonical_dtype(column: &str) -> DataType {
    match column {
        YEAR | RECESSION => DataType::Int32,
        MONTH | VEHICLE_TYPE => DataType::String,
        _ => DataType::Float64,
    }
}

/// Immutable sales dataset with canonical column names and dtypes.
#[derive(Debug, Clone)]
pub struct SalesTable {
    df: DataFrame,
    years: Vec<i32>,
}

impl SalesTable {
    /// Validate and normalize a raw DataFrame.
    ///
    /// Column names match case-insensitively and are renamed to canonical
    /// spelling; columns outside `REQUIRED_COLUMNS` are dropped.
    pub fn from_dataframe(df: DataFrame) -> Result<Self, LoaderError> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        // Renamed via `alias` in the lazy select below.
        let mut resolved = Vec::with_capacity(REQUIRED_COLUMNS.len());
        let mut missing = Vec::new();
        for canonical in REQUIRED_COLUMNS {
            let actual = present
                .iter()
                .find(|name| name.as_str() == canonical)
                .or_else(|| {
                    present
                        .iter()
                        .find(|name| name.trim().eq_ignore_ascii_case(canonical))
                });
            match actual {
                Some(name) => {
                    if name != canonical {
                        debug!(from = %name, to = canonical, "renaming column");
                    }
                    resolved.push((name.clone(), canonical));
                }
                None => missing.push(canonical.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(LoaderError::MissingColumns(missing));
        }

        let columns: Vec<Expr> = resolved
            .iter()
            .map(|(actual, canonical)| {
                col(actual.as_str())
                    .cast(canonical_dtype(canonical))
                    .alias(*canonical)
            })
            .collect();

        let df = df.lazy().select(columns).collect()?;

        if df.height() == 0 {
            return Err(LoaderError::Empty);
        }

        let years: BTreeSet<i32> = df.column(YEAR)?.i32()?.into_iter().flatten().collect();

        Ok(Self {
            df,
            years: years.into_iter().collect(),
        })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Distinct years present at load time, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.years.binary_search(&year).is_ok()
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    /// Distinct vehicle types, sorted.
    pub fn vehicle_types(&self) -> Vec<String> {
        let types: BTreeSet<String> = self
            .df
            .column(VEHICLE_TYPE)
            .ok()
            .and_then(|col| col.str().ok())
            .map(|ca| ca.into_iter().flatten().map(str::to_string).collect())
            .unwrap_or_default();
        types.into_iter().collect()
    }
}

/// Loads the sales dataset from a URL or a local file.
pub struct SalesDataLoader {
    timeout: Duration,
}

impl Default for SalesDataLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl SalesDataLoader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Read, parse and normalize the dataset. Every failure is fatal to the caller.
    pub fn load(&self, source: &DataSource) -> Result<SalesTable, LoaderError> {
        info!(%source, "loading sales data");

        let bytes = match source {
            DataSource::Url(url) => self.fetch(url)?,
            DataSource::Path(path) => {
                std::fs::read(path).map_err(|e| LoaderError::DataUnavailable {
                    location: source.to_string(),
                    reason: e.to_string(),
                })?
            }
        };
        debug!(bytes = bytes.len(), "read CSV payload");

        let table = SalesTable::from_dataframe(Self::parse_csv(bytes)?)?;
        info!(
            rows = table.row_count(),
            years = table.years().len(),
            "sales data loaded"
        );
        Ok(table)
    }

    /// Parse CSV bytes; unparseable cells become nulls.
    pub fn parse_csv(bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoaderError> {
        let unavailable = |reason: String| LoaderError::DataUnavailable {
            location: url.to_string(),
            reason,
        };

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| unavailable(e.to_string()))?;
        let response = client
            .get(url)
            .send()
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP status {status}")));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Date,Year,Month,Recession,Automobile_Sales,Advertising_Expenditure,unemployment_rate,Vehicle_Type,City
1/31/1980,1980,Jan,1,456.0,1558,5.4,Superminicar,Georgia
2/29/1980,1980,Feb,1,555.9,3048,4.8,Smallfamiliycar,New York
1/31/1981,1981,Jan,0,1620.2,2930,2.9,Sports,California
2/28/1981,1981,Feb,0,not-a-number,1721,3.1,Sports,Illinois
";

    fn sample_table() -> SalesTable {
        let df = SalesDataLoader::parse_csv(SAMPLE_CSV.as_bytes().to_vec()).unwrap();
        SalesTable::from_dataframe(df).unwrap()
    }

    #[test]
    fn data_source_detects_urls() {
        assert_eq!(
            DataSource::parse("https://example.com/sales.csv"),
            DataSource::Url("https://example.com/sales.csv".into())
        );
        assert_eq!(
            DataSource::parse(" HTTP://example.com/a.csv"),
            DataSource::Url("HTTP://example.com/a.csv".into())
        );
        assert_eq!(
            DataSource::parse("data/sales.csv"),
            DataSource::Path(PathBuf::from("data/sales.csv"))
        );
    }

    #[test]
    fn normalizes_columns_and_types() {
        let table = sample_table();
        let df = table.dataframe();

        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, REQUIRED_COLUMNS.map(String::from).to_vec());
        assert_eq!(df.column(YEAR).unwrap().dtype(), &DataType::Int32);
        assert_eq!(df.column(SALES).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(UNEMPLOYMENT).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(RECESSION).unwrap().dtype(), &DataType::Int32);
        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn differently_cased_headers_keep_their_values() {
        let csv = "\
YEAR,month,Vehicle_Type,automobile_sales,ADVERTISING_EXPENDITURE, Unemployment_rate ,recession
1980,Jan,Sports,10.5,100,5.4,1
";
        let df = SalesDataLoader::parse_csv(csv.as_bytes().to_vec()).unwrap();
        let table = SalesTable::from_dataframe(df).unwrap();
        let df = table.dataframe();

        assert_eq!(table.years(), &[1980]);
        assert_eq!(df.column(SALES).unwrap().f64().unwrap().get(0), Some(10.5));
        assert_eq!(df.column(UNEMPLOYMENT).unwrap().f64().unwrap().get(0), Some(5.4));
        assert_eq!(df.column(RECESSION).unwrap().i32().unwrap().get(0), Some(1));
    }

    #[test]
    fn unparseable_cells_become_nulls() {
        let table = sample_table();
        let sales = table.dataframe().column(SALES).unwrap().f64().unwrap().clone();
        assert_eq!(sales.null_count(), 1);
    }

    #[test]
    fn collects_distinct_years_and_vehicle_types() {
        let table = sample_table();
        assert_eq!(table.years(), &[1980, 1981]);
        assert!(table.contains_year(1981));
        assert!(!table.contains_year(2022));
        assert_eq!(
            table.vehicle_types(),
            vec!["Smallfamiliycar", "Sports", "Superminicar"]
        );
    }

    #[test]
    fn missing_columns_are_reported() {
        let csv = "Year,Month,Automobile_Sales\n1980,Jan,10\n";
        let df = SalesDataLoader::parse_csv(csv.as_bytes().to_vec()).unwrap();
        match SalesTable::from_dataframe(df) {
            Err(LoaderError::MissingColumns(cols)) => assert_eq!(
                cols,
                vec![VEHICLE_TYPE, AD_SPEND, UNEMPLOYMENT, RECESSION]
            ),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn header_only_csv_is_empty() {
        let header = SAMPLE_CSV.lines().next().unwrap();
        let df = SalesDataLoader::parse_csv(format!("{header}\n").into_bytes()).unwrap();
        assert!(matches!(
            SalesTable::from_dataframe(df),
            Err(LoaderError::Empty)
        ));
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let loader = SalesDataLoader::default();
        let source = DataSource::parse("/definitely/not/here/sales.csv");
        assert!(matches!(
            loader.load(&source),
            Err(LoaderError::DataUnavailable { .. })
        ));
    }
}
