//! Data loading for the report pipeline.
//!
//! The loader turns a [`DataSource`] into a polars `DataFrame` whose column
//! names and row order match the source. Every column is read as text so the
//! cleaner and normalizer see the values exactly as published.

use crate::error::{ReportError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use reqwest::blocking::Client;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Where the incident CSV comes from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Fetch with a single HTTP(S) GET.
    Url(String),
    /// Read a local CSV file.
    File(PathBuf),
    /// Use bytes already in memory.
    Bytes(Vec<u8>),
}

impl DataSource {
    /// Short description used in logs and the report header.
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::File(path) => path.display().to_string(),
            Self::Bytes(bytes) => format!("<{} in-memory bytes>", bytes.len()),
        }
    }
}

/// Loads the raw incident table.
pub struct DataLoader {
    client: Client,
}

impl DataLoader {
    /// Create a loader whose HTTP requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Load the raw table from `source`.
    pub fn load(&self, source: &DataSource) -> Result<DataFrame> {
        info!("Loading incident data from: {}", source.describe());

        let bytes = match source {
            DataSource::Url(url) => self.fetch_bytes(url)?,
            DataSource::File(path) => std::fs::read(path).map_err(|e| {
                ReportError::Fetch(format!("Could not read {}: {}", path.display(), e))
            })?,
            DataSource::Bytes(bytes) => bytes.clone(),
        };

        let df = parse_csv_bytes(bytes)?;
        info!("Loaded {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }

    /// Load the raw table from any reader.
    pub fn load_reader<R: Read>(&self, mut reader: R) -> Result<DataFrame> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ReportError::Fetch(format!("Could not read input stream: {}", e)))?;
        parse_csv_bytes(bytes)
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ReportError::Fetch(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ReportError::Fetch(format!(
                "GET {} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| ReportError::Fetch(format!("Failed to read response body: {}", e)))?;
        debug!("Fetched {} bytes", bytes.len());

        Ok(bytes.to_vec())
    }
}

/// Parse CSV text (with a header row) into a table of string columns.
pub fn parse_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame> {
    let first_content = bytes.iter().copied().find(|b| !b.is_ascii_whitespace());
    match first_content {
        None => return Err(ReportError::Fetch("Response body is empty".to_string())),
        Some(b'<') | Some(b'{') | Some(b'[') => {
            return Err(ReportError::Fetch(
                "Response is not comma-separated text (looks like HTML or JSON)".to_string(),
            ));
        }
        Some(_) => {}
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| ReportError::Fetch(format!("Response is not valid CSV: {}", e)))?;

    if df.width() == 0 {
        return Err(ReportError::Fetch("CSV has no columns".to_string()));
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "INCIDENT_KEY,OCCUR_DATE,OCCUR_TIME,BORO\n\
                          1,01/15/2019,23:45:00,BRONX\n\
                          2,07/04/2020,08:10:00,QUEENS\n";

    fn loader() -> DataLoader {
        DataLoader::new(Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_parse_preserves_columns_and_order() {
        let df = parse_csv_bytes(SAMPLE.as_bytes().to_vec()).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["INCIDENT_KEY", "OCCUR_DATE", "OCCUR_TIME", "BORO"]);
        assert_eq!(df.height(), 2);

        let keys = df.column("INCIDENT_KEY").unwrap().as_materialized_series().str().unwrap();
        let keys: Vec<Option<&str>> = keys.into_iter().collect();
        assert_eq!(keys, vec![Some("1"), Some("2")]);
    }

    #[test]
    fn test_parse_reads_everything_as_text() {
        let df = parse_csv_bytes(SAMPLE.as_bytes().to_vec()).unwrap();
        for col in df.get_columns() {
            assert_eq!(col.dtype(), &DataType::String);
        }
    }

    #[test]
    fn test_empty_body_is_fetch_error() {
        let err = parse_csv_bytes(b"  \n ".to_vec()).unwrap_err();
        assert!(err.is_fetch_error());
    }

    #[test]
    fn test_html_body_is_fetch_error() {
        let err = parse_csv_bytes(b"<!DOCTYPE html><html></html>".to_vec()).unwrap_err();
        assert!(err.is_fetch_error());
        assert!(err.to_string().contains("not comma-separated"));
    }

    #[test]
    fn test_load_from_bytes_source() {
        let df = loader()
            .load(&DataSource::Bytes(SAMPLE.as_bytes().to_vec()))
            .unwrap();
        assert_eq!(df.shape(), (2, 4));
    }

    #[test]
    fn test_load_reader() {
        let df = loader().load_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let err = loader()
            .load(&DataSource::File(PathBuf::from("/definitely/not/here.csv")))
            .unwrap_err();
        assert!(err.is_fetch_error());
    }

    #[test]
    fn test_unreachable_url_is_fetch_error() {
        // Nothing listens on the local discard port.
        let err = loader()
            .load(&DataSource::Url("http://127.0.0.1:9/rows.csv".to_string()))
            .unwrap_err();
        assert!(err.is_fetch_error());
    }

    #[test]
    fn test_describe_source() {
        assert_eq!(DataSource::Bytes(vec![1, 2, 3]).describe(), "<3 in-memory bytes>");
        assert_eq!(
            DataSource::Url("https://example.com/a.csv".to_string()).describe(),
            "https://example.com/a.csv"
        );
    }
}
