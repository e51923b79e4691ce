use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

use centime_core::DateFormat;

use crate::engine::RawRow;

/// Column positions of the fields this engine needs. Transport only: values
/// are carried as raw text and normalized later, so a malformed amount is a
/// triage decision for that row, not a failed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvColumnMapping {
    pub date_column: Option<usize>,
    pub details_column: Option<usize>,
    pub amount_column: Option<usize>,
    pub op_type_column: Option<usize>,
    pub type_display_column: Option<usize>,
    pub date_format: String,
}

impl Default for CsvColumnMapping {
    fn default() -> Self {
        Self {
            date_column: None,
            details_column: None,
            amount_column: None,
            op_type_column: None,
            type_display_column: None,
            date_format: "DD/MM/YYYY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvImportProfile {
    pub name: String,
    pub mapping: CsvColumnMapping,
    pub has_header: bool,
    pub delimiter: String,
}

impl Default for CsvImportProfile {
    fn default() -> Self {
        Self {
            name: "Unnamed Profile".to_string(),
            mapping: CsvColumnMapping::default(),
            has_header: true,
            delimiter: ",".to_string(),
        }
    }
}

impl CsvImportProfile {
    pub fn from_toml(toml_content: &str) -> Result<Self, CsvError> {
        toml::from_str(toml_content).map_err(|e| CsvError::InvalidProfile(e.to_string()))
    }

    /// The date layout this profile declares for its source files.
    pub fn date_format(&self) -> Result<DateFormat, CsvError> {
        self.mapping
            .date_format
            .parse()
            .map_err(CsvError::InvalidProfile)
    }
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid import profile: {0}")]
    InvalidProfile(String),
    #[error("No data rows")]
    NoDataRows,
}

pub fn parse<R: Read>(
    reader: &mut csv::Reader<R>,
    profile: &CsvImportProfile,
) -> Result<Vec<RawRow>, CsvError> {
    let mapping = &profile.mapping;
    let date_col = mapping
        .date_column
        .ok_or_else(|| CsvError::MissingColumn("date_column".to_string()))?;
    let details_col = mapping
        .details_column
        .ok_or_else(|| CsvError::MissingColumn("details_column".to_string()))?;
    let amount_col = mapping
        .amount_column
        .ok_or_else(|| CsvError::MissingColumn("amount_column".to_string()))?;

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;

        if record.is_empty() {
            continue;
        }

        let date = record
            .get(date_col)
            .ok_or_else(|| CsvError::MissingColumn(format!("date_column {date_col}")))?;
        let details = record
            .get(details_col)
            .ok_or_else(|| CsvError::MissingColumn(format!("details_column {details_col}")))?;
        let amount = record
            .get(amount_col)
            .ok_or_else(|| CsvError::MissingColumn(format!("amount_column {amount_col}")))?;

        let op_type = mapping
            .op_type_column
            .and_then(|col| record.get(col))
            .unwrap_or_default();
        let type_display = mapping
            .type_display_column
            .and_then(|col| record.get(col))
            .unwrap_or_default();

        rows.push(RawRow {
            op_type: op_type.to_string(),
            type_display: type_display.to_string(),
            details: details.to_string(),
            amount: amount.to_string(),
            date: date.to_string(),
        });
    }

    if rows.is_empty() {
        return Err(CsvError::NoDataRows);
    }

    Ok(rows)
}

pub fn import_csv<R: Read>(
    data: R,
    profile: &CsvImportProfile,
) -> Result<Vec<RawRow>, CsvError> {
    let delimiter = profile
        .delimiter
        .as_bytes()
        .first()
        .copied()
        .unwrap_or(b',');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(profile.has_header)
        .delimiter(delimiter)
        .from_reader(data);

    parse(&mut reader, profile)
}

/// First record of the file, for mapping columns interactively.
pub fn detect_columns<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>, CsvError> {
    let mut headers = Vec::new();

    if let Some(result) = reader.records().next() {
        let record = result?;
        headers = record.iter().map(|s| s.to_string()).collect();
    }

    Ok(headers)
}
