pub mod csv;
pub mod engine;
pub mod store;

pub use csv::{CsvColumnMapping, CsvError, CsvImportProfile};
pub use engine::{
    ImportDecision, ImportEngine, ImportReport, NormalizedRow, RawRow, RowError, RowOutcome,
};
pub use store::{FingerprintStore, MemoryStore};

pub mod import {
    use crate::*;

    pub fn import_csv_with_profile<R: std::io::Read>(
        data: R,
        profile: &CsvImportProfile,
    ) -> Result<Vec<RawRow>, CsvError> {
        crate::csv::import_csv(data, profile)
    }

    pub fn create_engine(date_format: centime_core::DateFormat) -> ImportEngine {
        ImportEngine::new(date_format)
    }

    /// Engine configured from a CSV profile's declared date layout.
    pub fn create_engine_for_profile(
        profile: &CsvImportProfile,
    ) -> Result<ImportEngine, CsvError> {
        Ok(ImportEngine::new(profile.date_format()?))
    }
}
