use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info};

use centime_core::{
    fingerprint, normalize_amount, normalize_date, BankAccount, DateError, DateFormat,
    Fingerprint, FingerprintFields, MalformedAmount,
};

use crate::store::FingerprintStore;

/// One row as exported by a bank: amount and date still free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub op_type: String,
    pub type_display: String,
    pub details: String,
    pub amount: String,
    pub date: String,
}

/// A row whose amount and date survived strict normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub op_type: String,
    pub type_display: String,
    pub details: String,
    pub amount_in_cents: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error(transparent)]
    Amount(#[from] MalformedAmount),
    #[error(transparent)]
    Date(#[from] DateError),
}

impl RawRow {
    /// Strict per-row normalization. A failure aborts this row only; the
    /// error message is a complete sentence fit to surface to the user.
    pub fn normalize(&self, format: DateFormat) -> Result<NormalizedRow, RowError> {
        Ok(NormalizedRow {
            op_type: self.op_type.clone(),
            type_display: self.type_display.clone(),
            details: self.details.clone(),
            amount_in_cents: normalize_amount(&self.amount)?,
            date: normalize_date(&self.date, format)?,
        })
    }
}

impl NormalizedRow {
    /// Digest of this row for the given account, byte-identical to what an
    /// [`centime_core::Operation`] built from the same tuple would carry.
    pub fn fingerprint(&self, account_slug: &str) -> Fingerprint {
        fingerprint::compute(&FingerprintFields {
            op_type: &self.op_type,
            account_slug,
            type_display: &self.type_display,
            details: &self.details,
            date: self.date,
            amount_in_cents: self.amount_in_cents,
        })
    }
}

/// Per-row classification the import collaborator acts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportDecision {
    New { fingerprint: Fingerprint },
    Duplicate { fingerprint: Fingerprint },
    NeedsTriage { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    /// Index of the row in the submitted batch.
    pub row: usize,
    pub decision: ImportDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub outcomes: Vec<RowOutcome>,
    pub new: usize,
    pub duplicates: usize,
    pub triage: usize,
}

impl ImportReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Classifies batches of raw rows as new, duplicate or needing triage.
#[derive(Debug, Clone, Copy)]
pub struct ImportEngine {
    /// Date layout the source export uses. Never guessed: a row that does
    /// not match goes to triage.
    pub date_format: DateFormat,
}

impl ImportEngine {
    pub fn new(date_format: DateFormat) -> Self {
        ImportEngine { date_format }
    }

    /// Classify a batch against the store, in three phases: row-local
    /// normalization (failures become `NeedsTriage`, the batch continues),
    /// concurrent fingerprinting of the surviving rows, then one serialized
    /// lookup/insert pass. Only the last phase touches shared state, so two
    /// rows carrying the same unseen digest cannot both classify as new.
    pub async fn run<S: FingerprintStore>(
        &self,
        account: &BankAccount,
        rows: Vec<RawRow>,
        store: &mut S,
    ) -> ImportReport {
        let total = rows.len();
        let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(total);

        let mut normalized: Vec<(usize, NormalizedRow)> = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            match row.normalize(self.date_format) {
                Ok(n) => normalized.push((idx, n)),
                Err(err) => {
                    debug!(row = idx, %err, "row failed normalization, routing to triage");
                    outcomes.push(RowOutcome {
                        row: idx,
                        decision: ImportDecision::NeedsTriage {
                            reason: err.to_string(),
                        },
                    });
                }
            }
        }

        // Hashing is pure, so rows fan out freely; order is restored below.
        let mut tasks = JoinSet::new();
        for (idx, row) in normalized {
            let slug = account.slug.clone();
            tasks.spawn_blocking(move || (idx, row.fingerprint(&slug)));
        }
        let mut hashed: Vec<(usize, Fingerprint)> = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            hashed.push(joined.expect("fingerprint task panicked"));
        }
        hashed.sort_by_key(|(idx, _)| *idx);

        for (idx, fp) in hashed {
            let decision = if store.contains(&account.slug, &fp) {
                ImportDecision::Duplicate { fingerprint: fp }
            } else {
                store.insert(&account.slug, fp.clone());
                ImportDecision::New { fingerprint: fp }
            };
            outcomes.push(RowOutcome { row: idx, decision });
        }
        outcomes.sort_by_key(|o| o.row);

        let mut report = ImportReport {
            outcomes,
            new: 0,
            duplicates: 0,
            triage: 0,
        };
        for outcome in &report.outcomes {
            match outcome.decision {
                ImportDecision::New { .. } => report.new += 1,
                ImportDecision::Duplicate { .. } => report.duplicates += 1,
                ImportDecision::NeedsTriage { .. } => report.triage += 1,
            }
        }

        info!(
            account = %account.slug,
            total,
            new = report.new,
            duplicates = report.duplicates,
            triage = report.triage,
            "import batch classified"
        );

        report
    }
}
