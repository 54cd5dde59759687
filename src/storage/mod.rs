//! Persistence boundary. The gateway owns durability and queryability;
//! the pipeline hands it validated data only.

pub mod vault;

pub use vault::*;

use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

use crate::models::document::Document;
use crate::models::patient::PatientDetails;
use crate::pipeline::processor::DocumentReport;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to store original file: {0}")]
    Write(String),

    #[error("failed to store report metadata: {0}")]
    Metadata(String),
}

/// Where a stored submission ended up.
#[derive(Debug, Clone, Serialize)]
pub struct StoredReport {
    pub storage_key: String,
    pub record_count: usize,
    pub no_data: bool,
}

/// Narrow persistence seam.
pub trait PersistenceGateway {
    fn store(
        &self,
        patient: &PatientDetails,
        document: &Document,
        report: &DocumentReport,
    ) -> Result<StoredReport, StorageError>;
}

/// Storage key: patient label plus a content-hash prefix. Content-derived,
/// so same-named patients never collide and resubmitting identical bytes
/// maps to the same entry instead of accumulating duplicates.
pub fn derive_storage_key(patient: &PatientDetails, document: &Document) -> String {
    let hash = document.content_hash();
    format!("{}-{}", patient.storage_label(), &hash[..12])
}

/// In-memory gateway for tests.
#[derive(Default)]
pub struct MemoryGateway {
    pub entries: Mutex<Vec<MemoryEntry>>,
}

#[derive(Debug, Clone)]
pub struct MemoryEntry {
    pub storage_key: String,
    pub patient_name: String,
    pub file_name: String,
    pub csv: String,
}

impl PersistenceGateway for MemoryGateway {
    fn store(
        &self,
        patient: &PatientDetails,
        document: &Document,
        report: &DocumentReport,
    ) -> Result<StoredReport, StorageError> {
        let storage_key = derive_storage_key(patient, document);
        let entry = MemoryEntry {
            storage_key: storage_key.clone(),
            patient_name: patient.name.clone(),
            file_name: document.file_name.clone(),
            csv: report.to_csv(),
        };
        let mut entries = self.entries.lock().expect("memory gateway lock");
        entries.retain(|existing| existing.storage_key != storage_key);
        entries.push(entry);

        Ok(StoredReport {
            storage_key,
            record_count: report.outcome.records().len(),
            no_data: report.outcome.is_no_data(),
        })
    }
}
