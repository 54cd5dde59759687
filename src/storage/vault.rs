use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{derive_storage_key, PersistenceGateway, StorageError, StoredReport};
use crate::models::document::Document;
use crate::models::patient::PatientDetails;
use crate::models::report::TestRecord;
use crate::pipeline::processor::DocumentReport;

/// Reference gateway: a local vault directory.
///
/// Layout: `<root>/<storage_key>/` holding the original upload,
/// `report.csv`, and `metadata.json`. The original bytes are written
/// before any derived data; if a later write fails the partial entry is
/// removed, so the vault never holds metadata for a file that was not
/// durably stored.
pub struct LocalVaultGateway {
    root: PathBuf,
}

#[derive(Serialize)]
struct VaultMetadata<'a> {
    patient: &'a PatientDetails,
    document_id: Uuid,
    file_name: &'a str,
    media_type: &'static str,
    content_hash: String,
    uploaded_at: DateTime<Utc>,
    no_data: bool,
    record_count: usize,
    records: &'a [TestRecord],
}

impl LocalVaultGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn write_entry(
        &self,
        dir: &Path,
        patient: &PatientDetails,
        document: &Document,
        report: &DocumentReport,
    ) -> Result<(), StorageError> {
        fs::create_dir_all(dir)?;

        // original bytes first; derived data only once the file is down
        fs::write(dir.join(safe_file_name(&document.file_name)), &document.bytes)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        fs::write(dir.join("report.csv"), report.to_csv())
            .map_err(|e| StorageError::Metadata(e.to_string()))?;

        let metadata = VaultMetadata {
            patient,
            document_id: document.id,
            file_name: &document.file_name,
            media_type: document.media_type.as_str(),
            content_hash: document.content_hash(),
            uploaded_at: Utc::now(),
            no_data: report.outcome.is_no_data(),
            record_count: report.outcome.records().len(),
            records: report.outcome.records(),
        };
        let json = serde_json::to_vec_pretty(&metadata)
            .map_err(|e| StorageError::Metadata(e.to_string()))?;
        fs::write(dir.join("metadata.json"), json)
            .map_err(|e| StorageError::Metadata(e.to_string()))?;

        Ok(())
    }
}

impl PersistenceGateway for LocalVaultGateway {
    fn store(
        &self,
        patient: &PatientDetails,
        document: &Document,
        report: &DocumentReport,
    ) -> Result<StoredReport, StorageError> {
        let storage_key = derive_storage_key(patient, document);
        let dir = self.root.join(&storage_key);

        match self.write_entry(&dir, patient, document, report) {
            Ok(()) => {
                tracing::info!(
                    storage_key = %storage_key,
                    records = report.outcome.records().len(),
                    "report filed in vault"
                );
                Ok(StoredReport {
                    storage_key,
                    record_count: report.outcome.records().len(),
                    no_data: report.outcome.is_no_data(),
                })
            }
            Err(e) => {
                // keep bytes and metadata in step: a half-written entry
                // is worse than no entry
                if dir.exists() {
                    let _ = fs::remove_dir_all(&dir);
                }
                Err(e)
            }
        }
    }
}

/// Only the final path component of the uploaded name ever touches the
/// vault filesystem.
fn safe_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string()
}
