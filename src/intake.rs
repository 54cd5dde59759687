//! Submission flow: one patient, a set of uploaded reports.
//!
//! Ties the pipeline to the persistence and notification boundaries.
//! Documents are processed sequentially; a failure halts that document
//! only, never the rest of the submission.

use crate::models::document::Document;
use crate::models::patient::PatientDetails;
use crate::notify::WebhookNotifier;
use crate::pipeline::processor::{ProcessingError, ReportProcessor};
use crate::storage::{PersistenceGateway, StorageError, StoredReport};

/// One user-initiated submission.
pub struct Submission {
    pub patient: PatientDetails,
    pub documents: Vec<Document>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

/// Per-document result of a submission.
pub struct DocumentOutcome {
    pub file_name: String,
    pub result: Result<StoredReport, SubmissionError>,
}

pub struct IntakeService {
    processor: ReportProcessor,
    gateway: Box<dyn PersistenceGateway + Send + Sync>,
    notifier: Option<WebhookNotifier>,
}

impl IntakeService {
    pub fn new(
        processor: ReportProcessor,
        gateway: Box<dyn PersistenceGateway + Send + Sync>,
    ) -> Self {
        Self {
            processor,
            gateway,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: WebhookNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Run the full sequence for every document in the submission:
    /// extract → prompt → model → normalize → persist → notify.
    pub fn submit(&self, submission: &Submission) -> Vec<DocumentOutcome> {
        let _span = tracing::info_span!(
            "submit",
            patient = %submission.patient.storage_label(),
            documents = submission.documents.len()
        )
        .entered();

        submission
            .documents
            .iter()
            .map(|document| {
                let result = self.submit_document(&submission.patient, document);
                if let Err(e) = &result {
                    tracing::error!(file = %document.file_name, error = %e, "document failed");
                }
                DocumentOutcome {
                    file_name: document.file_name.clone(),
                    result,
                }
            })
            .collect()
    }

    fn submit_document(
        &self,
        patient: &PatientDetails,
        document: &Document,
    ) -> Result<StoredReport, SubmissionError> {
        let report = self.processor.process_document(document)?;
        let stored = self.gateway.store(patient, document, &report)?;

        if let Some(notifier) = &self.notifier {
            // the report is already durably stored; a failed relay is
            // logged, not escalated
            if let Err(e) = notifier.send_report(&patient.name, &document.file_name, &report.to_csv())
            {
                tracing::warn!(
                    file = %document.file_name,
                    error = %e,
                    "webhook notification failed; report remains stored"
                );
            }
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::document::MediaType;
    use crate::pipeline::extraction::pdf::ReportTextExtractor;
    use crate::pipeline::structuring::client::MockLlmClient;
    use crate::pipeline::structuring::prompt::NO_DATA_SENTINEL;
    use crate::storage::MemoryGateway;

    fn patient() -> PatientDetails {
        PatientDetails {
            name: "Asha Patel".to_string(),
            contact_number: "9876543210".to_string(),
            email: "asha@example.com".to_string(),
            consultation_date: None,
        }
    }

    /// Minimal single-page PDF with the given text, via lopdf.
    fn make_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document as PdfDocument, Object, Stream};

        let mut doc = PdfDocument::with_version("1.4");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn service_with(llm: MockLlmClient) -> (IntakeService, Arc<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::default());
        let processor = ReportProcessor::new(Box::new(ReportTextExtractor), Box::new(llm));
        let service = IntakeService::new(processor, Box::new(SharedGateway(gateway.clone())));
        (service, gateway)
    }

    /// Lets tests keep a handle on the gateway the service owns.
    struct SharedGateway(Arc<MemoryGateway>);

    impl PersistenceGateway for SharedGateway {
        fn store(
            &self,
            patient: &PatientDetails,
            document: &Document,
            report: &crate::pipeline::processor::DocumentReport,
        ) -> Result<StoredReport, StorageError> {
            self.0.store(patient, document, report)
        }
    }

    #[test]
    fn end_to_end_pdf_to_stored_record() {
        let (service, gateway) = service_with(MockLlmClient::new("01-01-2024,FBS,95,mg/dL Normal"));
        let submission = Submission {
            patient: patient(),
            documents: vec![Document::new(
                "report.pdf",
                MediaType::Pdf,
                make_pdf("FBS: 95 mg/dL (Normal) on 01-01-2024"),
            )],
        };

        let outcomes = service.submit(&submission);
        assert_eq!(outcomes.len(), 1);
        let stored = outcomes[0].result.as_ref().unwrap();
        assert_eq!(stored.record_count, 1);
        assert!(!stored.no_data);

        let entries = gateway.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].csv, "01-01-2024,FBS,95,mg/dL Normal\n");
        assert_eq!(entries[0].patient_name, "Asha Patel");
    }

    #[test]
    fn end_to_end_blank_pdf_yields_no_data() {
        let (service, gateway) = service_with(MockLlmClient::new(NO_DATA_SENTINEL));
        let submission = Submission {
            patient: patient(),
            documents: vec![Document::new("scan.pdf", MediaType::Pdf, make_pdf(""))],
        };

        let outcomes = service.submit(&submission);
        let stored = outcomes[0].result.as_ref().unwrap();
        assert!(stored.no_data);
        assert_eq!(stored.record_count, 0);
        assert_eq!(gateway.entries.lock().unwrap()[0].csv, "");
    }

    #[test]
    fn one_failing_document_does_not_halt_the_rest() {
        let (service, gateway) = service_with(MockLlmClient::new("01-01-2024,TSH,2.1,mIU/L"));
        let submission = Submission {
            patient: patient(),
            documents: vec![
                Document::new("photo.jpg", MediaType::Image, vec![0xFF, 0xD8]),
                Document::new("report.pdf", MediaType::Pdf, make_pdf("TSH 2.1 mIU/L")),
            ],
        };

        let outcomes = service.submit(&submission);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_err());
        assert!(outcomes[1].result.is_ok());
        assert_eq!(gateway.entries.lock().unwrap().len(), 1);
    }
}
