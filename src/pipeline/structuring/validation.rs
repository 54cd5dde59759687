// Structural validation between the model response and persistence.
// Nothing the model returns is stored until every row passes.

use chrono::NaiveDate;

use super::parser::{parse_extraction_output, ParsedOutput};
use super::types::ExtractionOutcome;
use super::StructuringError;
use crate::models::report::{canonical_test_name, TestRecord, CANONICAL_TESTS};

/// Normalize one raw model response into records or the no-data outcome.
///
/// A batch with any bad row is rejected whole, naming the row; silently
/// dropping rows would persist a record set that disagrees with the
/// source document.
pub fn normalize_extraction_output(raw: &str) -> Result<ExtractionOutcome, StructuringError> {
    let rows = match parse_extraction_output(raw)? {
        ParsedOutput::NoData => return Ok(ExtractionOutcome::NoData),
        ParsedOutput::Rows(rows) => rows,
    };

    let mut records = Vec::with_capacity(rows.len());
    for (idx, fields) in rows.into_iter().enumerate() {
        records.push(validate_row(idx + 1, fields)?);
    }

    Ok(ExtractionOutcome::Records(records))
}

fn validate_row(row: usize, fields: Vec<String>) -> Result<TestRecord, StructuringError> {
    let mut fields = fields.into_iter();
    let date = fields.next().unwrap_or_default();
    let name = fields.next().unwrap_or_default();
    let value = fields.next().unwrap_or_default();
    let comment = fields.next().unwrap_or_default();

    if date.is_empty() {
        return Err(malformed(row, "empty date field"));
    }
    if NaiveDate::parse_from_str(&date, "%d-%m-%Y").is_err() {
        return Err(malformed(row, &format!("date '{date}' is not DD-MM-YYYY")));
    }
    if name.is_empty() {
        return Err(malformed(row, "empty test name"));
    }
    if value.is_empty() {
        return Err(malformed(row, "empty test value"));
    }
    // the comment (unit/range/interpretation) is legitimately absent on
    // some reports

    let test_name = canonical_test_name(&name);
    if !CANONICAL_TESTS.contains(&test_name.as_str()) {
        tracing::debug!(row, test_name = %test_name, "test name outside the canonical list, kept verbatim");
    }

    Ok(TestRecord {
        date,
        test_name,
        value,
        comment,
    })
}

fn malformed(row: usize, reason: &str) -> StructuringError {
    StructuringError::MalformedOutput {
        row,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::prompt::NO_DATA_SENTINEL;

    #[test]
    fn sentinel_normalizes_to_no_data() {
        let outcome = normalize_extraction_output(NO_DATA_SENTINEL).unwrap();
        assert!(outcome.is_no_data());
        assert!(outcome.records().is_empty());
    }

    #[test]
    fn valid_rows_become_records_in_order() {
        let raw = "01-01-2024,FBS,95,mg/dL Normal\n02-01-2024,hba1c,6.5,percent";
        let outcome = normalize_extraction_output(raw).unwrap();
        let records = outcome.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].test_name, "FBS");
        assert_eq!(records[1].test_name, "HBA1C");
        assert_eq!(records[1].date, "02-01-2024");
    }

    #[test]
    fn every_record_has_a_nonempty_uppercase_name() {
        let raw = "01-01-2024,serum amylase,110,U/L\n01-01-2024,tsh,2.1,mIU/L";
        let outcome = normalize_extraction_output(raw).unwrap();
        for record in outcome.records() {
            assert!(!record.test_name.is_empty());
            assert_eq!(record.test_name, record.test_name.to_uppercase());
        }
        assert_eq!(outcome.records()[0].test_name, "SERUM AMYLASE");
        assert_eq!(outcome.records()[1].test_name, "TSH");
    }

    #[test]
    fn quoted_comment_keeps_four_logical_fields() {
        let raw = r#"01-01-2024,HBA1C,6.5,"Normal, within range""#;
        let outcome = normalize_extraction_output(raw).unwrap();
        let records = outcome.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].comment, "Normal, within range");
    }

    #[test]
    fn bad_date_rejects_the_whole_batch() {
        let raw = "01-01-2024,FBS,95,ok\n2024-01-02,TSH,2.1,ok";
        match normalize_extraction_output(raw) {
            Err(StructuringError::MalformedOutput { row, reason }) => {
                assert_eq!(row, 2);
                assert!(reason.contains("DD-MM-YYYY"));
            }
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[test]
    fn impossible_calendar_date_is_rejected() {
        let raw = "32-01-2024,FBS,95,ok";
        assert!(matches!(
            normalize_extraction_output(raw),
            Err(StructuringError::MalformedOutput { row: 1, .. })
        ));
    }

    #[test]
    fn empty_value_rejects_the_row() {
        let raw = "01-01-2024,FBS,,mg/dL";
        match normalize_extraction_output(raw) {
            Err(StructuringError::MalformedOutput { row: 1, reason }) => {
                assert!(reason.contains("value"));
            }
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[test]
    fn empty_comment_is_allowed() {
        let raw = "01-01-2024,FBS,95,";
        let outcome = normalize_extraction_output(raw).unwrap();
        assert_eq!(outcome.records()[0].comment, "");
    }
}
