use super::types::ExtractionRequest;
use super::StructuringError;
use crate::models::report::CANONICAL_TESTS;

/// Exact phrase the model must return when a report contains no
/// interpretable data. The normalizer matches it verbatim.
pub const NO_DATA_SENTINEL: &str = "Data could not be extracted because of some reason";

/// Upper bound on report text per extraction request. The API enforces a
/// response-size ceiling and an implicit request-size ceiling; oversized
/// input is rejected up front instead of silently truncated.
pub const MAX_REPORT_CHARS: usize = 60_000;

/// Fixed system instruction: analyst role, output shape, date format,
/// canonical naming bias.
pub fn system_instruction() -> String {
    format!(
        r#"You are an expert medical data analyst. You convert raw lab-report text into rows of test results.

RULES, NO EXCEPTIONS:
1. Output ONLY comma-separated rows with exactly 4 columns: Date, Test Name, Test Value, Test Comment.
2. No header row. No prose. No explanations. No markdown.
3. Dates use the DD-MM-YYYY format.
4. Prefer these canonical test names when one fits: {names}.
5. When no canonical name fits, keep the report's own test name in ALL CAPS.
6. Test Comment holds the unit, the normal range, and the interpretation as free text.
7. Double-quote any column that itself contains a comma.
8. Extract ONLY values printed in the report. NEVER invent a date, test, or value."#,
        names = CANONICAL_TESTS.join(", ")
    )
}

/// Build the per-document extraction request, embedding the report text
/// verbatim. An empty report still builds a well-formed request so the
/// no-data path applies.
pub fn build_extraction_request(report_text: &str) -> Result<ExtractionRequest, StructuringError> {
    let chars = report_text.chars().count();
    if chars > MAX_REPORT_CHARS {
        return Err(StructuringError::InputTooLarge {
            chars,
            limit: MAX_REPORT_CHARS,
        });
    }

    let user = format!(
        r#"<report>
{report_text}
</report>

Extract every test result from the report above as comma-separated rows:
Date, Test Name, Test Value, Test Comment. One row per test, no header.

If the text contains no interpretable report data, respond with exactly:
{NO_DATA_SENTINEL}"#
    );

    Ok(ExtractionRequest {
        system: system_instruction(),
        user,
    })
}
