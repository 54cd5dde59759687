use super::prompt::NO_DATA_SENTINEL;
use super::StructuringError;

/// Structural reading of one raw model response: either the no-data
/// sentinel, or rows of exactly 4 fields each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    NoData,
    Rows(Vec<Vec<String>>),
}

/// Number of columns every output row must carry.
pub const ROW_FIELDS: usize = 4;

/// Parse the raw model output. The raw text is never trusted as
/// structured data: an empty response and any row with the wrong arity
/// are errors, and only the sentinel produces the no-data reading.
pub fn parse_extraction_output(raw: &str) -> Result<ParsedOutput, StructuringError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StructuringError::EmptyResponse);
    }

    if is_no_data(trimmed) {
        return Ok(ParsedOutput::NoData);
    }

    let mut rows = Vec::new();
    for line in trimmed.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        let row = rows.len() + 1;
        let fields = split_csv_row(line)
            .map_err(|reason| StructuringError::MalformedOutput { row, reason })?;
        if fields.len() != ROW_FIELDS {
            return Err(StructuringError::MalformedOutput {
                row,
                reason: format!("expected {ROW_FIELDS} fields, found {}", fields.len()),
            });
        }
        rows.push(fields);
    }

    if rows.is_empty() {
        return Err(StructuringError::MalformedOutput {
            row: 1,
            reason: "no rows in response".into(),
        });
    }

    Ok(ParsedOutput::Rows(rows))
}

/// The sentinel counts when it is the whole response or its only
/// non-empty line (models sometimes wrap it in quotes or add a period).
fn is_no_data(trimmed: &str) -> bool {
    if trimmed == NO_DATA_SENTINEL {
        return true;
    }
    let mut lines = trimmed.lines().map(str::trim).filter(|line| !line.is_empty());
    match (lines.next(), lines.next()) {
        (Some(line), None) => line.contains(NO_DATA_SENTINEL),
        _ => false,
    }
}

/// Split one comma-separated row, honoring double-quoted fields with ""
/// escapes. A comma inside quotes is field content, not a separator.
fn split_csv_row(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' if field.trim().is_empty() => {
                    field.clear();
                    in_quotes = true;
                }
                ',' => {
                    fields.push(field.trim().to_string());
                    field = String::new();
                }
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err("unclosed quote".into());
    }
    fields.push(field.trim().to_string());
    Ok(fields)
}
