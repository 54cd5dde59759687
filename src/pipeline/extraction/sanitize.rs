/// Clean up raw extracted text before it reaches the prompt: drop control
/// characters, trim each line, collapse blank lines. Report punctuation
/// (units, ranges, percentages) passes through untouched.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
