//! Indentation inference for inserted job properties.

use crate::timeout::TimeoutError;

/// Job properties whose indentation is borrowed for the new line.
const JOB_PROPERTY_PREFIXES: [&str; 6] = [
    "runs-on:",
    "steps:",
    "permissions:",
    "strategy:",
    "timeout-minutes:",
    "needs:",
];

/// Determines the indentation of the properties of the job whose key is on
/// `job_line` (1-based).
///
/// Inline jobs (`job:  {runs-on: ...}`) get the key's own indentation plus two
/// spaces. Otherwise the lines after the key are scanned for the first known
/// job property and its leading whitespace is used verbatim.
///
/// # Errors
///
/// Returns [`TimeoutError::IndentNotCalculated`] if no indented job property
/// follows the key.
pub(crate) fn job_property_indent<S: AsRef<str>>(
    lines: &[S],
    job_line: usize,
) -> Result<String, TimeoutError> {
    if let Some(key_line) = job_line.checked_sub(1).and_then(|index| lines.get(index)) {
        let key_line = key_line.as_ref();
        if key_line.contains('{') && key_line.contains("runs-on:") && key_line.find(':') > Some(0) {
            return Ok(format!("{}  ", leading_whitespace(key_line)));
        }
    }

    lines
        .iter()
        .skip(job_line)
        .map(|line| line.as_ref())
        .find_map(|line| {
            let trimmed = line.trim();
            let indent = leading_whitespace(line);
            let is_property = JOB_PROPERTY_PREFIXES
                .iter()
                .any(|prefix| trimmed.starts_with(prefix));
            (is_property && !indent.is_empty()).then(|| indent.to_string())
        })
        .ok_or(TimeoutError::IndentNotCalculated { line: job_line })
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}
