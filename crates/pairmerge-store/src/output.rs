use crate::error::{StoreError, StoreResult};

/// Delimiter placed between consecutive values in the output sink.
pub const DEFAULT_DELIMITER: &str = ", ";

/// Read integers back out of sink contents.
///
/// Values are split on the trimmed delimiter; surrounding whitespace and
/// empty fields are ignored, so the parse does not depend on who wrote the
/// delimiter.
pub fn parse_values(text: &str, delimiter: &str) -> StoreResult<Vec<i64>> {
    let sep = match delimiter.trim() {
        "" => None,
        trimmed => Some(trimmed),
    };
    let fields: Vec<&str> = match sep {
        Some(sep) => text.split(sep).collect(),
        None => text.split_whitespace().collect(),
    };
    fields
        .into_iter()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| {
            f.parse::<i64>().map_err(|_| StoreError::MalformedOutput {
                value: f.to_string(),
            })
        })
        .collect()
}
