use std::fs;
use std::path::Path;

use anyhow::Context;

/// Parse integers separated by commas and/or whitespace.
pub fn parse_run(text: &str) -> anyhow::Result<Vec<i64>> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .map(|f| f.parse::<i64>().with_context(|| format!("not an integer: {f:?}")))
        .collect()
}

pub fn read_run(path: &Path) -> anyhow::Result<Vec<i64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading input {}", path.display()))?;
    parse_run(&text).with_context(|| format!("parsing input {}", path.display()))
}
