//! SQL identifier checks for table and column names.
//!
//! Names are spliced into SQL text verbatim, so only plain (optionally
//! table-qualified) identifiers are accepted.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("valid identifier regex")
});

pub fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}

/// Validates every column name and rejects repeats.
pub fn validate_columns(names: impl IntoIterator<Item = &'static str>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        validate_identifier(name)?;
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateColumn(name));
        }
    }
    Ok(())
}
