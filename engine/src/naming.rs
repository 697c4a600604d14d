//! On-disk naming contract for generations
//!
//! A generation directory is named `<name>.<interval>.<number>`. The dot is
//! the separator, so neither the snapshot name nor the interval label may
//! contain one. Generation 0 is the newest.

use std::fmt;
use std::str::FromStr;

use crate::errors::{EngineError, EngineResult};

/// Separator between the three tokens of a generation name
pub const SEPARATOR: char = '.';

/// Prefix of the scratch directory a build is assembled in
pub const SCRATCH_PREFIX: &str = "tmp";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationName {
    pub name: String,
    pub interval: String,
    pub number: u32,
}

impl GenerationName {
    pub fn new(name: impl Into<String>, interval: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            interval: interval.into(),
            number,
        }
    }

    /// Same generation, one step older
    pub fn next(&self) -> Option<Self> {
        self.number.checked_add(1).map(|number| Self {
            name: self.name.clone(),
            interval: self.interval.clone(),
            number,
        })
    }

    pub fn belongs_to(&self, name: &str, interval: &str) -> bool {
        self.name == name && self.interval == interval
    }
}

impl fmt::Display for GenerationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&dir_name(&self.name, &self.interval, self.number))
    }
}

impl FromStr for GenerationName {
    type Err = EngineError;

    fn from_str(dir_name: &str) -> EngineResult<Self> {
        parse(dir_name)
    }
}

/// `<name>.<interval>.`, the common prefix of every generation of a job
pub fn prefix(name: &str, interval: &str) -> String {
    format!("{name}{SEPARATOR}{interval}{SEPARATOR}")
}

pub fn dir_name(name: &str, interval: &str, number: u32) -> String {
    format!("{}{}", prefix(name, interval), number)
}

pub fn parse(dir_name: &str) -> EngineResult<GenerationName> {
    let invalid = |reason: &str| EngineError::InvalidGenerationName {
        name: dir_name.to_string(),
        reason: reason.to_string(),
    };

    let tokens: Vec<&str> = dir_name.split(SEPARATOR).collect();
    if tokens.len() != 3 {
        return Err(invalid("expected <name>.<interval>.<number>"));
    }

    let (name, interval, number) = (tokens[0], tokens[1], tokens[2]);
    if name.is_empty() || interval.is_empty() {
        return Err(invalid("name and interval must not be empty"));
    }

    // `u32::from_str` accepts a leading '+', the naming contract does not
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("generation number must be a non-negative integer"));
    }
    let number = number
        .parse::<u32>()
        .map_err(|e| invalid(&format!("generation number out of range: {e}")))?;

    Ok(GenerationName::new(name, interval, number))
}

/// Check a snapshot name or interval label before it is used in paths
pub fn validate_token(field: &str, value: &str) -> EngineResult<()> {
    if value.is_empty() {
        return Err(EngineError::invalid_config(field, "must not be empty"));
    }
    if value.contains(SEPARATOR) {
        return Err(EngineError::invalid_config(
            field,
            format!("'{value}' contains a '{SEPARATOR}'"),
        ));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(EngineError::invalid_config(
            field,
            format!("'{value}' contains whitespace"),
        ));
    }
    if value.contains('/') {
        return Err(EngineError::invalid_config(
            field,
            format!("'{value}' contains a path separator"),
        ));
    }
    Ok(())
}
