//! The log file format: a data section, one point per line, and a parameter section of
//! `key: value` lines.
//!
//! ```text
//! // anything after two slashes is a comment
//! SECTION_LOG_DATA
//! 1 5000 0.25
//! 2 4100 0.31
//! SECTION_END
//! SECTION_PARAMETERS
//! algorithm: ea
//! seed: 0x1234
//! SECTION_END
//! ```
//!
//! Markers are matched case-insensitively against the whole (trimmed) line. Lines outside of
//! sections are ignored.

use std::collections::BTreeMap;

use super::{Dimension, Number, ParseNumberError, Run};

pub const SECTION_LOG_DATA: &str = "SECTION_LOG_DATA";
pub const SECTION_PARAMETERS: &str = "SECTION_PARAMETERS";
pub const SECTION_END: &str = "SECTION_END";

const COMMENT: &str = "//";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum ScanState {
    #[default]
    #[display(fmt = "idle")]
    Idle,
    #[display(fmt = "log data")]
    LogData,
    #[display(fmt = "parameters")]
    Parameters,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("line {line}: {marker} inside the {state} section")]
    NestedSection {
        line: usize,
        marker: &'static str,
        state: ScanState,
    },
    #[error("line {line}: SECTION_END outside of any section")]
    StrayEnd { line: usize },
    #[error("line {line}: parameter lines look like `key: value`")]
    MissingSeparator { line: usize },
    #[error("{state} section is never closed")]
    Unterminated { state: ScanState },
    #[error("line {line}: expected {expected} values, found {found}")]
    WrongArity {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: {source}")]
    BadValue {
        line: usize,
        source: ParseNumberError,
    },
    #[error("line {line}: parameter {key} is set twice")]
    DuplicateParameter { line: usize, key: String },
}

/// Receives what [`scan`] finds. Line numbers start at 1.
pub trait ScanSink {
    fn data(&mut self, line: usize, text: &str) -> Result<(), ScanError>;

    fn parameter(&mut self, line: usize, key: &str, value: &str) -> Result<(), ScanError>;
}

fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT) {
        Some(start) => &line[..start],
        None => line,
    }
}

fn marker(line: &str) -> Option<&'static str> {
    [SECTION_LOG_DATA, SECTION_PARAMETERS, SECTION_END]
        .into_iter()
        .find(|marker| line.eq_ignore_ascii_case(marker))
}

/// Feeds every data and parameter line of `text` to `sink`, stopping at the first error
pub fn scan<S: ScanSink + ?Sized>(text: &str, sink: &mut S) -> Result<(), ScanError> {
    let mut state = ScanState::Idle;
    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }
        state = match (state, marker(line)) {
            (ScanState::Idle, Some(SECTION_LOG_DATA)) => ScanState::LogData,
            (ScanState::Idle, Some(SECTION_PARAMETERS)) => ScanState::Parameters,
            (ScanState::Idle, Some(_)) => return Err(ScanError::StrayEnd { line: number }),
            (_, Some(SECTION_END)) => ScanState::Idle,
            (state, Some(marker)) => {
                return Err(ScanError::NestedSection {
                    line: number,
                    marker,
                    state,
                })
            }
            (ScanState::Idle, None) => ScanState::Idle,
            (ScanState::LogData, None) => {
                sink.data(number, line)?;
                ScanState::LogData
            }
            (ScanState::Parameters, None) => {
                let (key, value) = line
                    .split_once(':')
                    .ok_or(ScanError::MissingSeparator { line: number })?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(ScanError::MissingSeparator { line: number });
                }
                sink.parameter(number, key, value.trim())?;
                ScanState::Parameters
            }
        };
    }
    match state {
        ScanState::Idle => Ok(()),
        state => Err(ScanError::Unterminated { state }),
    }
}

/// Builds a [`Run`] from a scanned log file, parsing every data point with the dimensions' parsers
#[derive(Debug)]
pub struct RunBuilder<'d> {
    dimensions: &'d [Dimension],
    instance: String,
    parameters: BTreeMap<String, String>,
    points: Vec<Vec<Number>>,
}

impl<'d> RunBuilder<'d> {
    pub fn new(dimensions: &'d [Dimension], instance: impl Into<String>) -> Self {
        Self {
            dimensions,
            instance: instance.into(),
            parameters: BTreeMap::new(),
            points: Vec::new(),
        }
    }

    pub fn finish(self) -> Run {
        Run {
            instance: self.instance,
            parameters: self.parameters,
            points: self.points,
        }
    }
}

impl ScanSink for RunBuilder<'_> {
    fn data(&mut self, line: usize, text: &str) -> Result<(), ScanError> {
        let values: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|value| !value.is_empty())
            .collect();
        if values.len() != self.dimensions.len() {
            return Err(ScanError::WrongArity {
                line,
                expected: self.dimensions.len(),
                found: values.len(),
            });
        }
        let point = values
            .into_iter()
            .zip(self.dimensions)
            .map(|(value, dimension)| dimension.parser.parse(value))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ScanError::BadValue { line, source })?;
        self.points.push(point);
        Ok(())
    }

    fn parameter(&mut self, line: usize, key: &str, value: &str) -> Result<(), ScanError> {
        if self.parameters.contains_key(key) {
            return Err(ScanError::DuplicateParameter {
                line,
                key: key.to_owned(),
            });
        }
        self.parameters.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
