use std::{fmt::Display, io, path::PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the series builder and the aggregator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalanceError {
    #[error("no balance records found and no explicit period given")]
    EmptyInput,

    #[error("invalid period: start {start} is after end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("no balance is known on or before {start} to open the period")]
    MissingOpeningBalance { start: NaiveDate },

    #[error("sum of daily balances exceeds the representable range at {date}")]
    Overflow { date: NaiveDate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Date,
    Balance,
    /// The record as a whole, e.g. a wrong number of fields.
    Record,
}

impl Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordField::Date => write!(f, "date"),
            RecordField::Balance => write!(f, "balance"),
            RecordField::Record => write!(f, "record"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {field} {value:?}: {reason}")]
pub struct FieldError {
    pub field: RecordField,
    pub value: String,
    pub reason: &'static str,
}

/// Failures while turning raw input into observations. Kept apart from
/// [`BalanceError`] so callers can tell bad input from bad requests.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{origin}, line {line}: {error}")]
    MalformedRecord {
        origin: String,
        line: u64,
        #[source]
        error: FieldError,
    },

    #[error("cannot open {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("{origin}: {error}")]
    Csv {
        origin: String,
        #[source]
        error: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error("cannot render report: {0}")]
    Render(#[from] serde_json::Error),
}
