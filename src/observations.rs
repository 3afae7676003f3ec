use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use chrono::NaiveDate;
use csv::ByteRecord;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    amount::parse_amount,
    error::{FieldError, InputError, RecordField},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// An end-of-day balance recorded for one calendar day.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Observation {
    pub date: NaiveDate,
    pub balance: Decimal,
}

impl Observation {
    pub fn new(date: NaiveDate, balance: Decimal) -> Self {
        Observation { date, balance }
    }
}

/// Observations from one source, in the order they were read.
pub type Batch = Vec<Observation>;

#[derive(Debug, Deserialize)]
struct DeserializedRecord(String, String);

impl TryFrom<DeserializedRecord> for Observation {
    type Error = FieldError;
    fn try_from(deserialized: DeserializedRecord) -> Result<Self, Self::Error> {
        let DeserializedRecord(raw_date, raw_balance) = deserialized;
        let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT).map_err(|_| FieldError {
            field: RecordField::Date,
            value: raw_date.clone(),
            reason: "expected a YYYY-MM-DD calendar date",
        })?;
        let balance = parse_amount(&raw_balance).map_err(|reason| FieldError {
            field: RecordField::Balance,
            value: raw_balance.clone(),
            reason,
        })?;
        Ok(Observation::new(date, balance))
    }
}

/// Reads one batch from a file, or from stdin when `path` is `-`.
pub fn read_batch(path: &Path, skip_malformed: bool) -> Result<Batch, InputError> {
    let origin = origin_name(path);
    let input: Box<dyn Read> = if path == Path::new("-") {
        Box::new(io::stdin())
    } else {
        let file = File::open(path).map_err(|error| InputError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Box::new(file)
    };

    let batch = read_observations(input, &origin, skip_malformed)?;
    info!(source = %origin, records = batch.len(), "loaded balance records");
    Ok(batch)
}

/**
 * Headerless `date,balance` records. With `skip_malformed` a record that
 * fails field validation (including invalid UTF-8) is dropped with a
 * warning, otherwise it ends the read. Broken CSV framing always ends the
 * read.
 */
pub fn read_observations<R: Read>(
    input: R,
    origin: &str,
    skip_malformed: bool,
) -> Result<Batch, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut batch = Batch::new();
    for record in reader.byte_records() {
        let record = record.map_err(|error| InputError::Csv {
            origin: origin.to_string(),
            error,
        })?;
        let line = record.position().map_or(0, |position| position.line());

        let parsed = if record.len() != 2 {
            Err(FieldError {
                field: RecordField::Record,
                value: record
                    .iter()
                    .map(String::from_utf8_lossy)
                    .collect::<Vec<_>>()
                    .join(","),
                reason: "expected exactly two fields: date and balance",
            })
        } else if let Some(error) = invalid_utf8(&record) {
            Err(error)
        } else {
            let deserialized: DeserializedRecord =
                record.deserialize(None).map_err(|error| InputError::Csv {
                    origin: origin.to_string(),
                    error,
                })?;
            Observation::try_from(deserialized)
        };

        match parsed {
            Ok(observation) => batch.push(observation),
            Err(error) if skip_malformed => {
                warn!(source = %origin, line, %error, "dropped malformed balance record");
            }
            Err(error) => {
                return Err(InputError::MalformedRecord {
                    origin: origin.to_string(),
                    line,
                    error,
                })
            }
        }
    }
    Ok(batch)
}

fn invalid_utf8(record: &ByteRecord) -> Option<FieldError> {
    [RecordField::Date, RecordField::Balance]
        .into_iter()
        .zip(record.iter())
        .find_map(|(field, bytes)| {
            std::str::from_utf8(bytes).err().map(|_| FieldError {
                field,
                value: String::from_utf8_lossy(bytes).into_owned(),
                reason: "not valid UTF-8",
            })
        })
}

fn origin_name(path: &Path) -> String {
    if path == Path::new("-") {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}
