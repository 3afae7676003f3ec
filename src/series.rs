use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::{error::BalanceError, observations::Observation};

/// End-of-day balance per calendar date, one entry per observed date.
pub type BalanceMap = BTreeMap<NaiveDate, Decimal>;

/// Inclusive date range the average is computed over.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Period { start, end }
    }

    /// Number of calendar days covered, zero when `start` is after `end`.
    pub fn days(&self) -> usize {
        let span = (self.end - self.start).num_days() + 1;
        usize::try_from(span).unwrap_or(0)
    }
}

/**
 * Caller overrides for the period. Missing bounds are taken from the
 * earliest and latest observed dates, optionally widened to the first and
 * last day of their months.
 */
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PeriodSpec {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub whole_months: bool,
}

/**
 * Merges every batch into one canonical map and settles the period.
 *
 * Batches are concatenated in the order given and stably sorted by date, so
 * for a date recorded more than once the record that appeared last in the
 * input wins, whichever batch it came from.
 */
pub fn build<B: AsRef<[Observation]>>(
    batches: &[B],
    spec: &PeriodSpec,
) -> Result<(BalanceMap, Period), BalanceError> {
    let mut observations: Vec<Observation> = batches
        .iter()
        .flat_map(|batch| batch.as_ref().iter().copied())
        .collect();
    observations.sort_by_key(|observation| observation.date);

    let mut balances = BalanceMap::new();
    for observation in &observations {
        balances.insert(observation.date, observation.balance);
    }

    let start = match spec.start {
        Some(start) => start,
        None => {
            let first = *balances.keys().next().ok_or(BalanceError::EmptyInput)?;
            if spec.whole_months {
                first_of_month(first)
            } else {
                first
            }
        }
    };
    let end = match spec.end {
        Some(end) => end,
        None => {
            let last = *balances.keys().next_back().ok_or(BalanceError::EmptyInput)?;
            if spec.whole_months {
                last_of_month(last)
            } else {
                last
            }
        }
    };

    debug!(
        observations = observations.len(),
        dates = balances.len(),
        %start,
        %end,
        "built canonical balance map"
    );
    Ok((balances, Period::new(start, end)))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next_month| next_month.pred_opt())
        .unwrap_or(date)
}
