use std::fmt::Display;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    aggregate::{DailyBalance, Summary},
    amount::{format_amount, round_amount},
};

const RULE: &str = "==================================================";

/// Human or JSON rendering of a [`Summary`].
pub struct Report<'a> {
    summary: &'a Summary,
    currency: Option<&'a str>,
    sources: usize,
    daily: bool,
}

impl<'a> Report<'a> {
    pub fn new(summary: &'a Summary, sources: usize) -> Self {
        Report {
            summary,
            currency: None,
            sources,
            daily: false,
        }
    }

    pub fn with_currency(mut self, currency: Option<&'a str>) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_daily(mut self, daily: bool) -> Self {
        self.daily = daily;
        self
    }

    fn money(&self, amount: Decimal) -> String {
        match self.currency {
            Some(currency) => format!("{} {}", currency, format_amount(amount)),
            None => format_amount(amount),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let summary = self.summary;
        let report = JsonReport {
            currency: self.currency,
            sources: self.sources,
            start_date: summary.period.start,
            end_date: summary.period.end,
            total_days_in_period: summary.total_days(),
            days_with_transactions: summary.days_with_transactions,
            first_transaction_date: summary.first_transaction,
            last_transaction_date: summary.last_transaction,
            starting_balance: round_amount(summary.starting_balance),
            ending_balance: round_amount(summary.ending_balance),
            total_balance_sum: round_amount(summary.balance_sum),
            average_daily_balance: round_amount(summary.average_daily_balance),
            days: self.daily.then_some(summary.days.as_slice()),
        };
        serde_json::to_string_pretty(&report)
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<&'a str>,
    sources: usize,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days_in_period: usize,
    days_with_transactions: usize,
    first_transaction_date: Option<NaiveDate>,
    last_transaction_date: Option<NaiveDate>,
    starting_balance: Decimal,
    ending_balance: Decimal,
    total_balance_sum: Decimal,
    average_daily_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<&'a [DailyBalance]>,
}

fn date_or_none(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "none".to_string(), |date| date.to_string())
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let summary = self.summary;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "AVERAGE DAILY BALANCE CALCULATION")?;
        writeln!(f, "{}", RULE)?;
        if self.sources > 1 {
            writeln!(f, "Files processed: {}", self.sources)?;
        }
        writeln!(
            f,
            "Period: {} to {}",
            summary.period.start, summary.period.end
        )?;
        writeln!(f, "Total days in period: {}", summary.total_days())?;
        writeln!(f, "Days with transactions: {}", summary.days_with_transactions)?;
        writeln!(f)?;
        writeln!(
            f,
            "First transaction: {}",
            date_or_none(summary.first_transaction)
        )?;
        writeln!(
            f,
            "Last transaction: {}",
            date_or_none(summary.last_transaction)
        )?;
        writeln!(f)?;
        writeln!(f, "Starting balance: {}", self.money(summary.starting_balance))?;
        writeln!(f, "Ending balance: {}", self.money(summary.ending_balance))?;
        writeln!(f)?;
        writeln!(
            f,
            "Sum of all daily balances: {}",
            self.money(summary.balance_sum)
        )?;
        writeln!(
            f,
            "Average Daily Balance: {}",
            self.money(summary.average_daily_balance)
        )?;
        writeln!(f, "{}", RULE)?;

        if self.daily {
            writeln!(f, "date,balance,observed")?;
            for day in &summary.days {
                writeln!(
                    f,
                    "{},{},{}",
                    day.date,
                    round_amount(day.balance),
                    day.observed
                )?;
            }
        }
        Ok(())
    }
}
