mod aggregate;
mod amount;
mod error;
mod observations;
mod report;
mod series;

use std::{path::PathBuf, process};

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    aggregate::{aggregate, OpeningBalance},
    error::Error,
    observations::read_batch,
    report::Report,
    series::{build, PeriodSpec},
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Average daily balance over one or more end-of-day balance files
#[derive(Parser, Debug)]
#[command(name = "daily-balance", version)]
struct Args {
    /// CSV files of `date,balance` lines without a header; `-` reads stdin
    #[arg(required = true)]
    balances_filepaths: Vec<PathBuf>,

    /// First day of the period (YYYY-MM-DD); defaults to the earliest record
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD); defaults to the latest record
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Extend a derived period to whole calendar months
    #[arg(long)]
    whole_months: bool,

    /// What to do when no balance is known at the start of the period
    #[arg(long, value_enum, default_value_t = OpeningBalance::Require)]
    opening_balance: OpeningBalance,

    /// Drop malformed records with a warning instead of failing
    #[arg(long)]
    skip_malformed: bool,

    /// Label printed before amounts, e.g. PHP
    #[arg(long)]
    currency: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also print the balance of every day in the period
    #[arg(long)]
    daily: bool,
}

impl Args {
    fn period_spec(&self) -> PeriodSpec {
        PeriodSpec {
            start: self.start,
            end: self.end,
            whole_months: self.whole_months,
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let batches = args
        .balances_filepaths
        .iter()
        .map(|path| read_batch(path, args.skip_malformed))
        .collect::<Result<Vec<_>, _>>()?;

    let (balances, period) = build(&batches, &args.period_spec())?;
    let summary = aggregate(&balances, period, args.opening_balance)?;

    let report = Report::new(&summary, batches.len())
        .with_currency(args.currency.as_deref())
        .with_daily(args.daily);
    match args.format {
        OutputFormat::Text => print!("{}", report),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    if let Err(error) = run(&args) {
        debug!(?error, "run failed");
        eprintln!("error: {}", error);
        process::exit(1);
    }
}
