use chrono::NaiveDate;
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::{
    error::BalanceError,
    series::{BalanceMap, Period},
};

/**
 * How to open a period when no balance is known on or before its first day.
 * `Require` refuses to guess; `Zero` treats the account as empty until the
 * first observation.
 */
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum OpeningBalance {
    #[default]
    Require,
    Zero,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBalance {
    pub date: NaiveDate,
    pub balance: Decimal,
    /// Whether the balance was recorded that day rather than carried forward.
    pub observed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub period: Period,
    pub days_with_transactions: usize,
    pub first_transaction: Option<NaiveDate>,
    pub last_transaction: Option<NaiveDate>,
    pub starting_balance: Decimal,
    pub ending_balance: Decimal,
    pub balance_sum: Decimal,
    pub average_daily_balance: Decimal,
    pub days: Vec<DailyBalance>,
}

impl Summary {
    pub fn total_days(&self) -> usize {
        self.days.len()
    }
}

/**
 * Expands the map into one balance per day of `period` and reduces it.
 *
 * A day without an entry takes the previous day's balance. The day before
 * the period is seeded from the latest entry dated on or before
 * `period.start`, so a period that begins inside the data picks up the
 * balance in effect at that point.
 */
pub fn aggregate(
    balances: &BalanceMap,
    period: Period,
    opening: OpeningBalance,
) -> Result<Summary, BalanceError> {
    if period.start > period.end {
        return Err(BalanceError::InvalidPeriod {
            start: period.start,
            end: period.end,
        });
    }

    let seed = match balances.range(..=period.start).next_back() {
        Some((_, balance)) => *balance,
        None => match opening {
            OpeningBalance::Require => {
                return Err(BalanceError::MissingOpeningBalance { start: period.start })
            }
            OpeningBalance::Zero => Decimal::ZERO,
        },
    };

    let mut days = Vec::with_capacity(period.days());
    let mut carried = seed;
    let mut balance_sum = Decimal::ZERO;
    for date in period.start.iter_days().take_while(|date| *date <= period.end) {
        let recorded = balances.get(&date);
        if let Some(balance) = recorded {
            carried = *balance;
        }
        balance_sum = balance_sum
            .checked_add(carried)
            .ok_or(BalanceError::Overflow { date })?;
        days.push(DailyBalance {
            date,
            balance: carried,
            observed: recorded.is_some(),
        });
    }

    let mut in_period = balances.range(period.start..=period.end);
    let days_with_transactions = in_period.clone().count();
    let first_transaction = in_period.clone().next().map(|(date, _)| *date);
    let last_transaction = in_period.next_back().map(|(date, _)| *date);

    let starting_balance = days.first().map_or(seed, |day| day.balance);
    let average_daily_balance = balance_sum / Decimal::from(days.len());

    debug!(
        days = days.len(),
        days_with_transactions,
        %balance_sum,
        %average_daily_balance,
        "aggregated daily balances"
    );
    Ok(Summary {
        period,
        days_with_transactions,
        first_transaction,
        last_transaction,
        starting_balance,
        ending_balance: carried,
        balance_sum,
        average_daily_balance,
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn balances(entries: &[(NaiveDate, Decimal)]) -> BalanceMap {
        entries.iter().copied().collect()
    }

    fn daily(summary: &Summary) -> Vec<Decimal> {
        summary.days.iter().map(|day| day.balance).collect()
    }

    mod carry_forward {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn fills_gaps_with_previous_balance() {
            let map = balances(&[(day(2024, 1, 1), dec!(100)), (day(2024, 1, 5), dec!(200))]);
            let period = Period::new(day(2024, 1, 1), day(2024, 1, 8));
            let summary = aggregate(&map, period, OpeningBalance::Require).unwrap();

            assert_eq!(
                daily(&summary),
                vec![
                    dec!(100),
                    dec!(100),
                    dec!(100),
                    dec!(100),
                    dec!(200),
                    dec!(200),
                    dec!(200),
                    dec!(200)
                ]
            );
            assert_eq!(summary.balance_sum, dec!(1200));
            assert_eq!(summary.average_daily_balance, dec!(150));
            assert_eq!(summary.days_with_transactions, 2);
            assert_eq!(summary.starting_balance, dec!(100));
            assert_eq!(summary.ending_balance, dec!(200));
            assert_eq!(summary.first_transaction, Some(day(2024, 1, 1)));
            assert_eq!(summary.last_transaction, Some(day(2024, 1, 5)));
        }
        #[test]
        fn series_is_dense_and_ordered() {
            let map = balances(&[(day(2024, 2, 27), dec!(1)), (day(2024, 3, 2), dec!(2))]);
            let period = Period::new(day(2024, 2, 27), day(2024, 3, 2));
            let summary = aggregate(&map, period, OpeningBalance::Require).unwrap();

            let dates: Vec<NaiveDate> = summary.days.iter().map(|day| day.date).collect();
            assert_eq!(
                dates,
                vec![
                    day(2024, 2, 27),
                    day(2024, 2, 28),
                    day(2024, 2, 29),
                    day(2024, 3, 1),
                    day(2024, 3, 2)
                ]
            );
            let observed: Vec<bool> = summary.days.iter().map(|day| day.observed).collect();
            assert_eq!(observed, vec![true, false, false, false, true]);
        }
        #[test]
        fn day_count_matches_period_length() {
            let map = balances(&[(day(2023, 1, 1), dec!(10.01))]);
            let period = Period::new(day(2023, 1, 1), day(2023, 12, 31));
            let summary = aggregate(&map, period, OpeningBalance::Require).unwrap();

            assert_eq!(summary.total_days(), 365);
            assert_eq!(summary.balance_sum, dec!(3653.65));
            assert_eq!(summary.average_daily_balance, dec!(10.01));
        }
        #[test]
        fn single_day_period() {
            let map = balances(&[(day(2024, 6, 1), dec!(-42.10))]);
            let period = Period::new(day(2024, 6, 1), day(2024, 6, 1));
            let summary = aggregate(&map, period, OpeningBalance::Require).unwrap();

            assert_eq!(summary.total_days(), 1);
            assert_eq!(summary.average_daily_balance, dec!(-42.10));
        }
    }

    mod narrowed_period {
        use super::*;
        use pretty_assertions::assert_eq;

        fn january() -> BalanceMap {
            balances(&[
                (day(2024, 1, 1), dec!(100)),
                (day(2024, 1, 8), dec!(300)),
                (day(2024, 1, 12), dec!(600)),
                (day(2024, 1, 31), dec!(50)),
            ])
        }

        #[test]
        fn seeds_from_observation_before_start() {
            let period = Period::new(day(2024, 1, 10), day(2024, 1, 15));
            let summary = aggregate(&january(), period, OpeningBalance::Require).unwrap();

            assert_eq!(summary.total_days(), 6);
            assert_eq!(
                daily(&summary),
                vec![dec!(300), dec!(300), dec!(600), dec!(600), dec!(600), dec!(600)]
            );
            assert_eq!(summary.starting_balance, dec!(300));
            assert_eq!(summary.days_with_transactions, 1);
            assert_eq!(summary.first_transaction, Some(day(2024, 1, 12)));
        }
        #[test]
        fn period_without_observations() {
            let period = Period::new(day(2024, 1, 20), day(2024, 1, 23));
            let summary = aggregate(&january(), period, OpeningBalance::Require).unwrap();

            assert_eq!(summary.days_with_transactions, 0);
            assert_eq!(summary.first_transaction, None);
            assert_eq!(summary.last_transaction, None);
            assert_eq!(summary.average_daily_balance, dec!(600));
        }
    }

    mod opening_balance {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn required_by_default() {
            let map = balances(&[(day(2024, 1, 5), dec!(200))]);
            let period = Period::new(day(2024, 1, 1), day(2024, 1, 8));

            assert_eq!(
                aggregate(&map, period, OpeningBalance::default()),
                Err(BalanceError::MissingOpeningBalance {
                    start: day(2024, 1, 1)
                })
            );
        }
        #[test]
        fn zero_seed_fills_leading_days() {
            let map = balances(&[(day(2024, 1, 5), dec!(200))]);
            let period = Period::new(day(2024, 1, 1), day(2024, 1, 8));
            let summary = aggregate(&map, period, OpeningBalance::Zero).unwrap();

            assert_eq!(
                daily(&summary),
                vec![
                    dec!(0),
                    dec!(0),
                    dec!(0),
                    dec!(0),
                    dec!(200),
                    dec!(200),
                    dec!(200),
                    dec!(200)
                ]
            );
            assert_eq!(summary.starting_balance, dec!(0));
            assert_eq!(summary.average_daily_balance, dec!(100));
        }
        #[test]
        fn zero_seed_on_empty_map() {
            let period = Period::new(day(2024, 1, 1), day(2024, 1, 3));
            let summary = aggregate(&BalanceMap::new(), period, OpeningBalance::Zero).unwrap();

            assert_eq!(summary.balance_sum, dec!(0));
            assert_eq!(summary.days_with_transactions, 0);
        }
    }

    mod invalid_period {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn start_after_end_fails() {
            let map = balances(&[(day(2024, 1, 1), dec!(1))]);
            let period = Period::new(day(2024, 1, 9), day(2024, 1, 1));

            assert_eq!(
                aggregate(&map, period, OpeningBalance::Zero),
                Err(BalanceError::InvalidPeriod {
                    start: day(2024, 1, 9),
                    end: day(2024, 1, 1)
                })
            );
        }
    }

    mod overflow {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn sum_beyond_decimal_range_fails() {
            let map = balances(&[
                (day(2024, 1, 1), dec!(50000000000000000000000000000)),
                (day(2024, 1, 2), dec!(50000000000000000000000000000)),
            ]);
            let period = Period::new(day(2024, 1, 1), day(2024, 1, 2));

            assert_eq!(
                aggregate(&map, period, OpeningBalance::Require),
                Err(BalanceError::Overflow {
                    date: day(2024, 1, 2)
                })
            );
        }
        #[test]
        fn carried_maximum_fails_on_second_day() {
            let map = balances(&[(day(2024, 1, 1), Decimal::MAX)]);
            let period = Period::new(day(2024, 1, 1), day(2024, 1, 3));

            assert_eq!(
                aggregate(&map, period, OpeningBalance::Require),
                Err(BalanceError::Overflow {
                    date: day(2024, 1, 2)
                })
            );
        }
    }

    #[test]
    fn uniform_increase_shifts_average() {
        let base = balances(&[
            (day(2024, 4, 1), dec!(120.40)),
            (day(2024, 4, 3), dec!(80)),
            (day(2024, 4, 7), dec!(-15.25)),
        ]);
        let shifted: BalanceMap = base
            .iter()
            .map(|(date, balance)| (*date, balance + dec!(1000)))
            .collect();
        let period = Period::new(day(2024, 4, 1), day(2024, 4, 10));

        let before = aggregate(&base, period, OpeningBalance::Require).unwrap();
        let after = aggregate(&shifted, period, OpeningBalance::Require).unwrap();

        assert_eq!(
            after.average_daily_balance,
            before.average_daily_balance + dec!(1000)
        );
    }
}
