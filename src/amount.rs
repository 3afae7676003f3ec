/*!
 * Parsing and presentation of money amounts.
 *
 * Amounts stay exact `Decimal` values through the whole computation; they
 * are only rounded when rendered, to two places, half away from zero.
 */
use std::str::FromStr;

use num_format::{Locale, ToFormattedString};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

const PRESENTATION_PRECISION: u32 = 2;

/**
 * Accepts an optional sign, digits, an optional fractional part and
 * thousands separators in the integer part ("1,234.56"). `,` is the only
 * separator accepted.
 */
pub fn parse_amount(string: &str) -> Result<Decimal, &'static str> {
    let trimmed = string.trim();
    if trimmed.is_empty() {
        return Err("amount is empty");
    }

    if trimmed.contains('_') {
        return Err("not a decimal number");
    }

    let mut parts = trimmed.splitn(2, '.');
    let integer_part = parts.next().unwrap_or("");
    let fractional_part = parts.next().unwrap_or("");

    if fractional_part.contains(',') {
        return Err("thousands separator after the decimal point");
    }
    if integer_part.contains(',') {
        let unsigned = integer_part.trim_start_matches(|c: char| c == '-' || c == '+');
        let mut groups = unsigned.split(',');
        let leading = groups.next().unwrap_or("");
        if leading.is_empty() || leading.len() > 3 || groups.any(|group| group.len() != 3) {
            return Err("misplaced thousands separator");
        }
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned).map_err(|_| "not a decimal number")
}

/// Rounded and padded to exactly two places, so `1050` displays as `1050.00`.
pub fn round_amount(amount: Decimal) -> Decimal {
    let mut rounded = amount
        .round_dp_with_strategy(PRESENTATION_PRECISION, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(PRESENTATION_PRECISION);
    rounded
}

/// Two decimal places with `,` grouping, e.g. `-1,234.50`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = round_amount(amount);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let magnitude = rounded.abs();

    let units = magnitude
        .trunc()
        .to_i128()
        .map_or_else(
            || magnitude.trunc().to_string(),
            |units| units.to_formatted_string(&Locale::en),
        );
    let hundredths = (magnitude.fract() * Decimal::ONE_HUNDRED).to_u32().unwrap_or(0);

    format!("{}{}.{:02}", sign, units, hundredths)
}
