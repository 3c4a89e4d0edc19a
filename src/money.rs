//! Parsing, storage conversion and display of money amounts.
//!
//! Amounts are kept as [Decimal] in memory and stored as whole cents in the
//! database so that sums are exact.

use std::{str::FromStr, sync::OnceLock};

use numfmt::{Formatter, Precision};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::Error;

/// Parse a user-entered amount such as "12.5" or "-3".
///
/// Surrounding whitespace is ignored and the result is rounded to two decimal
/// places, with halves rounded away from zero. Zero and negative amounts are
/// accepted.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `text` is not a decimal number or is too
/// large to store.
pub fn parse_amount(text: &str) -> Result<Decimal, Error> {
    let amount = Decimal::from_str(text.trim())
        .map_err(|_| Error::InvalidAmount(text.to_owned()))?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    to_cents(amount).map_err(|_| Error::InvalidAmount(text.to_owned()))?;

    Ok(amount)
}

/// Convert `amount` to a whole number of cents.
///
/// # Errors
/// Returns [Error::InvalidAmount] if the amount does not fit in an `i64`.
pub(crate) fn to_cents(amount: Decimal) -> Result<i64, Error> {
    let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);

    i64::try_from(cents.mantissa()).map_err(|_| Error::InvalidAmount(amount.to_string()))
}

/// Convert a whole number of cents back into a decimal amount.
pub(crate) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Format `amount` as dollars with thousands separators, e.g. "-$1,234.50".
pub fn format_currency(amount: Decimal) -> String {
    static DOLLAR_FMT: OnceLock<Formatter> = OnceLock::new();

    let dollar_fmt = DOLLAR_FMT.get_or_init(|| {
        Formatter::currency("$")
            .expect("\"$\" is a valid currency prefix")
            .precision(Precision::Decimals(0))
    });

    let cents = match to_cents(amount) {
        Ok(cents) => cents,
        Err(_) => return amount.to_string(),
    };
    let sign = if cents < 0 { "-" } else { "" };
    let dollars = cents.unsigned_abs() / 100;
    let remainder = cents.unsigned_abs() % 100;

    let dollars = if dollars == 0 {
        // Zero is hardcoded as "0" by numfmt, so we must specify the prefix ourselves.
        "$0".to_owned()
    } else {
        dollar_fmt.fmt_string(dollars as f64)
    };

    format!("{sign}{dollars}.{remainder:02}")
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::Error;

    use super::{format_currency, from_cents, parse_amount, to_cents};

    #[test]
    fn parse_amount_accepts_decimal_numbers() {
        assert_eq!(parse_amount("12.50"), Ok(dec!(12.50)));
        assert_eq!(parse_amount(" 7 "), Ok(dec!(7)));
    }

    #[test]
    fn parse_amount_accepts_zero_and_negative_numbers() {
        assert_eq!(parse_amount("0"), Ok(dec!(0)));
        assert_eq!(parse_amount("-3.25"), Ok(dec!(-3.25)));
    }

    #[test]
    fn parse_amount_rounds_half_away_from_zero() {
        assert_eq!(parse_amount("1.005"), Ok(dec!(1.01)));
        assert_eq!(parse_amount("-1.005"), Ok(dec!(-1.01)));
        assert_eq!(parse_amount("1.004"), Ok(dec!(1.00)));
    }

    #[test]
    fn parse_amount_rejects_non_numeric_text() {
        for text in ["abc", "", "12,50", "$5", "NaN"] {
            assert_eq!(
                parse_amount(text),
                Err(Error::InvalidAmount(text.to_owned())),
                "want {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn parse_amount_rejects_amounts_too_large_to_store() {
        let text = "9999999999999999999999";

        assert_eq!(parse_amount(text), Err(Error::InvalidAmount(text.to_owned())));
    }

    #[test]
    fn cents_conversion_is_exact() {
        assert_eq!(to_cents(dec!(35.50)), Ok(3550));
        assert_eq!(to_cents(dec!(-0.1)), Ok(-10));
        assert_eq!(to_cents(dec!(3)), Ok(300));
        assert_eq!(from_cents(1550), dec!(15.50));
    }

    #[test]
    fn format_currency_adds_separators_and_cents() {
        assert_eq!(format_currency(dec!(1234.5)), "$1,234.50");
        assert_eq!(format_currency(dec!(20)), "$20.00");
        assert_eq!(format_currency(dec!(0.05)), "$0.05");
        assert_eq!(format_currency(dec!(0)), "$0.00");
    }

    #[test]
    fn format_currency_prefixes_negative_amounts() {
        assert_eq!(format_currency(dec!(-5.5)), "-$5.50");
        assert_eq!(format_currency(dec!(-0.25)), "-$0.25");
    }
}
