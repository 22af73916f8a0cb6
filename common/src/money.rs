//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new [`Money`] of the provided `amount` and `currency`.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Indicates whether this [`Money`] has no meaningful amount.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns a human readable representation of this [`Money`]: the amount
    /// truncated to an integer, grouped by thousands and prefixed with the
    /// [`Currency`] symbol (e.g. `₺1.250.000`).
    #[must_use]
    pub fn grouped(&self) -> Grouped<'_> {
        Grouped(self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        let code = currency.to_string();
        if amount.is_integer() {
            write!(f, "{}{code}", amount.trunc().normalize())
        } else {
            write!(f, "{}{code}", amount.normalize())
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

/// [`Money`] formatted for display, see [`Money::grouped()`].
#[derive(Clone, Copy, Debug)]
pub struct Grouped<'m>(&'m Money);

impl fmt::Display for Grouped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Money { amount, currency } = self.0;
        let integer = amount.trunc();
        let digits = integer.abs().normalize().to_string();

        if integer.is_sign_negative() && !integer.is_zero() {
            f.write_str("-")?;
        }
        f.write_str(currency.symbol())?;

        let separator = currency.group_separator();
        let len = digits.len();
        for (i, digit) in digits.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                write!(f, "{separator}")?;
            }
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    #[serialize_all = "SCREAMING_SNAKE_CASE"]
    enum Currency {
        #[doc = "Turkish Lira."]
        Try = 1,

        #[doc = "US Dollar."]
        Usd = 2,

        #[doc = "Euro."]
        Eur = 3,
    }
}

impl Currency {
    /// Returns the symbol prefixing amounts in this [`Currency`].
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Try => "₺",
            Self::Usd => "$",
            Self::Eur => "€",
        }
    }

    /// Returns the thousands separator of the locale this [`Currency`] is
    /// usually displayed in.
    #[must_use]
    pub const fn group_separator(self) -> char {
        match self {
            Self::Try | Self::Eur => '.',
            Self::Usd => ',',
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn money(s: &str, currency: Currency) -> Money {
        Money::new(decimal(s), currency)
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            money("123.45", Currency::Usd),
        );
        assert_eq!(
            Money::from_str("1250000TRY").unwrap(),
            money("1250000", Currency::Try),
        );
        assert_eq!(
            Money::from_str("123.45EUR").unwrap(),
            money("123.45", Currency::Eur),
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45Usdollar").is_err());
        assert!(Money::from_str("12₺").is_err());

        assert!(Money::from_str("123.00USD").is_ok());
        assert!(Money::from_str("123USD").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45", Currency::Usd).to_string(), "123.45USD");
        assert_eq!(money("123.00", Currency::Try).to_string(), "123TRY");
        assert_eq!(money("123", Currency::Eur).to_string(), "123EUR");
    }

    #[test]
    fn grouped_truncates_and_groups() {
        assert_eq!(
            money("1250000", Currency::Try).grouped().to_string(),
            "₺1.250.000",
        );
        assert_eq!(
            money("999.99", Currency::Try).grouped().to_string(),
            "₺999",
        );
        assert_eq!(
            money("1000", Currency::Usd).grouped().to_string(),
            "$1,000",
        );
        assert_eq!(
            money("123456.7", Currency::Eur).grouped().to_string(),
            "€123.456",
        );
        assert_eq!(money("0", Currency::Try).grouped().to_string(), "₺0");
        assert_eq!(
            money("-4500", Currency::Try).grouped().to_string(),
            "-₺4.500",
        );
    }

    #[test]
    fn zero() {
        assert!(money("0.00", Currency::Try).is_zero());
        assert!(!money("0.01", Currency::Try).is_zero());
    }
}
