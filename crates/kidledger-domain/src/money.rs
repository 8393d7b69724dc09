//! Fixed-point currency amounts stored as integer cents.

use std::{
    fmt,
    iter::Sum,
    num::NonZeroU32,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("invalid amount `{0}`")]
    Parse(String),
    #[error("amount `{0}` has more than two decimal places")]
    Precision(String),
}

/// A signed amount with two decimal places.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Divides into `parts`, rounding to the nearest cent with halves away from zero.
    pub fn div_round_half_up(self, parts: NonZeroU32) -> Self {
        let numerator = i128::from(self.0);
        let divisor = i128::from(parts.get());
        let magnitude = (numerator.abs() * 2 + divisor) / (divisor * 2);
        let cents = if numerator < 0 { -magnitude } else { magnitude };
        Self(cents as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.trim();
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(MoneyError::Parse(value.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(MoneyError::Parse(value.to_string()));
        }
        if fraction.len() > 2 {
            return Err(MoneyError::Precision(value.to_string()));
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| MoneyError::Parse(value.to_string()))?
        };
        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            _ => fraction.parse::<i64>().unwrap_or(0),
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction_cents))
            .ok_or_else(|| MoneyError::Parse(value.to_string()))?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn parses_common_forms() {
        assert_eq!("10".parse::<Money>().unwrap(), Money::from_cents(1000));
        assert_eq!("10.5".parse::<Money>().unwrap(), Money::from_cents(1050));
        assert_eq!("-3.25".parse::<Money>().unwrap(), Money::from_cents(-325));
        assert_eq!(".75".parse::<Money>().unwrap(), Money::from_cents(75));
        assert!(matches!(
            "1.005".parse::<Money>(),
            Err(MoneyError::Precision(_))
        ));
        assert!("ten".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::from_cents(1005).to_string(), "10.05");
        assert_eq!(Money::from_cents(-7).to_string(), "-0.07");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn division_rounds_half_up() {
        // 30.00 / 30 days
        assert_eq!(
            Money::from_major(30).div_round_half_up(parts(30)),
            Money::from_cents(100)
        );
        // 10.00 / 31 = 32.258 cents
        assert_eq!(
            Money::from_major(10).div_round_half_up(parts(31)),
            Money::from_cents(32)
        );
        // 0.05 / 2 = 2.5 cents rounds up
        assert_eq!(
            Money::from_cents(5).div_round_half_up(parts(2)),
            Money::from_cents(3)
        );
        assert_eq!(
            Money::from_cents(-5).div_round_half_up(parts(2)),
            Money::from_cents(-3)
        );
    }

    #[test]
    fn sums_and_negates() {
        let total: Money = [Money::from_cents(150), Money::from_cents(-50)]
            .iter()
            .sum();
        assert_eq!(total, Money::from_cents(100));
        assert_eq!(-total, Money::from_cents(-100));
        assert_eq!(Money::from_cents(-250).abs(), Money::from_cents(250));
    }
}
