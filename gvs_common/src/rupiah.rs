use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const IDR_CURRENCY_CODE: &str = "IDR";
pub const IDR_CURRENCY_CODE_LOWER: &str = "idr";

//--------------------------------------       Rupiah       ----------------------------------------------------------
/// A whole-rupiah amount. Indonesian rupiah has no sub-unit in circulation, so an integer is exact.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Rupiah(i64);

impl Add for Rupiah {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Rupiah {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Rupiah {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in rupiah: {0}")]
pub struct RupiahConversionError(String);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Rupiah {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Rupiah {}

impl TryFrom<u64> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RupiahConversionError(format!("Value {} is too large to convert to Rupiah", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rp{}", group_thousands(self.0))
    }
}

impl Rupiah {
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Format an integer with `.` as the thousands separator, as Indonesian price displays do.
fn group_thousands(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rupiah_display() {
        assert_eq!(Rupiah::from(0).to_string(), "Rp0");
        assert_eq!(Rupiah::from(950).to_string(), "Rp950");
        assert_eq!(Rupiah::from(15_000).to_string(), "Rp15.000");
        assert_eq!(Rupiah::from(1_250_000).to_string(), "Rp1.250.000");
        assert_eq!(Rupiah::from(-75_500).to_string(), "Rp-75.500");
    }

    #[test]
    fn rupiah_arithmetic() {
        let price = Rupiah::from(150_000);
        assert_eq!(price * 3, Rupiah::from(450_000));
        assert_eq!(price + Rupiah::from(50_000), Rupiah::from(200_000));
        let total: Rupiah = [price, price].into_iter().sum();
        assert_eq!(total, Rupiah::from(300_000));
    }
}
