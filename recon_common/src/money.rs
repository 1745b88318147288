use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const SETTLEMENT_CURRENCY_CODE: &str = "CNY";

//--------------------------------------     MoneyCents       --------------------------------------------------------
/// A monetary amount in integer minor currency units (cents).
///
/// All ledger comparisons happen on this type, never on floating point. The only conversion to major units is
/// [`MoneyCents::to_major_units`], which exists for human-readable output.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MoneyCents(i64);

op!(binary MoneyCents, Add, add);
op!(binary MoneyCents, Sub, sub);
op!(inplace MoneyCents, SubAssign, sub_assign);
op!(unary MoneyCents, Neg, neg);

impl Mul<i64> for MoneyCents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for MoneyCents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MoneyCents {}

impl TryFrom<u64> for MoneyCents {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to MoneyCents", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for MoneyCents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {SETTLEMENT_CURRENCY_CODE}", self.to_major_units())
    }
}

impl MoneyCents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Lossy conversion to major currency units. Display and report payloads only; never use this for comparisons.
    pub fn to_major_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// The absolute difference between two amounts, in cents.
    pub fn abs_difference(&self, other: MoneyCents) -> MoneyCents {
        Self((self.0 - other.0).abs())
    }
}
