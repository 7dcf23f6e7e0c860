//! MKR token amounts.
//!
//! Amounts are fixed-point integers (u128) in the token's base unit (wei), with
//! 18 decimals. Arithmetic on raw units is exact; conversion to [`Decimal`]
//! happens only where ratios are needed.

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use crate::error::TypesError;

/// Quantity of MKR, stored as raw wei.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MkrAmount(u128);

impl MkrAmount {
    pub const ZERO: Self = Self(0);

    /// Number of decimals of the MKR token.
    pub const DECIMALS: u32 = 18;

    /// Raw units per whole token.
    pub const WAD: u128 = 1_000_000_000_000_000_000;

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// A whole number of tokens.
    pub fn from_whole(tokens: u64) -> Self {
        Self(tokens as u128 * Self::WAD)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Exact decimal value in whole tokens.
    pub fn to_decimal(&self) -> Result<Decimal, TypesError> {
        let raw = i128::try_from(self.0).map_err(|_| TypesError::AmountOverflow(self.0))?;
        Decimal::try_from_i128_with_scale(raw, Self::DECIMALS)
            .map_err(|_| TypesError::AmountOverflow(self.0))
    }

    /// Parse a token quantity such as `"1.5"` into raw units.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| TypesError::InvalidAmount(s.to_string()))?;
        Self::try_from(value)
    }
}

impl TryFrom<Decimal> for MkrAmount {
    type Error = TypesError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(TypesError::InvalidAmount(value.to_string()));
        }
        let scale = value.scale();
        if scale > Self::DECIMALS {
            return Err(TypesError::InvalidAmount(format!(
                "{value} has more than {} decimals",
                Self::DECIMALS
            )));
        }
        let factor = 10i128.pow(Self::DECIMALS - scale);
        value
            .mantissa()
            .checked_mul(factor)
            .and_then(|raw| u128::try_from(raw).ok())
            .map(Self)
            .ok_or_else(|| TypesError::InvalidAmount(value.to_string()))
    }
}

impl Add for MkrAmount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Display for MkrAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::WAD;
        let frac = self.0 % Self::WAD;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for MkrAmount {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MkrAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MkrAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}
