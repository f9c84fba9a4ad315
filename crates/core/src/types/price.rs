//! Type-safe money amounts using decimal arithmetic.
//!
//! All amounts are non-negative and carried at two decimal places. Menu prices
//! are additionally bounded by the `NUMERIC(6,2)` column they are stored in;
//! line prices and order totals are not.

use core::fmt;
use core::iter::Sum;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Quantity;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("price must have at most 2 decimal places")]
    TooPrecise,
    /// The amount exceeds the largest menu price.
    #[error("price must be at most {max}")]
    TooLarge {
        /// Maximum allowed amount.
        max: Decimal,
    },
}

/// A non-negative amount of money with two decimal places.
///
/// Serializes as a string (`"10.00"`) so clients never see float rounding.
///
/// ## Examples
///
/// ```
/// use little_lemon_core::{Price, Quantity, line_price};
/// use rust_decimal::Decimal;
///
/// let unit = Price::menu_price(Decimal::new(1000, 2)).unwrap();
/// let qty = Quantity::new(2).unwrap();
/// assert_eq!(line_price(unit, qty).to_string(), "20.00");
///
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Number of decimal places every amount is carried at.
    pub const SCALE: u32 = 2;

    /// Zero.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, Self::SCALE));

    /// Largest price a menu item may carry (`NUMERIC(6,2)`).
    #[must_use]
    pub fn menu_max() -> Decimal {
        Decimal::new(999_999, Self::SCALE)
    }

    /// Create a price from any non-negative amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or has more than two
    /// decimal places.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise);
        }

        let mut scaled = normalized;
        scaled.rescale(Self::SCALE);
        Ok(Self(scaled))
    }

    /// Create a price suitable for a menu item.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Price::new`], or if the
    /// amount exceeds [`Price::menu_max`].
    pub fn menu_price(amount: Decimal) -> Result<Self, PriceError> {
        let price = Self::new(amount)?;
        let max = Self::menu_max();
        if price.0 > max {
            return Err(PriceError::TooLarge { max });
        }
        Ok(price)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

/// Price of a line: `unit_price × quantity`.
///
/// This is the only place line prices are computed. Cart lines and order
/// items both go through it whenever their quantity or unit price changes.
#[must_use]
pub fn line_price(unit_price: Price, quantity: Quantity) -> Price {
    let mut amount = unit_price.0 * Decimal::from(quantity.get());
    amount.rescale(Price::SCALE);
    Price(amount)
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut total = iter.fold(Decimal::ZERO, |acc, p| acc + p.0);
        total.rescale(Self::SCALE);
        Self(total)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
