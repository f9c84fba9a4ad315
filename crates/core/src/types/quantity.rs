//! Line item quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantity is zero or negative.
    #[error("quantity must be at least {min}")]
    TooSmall {
        /// Minimum allowed quantity.
        min: i16,
    },
    /// Quantity does not fit the `SMALLINT` column.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: i16,
    },
}

/// How many units of a menu item a cart line or order item holds.
///
/// Always at least one. Stored as `SMALLINT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Quantity(i16);

impl Quantity {
    /// Smallest valid quantity.
    pub const MIN: i16 = 1;
    /// Largest valid quantity.
    pub const MAX: i16 = i16::MAX;

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is below 1 or above `i16::MAX`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < i64::from(Self::MIN) {
            return Err(QuantityError::TooSmall { min: Self::MIN });
        }
        i16::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge { max: Self::MAX })
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }

    /// Add two quantities, as when the same item is added to a cart twice.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] if the sum overflows.
    pub fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i16 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(Quantity::new(0), Err(QuantityError::TooSmall { min: 1 }));
        assert_eq!(Quantity::new(-3), Err(QuantityError::TooSmall { min: 1 }));
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
        assert_eq!(Quantity::new(32_767).unwrap().get(), i16::MAX);
        assert!(matches!(
            Quantity::new(32_768),
            Err(QuantityError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_checked_add() {
        let two = Quantity::new(2).unwrap();
        assert_eq!(two.checked_add(two).unwrap().get(), 4);

        let max = Quantity::new(i64::from(i16::MAX)).unwrap();
        assert!(max.checked_add(two).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let q: Quantity = serde_json::from_str("2").unwrap();
        assert_eq!(q.get(), 2);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::to_string(&q).unwrap(), "2");
    }
}
