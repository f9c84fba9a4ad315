//! Order delivery status.
//!
//! An order starts out pending and is marked delivered once. There is no
//! cancelled or in-progress state. On the wire and in the database the status
//! is a plain boolean (`false` = pending, `true` = delivered).

use serde::{Deserialize, Serialize};

/// Errors from an invalid status change.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// Attempted to move a delivered order back to pending.
    #[error("a delivered order cannot be reopened")]
    Reopen,
}

/// Delivery status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum OrderStatus {
    /// Placed, not yet delivered.
    #[default]
    Pending,
    /// Delivered to the customer.
    Delivered,
}

impl OrderStatus {
    /// Whether the order has been delivered.
    #[must_use]
    pub const fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Apply a requested status, enforcing the one-way lifecycle.
    ///
    /// Requesting the current status is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::Reopen`] when asked to move a delivered order
    /// back to pending.
    pub const fn transition(self, to: Self) -> Result<Self, StatusError> {
        match (self, to) {
            (Self::Delivered, Self::Pending) => Err(StatusError::Reopen),
            (_, to) => Ok(to),
        }
    }
}

impl From<bool> for OrderStatus {
    fn from(delivered: bool) -> Self {
        if delivered {
            Self::Delivered
        } else {
            Self::Pending
        }
    }
}

impl From<OrderStatus> for bool {
    fn from(status: OrderStatus) -> Self {
        status.is_delivered()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <bool as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(<bool as sqlx::Decode<sqlx::Postgres>>::decode(value)?.into())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <bool as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.is_delivered(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use OrderStatus::{Delivered, Pending};

        assert_eq!(Pending.transition(Delivered), Ok(Delivered));
        assert_eq!(Pending.transition(Pending), Ok(Pending));
        assert_eq!(Delivered.transition(Delivered), Ok(Delivered));
        assert_eq!(Delivered.transition(Pending), Err(StatusError::Reopen));
    }

    #[test]
    fn test_bool_wire_format() {
        assert_eq!(serde_json::to_string(&OrderStatus::Pending).unwrap(), "false");
        let status: OrderStatus = serde_json::from_str("true").unwrap();
        assert_eq!(status, OrderStatus::Delivered);
    }
}
