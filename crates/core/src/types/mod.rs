//! Core types for Little Lemon.
//!
//! This module provides type-safe wrappers for common domain concepts.

/// Store a validated string newtype as `TEXT`.
///
/// Database values are assumed valid; they were validated on the way in.
macro_rules! impl_pg_text {
    ($name:ident) => {
        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(Self(s))
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

pub mod id;
pub mod price;
pub mod quantity;
pub mod role;
pub mod status;
pub mod text;
pub mod username;

pub use id::*;
pub use price::{Price, PriceError, line_price};
pub use quantity::{Quantity, QuantityError};
pub use role::{Group, Role};
pub use status::{OrderStatus, StatusError};
pub use text::{Slug, TextError, Title, escape_html};
pub use username::{Username, UsernameError};
