//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. Throttle (per IP or per token, on `/api` and `/token` only)
//!
//! Authentication is not a middleware: handlers take a [`Caller`] extractor,
//! which resolves the `Authorization: Token <key>` header to an identity.

pub mod auth;
pub mod request_id;
pub mod throttle;

pub use auth::{Caller, token_from_headers};
pub use request_id::request_id_middleware;
pub use throttle::{Throttle, throttle_middleware};
