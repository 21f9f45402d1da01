//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction tracing)
//! 2. CORS
//! 3. `TraceLayer` (request spans)
//! 4. Request ID (add unique ID to each request, recorded on the span)
//!
//! Authorization is not a layer: protected handlers take an
//! [`Authorized`] extractor parameterized by their [`RolePolicy`].

pub mod auth;
pub mod request_id;

pub use auth::{AdminOnly, AdminOrOwner, Authorized, CustomerSelf, RolePolicy};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
