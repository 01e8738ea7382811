//! Domain models for storefront.

pub mod session;

pub use session::{AuthSession, BearerToken};
