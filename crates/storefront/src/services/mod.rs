//! Business logic services for storefront.
//!
//! Each service owns one slice of per-visitor state in the session and the
//! rules for changing it. Routes stay thin: they extract, call a service and
//! serialize the result.
//!
//! # Services
//!
//! - `auth` - Phone-code sign-in (user, bearer token, pending session token)
//! - `cart` - Cart lines, stock ceilings and display totals
//! - `business` - Selected business and change detection
//! - `address` - Selected delivery address with fallback
//! - `notifications` - Stored notification list
//! - `checkout` - Order request assembly and submission

pub mod address;
pub mod auth;
pub mod business;
pub mod cart;
pub mod checkout;
pub mod notifications;
