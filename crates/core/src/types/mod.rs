//! Core types for Nightcap.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod geo;
pub mod id;
pub mod phone;
pub mod price;
pub mod status;

pub use geo::{Coordinates, CoordinatesError};
pub use id::*;
pub use phone::{PhoneError, PhoneNumber};
pub use price::Price;
pub use status::*;
