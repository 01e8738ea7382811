//! Nightcap Core - Shared types library.
//!
//! This crate provides common types used across all Nightcap components:
//! - `storefront` - Customer-facing ordering service
//! - `cli` - Command-line tools for session-store migrations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. The backend owns every authoritative number; these types only
//! carry them around safely.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, phone numbers, coordinates and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
