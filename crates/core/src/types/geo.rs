//! Geographic coordinates for addresses and business locations.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building [`Coordinates`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum CoordinatesError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create validated coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if either component is out of range or not finite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinatesError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinatesError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinatesError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }
}
