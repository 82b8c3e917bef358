//! Geographic coordinate type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{SharedError, SharedResult};

/// A latitude/longitude pair in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Build a validated coordinate. Both components must be finite and in range.
    pub fn new(lat: f64, lng: f64) -> SharedResult<Self> {
        let coordinate = Self { lat, lng };
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(SharedError::InvalidCoordinate {
                input: format!("{lat},{lng}"),
            })
        }
    }

    /// Coordinates loaded from a snapshot bypass `new`, so callers re-check with this.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

impl FromStr for Coordinate {
    type Err = SharedError;

    /// Parses `"lat,lng"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SharedError::InvalidCoordinate { input: s.to_string() };
        let mut parts = s.split(',').map(str::trim);
        let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };
        let lat: f64 = lat.parse().map_err(|_| invalid())?;
        let lng: f64 = lng.parse().map_err(|_| invalid())?;
        Self::new(lat, lng)
    }
}
