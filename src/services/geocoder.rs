//! Address to coordinate resolution.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::Location;

/// Resolves free-text addresses to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Location>;
}

/// Returns the same coordinates for every non-empty address.
///
/// Stands in until a real geocoding service is wired up.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeocoder {
    location: Location,
}

impl FixedGeocoder {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl Default for FixedGeocoder {
    fn default() -> Self {
        Self::new(Location { lat: 55.0, lng: 35.0 })
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn resolve(&self, address: &str) -> Result<Location> {
        if address.trim().is_empty() {
            return Err(AppError::Geocode("empty address".to_string()));
        }
        Ok(self.location)
    }
}
