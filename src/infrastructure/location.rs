//! Device geolocation.
//!
//! A terminal has no positioning hardware, so the device position is either
//! supplied through configuration or reported as unavailable. Either way the
//! resolver treats failure as "unresolved" and never surfaces it.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::{Coordinates, GeoError};

/// A source of the device's current position.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeoError>;
}

/// Reports a fixed position, typically taken from configuration.
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl GeoProvider for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Ok(self.0)
    }
}

/// A device without geolocation support.
pub struct NoGeolocation;

#[async_trait]
impl GeoProvider for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Err(GeoError::Unavailable)
    }
}

pub struct LocationResolver;

impl LocationResolver {
    /// Asks the provider once. Any failure maps to `None`.
    pub async fn resolve_once(provider: &dyn GeoProvider) -> Option<Coordinates> {
        match provider.current_position().await {
            Ok(coords) => {
                info!(lat = coords.lat, lon = coords.lon, "device location resolved");
                Some(coords)
            }
            Err(err) => {
                warn!(error = %err, "geolocation blocked or failed");
                None
            }
        }
    }
}
