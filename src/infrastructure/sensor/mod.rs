//! Location sensor adapters

use async_trait::async_trait;

use super::MaybeSend;
use crate::config::FixOptions;
use crate::domain::models::Coordinate;
use crate::shared::LocationError;

#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserGeolocation;

/// Source of live position fixes
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait LocationSensor: MaybeSend {
    async fn get_fix(&self, options: &FixOptions) -> Result<Coordinate, LocationError>;
}

/// Sensor for hosts without positioning hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensor;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl LocationSensor for NoSensor {
    async fn get_fix(&self, _options: &FixOptions) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// Sensor that always reports the same configured position
#[derive(Debug, Clone, Copy)]
pub struct FixedSensor(pub Coordinate);

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl LocationSensor for FixedSensor {
    async fn get_fix(&self, _options: &FixOptions) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}
