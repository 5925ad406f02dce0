//! Current position resolution and distance math

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::FixOptions;
use crate::domain::models::Coordinate;
use crate::domain::services::preferences::PreferenceStore;
use crate::infrastructure::sensor::LocationSensor;
use crate::infrastructure::storage::KeyValueStore;
use crate::shared::LocationError;
use crate::shared::logging::{log_location_failed, log_location_resolved};

/// Mean Earth radius used by [`distance_km`]
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance (Haversine), rounded to one decimal place.
///
/// Symmetric in its arguments. Because of the rounding, points closer than
/// about 50 m report 0.0.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).abs().to_radians();
    let delta_lng = (b.longitude - a.longitude).abs().to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    (EARTH_RADIUS_KM * c * 10.0).round() / 10.0
}

/// Whether `point` lies within `radius_km` of `center`
pub fn is_within_radius(point: Coordinate, center: Coordinate, radius_km: f64) -> bool {
    distance_km(point, center) <= radius_km
}

/// Resolves the user's position: memory, then persisted, then live sensor
pub struct LocationProvider<S, K> {
    sensor: S,
    preferences: Arc<PreferenceStore<K>>,
    current: Mutex<Option<Coordinate>>,
    options: FixOptions,
    default_center: Coordinate,
}

impl<S: LocationSensor, K: KeyValueStore> LocationProvider<S, K> {
    pub fn new(
        sensor: S,
        preferences: Arc<PreferenceStore<K>>,
        options: FixOptions,
        default_center: Coordinate,
    ) -> Self {
        Self {
            sensor,
            preferences,
            current: Mutex::new(None),
            options,
            default_center,
        }
    }

    fn cached(&self) -> Option<Coordinate> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(&self, coordinate: Coordinate) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(coordinate);
    }

    pub async fn resolve(&self) -> Result<Coordinate, LocationError> {
        if let Some(coordinate) = self.cached() {
            log_location_resolved("memory", coordinate);
            return Ok(coordinate);
        }

        if let Some(coordinate) = self.preferences.last_location() {
            self.remember(coordinate);
            log_location_resolved("persisted", coordinate);
            return Ok(coordinate);
        }

        self.resolve_fresh().await
    }

    /// Always asks the sensor; updates both caches on success
    pub async fn resolve_fresh(&self) -> Result<Coordinate, LocationError> {
        match self.sensor.get_fix(&self.options).await {
            Ok(coordinate) => {
                self.remember(coordinate);
                self.preferences.save_last_location(coordinate);
                log_location_resolved("sensor", coordinate);
                Ok(coordinate)
            }
            Err(e) => {
                log_location_failed(&e.to_string());
                Err(e)
            }
        }
    }

    pub fn default_coordinate(&self) -> Coordinate {
        self.default_center
    }

    pub fn distance_km(&self, a: Coordinate, b: Coordinate) -> f64 {
        distance_km(a, b)
    }

    pub fn is_within_radius(&self, point: Coordinate, center: Coordinate, radius_km: f64) -> bool {
        is_within_radius(point, center, radius_km)
    }
}
