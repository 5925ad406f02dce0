//! Test fakes for every external collaborator

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::config::{DEFAULT_CENTER, FixOptions};
use crate::domain::models::{Coordinate, Place, PlaceDetails, PlacePhoto, RawPlace};
use crate::domain::services::search::OriginSource;
use crate::infrastructure::api::{
    GenerationProvider, GenerationRequest, NearbyRequest, PlaceDetailProvider, PlaceSearchProvider,
};
use crate::infrastructure::sensor::LocationSensor;
use crate::infrastructure::storage::KeyValueStore;
use crate::shared::{LocationError, ProviderError, StorageError};

/// Normalized place with the given rating and distance
pub fn place(id: &str, rating: f64, distance_km: f64) -> Place {
    Place {
        id: id.to_string(),
        name: format!("Place {}", id),
        category_tags: vec!["restaurant".to_string()],
        price_level: 2,
        coordinate: DEFAULT_CENTER,
        address: format!("{} Example Rd", id),
        rating,
        review_count: 100,
        open_now: None,
        distance_km,
        photo_refs: Vec::new(),
    }
}

/// Provider record offset from the default centre by `(d_lat, d_lng)` degrees
pub fn raw_place(
    id: &str,
    name: &str,
    tags: &[&str],
    price_level: Option<u8>,
    rating: Option<f64>,
    offset: (f64, f64),
    open_now: Option<bool>,
) -> RawPlace {
    RawPlace {
        id: id.to_string(),
        name: name.to_string(),
        category_tags: tags.iter().map(|t| t.to_string()).collect(),
        price_level,
        coordinate: Coordinate::new(
            DEFAULT_CENTER.latitude + offset.0,
            DEFAULT_CENTER.longitude + offset.1,
        ),
        address: String::new(),
        rating,
        review_count: Some(100),
        open_now,
        photo_refs: Vec::new(),
    }
}

/// Store whose every call fails
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Read {
            key: key.to_string(),
            reason: "quota exceeded".to_string(),
        })
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Write {
            key: key.to_string(),
            reason: "quota exceeded".to_string(),
        })
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}

/// Sensor answering from a script, then `Unavailable`
pub struct ScriptedSensor {
    fixes: Mutex<VecDeque<Result<Coordinate, LocationError>>>,
}

impl ScriptedSensor {
    pub fn new(fixes: Vec<Result<Coordinate, LocationError>>) -> Self {
        Self {
            fixes: Mutex::new(fixes.into()),
        }
    }
}

#[async_trait]
impl LocationSensor for ScriptedSensor {
    async fn get_fix(&self, _options: &FixOptions) -> Result<Coordinate, LocationError> {
        self.fixes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LocationError::Unavailable))
    }
}

/// Origin that can never be resolved
pub struct FailingOrigin;

#[async_trait]
impl OriginSource for FailingOrigin {
    async fn origin(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::PermissionDenied)
    }

    fn fallback(&self) -> Coordinate {
        DEFAULT_CENTER
    }
}

#[derive(Default)]
struct PlacesScript {
    replies: VecDeque<Result<Vec<RawPlace>, ProviderError>>,
    requests: Vec<NearbyRequest>,
    detail_calls: usize,
}

/// Place provider answering nearby searches from a script.
///
/// Details succeed for any id except `missing`; photos are a fixed PNG stub.
#[derive(Clone, Default)]
pub struct ScriptedPlaces {
    script: Arc<Mutex<PlacesScript>>,
}

impl ScriptedPlaces {
    pub fn new(replies: Vec<Result<Vec<RawPlace>, ProviderError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(PlacesScript {
                replies: replies.into(),
                ..Default::default()
            })),
        }
    }

    pub fn last_request(&self) -> Option<NearbyRequest> {
        self.script.lock().unwrap().requests.last().cloned()
    }

    pub fn detail_calls(&self) -> usize {
        self.script.lock().unwrap().detail_calls
    }
}

#[async_trait]
impl PlaceSearchProvider for ScriptedPlaces {
    async fn nearby(&self, request: &NearbyRequest) -> Result<Vec<RawPlace>, ProviderError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Unreachable("no scripted reply".to_string())))
    }
}

#[async_trait]
impl PlaceDetailProvider for ScriptedPlaces {
    async fn details(
        &self,
        place_id: &str,
        _fields: &[&str],
    ) -> Result<PlaceDetails, ProviderError> {
        self.script.lock().unwrap().detail_calls += 1;
        if place_id == "missing" {
            return Err(ProviderError::bad_status("NOT_FOUND", ""));
        }
        Ok(PlaceDetails {
            id: place_id.to_string(),
            name: format!("Details {}", place_id),
            phone: Some("02 1234 5678".to_string()),
            ..Default::default()
        })
    }

    async fn photo(&self, _photo_ref: &str, _max_width: u32) -> Result<PlacePhoto, ProviderError> {
        Ok(PlacePhoto {
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        })
    }
}

/// Place provider that holds every reply until [`GatedPlaces::release`]
#[derive(Clone)]
pub struct GatedPlaces {
    places: Vec<RawPlace>,
    requests: Arc<AtomicUsize>,
    gate: Arc<Semaphore>,
}

impl GatedPlaces {
    pub fn new(places: Vec<RawPlace>) -> Self {
        Self {
            places,
            requests: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    pub async fn wait_for_requests(&self, count: usize) {
        while self.requests.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl PlaceSearchProvider for GatedPlaces {
    async fn nearby(&self, _request: &NearbyRequest) -> Result<Vec<RawPlace>, ProviderError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;
        drop(permit);
        Ok(self.places.clone())
    }
}

#[derive(Default)]
struct GenerationScript {
    replies: VecDeque<Result<String, ProviderError>>,
    requests: Vec<GenerationRequest>,
}

/// Generation provider answering from a script
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    script: Arc<Mutex<GenerationScript>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(GenerationScript {
                replies: replies.into(),
                requests: Vec::new(),
            })),
        }
    }

    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.script.lock().unwrap().requests.last().cloned()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_request().map(|r| r.prompt)
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Unreachable("no scripted reply".to_string())))
    }
}
