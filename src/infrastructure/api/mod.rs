//! External provider contracts and their HTTP clients
//!
//! Native builds talk to Google Places and Gemini directly (keys stay on the
//! server); the browser build talks to the same-origin proxy.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::MaybeSend;
use crate::config::GenerationSettings;
use crate::domain::models::{Coordinate, ImageInput, PlaceDetails, PlacePhoto, RawPlace};
use crate::shared::ProviderError;

#[cfg(not(target_arch = "wasm32"))]
pub mod google_places;
#[cfg(not(target_arch = "wasm32"))]
pub mod gemini;
#[cfg(target_arch = "wasm32")]
pub mod proxy;

#[cfg(not(target_arch = "wasm32"))]
pub use gemini::GeminiClient;
#[cfg(not(target_arch = "wasm32"))]
pub use google_places::GooglePlacesClient;
#[cfg(target_arch = "wasm32")]
pub use proxy::ProxyClient;

/// Nearby search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequest {
    pub origin: Coordinate,
    pub radius_m: u32,
    pub category: String,
    pub language: String,
    #[serde(default)]
    pub open_now_only: bool,
}

/// Inline image attached to a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 (standard alphabet) encoded bytes
    pub data: String,
}

impl From<&ImageInput> for InlineImage {
    fn from(image: &ImageInput) -> Self {
        use base64::Engine as _;

        Self {
            mime_type: image.media_type.clone(),
            data: base64::engine::general_purpose::STANDARD.encode(&image.bytes),
        }
    }
}

/// Prompt plus optional image for the text/vision generation provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub image: Option<InlineImage>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, settings: &GenerationSettings) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Generated text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReply {
    pub text: String,
}

/// Error body returned by the proxy server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Reply of the proxy's health route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyHealth {
    pub status: String,
    /// Whether the server holds a usable generation key
    pub assistant: bool,
}

impl ProxyHealth {
    /// Route assistant calls through the proxy unless it reports no key.
    /// An unanswered health check leaves them enabled; each call still falls back on failure.
    pub fn assistant_enabled(health: &Result<ProxyHealth, ProviderError>) -> bool {
        match health {
            Ok(health) => health.assistant,
            Err(_) => true,
        }
    }
}

/// Nearby place search
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PlaceSearchProvider: MaybeSend {
    async fn nearby(&self, request: &NearbyRequest) -> Result<Vec<RawPlace>, ProviderError>;
}

/// Per-place details and photos
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PlaceDetailProvider: MaybeSend {
    async fn details(&self, place_id: &str, fields: &[&str]) -> Result<PlaceDetails, ProviderError>;

    async fn photo(&self, photo_ref: &str, max_width: u32) -> Result<PlacePhoto, ProviderError>;
}

/// Text/vision generation
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait GenerationProvider: MaybeSend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<T: PlaceSearchProvider + ?Sized> PlaceSearchProvider for Arc<T> {
    async fn nearby(&self, request: &NearbyRequest) -> Result<Vec<RawPlace>, ProviderError> {
        (**self).nearby(request).await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<T: PlaceDetailProvider + ?Sized> PlaceDetailProvider for Arc<T> {
    async fn details(
        &self,
        place_id: &str,
        fields: &[&str],
    ) -> Result<PlaceDetails, ProviderError> {
        (**self).details(place_id, fields).await
    }

    async fn photo(&self, photo_ref: &str, max_width: u32) -> Result<PlacePhoto, ProviderError> {
        (**self).photo(photo_ref, max_width).await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<T: GenerationProvider + ?Sized> GenerationProvider for Arc<T> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        (**self).generate(request).await
    }
}
