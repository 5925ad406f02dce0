//! Browser client for the same-origin proxy server (see `handlers`)

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use super::{
    ApiErrorBody, GenerationProvider, GenerationReply, GenerationRequest, NearbyRequest,
    PlaceDetailProvider, PlaceSearchProvider, ProxyHealth,
};
use crate::domain::models::{PlaceDetails, PlacePhoto, RawPlace};
use crate::shared::ProviderError;

#[derive(Debug, Clone, Default)]
pub struct ProxyClient {
    base_url: String,
}

impl ProxyClient {
    /// `base_url` is empty for same-origin requests
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<ProxyHealth, ProviderError> {
        let response = Request::get(&self.url("/api/health"))
            .send()
            .await
            .map_err(unreachable)?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    if !response.ok() {
        let code = response.status();
        return Err(match response.json::<ApiErrorBody>().await {
            Ok(body) => ProviderError::bad_status(
                body.status.unwrap_or_else(|| code.to_string()),
                body.error,
            ),
            Err(_) => ProviderError::bad_status(code.to_string(), response.status_text()),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

fn unreachable(error: gloo_net::Error) -> ProviderError {
    ProviderError::Unreachable(error.to_string())
}

#[async_trait(?Send)]
impl PlaceSearchProvider for ProxyClient {
    async fn nearby(&self, request: &NearbyRequest) -> Result<Vec<RawPlace>, ProviderError> {
        let response = Request::post(&self.url("/api/places/nearby"))
            .json(request)
            .map_err(unreachable)?
            .send()
            .await
            .map_err(unreachable)?;
        read_json(response).await
    }
}

#[async_trait(?Send)]
impl PlaceDetailProvider for ProxyClient {
    // The proxy always requests the full detail field list
    async fn details(
        &self,
        place_id: &str,
        _fields: &[&str],
    ) -> Result<PlaceDetails, ProviderError> {
        let path = format!("/api/places/{}", urlencoding::encode(place_id));
        let response = Request::get(&self.url(&path))
            .send()
            .await
            .map_err(unreachable)?;
        read_json(response).await
    }

    async fn photo(&self, photo_ref: &str, max_width: u32) -> Result<PlacePhoto, ProviderError> {
        let path = format!("/api/photos/{}", urlencoding::encode(photo_ref));
        let response = Request::get(&self.url(&path))
            .query([("maxwidth", max_width.to_string())])
            .send()
            .await
            .map_err(unreachable)?;

        if !response.ok() {
            return Err(ProviderError::bad_status(
                response.status().to_string(),
                response.status_text(),
            ));
        }
        let content_type = response
            .headers()
            .get("content-type")
            .unwrap_or_else(|| "image/jpeg".to_string());
        let bytes = response
            .binary()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(PlacePhoto {
            content_type,
            bytes,
        })
    }
}

#[async_trait(?Send)]
impl GenerationProvider for ProxyClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let response = Request::post(&self.url("/api/generate"))
            .json(request)
            .map_err(unreachable)?
            .send()
            .await
            .map_err(unreachable)?;
        let reply: GenerationReply = read_json(response).await?;
        Ok(reply.text)
    }
}
