use axum::{Json, extract::State, http::StatusCode};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::{ApiError, ProxyState};
use crate::domain::models::{ImageInput, MAX_IMAGE_SIZE};
use crate::infrastructure::api::{GenerationReply, GenerationRequest, InlineImage};
use crate::shared::logging::{log_provider_error, log_proxy_request};

/// Request body limit for /api/generate: a base64 image of `MAX_IMAGE_SIZE`
/// plus room for the prompt and JSON envelope
pub const GENERATE_BODY_LIMIT: usize = MAX_IMAGE_SIZE.div_ceil(3) * 4 + 64 * 1024;

/// Decode an inline image and replace its declared type with the sniffed one
fn checked_image(inline: &InlineImage) -> Result<InlineImage, ApiError> {
    let bytes = STANDARD
        .decode(&inline.data)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid image data: {}", e)))?;

    let format = image::guess_format(&bytes)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Unrecognized image: {}", e)))?;

    let input = ImageInput::new(bytes, format.to_mime_type());
    input
        .validate()
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e))?;

    if input.media_type != inline.mime_type {
        tracing::debug!(
            declared = %inline.mime_type,
            detected = %input.media_type,
            "Correcting declared image type"
        );
    }

    Ok(InlineImage::from(&input))
}

/// POST /api/generate
/// Forward a prompt (and optional image) to the generation provider
pub async fn generate_handler(
    State(state): State<ProxyState>,
    Json(mut request): Json<GenerationRequest>,
) -> Result<Json<GenerationReply>, ApiError> {
    log_proxy_request("generate", false);

    let Some(generator) = state.generator.as_ref() else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Generation API key is not configured",
        ));
    };

    if let Some(image) = request.image.take() {
        request.image = Some(checked_image(&image)?);
    }

    let text = generator.generate(&request).await.map_err(|e| {
        log_provider_error("generation", &e.to_string());
        ApiError::from(e)
    })?;

    Ok(Json(GenerationReply { text }))
}
