//! Application constants and server configuration

use std::time::Duration;

use thiserror::Error;

use crate::domain::models::Coordinate;

/// Fallback position used when no location can be resolved (Taipei 101)
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(25.0330, 121.5654);

/// Place category requested from the search provider
pub const SEARCH_CATEGORY: &str = "restaurant";

/// Language tag sent to providers
pub const DEFAULT_LANGUAGE: &str = "zh-TW";

/// Placeholder shipped in sample configs, never a real key
pub const GENERATION_KEY_PLACEHOLDER: &str = "YOUR_GEMINI_API_KEY_HERE";

const MIN_GENERATION_KEY_LEN: usize = 30;

/// Weights of the relevance score `rating * rating_weight - distance_km * distance_weight`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingWeights {
    pub rating: f64,
    pub distance: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            rating: 1.2,
            distance: 0.1,
        }
    }
}

/// Search pipeline settings
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub language: String,
    pub category: String,
    pub min_results: usize,
    pub max_results: usize,
    pub weights: RankingWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            category: SEARCH_CATEGORY.to_string(),
            min_results: 3,
            max_results: 5,
            weights: RankingWeights::default(),
        }
    }
}

/// Live-fix settings for the location sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// A fix younger than this is reused without prompting again
    pub max_cache_age: Duration,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            max_cache_age: Duration::from_secs(5 * 60),
        }
    }
}

/// Generation parameters for assistant calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1000,
        }
    }
}

/// Everything the client-side services need
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub default_center: Coordinate,
    pub history_capacity: usize,
    pub search: SearchConfig,
    pub fix: FixOptions,
    pub generation: GenerationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_center: DEFAULT_CENTER,
            history_capacity: 20,
            search: SearchConfig::default(),
            fix: FixOptions::default(),
            generation: GenerationSettings::default(),
        }
    }
}

/// Errors during configuration loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Proxy server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub places_api_key: String,
    /// `None` when absent or not a usable key; the assistant then runs local-only
    pub generation_api_key: Option<String>,
    pub generation_model: String,
    pub language: String,
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// `PLACES_API_KEY` is required; `GEMINI_API_KEY`, `GEMINI_MODEL`,
    /// `PLACES_LANGUAGE`, `HOST` and `PORT` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let places_api_key = lookup("PLACES_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing("PLACES_API_KEY".to_string()))?;

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                key: "PORT".to_string(),
                reason: format!("{}", e),
            })?,
            None => 3401,
        };

        Ok(Self {
            places_api_key,
            generation_api_key: validate_generation_key(lookup("GEMINI_API_KEY")),
            generation_model: lookup("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            language: lookup("PLACES_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
        })
    }
}

/// Accept a generation key only if it is set, not the placeholder and long enough
pub fn validate_generation_key(key: Option<String>) -> Option<String> {
    let key = key?.trim().to_string();
    if key.is_empty() {
        tracing::warn!("Generation API key not set - assistant runs local-only");
        return None;
    }
    if key == GENERATION_KEY_PLACEHOLDER {
        tracing::warn!("Generation API key is the sample placeholder - assistant runs local-only");
        return None;
    }
    if key.len() < MIN_GENERATION_KEY_LEN {
        tracing::warn!("Generation API key is too short, assistant runs local-only");
        return None;
    }
    Some(key)
}
