//! Structured logging helpers
//!
//! Every swallowed failure goes through one of these so that fallbacks stay
//! visible in the logs even when the user never sees an error.

use crate::domain::models::{Coordinate, FilterSpec};

/// Operation tags attached to every log record
#[derive(Debug, Clone, Copy)]
pub enum LogOperation {
    Location,
    Search,
    Ranking,
    Storage,
    Assistant,
    Proxy,
}

impl LogOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogOperation::Location => "location",
            LogOperation::Search => "search",
            LogOperation::Ranking => "ranking",
            LogOperation::Storage => "storage",
            LogOperation::Assistant => "assistant",
            LogOperation::Proxy => "proxy",
        }
    }
}

/// Log where a coordinate came from (memory, persisted, sensor)
pub fn log_location_resolved(source: &str, coordinate: Coordinate) {
    tracing::debug!(
        operation = LogOperation::Location.as_str(),
        source = source,
        lat = coordinate.latitude,
        lng = coordinate.longitude,
        "Location resolved"
    );
}

/// Log a failed live fix
pub fn log_location_failed(error: &str) {
    tracing::warn!(
        operation = LogOperation::Location.as_str(),
        error = error,
        "Failed to get location fix"
    );
}

/// Log the fallback to the default coordinate during a search
pub fn log_location_fallback(error: &str, fallback: Coordinate) {
    tracing::warn!(
        operation = LogOperation::Search.as_str(),
        error = error,
        lat = fallback.latitude,
        lng = fallback.longitude,
        "Failed to get location, using default"
    );
}

/// Log search start
pub fn log_search_start(token: u64, filters: &FilterSpec, radius_m: u32) {
    tracing::info!(
        operation = LogOperation::Search.as_str(),
        token = token,
        cuisines = filters.cuisine_types.len(),
        price_levels = filters.price_levels.len(),
        radius_m = radius_m,
        time_slot = filters.time_slot.as_str(),
        "Starting restaurant search"
    );
}

/// Log search result counts through the pipeline
pub fn log_search_result(token: u64, fetched: usize, filtered: usize, returned: usize) {
    tracing::info!(
        operation = LogOperation::Search.as_str(),
        token = token,
        fetched = fetched,
        filtered = filtered,
        returned = returned,
        "Restaurant search completed"
    );
}

/// Log a search whose results were discarded because a newer one started
pub fn log_search_superseded(token: u64, latest: u64) {
    tracing::debug!(
        operation = LogOperation::Search.as_str(),
        token = token,
        latest = latest,
        "Discarding superseded search results"
    );
}

/// Log a provider failure
pub fn log_provider_error(provider: &str, error: &str) {
    tracing::error!(
        operation = LogOperation::Search.as_str(),
        provider = provider,
        error = error,
        "Provider request failed"
    );
}

/// Log a time slot filter that cannot be applied with the data at hand
pub fn log_time_slot_passthrough(slot: &str) {
    tracing::trace!(
        operation = LogOperation::Ranking.as_str(),
        time_slot = slot,
        "Time slot filter is a pass-through for nearby results"
    );
}

/// Log a swallowed storage failure
pub fn log_storage_error(key: &str, action: &str, error: &str) {
    tracing::warn!(
        operation = LogOperation::Storage.as_str(),
        key = key,
        action = action,
        error = error,
        "Storage operation failed"
    );
}

/// Log an assistant fallback (the local result is used instead)
pub fn log_assistant_fallback(task: &str, error: &str) {
    tracing::warn!(
        operation = LogOperation::Assistant.as_str(),
        task = task,
        error = error,
        "Assistant call failed, using fallback"
    );
}

/// Log an assistant call
pub fn log_assistant_call(task: &str, with_image: bool) {
    tracing::debug!(
        operation = LogOperation::Assistant.as_str(),
        task = task,
        with_image = with_image,
        "Calling generation provider"
    );
}

/// Log a proxied request
pub fn log_proxy_request(route: &str, cache_hit: bool) {
    tracing::debug!(
        operation = LogOperation::Proxy.as_str(),
        route = route,
        cache_hit = cache_hit,
        "Proxy request"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_operation_as_str() {
        assert_eq!(LogOperation::Location.as_str(), "location");
        assert_eq!(LogOperation::Search.as_str(), "search");
        assert_eq!(LogOperation::Ranking.as_str(), "ranking");
        assert_eq!(LogOperation::Storage.as_str(), "storage");
        assert_eq!(LogOperation::Assistant.as_str(), "assistant");
        assert_eq!(LogOperation::Proxy.as_str(), "proxy");
    }
}
