//! Display strings for places and history entries

use chrono::{DateTime, Datelike, Local};

use crate::domain::models::{FilterSpec, price_symbol};

/// Default width requested for place photos
pub const DEFAULT_PHOTO_WIDTH: u32 = 400;

/// `850 公尺` below one kilometre, `2.4 公里` otherwise
pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{} 公尺", (distance_km * 1000.0).round() as i64)
    } else {
        format!("{} 公里", distance_km)
    }
}

pub fn format_price_level(level: u8) -> &'static str {
    price_symbol(level)
}

/// Open state label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenStatus {
    Open,
    Closed,
    Unknown,
}

impl OpenStatus {
    pub fn from_flag(open_now: Option<bool>) -> Self {
        match open_now {
            Some(true) => OpenStatus::Open,
            Some(false) => OpenStatus::Closed,
            None => OpenStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OpenStatus::Open => "營業中",
            OpenStatus::Closed => "休息中",
            OpenStatus::Unknown => "營業資訊不明",
        }
    }

    /// CSS class used by the result card; empty when unknown
    pub fn css_class(&self) -> &'static str {
        match self {
            OpenStatus::Open => "open",
            OpenStatus::Closed => "closed",
            OpenStatus::Unknown => "",
        }
    }
}

/// Human-readable age of a history entry, both arguments in epoch milliseconds
pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let elapsed = (now_ms - timestamp_ms).max(0);
    let minutes = elapsed / 60_000;
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "剛剛".to_string()
    } else if minutes < 60 {
        format!("{} 分鐘前", minutes)
    } else if hours < 24 {
        format!("{} 小時前", hours)
    } else if days < 7 {
        format!("{} 天前", days)
    } else {
        match DateTime::from_timestamp_millis(timestamp_ms) {
            Some(at) => {
                let local = at.with_timezone(&Local);
                format!("{}/{}", local.month(), local.day())
            }
            None => String::new(),
        }
    }
}

/// One-line summary of a history entry's filters
pub fn format_filter_summary(filters: &FilterSpec) -> String {
    let mut parts = Vec::new();

    if !filters.cuisine_types.is_empty() {
        parts.push(
            filters
                .cuisine_types
                .iter()
                .map(|c| c.display_name())
                .collect::<Vec<_>>()
                .join("、"),
        );
    }

    parts.push(format!("{} 公里內", filters.distance_band.kilometers()));

    if filters.min_rating > 0.0 {
        parts.push(format!("⭐{}+", filters.min_rating));
    }

    parts.join(" • ")
}

/// Proxy URL for a place photo; the reference is percent-encoded as a path segment
pub fn photo_url(base_url: &str, photo_ref: &str, max_width: u32) -> String {
    format!(
        "{}/api/photos/{}?maxwidth={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(photo_ref),
        max_width
    )
}
