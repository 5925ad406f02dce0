use thiserror::Error;

/// Failure to obtain a position fix from the location sensor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable")]
    Unavailable,

    #[error("Location request timed out")]
    Timeout,
}

impl LocationError {
    /// Map a platform geolocation error code (1 = denied, 2 = unavailable, 3 = timeout).
    pub fn from_platform_code(code: u16) -> Self {
        match code {
            1 => LocationError::PermissionDenied,
            3 => LocationError::Timeout,
            _ => LocationError::Unavailable,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "無法取得您的位置，請允許瀏覽器存取地理位置權限",
            LocationError::Unavailable => "無法取得位置資訊，請檢查您的裝置設定",
            LocationError::Timeout => "取得位置逾時，請稍後再試",
        }
    }

    /// A denied permission will not change until the user acts
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LocationError::PermissionDenied)
    }
}

/// Failure talking to an external provider (places search, details, generation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    #[error("Provider returned status {status}: {message}")]
    BadStatus { status: String, message: String },

    #[error("Provider response could not be decoded: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn bad_status(status: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::BadStatus {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Raw provider status, kept for diagnostics.
    pub fn status(&self) -> Option<&str> {
        match self {
            ProviderError::BadStatus { status, .. } => Some(status),
            _ => None,
        }
    }
}

/// A generated reply did not contain the JSON object the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("No JSON object found in reply")]
    NoJsonObject,

    #[error("Malformed JSON object: {0}")]
    Malformed(String),
}

/// Read/write failure on the local key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Failed to write {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Corrupt value under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors surfaced by a restaurant search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Place search failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Search superseded by a newer request")]
    Superseded,
}

impl SearchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SearchError::Provider(_) => "搜尋失敗，請稍後再試",
            SearchError::Superseded => "已開始新的搜尋",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::Provider(_))
    }
}

/// Errors from assistant operations that do not have a local fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssistantError {
    #[error("Assistant is not configured")]
    NotConfigured,

    #[error("Generation failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Unusable reply: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

impl AssistantError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AssistantError::NotConfigured => "AI 功能尚未設定",
            AssistantError::Provider(ProviderError::BadStatus { message, .. })
                if message.contains("quota") =>
            {
                "API 配額已用盡，請稍後再試"
            }
            AssistantError::Provider(ProviderError::BadStatus { message, .. })
                if message.contains("API key not valid") =>
            {
                "API 金鑰無效，請檢查伺服器設定"
            }
            AssistantError::Provider(_) | AssistantError::Parse(_) => "AI 分析失敗，請稍後再試",
            AssistantError::InvalidImage(_) => "不支援的圖片格式",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AssistantError::Provider(_) | AssistantError::Parse(_))
    }
}
