pub mod errors;
pub mod logging;

pub use errors::{
    AssistantError, LocationError, ParseError, ProviderError, SearchError, StorageError,
};
