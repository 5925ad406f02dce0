//! Strict extraction of JSON objects from generated free text

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::shared::ParseError;

/// Find the first JSON object in `reply` that deserializes into `T`.
///
/// Candidates start at each `{` in order and must be complete, valid JSON
/// objects; trailing prose after an object is ignored. Fails with
/// [`ParseError::NoJsonObject`] when the text holds no object at all and
/// [`ParseError::Malformed`] when objects exist but none fits `T`.
pub fn extract_json<T: DeserializeOwned>(reply: &str) -> Result<T, ParseError> {
    let mut first_error: Option<String> = None;

    for (start, _) in reply.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&reply[start..]).into_iter::<Value>();
        let value = match stream.next() {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
                continue;
            }
            None => continue,
        };

        match serde_json::from_value::<T>(value) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    Err(first_error.map_or(ParseError::NoJsonObject, ParseError::Malformed))
}
