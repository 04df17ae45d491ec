//! Request classification and job submission validation.
//!
//! # Responsibilities
//! - Detect WebSocket upgrade requests
//! - Match the JSON content type
//! - Validate the `{id, data, character?}` submission body
//!
//! # Design Decisions
//! - Validation error text is returned verbatim as the 400 body
//! - Malformed JSON and a JSON value of the wrong shape are distinct errors

use axum::http::{header, HeaderMap, Method};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::registry::ChannelId;

/// Whether the request asks to switch to the WebSocket protocol.
pub fn is_websocket_upgrade(method: &Method, headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    let upgrade_websocket = headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("websocket"));

    method == Method::GET && connection_upgrade && upgrade_websocket
}

/// Whether the body is declared as `application/json` (parameters ignored).
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

/// Reasons a submission body is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountRequestError {
    #[error("Request body is not in valid json format")]
    NotJson,

    #[error("Request body is not valid json object")]
    InvalidObject,

    #[error("Request \"id\" is not in valid format")]
    InvalidId,

    #[error("Request \"character\" must be a single character")]
    InvalidCharacter,
}

#[derive(Debug, Deserialize)]
struct RawCountRequest {
    id: String,
    data: String,
    #[serde(default)]
    character: Option<String>,
}

/// A validated job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRequest {
    /// Identity of the channel that receives the result.
    pub id: ChannelId,
    /// Worker input.
    pub data: String,
    /// Character the worker counts.
    pub operation: char,
}

impl CountRequest {
    /// Validate a submission body, using `default_operation` when the body
    /// does not name a character.
    pub fn parse(body: &[u8], default_operation: char) -> Result<Self, CountRequestError> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|_| CountRequestError::NotJson)?;
        if !value.is_object() {
            return Err(CountRequestError::NotJson);
        }

        let raw: RawCountRequest =
            serde_json::from_value(value).map_err(|_| CountRequestError::InvalidObject)?;

        let id = Uuid::parse_str(&raw.id).map_err(|_| CountRequestError::InvalidId)?;

        let operation = match raw.character {
            None => default_operation,
            Some(character) => {
                let mut chars = character.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() => c,
                    _ => return Err(CountRequestError::InvalidCharacter),
                }
            }
        };

        Ok(Self {
            id,
            data: raw.data,
            operation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const ID: &str = "6f1c2d8e-0b5a-4f57-9d53-1a3c3c6f4b10";

    #[test]
    fn parses_minimal_body() {
        let body = format!(r#"{{"id":"{ID}","data":"aaa"}}"#);
        let request = CountRequest::parse(body.as_bytes(), 'a').unwrap();
        assert_eq!(request.id.to_string(), ID);
        assert_eq!(request.data, "aaa");
        assert_eq!(request.operation, 'a');
    }

    #[test]
    fn character_overrides_default() {
        let body = format!(r#"{{"id":"{ID}","data":"ééé","character":"é"}}"#);
        let request = CountRequest::parse(body.as_bytes(), 'a').unwrap();
        assert_eq!(request.operation, 'é');
    }

    #[test]
    fn rejects_bad_bodies() {
        let cases: &[(&str, CountRequestError)] = &[
            ("not json", CountRequestError::NotJson),
            ("[1, 2]", CountRequestError::NotJson),
            (r#"{"id": 5, "data": "x"}"#, CountRequestError::InvalidObject),
            (r#"{"data": "x"}"#, CountRequestError::InvalidObject),
            (r#"{"id": "nope", "data": "x"}"#, CountRequestError::InvalidId),
        ];
        for (body, expected) in cases {
            assert_eq!(
                CountRequest::parse(body.as_bytes(), 'a').unwrap_err(),
                *expected,
                "body: {body}"
            );
        }
    }

    #[test]
    fn rejects_multi_character_operation() {
        for character in ["", "ab", "\n"] {
            let body = serde_json::json!({"id": ID, "data": "x", "character": character}).to_string();
            assert_eq!(
                CountRequest::parse(body.as_bytes(), 'a').unwrap_err(),
                CountRequestError::InvalidCharacter
            );
        }
    }

    #[test]
    fn json_content_type_ignores_parameters() {
        let mut headers = HeaderMap::new();
        assert!(!is_json_content_type(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(is_json_content_type(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("Application/JSON; charset=utf-8"),
        );
        assert!(is_json_content_type(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json_content_type(&headers));
    }

    #[test]
    fn detects_websocket_upgrade() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, Upgrade"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));

        assert!(is_websocket_upgrade(&Method::GET, &headers));
        assert!(!is_websocket_upgrade(&Method::POST, &headers));

        headers.insert(header::UPGRADE, HeaderValue::from_static("h2c"));
        assert!(!is_websocket_upgrade(&Method::GET, &headers));
    }
}
