//! Provider routes: one module per upstream domain.
//!
//! Each handler validates its parameters first (no upstream call on a 400),
//! then asks the [`Gateway`](crate::gateway::Gateway) for a credential,
//! builds the upstream request, and either relays or projects the answer.

pub mod news;
pub mod omdb;
pub mod openai;
pub mod rekognition;
pub mod tmdb;

use axum::{body::Bytes, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::gateway::{GatewayError, GatewayResult};
use crate::http::AppState;

/// All provider routes, nested under their domain prefixes.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/image-recognition", rekognition::routes())
        .nest("/movie-metadata", tmdb::routes())
        .nest("/title-lookup", omdb::routes())
        .nest("/news", news::routes())
        .nest("/chat", openai::routes())
}

/// Parse a JSON request body. An empty body reads as `T::default()`.
pub(crate) fn parse_json_body<T>(body: &Bytes) -> GatewayResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|_| GatewayError::validation("invalid JSON body"))
}

/// Trim a caller-supplied string, treating blank as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A numeric body field that callers may send as a number or a string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Resolve an optional numeric field, applying `default` when absent.
    pub fn resolve(value: Option<&Numeric>, default: f64, code: &str) -> GatewayResult<f64> {
        let parsed = match value {
            None => return Ok(default),
            Some(Numeric::Number(n)) => Some(*n),
            Some(Numeric::Text(s)) => s.trim().parse::<f64>().ok(),
        };
        parsed
            .filter(|n| n.is_finite())
            .ok_or_else(|| GatewayError::validation(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Body {
        name: Option<String>,
    }

    #[test]
    fn test_empty_body_is_default() {
        let parsed: Body = parse_json_body(&Bytes::from_static(b"  \n")).unwrap();
        assert_eq!(parsed, Body::default());
    }

    #[test]
    fn test_invalid_body_is_validation_error() {
        let err = parse_json_body::<Body>(&Bytes::from_static(b"{nope")).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref code) if code == "invalid JSON body"));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let parsed: Body = parse_json_body(&Bytes::from_static(br#"{"name":"x","extra":1}"#)).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("x"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  dune ".into())), Some("dune".into()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_numeric_resolution() {
        assert_eq!(Numeric::resolve(None, 70.0, "bad").unwrap(), 70.0);
        assert_eq!(Numeric::resolve(Some(&Numeric::Number(55.5)), 70.0, "bad").unwrap(), 55.5);
        assert_eq!(Numeric::resolve(Some(&Numeric::Text(" 80 ".into())), 70.0, "bad").unwrap(), 80.0);
        assert!(Numeric::resolve(Some(&Numeric::Text("lots".into())), 70.0, "bad").is_err());
    }
}
