//! Request extractors shared by the seeding endpoints.
//!
//! [`RequestParams`] folds the query string, the seed-key header and a JSON
//! or form-encoded body into one lookup. [`Authorized`] wraps it and rejects the request
//! unless the seed key matches the configured one.

use axum::{
    async_trait,
    body::{to_bytes, Bytes},
    extract::{FromRequest, Query, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::Value;

use crate::{
    db::Fields,
    error::{AppError, Result},
    state::AppState,
};

pub const KEY_PARAM: &str = "key";
pub const KEY_HEADER: &str = "x-seed-key";

const MAX_BODY_BYTES: usize = 1024 * 1024;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    query: Fields,
    header_key: Option<String>,
    body: Fields,
}

impl RequestParams {
    pub fn new(query: Fields, header_key: Option<String>, body: Fields) -> Self {
        Self {
            query,
            header_key,
            body,
        }
    }

    /// Query string first, then body.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.query.get(name).or_else(|| self.body.get(name))
    }

    /// Body first, then query string.
    pub fn body_or_query(&self, name: &str) -> Option<&Value> {
        self.body.get(name).or_else(|| self.query.get(name))
    }

    /// First non-empty of the `key` query parameter, the `x-seed-key` header
    /// and the `key` body field.
    pub fn seed_key(&self) -> Option<&str> {
        fn non_empty(value: Option<&Value>) -> Option<&str> {
            match value {
                Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
                _ => None,
            }
        }

        non_empty(self.query.get(KEY_PARAM))
            .or(self.header_key.as_deref().filter(|key| !key.is_empty()))
            .or_else(|| non_empty(self.body.get(KEY_PARAM)))
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, _state: &S) -> Result<Self> {
        // Nothing in here rejects the request: a malformed query or body is
        // treated as empty and the seed-key check decides.
        let query = match Query::<Vec<(String, String)>>::try_from_uri(req.uri()) {
            Ok(Query(pairs)) => string_fields(pairs),
            Err(e) => {
                tracing::debug!("Ignoring malformed query string: {}", e);
                Fields::new()
            }
        };

        let header_key = req
            .headers()
            .get(KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim_start().starts_with(FORM_CONTENT_TYPE))
            .unwrap_or(false);

        let body = match to_bytes(req.into_body(), MAX_BODY_BYTES).await {
            Ok(bytes) if is_form => form_body(&bytes),
            Ok(bytes) => json_body(&bytes),
            Err(e) => {
                tracing::debug!("Ignoring unreadable request body: {}", e);
                Fields::new()
            }
        };

        Ok(Self::new(query, header_key, body))
    }
}

fn string_fields(pairs: Vec<(String, String)>) -> Fields {
    pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

fn form_body(bytes: &Bytes) -> Fields {
    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes) {
        Ok(pairs) => string_fields(pairs),
        Err(e) => {
            tracing::debug!("Ignoring malformed form body: {}", e);
            Fields::new()
        }
    }
}

/// Anything that is not a JSON object counts as an empty body.
fn json_body(bytes: &Bytes) -> Fields {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Fields::new(),
        Err(e) => {
            if !bytes.is_empty() {
                tracing::debug!("Ignoring non-JSON request body: {}", e);
            }
            Fields::new()
        }
    }
}

/// Request parameters of a caller that presented the configured seed key.
#[derive(Debug, Clone)]
pub struct Authorized(pub RequestParams);

#[async_trait]
impl FromRequest<AppState> for Authorized {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let params = RequestParams::from_request(req, state).await?;

        match params.seed_key() {
            Some(key) if key == state.config.seed_key => Ok(Self(params)),
            Some(_) => Err(AppError::Unauthorized("Invalid seed key".to_string())),
            None => Err(AppError::Unauthorized("Missing seed key".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_seed_key_precedence() {
        let params = RequestParams::new(
            fields(json!({ "key": "from-query" })),
            Some("from-header".into()),
            fields(json!({ "key": "from-body" })),
        );
        assert_eq!(params.seed_key(), Some("from-query"));

        let params = RequestParams::new(
            fields(json!({ "key": "" })),
            Some("from-header".into()),
            fields(json!({ "key": "from-body" })),
        );
        assert_eq!(params.seed_key(), Some("from-header"));

        let params = RequestParams::new(
            Fields::new(),
            Some(String::new()),
            fields(json!({ "key": "from-body" })),
        );
        assert_eq!(params.seed_key(), Some("from-body"));
    }

    #[test]
    fn test_seed_key_ignores_non_strings() {
        let params = RequestParams::new(Fields::new(), None, fields(json!({ "key": 1234 })));
        assert_eq!(params.seed_key(), None);
    }

    #[test]
    fn test_lookup_order() {
        let params = RequestParams::new(
            fields(json!({ "users": "5", "id": "from-query" })),
            None,
            fields(json!({ "users": 9, "id": "from-body", "artists": 2 })),
        );

        assert_eq!(params.get("users"), Some(&json!("5")));
        assert_eq!(params.get("artists"), Some(&json!(2)));
        assert_eq!(params.body_or_query("id"), Some(&json!("from-body")));
        assert_eq!(params.body_or_query("missing"), None);
    }

    #[test]
    fn test_form_body_values_are_strings() {
        let body = form_body(&Bytes::from_static(
            b"key=abc&users=3&updates=%7B%22bio%22%3A%22hi%22%7D",
        ));
        assert_eq!(
            Value::Object(body),
            json!({
                "key": "abc",
                "users": "3",
                "updates": "{\"bio\":\"hi\"}"
            })
        );
    }

    #[test]
    fn test_json_body_ignores_non_objects() {
        assert!(json_body(&Bytes::from_static(b"[1, 2]")).is_empty());
        assert!(json_body(&Bytes::from_static(b"not json")).is_empty());
        assert!(json_body(&Bytes::new()).is_empty());
    }
}
