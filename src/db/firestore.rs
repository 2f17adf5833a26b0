use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Map, Number, Value};
use std::time::Duration;

use crate::config::FirestoreConfig;
use crate::db::{DocumentStore, Fields, WriteOp};
use crate::error::{AppError, Result};

const API_TIMEOUT: Duration = Duration::from_secs(30);
const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
/// The emulator accepts this bearer token as an admin credential.
const EMULATOR_TOKEN: &str = "owner";

/// Firestore backend speaking the v1 REST API.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    database: String,
    token: Option<String>,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> Result<Self> {
        let (base_url, token) = match &config.emulator_host {
            Some(host) => (
                format!("http://{}/v1", host.trim_end_matches('/')),
                Some(
                    config
                        .access_token
                        .clone()
                        .unwrap_or_else(|| EMULATOR_TOKEN.to_string()),
                ),
            ),
            None => (FIRESTORE_API.to_string(), config.access_token.clone()),
        };

        Self::with_base_url(&base_url, config, token)
    }

    pub fn with_base_url(
        base_url: &str,
        config: &FirestoreConfig,
        token: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(API_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            database: format!(
                "projects/{}/databases/{}",
                config.project_id, config.database_id
            ),
            token,
        })
    }

    fn document_name(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/documents/{}/{}", self.database, collection, doc_id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn encode_write(
        &self,
        collection: &str,
        doc_id: &str,
        fields: &Fields,
        server_timestamps: &[&str],
        must_exist: bool,
    ) -> Value {
        let mut write = json!({
            "update": {
                "name": self.document_name(collection, doc_id),
                "fields": encode_fields(fields),
            },
            "updateMask": {
                "fieldPaths": fields.keys().map(|k| field_path(k)).collect::<Vec<_>>(),
            },
        });

        if !server_timestamps.is_empty() {
            write["updateTransforms"] = server_timestamps
                .iter()
                .map(|name| {
                    json!({
                        "fieldPath": field_path(name),
                        "setToServerValue": "REQUEST_TIME",
                    })
                })
                .collect();
        }

        if must_exist {
            write["currentDocument"] = json!({ "exists": true });
        }

        write
    }

    async fn send_commit(&self, writes: Vec<Value>) -> Result<Response> {
        let url = format!("{}/{}/documents:commit", self.base_url, self.database);

        let response = self
            .authorize(self.client.post(&url))
            .json(&json!({ "writes": writes }))
            .send()
            .await?;

        Ok(response)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn commit(&self, writes: Vec<WriteOp>) -> Result<()> {
        let encoded = writes
            .iter()
            .map(|w| self.encode_write(w.collection, &w.doc_id, &w.fields, &w.server_timestamps, false))
            .collect();

        let response = self.send_commit(encoded).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::Storage(format!(
                "Firestore commit error ({}): {}",
                status, error_text
            )));
        }

        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<()> {
        let write = self.encode_write(collection, doc_id, &fields, server_timestamps, true);
        let response = self.send_commit(vec![write]).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "No document to update: {}/{}",
                collection, doc_id
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::Storage(format!(
                "Firestore update error ({}): {}",
                status, error_text
            )));
        }

        Ok(())
    }

    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Fields>> {
        let url = format!("{}/{}", self.base_url, self.document_name(collection, doc_id));

        let response = self.authorize(self.client.get(&url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::Storage(format!(
                "Firestore get error ({}): {}",
                status, error_text
            )));
        }

        let document: Value = response.json().await?;
        match document.get("fields") {
            Some(fields) => decode_fields(fields).map(Some),
            None => Ok(Some(Fields::new())),
        }
    }

    fn backend_name(&self) -> &'static str {
        "firestore"
    }
}

/// Quotes a top-level field name for use in a field path when it is not a
/// plain identifier.
fn field_path(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(u)) => json!({ "integerValue": u.to_string() }),
            _ => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_fields(fields: &Value) -> Result<Fields> {
    let map = fields
        .as_object()
        .ok_or_else(|| AppError::Storage(format!("Malformed Firestore fields: {}", fields)))?;

    map.iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

fn decode_value(value: &Value) -> Result<Value> {
    let malformed = || AppError::Storage(format!("Unsupported Firestore value: {}", value));
    let (kind, inner) = value
        .as_object()
        .and_then(|m| m.iter().next())
        .ok_or_else(malformed)?;

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().map_err(|_| malformed())?,
                other => other.as_i64().ok_or_else(malformed)?,
            };
            Value::Number(parsed.into())
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect::<Result<Vec<_>>>())
                .transpose()?
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .map(decode_fields)
                .transpose()?
                .unwrap_or_else(Map::new),
        ),
        _ => return Err(malformed()),
    };

    Ok(decoded)
}
