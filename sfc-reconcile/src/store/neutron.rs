//! Remote store backed by the Neutron v2.0 API and its networking-sfc extension.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::error::{Result, StoreError};
use super::traits::RemoteStore;
use crate::config::CloudConfig;
use crate::resource::ObjectKind;
use crate::state::Object;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// HTTP client for the Neutron API.
pub struct NeutronStore {
    client: Client,
    endpoint: String,
}

impl NeutronStore {
    pub fn new(config: &CloudConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(token)
                .map_err(|e| StoreError::Internal(format!("invalid auth token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTH_TOKEN_HEADER, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn collection_url(&self, kind: ObjectKind) -> String {
        format!("{}{}", self.endpoint, kind.collection_path())
    }

    fn object_url(&self, kind: ObjectKind, id: &str) -> String {
        format!("{}/{}", self.collection_url(kind), id)
    }

    /// List objects of one kind matching a single filter.
    async fn list(&self, kind: ObjectKind, filter: (&str, &str)) -> Result<Vec<Object>> {
        debug!(kind = %kind, filter = filter.0, value = filter.1, "Listing");
        let response = self
            .client
            .get(self.collection_url(kind))
            .query(&[filter])
            .send()
            .await
            .map_err(transport)?;

        let mut body = read_json(response).await?;
        match body.get_mut(kind.plural()).map(Value::take) {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(object) => Ok(object),
                    other => Err(StoreError::Decode(format!(
                        "expected {kind} object, got {other}"
                    ))),
                })
                .collect(),
            _ => Err(StoreError::Decode(format!(
                "response has no '{}' list",
                kind.plural()
            ))),
        }
    }

    fn wrap(kind: ObjectKind, fields: Object) -> Value {
        let mut body = Object::new();
        body.insert(kind.singular().to_string(), Value::Object(fields));
        Value::Object(body)
    }

    fn unwrap_single(kind: ObjectKind, mut body: Value) -> Result<Object> {
        match body.get_mut(kind.singular()).map(Value::take) {
            Some(Value::Object(object)) => Ok(object),
            _ => Err(StoreError::Decode(format!(
                "response has no '{}' object",
                kind.singular()
            ))),
        }
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

/// Check the status and decode the JSON body.
async fn read_json(response: Response) -> Result<Value> {
    let response = check_status(response).await?;
    response
        .json::<Value>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Api {
        status: status.as_u16(),
        message: error_message(&body, status.canonical_reason()),
    })
}

/// Neutron reports failures as `{"NeutronError": {"message": ...}}`.
fn error_message(body: &str, reason: Option<&str>) -> String {
    let neutron = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("NeutronError")?
            .get("message")?
            .as_str()
            .map(str::to_string)
    });
    match neutron {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => reason.unwrap_or("no response body").to_string(),
    }
}

#[async_trait]
impl RemoteStore for NeutronStore {
    async fn get(&self, kind: ObjectKind, name_or_id: &str) -> Result<Option<Object>> {
        if Uuid::parse_str(name_or_id).is_ok() {
            let mut found = self.list(kind, ("id", name_or_id)).await?;
            if let Some(object) = found.pop() {
                return Ok(Some(object));
            }
        }

        let mut found = self.list(kind, ("name", name_or_id)).await?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            n => Err(StoreError::Conflict(format!(
                "{n} {kind} objects match name `{name_or_id}'"
            ))),
        }
    }

    async fn create(&self, kind: ObjectKind, fields: Object) -> Result<Object> {
        debug!(kind = %kind, "POST");
        let response = self
            .client
            .post(self.collection_url(kind))
            .json(&Self::wrap(kind, fields))
            .send()
            .await
            .map_err(transport)?;
        Self::unwrap_single(kind, read_json(response).await?)
    }

    async fn update(&self, kind: ObjectKind, id: &str, fields: Object) -> Result<Object> {
        debug!(kind = %kind, id, "PUT");
        let response = self
            .client
            .put(self.object_url(kind, id))
            .json(&Self::wrap(kind, fields))
            .send()
            .await
            .map_err(transport)?;
        Self::unwrap_single(kind, read_json(response).await?)
    }

    async fn delete(&self, kind: ObjectKind, id: &str) -> Result<()> {
        debug!(kind = %kind, id, "DELETE");
        let response = self
            .client
            .delete(self.object_url(kind, id))
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await?;
        Ok(())
    }
}
