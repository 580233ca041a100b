//! HTTP executors: how a payload actually reaches the remote API.
//!
//! The runner only sees `execute(payload) -> result`; everything here, from
//! multipart streaming to the large-file route, is executor-internal.

use std::path::Path;

use async_trait::async_trait;
use mediabulk_core::{ItemError, OperationExecutor};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder};
use serde_json::Value;

use crate::config::ApiConfig;

/// Local files above this size go through the chunk-friendly upload route.
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

const REMOTE_SCHEMES: [&str; 6] = ["http://", "https://", "s3://", "gs://", "ftp://", "data:"];

/// Asset references the API fetches itself, as opposed to local file paths we
/// must stream.
fn is_remote_ref(file: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|s| file.starts_with(s))
}

fn payload_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str, ItemError> {
    payload[key]
        .as_str()
        .ok_or_else(|| ItemError::Transform(format!("payload has no '{key}' string")))
}

async fn send(request: RequestBuilder) -> Result<Value, ItemError> {
    let response = request
        .send()
        .await
        .map_err(|e| ItemError::execution("request", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ItemError::Execution {
            kind: "http_status".to_string(),
            message: format!("{status}: {body}"),
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| ItemError::execution("response_body", e))
}

fn authed(builder: RequestBuilder, config: &ApiConfig) -> RequestBuilder {
    match (&config.api_key, &config.api_secret) {
        (Some(key), secret) => builder.basic_auth(key, secret.as_deref()),
        _ => builder,
    }
}

/// Uploads new assets via the upload API.
pub struct UploadExecutor {
    http: Client,
    config: ApiConfig,
}

impl UploadExecutor {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    async fn upload_local(&self, path: &str, options: &Value) -> Result<Value, ItemError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| ItemError::execution("local_file", format!("{path}: {e}")))?
            .len();
        let route = if size > LARGE_FILE_THRESHOLD {
            "upload_large"
        } else {
            "upload"
        };
        tracing::debug!(path, size, route, "streaming local file");

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ItemError::execution("local_file", format!("{path}: {e}")))?;
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "asset".to_string());

        let form = Form::new()
            .part("file", Part::stream(Body::from(file)).file_name(file_name))
            .text("options", options.to_string());

        let request = authed(
            self.http.post(self.config.endpoint(route)).multipart(form),
            &self.config,
        );
        send(request).await
    }
}

#[async_trait]
impl OperationExecutor for UploadExecutor {
    async fn execute(&self, payload: &Value) -> Result<Value, ItemError> {
        let file = payload_str(payload, "file")?;
        let options = &payload["options"];

        if is_remote_ref(file) {
            // The API fetches remote references itself; one JSON call.
            let request = authed(
                self.http
                    .post(self.config.endpoint("upload"))
                    .json(&serde_json::json!({ "file": file, "options": options })),
                &self.config,
            );
            send(request).await
        } else {
            self.upload_local(file, options).await
        }
    }
}

/// Updates existing assets via the explicit API.
pub struct UpdateExecutor {
    http: Client,
    config: ApiConfig,
}

impl UpdateExecutor {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl OperationExecutor for UpdateExecutor {
    async fn execute(&self, payload: &Value) -> Result<Value, ItemError> {
        let public_id = payload_str(payload, "public_id")?;
        let request = authed(
            self.http
                .post(self.config.endpoint("explicit"))
                .json(&serde_json::json!({
                    "public_id": public_id,
                    "options": payload["options"],
                })),
            &self.config,
        );
        send(request).await
    }
}
