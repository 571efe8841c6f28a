//! FortiManager JSON-RPC Client for Terraform Provider

use crate::config::{Credentials, ResolvedConfig, WorkspaceMode};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// FortiManager status code for "Object does not exist"
const CODE_NOT_FOUND: i64 = -3;
/// FortiManager status code for "No permission for the resource"
const CODE_NO_PERMISSION: i64 = -11;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("API error {code} on {url}: {message}")]
    Api {
        code: i64,
        message: String,
        url: String,
    },
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    #[error("No permission for {0}")]
    PermissionDenied(String),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Invalid CA bundle {path}: {message}")]
    CaBundle { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// JSON-RPC request envelope
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    id: u64,
    method: &'a str,
    params: Vec<JsonRpcParam<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
    verbose: u8,
}

#[derive(Debug, Serialize)]
struct JsonRpcParam<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Vec<JsonRpcResult>,
    #[serde(default)]
    session: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResult {
    status: JsonRpcStatus,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcStatus {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Location of a configuration object
///
/// Tables address entries as `{collection}/{mkey}`; singletons have no mkey
/// and live directly at the collection URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPath {
    pub collection: String,
    pub mkey: Option<String>,
}

impl ObjectPath {
    pub fn table(collection: impl Into<String>, mkey: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            mkey: Some(mkey.into()),
        }
    }

    pub fn singleton(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            mkey: None,
        }
    }

    /// URL of the object itself
    pub fn object_url(&self) -> String {
        match &self.mkey {
            Some(mkey) => format!("{}/{}", self.collection, escape_mkey(mkey)),
            None => self.collection.clone(),
        }
    }
}

/// FortiManager expects `/` inside a key to be escaped
fn escape_mkey(mkey: &str) -> String {
    mkey.replace('/', "\\/")
}

/// FortiManager API Client
#[derive(Clone)]
pub struct FortiManagerClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    session: Option<String>,
    adom: String,
    workspace_mode: WorkspaceMode,
    retries: u32,
    next_id: Arc<AtomicU64>,
}

impl FortiManagerClient {
    /// Create an unauthenticated client with default settings
    #[cfg(test)]
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, false, None)
    }

    /// Create a client from resolved provider settings, logging in if needed
    pub async fn connect(config: &ResolvedConfig) -> Result<Self> {
        let mut client = Self::build(
            &config.hostname,
            config.insecure,
            config.cabundlefile.as_deref(),
        )?
        .with_adom(&config.adom)
        .with_workspace_mode(config.workspace_mode)
        .with_retries(config.retries);

        match &config.credentials {
            Credentials::Token(token) => client = client.with_token(token),
            Credentials::Session { username, password } => {
                client.login(username, password).await?;
            }
        }

        Ok(client)
    }

    fn build(base_url: &str, insecure: bool, cabundlefile: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(insecure);

        if let Some(path) = cabundlefile {
            let pem = std::fs::read(path).map_err(|e| ClientError::CaBundle {
                path: path.to_string(),
                message: e.to_string(),
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| ClientError::CaBundle {
                path: path.to_string(),
                message: e.to_string(),
            })?;
            builder = builder.add_root_certificate(cert);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            session: None,
            adom: "root".to_string(),
            workspace_mode: WorkspaceMode::Disable,
            retries: 1,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Set API token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_adom(mut self, adom: &str) -> Self {
        self.adom = adom.to_string();
        self
    }

    pub fn with_workspace_mode(mut self, mode: WorkspaceMode) -> Self {
        self.workspace_mode = mode;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// Open a session with username and password
    pub async fn login(&mut self, username: &str, password: &str) -> Result<String> {
        let data = serde_json::json!({ "user": username, "passwd": password });
        let response = self.send("exec", "/sys/login/user", Some(data)).await?;

        let status = first_result(&response, "/sys/login/user")?;
        if status.status.code != 0 {
            return Err(ClientError::AuthFailed(status.status.message.clone()));
        }

        let session = response
            .session
            .ok_or_else(|| ClientError::AuthFailed("no session returned".to_string()))?;
        tracing::debug!("Opened FortiManager session as {}", username);
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Close the session, if one is open
    pub async fn logout(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }
        self.call("exec", "/sys/logout", None).await?;
        self.session = None;
        Ok(())
    }

    /// Build headers for requests
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    /// POST one JSON-RPC envelope and decode the reply
    async fn send(&self, method: &str, url: &str, data: Option<Value>) -> Result<JsonRpcResponse> {
        let request = JsonRpcRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: vec![JsonRpcParam { url, data }],
            session: self.session.as_deref(),
            verbose: 1,
        };
        let endpoint = format!("{}/jsonrpc", self.base_url);

        tracing::debug!(method, url, id = request.id, "FortiManager request");

        let mut attempt = 1;
        let response = loop {
            match self
                .client
                .post(&endpoint)
                .headers(self.headers())
                .json(&request)
                .send()
                .await
            {
                Ok(response) => break response,
                Err(e) if attempt < self.retries && (e.is_connect() || e.is_timeout()) => {
                    tracing::warn!("Request to {} failed (attempt {}): {}", url, attempt, e);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Malformed(e.to_string()))
    }

    /// Run one JSON-RPC method and return the `data` of the first result
    pub async fn call(&self, method: &str, url: &str, data: Option<Value>) -> Result<Value> {
        let response = self.send(method, url, data).await?;
        let result = first_result(&response, url)?;
        let result_url = result.url.clone().unwrap_or_else(|| url.to_string());

        match result.status.code {
            0 => Ok(result.data.clone().unwrap_or(Value::Null)),
            CODE_NOT_FOUND => Err(ClientError::NotFound(result_url)),
            CODE_NO_PERMISSION => Err(ClientError::PermissionDenied(result_url)),
            code => Err(ClientError::Api {
                code,
                message: result.status.message.clone(),
                url: result_url,
            }),
        }
    }

    /// Write call, wrapped in an ADOM workspace lock when enabled
    async fn write(&self, method: &str, url: &str, data: Option<Value>) -> Result<Value> {
        if self.workspace_mode == WorkspaceMode::Disable {
            return self.call(method, url, data).await;
        }

        let workspace = format!("/dvmdb/adom/{}/workspace", self.adom);
        self.call("exec", &format!("{}/lock", workspace), None).await?;

        let result = self.call(method, url, data).await;
        let commit = match &result {
            Ok(_) => self
                .call("exec", &format!("{}/commit", workspace), None)
                .await
                .map(|_| ()),
            Err(_) => Ok(()),
        };
        let unlock = self.call("exec", &format!("{}/unlock", workspace), None).await;
        if let Err(e) = &unlock {
            tracing::warn!("Failed to unlock ADOM {}: {}", self.adom, e);
        }

        let value = result?;
        commit?;
        unlock?;
        Ok(value)
    }

    // ========================================================================
    // Object operations
    // ========================================================================

    /// Read an object; `None` when it no longer exists
    pub async fn read_object(&self, path: &ObjectPath) -> Result<Option<Map<String, Value>>> {
        match self.call("get", &path.object_url(), None).await {
            Ok(Value::Object(object)) => Ok(Some(object)),
            Ok(Value::Array(mut items)) if items.len() == 1 => match items.remove(0) {
                Value::Object(object) => Ok(Some(object)),
                other => Err(ClientError::Malformed(format!(
                    "expected object, got {}",
                    other
                ))),
            },
            Ok(Value::Null) | Err(ClientError::NotFound(_)) => Ok(None),
            Ok(other) => Err(ClientError::Malformed(format!(
                "expected object, got {}",
                other
            ))),
            Err(e) => Err(e),
        }
    }

    /// Create an object: `add` into a table, `update` a singleton
    pub async fn create_object(&self, path: &ObjectPath, payload: Map<String, Value>) -> Result<Value> {
        match path.mkey {
            Some(_) => {
                self.write("add", &path.collection, Some(Value::Object(payload)))
                    .await
            }
            None => {
                self.write("update", &path.collection, Some(Value::Object(payload)))
                    .await
            }
        }
    }

    /// Update an existing object in place
    pub async fn update_object(&self, path: &ObjectPath, payload: Map<String, Value>) -> Result<Value> {
        self.write("update", &path.object_url(), Some(Value::Object(payload)))
            .await
    }

    /// Delete an object
    pub async fn delete_object(&self, path: &ObjectPath) -> Result<()> {
        self.write("delete", &path.object_url(), None).await.map(|_| ())
    }
}

fn first_result<'a>(response: &'a JsonRpcResponse, url: &str) -> Result<&'a JsonRpcResult> {
    response
        .result
        .first()
        .ok_or_else(|| ClientError::Malformed(format!("empty result for {}", url)))
}
