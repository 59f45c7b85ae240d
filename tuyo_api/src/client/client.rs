//! HTTP client shared by every gateway.
//!
//! One [`TuyoClient`] talks to the three services (accounts, cards,
//! realtime). The session token, once known, travels as a `token` cookie,
//! the same way the browser front end sends it.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Method, Response};
use tokio::sync::Mutex;

use crate::config::{ServiceEndpoints, TuyoConfig};
use crate::error::{handle_api_error, TuyoError};
use crate::types::error_types::ApiErrorBody;

/// Main client to interact with the TUYO gateways.
#[derive(Clone)]
pub struct TuyoClient {
    /* ───────────────────────── Public configuration ───────────────────────── */
    pub endpoints: ServiceEndpoints,

    /* ───────────────────────── Internal plumbing ──────────────────────────── */
    pub http: Client,
    pub token: Arc<Mutex<Option<String>>>,
}

impl Debug for TuyoClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TuyoClient")
            .field("endpoints", &self.endpoints)
            .field("http", &"reqwest::Client")
            .field("token", &"<hidden>")
            .finish()
    }
}

const USER_AGENT: &str = concat!("tuyo_api/", env!("CARGO_PKG_VERSION"));

impl TuyoClient {
    /// Construct a new [`TuyoClient`] from the service endpoints and the
    /// per-request timeout.
    pub fn new(endpoints: ServiceEndpoints, timeout: Duration) -> Result<Self, TuyoError> {
        let http = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .use_rustls_tls()
            .build()?;

        Ok(Self {
            endpoints,
            http,
            token: Arc::new(Mutex::new(None)),
        })
    }

    pub fn from_config(config: &TuyoConfig) -> Result<Self, TuyoError> {
        config.validate()?;
        Self::new(config.endpoints.clone(), config.request_timeout)
    }

    /* ─────────────────────────── Runtime helpers ─────────────────────────── */

    /// Manually set or clear the session token.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.lock().await = token;
    }

    pub async fn current_token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    /// Build a `reqwest::RequestBuilder` carrying the session cookie when
    /// one is set.
    async fn authed_request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let token_opt = self.token.lock().await.clone();

        tracing::debug!(method = method.as_str(), url, "outbound request");

        let mut req = self
            .http
            .request(method, url)
            .header("Accept", "application/json, text/plain, */*")
            .header("Cache-Control", "no-cache");

        if let Some(t) = token_opt {
            req = req.header("Cookie", format!("token={t}"));
        }

        req
    }

    /* ───────────── Convenience wrappers around HTTP verbs ───────────── */

    pub async fn authed_get(&self, url: &str) -> Result<Response, TuyoError> {
        self.authed_request(Method::GET, url)
            .await
            .send()
            .await
            .map_err(TuyoError::ReqwestError)
    }

    pub async fn authed_post<T: serde::Serialize>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, TuyoError> {
        self.authed_request(Method::POST, url)
            .await
            .json(body)
            .send()
            .await
            .map_err(TuyoError::ReqwestError)
    }

    pub async fn authed_delete(&self, url: &str) -> Result<Response, TuyoError> {
        self.authed_request(Method::DELETE, url)
            .await
            .send()
            .await
            .map_err(TuyoError::ReqwestError)
    }
}

/// Parse the body as JSON **iff** the response status is success.
///
/// On failure the body is read once more as an [`ApiErrorBody`] so that a
/// server-supplied `message` (flat or nested under `error`) survives.
pub async fn parse_json_if_ok<T: serde::de::DeserializeOwned>(
    resp: Response,
) -> Result<T, TuyoError> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(TuyoError::ReqwestError)?;

    if !status.is_success() {
        let body = serde_json::from_slice::<ApiErrorBody>(&bytes).unwrap_or_default();
        return Err(handle_api_error(status.as_u16(), body, &bytes));
    }

    serde_json::from_slice::<T>(&bytes).map_err(TuyoError::SerdeError)
}

/// Check the status only. A 2xx is success whatever the body holds; the body
/// comes back as loose JSON (`Null` when empty or not JSON) for callers that
/// want to peek at it. Non-2xx is handled like [`parse_json_if_ok`].
pub async fn json_if_success(resp: Response) -> Result<serde_json::Value, TuyoError> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(TuyoError::ReqwestError)?;

    if !status.is_success() {
        let body = serde_json::from_slice::<ApiErrorBody>(&bytes).unwrap_or_default();
        return Err(handle_api_error(status.as_u16(), body, &bytes));
    }

    Ok(serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
}
