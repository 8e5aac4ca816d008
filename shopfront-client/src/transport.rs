//! HTTP transport: one configured client, bearer injection, error
//! normalization.
//!
//! Every failure is normalized into [`ApiError`] before leaving this
//! module. A 401 anywhere triggers the session-expiry path exactly once,
//! unless the request opted out - auth endpoints expect 401/400 as
//! ordinary validation responses, not session expiry.

use crate::session::Session;
use shopfront_core::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Default request timeout; a timed-out request surfaces as a network
/// error, same as a connection failure.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TransportInitError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Per-request flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Suppress the automatic 401 -> logout side effect.
    pub skip_session_expiry: bool,
}

impl RequestOptions {
    pub fn auth_endpoint() -> Self {
        Self {
            skip_session_expiry: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

const FALLBACK_SERVER_MESSAGE: &str = "An error occurred";

/// The single configured HTTP client for all storefront services.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl Transport {
    /// `base_url` includes the reverse-proxy path prefix, e.g.
    /// `http://localhost:3000/api/v1`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Session,
    ) -> Result<Self, TransportInitError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.http.get(self.url(path));
        self.dispatch(request, RequestOptions::default()).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.http.get(self.url(path)).query(query);
        self.dispatch(request, RequestOptions::default()).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post_with(path, body, RequestOptions::default()).await
    }

    pub async fn post_with<T, B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.post(self.url(path)).json(body);
        self.dispatch(request, options).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.put(self.url(path)).json(body);
        self.dispatch(request, RequestOptions::default()).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.http.patch(self.url(path)).json(body);
        self.dispatch(request, RequestOptions::default()).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.http.delete(self.url(path));
        self.dispatch(request, RequestOptions::default()).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        mut request: reqwest::RequestBuilder,
        options: RequestOptions,
    ) -> ApiResult<T> {
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }

        // Connection failures and timeouts share one path: no response.
        let response = request.send().await.map_err(|_| ApiError::Network)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|_| ApiError::Network)?;

        if status.is_success() {
            if bytes.is_empty() {
                return serde_json::from_value(Value::Null)
                    .map_err(|e| ApiError::Decode(e.to_string()));
            }
            return serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| FALLBACK_SERVER_MESSAGE.to_string());

        Err(match status.as_u16() {
            401 => {
                if options.skip_session_expiry {
                    // Auth endpoints: an ordinary rejected credential.
                    ApiError::Validation {
                        status: 401,
                        message,
                    }
                } else {
                    self.session.expire();
                    ApiError::SessionExpired
                }
            }
            409 => ApiError::Conflict { message },
            status @ 400..=499 => ApiError::Validation { status, message },
            status => ApiError::Http { status, message },
        })
    }
}
