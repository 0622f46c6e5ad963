//! HTTP client wrapper implementing the request/response interceptor
//! contract.
//!
//! Every outgoing request reads the session token synchronously and attaches
//! it as a bearer credential. A 401 response forces a logout and a single
//! redirect to the login view, then the error is still re-raised so the
//! caller can react too.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401 from the backend; the session has already been ended.
    #[error("unauthorized")]
    Unauthorized,
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Shared API client. Cloning is cheap; all clones go through the same
/// session and redirect hook.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
    on_unauthorized: Arc<dyn Fn() + Send + Sync>,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: Session,
        on_unauthorized: Arc<dyn Fn() + Send + Sync>,
    ) -> Self {
        Self { http, base_url: base_url.into(), session, on_unauthorized }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!("401 from backend: token invalid or expired, ending session");
            if let Err(e) = self.session.logout().await {
                tracing::warn!(error = %e, "forced logout after 401 reported an error");
            }
            (self.on_unauthorized)();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET {base}{path}`, decoding a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]; 401 handling has already run when `Unauthorized`
    /// is returned.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.send(self.request(reqwest::Method::GET, path)).await?;
        Self::decode(resp).await
    }

    /// `POST {base}{path}` with a JSON body, decoding a JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .send(self.request(reqwest::Method::POST, path).json(body))
            .await?;
        Self::decode(resp).await
    }

    /// `PUT {base}{path}` with a JSON body, decoding a JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .send(self.request(reqwest::Method::PUT, path).json(body))
            .await?;
        Self::decode(resp).await
    }

    /// `PATCH {base}{path}` with a JSON body, decoding a JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn patch<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .send(self.request(reqwest::Method::PATCH, path).json(body))
            .await?;
        Self::decode(resp).await
    }

    /// `DELETE {base}{path}`; the response body is ignored.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.request(reqwest::Method::DELETE, path)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
