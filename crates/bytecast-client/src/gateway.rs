//! Authenticated transport: bearer attachment, error translation, and the
//! single-flight refresh-on-401 protocol.
//!
//! Auth endpoints other than refresh pass through untouched; they are the
//! calls that establish a session in the first place. Everything else gets
//! the current token attached and, on a 401, one transparent refresh-and-retry
//! attempt. The refresh flag is process-wide on purpose: every concurrent
//! caller sees it, so at most one refresh request is ever in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use bytecast_api_models::{ApiErrorBody, AuthResponse, LoginRequest, RegisterRequest};

use crate::error::{ClientError, ClientResult, ConflictField};
use crate::token::TokenStore;

const API_PREFIX: &str = "/api/v1";
const HEADER_REQUEST_ID: &str = "x-request-id";
const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Gateway wrapping every request the sync core makes.
pub struct AuthGateway {
    client: Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    refresh_in_flight: AtomicBool,
}

impl AuthGateway {
    /// Build a gateway against `base_url` (scheme + host, no trailing path).
    ///
    /// # Errors
    /// Returns a transport error when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<TokenStore>,
    ) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            tokens,
            refresh_in_flight: AtomicBool::new(false),
        })
    }

    /// Register a new account and seed the session with the issued token.
    ///
    /// # Errors
    /// Conflicts surface as [`ClientError::Conflict`] carrying the colliding
    /// field; other failures translate per the usual rules.
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<()> {
        self.establish_session("/auth/register", request).await
    }

    /// Log in and seed the session with the issued token.
    ///
    /// # Errors
    /// Bad credentials surface as [`ClientError::Unauthorized`]; no refresh
    /// is attempted for auth endpoints.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<()> {
        self.establish_session("/auth/login", request).await
    }

    /// Log out. Best-effort on the wire: the local session is cleared even
    /// when the server call fails.
    ///
    /// # Errors
    /// Only storage failures while clearing the local session surface.
    pub async fn logout(&self) -> ClientResult<()> {
        match self
            .dispatch(Method::POST, "/auth/logout", Some(&serde_json::json!({})), false)
            .await
        {
            Ok(response) if !response.status().is_success() => {
                debug!(status = %response.status(), "server rejected logout; clearing local session anyway");
            }
            Err(error) => {
                debug!(%error, "logout request failed; clearing local session anyway");
            }
            Ok(_) => {}
        }
        self.tokens.clear_token()
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    /// Translated API errors, or a transport/decode failure.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self
            .send_authenticated(Method::GET, path, None::<&()>, &[])
            .await?;
        Ok(response.json::<T>().await?)
    }

    /// GET `path` with query parameters and decode the JSON body.
    ///
    /// # Errors
    /// Translated API errors, or a transport/decode failure.
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let response = self
            .send_authenticated(Method::GET, path, None::<&()>, query)
            .await?;
        Ok(response.json::<T>().await?)
    }

    /// POST `body` to `path` and decode the JSON response.
    ///
    /// # Errors
    /// Translated API errors, or a transport/decode failure.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .send_authenticated(Method::POST, path, Some(body), &[])
            .await?;
        Ok(response.json::<T>().await?)
    }

    /// POST `body` to `path`, discarding any response body.
    ///
    /// # Errors
    /// Translated API errors, or a transport failure.
    pub async fn post_unit<B: Serialize + Sync>(&self, path: &str, body: &B) -> ClientResult<()> {
        self.send_authenticated(Method::POST, path, Some(body), &[])
            .await
            .map(|_| ())
    }

    /// PUT `body` to `path` and decode the JSON response.
    ///
    /// # Errors
    /// Translated API errors, or a transport/decode failure.
    pub async fn put_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .send_authenticated(Method::PUT, path, Some(body), &[])
            .await?;
        Ok(response.json::<T>().await?)
    }

    /// DELETE `path`, discarding any response body.
    ///
    /// # Errors
    /// Translated API errors, or a transport failure.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send_authenticated(Method::DELETE, path, None::<&()>, &[])
            .await
            .map(|_| ())
    }

    /// Auth calls that issue a token: passthrough (no bearer, no 401
    /// handling), then seed the token store on success.
    async fn establish_session<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<()> {
        let response = self.dispatch(Method::POST, path, Some(body), false).await?;
        let response = Self::check(response).await?;
        let auth: AuthResponse = response.json().await?;
        self.tokens.set_token(&auth.access_token)
    }

    async fn send_authenticated<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> ClientResult<reqwest::Response> {
        let response = self
            .dispatch_with_query(method.clone(), path, body, true, query)
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let original = Self::translate(response).await;
            return self
                .recover_unauthorized(method, path, body, query, original)
                .await;
        }
        Self::check(response).await
    }

    /// One refresh-and-retry attempt for a request that just saw a 401.
    ///
    /// Exactly one caller wins the flag and performs the refresh; everyone
    /// else retries immediately with whatever token is current rather than
    /// queueing behind the in-flight refresh.
    async fn recover_unauthorized<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &[(&str, &str)],
        original: ClientError,
    ) -> ClientResult<reqwest::Response> {
        if self
            .refresh_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let refreshed = self.refresh().await;
            self.refresh_in_flight.store(false, Ordering::SeqCst);
            match refreshed {
                Ok(()) => {}
                Err(ClientError::Unauthorized { .. }) => {
                    // Terminal: the session was already cleared by refresh().
                    return Err(original);
                }
                Err(other) => return Err(other),
            }
        } else {
            debug!(path, "refresh already in flight; retrying with current token");
        }
        let retry = self
            .dispatch_with_query(method, path, body, true, query)
            .await?;
        Self::check(retry).await
    }

    /// Call the refresh endpoint, authenticated with the current token when
    /// present. A 401 here is terminal and clears the session.
    async fn refresh(&self) -> ClientResult<()> {
        debug!("refreshing bearer token");
        let response = self
            .dispatch(Method::POST, "/auth/refresh", Some(&serde_json::json!({})), true)
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let error = Self::translate(response).await;
            warn!("token refresh rejected; clearing session");
            self.tokens.clear_token()?;
            return Err(error);
        }
        let response = Self::check(response).await?;
        let auth: AuthResponse = response.json().await?;
        self.tokens.set_token(&auth.access_token)
    }

    async fn dispatch<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        attach_token: bool,
    ) -> ClientResult<reqwest::Response> {
        self.dispatch_with_query(method, path, body, attach_token, &[])
            .await
    }

    async fn dispatch_with_query<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        attach_token: bool,
        query: &[(&str, &str)],
    ) -> ClientResult<reqwest::Response> {
        let url = format!("{}{API_PREFIX}{path}", self.base_url);
        let mut request = self
            .client
            .request(method, url)
            .header(HEADER_REQUEST_ID, Uuid::new_v4().to_string());
        if attach_token {
            if let Some(token) = self.tokens.token() {
                request = request.bearer_auth(token);
            }
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::translate(response).await)
        }
    }

    /// Translate an error response into a structured error, preferring the
    /// body's `message` field, then the legacy `error` field, else a generic
    /// message.
    async fn translate(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let bytes = response.bytes().await.unwrap_or_default();
        let body = serde_json::from_slice::<ApiErrorBody>(&bytes).unwrap_or_default();
        let message = body
            .resolve_message()
            .unwrap_or(GENERIC_ERROR_MESSAGE)
            .to_string();
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized { message },
            StatusCode::CONFLICT => ClientError::Conflict {
                field: conflict_field(&message),
                message,
            },
            _ => ClientError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Attribute a conflict message to the field it names.
fn conflict_field(message: &str) -> ConflictField {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("email") {
        ConflictField::Email
    } else if lowered.contains("username") {
        ConflictField::Username
    } else {
        ConflictField::Unknown
    }
}
