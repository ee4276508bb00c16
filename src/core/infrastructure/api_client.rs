//! Internal HTTP client that handles authentication and automatic ticket refresh.

use crate::{
    auth::application::service::login_service::LoginService,
    core::{
        domain::{
            error::{ApiError, ApiResult},
            model::{
                proxmox_auth::ProxmoxAuth,
                proxmox_connection::{ProxmoxConnection, ProxmoxCredentials},
            },
        },
        infrastructure::config::ClientConfig,
    },
};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// The `{"data": ...}` envelope wrapping every API response.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HTTP client that authenticates and issues read-only calls against the Proxmox API.
///
/// Ticket credentials add `PVEAuthCookie` and `CSRFPreventionToken` to each
/// request; a `401 Unauthorized` triggers one re-login and a single retry.
/// Token credentials add the `Authorization` header and never log in.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    connection: Arc<ProxmoxConnection>,
    auth: Arc<RwLock<Option<ProxmoxAuth>>>,
    config: Arc<ClientConfig>,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl ApiClient {
    /// Creates a new `ApiClient`. The client starts unauthenticated.
    ///
    /// # Errors
    /// Returns `ApiError::Unreachable` if the HTTP client cannot be built.
    pub fn new(connection: ProxmoxConnection, config: ClientConfig) -> ApiResult<Self> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;

        let rate_limiter = config.rate_limit.map(|rl| {
            let quota = Quota::per_second(rl.requests_per_second).allow_burst(rl.burst_size);
            Arc::new(DefaultDirectRateLimiter::direct(quota))
        });

        Ok(Self {
            http_client,
            connection: Arc::new(connection),
            auth: Arc::new(RwLock::new(None)),
            config: Arc::new(config),
            rate_limiter,
        })
    }

    /// Returns a reference to the underlying connection details.
    pub fn connection(&self) -> &ProxmoxConnection {
        &self.connection
    }

    /// Sets the authentication state (used after a successful login).
    pub async fn set_auth(&self, auth: ProxmoxAuth) {
        let mut lock = self.auth.write().await;
        *lock = Some(auth);
    }

    /// Returns the current authentication state, if any.
    pub async fn auth(&self) -> Option<ProxmoxAuth> {
        self.auth.read().await.clone()
    }

    /// Logs in eagerly so that bad credentials fail before any fan-out.
    ///
    /// A no-op for token credentials.
    pub async fn login(&self) -> ApiResult<()> {
        match self.connection.credentials() {
            ProxmoxCredentials::Token(_) => Ok(()),
            ProxmoxCredentials::Password { .. } => self.refresh_auth().await,
        }
    }

    /// Performs an authenticated GET request and unwraps the `data` envelope.
    ///
    /// # Errors
    /// `Unreachable` on transport failures, timeouts and non-success statuses,
    /// `Unauthorized` on 401/403 (after one refresh attempt for tickets),
    /// `MalformedResponse` when the body does not decode into `T`.
    pub async fn get<T>(&self, path: &str) -> ApiResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.ensure_authenticated().await?;

        let mut response = self.send_get(path).await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.uses_ticket() {
            debug!(path, "ticket rejected, logging in again");
            self.refresh_auth().await?;
            response = self.send_get(path).await?;
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(format!("{} on {}", status, path)));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(ApiError::Unreachable(format!(
                "API error ({}) on {}: {}",
                status,
                path,
                error_text.trim()
            )));
        }

        response
            .json::<Envelope<T>>()
            .await
            .map(|envelope| envelope.data)
            .map_err(|e| ApiError::MalformedResponse(format!("{}: {}", path, e)))
    }

    /// Sends a single GET with the current credentials attached.
    async fn send_get(&self, path: &str) -> ApiResult<reqwest::Response> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let url = self.connection.url().api_path(path);
        debug!(url = %url, "GET");

        let mut req_builder = self.http_client.get(&url);

        match self.connection.credentials() {
            ProxmoxCredentials::Token(token) => {
                req_builder = req_builder.header(AUTHORIZATION, token.as_authorization_header());
            }
            ProxmoxCredentials::Password { .. } => {
                let auth_guard = self.auth.read().await;
                if let Some(auth) = auth_guard.as_ref() {
                    req_builder = req_builder.header("Cookie", auth.ticket().as_cookie_header());
                    if let Some(csrf) = auth.csrf_token() {
                        req_builder = req_builder.header("CSRFPreventionToken", csrf.as_str());
                    }
                }
            }
        }

        req_builder
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(format!("HTTP request to {} failed: {}", path, e)))
    }

    fn uses_ticket(&self) -> bool {
        matches!(
            self.connection.credentials(),
            ProxmoxCredentials::Password { .. }
        )
    }

    /// Ensures that we have a valid (non-expired) ticket. If not, attempts to refresh.
    async fn ensure_authenticated(&self) -> ApiResult<()> {
        if !self.uses_ticket() {
            return Ok(());
        }

        let need_refresh = {
            let auth_guard = self.auth.read().await;
            match auth_guard.as_ref() {
                Some(auth) => auth.ticket().is_expired(self.config.ticket_lifetime),
                None => true,
            }
        };

        if need_refresh {
            self.refresh_auth().await?;
        }
        Ok(())
    }

    /// Performs a fresh login using the stored credentials to obtain a new ticket.
    async fn refresh_auth(&self) -> ApiResult<()> {
        let service = LoginService::new();
        let auth = service.execute(&self.http_client, &self.connection).await?;
        self.set_auth(auth).await;
        Ok(())
    }
}
