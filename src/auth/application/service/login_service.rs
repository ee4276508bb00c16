use crate::{
    auth::application::{
        request::login_request::LoginRequest, response::login_response::LoginResponse,
    },
    core::domain::{
        error::{ApiError, ApiResult},
        model::{
            proxmox_auth::ProxmoxAuth,
            proxmox_connection::{ProxmoxConnection, ProxmoxCredentials},
        },
        value_object::{ProxmoxCSRFToken, ProxmoxTicket},
    },
};

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use tracing::debug;

/// Obtains a ticket and CSRF token from `/access/ticket`.
pub struct LoginService {
    default_headers: HeaderMap,
}

impl LoginService {
    pub fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Self { default_headers }
    }

    pub async fn execute(
        &self,
        client: &Client,
        connection: &ProxmoxConnection,
    ) -> ApiResult<ProxmoxAuth> {
        let request = self.build_login_request(connection)?;
        let url = connection.url().api_path("/access/ticket");
        debug!(url = %url, username = %request.username, realm = %request.realm, "logging in");

        let response = client
            .post(&url)
            .headers(self.default_headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(format!("login request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => self.handle_successful_login(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized(
                "Invalid credentials provided".to_string(),
            )),
            StatusCode::NOT_FOUND => Err(ApiError::Unreachable(
                "Login endpoint not found".to_string(),
            )),
            StatusCode::SERVICE_UNAVAILABLE => Err(ApiError::Unreachable(
                "Proxmox service is currently unavailable".to_string(),
            )),
            status => Err(ApiError::Unreachable(format!(
                "Unexpected login response status: {}",
                status
            ))),
        }
    }

    fn build_login_request(&self, connection: &ProxmoxConnection) -> ApiResult<LoginRequest> {
        match connection.credentials() {
            ProxmoxCredentials::Password {
                username,
                password,
                realm,
            } => Ok(LoginRequest {
                username: username.as_str().to_string(),
                password: password.as_str().to_string(),
                realm: realm.as_str().to_string(),
            }),
            ProxmoxCredentials::Token(_) => Err(ApiError::Unauthorized(
                "API tokens do not use ticket login".to_string(),
            )),
        }
    }

    async fn handle_successful_login(&self, response: reqwest::Response) -> ApiResult<ProxmoxAuth> {
        let login_response = response.json::<LoginResponse>().await.map_err(|e| {
            ApiError::MalformedResponse(format!("Failed to parse login response: {}", e))
        })?;

        let ticket = ProxmoxTicket::new(login_response.data.ticket)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        let csrf_token = ProxmoxCSRFToken::new(login_response.data.csrf_token)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        Ok(ProxmoxAuth::new(ticket, Some(csrf_token)))
    }
}

impl Default for LoginService {
    fn default() -> Self {
        Self::new()
    }
}
