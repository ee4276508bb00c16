use crate::core::domain::{
    error::ValidationError,
    value_object::{proxmox_host::ProxmoxHost, proxmox_port::ProxmoxPort},
};

const MAX_URL_LENGTH: usize = 2083;
const ALLOWED_SCHEMES: [&str; 2] = ["https", "http"];

/// A validated base URL of a Proxmox VE API endpoint, always ending in `/`.
///
/// # Examples
///
/// ```
/// use pve_storage_info::{ProxmoxHost, ProxmoxPort, ProxmoxUrl};
///
/// let host = ProxmoxHost::new("pve1.example.com").unwrap();
/// let port = ProxmoxPort::new(8006).unwrap();
/// let url = ProxmoxUrl::new(&host, &port, true).unwrap();
/// assert_eq!(
///     url.api_path("/nodes/pve1/storage"),
///     "https://pve1.example.com:8006/api2/json/nodes/pve1/storage"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxmoxUrl(String);

impl ProxmoxUrl {
    /// Builds the base URL from host and port.
    pub fn new(host: &ProxmoxHost, port: &ProxmoxPort, secure: bool) -> Result<Self, ValidationError> {
        let scheme = if secure { "https" } else { "http" };
        let url = format!("{}://{}:{}/", scheme, host.as_authority(), port.get());
        validate_url(&url)?;
        Ok(Self(url))
    }

    /// Creates a new URL without validation.
    pub(crate) fn new_unchecked(url: String) -> Self {
        Self(url)
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins an API path below `/api2/json`.
    #[must_use]
    pub fn api_path(&self, path: &str) -> String {
        format!(
            "{}/api2/json/{}",
            self.0.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Validates a base URL.
pub(crate) fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::Field {
            field: "url".to_string(),
            message: "URL cannot be empty".to_string(),
        });
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(ValidationError::Format(format!(
            "URL exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        )));
    }

    let parsed = url::Url::parse(url)
        .map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(ValidationError::ConstraintViolation(format!(
            "Invalid scheme. Must be one of: {}",
            ALLOWED_SCHEMES.join(", ")
        )));
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::ConstraintViolation(
            "URL must contain a host".to_string(),
        ));
    }

    Ok(())
}
