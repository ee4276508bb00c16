use crate::core::domain::error::ValidationError;
use std::fmt;

/// A Proxmox API token (`USER@REALM!TOKENID` plus its secret).
///
/// Token authentication is stateless: no ticket and no CSRF token are
/// needed, every request carries the `Authorization` header.
#[derive(Clone)]
pub struct ProxmoxApiToken {
    id: String,
    secret: String,
}

impl ProxmoxApiToken {
    /// Creates a new token, validating the id and the secret.
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let secret = secret.into();
        validate_token_id(&id)?;
        if secret.trim().is_empty() {
            return Err(ValidationError::Field {
                field: "token_secret".to_string(),
                message: "Token secret cannot be empty".to_string(),
            });
        }
        Ok(Self { id, secret })
    }

    /// Returns the full token id (`user@realm!name`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Formats the value of the `Authorization` header.
    #[must_use]
    pub fn as_authorization_header(&self) -> String {
        format!("PVEAPIToken={}={}", self.id, self.secret)
    }
}

impl fmt::Debug for ProxmoxApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxmoxApiToken")
            .field("id", &self.id)
            .field("secret", &"***")
            .finish()
    }
}

/// Validates a token id of the form `user@realm!name`.
pub(crate) fn validate_token_id(id: &str) -> Result<(), ValidationError> {
    let Some((user_realm, name)) = id.split_once('!') else {
        return Err(ValidationError::Format(
            "Token id must be in format USER@REALM!TOKENID".to_string(),
        ));
    };
    let Some((user, realm)) = user_realm.rsplit_once('@') else {
        return Err(ValidationError::Format(
            "Token id must contain a realm (USER@REALM!TOKENID)".to_string(),
        ));
    };
    if user.is_empty() || realm.is_empty() || name.is_empty() {
        return Err(ValidationError::Field {
            field: "token_id".to_string(),
            message: "User, realm and token name must not be empty".to_string(),
        });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::Format(
            "Token name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
