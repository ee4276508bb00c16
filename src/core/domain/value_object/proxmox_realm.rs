use crate::core::domain::error::ValidationError;

const MIN_REALM_LENGTH: usize = 2;
const MAX_REALM_LENGTH: usize = 32;

/// A validated Proxmox authentication realm (`pam`, `pve`, or a configured
/// LDAP/AD/OpenID realm id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxmoxRealm(String);

impl ProxmoxRealm {
    /// Creates a new realm, validating it first.
    pub fn new(realm: impl Into<String>) -> Result<Self, ValidationError> {
        let realm = realm.into();
        validate_realm(&realm)?;
        Ok(Self(realm))
    }

    /// Creates a new realm without validation.
    pub(crate) fn new_unchecked(realm: String) -> Self {
        Self(realm)
    }

    /// Returns the realm as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validates a realm identifier.
pub(crate) fn validate_realm(realm: &str) -> Result<(), ValidationError> {
    if realm.is_empty() {
        return Err(ValidationError::Field {
            field: "realm".to_string(),
            message: "Realm cannot be empty".to_string(),
        });
    }

    if realm.len() < MIN_REALM_LENGTH || realm.len() > MAX_REALM_LENGTH {
        return Err(ValidationError::Format(format!(
            "Realm length must be between {} and {} characters",
            MIN_REALM_LENGTH, MAX_REALM_LENGTH
        )));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.';
    if !realm.chars().all(allowed) {
        return Err(ValidationError::Format(
            "Realm contains invalid characters".to_string(),
        ));
    }

    if !realm.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(ValidationError::ConstraintViolation(
            "Realm must start with a letter".to_string(),
        ));
    }

    Ok(())
}
