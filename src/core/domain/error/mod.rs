use thiserror::Error;

/// The main error type for an inventory run.
///
/// Only argument problems, a failed cluster listing and an empty result are
/// fatal. Per-node and per-guest [`ApiError`]s are downgraded to collection
/// warnings by the collector and never surface here.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Bad or conflicting command line arguments
    ///
    /// # Fields
    /// * `0` - A description of the offending argument
    #[error("Argument error: {0}")]
    Argument(String),

    /// Connection settings that failed validation
    ///
    /// # Fields
    /// * `0` - The underlying validation error
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An API failure that prevents any collection at all
    ///
    /// # Fields
    /// * `0` - The failing API call
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Nothing could be collected because every node failed
    ///
    /// # Fields
    /// * `0` - A summary of the failures
    #[error("Collection failed: {0}")]
    Collection(String),

    /// The filters excluded everything
    ///
    /// # Fields
    /// * `0` - A description of the filters that matched nothing
    #[error("No matching data: {0}")]
    EmptyResult(String),

    /// The result could not be encoded or written
    ///
    /// # Fields
    /// * `0` - The underlying encoder or I/O error
    #[error("Output error: {0}")]
    Output(String),
}

impl InventoryError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            InventoryError::Argument(_) | InventoryError::Validation(_) => 2,
            InventoryError::Api(_) | InventoryError::Collection(_) | InventoryError::Output(_) => 1,
            InventoryError::EmptyResult(_) => 3,
        }
    }
}

/// Failure of a single call against the Proxmox VE API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The endpoint could not be reached, timed out or answered with a
    /// non-success status
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// The credentials were rejected
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The response body could not be decoded
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with an InventoryError
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Type alias for Results of a single API call
pub type ApiResult<T> = Result<T, ApiError>;
