//! Error types for the Confluent Cloud provider.

use thiserror::Error;

/// Errors surfaced to the host by provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote object no longer exists; the host should prune it from state.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Login failed, either terminally or after the rate-limit deadline.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Creating a remote object failed.
    #[error("Create failed: {0}")]
    Create(String),

    /// Reading a remote object failed for a reason other than absence.
    #[error("Read failed: {0}")]
    Read(String),

    /// Updating a remote object failed.
    #[error("Update failed: {0}")]
    Update(String),

    /// Deleting a remote object failed.
    #[error("Delete failed: {0}")]
    Delete(String),

    /// A composite import key did not have the expected shape.
    #[error("Invalid import key: {0}")]
    ImportFormat(String),

    /// The provider was stopped while the operation was waiting to retry.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// The remote object exists and its identifier is known, but a later step
    /// of the same operation failed. `state` must still be persisted.
    #[error("{source}")]
    PartialState {
        /// State carrying the assigned identifier.
        state: Box<serde_json::Value>,
        /// The failure that ended the operation.
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::Auth(msg)
            | Self::Create(msg)
            | Self::Read(msg)
            | Self::Update(msg)
            | Self::Delete(msg)
            | Self::ImportFormat(msg)
            | Self::Cancelled(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::PartialState { source, .. } => source.message(),
        }
    }

    /// Whether the host should drop the object from its state.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// State that must be persisted despite the failure, if any.
    pub fn partial_state(&self) -> Option<&serde_json::Value> {
        match self {
            Self::PartialState { state, .. } => Some(state),
            _ => None,
        }
    }
}
