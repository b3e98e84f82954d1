//! Error types shared by the admin layer

use crate::config::ConfigError;
use crate::store::StoreError;

/// Errors surfaced by admin operations.
///
/// A failure aborts the operation that raised it; the core keeps serving
/// the next request. A level too low for an action is not an error but a
/// [`Decision::Deny`](crate::auth::Decision::Deny) from the gate.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// A handle or id did not resolve to exactly one player or record
    #[error("Player {0} is not on the server")]
    NotFound(String),

    /// Empty GUID, empty handle, malformed number or out-of-range level
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The reputation store could not answer
    #[error("Reputation store unavailable: {0}")]
    StoreUnavailable(StoreError),

    /// Configuration or level file problem
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmptyGuid => Self::InvalidArgument("empty GUID".to_string()),
            other => Self::StoreUnavailable(other),
        }
    }
}

/// Result type for admin operations
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_guid_maps_to_invalid_argument() {
        let err: AdminError = StoreError::EmptyGuid.into();
        assert!(matches!(err, AdminError::InvalidArgument(_)));
    }

    #[test]
    fn test_queue_full_maps_to_store_unavailable() {
        let err: AdminError = StoreError::QueueFull.into();
        assert!(matches!(
            err,
            AdminError::StoreUnavailable(StoreError::QueueFull)
        ));
    }
}
