//! Error types for the confivote client

use thiserror::Error;

/// Result type alias for confivote operations
pub type Result<T> = std::result::Result<T, VoteError>;

/// Failure reported by one of the external collaborators (wallet, contract, FHE SDK).
///
/// Backends that expose structured error codes should map them directly onto
/// these variants. [`ServiceError::classify`] is the fallback for backends that
/// only hand back a message string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The user declined to sign in their wallet
    #[error("User rejected the request")]
    UserRejected,

    /// Another party already published the decryption for this record
    #[error("Data already verified")]
    AlreadyVerified,

    /// The requested record does not exist on-chain
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other network, contract or SDK failure
    #[error("{0}")]
    Failed(String),
}

impl ServiceError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Maps a raw backend message onto a variant by substring.
    ///
    /// Fragile: depends on wallet and contract revert wording. Only used when the
    /// backend gives nothing better.
    pub fn classify(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let lower = msg.to_lowercase();

        if lower.contains("user rejected") || lower.contains("user denied") {
            Self::UserRejected
        } else if lower.contains("already verified") {
            Self::AlreadyVerified
        } else {
            Self::Failed(msg)
        }
    }

    pub fn is_user_rejected(&self) -> bool {
        matches!(self, Self::UserRejected)
    }

    pub fn is_already_verified(&self) -> bool {
        matches!(self, Self::AlreadyVerified)
    }
}

/// Main error type for confivote operations
#[derive(Debug, Error)]
pub enum VoteError {
    /// No wallet session is connected
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// The FHE session has not finished initializing
    #[error("FHE session not ready")]
    FheNotReady,

    /// The vote draft does not satisfy the submission preconditions
    #[error("Invalid vote draft: {0}")]
    InvalidDraft(String),

    /// An external collaborator failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Malformed address string
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors not covered by specific variants
    #[error("{0}")]
    Other(String),
}

impl VoteError {
    pub fn invalid_draft(msg: impl Into<String>) -> Self {
        Self::InvalidDraft(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// The underlying service failure, if any.
    pub fn service(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(
            ServiceError::classify("MetaMask Tx Signature: User Rejected transaction signature."),
            ServiceError::UserRejected
        );
        assert_eq!(
            ServiceError::classify("execution reverted: Data ALREADY VERIFIED"),
            ServiceError::AlreadyVerified
        );
    }

    #[test]
    fn test_classify_keeps_unknown_message() {
        let err = ServiceError::classify("nonce too low");
        assert_eq!(err, ServiceError::Failed("nonce too low".to_string()));
    }

    #[test]
    fn test_service_accessor() {
        let err: VoteError = ServiceError::AlreadyVerified.into();
        assert!(err.service().is_some_and(ServiceError::is_already_verified));
        assert!(VoteError::FheNotReady.service().is_none());
    }
}
