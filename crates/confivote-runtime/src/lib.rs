//! confivote Runtime
//!
//! Shared types and error handling for the confivote confidential voting client.
//! Every other crate in the workspace exchanges data through these types.

pub mod error;
pub mod types;

// Re-export core types for convenience
pub use error::{Result, ServiceError, VoteError};
pub use types::{
    Address, BusinessRecord, CiphertextHandle, ClearValues, DecryptionProof, DecryptionResult,
    EncryptedInput, InputProof, RecordId, TxHash, TxReceipt,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_proof_basic_constructor() {
        let proof = InputProof::new(vec![]);
        assert_eq!(proof.size(), 0);
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("not an address".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_accepts_missing_prefix() {
        let with: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        let without: Address = "00000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_record_id_display() {
        let id = RecordId::new("vote-1700000000000-0");
        assert_eq!(id.to_string(), "vote-1700000000000-0");
        assert_eq!(id.as_str(), "vote-1700000000000-0");
    }

    #[test]
    fn test_clear_values_equality() {
        let h = CiphertextHandle::new([1; 32]);
        let a: ClearValues = [(h, 7)].into_iter().collect();
        let b: ClearValues = [(h, 7)].into_iter().collect();
        let c: ClearValues = [(h, 8)].into_iter().collect();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
