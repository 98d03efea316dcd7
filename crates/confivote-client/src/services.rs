//! Boundaries to the external collaborators.
//!
//! The wallet, the FHE SDK and the voting contract are not implemented by this
//! crate. The controller only talks to them through these traits, so any
//! backend (browser bridge, JSON-RPC client, in-memory fake) can be plugged in.

use async_trait::async_trait;
use confivote_runtime::{
    Address, BusinessRecord, CiphertextHandle, DecryptionProof, DecryptionResult, EncryptedInput,
    InputProof, RecordId, ServiceError, TxHash, TxReceipt,
};

/// Result type returned by every external collaborator.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Connected wallet, if any.
pub trait WalletSession: Send + Sync {
    /// The active account, `None` while disconnected.
    fn address(&self) -> Option<Address>;

    fn is_connected(&self) -> bool;
}

/// Pushes a decryption result on-chain.
///
/// Handed to [`FheSession::verify_decryption`], which calls it once the
/// off-chain decryption and its proof are available.
#[async_trait]
pub trait ProofSubmitter: Send + Sync {
    async fn submit(
        &self,
        clear_values_encoded: Vec<u8>,
        proof: DecryptionProof,
    ) -> ServiceResult<()>;
}

/// Client side of the FHE SDK.
#[async_trait]
pub trait FheSession: Send + Sync {
    /// Loads keys and connects to the relayer. Idempotent.
    async fn initialize(&self) -> ServiceResult<()>;

    /// Encrypts `value` for use by `contract` on behalf of `user`.
    async fn encrypt(
        &self,
        contract: Address,
        user: Address,
        value: u64,
    ) -> ServiceResult<EncryptedInput>;

    /// Runs the public decryption of `handles`, hands the result and its proof
    /// to `submitter`, then returns the decrypted values.
    async fn verify_decryption(
        &self,
        handles: &[CiphertextHandle],
        contract: Address,
        submitter: &dyn ProofSubmitter,
    ) -> ServiceResult<DecryptionResult>;
}

/// Read-only handle to the voting contract.
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn is_available(&self) -> ServiceResult<bool>;

    async fn get_all_business_ids(&self) -> ServiceResult<Vec<RecordId>>;

    async fn get_business_data(&self, id: &RecordId) -> ServiceResult<BusinessRecord>;

    async fn get_encrypted_value(&self, id: &RecordId) -> ServiceResult<CiphertextHandle>;
}

/// Signer-bound handle to the voting contract.
#[async_trait]
pub trait ContractWriter: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn create_business_data(
        &self,
        id: &RecordId,
        name: &str,
        encrypted_value: CiphertextHandle,
        input_proof: InputProof,
        public_value1: u32,
        public_value2: u32,
        description: &str,
    ) -> ServiceResult<TxHash>;

    async fn verify_decryption(
        &self,
        id: &RecordId,
        clear_values_encoded: Vec<u8>,
        proof: DecryptionProof,
    ) -> ServiceResult<TxHash>;

    /// Blocks until `tx` is mined.
    async fn wait_for_confirmation(&self, tx: TxHash) -> ServiceResult<TxReceipt>;
}
