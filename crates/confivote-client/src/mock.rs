//! In-memory wallet, contract and FHE SDK.
//!
//! Stand-ins for the real collaborators, sharing one [`MemoryLedger`] that can
//! be saved to and loaded from JSON. No actual encryption happens: plaintexts
//! sit in the ledger next to the handles that reference them, and proofs are
//! blake2 digests binding handles to their context. The contract side checks
//! those digests the same way a verifier would.
//!
//! Every service accepts failure injection so the controller's error paths can
//! be driven from tests.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blake2::{Blake2s256, Digest};
use chrono::Utc;
use confivote_runtime::{
    Address, BusinessRecord, CiphertextHandle, ClearValues, DecryptionProof, DecryptionResult,
    EncryptedInput, InputProof, RecordId, Result, ServiceError, TxHash, TxReceipt, VoteError,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::{
    ContractReader, ContractWriter, FheSession, ProofSubmitter, ServiceResult, WalletSession,
};

pub type SharedLedger = Arc<Mutex<MemoryLedger>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub record: BusinessRecord,
    pub encrypted_value: CiphertextHandle,
}

/// Contract storage plus the plaintexts behind every ciphertext handle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLedger {
    /// In creation order
    pub records: Vec<StoredRecord>,
    pub ciphertexts: BTreeMap<CiphertextHandle, u64>,
    pub receipts: Vec<TxReceipt>,
    pub block_number: u64,
    /// Ciphertexts ever stored; never reused even after pruning
    #[serde(default)]
    pub nonce: u64,
}

fn digest(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2s256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Proof binding an encrypted input to its contract and sender.
pub fn input_proof(handle: &CiphertextHandle, contract: &Address, user: &Address) -> InputProof {
    let parts: [&[u8]; 4] = [b"input", handle.as_bytes(), contract.as_bytes(), user.as_bytes()];
    InputProof::new(digest(&parts).to_vec())
}

/// Proof binding clear values to the handles they were decrypted from.
pub fn decryption_proof(
    handles: &[CiphertextHandle],
    clear_values_encoded: &[u8],
) -> DecryptionProof {
    let mut parts: Vec<&[u8]> = vec![b"decrypt".as_slice()];
    parts.extend(handles.iter().map(|h| h.as_bytes().as_slice()));
    parts.push(clear_values_encoded);
    DecryptionProof::new(digest(&parts).to_vec())
}

impl MemoryLedger {
    pub fn shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| VoteError::serialization(e.to_string()))
    }

    /// Loads `path`, or starts empty if it does not exist yet.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Writes the ledger as JSON, leaving out ciphertexts no record references.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut snapshot = self.clone();
        let pruned = snapshot.prune_ciphertexts();
        if pruned > 0 {
            debug!(pruned, "dropped unreferenced ciphertexts");
        }
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| VoteError::serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn record(&self, id: &RecordId) -> Option<&StoredRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Drops ciphertexts left behind by encryptions whose record was never
    /// created. Returns how many were removed.
    pub fn prune_ciphertexts(&mut self) -> usize {
        let live: HashSet<CiphertextHandle> =
            self.records.iter().map(|r| r.encrypted_value).collect();
        let before = self.ciphertexts.len();
        self.ciphertexts.retain(|handle, _| live.contains(handle));
        before - self.ciphertexts.len()
    }

    fn record_mut(&mut self, id: &RecordId) -> Option<&mut StoredRecord> {
        self.records.iter_mut().find(|r| &r.id == id)
    }

    fn store_ciphertext(&mut self, context: &[&[u8]], value: u64) -> CiphertextHandle {
        self.nonce += 1;
        let nonce = self.nonce.to_be_bytes();
        let mut parts = context.to_vec();
        parts.push(&nonce);
        parts.push(b"ciphertext");
        let handle = CiphertextHandle::new(digest(&parts));
        self.ciphertexts.insert(handle, value);
        handle
    }

    /// Inserts a record directly, bypassing encryption and proofs.
    pub fn seed_record(
        &mut self,
        id: RecordId,
        record: BusinessRecord,
        score: u64,
    ) -> CiphertextHandle {
        let handle = self.store_ciphertext(&[id.as_str().as_bytes()], score);
        self.records.push(StoredRecord {
            id,
            record,
            encrypted_value: handle,
        });
        handle
    }

    fn mine(&mut self, parts: &[&[u8]]) -> TxHash {
        self.block_number += 1;
        let block = self.block_number.to_be_bytes();
        let mut parts = parts.to_vec();
        parts.push(&block);
        let tx_hash = TxHash::new(digest(&parts));
        self.receipts.push(TxReceipt {
            tx_hash,
            block_number: self.block_number,
        });
        tx_hash
    }
}

/// Wallet with a fixed account
#[derive(Debug, Clone, Default)]
pub struct StaticWallet {
    address: Option<Address>,
}

impl StaticWallet {
    pub fn connected(address: Address) -> Self {
        Self {
            address: Some(address),
        }
    }

    pub fn disconnected() -> Self {
        Self { address: None }
    }
}

impl WalletSession for StaticWallet {
    fn address(&self) -> Option<Address> {
        self.address
    }

    fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

#[derive(Debug, Default)]
struct ChainFaults {
    unavailable: bool,
    fail_listing: bool,
    failing_records: HashSet<RecordId>,
    reject_next_signature: bool,
}

#[derive(Debug, Default)]
struct ChainCalls {
    create: AtomicUsize,
    verify: AtomicUsize,
}

/// The voting contract, as seen through a read handle and a signer handle.
/// Clones share ledger, faults and counters.
#[derive(Debug, Clone)]
pub struct MemoryChain {
    ledger: SharedLedger,
    contract: Address,
    signer: Option<Address>,
    faults: Arc<Mutex<ChainFaults>>,
    calls: Arc<ChainCalls>,
}

impl MemoryChain {
    pub fn new(ledger: SharedLedger, contract: Address, signer: Option<Address>) -> Self {
        Self {
            ledger,
            contract,
            signer,
            faults: Arc::default(),
            calls: Arc::default(),
        }
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    pub fn set_available(&self, available: bool) {
        self.faults.lock().unavailable = !available;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.faults.lock().fail_listing = fail;
    }

    pub fn fail_record(&self, id: RecordId) {
        self.faults.lock().failing_records.insert(id);
    }

    /// The next signature request is declined by the user.
    pub fn reject_next_signature(&self) {
        self.faults.lock().reject_next_signature = true;
    }

    pub fn create_calls(&self) -> usize {
        self.calls.create.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.calls.verify.load(Ordering::SeqCst)
    }

    fn signer(&self) -> ServiceResult<Address> {
        let mut faults = self.faults.lock();
        if faults.reject_next_signature {
            faults.reject_next_signature = false;
            return Err(ServiceError::classify("user rejected transaction"));
        }
        self.signer.ok_or_else(|| ServiceError::failed("no signer available"))
    }
}

#[async_trait]
impl ContractReader for MemoryChain {
    async fn is_available(&self) -> ServiceResult<bool> {
        Ok(!self.faults.lock().unavailable)
    }

    async fn get_all_business_ids(&self) -> ServiceResult<Vec<RecordId>> {
        if self.faults.lock().fail_listing {
            return Err(ServiceError::failed("could not decode result data"));
        }
        Ok(self.ledger.lock().records.iter().map(|r| r.id.clone()).collect())
    }

    async fn get_business_data(&self, id: &RecordId) -> ServiceResult<BusinessRecord> {
        if self.faults.lock().failing_records.contains(id) {
            return Err(ServiceError::failed(format!("call reverted while reading {id}")));
        }
        self.ledger
            .lock()
            .record(id)
            .map(|r| r.record.clone())
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    async fn get_encrypted_value(&self, id: &RecordId) -> ServiceResult<CiphertextHandle> {
        self.ledger
            .lock()
            .record(id)
            .map(|r| r.encrypted_value)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl ContractWriter for MemoryChain {
    async fn create_business_data(
        &self,
        id: &RecordId,
        name: &str,
        encrypted_value: CiphertextHandle,
        input_proof: InputProof,
        public_value1: u32,
        public_value2: u32,
        description: &str,
    ) -> ServiceResult<TxHash> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        let creator = self.signer()?;

        let mut ledger = self.ledger.lock();
        if ledger.record(id).is_some() {
            return Err(ServiceError::failed("execution reverted: Business data already exists"));
        }
        if !ledger.ciphertexts.contains_key(&encrypted_value)
            || input_proof != self::input_proof(&encrypted_value, &self.contract, &creator)
        {
            return Err(ServiceError::failed("execution reverted: Invalid input proof"));
        }

        let record = BusinessRecord {
            name: name.to_string(),
            description: description.to_string(),
            timestamp: u64::try_from(Utc::now().timestamp()).unwrap_or_default(),
            creator,
            public_value1,
            public_value2,
            is_verified: false,
            decrypted_value: 0,
        };
        ledger.records.push(StoredRecord {
            id: id.clone(),
            record,
            encrypted_value,
        });
        let tx = ledger.mine(&[b"create", id.as_str().as_bytes()]);
        debug!(record = %id, tx = %tx, "record created");
        Ok(tx)
    }

    async fn verify_decryption(
        &self,
        id: &RecordId,
        clear_values_encoded: Vec<u8>,
        proof: DecryptionProof,
    ) -> ServiceResult<TxHash> {
        self.calls.verify.fetch_add(1, Ordering::SeqCst);
        self.signer()?;

        let mut ledger = self.ledger.lock();
        let stored = ledger
            .record_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        if stored.record.is_verified {
            return Err(ServiceError::classify("execution reverted: Data already verified"));
        }

        let handles = [stored.encrypted_value];
        if proof != decryption_proof(&handles, &clear_values_encoded) {
            return Err(ServiceError::failed("execution reverted: Invalid decryption proof"));
        }
        let clear = ClearValues::abi_decode(&handles, &clear_values_encoded)
            .map_err(|e| ServiceError::failed(e.to_string()))?;
        let value = clear
            .get(&handles[0])
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| ServiceError::failed("execution reverted: value out of range"))?;

        stored.record.is_verified = true;
        stored.record.decrypted_value = value;
        let tx = ledger.mine(&[b"verify", id.as_str().as_bytes()]);
        Ok(tx)
    }

    async fn wait_for_confirmation(&self, tx: TxHash) -> ServiceResult<TxReceipt> {
        self.ledger
            .lock()
            .receipts
            .iter()
            .find(|r| r.tx_hash == tx)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {tx}")))
    }
}

#[derive(Debug, Default)]
struct FheState {
    initialized: bool,
    fail_init: bool,
    init_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct FheCalls {
    initialize: AtomicUsize,
    encrypt: AtomicUsize,
    verify_decryption: AtomicUsize,
}

/// FHE SDK over the shared ledger. Clones share state and counters.
#[derive(Debug, Clone)]
pub struct MemoryFhe {
    ledger: SharedLedger,
    state: Arc<Mutex<FheState>>,
    calls: Arc<FheCalls>,
}

impl MemoryFhe {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            ledger,
            state: Arc::default(),
            calls: Arc::default(),
        }
    }

    pub fn fail_init(&self, fail: bool) {
        self.state.lock().fail_init = fail;
    }

    /// Makes `initialize` take `delay`, so concurrent calls can overlap.
    pub fn set_init_delay(&self, delay: Duration) {
        self.state.lock().init_delay = Some(delay);
    }

    pub fn initialize_calls(&self) -> usize {
        self.calls.initialize.load(Ordering::SeqCst)
    }

    pub fn encrypt_calls(&self) -> usize {
        self.calls.encrypt.load(Ordering::SeqCst)
    }

    pub fn verify_decryption_calls(&self) -> usize {
        self.calls.verify_decryption.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FheSession for MemoryFhe {
    async fn initialize(&self) -> ServiceResult<()> {
        self.calls.initialize.fetch_add(1, Ordering::SeqCst);
        let delay = self.state.lock().init_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.fail_init {
            return Err(ServiceError::failed("relayer unreachable"));
        }
        state.initialized = true;
        Ok(())
    }

    async fn encrypt(
        &self,
        contract: Address,
        user: Address,
        value: u64,
    ) -> ServiceResult<EncryptedInput> {
        self.calls.encrypt.fetch_add(1, Ordering::SeqCst);
        if !self.state.lock().initialized {
            return Err(ServiceError::failed("FHE instance not initialized"));
        }

        let handle = self
            .ledger
            .lock()
            .store_ciphertext(&[contract.as_bytes(), user.as_bytes()], value);
        Ok(EncryptedInput {
            handle,
            proof: input_proof(&handle, &contract, &user),
        })
    }

    async fn verify_decryption(
        &self,
        handles: &[CiphertextHandle],
        _contract: Address,
        submitter: &dyn ProofSubmitter,
    ) -> ServiceResult<DecryptionResult> {
        self.calls.verify_decryption.fetch_add(1, Ordering::SeqCst);

        let clear_values = {
            let ledger = self.ledger.lock();
            handles
                .iter()
                .map(|h| {
                    ledger
                        .ciphertexts
                        .get(h)
                        .map(|v| (*h, *v))
                        .ok_or_else(|| ServiceError::NotFound(format!("ciphertext {h}")))
                })
                .collect::<ServiceResult<ClearValues>>()?
        };

        let encoded = clear_values
            .abi_encode(handles)
            .map_err(|e| ServiceError::failed(e.to_string()))?;
        let proof = decryption_proof(handles, &encoded);
        submitter.submit(encoded, proof.clone()).await?;

        Ok(DecryptionResult {
            clear_values,
            proof,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn record() -> BusinessRecord {
        BusinessRecord {
            name: "n".into(),
            description: "c".into(),
            timestamp: 0,
            creator: addr(2),
            public_value1: 0,
            public_value2: 0,
            is_verified: false,
            decrypted_value: 0,
        }
    }

    #[tokio::test]
    async fn test_encrypt_requires_initialize() {
        let fhe = MemoryFhe::new(MemoryLedger::default().shared());
        let err = fhe.encrypt(addr(1), addr(2), 5).await.unwrap_err();
        assert!(matches!(err, ServiceError::Failed(_)));

        fhe.initialize().await.unwrap();
        let input = fhe.encrypt(addr(1), addr(2), 5).await.unwrap();
        assert_eq!(input.proof, input_proof(&input.handle, &addr(1), &addr(2)));
    }

    #[tokio::test]
    async fn test_create_rejects_proof_for_other_sender() {
        let ledger = MemoryLedger::default().shared();
        let fhe = MemoryFhe::new(ledger.clone());
        fhe.initialize().await.unwrap();
        let chain = MemoryChain::new(ledger, addr(1), Some(addr(3)));

        let input = fhe.encrypt(addr(1), addr(2), 5).await.unwrap();
        let err = chain
            .create_business_data(&"x".into(), "n", input.handle, input.proof, 0, 0, "c")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid input proof"));
    }

    #[tokio::test]
    async fn test_second_verification_is_classified() {
        let mut ledger = MemoryLedger::default();
        let id = RecordId::new("a");
        let handle = ledger.seed_record(id.clone(), record(), 7);
        let chain = MemoryChain::new(ledger.shared(), addr(1), Some(addr(2)));

        let clear: ClearValues = [(handle, 7)].into_iter().collect();
        let encoded = clear.abi_encode(&[handle]).unwrap();
        let proof = decryption_proof(&[handle], &encoded);

        chain.verify_decryption(&id, encoded.clone(), proof.clone()).await.unwrap();
        let err = chain.verify_decryption(&id, encoded, proof).await.unwrap_err();
        assert_eq!(err, ServiceError::AlreadyVerified);
        assert_eq!(chain.get_business_data(&id).await.unwrap().decrypted_value, 7);
    }

    #[test]
    fn test_ledger_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let mut ledger = MemoryLedger::default();
        ledger.seed_record(RecordId::new("a"), record(), 11);
        ledger.save(&path).unwrap();

        assert_eq!(MemoryLedger::load(&path).unwrap(), ledger);
        assert_eq!(
            MemoryLedger::load_or_default(dir.path().join("missing.json")).unwrap(),
            MemoryLedger::default()
        );
    }

    #[tokio::test]
    async fn test_rejected_create_leaves_no_ciphertext_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut ledger = MemoryLedger::default();
        let live = ledger.seed_record(RecordId::new("a"), record(), 3);
        let ledger = ledger.shared();

        let fhe = MemoryFhe::new(ledger.clone());
        fhe.initialize().await.unwrap();
        let chain = MemoryChain::new(ledger.clone(), addr(1), Some(addr(2)));
        chain.reject_next_signature();

        let input = fhe.encrypt(addr(1), addr(2), 5).await.unwrap();
        chain
            .create_business_data(&"b".into(), "n", input.handle, input.proof, 0, 0, "c")
            .await
            .unwrap_err();
        assert_eq!(ledger.lock().ciphertexts.len(), 2);

        ledger.lock().save(&path).unwrap();
        let saved = MemoryLedger::load(&path).unwrap();
        assert_eq!(saved.ciphertexts.len(), 1);
        assert_eq!(saved.ciphertexts.get(&live), Some(&3));
    }

    #[test]
    fn test_handles_stay_unique_after_pruning() {
        let mut ledger = MemoryLedger::default();
        let orphan = ledger.store_ciphertext(&[b"ctx"], 1);
        let live = ledger.seed_record(RecordId::new("a"), record(), 2);

        assert_eq!(ledger.prune_ciphertexts(), 1);
        assert!(!ledger.ciphertexts.contains_key(&orphan));

        let next = ledger.store_ciphertext(&[b"ctx"], 9);
        assert_ne!(next, live);
        assert_ne!(next, orphan);
        assert_eq!(ledger.ciphertexts.get(&live), Some(&2));
    }
}
