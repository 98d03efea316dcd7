//! Core types for the confivote client
//!
//! Plain value types exchanged with the wallet, the voting contract and the FHE
//! SDK. None of them carry behaviour beyond parsing and encoding; the ciphertext
//! arithmetic and the decryption protocol live behind those external services.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoteError};

const ADDRESS_LEN: usize = 20;
const WORD_LEN: usize = 32;

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

fn decode_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let bytes = hex::decode(strip_0x(s)).ok()?;
    bytes.try_into().ok()
}

/// A 20-byte account or contract address
///
/// # Examples
///
/// ```
/// use confivote_runtime::Address;
///
/// let addr: Address = "0x00000000000000000000000000000000000000AA".parse().unwrap();
/// assert_eq!(addr.to_string(), "0x00000000000000000000000000000000000000aa");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Abbreviated form for display, e.g. `0x1234...abcd`.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = VoteError;

    fn from_str(s: &str) -> Result<Self> {
        decode_fixed::<ADDRESS_LEN>(s.trim())
            .map(Self)
            .ok_or_else(|| VoteError::InvalidAddress(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = VoteError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Identifier of a candidate record on the voting contract
///
/// The same identifier is used to create the record, to read it back and to
/// request decryption of its encrypted score.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 32-byte reference to a ciphertext held by the FHE coprocessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CiphertextHandle([u8; WORD_LEN]);

impl CiphertextHandle {
    pub fn new(bytes: [u8; WORD_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; WORD_LEN] {
        &self.0
    }
}

impl FromStr for CiphertextHandle {
    type Err = VoteError;

    fn from_str(s: &str) -> Result<Self> {
        decode_fixed::<WORD_LEN>(s.trim())
            .map(Self)
            .ok_or_else(|| VoteError::serialization(format!("invalid ciphertext handle: {s}")))
    }
}

impl TryFrom<String> for CiphertextHandle {
    type Error = VoteError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CiphertextHandle> for String {
    fn from(value: CiphertextHandle) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Hash of a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash([u8; WORD_LEN]);

impl TxHash {
    pub fn new(bytes: [u8; WORD_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for TxHash {
    type Err = VoteError;

    fn from_str(s: &str) -> Result<Self> {
        decode_fixed::<WORD_LEN>(s.trim())
            .map(Self)
            .ok_or_else(|| VoteError::serialization(format!("invalid tx hash: {s}")))
    }
}

impl TryFrom<String> for TxHash {
    type Error = VoteError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Confirmation of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// Proof attached to an encrypted input, checked by the contract on ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof(Vec<u8>);

impl InputProof {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Proof that a set of clear values is the decryption of a set of handles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionProof(Vec<u8>);

impl DecryptionProof {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Output of encrypting a plaintext for a given contract and user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub handle: CiphertextHandle,
    pub proof: InputProof,
}

/// Decrypted values keyed by the handle they were decrypted from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClearValues(BTreeMap<CiphertextHandle, u64>);

impl ClearValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: CiphertextHandle, value: u64) {
        self.0.insert(handle, value);
    }

    pub fn get(&self, handle: &CiphertextHandle) -> Option<u64> {
        self.0.get(handle).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// ABI-encodes the values for `handles`, one 32-byte big-endian word each,
    /// in the order given.
    pub fn abi_encode(&self, handles: &[CiphertextHandle]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(handles.len() * WORD_LEN);
        for handle in handles {
            let value = self
                .get(handle)
                .ok_or_else(|| VoteError::serialization(format!("no clear value for {handle}")))?;
            let mut word = [0u8; WORD_LEN];
            word[WORD_LEN - 8..].copy_from_slice(&value.to_be_bytes());
            out.extend_from_slice(&word);
        }
        Ok(out)
    }

    /// Inverse of [`ClearValues::abi_encode`].
    pub fn abi_decode(handles: &[CiphertextHandle], encoded: &[u8]) -> Result<Self> {
        if encoded.len() != handles.len() * WORD_LEN {
            return Err(VoteError::serialization(format!(
                "expected {} bytes of clear values, got {}",
                handles.len() * WORD_LEN,
                encoded.len()
            )));
        }

        let mut values = Self::new();
        for (handle, word) in handles.iter().zip(encoded.chunks_exact(WORD_LEN)) {
            if word[..WORD_LEN - 8].iter().any(|b| *b != 0) {
                return Err(VoteError::serialization("clear value overflows u64"));
            }
            let mut tail = [0u8; 8];
            tail.copy_from_slice(&word[WORD_LEN - 8..]);
            values.insert(*handle, u64::from_be_bytes(tail));
        }
        Ok(values)
    }
}

impl FromIterator<(CiphertextHandle, u64)> for ClearValues {
    fn from_iter<T: IntoIterator<Item = (CiphertextHandle, u64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of an off-chain decryption run by the FHE SDK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionResult {
    pub clear_values: ClearValues,
    pub proof: DecryptionProof,
}

/// Record as returned by the contract's `getBusinessData` view
///
/// `description` carries the category label. `decrypted_value` is meaningless
/// until `is_verified` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: String,
    pub description: String,
    pub timestamp: u64,
    pub creator: Address,
    pub public_value1: u32,
    pub public_value2: u32,
    pub is_verified: bool,
    pub decrypted_value: u32,
}
