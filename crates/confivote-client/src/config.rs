//! Client configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use confivote_runtime::{Address, Result, VoteError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SUCCESS_NOTICE_MS: u64 = 2_000;
pub const DEFAULT_ERROR_NOTICE_MS: u64 = 3_000;
pub const DEFAULT_RANKING_LIMIT: usize = 10;

/// Settings for a [`crate::VoteController`]
///
/// Every field is optional in the JSON form; missing ones take their default.
///
/// ```json
/// {
///   "contract_address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
///   "error_notice_ms": 5000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Deployed voting contract, used as the encryption and decryption target
    pub contract_address: Address,
    /// How long a success notice stays visible
    pub success_notice_ms: u64,
    /// How long an error notice stays visible
    pub error_notice_ms: u64,
    /// Maximum number of entries in the rankings view
    pub ranking_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            contract_address: Address::new([0u8; 20]),
            success_notice_ms: DEFAULT_SUCCESS_NOTICE_MS,
            error_notice_ms: DEFAULT_ERROR_NOTICE_MS,
            ranking_limit: DEFAULT_RANKING_LIMIT,
        }
    }
}

impl ClientConfig {
    pub fn with_contract(contract_address: Address) -> Self {
        Self {
            contract_address,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| VoteError::serialization(e.to_string()))
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn success_delay(&self) -> Duration {
        Duration::from_millis(self.success_notice_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_notice_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.success_delay(), Duration::from_secs(2));
        assert_eq!(config.error_delay(), Duration::from_secs(3));
        assert_eq!(config.ranking_limit, 10);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "contract_address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "ranking_limit": 3
        }"#;
        let config = ClientConfig::from_json_str(json).unwrap();

        assert_eq!(
            config.contract_address.to_string(),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
        assert_eq!(config.ranking_limit, 3);
        assert_eq!(config.error_notice_ms, DEFAULT_ERROR_NOTICE_MS);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"success_notice_ms": 500}}"#).unwrap();

        let config = ClientConfig::from_json_path(file.path()).unwrap();
        assert_eq!(config.success_notice_ms, 500);
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = ClientConfig::from_json_path(file.path());
        assert!(matches!(result, Err(VoteError::Serialization(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ClientConfig::from_json_path("/nonexistent/confivote.json");
        assert!(matches!(result, Err(VoteError::Io(_))));
    }
}
