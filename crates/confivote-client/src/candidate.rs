//! Display records built from contract data.

use chrono::{DateTime, Utc};
use confivote_runtime::{Address, BusinessRecord, RecordId};
use serde::{Deserialize, Serialize};

/// One voted-on candidate as shown in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Contract-assigned identifier, also the key for decryption requests
    pub record_id: RecordId,
    pub name: String,
    pub category: String,
    /// Unix seconds
    pub timestamp: u64,
    pub creator: Address,
    pub public_value1: u32,
    pub public_value2: u32,
    pub is_verified: bool,
    /// Set only once the encrypted score was publicly decrypted and verified
    pub decrypted_value: Option<u32>,
}

impl Candidate {
    pub fn from_record(record_id: RecordId, record: BusinessRecord) -> Self {
        let decrypted_value = record.is_verified.then_some(record.decrypted_value);
        Self {
            record_id,
            name: record.name,
            category: record.description,
            timestamp: record.timestamp,
            creator: record.creator,
            public_value1: record.public_value1,
            public_value2: record.public_value2,
            is_verified: record.is_verified,
            decrypted_value,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp).ok().and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(is_verified: bool) -> BusinessRecord {
        BusinessRecord {
            name: "Movie A".into(),
            description: "Best Film".into(),
            timestamp: 1_700_000_000,
            creator: Address::new([7; 20]),
            public_value1: 5,
            public_value2: 1,
            is_verified,
            decrypted_value: 9,
        }
    }

    #[test]
    fn test_unverified_record_hides_decrypted_value() {
        let c = Candidate::from_record(RecordId::new("a"), record(false));
        assert_eq!(c.category, "Best Film");
        assert_eq!(c.decrypted_value, None);
    }

    #[test]
    fn test_verified_record_exposes_decrypted_value() {
        let c = Candidate::from_record(RecordId::new("a"), record(true));
        assert_eq!(c.decrypted_value, Some(9));
        assert_eq!(c.created_at().map(|t| t.timestamp()), Some(1_700_000_000));
    }
}
