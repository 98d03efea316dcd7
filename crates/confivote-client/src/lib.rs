//! confivote Client
//!
//! Client-side orchestration for a confidential voting contract: scores are
//! encrypted with an FHE SDK before submission, and later publicly decrypted
//! with a proof that is verified on-chain.
//!
//! The wallet, the contract and the SDK are reached through the traits in
//! [`services`]. [`VoteController`] owns the application state and drives the
//! `encrypt -> submit -> confirm -> reload` and
//! `fetch handle -> decrypt -> publish proof -> reload` workflows, reporting
//! progress through a self-dismissing [`Notifier`].

pub mod candidate;
pub mod config;
pub mod controller;
pub mod draft;
pub mod mock;
pub mod notification;
pub mod services;
pub mod state;
pub mod views;

pub use candidate::Candidate;
pub use config::ClientConfig;
pub use controller::VoteController;
pub use draft::{ValidVote, VoteDraft};
pub use notification::{Notifier, TxPhase, TxStatus};
pub use services::{
    ContractReader, ContractWriter, FheSession, ProofSubmitter, ServiceResult, WalletSession,
};
pub use state::AppState;
pub use views::{CategoryFilter, Stats};

// Re-export runtime types for convenience
pub use confivote_runtime::{
    Address, BusinessRecord, RecordId, Result, ServiceError, VoteError,
};
