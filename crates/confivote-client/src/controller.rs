//! View-state controller.
//!
//! Mediates between user intents and the three external collaborators. Every
//! operation converts its failures into a banner notice before returning, and
//! leaves the state idle again whatever the outcome. Callers may still inspect
//! the returned `Result`.
//!
//! Operations take `&self` and may overlap; the state lock is never held across
//! an `.await`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use confivote_runtime::{
    Address, DecryptionProof, RecordId, Result, ServiceError, TxReceipt, VoteError,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::candidate::Candidate;
use crate::config::ClientConfig;
use crate::draft::ValidVote;
use crate::notification::{Notifier, TxStatus};
use crate::services::{
    ContractReader, ContractWriter, FheSession, ProofSubmitter, ServiceResult, WalletSession,
};
use crate::state::AppState;
use crate::views::{self, Stats};

/// Submits a decryption proof through the signer-bound contract handle and
/// waits for it to be mined.
struct ChainSubmitter<'a, C> {
    writer: &'a C,
    id: &'a RecordId,
}

#[async_trait]
impl<'a, C: ContractWriter> ProofSubmitter for ChainSubmitter<'a, C> {
    async fn submit(
        &self,
        clear_values_encoded: Vec<u8>,
        proof: DecryptionProof,
    ) -> ServiceResult<()> {
        let tx = self.writer.verify_decryption(self.id, clear_values_encoded, proof).await?;
        let receipt = self.writer.wait_for_confirmation(tx).await?;
        debug!(record = %self.id, block = receipt.block_number, "decryption proof confirmed");
        Ok(())
    }
}

enum Decrypted {
    /// Value was already public, no decryption ran
    Stored(u32),
    Fresh(u32),
}

pub struct VoteController<W, F, R, C> {
    config: ClientConfig,
    wallet: W,
    fhe: F,
    reader: R,
    writer: C,
    state: Mutex<AppState>,
    notifier: Notifier,
    id_seq: AtomicU64,
}

impl<W, F, R, C> VoteController<W, F, R, C>
where
    W: WalletSession,
    F: FheSession,
    R: ContractReader,
    C: ContractWriter,
{
    pub fn new(config: ClientConfig, wallet: W, fhe: F, reader: R, writer: C) -> Self {
        let notifier = Notifier::new(config.success_delay(), config.error_delay());
        Self {
            config,
            wallet,
            fhe,
            reader,
            writer,
            state: Mutex::new(AppState::default()),
            notifier,
            id_seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.state.lock().clone()
    }

    /// Applies a state transition, e.g. `controller.update(|s| s.open_vote_modal())`.
    pub fn update<T>(&self, transition: impl FnOnce(&mut AppState) -> T) -> T {
        transition(&mut self.state.lock())
    }

    pub fn status(&self) -> TxStatus {
        self.notifier.current()
    }

    pub fn stats(&self) -> Stats {
        views::compute_stats(&self.state.lock().candidates)
    }

    pub fn rankings(&self) -> Vec<Candidate> {
        views::rank_verified(&self.state.lock().candidates, self.config.ranking_limit)
    }

    /// Candidates matching the current search term and category filter.
    pub fn visible_candidates(&self) -> Vec<Candidate> {
        let state = self.state.lock();
        views::filter_candidates(&state.candidates, &state.search_term, &state.category_filter)
    }

    pub fn categories(&self) -> Vec<String> {
        views::categories(&self.state.lock().candidates)
    }

    /// Candidates created by the connected account.
    pub fn my_candidates(&self) -> Vec<Candidate> {
        match self.connected_address() {
            Some(address) => views::created_by(&self.state.lock().candidates, &address),
            None => Vec::new(),
        }
    }

    fn connected_address(&self) -> Option<Address> {
        if self.wallet.is_connected() {
            self.wallet.address()
        } else {
            None
        }
    }

    fn next_record_id(&self) -> RecordId {
        let seq = self.id_seq.fetch_add(1, Ordering::Relaxed);
        RecordId::new(format!("vote-{}-{}", Utc::now().timestamp_millis(), seq))
    }

    /// Initializes the FHE session, then loads the candidate list.
    ///
    /// The list is read-only, so it loads even if the FHE session failed.
    pub async fn connect(&self) -> Result<usize> {
        // failure is already in the banner
        let _ = self.initialize_fhe().await;
        self.load_candidates().await
    }

    /// Initializes the FHE session once a wallet is connected.
    ///
    /// Returns whether the session is ready. A call made while another one is
    /// still in flight returns `Ok(false)` without touching the SDK. Failures are
    /// not retried.
    pub async fn initialize_fhe(&self) -> Result<bool> {
        if !self.wallet.is_connected() {
            debug!("wallet not connected, skipping FHE initialization");
            return Ok(false);
        }

        {
            let mut state = self.state.lock();
            if state.fhe_ready {
                return Ok(true);
            }
            if state.fhe_initializing {
                debug!("FHE initialization already in progress");
                return Ok(false);
            }
            state.fhe_initializing = true;
        }

        info!("initializing FHE session");
        let result = self.fhe.initialize().await;

        let mut state = self.state.lock();
        state.fhe_initializing = false;
        match result {
            Ok(()) => {
                state.fhe_ready = true;
                info!("FHE session ready");
                Ok(true)
            }
            Err(e) => {
                drop(state);
                warn!(error = %e, "FHE initialization failed");
                self.notifier.error(format!("FHE initialization failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// Reloads the full candidate list from the contract.
    ///
    /// A record that fails to load is skipped; the rest are still shown. Failing
    /// to list the identifiers aborts the load and keeps the previous list.
    pub async fn load_candidates(&self) -> Result<usize> {
        self.reload(false).await
    }

    /// User-triggered reload; same as [`Self::load_candidates`] but flagged as a
    /// refresh so the list stays rendered meanwhile.
    pub async fn refresh(&self) -> Result<usize> {
        self.reload(true).await
    }

    async fn reload(&self, refresh: bool) -> Result<usize> {
        self.update(|s| {
            if refresh {
                s.refreshing = true;
            } else {
                s.loading = true;
            }
        });

        let result = self.fetch_candidates().await;

        let mut state = self.state.lock();
        state.loading = false;
        state.refreshing = false;
        match result {
            Ok(candidates) => {
                let count = candidates.len();
                state.replace_candidates(candidates);
                Ok(count)
            }
            Err(e) => {
                drop(state);
                warn!(error = %e, "failed to load candidates");
                self.notifier.error("Failed to load data");
                Err(e)
            }
        }
    }

    async fn fetch_candidates(&self) -> Result<Vec<Candidate>> {
        let ids = self.reader.get_all_business_ids().await?;
        debug!(count = ids.len(), "fetched record ids");

        let mut candidates = Vec::with_capacity(ids.len());
        for id in ids {
            match self.reader.get_business_data(&id).await {
                Ok(record) => candidates.push(Candidate::from_record(id, record)),
                Err(e) => warn!(record = %id, error = %e, "skipping record that failed to load"),
            }
        }
        Ok(candidates)
    }

    /// Encrypts and submits the open draft, then reloads the list.
    pub async fn cast_vote(&self) -> Result<RecordId> {
        let Some(user) = self.connected_address() else {
            self.notifier.error("Please connect your wallet first");
            return Err(VoteError::WalletNotConnected);
        };

        let vote = {
            let mut state = self.state.lock();
            let vote = match state.draft.as_ref() {
                Some(draft) => draft.validate()?,
                None => return Err(VoteError::invalid_draft("no vote draft is open")),
            };
            if !state.fhe_ready {
                drop(state);
                self.notifier.error("FHE session is not ready yet");
                return Err(VoteError::FheNotReady);
            }
            state.submitting = true;
            vote
        };

        self.notifier.pending("Encrypting score with FHE...");
        let result = self.submit_vote(user, &vote).await;
        self.update(|s| s.submitting = false);

        match result {
            Ok((id, receipt)) => {
                info!(record = %id, block = receipt.block_number, "vote submitted");
                self.notifier.success("Vote submitted successfully!");
                self.update(AppState::close_vote_modal);
                // failures already surface as a notice
                let _ = self.load_candidates().await;
                Ok(id)
            }
            Err(e) => {
                let message = match e.service() {
                    Some(ServiceError::UserRejected) => "Transaction rejected by user".to_string(),
                    _ => format!("Submission failed: {e}"),
                };
                warn!(error = %e, "vote submission failed");
                self.notifier.error(message);
                Err(e)
            }
        }
    }

    async fn submit_vote(&self, user: Address, vote: &ValidVote) -> Result<(RecordId, TxReceipt)> {
        let id = self.next_record_id();
        let encrypted =
            self.fhe.encrypt(self.config.contract_address, user, u64::from(vote.score)).await?;
        debug!(record = %id, handle = %encrypted.handle, "score encrypted");

        self.notifier.pending("Submitting encrypted vote...");
        let tx = self
            .writer
            .create_business_data(
                &id,
                &vote.name,
                encrypted.handle,
                encrypted.proof,
                0,
                0,
                &vote.category,
            )
            .await?;

        self.notifier.pending("Waiting for transaction confirmation...");
        let receipt = self.writer.wait_for_confirmation(tx).await?;
        Ok((id, receipt))
    }

    /// Publicly decrypts a candidate's score and publishes the proof on-chain.
    ///
    /// Returns the stored value straight away if the record is already verified.
    /// Losing the race to another verifier counts as success.
    pub async fn decrypt_score(&self, id: &RecordId) -> Result<u32> {
        if self.connected_address().is_none() {
            self.notifier.error("Please connect your wallet first");
            return Err(VoteError::WalletNotConnected);
        }

        self.update(|s| s.decrypting = Some(id.clone()));
        let result = self.run_decryption(id).await;
        self.update(|s| s.decrypting = None);

        match result {
            Ok(Decrypted::Stored(value)) => {
                self.notifier.success("Data already verified on-chain");
                Ok(value)
            }
            Ok(Decrypted::Fresh(value)) => {
                info!(record = %id, value, "score decrypted and verified");
                self.notifier.success("Score decrypted and verified on-chain!");
                let _ = self.load_candidates().await;
                Ok(value)
            }
            Err(e) if e.service().is_some_and(ServiceError::is_already_verified) => {
                info!(record = %id, "record was verified concurrently");
                let record = match self.reader.get_business_data(id).await {
                    Ok(record) => record,
                    Err(e) => {
                        self.notifier.error(format!("Decryption failed: {e}"));
                        return Err(e.into());
                    }
                };
                // decrypted_value is meaningless until the flag is set
                if !record.is_verified {
                    let e = VoteError::other(format!("record {id} is not verified on-chain"));
                    warn!(record = %id, "already-verified revert but record is still encrypted");
                    self.notifier.error(format!("Decryption failed: {e}"));
                    return Err(e);
                }
                self.notifier.success("Data already verified on-chain");
                let _ = self.load_candidates().await;
                Ok(record.decrypted_value)
            }
            Err(e) => {
                warn!(record = %id, error = %e, "decryption failed");
                self.notifier.error(format!("Decryption failed: {e}"));
                Err(e)
            }
        }
    }

    async fn run_decryption(&self, id: &RecordId) -> Result<Decrypted> {
        let record = self.reader.get_business_data(id).await?;
        if record.is_verified {
            return Ok(Decrypted::Stored(record.decrypted_value));
        }

        let handle = self.reader.get_encrypted_value(id).await?;
        self.notifier.pending("Decrypting score and publishing proof...");

        let submitter = ChainSubmitter {
            writer: &self.writer,
            id,
        };
        let result = self
            .fhe
            .verify_decryption(&[handle], self.config.contract_address, &submitter)
            .await?;

        let value = result
            .clear_values
            .get(&handle)
            .ok_or_else(|| VoteError::other(format!("no clear value returned for {handle}")))?;
        let value = u32::try_from(value)
            .map_err(|_| VoteError::other(format!("decrypted value {value} out of range")))?;
        Ok(Decrypted::Fresh(value))
    }

    /// Pings the contract and reports the outcome in the banner.
    pub async fn check_availability(&self) -> Result<bool> {
        match self.reader.is_available().await {
            Ok(true) => {
                self.notifier.success("Contract is available");
                Ok(true)
            }
            Ok(false) => {
                self.notifier.error("Contract is not available");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "availability check failed");
                self.notifier.error(format!("Availability check failed: {e}"));
                Err(e.into())
            }
        }
    }
}
