//! Transaction status banner.
//!
//! A single slot, `hidden -> pending -> {success | error} -> hidden`. Every
//! `show` overwrites whatever is displayed and cancels the previous dismissal
//! timer. Timers also carry the generation they were armed for and only clear
//! the slot if no newer notice replaced it in the meantime.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxPhase {
    Pending,
    Success,
    Error,
}

/// Snapshot of the banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatus {
    pub visible: bool,
    pub phase: TxPhase,
    pub message: String,
}

impl TxStatus {
    pub fn hidden() -> Self {
        Self {
            visible: false,
            phase: TxPhase::Pending,
            message: String::new(),
        }
    }
}

impl Default for TxStatus {
    fn default() -> Self {
        Self::hidden()
    }
}

#[derive(Debug)]
struct Slot {
    status: TxStatus,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Owner of the banner slot. Clones share the same slot.
#[derive(Debug, Clone)]
pub struct Notifier {
    slot: Arc<Mutex<Slot>>,
    success_delay: Duration,
    error_delay: Duration,
}

impl Notifier {
    pub fn new(success_delay: Duration, error_delay: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                status: TxStatus::hidden(),
                generation: 0,
                timer: None,
            })),
            success_delay,
            error_delay,
        }
    }

    pub fn current(&self) -> TxStatus {
        self.slot.lock().status.clone()
    }

    pub fn pending(&self, message: impl Into<String>) {
        self.show(TxPhase::Pending, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(TxPhase::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(TxPhase::Error, message);
    }

    /// Replaces the current notice.
    ///
    /// Success and error notices dismiss themselves after their delay. When no
    /// tokio runtime is running the notice stays until the next `show` or `hide`.
    pub fn show(&self, phase: TxPhase, message: impl Into<String>) {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.status = TxStatus {
            visible: true,
            phase,
            message: message.into(),
        };

        let delay = match phase {
            TxPhase::Pending => return,
            TxPhase::Success => self.success_delay,
            TxPhase::Error => self.error_delay,
        };
        let Ok(handle) = Handle::try_current() else {
            return;
        };

        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        slot.timer = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut slot = shared.lock();
            if slot.generation == generation {
                slot.status = TxStatus::hidden();
                slot.timer = None;
            }
        }));
    }

    pub fn hide(&self) {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.status = TxStatus::hidden();
    }
}
