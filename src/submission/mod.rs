//! Simulate, sign, broadcast and confirm
//!
//! Every transaction the flows assemble goes through [`SubmissionPipeline`]:
//! `Built → Simulated → Signed → Broadcast → Confirmed | Failed`. A
//! [`SubmissionLock`] keeps a second submission from starting while one is
//! still in flight.

mod lock;
mod pipeline;

pub use lock::{Clock, LockGuard, LockRecord, LockStore, MemoryLockStore, SubmissionLock, SystemClock};
pub use pipeline::{
    BuiltTransaction, SubmissionOutcome, SubmissionPipeline, SubmissionReceipt, SubmissionStage,
    ALREADY_PROCESSED_CAVEAT,
};

use crate::ledger::LedgerError;
use crate::wallet::WalletError;
use solana_sdk::signature::Signature;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Transaction is still processing, retry in {retry_after_ms}ms")]
    StillProcessing { retry_after_ms: u64 },

    #[error("Transaction simulation failed: {message}")]
    Simulation { message: String, logs: Vec<String> },

    #[error("Wallet signing failed: {0}")]
    Signing(#[from] WalletError),

    #[error("Broadcast failed: {0}")]
    Broadcast(LedgerError),

    #[error("Transaction {signature} failed: {message}")]
    Confirmation {
        signature: Signature,
        message: String,
        logs: Vec<String>,
    },

    #[error("Transaction {signature} expired before it was confirmed")]
    Expired { signature: Signature },

    #[error("Timed out after {waited_ms}ms waiting for {signature}")]
    Timeout { signature: Signature, waited_ms: u64 },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl SubmissionError {
    /// Program log lines attached to the failure, if any
    pub fn logs(&self) -> Option<&[String]> {
        match self {
            SubmissionError::Simulation { logs, .. } | SubmissionError::Confirmation { logs, .. } => {
                Some(logs)
            }
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            SubmissionError::StillProcessing { .. } => true,
            SubmissionError::Expired { .. } => true,
            SubmissionError::Broadcast(e) | SubmissionError::Ledger(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            SubmissionError::StillProcessing { .. } => "still_processing",
            SubmissionError::Simulation { .. } => "simulation",
            SubmissionError::Signing(_) => "signing",
            SubmissionError::Broadcast(_) => "broadcast",
            SubmissionError::Confirmation { .. } => "confirmation",
            SubmissionError::Expired { .. } => "expired",
            SubmissionError::Timeout { .. } => "timeout",
            SubmissionError::Ledger(e) => e.category(),
        }
    }
}
