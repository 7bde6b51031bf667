use super::{SubmissionError, SubmissionLock};
use crate::config::PipelineConfig;
use crate::ledger::{is_already_processed_message, LedgerRpc};
use crate::metrics::{Metrics, Timer};
use crate::wallet::{WalletError, WalletSigner};
use solana_sdk::{signature::Signature, transaction::VersionedTransaction};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Caveat attached when the ledger reports the transaction as already processed
pub const ALREADY_PROCESSED_CAVEAT: &str =
    "This transaction has already been processed; its final status could not be verified";

/// Unsigned transaction plus the last block height its blockhash is valid for
#[derive(Debug, Clone)]
pub struct BuiltTransaction {
    pub transaction: VersionedTransaction,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Built,
    Simulated,
    Signed,
    Broadcast,
    Confirmed,
    Failed,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStage::Built => "built",
            SubmissionStage::Simulated => "simulated",
            SubmissionStage::Signed => "signed",
            SubmissionStage::Broadcast => "broadcast",
            SubmissionStage::Confirmed => "confirmed",
            SubmissionStage::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Confirmed,
    /// Reported as already processed and not verifiable afterwards
    AlreadyProcessed { caveat: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// `None` when the remap happened before signing
    pub signature: Option<Signature>,
    pub outcome: SubmissionOutcome,
    pub units_consumed: Option<u64>,
}

impl SubmissionReceipt {
    pub fn is_confirmed(&self) -> bool {
        self.outcome == SubmissionOutcome::Confirmed
    }

    pub fn caveat(&self) -> Option<&str> {
        match &self.outcome {
            SubmissionOutcome::AlreadyProcessed { caveat } => Some(caveat),
            SubmissionOutcome::Confirmed => None,
        }
    }
}

/// Drives one transaction from simulation to confirmation
pub struct SubmissionPipeline {
    ledger: Arc<dyn LedgerRpc>,
    lock: SubmissionLock,
    config: PipelineConfig,
    metrics: Option<Arc<Metrics>>,
}

impl SubmissionPipeline {
    pub fn new(ledger: Arc<dyn LedgerRpc>, config: PipelineConfig) -> Self {
        let lock = SubmissionLock::in_memory(Duration::from_millis(config.lock_window_ms));
        Self {
            ledger,
            lock,
            config,
            metrics: None,
        }
    }

    pub fn with_lock(mut self, lock: SubmissionLock) -> Self {
        self.lock = lock;
        self
    }

    pub fn set_lock(&mut self, lock: SubmissionLock) {
        self.lock = lock;
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerRpc> {
        &self.ledger
    }

    pub fn lock(&self) -> &SubmissionLock {
        &self.lock
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Simulate, sign with `wallet`, broadcast and confirm `built`.
    ///
    /// The lock is held for the whole call and released on every return path.
    pub async fn submit(
        &self,
        wallet: &dyn WalletSigner,
        built: BuiltTransaction,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let _guard = match self.lock.acquire() {
            Ok(guard) => guard,
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.lock_rejections.inc();
                }
                warn!(error = %e, "Submission refused");
                return Err(e);
            }
        };

        let timer = Timer::start();
        if let Some(m) = &self.metrics {
            m.submissions_total.inc();
        }

        let result = self.run(wallet, built).await;

        if let Some(m) = &self.metrics {
            match &result {
                Ok(receipt) if receipt.is_confirmed() => m.submissions_confirmed.inc(),
                Ok(_) => m.already_processed.inc(),
                Err(SubmissionError::Simulation { .. }) => {
                    m.simulation_rejections.inc();
                    m.submissions_failed.inc();
                }
                Err(_) => m.submissions_failed.inc(),
            }
            timer.observe_duration(&m.submission_latency);
        }

        match &result {
            Ok(receipt) => info!(
                signature = ?receipt.signature,
                caveat = ?receipt.caveat(),
                latency_ms = timer.elapsed_ms(),
                "Submission finished"
            ),
            Err(e) => warn!(
                stage = %SubmissionStage::Failed,
                category = e.category(),
                error = %e,
                latency_ms = timer.elapsed_ms(),
                "Submission failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        wallet: &dyn WalletSigner,
        built: BuiltTransaction,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let BuiltTransaction {
            transaction,
            last_valid_block_height,
        } = built;
        debug!(stage = %SubmissionStage::Built, last_valid_block_height, "Submitting transaction");

        let simulation = match self.ledger.simulate_transaction(&transaction).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_already_processed() => return Ok(already_processed(None, None)),
            Err(e) => return Err(e.into()),
        };
        if let Some(message) = simulation.err {
            if is_already_processed_message(&message) {
                return Ok(already_processed(None, simulation.units_consumed));
            }
            return Err(SubmissionError::Simulation {
                message,
                logs: simulation.logs,
            });
        }
        debug!(
            stage = %SubmissionStage::Simulated,
            units_consumed = ?simulation.units_consumed,
            "Simulation passed"
        );

        let signed = wallet.sign_transaction(transaction).await?;
        let signature = signed
            .signatures
            .first()
            .copied()
            .ok_or_else(|| WalletError::Signing("wallet returned no signature".to_string()))?;
        debug!(stage = %SubmissionStage::Signed, signature = %signature, "Transaction signed");

        match self.ledger.send_transaction(&signed).await {
            Ok(sent) if sent != signature => {
                warn!(expected = %signature, returned = %sent, "RPC returned a different signature");
            }
            Ok(_) => {}
            Err(e) if e.is_already_processed() => {
                return Ok(self
                    .resolve_already_processed(signature, simulation.units_consumed)
                    .await);
            }
            Err(e) => return Err(SubmissionError::Broadcast(e)),
        }
        debug!(stage = %SubmissionStage::Broadcast, signature = %signature, "Transaction sent");

        self.confirm(signature, last_valid_block_height).await?;
        debug!(stage = %SubmissionStage::Confirmed, signature = %signature, "Transaction confirmed");

        Ok(SubmissionReceipt {
            signature: Some(signature),
            outcome: SubmissionOutcome::Confirmed,
            units_consumed: simulation.units_consumed,
        })
    }

    /// One status lookup; anything short of a clean confirmation keeps the caveat
    async fn resolve_already_processed(
        &self,
        signature: Signature,
        units_consumed: Option<u64>,
    ) -> SubmissionReceipt {
        match self.ledger.get_signature_status(&signature).await {
            Ok(Some(state)) if state.confirmed && state.err.is_none() => {
                debug!(signature = %signature, "Already-processed transaction is confirmed");
                SubmissionReceipt {
                    signature: Some(signature),
                    outcome: SubmissionOutcome::Confirmed,
                    units_consumed,
                }
            }
            Ok(state) => {
                debug!(signature = %signature, state = ?state, "Already-processed status unverified");
                already_processed(Some(signature), units_consumed)
            }
            Err(e) => {
                debug!(signature = %signature, error = %e, "Status lookup failed");
                already_processed(Some(signature), units_consumed)
            }
        }
    }

    /// Poll until confirmed, failed on chain, expired or timed out
    async fn confirm(
        &self,
        signature: Signature,
        last_valid_block_height: u64,
    ) -> Result<(), SubmissionError> {
        let started = tokio::time::Instant::now();
        let timeout = self.config.confirm_timeout();
        let poll = self.config.confirm_poll_interval();

        loop {
            match self.ledger.get_signature_status(&signature).await {
                Ok(Some(state)) => {
                    if let Some(message) = state.err {
                        let logs = self.failure_logs(&signature).await;
                        return Err(SubmissionError::Confirmation {
                            signature,
                            message,
                            logs,
                        });
                    }
                    if state.confirmed {
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_retryable() => {
                    debug!(signature = %signature, error = %e, "Status poll failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }

            match self.ledger.get_block_height().await {
                Ok(height) if height > last_valid_block_height => {
                    return Err(SubmissionError::Expired { signature });
                }
                Ok(_) => {}
                Err(e) if e.is_retryable() => {
                    debug!(error = %e, "Block height poll failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(SubmissionError::Timeout {
                    signature,
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn failure_logs(&self, signature: &Signature) -> Vec<String> {
        match self.ledger.get_transaction_logs(signature).await {
            Ok(logs) => logs,
            Err(e) => {
                warn!(signature = %signature, error = %e, "Could not fetch transaction logs");
                Vec::new()
            }
        }
    }
}

fn already_processed(signature: Option<Signature>, units_consumed: Option<u64>) -> SubmissionReceipt {
    SubmissionReceipt {
        signature,
        outcome: SubmissionOutcome::AlreadyProcessed {
            caveat: ALREADY_PROCESSED_CAVEAT.to_string(),
        },
        units_consumed,
    }
}
