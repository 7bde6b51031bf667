//! Caller-facing flows
//!
//! [`Orchestrator`] owns the ledger handle, the optional wallet and the
//! submission pipeline. Every public operation runs
//! derive → validate → assemble → submit in order and returns a
//! [`FlowResult`]; no error escapes as a panic or a bare `Err`.

pub mod errors;
mod initialize;
mod mint;
mod queries;
mod refund;

pub use errors::FlowError;
pub use initialize::InitializeRequest;
pub use mint::REFERRAL_USED_UP;
pub use queries::RefundPreview;
pub use refund::REFUND_CAVEAT;

use crate::config::{Config, LaunchPreset, NetworkConfig};
use crate::decode::{LegacyMetadata, MintInfo, ProgramAccount};
use crate::ledger::LedgerRpc;
use crate::metrics::{Metrics, Timer};
use crate::pda::PdaBuilder;
use crate::structured_logging::FlowLogger;
use crate::submission::{
    BuiltTransaction, Clock, LockStore, MemoryLockStore, SubmissionLock, SubmissionPipeline,
    SubmissionReceipt, SystemClock,
};
use crate::tx_builder::{
    build_transaction, build_transaction_auto, decode_lookup_table, InstructionPlan, MessageFormat,
};
use crate::types::{FlowResult, TokenMetadata};
use crate::wallet::WalletSigner;
use solana_sdk::{address_lookup_table::AddressLookupTableAccount, pubkey::Pubkey};
use std::sync::Arc;
use std::time::Duration;

/// Callbacks fired around every public operation
///
/// `on_start` fires once per call, followed by exactly one of
/// `on_error` or `on_success`.
pub trait FlowObserver: Send + Sync {
    fn on_start(&self, _operation: &str) {}
    fn on_error(&self, _operation: &str, _message: &str) {}
    fn on_success(&self, _operation: &str, _caveat: Option<&str>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FlowObserver for NoopObserver {}

/// Successful flow result before it is wrapped in the envelope
struct FlowOutput<T> {
    data: T,
    signature: Option<String>,
    caveat: Option<String>,
}

impl<T> FlowOutput<T> {
    fn query(data: T) -> Self {
        Self {
            data,
            signature: None,
            caveat: None,
        }
    }
}

pub struct Orchestrator {
    config: Config,
    ledger: Arc<dyn LedgerRpc>,
    wallet: Option<Arc<dyn WalletSigner>>,
    pipeline: SubmissionPipeline,
    observer: Arc<dyn FlowObserver>,
    clock: Arc<dyn Clock>,
    lock_store: Arc<dyn LockStore>,
    pdas: PdaBuilder,
}

impl Orchestrator {
    pub fn new(config: &Config, ledger: Arc<dyn LedgerRpc>) -> Self {
        let pipeline = SubmissionPipeline::new(ledger.clone(), config.pipeline.clone());
        let mut orchestrator = Self {
            pdas: PdaBuilder::new(config.network.program_id, config.network.metadata_program_id),
            config: config.clone(),
            ledger,
            wallet: None,
            pipeline,
            observer: Arc::new(NoopObserver),
            clock: Arc::new(SystemClock),
            lock_store: Arc::new(MemoryLockStore::new()),
        };
        orchestrator.rebuild_lock();
        orchestrator
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletSigner>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn FlowObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Clock used for the submission lock and the initialize start time
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.rebuild_lock();
        self
    }

    /// Share the submission lock record with other orchestrators
    pub fn with_lock_store(mut self, store: Arc<dyn LockStore>) -> Self {
        self.lock_store = store;
        self.rebuild_lock();
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.pipeline = self.pipeline.with_metrics(metrics);
        self
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.config.network
    }

    pub fn pipeline(&self) -> &SubmissionPipeline {
        &self.pipeline
    }

    fn rebuild_lock(&mut self) {
        let window = Duration::from_millis(self.pipeline.config().lock_window_ms);
        let lock = SubmissionLock::new(self.lock_store.clone(), self.clock.clone(), window);
        self.pipeline.set_lock(lock);
    }

    fn wallet(&self) -> Result<Arc<dyn WalletSigner>, FlowError> {
        self.wallet
            .clone()
            .ok_or_else(|| FlowError::precondition("Wallet is not connected"))
    }

    fn preset(&self, token_type: &str) -> Option<&LaunchPreset> {
        self.config.preset(token_type)
    }

    fn begin(&self, operation: &'static str, subject: &str) -> (FlowLogger, Timer) {
        let logger = FlowLogger::new(operation);
        logger.log_start(subject);
        self.observer.on_start(operation);
        (logger, Timer::start())
    }

    /// Log, notify the observer exactly once, and wrap in the envelope
    fn finish<T>(
        &self,
        logger: &FlowLogger,
        timer: &Timer,
        result: Result<FlowOutput<T>, FlowError>,
    ) -> FlowResult<T> {
        let operation = logger.operation();
        match result {
            Ok(output) => {
                logger.log_success(
                    output.signature.as_deref(),
                    output.caveat.as_deref(),
                    timer.elapsed_ms(),
                );
                self.observer.on_success(operation, output.caveat.as_deref());
                match output.caveat {
                    Some(caveat) => FlowResult::ok_with_caveat(output.data, caveat),
                    None => FlowResult::ok(output.data),
                }
            }
            Err(err) => {
                let message = err.to_string();
                match &err {
                    FlowError::Validation(_) | FlowError::Precondition(_) => {
                        logger.log_rejected(err.category(), &message)
                    }
                    _ => {
                        logger.log_program_logs(err.logs());
                        logger.log_failure(err.category(), &message, timer.elapsed_ms());
                    }
                }
                self.observer.on_error(operation, &message);
                FlowResult::failure(message)
            }
        }
    }

    /// `None` when the account does not exist
    async fn fetch_optional<T: ProgramAccount>(&self, address: &Pubkey) -> Result<Option<T>, FlowError> {
        match self.ledger.get_account(address).await? {
            Some(account) => Ok(Some(T::decode(&account.data)?)),
            None => Ok(None),
        }
    }

    async fn mint_info(&self, mint: &Pubkey) -> Result<MintInfo, FlowError> {
        let account = self.ledger.get_account(mint).await?;
        Ok(MintInfo::from_account_data(account.as_ref().map(|a| a.data.as_slice()))?)
    }

    /// Name, symbol and uri from the mint's legacy metadata account
    async fn read_metadata(&self, mint: &Pubkey) -> Result<TokenMetadata, FlowError> {
        let (metadata_account, _) = self.pdas.metadata(mint)?;
        let account = self.ledger.get_account(&metadata_account).await?;
        let metadata = LegacyMetadata::from_account_data(account.as_ref().map(|a| a.data.as_slice()))?;
        Ok(metadata.token_metadata())
    }

    /// Configured lookup table, fetched fresh
    async fn lookup_table(&self) -> Result<Option<AddressLookupTableAccount>, FlowError> {
        let address = self.config.network.lookup_table;
        match self.ledger.get_account(&address).await? {
            Some(account) => Ok(Some(decode_lookup_table(address, &account.data)?)),
            None => Ok(None),
        }
    }

    /// Compile against a fresh blockhash; `format: None` picks legacy when it fits
    async fn build(
        &self,
        payer: &Pubkey,
        plan: &InstructionPlan,
        format: Option<MessageFormat>,
        lookup_table: Option<&AddressLookupTableAccount>,
    ) -> Result<BuiltTransaction, FlowError> {
        let (blockhash, last_valid_block_height) = self.ledger.get_latest_blockhash().await?;
        let transaction = match format {
            Some(format) => {
                build_transaction(format, payer, &plan.instructions, lookup_table, blockhash)?
            }
            None => build_transaction_auto(payer, &plan.instructions, lookup_table, blockhash)?,
        };
        Ok(BuiltTransaction {
            transaction,
            last_valid_block_height,
        })
    }

    async fn submit(
        &self,
        wallet: &dyn WalletSigner,
        built: BuiltTransaction,
    ) -> Result<SubmissionReceipt, FlowError> {
        Ok(self.pipeline.submit(wallet, built).await?)
    }
}
