//! Ledger RPC seam
//!
//! Flows and the submission pipeline only see [`LedgerRpc`]; the production
//! implementation wraps the nonblocking RPC client and tests substitute an
//! in-memory ledger.

mod errors;
mod rpc_client;

pub use errors::{is_already_processed_message, LedgerError};
pub use rpc_client::RpcLedger;

use async_trait::async_trait;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};

/// Result of a preflight simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Execution error, if the program rejected the transaction
    pub err: Option<String>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

impl SimulationOutcome {
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}

/// Latest status of a submitted signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureState {
    /// Reached at least `confirmed` commitment
    pub confirmed: bool,
    /// On-chain execution error
    pub err: Option<String>,
}

/// Ledger operations used by the flows
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Endpoint label used in logs and errors
    fn endpoint(&self) -> &str;

    /// `None` when the account does not exist
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, LedgerError>;

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError>;

    /// Latest blockhash and the last block height at which it is valid
    async fn get_latest_blockhash(&self) -> Result<(Hash, u64), LedgerError>;

    async fn get_block_height(&self) -> Result<u64, LedgerError>;

    /// Simulate without signature verification
    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<SimulationOutcome, LedgerError>;

    /// Broadcast a signed transaction, skipping the RPC node's own preflight
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, LedgerError>;

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureState>, LedgerError>;

    /// Log lines of a landed transaction
    async fn get_transaction_logs(&self, signature: &Signature) -> Result<Vec<String>, LedgerError>;

    /// Raw token amount of a token account; `None` when it does not exist
    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<Option<u64>, LedgerError>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, LedgerError> {
        Ok(self.get_account(address).await?.is_some())
    }
}
