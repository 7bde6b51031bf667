//! Fairmint - client-side transaction core for a fair-mint token launch program
//!
//! Derives program addresses, quotes referral fees, decodes on-chain
//! records, assembles initialize / mint / refund transactions and drives
//! them through simulate → sign → broadcast → confirm.

pub mod config;
pub mod decode;
pub mod fee;
pub mod flows;
pub mod ledger;
pub mod metrics;
pub mod pda;
pub mod program;
pub mod structured_logging;
pub mod submission;
pub mod tx_builder;
pub mod types;
pub mod wallet;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

pub use config::{Config, Network, NetworkConfig};
pub use flows::{FlowError, FlowObserver, InitializeRequest, Orchestrator};
pub use ledger::{LedgerError, LedgerRpc, RpcLedger};
pub use types::{FlowResult, InitializePayload, TokenMetadata, TransactionPayload};
pub use wallet::{LocalWallet, WalletSigner};

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
