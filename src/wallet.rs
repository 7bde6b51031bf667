//! Wallet capability consumed by the flows

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("User rejected the request")]
    Rejected,
}

/// Signs transactions on behalf of the user.
///
/// Implementations hold the key material; the flows only ever see the
/// public key and signed transactions.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign a transaction whose message is final; returns the signed copy
    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, WalletError>;

    async fn sign_all_transactions(
        &self,
        transactions: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, WalletError> {
        let mut signed = Vec::with_capacity(transactions.len());
        for tx in transactions {
            signed.push(self.sign_transaction(tx).await?);
        }
        Ok(signed)
    }
}

/// Wallet backed by a local keypair file
#[derive(Clone)]
pub struct LocalWallet {
    keypair: Arc<Keypair>,
}

impl LocalWallet {
    /// Load a keypair file, either 64 raw bytes or a JSON byte array
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let keypair_bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read keypair file: {}", path.display()))?;

        let secret: Vec<u8> = if keypair_bytes.len() == 64 {
            keypair_bytes
        } else {
            serde_json::from_slice(&keypair_bytes).context("Failed to parse keypair JSON")?
        };
        if secret.len() != 64 {
            anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", secret.len());
        }
        if secret.iter().all(|&b| b == 0) {
            anyhow::bail!("Invalid keypair: all-zero key rejected");
        }
        let keypair = Keypair::try_from(secret.as_slice()).context("Invalid keypair bytes")?;

        Ok(Self::from_keypair(keypair))
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, WalletError> {
        VersionedTransaction::try_new(transaction.message, &[self.keypair.as_ref()])
            .map_err(|e| WalletError::Signing(e.to_string()))
    }
}
