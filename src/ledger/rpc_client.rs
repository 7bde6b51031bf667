use super::{LedgerError, LedgerRpc, SignatureState, SimulationOutcome};
use async_trait::async_trait;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig, RpcTransactionConfig},
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::VersionedTransaction,
};
use solana_transaction_status::{option_serializer::OptionSerializer, UiTransactionEncoding};
use std::sync::Arc;
use tracing::debug;

/// [`LedgerRpc`] over the nonblocking JSON-RPC client, at `confirmed` commitment
#[derive(Clone)]
pub struct RpcLedger {
    client: Arc<RpcClient>,
    endpoint: String,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    pub fn new(url: impl Into<String>) -> Self {
        let endpoint = url.into();
        let commitment = CommitmentConfig::confirmed();
        Self {
            client: Arc::new(RpcClient::new_with_commitment(endpoint.clone(), commitment)),
            endpoint,
            commitment,
        }
    }

    fn map_err(&self, err: solana_client::client_error::ClientError) -> LedgerError {
        LedgerError::from_client_error(err, &self.endpoint)
    }
}

#[async_trait]
impl LedgerRpc for RpcLedger {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, LedgerError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(response.value)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        self.client
            .get_balance_with_commitment(address, self.commitment)
            .await
            .map(|r| r.value)
            .map_err(|e| self.map_err(e))
    }

    async fn get_latest_blockhash(&self) -> Result<(Hash, u64), LedgerError> {
        self.client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn get_block_height(&self) -> Result<u64, LedgerError> {
        self.client
            .get_block_height_with_commitment(self.commitment)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<SimulationOutcome, LedgerError> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: false,
            commitment: Some(self.commitment),
            ..Default::default()
        };
        let response = self
            .client
            .simulate_transaction_with_config(transaction, config)
            .await
            .map_err(|e| self.map_err(e))?;
        let value = response.value;
        debug!(
            endpoint = %self.endpoint,
            units_consumed = ?value.units_consumed,
            failed = value.err.is_some(),
            "Simulation returned"
        );
        Ok(SimulationOutcome {
            err: value.err.map(|e| e.to_string()),
            logs: value.logs.unwrap_or_default(),
            units_consumed: value.units_consumed,
        })
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, LedgerError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            preflight_commitment: Some(self.commitment.commitment),
            ..Default::default()
        };
        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureState>, LedgerError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(response.value.into_iter().next().flatten().map(|status| SignatureState {
            confirmed: status.satisfies_commitment(self.commitment),
            err: status.err.map(|e| e.to_string()),
        }))
    }

    async fn get_transaction_logs(&self, signature: &Signature) -> Result<Vec<String>, LedgerError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };
        let transaction = self
            .client
            .get_transaction_with_config(signature, config)
            .await
            .map_err(|e| self.map_err(e))?;
        let logs = match transaction.transaction.meta.map(|meta| meta.log_messages) {
            Some(OptionSerializer::Some(logs)) => logs,
            _ => Vec::new(),
        };
        Ok(logs)
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<Option<u64>, LedgerError> {
        match self
            .client
            .get_token_account_balance_with_commitment(address, self.commitment)
            .await
        {
            Ok(response) => response
                .value
                .amount
                .parse::<u64>()
                .map(Some)
                .map_err(|e| LedgerError::InvalidResponse(format!("token amount: {}", e))),
            Err(e) => match self.map_err(e) {
                LedgerError::AccountNotFound { .. } => Ok(None),
                // Non-token accounts surface as invalid params
                LedgerError::RpcResponse { message, .. } if message.contains("not a Token account") => Ok(None),
                other => Err(other),
            },
        }
    }
}
