//! Read-only operations; none of these submit a transaction

use super::{FlowError, FlowOutput, Orchestrator};
use crate::decode::{MintInfo, SystemConfigData, TokenConfigData, TokenRefundData};
use crate::fee::FeeQuote;
use crate::pda::associated_token_address;
use crate::tx_builder::InitializeAddresses;
use crate::types::{parse_address, pubkey_string, validate_token_identity, FlowResult, ReferralRecord, TokenMetadata};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

/// What a refund of one mint would return to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPreview {
    #[serde(with = "pubkey_string")]
    pub token_account: Pubkey,
    /// Raw token units a refund would burn
    pub token_balance: u64,
    pub refund_record: Option<TokenRefundData>,
}

impl Orchestrator {
    pub async fn lookup_referral(&self, code: &str) -> FlowResult<ReferralRecord> {
        let (logger, timer) = self.begin("lookup_referral", code);
        let result = self.resolve_referral(code).await.map(FlowOutput::query);
        self.finish(&logger, &timer, result)
    }

    pub async fn system_config(&self) -> FlowResult<SystemConfigData> {
        let (logger, timer) = self.begin("system_config", "");
        let result = self.try_system_config().await.map(FlowOutput::query);
        self.finish(&logger, &timer, result)
    }

    async fn try_system_config(&self) -> Result<SystemConfigData, FlowError> {
        let (address, _) = self.pdas.system_config(&self.config.network.system_deployer)?;
        self.fetch_optional(&address)
            .await?
            .ok_or_else(|| FlowError::precondition("System config account does not exist"))
    }

    /// Fee the caller would pay minting `mint_address` with `code`
    pub async fn quote_mint_fee(&self, mint_address: &str, code: &str) -> FlowResult<FeeQuote> {
        let (logger, timer) = self.begin("quote_mint_fee", mint_address);
        let result = self
            .try_quote_mint_fee(mint_address, code)
            .await
            .map(FlowOutput::query);
        self.finish(&logger, &timer, result)
    }

    async fn try_quote_mint_fee(&self, mint_address: &str, code: &str) -> Result<FeeQuote, FlowError> {
        let mint = parse_address("Mint address", mint_address)?;
        let referral = self.resolve_referral(code).await?;
        let (config_account, _) = self.pdas.config(&mint)?;
        let token_config: TokenConfigData = self
            .fetch_optional(&config_account)
            .await?
            .ok_or_else(|| FlowError::precondition("Token config account does not exist"))?;
        let referrer_ata = associated_token_address(&referral.referrer_main, &mint);
        self.quote_with_config(&mint, &token_config, &referrer_ata).await
    }

    pub async fn refund_preview(&self, mint_address: &str) -> FlowResult<RefundPreview> {
        let (logger, timer) = self.begin("refund_preview", mint_address);
        let result = self
            .try_refund_preview(mint_address)
            .await
            .map(FlowOutput::query);
        self.finish(&logger, &timer, result)
    }

    async fn try_refund_preview(&self, mint_address: &str) -> Result<RefundPreview, FlowError> {
        let owner = self.wallet()?.pubkey();
        let mint = parse_address("Mint address", mint_address)?;
        let token_account = associated_token_address(&owner, &mint);
        let token_balance = self
            .ledger
            .get_token_account_balance(&token_account)
            .await?
            .ok_or_else(|| FlowError::precondition("Token account does not exist"))?;
        let (refund_account, _) = self.pdas.refund(&mint, &owner)?;
        let refund_record = self.fetch_optional(&refund_account).await?;
        Ok(RefundPreview {
            token_account,
            token_balance,
            refund_record,
        })
    }

    /// Sanitized metadata of `mint_address`, with decimals from the mint
    pub async fn metadata(&self, mint_address: &str) -> FlowResult<TokenMetadata> {
        let (logger, timer) = self.begin("metadata", mint_address);
        let result = self.try_metadata(mint_address).await.map(FlowOutput::query);
        self.finish(&logger, &timer, result)
    }

    async fn try_metadata(&self, mint_address: &str) -> Result<TokenMetadata, FlowError> {
        let mint = parse_address("Mint address", mint_address)?;
        let mut metadata = self.read_metadata(&mint).await?;
        metadata.decimals = match self.ledger.get_account(&mint).await? {
            Some(account) => Some(MintInfo::decode(&account.data)?.decimals),
            None => None,
        };
        Ok(metadata)
    }

    /// Every address a launch of (`name`, `symbol`) would use; no ledger access
    pub fn derive_addresses(&self, name: &str, symbol: &str) -> FlowResult<InitializeAddresses> {
        let (logger, timer) = self.begin("derive", symbol);
        let result = validate_token_identity(name, symbol)
            .map_err(FlowError::from)
            .and_then(|_| Ok(InitializeAddresses::derive(&self.config.network, name, symbol)?))
            .map(FlowOutput::query);
        self.finish(&logger, &timer, result)
    }
}
