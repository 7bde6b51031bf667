//! Initialize-token assembly

use crate::config::NetworkConfig;
use crate::decode::InitializeTokenConfigData;
use crate::pda::{associated_token_address, AddressError, PdaBuilder};
use crate::program::TOKEN_DECIMALS;
use crate::tx_builder::errors::AssemblyError;
use crate::tx_builder::instructions::{
    initialize_token, plan_instructions, InitializeTokenAccounts, InstructionPlan, TokenMetadataArgs,
};
use crate::types::{pubkey_string, TokenMetadata};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

/// Addresses touched by `initialize_token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeAddresses {
    #[serde(with = "pubkey_string")]
    pub mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub config_account: Pubkey,
    #[serde(with = "pubkey_string")]
    pub metadata_account: Pubkey,
    #[serde(with = "pubkey_string")]
    pub system_config_account: Pubkey,
    #[serde(with = "pubkey_string")]
    pub mint_token_vault: Pubkey,
    #[serde(with = "pubkey_string")]
    pub token_vault: Pubkey,
    #[serde(with = "pubkey_string")]
    pub wsol_vault: Pubkey,
}

impl InitializeAddresses {
    pub fn derive(network: &NetworkConfig, name: &str, symbol: &str) -> Result<Self, AddressError> {
        let pdas = PdaBuilder::new(network.program_id, network.metadata_program_id);
        let (mint, _) = pdas.mint(name, symbol)?;
        let (config_account, _) = pdas.config(&mint)?;
        let (metadata_account, _) = pdas.metadata(&mint)?;
        let (system_config_account, _) = pdas.system_config(&network.system_deployer)?;
        let wsol_mint = spl_token::native_mint::id();
        Ok(Self {
            mint,
            config_account,
            metadata_account,
            system_config_account,
            mint_token_vault: associated_token_address(&mint, &mint),
            token_vault: associated_token_address(&config_account, &mint),
            wsol_vault: associated_token_address(&config_account, &wsol_mint),
        })
    }
}

/// `[compute budget, initialize_token]`
pub fn assemble_initialize(
    network: &NetworkConfig,
    payer: &Pubkey,
    addresses: &InitializeAddresses,
    metadata: &TokenMetadata,
    config: &InitializeTokenConfigData,
    compute_units: u32,
) -> Result<InstructionPlan, AssemblyError> {
    let metadata = metadata.sanitized();
    let accounts = InitializeTokenAccounts {
        metadata: addresses.metadata_account,
        payer: *payer,
        mint: addresses.mint,
        config_account: addresses.config_account,
        mint_token_vault: addresses.mint_token_vault,
        token_vault: addresses.token_vault,
        wsol_mint: spl_token::native_mint::id(),
        wsol_vault: addresses.wsol_vault,
        system_config_account: addresses.system_config_account,
        launch_rule_account: network.launch_rule_account,
        protocol_fee_account: network.protocol_fee_account,
        token_metadata_program: network.metadata_program_id,
    };
    let args = TokenMetadataArgs {
        name: metadata.name,
        symbol: metadata.symbol,
        uri: metadata.uri,
        decimals: metadata.decimals.unwrap_or(TOKEN_DECIMALS),
    };
    let ix = initialize_token(&network.program_id, &accounts, &args, config)?;
    plan_instructions(compute_units, Vec::new(), ix)
}
