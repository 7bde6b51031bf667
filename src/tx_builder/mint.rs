//! Mint assembly

use crate::config::NetworkConfig;
use crate::pda::{associated_token_address, AddressError, PdaBuilder};
use crate::tx_builder::errors::AssemblyError;
use crate::tx_builder::instructions::{
    create_token_account, mint_tokens, plan_instructions, InstructionPlan, MintTokensAccounts,
};
use crate::tx_builder::pool::PoolAccounts;
use solana_sdk::pubkey::Pubkey;

/// Addresses touched by `mint_tokens`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintAddresses {
    pub user: Pubkey,
    pub mint: Pubkey,
    pub config_account: Pubkey,
    pub system_config_account: Pubkey,
    pub destination: Pubkey,
    pub destination_wsol_ata: Pubkey,
    pub refund_account: Pubkey,
    pub mint_token_vault: Pubkey,
    pub token_vault: Pubkey,
    pub wsol_vault: Pubkey,
    pub referrer_main: Pubkey,
    pub referrer_ata: Pubkey,
    pub referral_account: Pubkey,
    pub protocol_fee_account: Pubkey,
    pub protocol_wsol_vault: Pubkey,
}

impl MintAddresses {
    pub fn derive(
        network: &NetworkConfig,
        user: &Pubkey,
        mint: &Pubkey,
        referrer_main: &Pubkey,
    ) -> Result<Self, AddressError> {
        let pdas = PdaBuilder::new(network.program_id, network.metadata_program_id);
        let wsol_mint = spl_token::native_mint::id();
        let (config_account, _) = pdas.config(mint)?;
        let (system_config_account, _) = pdas.system_config(&network.system_deployer)?;
        let (refund_account, _) = pdas.refund(mint, user)?;
        let (referral_account, _) = pdas.referral(mint, referrer_main)?;
        Ok(Self {
            user: *user,
            mint: *mint,
            config_account,
            system_config_account,
            destination: associated_token_address(user, mint),
            destination_wsol_ata: associated_token_address(user, &wsol_mint),
            refund_account,
            mint_token_vault: associated_token_address(mint, mint),
            token_vault: associated_token_address(&config_account, mint),
            wsol_vault: associated_token_address(&config_account, &wsol_mint),
            referrer_main: *referrer_main,
            referrer_ata: associated_token_address(referrer_main, mint),
            referral_account,
            protocol_fee_account: network.protocol_fee_account,
            protocol_wsol_vault: associated_token_address(&network.protocol_fee_account, &wsol_mint),
        })
    }
}

/// Everything the mint transaction needs beyond the derived addresses
#[derive(Debug, Clone)]
pub struct MintParams<'a> {
    pub name: &'a str,
    pub symbol: &'a str,
    pub code_hash: Pubkey,
    /// Create the user's token account first
    pub create_destination: bool,
    /// Create the user's wrapped-native account first
    pub create_wsol_account: bool,
    pub compute_units: u32,
}

/// `[compute budget, create wrapped native?, create token account?, mint_tokens]`
pub fn assemble_mint(
    network: &NetworkConfig,
    addresses: &MintAddresses,
    pool: &PoolAccounts,
    params: &MintParams<'_>,
) -> Result<InstructionPlan, AssemblyError> {
    let user = &addresses.user;
    let mut creations = Vec::with_capacity(2);
    if params.create_wsol_account {
        creations.push(create_token_account(user, user, &spl_token::native_mint::id()));
    }
    if params.create_destination {
        creations.push(create_token_account(user, user, &addresses.mint));
    }

    let accounts = MintTokensAccounts {
        mint: addresses.mint,
        destination: addresses.destination,
        destination_wsol_ata: addresses.destination_wsol_ata,
        refund_account: addresses.refund_account,
        user: addresses.user,
        config_account: addresses.config_account,
        system_config_account: addresses.system_config_account,
        mint_token_vault: addresses.mint_token_vault,
        token_vault: addresses.token_vault,
        wsol_vault: addresses.wsol_vault,
        wsol_mint: spl_token::native_mint::id(),
        referrer_ata: addresses.referrer_ata,
        referrer_main: addresses.referrer_main,
        referral_account: addresses.referral_account,
        protocol_fee_account: addresses.protocol_fee_account,
        protocol_wsol_vault: addresses.protocol_wsol_vault,
        pool_state: pool.pool_state,
        amm_config: pool.amm_config,
        cp_swap_program: pool.swap_program,
        token0_mint: pool.token0_mint,
        token1_mint: pool.token1_mint,
    };
    let ix = mint_tokens(
        &network.program_id,
        &accounts,
        pool.remaining_accounts(),
        params.name,
        params.symbol,
        &params.code_hash,
    )?;
    plan_instructions(params.compute_units, creations, ix)
}
