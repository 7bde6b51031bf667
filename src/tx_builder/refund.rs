//! Refund assembly

use crate::config::NetworkConfig;
use crate::pda::{associated_token_address, AddressError, PdaBuilder};
use crate::tx_builder::errors::AssemblyError;
use crate::tx_builder::instructions::{
    create_token_account, plan_instructions, refund, InstructionPlan, RefundAccounts,
};
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundAddresses {
    pub payer: Pubkey,
    pub mint: Pubkey,
    pub config_account: Pubkey,
    pub system_config_account: Pubkey,
    pub refund_account: Pubkey,
    pub token_ata: Pubkey,
    pub token_vault: Pubkey,
    pub wsol_vault: Pubkey,
    pub payer_wsol_vault: Pubkey,
    pub protocol_fee_account: Pubkey,
    pub protocol_wsol_vault: Pubkey,
}

impl RefundAddresses {
    pub fn derive(network: &NetworkConfig, payer: &Pubkey, mint: &Pubkey) -> Result<Self, AddressError> {
        let pdas = PdaBuilder::new(network.program_id, network.metadata_program_id);
        let wsol_mint = spl_token::native_mint::id();
        let (config_account, _) = pdas.config(mint)?;
        let (system_config_account, _) = pdas.system_config(&network.system_deployer)?;
        let (refund_account, _) = pdas.refund(mint, payer)?;
        Ok(Self {
            payer: *payer,
            mint: *mint,
            config_account,
            system_config_account,
            refund_account,
            token_ata: associated_token_address(payer, mint),
            token_vault: associated_token_address(&config_account, mint),
            wsol_vault: associated_token_address(&config_account, &wsol_mint),
            payer_wsol_vault: associated_token_address(payer, &wsol_mint),
            protocol_fee_account: network.protocol_fee_account,
            protocol_wsol_vault: associated_token_address(&network.protocol_fee_account, &wsol_mint),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RefundParams<'a> {
    pub name: &'a str,
    pub symbol: &'a str,
    pub create_payer_wsol: bool,
    pub create_protocol_wsol: bool,
    pub compute_units: u32,
}

/// `[compute budget, create payer wrapped native?, create protocol wrapped native?, refund]`
pub fn assemble_refund(
    network: &NetworkConfig,
    addresses: &RefundAddresses,
    params: &RefundParams<'_>,
) -> Result<InstructionPlan, AssemblyError> {
    let payer = &addresses.payer;
    let wsol_mint = spl_token::native_mint::id();
    let mut creations = Vec::with_capacity(2);
    if params.create_payer_wsol {
        creations.push(create_token_account(payer, payer, &wsol_mint));
    }
    if params.create_protocol_wsol {
        creations.push(create_token_account(payer, &addresses.protocol_fee_account, &wsol_mint));
    }

    let accounts = RefundAccounts {
        mint: addresses.mint,
        refund_account: addresses.refund_account,
        config_account: addresses.config_account,
        token_ata: addresses.token_ata,
        token_vault: addresses.token_vault,
        protocol_fee_account: addresses.protocol_fee_account,
        system_config_account: addresses.system_config_account,
        payer: addresses.payer,
        wsol_vault: addresses.wsol_vault,
        payer_wsol_vault: addresses.payer_wsol_vault,
        protocol_wsol_vault: addresses.protocol_wsol_vault,
    };
    let ix = refund(&network.program_id, &accounts, params.name, params.symbol)?;
    plan_instructions(params.compute_units, creations, ix)
}
