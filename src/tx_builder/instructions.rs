//! Instruction builders and ordering validation
//!
//! Every transaction follows the same shape:
//! 1. Compute budget (CU limit)
//! 2. Associated-account creations, only for accounts that do not exist yet
//! 3. The fair-mint program instruction
//!
//! Account sets are typed per instruction. Field order is the wire order
//! the program expects; [`InitializeTokenAccounts::to_account_metas`] and
//! friends must never be reordered.

use crate::decode::InitializeTokenConfigData;
use crate::program::instruction_discriminator;
use crate::tx_builder::errors::AssemblyError;
use borsh::BorshSerialize;
use solana_sdk::{
    compute_budget::{self, ComputeBudgetInstruction},
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program, sysvar,
};
use spl_associated_token_account::instruction::create_associated_token_account;

/// Ordered instructions for one transaction
#[derive(Debug, Clone)]
pub struct InstructionPlan {
    pub instructions: Vec<Instruction>,
    /// Number of associated-account creations between budget and program instruction
    pub account_creations: usize,
}

/// Plan `[compute budget, creations..., program instruction]`.
///
/// `cu_limit == 0` omits the budget instruction.
pub fn plan_instructions(
    cu_limit: u32,
    account_creations: Vec<Instruction>,
    program_ix: Instruction,
) -> Result<InstructionPlan, AssemblyError> {
    if program_ix.accounts.is_empty() {
        return Err(AssemblyError::instruction_failed(
            program_ix.program_id.to_string(),
            "Program instruction has no accounts",
        ));
    }

    let creations = account_creations.len();
    let mut instructions = Vec::with_capacity(creations + 2);
    if cu_limit > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(cu_limit));
    }
    instructions.extend(account_creations);
    instructions.push(program_ix);

    let plan = InstructionPlan {
        instructions,
        account_creations: creations,
    };
    sanity_check_ix_order(&plan.instructions)?;
    Ok(plan)
}

/// Check the `[budget?, creations..., program]` shape
pub fn sanity_check_ix_order(instructions: &[Instruction]) -> Result<(), AssemblyError> {
    let Some((last, rest)) = instructions.split_last() else {
        return Err(AssemblyError::invalid_order("Instruction list is empty"));
    };

    let is_budget = |ix: &Instruction| ix.program_id == compute_budget::id();
    let is_creation = |ix: &Instruction| ix.program_id == spl_associated_token_account::id();

    if is_budget(last) || is_creation(last) {
        return Err(AssemblyError::invalid_order(format!(
            "Last instruction must be the program instruction, got program_id: {}",
            last.program_id
        )));
    }
    for (idx, ix) in rest.iter().enumerate() {
        if is_budget(ix) && idx != 0 {
            return Err(AssemblyError::invalid_order(format!(
                "Compute budget instruction must come first (found at position {})",
                idx
            )));
        }
        if !is_budget(ix) && !is_creation(ix) {
            return Err(AssemblyError::invalid_order(format!(
                "Unexpected instruction before the program instruction at position {}: {}",
                idx, ix.program_id
            )));
        }
    }
    Ok(())
}

/// Create the associated token account of `owner` for `mint`, paid by `payer`
pub fn create_token_account(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    create_associated_token_account(payer, owner, mint, &spl_token::id())
}

fn program_instruction<T: BorshSerialize>(
    program_id: &Pubkey,
    method: &str,
    args: &T,
    accounts: Vec<AccountMeta>,
) -> Result<Instruction, AssemblyError> {
    let mut data = instruction_discriminator(method).to_vec();
    args.serialize(&mut data)
        .map_err(|e| AssemblyError::instruction_failed(program_id.to_string(), format!("{}: {}", method, e)))?;
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Metadata argument of `initialize_token`
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct TokenMetadataArgs {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub decimals: u8,
}

#[derive(BorshSerialize)]
struct InitializeTokenArgs<'a> {
    metadata: &'a TokenMetadataArgs,
    config: &'a InitializeTokenConfigData,
}

#[derive(BorshSerialize)]
struct MintTokensArgs<'a> {
    name: &'a str,
    symbol: &'a str,
    code_hash: Vec<u8>,
}

#[derive(BorshSerialize)]
struct RefundArgs<'a> {
    name: &'a str,
    symbol: &'a str,
}

/// Accounts of `initialize_token`, in wire order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeTokenAccounts {
    pub metadata: Pubkey,
    pub payer: Pubkey,
    pub mint: Pubkey,
    pub config_account: Pubkey,
    pub mint_token_vault: Pubkey,
    pub token_vault: Pubkey,
    pub wsol_mint: Pubkey,
    pub wsol_vault: Pubkey,
    pub system_config_account: Pubkey,
    pub launch_rule_account: Pubkey,
    pub protocol_fee_account: Pubkey,
    pub token_metadata_program: Pubkey,
}

impl InitializeTokenAccounts {
    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.metadata, false),
            AccountMeta::new(self.payer, true),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.config_account, false),
            AccountMeta::new(self.mint_token_vault, false),
            AccountMeta::new(self.token_vault, false),
            AccountMeta::new_readonly(self.wsol_mint, false),
            AccountMeta::new(self.wsol_vault, false),
            AccountMeta::new(self.system_config_account, false),
            AccountMeta::new_readonly(self.launch_rule_account, false),
            AccountMeta::new(self.protocol_fee_account, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(self.token_metadata_program, false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ]
    }
}

/// Accounts of `mint_tokens`, in wire order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintTokensAccounts {
    pub mint: Pubkey,
    pub destination: Pubkey,
    pub destination_wsol_ata: Pubkey,
    pub refund_account: Pubkey,
    pub user: Pubkey,
    pub config_account: Pubkey,
    pub system_config_account: Pubkey,
    pub mint_token_vault: Pubkey,
    pub token_vault: Pubkey,
    pub wsol_vault: Pubkey,
    pub wsol_mint: Pubkey,
    pub referrer_ata: Pubkey,
    pub referrer_main: Pubkey,
    pub referral_account: Pubkey,
    pub protocol_fee_account: Pubkey,
    pub protocol_wsol_vault: Pubkey,
    pub pool_state: Pubkey,
    pub amm_config: Pubkey,
    pub cp_swap_program: Pubkey,
    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,
}

impl MintTokensAccounts {
    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.destination, false),
            AccountMeta::new(self.destination_wsol_ata, false),
            AccountMeta::new(self.refund_account, false),
            AccountMeta::new(self.user, true),
            AccountMeta::new(self.config_account, false),
            AccountMeta::new(self.system_config_account, false),
            AccountMeta::new(self.mint_token_vault, false),
            AccountMeta::new(self.token_vault, false),
            AccountMeta::new(self.wsol_vault, false),
            AccountMeta::new_readonly(self.wsol_mint, false),
            AccountMeta::new(self.referrer_ata, false),
            AccountMeta::new_readonly(self.referrer_main, false),
            AccountMeta::new(self.referral_account, false),
            AccountMeta::new(self.protocol_fee_account, false),
            AccountMeta::new(self.protocol_wsol_vault, false),
            AccountMeta::new(self.pool_state, false),
            AccountMeta::new_readonly(self.amm_config, false),
            AccountMeta::new_readonly(self.cp_swap_program, false),
            AccountMeta::new_readonly(self.token0_mint, false),
            AccountMeta::new_readonly(self.token1_mint, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ]
    }
}

/// Accounts of `refund`, in wire order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundAccounts {
    pub mint: Pubkey,
    pub refund_account: Pubkey,
    pub config_account: Pubkey,
    pub token_ata: Pubkey,
    pub token_vault: Pubkey,
    pub protocol_fee_account: Pubkey,
    pub system_config_account: Pubkey,
    pub payer: Pubkey,
    pub wsol_vault: Pubkey,
    pub payer_wsol_vault: Pubkey,
    pub protocol_wsol_vault: Pubkey,
}

impl RefundAccounts {
    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.refund_account, false),
            AccountMeta::new(self.config_account, false),
            AccountMeta::new(self.token_ata, false),
            AccountMeta::new(self.token_vault, false),
            AccountMeta::new(self.protocol_fee_account, false),
            AccountMeta::new_readonly(self.system_config_account, false),
            AccountMeta::new(self.payer, true),
            AccountMeta::new(self.wsol_vault, false),
            AccountMeta::new(self.payer_wsol_vault, false),
            AccountMeta::new(self.protocol_wsol_vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ]
    }
}

pub fn initialize_token(
    program_id: &Pubkey,
    accounts: &InitializeTokenAccounts,
    metadata: &TokenMetadataArgs,
    config: &InitializeTokenConfigData,
) -> Result<Instruction, AssemblyError> {
    program_instruction(
        program_id,
        "initialize_token",
        &InitializeTokenArgs { metadata, config },
        accounts.to_account_metas(),
    )
}

/// `mint_tokens`; `remaining_accounts` are appended after the named accounts
pub fn mint_tokens(
    program_id: &Pubkey,
    accounts: &MintTokensAccounts,
    remaining_accounts: Vec<AccountMeta>,
    name: &str,
    symbol: &str,
    code_hash: &Pubkey,
) -> Result<Instruction, AssemblyError> {
    let mut metas = accounts.to_account_metas();
    metas.extend(remaining_accounts);
    program_instruction(
        program_id,
        "mint_tokens",
        &MintTokensArgs {
            name,
            symbol,
            code_hash: code_hash.to_bytes().to_vec(),
        },
        metas,
    )
}

pub fn refund(
    program_id: &Pubkey,
    accounts: &RefundAccounts,
    name: &str,
    symbol: &str,
) -> Result<Instruction, AssemblyError> {
    program_instruction(
        program_id,
        "refund",
        &RefundArgs { name, symbol },
        accounts.to_account_metas(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_ix() -> Instruction {
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[1, 2, 3, 4],
            vec![AccountMeta::new(Pubkey::new_unique(), false)],
        )
    }

    #[test]
    fn test_plan_with_creations() {
        let payer = Pubkey::new_unique();
        let creations = vec![
            create_token_account(&payer, &payer, &spl_token::native_mint::id()),
            create_token_account(&payer, &payer, &Pubkey::new_unique()),
        ];
        let ix = program_ix();
        let program_id = ix.program_id;
        let plan = plan_instructions(500_000, creations, ix).unwrap();

        assert_eq!(plan.instructions.len(), 4);
        assert_eq!(plan.account_creations, 2);
        assert_eq!(plan.instructions[0].program_id, compute_budget::id());
        assert_eq!(plan.instructions[1].program_id, spl_associated_token_account::id());
        assert_eq!(plan.instructions[3].program_id, program_id);
    }

    #[test]
    fn test_plan_without_budget() {
        let plan = plan_instructions(0, vec![], program_ix()).unwrap();
        assert_eq!(plan.instructions.len(), 1);
    }

    #[test]
    fn test_program_ix_without_accounts_rejected() {
        let ix = Instruction::new_with_bytes(Pubkey::new_unique(), &[1], vec![]);
        assert!(matches!(
            plan_instructions(200_000, vec![], ix),
            Err(AssemblyError::InstructionBuild { .. })
        ));
    }

    #[test]
    fn test_sanity_check_rejects_late_budget() {
        let instructions = vec![
            program_ix(),
            ComputeBudgetInstruction::set_compute_unit_limit(200_000),
            program_ix(),
        ];
        assert!(matches!(
            sanity_check_ix_order(&instructions),
            Err(AssemblyError::InvalidInstructionOrder(_))
        ));
    }

    #[test]
    fn test_sanity_check_rejects_trailing_creation() {
        let payer = Pubkey::new_unique();
        let instructions = vec![
            ComputeBudgetInstruction::set_compute_unit_limit(200_000),
            create_token_account(&payer, &payer, &Pubkey::new_unique()),
        ];
        let err = sanity_check_ix_order(&instructions).unwrap_err();
        assert!(err.to_string().contains("Last instruction"));
    }

    #[test]
    fn test_sanity_check_empty_list() {
        assert!(sanity_check_ix_order(&[]).is_err());
    }

    #[test]
    fn test_refund_data_layout() {
        let accounts = RefundAccounts {
            mint: Pubkey::new_unique(),
            refund_account: Pubkey::new_unique(),
            config_account: Pubkey::new_unique(),
            token_ata: Pubkey::new_unique(),
            token_vault: Pubkey::new_unique(),
            protocol_fee_account: Pubkey::new_unique(),
            system_config_account: Pubkey::new_unique(),
            payer: Pubkey::new_unique(),
            wsol_vault: Pubkey::new_unique(),
            payer_wsol_vault: Pubkey::new_unique(),
            protocol_wsol_vault: Pubkey::new_unique(),
        };
        let program_id = Pubkey::new_unique();
        let ix = refund(&program_id, &accounts, "Fair", "fair").unwrap();

        let mut expected = instruction_discriminator("refund").to_vec();
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(b"Fair");
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(b"fair");
        assert_eq!(ix.data, expected);

        assert_eq!(ix.accounts.len(), 13);
        assert_eq!(ix.accounts[7].pubkey, accounts.payer);
        assert!(ix.accounts[7].is_signer);
        assert_eq!(ix.accounts.iter().filter(|m| m.is_signer).count(), 1);
    }

    #[test]
    fn test_mint_tokens_appends_remaining_accounts() {
        let user = Pubkey::new_unique();
        let accounts = MintTokensAccounts {
            mint: Pubkey::new_unique(),
            destination: Pubkey::new_unique(),
            destination_wsol_ata: Pubkey::new_unique(),
            refund_account: Pubkey::new_unique(),
            user,
            config_account: Pubkey::new_unique(),
            system_config_account: Pubkey::new_unique(),
            mint_token_vault: Pubkey::new_unique(),
            token_vault: Pubkey::new_unique(),
            wsol_vault: Pubkey::new_unique(),
            wsol_mint: spl_token::native_mint::id(),
            referrer_ata: Pubkey::new_unique(),
            referrer_main: Pubkey::new_unique(),
            referral_account: Pubkey::new_unique(),
            protocol_fee_account: Pubkey::new_unique(),
            protocol_wsol_vault: Pubkey::new_unique(),
            pool_state: Pubkey::new_unique(),
            amm_config: Pubkey::new_unique(),
            cp_swap_program: Pubkey::new_unique(),
            token0_mint: Pubkey::new_unique(),
            token1_mint: Pubkey::new_unique(),
        };
        let extra = Pubkey::new_unique();
        let code_hash = Pubkey::new_unique();
        let ix = mint_tokens(
            &Pubkey::new_unique(),
            &accounts,
            vec![AccountMeta::new_readonly(extra, false)],
            "Fair",
            "FAIR",
            &code_hash,
        )
        .unwrap();

        let named = accounts.to_account_metas().len();
        assert_eq!(ix.accounts.len(), named + 1);
        assert_eq!(ix.accounts[named].pubkey, extra);
        // discriminator + "Fair" + "FAIR" + (len + 32 bytes)
        assert_eq!(ix.data.len(), 8 + 8 + 8 + 4 + 32);
        assert_eq!(&ix.data[ix.data.len() - 32..], code_hash.as_ref());
    }
}
