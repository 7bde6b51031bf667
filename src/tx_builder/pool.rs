//! Swap-pool bootstrap accounts
//!
//! The mint instruction carries the accounts the program needs to create
//! the constant-product pool once the mint schedule completes. They travel
//! as a fixed 21-entry remaining-accounts list whose positions are part of
//! the program interface.

use crate::config::SwapConfig;
use crate::pda::{associated_token_address, AddressError, PoolPdas};
use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey, system_program, sysvar};
use std::cmp::Ordering;

/// Number of remaining accounts passed to `mint_tokens`
pub const POOL_ACCOUNT_COUNT: usize = 21;

/// Unsigned big-endian comparison of the raw 32-byte addresses
pub fn compare_mints(a: &Pubkey, b: &Pubkey) -> Ordering {
    a.as_ref().cmp(b.as_ref())
}

/// Order two mints as `(token0, token1)` with token0 the smaller
pub fn canonicalize(a: Pubkey, b: Pubkey) -> (Pubkey, Pubkey) {
    if compare_mints(&a, &b) == Ordering::Greater {
        (b, a)
    } else {
        (a, b)
    }
}

/// Every account of the pool bootstrap, derived for one token/native pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolAccounts {
    pub swap_program: Pubkey,
    pub payer: Pubkey,
    pub amm_config: Pubkey,
    pub authority: Pubkey,
    pub pool_state: Pubkey,
    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub creator_token0: Pubkey,
    pub creator_token1: Pubkey,
    pub creator_lp: Pubkey,
    pub vault0: Pubkey,
    pub vault1: Pubkey,
    pub create_pool_fee_receiver: Pubkey,
    pub observation: Pubkey,
    pub token0_program: Pubkey,
    pub token1_program: Pubkey,
}

impl PoolAccounts {
    /// Derive the pool accounts for `token_mint` paired with wrapped native.
    ///
    /// Both mints use the classic token program, so swapping the token
    /// programs alongside the mints is a no-op.
    pub fn derive(swap: &SwapConfig, payer: &Pubkey, token_mint: &Pubkey) -> Result<Self, AddressError> {
        let pdas = PoolPdas::new(swap.program_id);
        let (token0_mint, token1_mint) = canonicalize(*token_mint, spl_token::native_mint::id());

        let (authority, _) = pdas.authority()?;
        let (pool_state, _) = pdas.pool(&swap.amm_config, &token0_mint, &token1_mint)?;
        let (lp_mint, _) = pdas.lp_mint(&pool_state)?;
        let (vault0, _) = pdas.vault(&pool_state, &token0_mint)?;
        let (vault1, _) = pdas.vault(&pool_state, &token1_mint)?;
        let (observation, _) = pdas.observation(&pool_state)?;

        Ok(Self {
            swap_program: swap.program_id,
            payer: *payer,
            amm_config: swap.amm_config,
            authority,
            pool_state,
            token0_mint,
            token1_mint,
            lp_mint,
            creator_token0: associated_token_address(payer, &token0_mint),
            creator_token1: associated_token_address(payer, &token1_mint),
            creator_lp: associated_token_address(payer, &lp_mint),
            vault0,
            vault1,
            create_pool_fee_receiver: swap.create_pool_fee_receiver,
            observation,
            token0_program: spl_token::id(),
            token1_program: spl_token::id(),
        })
    }

    /// The 21 remaining accounts in the order the program reads them
    pub fn remaining_accounts(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new_readonly(self.swap_program, false),
            AccountMeta::new(self.payer, true),
            AccountMeta::new(self.amm_config, false),
            AccountMeta::new(self.authority, false),
            AccountMeta::new(self.pool_state, false),
            AccountMeta::new(self.token0_mint, false),
            AccountMeta::new(self.token1_mint, false),
            AccountMeta::new(self.lp_mint, false),
            AccountMeta::new(self.creator_token0, false),
            AccountMeta::new(self.creator_token1, false),
            AccountMeta::new(self.creator_lp, false),
            AccountMeta::new(self.vault0, false),
            AccountMeta::new(self.vault1, false),
            AccountMeta::new(self.create_pool_fee_receiver, false),
            AccountMeta::new(self.observation, false),
            AccountMeta::new(spl_token::id(), false),
            AccountMeta::new(self.token0_program, false),
            AccountMeta::new(self.token1_program, false),
            AccountMeta::new(spl_associated_token_account::id(), false),
            AccountMeta::new(system_program::id(), false),
            AccountMeta::new(sysvar::rent::id(), false),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swap_config() -> SwapConfig {
        SwapConfig {
            program_id: Pubkey::new_unique(),
            amm_config: Pubkey::new_unique(),
            create_pool_fee_receiver: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_compare_is_big_endian_bytewise() {
        let mut low = [0u8; 32];
        let mut high = [0u8; 32];
        low[0] = 1;
        low[31] = 255;
        high[0] = 2;
        let low = Pubkey::new_from_array(low);
        let high = Pubkey::new_from_array(high);
        assert_eq!(compare_mints(&low, &high), Ordering::Less);
        assert_eq!(compare_mints(&high, &low), Ordering::Greater);
        assert_eq!(compare_mints(&low, &low), Ordering::Equal);
    }

    #[test]
    fn test_canonicalize_is_order_independent() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        assert_eq!(canonicalize(a, b), canonicalize(b, a));
    }

    #[test]
    fn test_remaining_accounts_layout() {
        let swap = swap_config();
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let accounts = PoolAccounts::derive(&swap, &payer, &mint).unwrap();
        let metas = accounts.remaining_accounts();

        assert_eq!(metas.len(), POOL_ACCOUNT_COUNT);
        assert_eq!(metas[0].pubkey, swap.program_id);
        assert!(!metas[0].is_writable);
        assert_eq!(metas[1].pubkey, payer);
        assert!(metas[1].is_signer && metas[1].is_writable);
        assert_eq!(metas[2].pubkey, swap.amm_config);
        assert_eq!(metas[13].pubkey, swap.create_pool_fee_receiver);
        assert_eq!(metas[15].pubkey, spl_token::id());
        assert_eq!(metas[18].pubkey, spl_associated_token_account::id());
        assert_eq!(metas[19].pubkey, system_program::id());
        assert_eq!(metas[20].pubkey, sysvar::rent::id());
        assert!(metas[1..].iter().all(|m| m.is_writable));
        assert_eq!(metas.iter().filter(|m| m.is_signer).count(), 1);
    }

    #[test]
    fn test_pool_uses_canonical_mints() {
        let swap = swap_config();
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let accounts = PoolAccounts::derive(&swap, &payer, &mint).unwrap();

        assert_eq!(
            compare_mints(&accounts.token0_mint, &accounts.token1_mint),
            Ordering::Less
        );
        let pdas = PoolPdas::new(swap.program_id);
        let (expected, _) = pdas
            .pool(&swap.amm_config, &accounts.token0_mint, &accounts.token1_mint)
            .unwrap();
        assert_eq!(accounts.pool_state, expected);
        assert_eq!(
            accounts.creator_token0,
            associated_token_address(&payer, &accounts.token0_mint)
        );
    }
}
