//! Program-derived address computation
//!
//! Every address here must match the on-chain program's own derivation byte
//! for byte. Seed prefixes and seed ordering are part of the wire contract;
//! a mismatch produces a valid-looking but wrong address that only fails
//! once the transaction lands.

use solana_sdk::pubkey::{Pubkey, MAX_SEEDS, MAX_SEED_LEN};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use thiserror::Error;

/// Seed prefixes used by the fair-mint program and its collaborators
pub mod seeds {
    pub const MINT_SEED: &[u8] = b"fair_mint";
    pub const CONFIG_DATA_SEED: &[u8] = b"config_data";
    pub const SYSTEM_CONFIG_SEED: &[u8] = b"system_config_v1.1";
    pub const REFERRAL_SEED: &[u8] = b"referral";
    pub const REFERRAL_CODE_SEED: &[u8] = b"referral_code";
    pub const CODE_ACCOUNT_SEED: &[u8] = b"code_account";
    pub const REFUND_SEED: &[u8] = b"refund";
    pub const METADATA_SEED: &[u8] = b"metadata";

    // Constant-product swap program
    pub const POOL_AUTH_SEED: &[u8] = b"vault_and_lp_mint_auth_seed";
    pub const POOL_SEED: &[u8] = b"pool";
    pub const POOL_LP_MINT_SEED: &[u8] = b"pool_lp_mint";
    pub const POOL_VAULT_SEED: &[u8] = b"pool_vault";
    pub const OBSERVATION_SEED: &[u8] = b"observation";
}

/// Errors produced while validating derivation inputs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Seed {index} is {len} bytes, maximum is {max}", max = MAX_SEED_LEN)]
    SeedTooLong { index: usize, len: usize },

    #[error("Too many seeds: {0} (maximum {max})", max = MAX_SEEDS - 1)]
    TooManySeeds(usize),

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("No viable bump seed for the given inputs")]
    NoViableBump,
}

/// Derive `(address, bump)` from raw seed parts and an owning program id.
///
/// Pure and deterministic. Seed lengths are checked up front so the
/// underlying search can never abort on malformed input.
pub fn derive(seed_parts: &[&[u8]], owner_program_id: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
    // One slot is reserved for the bump seed
    if seed_parts.len() >= MAX_SEEDS {
        return Err(AddressError::TooManySeeds(seed_parts.len()));
    }
    for (index, part) in seed_parts.iter().enumerate() {
        if part.len() > MAX_SEED_LEN {
            return Err(AddressError::SeedTooLong {
                index,
                len: part.len(),
            });
        }
    }
    Pubkey::try_find_program_address(seed_parts, owner_program_id).ok_or(AddressError::NoViableBump)
}

/// Named derivations for one deployment of the fair-mint program
#[derive(Debug, Clone, Copy)]
pub struct PdaBuilder {
    pub program_id: Pubkey,
    pub metadata_program_id: Pubkey,
}

impl PdaBuilder {
    pub fn new(program_id: Pubkey, metadata_program_id: Pubkey) -> Self {
        Self {
            program_id,
            metadata_program_id,
        }
    }

    /// Token mint from the display name and the lowercased symbol
    pub fn mint(&self, name: &str, symbol: &str) -> Result<(Pubkey, u8), AddressError> {
        if name.is_empty() {
            return Err(AddressError::EmptyInput("token name"));
        }
        if symbol.is_empty() {
            return Err(AddressError::EmptyInput("token symbol"));
        }
        let symbol = symbol.to_lowercase();
        derive(
            &[seeds::MINT_SEED, name.as_bytes(), symbol.as_bytes()],
            &self.program_id,
        )
    }

    pub fn config(&self, mint: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
        derive(&[seeds::CONFIG_DATA_SEED, mint.as_ref()], &self.program_id)
    }

    pub fn system_config(&self, deployer: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
        derive(&[seeds::SYSTEM_CONFIG_SEED, deployer.as_ref()], &self.program_id)
    }

    pub fn referral(&self, mint: &Pubkey, referrer: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
        derive(
            &[seeds::REFERRAL_SEED, mint.as_ref(), referrer.as_ref()],
            &self.program_id,
        )
    }

    /// The "code hash" is itself an address derived from the raw code string
    pub fn code_hash(&self, code: &str) -> Result<(Pubkey, u8), AddressError> {
        if code.is_empty() {
            return Err(AddressError::EmptyInput("referral code"));
        }
        derive(&[seeds::REFERRAL_CODE_SEED, code.as_bytes()], &self.program_id)
    }

    pub fn code_account(&self, code_hash: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
        derive(&[seeds::CODE_ACCOUNT_SEED, code_hash.as_ref()], &self.program_id)
    }

    pub fn refund(&self, mint: &Pubkey, user: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
        derive(
            &[seeds::REFUND_SEED, mint.as_ref(), user.as_ref()],
            &self.program_id,
        )
    }

    /// Legacy token-metadata account, owned by the metadata program
    pub fn metadata(&self, mint: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
        derive(
            &[
                seeds::METADATA_SEED,
                self.metadata_program_id.as_ref(),
                mint.as_ref(),
            ],
            &self.metadata_program_id,
        )
    }
}

/// Associated token account under the classic token program.
///
/// Works for off-curve owners (config accounts, the mint itself) since no
/// curve check is performed.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &spl_token::id())
}

/// Derivations for the constant-product swap program used at pool bootstrap
#[derive(Debug, Clone, Copy)]
pub struct PoolPdas {
    pub swap_program_id: Pubkey,
}

impl PoolPdas {
    pub fn new(swap_program_id: Pubkey) -> Self {
        Self { swap_program_id }
    }

    pub fn authority(&self) -> Result<(Pubkey, u8), AddressError> {
        derive(&[seeds::POOL_AUTH_SEED], &self.swap_program_id)
    }

    /// Callers must pass the mints already canonicalized (token0 < token1)
    pub fn pool(
        &self,
        amm_config: &Pubkey,
        token0_mint: &Pubkey,
        token1_mint: &Pubkey,
    ) -> Result<(Pubkey, u8), AddressError> {
        derive(
            &[
                seeds::POOL_SEED,
                amm_config.as_ref(),
                token0_mint.as_ref(),
                token1_mint.as_ref(),
            ],
            &self.swap_program_id,
        )
    }

    pub fn lp_mint(&self, pool: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
        derive(&[seeds::POOL_LP_MINT_SEED, pool.as_ref()], &self.swap_program_id)
    }

    pub fn vault(&self, pool: &Pubkey, mint: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
        derive(
            &[seeds::POOL_VAULT_SEED, pool.as_ref(), mint.as_ref()],
            &self.swap_program_id,
        )
    }

    pub fn observation(&self, pool: &Pubkey) -> Result<(Pubkey, u8), AddressError> {
        derive(&[seeds::OBSERVATION_SEED, pool.as_ref()], &self.swap_program_id)
    }
}
