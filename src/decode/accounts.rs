//! Fair-mint program account schemas
//!
//! Each account is `[8-byte discriminator][fields]`, fields little-endian in
//! declaration order. Parsers check the discriminator and every read.

use super::{ByteReader, DecodeError};
use crate::program::account_discriminator;
use crate::types::pubkey_string;
use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// A program-owned account with a fixed binary schema
pub trait ProgramAccount: Sized {
    /// Type name hashed into the discriminator
    const NAME: &'static str;

    fn read_fields(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError>;

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(data);
        reader.discriminator(Self::NAME, &account_discriminator(Self::NAME))?;
        Self::read_fields(&mut reader)
    }

    /// Decode an optional account buffer; `None` means the account is absent
    fn from_account_data(data: Option<&[u8]>) -> Result<Self, DecodeError> {
        match data {
            Some(data) => Self::decode(data),
            None => Err(DecodeError::AccountMissing(Self::NAME)),
        }
    }
}

/// Launch parameters; also the argument block of the initialize instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BorshSerialize)]
pub struct InitializeTokenConfigData {
    pub target_eras: u32,
    pub epoches_per_era: u64,
    pub target_seconds_per_epoch: u64,
    pub reduce_ratio: f64,
    pub initial_mint_size: u64,
    pub initial_target_mint_size_per_epoch: u64,
    pub fee_rate: u64,
    pub liquidity_tokens_ratio: f64,
    pub start_timestamp: i64,
}

impl InitializeTokenConfigData {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            target_eras: reader.u32_le("target_eras")?,
            epoches_per_era: reader.u64_le("epoches_per_era")?,
            target_seconds_per_epoch: reader.u64_le("target_seconds_per_epoch")?,
            reduce_ratio: reader.f64_le("reduce_ratio")?,
            initial_mint_size: reader.u64_le("initial_mint_size")?,
            initial_target_mint_size_per_epoch: reader.u64_le("initial_target_mint_size_per_epoch")?,
            fee_rate: reader.u64_le("fee_rate")?,
            liquidity_tokens_ratio: reader.f64_le("liquidity_tokens_ratio")?,
            start_timestamp: reader.i64_le("start_timestamp")?,
        })
    }
}

/// Era/epoch progress of the mint schedule
#[derive(Debug, Clone, PartialEq, Serialize, BorshSerialize)]
pub struct TokenMintState {
    pub supply: u64,
    pub current_era: u32,
    pub current_epoch: u64,
    pub elapsed_seconds_epoch: i64,
    pub start_timestamp_epoch: i64,
    pub last_difficulty_coefficient_epoch: f64,
    pub difficulty_coefficient_epoch: f64,
    pub mint_size_epoch: u64,
    pub quantity_minted_epoch: u64,
    pub target_mint_size_epoch: u64,
    pub total_mint_fee: u64,
    pub total_referrer_fee: u64,
    pub total_tokens: u64,
}

impl TokenMintState {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            supply: reader.u64_le("supply")?,
            current_era: reader.u32_le("current_era")?,
            current_epoch: reader.u64_le("current_epoch")?,
            elapsed_seconds_epoch: reader.i64_le("elapsed_seconds_epoch")?,
            start_timestamp_epoch: reader.i64_le("start_timestamp_epoch")?,
            last_difficulty_coefficient_epoch: reader.f64_le("last_difficulty_coefficient_epoch")?,
            difficulty_coefficient_epoch: reader.f64_le("difficulty_coefficient_epoch")?,
            mint_size_epoch: reader.u64_le("mint_size_epoch")?,
            quantity_minted_epoch: reader.u64_le("quantity_minted_epoch")?,
            target_mint_size_epoch: reader.u64_le("target_mint_size_epoch")?,
            total_mint_fee: reader.u64_le("total_mint_fee")?,
            total_referrer_fee: reader.u64_le("total_referrer_fee")?,
            total_tokens: reader.u64_le("total_tokens")?,
        })
    }
}

/// Per-token configuration snapshot. Fetched fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenConfigData {
    #[serde(with = "pubkey_string")]
    pub admin: Pubkey,
    #[serde(with = "pubkey_string")]
    pub mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub fee_vault: Pubkey,
    pub mint_state: TokenMintState,
    pub config: InitializeTokenConfigData,
}

impl TokenConfigData {
    pub fn fee_rate(&self) -> u64 {
        self.config.fee_rate
    }

    pub fn difficulty_coefficient(&self) -> f64 {
        self.mint_state.difficulty_coefficient_epoch
    }
}

impl ProgramAccount for TokenConfigData {
    const NAME: &'static str = "TokenConfigData";

    fn read_fields(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            admin: reader.pubkey("admin")?,
            mint: reader.pubkey("mint")?,
            fee_vault: reader.pubkey("fee_vault")?,
            mint_state: TokenMintState::read(reader)?,
            config: InitializeTokenConfigData::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemConfigData {
    #[serde(with = "pubkey_string")]
    pub admin: Pubkey,
    pub count: u64,
    pub referral_usage_max_count: u32,
    #[serde(with = "pubkey_string")]
    pub protocol_fee_account: Pubkey,
    pub refund_fee_rate: f64,
    pub referrer_reset_interval: i64,
    pub update_metadata_fee: u64,
    pub customized_deploy_fee: u64,
    pub init_pool_wsol_amount: u64,
    pub graduate_fee_rate: f64,
    pub min_graduate_fee: u64,
    pub swap_create_fee: u64,
}

impl ProgramAccount for SystemConfigData {
    const NAME: &'static str = "SystemConfigData";

    fn read_fields(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            admin: reader.pubkey("admin")?,
            count: reader.u64_le("count")?,
            referral_usage_max_count: reader.u32_le("referral_usage_max_count")?,
            protocol_fee_account: reader.pubkey("protocol_fee_account")?,
            refund_fee_rate: reader.f64_le("refund_fee_rate")?,
            referrer_reset_interval: reader.i64_le("referrer_reset_interval")?,
            update_metadata_fee: reader.u64_le("update_metadata_fee")?,
            customized_deploy_fee: reader.u64_le("customized_deploy_fee")?,
            init_pool_wsol_amount: reader.u64_le("init_pool_wsol_amount")?,
            graduate_fee_rate: reader.f64_le("graduate_fee_rate")?,
            min_graduate_fee: reader.u64_le("min_graduate_fee")?,
            swap_create_fee: reader.u64_le("swap_create_fee")?,
        })
    }
}

/// Referral record keyed by (mint, referrer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenReferralData {
    #[serde(with = "pubkey_string")]
    pub code_hash: Pubkey,
    #[serde(with = "pubkey_string")]
    pub referrer_main: Pubkey,
    #[serde(with = "pubkey_string")]
    pub referrer_ata: Pubkey,
    pub usage_count: u32,
    pub active_timestamp: i64,
}

impl ProgramAccount for TokenReferralData {
    const NAME: &'static str = "TokenReferralData";

    fn read_fields(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            code_hash: reader.pubkey("code_hash")?,
            referrer_main: reader.pubkey("referrer_main")?,
            referrer_ata: reader.pubkey("referrer_ata")?,
            usage_count: reader.u32_le("usage_count")?,
            active_timestamp: reader.i64_le("active_timestamp")?,
        })
    }
}

/// Pointer from a code hash to its referral record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeAccountData {
    #[serde(with = "pubkey_string")]
    pub referral_account: Pubkey,
}

impl ProgramAccount for CodeAccountData {
    const NAME: &'static str = "CodeAccountData";

    fn read_fields(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            referral_account: reader.pubkey("referral_account")?,
        })
    }
}

/// Per-(mint, user) refund ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRefundData {
    #[serde(with = "pubkey_string")]
    pub owner: Pubkey,
    pub total_tokens: u64,
    pub total_mint_fee: u64,
    pub total_referrer_fee: u64,
}

impl ProgramAccount for TokenRefundData {
    const NAME: &'static str = "TokenRefundData";

    fn read_fields(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            owner: reader.pubkey("owner")?,
            total_tokens: reader.u64_le("total_tokens")?,
            total_mint_fee: reader.u64_le("total_mint_fee")?,
            total_referrer_fee: reader.u64_le("total_referrer_fee")?,
        })
    }
}
