//! Common types shared across the crate

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::{Pubkey, MAX_SEED_LEN};
use thiserror::Error;

/// Largest accepted avatar image, in bytes
pub const MAX_AVATAR_SIZE: u64 = 250 * 1024;

/// Serialize a `Pubkey` as its base58 string
pub mod pubkey_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(key)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Caller input rejected before any ledger access
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} is {len} bytes, maximum is {max}", max = MAX_SEED_LEN)]
    TooLong { field: &'static str, len: usize },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("Avatar must be square, got {width}x{height}")]
    AvatarNotSquare { width: u32, height: u32 },

    #[error("Avatar is {size} bytes, maximum is {max}", max = MAX_AVATAR_SIZE)]
    AvatarTooLarge { size: u64 },
}

/// Display metadata of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

impl TokenMetadata {
    /// Copy with embedded NUL bytes removed from every string field
    pub fn sanitized(&self) -> Self {
        let strip = |s: &str| s.replace('\0', "");
        Self {
            name: strip(&self.name),
            symbol: strip(&self.symbol),
            uri: strip(&self.uri),
            decimals: self.decimals,
        }
    }
}

/// Resolved referral code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRecord {
    #[serde(with = "pubkey_string")]
    pub code_hash: Pubkey,
    #[serde(with = "pubkey_string")]
    pub referrer_main: Pubkey,
    #[serde(with = "pubkey_string")]
    pub referrer_ata: Pubkey,
    pub usage_count: u32,
    #[serde(with = "pubkey_string")]
    pub referral_account: Pubkey,
}

/// Success payload of the mint and refund flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    #[serde(with = "pubkey_string")]
    pub wallet_address: Pubkey,
    #[serde(with = "pubkey_string")]
    pub token_account_address: Pubkey,
    #[serde(with = "pubkey_string")]
    pub wrapped_native_account_address: Pubkey,
    /// Absent when the transaction was reported as already processed before it was signed
    pub transaction_signature: Option<String>,
    pub token_page_url: String,
}

/// Success payload of the initialize flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePayload {
    #[serde(with = "pubkey_string")]
    pub mint_address: Pubkey,
    #[serde(with = "pubkey_string")]
    pub config_account_address: Pubkey,
    #[serde(with = "pubkey_string")]
    pub metadata_account_address: Pubkey,
    pub transaction_signature: Option<String>,
    pub token_page_url: String,
}

/// Uniform result envelope returned by every public operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> FlowResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Success whose outcome could not be fully verified
    pub fn ok_with_caveat(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Parse a user-typed amount into whole units.
///
/// Thousands separators and whitespace are ignored and the fractional part
/// is dropped: `"1,234.56"` is 1234. Empty input is 0.
pub fn parse_whole_units(input: &str) -> Result<u64, InputError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '_')
        .collect();
    let whole = cleaned.split('.').next().unwrap_or_default();
    if whole.is_empty() {
        return Ok(0);
    }
    whole
        .parse::<u64>()
        .map_err(|_| InputError::InvalidAmount(input.to_string()))
}

/// Avatar images must be square and no larger than [`MAX_AVATAR_SIZE`]
pub fn validate_avatar(width: u32, height: u32, size_bytes: u64) -> Result<(), InputError> {
    if width != height {
        return Err(InputError::AvatarNotSquare { width, height });
    }
    if size_bytes > MAX_AVATAR_SIZE {
        return Err(InputError::AvatarTooLarge { size: size_bytes });
    }
    Ok(())
}

/// Name and lowercased symbol are mint-address seeds and share the seed limit
pub fn validate_token_identity(name: &str, symbol: &str) -> Result<(), InputError> {
    if name.is_empty() {
        return Err(InputError::Missing("Token name"));
    }
    if symbol.is_empty() {
        return Err(InputError::Missing("Token symbol"));
    }
    if name.len() > MAX_SEED_LEN {
        return Err(InputError::TooLong {
            field: "Token name",
            len: name.len(),
        });
    }
    let lowered = symbol.to_lowercase();
    if lowered.len() > MAX_SEED_LEN {
        return Err(InputError::TooLong {
            field: "Token symbol",
            len: lowered.len(),
        });
    }
    Ok(())
}

/// Parse a base58 address supplied by a caller
pub fn parse_address(field: &'static str, value: &str) -> Result<Pubkey, InputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InputError::Missing(field));
    }
    trimmed.parse().map_err(|_| InputError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}
