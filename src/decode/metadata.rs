//! Legacy token-metadata account layout
//!
//! ```text
//! key: u8 | update_authority: [32] | mint: [32]
//! name: u32 len + bytes | symbol: u32 len + bytes | uri: u32 len + bytes
//! seller_fee_basis_points: u16
//! creators: u8 flag [ u32 count, count * ([32] address, u8 verified, u8 share) ]
//! collection: u8 flag [ [32] key, u8 verified ]
//! is_mutable: u8
//! ```

use super::{ByteReader, DecodeError};
use crate::types::{pubkey_string, TokenMetadata};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Creator {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    pub verified: bool,
    pub share: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    #[serde(with = "pubkey_string")]
    pub key: Pubkey,
    pub verified: bool,
}

/// Decoded legacy metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyMetadata {
    pub key: u8,
    #[serde(with = "pubkey_string")]
    pub update_authority: Pubkey,
    #[serde(with = "pubkey_string")]
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Vec<Creator>,
    pub collection: Option<Collection>,
    pub is_mutable: bool,
}

impl LegacyMetadata {
    /// Decode from an optional account buffer; `None` means the account is absent
    pub fn from_account_data(data: Option<&[u8]>) -> Result<Self, DecodeError> {
        match data {
            Some(data) => Self::decode(data),
            None => Err(DecodeError::AccountMissing("Metadata")),
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(data);

        let key = reader.u8("key")?;
        let update_authority = reader.pubkey("update_authority")?;
        let mint = reader.pubkey("mint")?;
        let name = reader.string("name")?;
        let symbol = reader.string("symbol")?;
        let uri = reader.string("uri")?;
        let seller_fee_basis_points = reader.u16_le("seller_fee_basis_points")?;

        let mut creators = Vec::new();
        if reader.bool("creators_flag")? {
            let count = reader.u32_le("creators_len")? as usize;
            // Each record is 34 bytes; refuse counts the buffer cannot hold
            // before allocating
            if count.saturating_mul(34) > reader.remaining() {
                return Err(DecodeError::UnexpectedEnd {
                    field: "creators",
                    offset: reader.offset(),
                    needed: count.saturating_mul(34),
                    len: data.len(),
                });
            }
            creators.reserve(count);
            for _ in 0..count {
                creators.push(Creator {
                    address: reader.pubkey("creator_address")?,
                    verified: reader.bool("creator_verified")?,
                    share: reader.u8("creator_share")?,
                });
            }
        }

        let collection = if reader.bool("collection_flag")? {
            Some(Collection {
                key: reader.pubkey("collection_key")?,
                verified: reader.bool("collection_verified")?,
            })
        } else {
            None
        };

        let is_mutable = reader.bool("is_mutable")?;

        Ok(Self {
            key,
            update_authority,
            mint,
            name,
            symbol,
            uri,
            seller_fee_basis_points,
            creators,
            collection,
            is_mutable,
        })
    }

    /// Name, symbol and uri with the account's NUL padding removed
    pub fn token_metadata(&self) -> TokenMetadata {
        TokenMetadata {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
            decimals: None,
        }
        .sanitized()
    }
}
