use super::DecodeError;
use serde::Serialize;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;

/// Supply and decimals of an SPL mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MintInfo {
    pub supply: u64,
    pub decimals: u8,
}

impl MintInfo {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mint = Mint::unpack(data).map_err(|e| DecodeError::InvalidLayout {
            account: "Mint",
            reason: e.to_string(),
        })?;
        Ok(Self {
            supply: mint.supply,
            decimals: mint.decimals,
        })
    }

    pub fn from_account_data(data: Option<&[u8]>) -> Result<Self, DecodeError> {
        match data {
            Some(data) => Self::decode(data),
            None => Err(DecodeError::AccountMissing("Mint")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mint_account_data;

    #[test]
    fn test_decode_supply() {
        let info = MintInfo::decode(&mint_account_data(42_000, 9)).unwrap();
        assert_eq!(info, MintInfo { supply: 42_000, decimals: 9 });
    }

    #[test]
    fn test_wrong_length() {
        assert!(matches!(
            MintInfo::decode(&[0u8; 10]),
            Err(DecodeError::InvalidLayout { account: "Mint", .. })
        ));
        assert_eq!(
            MintInfo::from_account_data(None),
            Err(DecodeError::AccountMissing("Mint"))
        );
    }
}
