//! Bounds-checked decoders for raw account buffers
//!
//! - **reader**: cursor over a byte slice; every read checks the remaining length
//! - **metadata**: legacy token-metadata account layout
//! - **accounts**: fair-mint program accounts (config, system config, referral, code, refund)
//! - **token**: SPL mint state

use thiserror::Error;

pub mod accounts;
pub mod metadata;
mod reader;
pub mod token;

pub use accounts::{
    CodeAccountData, InitializeTokenConfigData, ProgramAccount, SystemConfigData, TokenConfigData, TokenMintState,
    TokenReferralData, TokenRefundData,
};
pub use metadata::{Collection, Creator, LegacyMetadata};
pub use reader::ByteReader;
pub use token::MintInfo;

/// Failure to decode an account buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The account does not exist on the ledger
    #[error("{0} account not found")]
    AccountMissing(&'static str),

    /// The buffer ended before the layout was complete
    #[error("Buffer too short reading {field}: need {needed} bytes at offset {offset}, have {len}")]
    UnexpectedEnd {
        field: &'static str,
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// A length-prefixed string was not valid UTF-8
    #[error("Field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// The 8-byte account discriminator did not match the expected type
    #[error("Discriminator mismatch for {0}")]
    DiscriminatorMismatch(&'static str),

    /// Rejected by the owning program's own unpacker
    #[error("Invalid {account} account: {reason}")]
    InvalidLayout { account: &'static str, reason: String },
}

impl DecodeError {
    pub fn category(&self) -> &'static str {
        match self {
            Self::AccountMissing(_) => "missing",
            Self::UnexpectedEnd { .. } => "truncated",
            Self::InvalidUtf8(_) => "utf8",
            Self::DiscriminatorMismatch(_) => "discriminator",
            Self::InvalidLayout { .. } => "layout",
        }
    }
}
