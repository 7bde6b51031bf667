//! Fair-mint program constants shared by the decoders and instruction builders

use sha2::{Digest, Sha256};

/// Maximum referral-code uses before the code is exhausted (admin referrers are exempt)
pub const REFERRAL_USAGE_CAP: u32 = 50;

/// Token decimals fixed by the program
pub const TOKEN_DECIMALS: u8 = 9;

/// First 8 bytes of `sha256("<namespace>:<name>")`.
///
/// Instructions use the `global` namespace with the snake_case method name;
/// accounts use the `account` namespace with the type name.
pub fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

pub fn instruction_discriminator(method: &str) -> [u8; 8] {
    discriminator("global", method)
}

pub fn account_discriminator(type_name: &str) -> [u8; 8] {
    discriminator("account", type_name)
}
