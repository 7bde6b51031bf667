//! Scaled fixed-point mint fee and referrer reward
//!
//! All arithmetic runs on integers scaled by [`SCALE`] and every division
//! floors, so results are bit-identical to the program's own computation.
//! No floating point is used after the difficulty coefficient is scaled.

use serde::Serialize;
use thiserror::Error;

/// Fixed-point scale (1.0 == 1_000_000)
pub const SCALE: u128 = 1_000_000;

/// Referrer reward share of the discount, scaled (0.2)
const REWARD_BASE_SCALED: u128 = 200_000;

/// Discount tiers as `(min balance ratio scaled, discount scaled)`, highest first
pub const DISCOUNT_TIERS: [(u128, u128); 5] = [
    (10_000, 250_000), // ratio >= 1.0%  -> 25%
    (8_000, 200_000),  // ratio >= 0.8%  -> 20%
    (6_000, 150_000),  // ratio >= 0.6%  -> 15%
    (4_000, 100_000),  // ratio >= 0.4%  -> 10%
    (2_000, 50_000),   // ratio >= 0.2%  -> 5%
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeeError {
    #[error("Difficulty coefficient must be positive and finite, got {0}")]
    InvalidDifficulty(f64),

    #[error("Fee arithmetic overflow")]
    Overflow,
}

/// Result of a fee computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeQuote {
    /// Fee charged to the minter, in lamports
    pub fee: u64,
    /// Share credited to the referrer, in lamports
    pub referrer_reward: u64,
    /// Referrer balance / total supply, scaled
    pub balance_ratio_scaled: u64,
    /// Discount applied, scaled
    pub discount_scaled: u64,
}

/// Referrer balance as a fraction of total supply, scaled and floored
pub fn balance_ratio_scaled(referrer_balance: u64, total_supply: u64) -> u128 {
    if total_supply == 0 {
        return 0;
    }
    referrer_balance as u128 * SCALE / total_supply as u128
}

/// Discount for a scaled balance ratio
pub fn discount_for_ratio(ratio_scaled: u128) -> u128 {
    DISCOUNT_TIERS
        .iter()
        .find(|(threshold, _)| ratio_scaled >= *threshold)
        .map(|(_, discount)| *discount)
        .unwrap_or(0)
}

/// `floor(coefficient * SCALE)`, rejecting values that would divide by zero
pub fn difficulty_scaled(difficulty_coefficient: f64) -> Result<u128, FeeError> {
    if !difficulty_coefficient.is_finite() || difficulty_coefficient <= 0.0 {
        return Err(FeeError::InvalidDifficulty(difficulty_coefficient));
    }
    let scaled = (difficulty_coefficient * SCALE as f64).floor();
    if scaled < 1.0 {
        return Err(FeeError::InvalidDifficulty(difficulty_coefficient));
    }
    if scaled >= u128::MAX as f64 {
        return Err(FeeError::Overflow);
    }
    Ok(scaled as u128)
}

/// Compute `(fee, referrer reward)`:
///
/// - `fee    = fee_rate * (1 + discount/difficulty - discount)`
/// - `reward = fee_rate * 0.2 * discount * (1 - 1/difficulty)`
///
/// A difficulty below 1.0 makes the reward term negative; the reward is
/// floored at zero in that case.
pub fn compute_fee(
    fee_rate: u64,
    difficulty_coefficient: f64,
    referrer_balance: u64,
    total_supply: u64,
) -> Result<FeeQuote, FeeError> {
    let ratio = balance_ratio_scaled(referrer_balance, total_supply);
    let discount = discount_for_ratio(ratio);
    let difficulty = difficulty_scaled(difficulty_coefficient)?;
    let fee_rate = fee_rate as u128;

    // SCALE + floor(discount * SCALE / difficulty) - discount; never negative
    // because discount <= 0.25 * SCALE
    let discount_by_difficulty = discount * SCALE / difficulty;
    let multiplier = SCALE + discount_by_difficulty - discount;
    let fee = fee_rate.checked_mul(multiplier).ok_or(FeeError::Overflow)? / SCALE;

    let inverse_difficulty = SCALE * SCALE / difficulty;
    let reward = if inverse_difficulty >= SCALE {
        0
    } else {
        let difficulty_factor = SCALE - inverse_difficulty;
        let reward_multiplier = REWARD_BASE_SCALED * discount * difficulty_factor;
        fee_rate
            .checked_mul(reward_multiplier)
            .ok_or(FeeError::Overflow)?
            / (SCALE * SCALE * SCALE)
    };

    Ok(FeeQuote {
        fee: u64::try_from(fee).map_err(|_| FeeError::Overflow)?,
        referrer_reward: u64::try_from(reward).map_err(|_| FeeError::Overflow)?,
        balance_ratio_scaled: u64::try_from(ratio).map_err(|_| FeeError::Overflow)?,
        discount_scaled: discount as u64,
    })
}
