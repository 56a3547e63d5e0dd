//! Conversions between VAA amounts and on-chain token amounts.
//!
//! The token bridge truncates every transfer amount to at most 8 decimals
//! before putting it in a VAA, so tokens with more decimals need their VAA
//! amount scaled back up before comparing it with on-chain values.

use ethers::types::U256;

/// Decimals carried by VAA amounts.
pub const VAA_DECIMALS: u8 = 8;

/// Converts a VAA amount into the on-chain amount of a token with
/// `token_decimals` decimals.
///
/// Amounts of tokens with at most 8 decimals are returned unchanged.
pub fn normalize(vaa_amount: U256, token_decimals: u8) -> U256 {
    if token_decimals <= VAA_DECIMALS {
        return vaa_amount;
    }
    rescale(vaa_amount, VAA_DECIMALS, token_decimals)
}

/// Re-expresses a fixed point `amount` with `from` decimals as a fixed
/// point value with `to` decimals.
///
/// Digits that do not fit in `to` decimals are truncated, never rounded.
/// Scaling up saturates at [`U256::MAX`].
pub fn rescale(amount: U256, from: u8, to: u8) -> U256 {
    use std::cmp::Ordering::*;
    match to.cmp(&from) {
        Equal => amount,
        Greater => amount.saturating_mul(pow10(to - from)),
        Less => amount / pow10(from - to),
    }
}

fn pow10(exp: u8) -> U256 {
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .unwrap_or(U256::MAX)
}
