//! Conversion between whole-token quantities and raw on-chain amounts
//!
//! A raw amount is a token quantity scaled by `10^decimals`. Whole-token
//! quantities are `u64`, so negative inputs are rejected when parsed rather
//! than at conversion time.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::constants::MAX_DECIMALS;
use crate::errors::LedgerError;
use crate::LedgerResult;

/// Scale factor `10^decimals`
pub fn scale(decimals: u8) -> LedgerResult<u64> {
    if decimals > MAX_DECIMALS {
        return Err(LedgerError::invalid_amount(
            decimals,
            &format!("decimals must be at most {}", MAX_DECIMALS),
        ));
    }
    Ok(10u64.pow(decimals as u32))
}

/// Convert whole tokens to the raw amount
pub fn tokens_to_raw(tokens: u64, decimals: u8) -> LedgerResult<u64> {
    tokens
        .checked_mul(scale(decimals)?)
        .ok_or_else(|| LedgerError::invalid_amount(tokens, "raw amount overflows u64"))
}

/// Convert a raw amount back to whole tokens, discarding any fractional part
pub fn raw_to_tokens(raw: u64, decimals: u8) -> LedgerResult<u64> {
    Ok(raw / scale(decimals)?)
}

/// Parse a whole-token quantity, rejecting negative and non-integer input
pub fn parse_tokens(value: &str) -> LedgerResult<u64> {
    let trimmed = value.trim();
    if trimmed.starts_with('-') {
        return Err(LedgerError::invalid_amount(value, "token amount must be non-negative"));
    }
    trimmed
        .parse::<u64>()
        .map_err(|e| LedgerError::invalid_amount(value, &e.to_string()))
}

/// Convert a fractional token quantity to raw units, truncating below one raw unit
pub fn decimal_to_raw(tokens: Decimal, decimals: u8) -> LedgerResult<u64> {
    if tokens.is_sign_negative() && !tokens.is_zero() {
        return Err(LedgerError::invalid_amount(tokens, "token amount must be non-negative"));
    }
    let scaled = tokens
        .checked_mul(Decimal::from(scale(decimals)?))
        .ok_or_else(|| LedgerError::invalid_amount(tokens, "raw amount overflows"))?;
    scaled
        .trunc()
        .to_u64()
        .ok_or_else(|| LedgerError::invalid_amount(tokens, "raw amount does not fit u64"))
}

/// Exact fractional token quantity represented by a raw amount
pub fn raw_to_decimal(raw: u64, decimals: u8) -> Decimal {
    Decimal::from_i128_with_scale(raw as i128, decimals as u32)
}
