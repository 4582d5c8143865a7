//! Tick index to price conversion
//!
//! Geometric tick spacing: each block of `9 * 10^6` ticks spans one power of
//! ten of price, with the additive increment shrinking by a power of ten when
//! crossing into the negative range.

use std::str::FromStr;

use cosmwasm_std::{Decimal, Decimal256};
use thiserror::Error;

/// Largest representable spot price, 10^35.
const MAX_SPOT_PRICE: &str = "100000000000000000000000000000000000000";
/// Smallest representable spot price, 10^-12.
const MIN_SPOT_PRICE: &str = "0.000000000001";
/// Exponent of the additive price increment at price one.
const EXPONENT_AT_PRICE_ONE: i64 = -6;

/// Lowest initializable tick index.
pub const MIN_INITIALIZED_TICK: i64 = -108_000_000;
/// Highest tick index.
pub const MAX_TICK: i64 = 342_000_000;

#[derive(Debug, Error, PartialEq)]
pub enum TickMathError {
    #[error("tick index {tick_index} is below the minimum of {MIN_INITIALIZED_TICK}")]
    TickIndexTooLow { tick_index: i64 },

    #[error("tick index {tick_index} is above the maximum of {MAX_TICK}")]
    TickIndexTooHigh { tick_index: i64 },

    #[error("price {price} is out of bounds")]
    PriceOutOfBounds { price: Decimal256 },

    #[error("tick math overflow")]
    Overflow,
}

/// Converts a tick index into its spot price.
pub fn tick_to_price(tick_index: i64) -> Result<Decimal256, TickMathError> {
    if tick_index == 0 {
        return Ok(Decimal256::one());
    }

    if tick_index < MIN_INITIALIZED_TICK {
        return Err(TickMathError::TickIndexTooLow { tick_index });
    }
    if tick_index > MAX_TICK {
        return Err(TickMathError::TickIndexTooHigh { tick_index });
    }

    // 9 * 10^(-exponent_at_price_one) ticks per power of ten of price.
    let ticks_per_geometric_exponent: i64 = 9 * 10i64
        .checked_pow((-EXPONENT_AT_PRICE_ONE) as u32)
        .ok_or(TickMathError::Overflow)?;

    let geometric_exponent_delta = tick_index / ticks_per_geometric_exponent;

    let mut exponent_at_current_tick = EXPONENT_AT_PRICE_ONE + geometric_exponent_delta;
    if tick_index < 0 {
        // Entering the negative range steps the precision up by one power of
        // ten; without this the first negative block would reuse the
        // exponent at price one.
        exponent_at_current_tick -= 1;
    }

    // Increments can go beyond the 18-decimal limit, hence 256-bit decimals.
    let additive_increment = pow_ten_256(exponent_at_current_tick)?;

    let num_additive_ticks =
        tick_index - geometric_exponent_delta * ticks_per_geometric_exponent;

    let base = pow_ten_256(geometric_exponent_delta)?;
    let offset = Decimal256::from_str(&num_additive_ticks.unsigned_abs().to_string())
        .map_err(|_| TickMathError::Overflow)?
        .checked_mul(additive_increment)
        .map_err(|_| TickMathError::Overflow)?;

    let price = if num_additive_ticks < 0 {
        base.checked_sub(offset)
    } else {
        base.checked_add(offset)
    }
    .map_err(|_| TickMathError::Overflow)?;

    let max_price = Decimal256::from_str(MAX_SPOT_PRICE).map_err(|_| TickMathError::Overflow)?;
    let min_price = Decimal256::from_str(MIN_SPOT_PRICE).map_err(|_| TickMathError::Overflow)?;
    if price > max_price || price < min_price {
        return Err(TickMathError::PriceOutOfBounds { price });
    }

    Ok(price)
}

/// Converts a tick index into the square root of its spot price.
pub fn tick_to_sqrt_price(tick_index: i64) -> Result<Decimal256, TickMathError> {
    Ok(tick_to_price(tick_index)?.sqrt())
}

fn pow_ten_256(exponent: i64) -> Result<Decimal256, TickMathError> {
    let p = Decimal256::from_str("10")
        .map_err(|_| TickMathError::Overflow)?
        .checked_pow(exponent.unsigned_abs() as u32)
        .map_err(|_| TickMathError::Overflow)?;
    if exponent >= 0 {
        Ok(p)
    } else {
        Ok(Decimal256::one() / p)
    }
}
