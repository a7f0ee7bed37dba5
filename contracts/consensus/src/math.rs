//! Checked fixed-point arithmetic.
//!
//! All percentages and ratios are integers scaled by [`PRECISION_MULTIPLIER`]
//! (10^16), so 100 % is 10^18. Arithmetic never wraps and never saturates:
//! any overflow or underflow aborts the invocation through
//! `panic_with_error!`, which the host turns into a transaction rollback.

use soroban_sdk::{panic_with_error, Env, U256};

use crate::ContractError;

/// Scale factor for fixed-point ratios. 1 % is `PRECISION_MULTIPLIER`.
pub const PRECISION_MULTIPLIER: i128 = 10_000_000_000_000_000;

/// 100 % in fixed-point scale.
pub const PCT_BASE: i128 = 100 * PRECISION_MULTIPLIER;

/// `a + b` with overflow as a fatal error.
pub fn checked_add(env: &Env, a: i128, b: i128) -> i128 {
    match a.checked_add(b) {
        Some(v) => v,
        None => panic_with_error!(env, ContractError::ArithmeticOverflow),
    }
}

/// `a - b` with underflow as a fatal error.
pub fn checked_sub(env: &Env, a: i128, b: i128) -> i128 {
    match a.checked_sub(b) {
        Some(v) => v,
        None => panic_with_error!(env, ContractError::ArithmeticOverflow),
    }
}

/// `a * b` with overflow as a fatal error.
pub fn checked_mul(env: &Env, a: i128, b: i128) -> i128 {
    match a.checked_mul(b) {
        Some(v) => v,
        None => panic_with_error!(env, ContractError::ArithmeticOverflow),
    }
}

/// `a + b` over timestamps and durations.
pub fn checked_add_u64(env: &Env, a: u64, b: u64) -> u64 {
    match a.checked_add(b) {
        Some(v) => v,
        None => panic_with_error!(env, ContractError::ArithmeticOverflow),
    }
}

/// `a * b / c` computed through a 256-bit widening multiply, so the
/// intermediate product cannot overflow. Division is floor division.
///
/// Inputs must be non-negative and `c` strictly positive; anything else is
/// a fatal arithmetic error, as is a quotient that does not fit in `i128`.
pub fn mul_div(env: &Env, a: i128, b: i128, c: i128) -> i128 {
    if a < 0 || b < 0 || c <= 0 {
        panic_with_error!(env, ContractError::ArithmeticOverflow);
    }

    let wide = U256::from_u128(env, a as u128).mul(&U256::from_u128(env, b as u128));
    let quotient = wide.div(&U256::from_u128(env, c as u128));

    match quotient.to_u128() {
        Some(v) if v <= i128::MAX as u128 => v as i128,
        _ => panic_with_error!(env, ContractError::ArithmeticOverflow),
    }
}
