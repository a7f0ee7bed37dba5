//! Capability adapter over the two SEP-41 token ledgers.
//!
//! The engine consumes a deliberately small surface: balance reads on both
//! ledgers, allowance reads on the stake ledger, and the two custody moves
//! (pull a stake in, pay stake back out). These functions are the only place
//! token motion happens; callers sequence them after all state writes.

use soroban_sdk::{token, Address, Env};

/// Balance of `who` on `token` (vote weight or stake holdings).
pub(crate) fn balance(env: &Env, token: &Address, who: &Address) -> i128 {
    token::Client::new(env, token).balance(who)
}

/// Remaining allowance `owner` has granted the engine on `token`.
pub(crate) fn allowance(env: &Env, token: &Address, owner: &Address) -> i128 {
    let engine = env.current_contract_address();
    token::Client::new(env, token).allowance(owner, &engine)
}

/// Pull `amount` of `token` from `from` into the engine's custody.
///
/// Requires a prior allowance from `from` to the engine; callers check the
/// allowance and balance first so the failure surfaces as a typed error.
pub(crate) fn deposit(env: &Env, token: &Address, from: &Address, amount: i128) {
    let engine = env.current_contract_address();
    token::Client::new(env, token).transfer_from(&engine, from, &engine, &amount);
}

/// Pay `amount` of `token` out of the engine's custody to `to`.
pub(crate) fn pay_out(env: &Env, token: &Address, to: &Address, amount: i128) {
    let engine = env.current_contract_address();
    token::Client::new(env, token).transfer(&engine, to, &amount);
}

/// The engine's own balance on `token` (the custody pool).
pub(crate) fn engine_balance(env: &Env, token: &Address) -> i128 {
    let engine = env.current_contract_address();
    token::Client::new(env, token).balance(&engine)
}
