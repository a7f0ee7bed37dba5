//! Stake custody and confidence tracking.
//!
//! Upstakes and downstakes are two independent per-proposal, per-account
//! ledgers backed by the stake token. Every deposit or withdrawal updates the
//! caller's sub-ledger and the proposal aggregate, then reassesses the
//! proposal's confidence against the boost threshold, which is what drives
//! the Queued/Unpended to Pended transitions and back.

use soroban_sdk::{symbol_short, Address, Env, Symbol};

use crate::lifecycle;
use crate::math;
use crate::proposal::{Proposal, ProposalState};
use crate::tokens;
use crate::{Config, ContractError};

// ── Storage keys ──────────────────────────────────────────────────────────────

const UPSTAKE: Symbol = symbol_short!("UPSTK");
const DOWNSTAKE: Symbol = symbol_short!("DNSTK");

// TTL: ~60 days at 5s/ledger
const TTL_THRESHOLD: u32 = 1_036_800;
const TTL_EXTEND_TO: u32 = 2_073_600;

// ── Storage helpers ──────────────────────────────────────────────────────────

fn stake_key(prefix: &Symbol, proposal_id: u64, staker: &Address) -> (Symbol, u64, Address) {
    (prefix.clone(), proposal_id, staker.clone())
}

fn load_stake(env: &Env, prefix: &Symbol, proposal_id: u64, staker: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&stake_key(prefix, proposal_id, staker))
        .unwrap_or(0i128)
}

fn store_stake(env: &Env, prefix: &Symbol, proposal_id: u64, staker: &Address, amount: i128) {
    let key = stake_key(prefix, proposal_id, staker);
    env.storage().persistent().set(&key, &amount);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// `staker`'s tokens committed in favour of boosting `proposal_id`.
pub(crate) fn upstake_of(env: &Env, proposal_id: u64, staker: &Address) -> i128 {
    load_stake(env, &UPSTAKE, proposal_id, staker)
}

/// `staker`'s tokens committed against boosting `proposal_id`.
pub(crate) fn downstake_of(env: &Env, proposal_id: u64, staker: &Address) -> i128 {
    load_stake(env, &DOWNSTAKE, proposal_id, staker)
}

// ── Stake / unstake ──────────────────────────────────────────────────────────

/// Record a stake deposit on `proposal`.
///
/// Checks the staker's balance and allowance so the failure surfaces as a
/// typed error; the actual token pull happens in the orchestrator after all
/// state writes.
pub(crate) fn apply_stake(
    env: &Env,
    config: &Config,
    proposal: &mut Proposal,
    staker: &Address,
    amount: i128,
    supports: bool,
) -> Result<(), ContractError> {
    if proposal.state.is_terminal() {
        return Err(ContractError::ProposalIsClosed);
    }
    if amount <= 0 {
        return Err(ContractError::InvalidInput);
    }
    if tokens::balance(env, &config.stake_token, staker) < amount {
        return Err(ContractError::SenderDoesNotHaveEnoughFunds);
    }
    if tokens::allowance(env, &config.stake_token, staker) < amount {
        return Err(ContractError::InsufficientAllowance);
    }

    let prefix = if supports { UPSTAKE } else { DOWNSTAKE };
    let held = load_stake(env, &prefix, proposal.id, staker);
    store_stake(
        env,
        &prefix,
        proposal.id,
        staker,
        math::checked_add(env, held, amount),
    );
    if supports {
        proposal.upstake = math::checked_add(env, proposal.upstake, amount);
    } else {
        proposal.downstake = math::checked_add(env, proposal.downstake, amount);
    }

    reassess_confidence(env, config, proposal);
    Ok(())
}

/// Record a stake withdrawal from `proposal`.
pub(crate) fn apply_unstake(
    env: &Env,
    config: &Config,
    proposal: &mut Proposal,
    staker: &Address,
    amount: i128,
    supports: bool,
) -> Result<(), ContractError> {
    if proposal.state.is_terminal() {
        return Err(ContractError::ProposalIsClosed);
    }
    if amount <= 0 {
        return Err(ContractError::InvalidInput);
    }

    let prefix = if supports { UPSTAKE } else { DOWNSTAKE };
    let held = load_stake(env, &prefix, proposal.id, staker);
    if held < amount {
        return Err(ContractError::SenderDoesNotHaveRequiredStake);
    }

    store_stake(
        env,
        &prefix,
        proposal.id,
        staker,
        math::checked_sub(env, held, amount),
    );
    if supports {
        proposal.upstake = math::checked_sub(env, proposal.upstake, amount);
    } else {
        proposal.downstake = math::checked_sub(env, proposal.downstake, amount);
    }

    reassess_confidence(env, config, proposal);
    Ok(())
}

// ── Confidence ───────────────────────────────────────────────────────────────

/// `upstake / downstake` in fixed point; a zero downstake counts as 1.
pub(crate) fn confidence(env: &Env, proposal: &Proposal) -> i128 {
    math::mul_div(
        env,
        proposal.upstake,
        math::PRECISION_MULTIPLIER,
        proposal.downstake.max(1),
    )
}

/// Re-derive the queue-track state from the current confidence ratio.
///
/// Only the queue-track states react to confidence; a Boosted proposal keeps
/// its state no matter how the stakes move afterwards.
pub(crate) fn reassess_confidence(env: &Env, config: &Config, proposal: &mut Proposal) {
    if !matches!(
        proposal.state,
        ProposalState::Queued | ProposalState::Unpended | ProposalState::Pended
    ) {
        return;
    }

    let threshold =
        math::checked_mul(env, config.confidence_threshold_base, math::PRECISION_MULTIPLIER);
    let confidence = confidence(env, proposal);

    if confidence >= threshold {
        if proposal.state != ProposalState::Pended {
            lifecycle::transition(env, proposal, ProposalState::Pended);
        }
    } else if proposal.state == ProposalState::Pended {
        lifecycle::transition(env, proposal, ProposalState::Unpended);
    }
    // A Queued or Unpended proposal below the threshold keeps its state; the
    // two differ only by history.
}
