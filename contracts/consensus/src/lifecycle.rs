//! The proposal state machine and its time-driven pokes.
//!
//! Three permissionless pokes move proposals along once their clocks allow
//! it: `boost` promotes a sufficiently-confident proposal to the fast track,
//! `expire_non_boosted` closes out a proposal whose queue window elapsed, and
//! `resolve_boosted` closes out a boosted proposal whose decision window
//! elapsed. Each poke owes its caller a compensation fee paid from the
//! engine's stake custody; the fee grows with how late the poke is and is
//! capped by a fraction of the proposal's upstake.

use soroban_sdk::Env;

use crate::events;
use crate::math;
use crate::proposal::{Proposal, ProposalState};
use crate::tokens;
use crate::{Config, ContractError};

// ── Transitions ──────────────────────────────────────────────────────────────

/// Move `proposal` into `new_state`, maintaining the Pended timestamp
/// invariant (`last_pended_date` is non-zero exactly in Pended) and emitting
/// the state-change signal.
pub(crate) fn transition(env: &Env, proposal: &mut Proposal, new_state: ProposalState) {
    proposal.last_pended_date = if new_state == ProposalState::Pended {
        env.ledger().timestamp()
    } else {
        0
    };
    proposal.state = new_state;
    events::publish_state_changed(env, proposal.id, new_state);
}

// ── Pokes ────────────────────────────────────────────────────────────────────

/// Promote a Pended proposal to the Boosted fast track.
///
/// The proposal must have held its confidence for the full pended interval.
/// `start_date` is deliberately not reset: the boost deadline becomes
/// `start_date + boost_period`, so a proposal pended late in the queue phase
/// gets a short (possibly already elapsed) boost window.
///
/// Returns the compensation fee owed to the caller.
pub(crate) fn boost(
    env: &Env,
    config: &Config,
    proposal: &mut Proposal,
    now: u64,
) -> Result<i128, ContractError> {
    match proposal.state {
        ProposalState::Resolved | ProposalState::Expired => {
            return Err(ContractError::ProposalIsClosed)
        }
        ProposalState::Boosted => return Err(ContractError::ProposalIsBoosted),
        ProposalState::Queued | ProposalState::Unpended => {
            return Err(ContractError::ProposalDoesNotHaveEnoughConfidence)
        }
        ProposalState::Pended => {}
    }

    let cutoff = math::checked_add_u64(env, proposal.last_pended_date, config.pended_boost_period);
    if now < cutoff {
        return Err(ContractError::ProposalHasntHadConfidenceEnoughTime);
    }

    let fee = calc_fee(env, config, proposal.upstake, cutoff, now)?;
    require_custody_covers(env, config, fee)?;

    transition(env, proposal, ProposalState::Boosted);
    proposal.lifetime = config.boost_period;

    Ok(fee)
}

/// Expire a queue-track proposal whose window elapsed.
///
/// Returns the compensation fee owed to the caller.
pub(crate) fn expire_non_boosted(
    env: &Env,
    config: &Config,
    proposal: &mut Proposal,
    now: u64,
) -> Result<i128, ContractError> {
    match proposal.state {
        ProposalState::Resolved | ProposalState::Expired => {
            return Err(ContractError::ProposalIsClosed)
        }
        ProposalState::Boosted => return Err(ContractError::ProposalIsBoosted),
        ProposalState::Queued | ProposalState::Unpended | ProposalState::Pended => {}
    }

    let deadline = math::checked_add_u64(env, proposal.start_date, proposal.lifetime);
    if now < deadline {
        return Err(ContractError::ProposalIsActive);
    }

    let fee = calc_fee(env, config, proposal.upstake, deadline, now)?;
    require_custody_covers(env, config, fee)?;

    transition(env, proposal, ProposalState::Expired);

    Ok(fee)
}

/// Resolve a Boosted proposal whose decision window elapsed.
///
/// The engine only records Resolved; downstream consumers read the final
/// yea/nay tallies to interpret the outcome.
///
/// Returns the compensation fee owed to the caller.
pub(crate) fn resolve_boosted(
    env: &Env,
    config: &Config,
    proposal: &mut Proposal,
    now: u64,
) -> Result<i128, ContractError> {
    match proposal.state {
        ProposalState::Resolved | ProposalState::Expired => {
            return Err(ContractError::ProposalIsClosed)
        }
        ProposalState::Queued | ProposalState::Unpended | ProposalState::Pended => {
            return Err(ContractError::ProposalIsNotBoosted)
        }
        ProposalState::Boosted => {}
    }

    let deadline = math::checked_add_u64(env, proposal.start_date, proposal.lifetime);
    if now < deadline {
        return Err(ContractError::ProposalIsActive);
    }

    let fee = calc_fee(env, config, proposal.upstake, deadline, now)?;
    require_custody_covers(env, config, fee)?;

    transition(env, proposal, ProposalState::Resolved);

    Ok(fee)
}

// ── Compensation fee ─────────────────────────────────────────────────────────

/// Fee owed to a poke caller: grows linearly with lateness past `cutoff`,
/// shrinks with how heavily upstaked the proposal is, and is capped at
/// `upstake / compensation_fee_pct`.
///
/// ```text
/// elapsed = now - cutoff
/// portion = upstake * PRECISION / compensation_fee_pct
/// fee     = min(elapsed * PRECISION / portion, portion / PRECISION)
/// ```
///
/// An unstaked proposal has a zero cap, which would make any positive
/// lateness exceed it; that case is rejected outright.
pub(crate) fn calc_fee(
    env: &Env,
    config: &Config,
    upstake: i128,
    cutoff: u64,
    now: u64,
) -> Result<i128, ContractError> {
    if upstake <= 0 {
        return Err(ContractError::InvalidCompensationFee);
    }

    let elapsed = (now - cutoff) as i128;
    let portion = math::mul_div(
        env,
        upstake,
        math::PRECISION_MULTIPLIER,
        config.compensation_fee_pct,
    );
    if portion == 0 {
        return Err(ContractError::InvalidCompensationFee);
    }

    let fee_raw = math::mul_div(env, elapsed, math::PRECISION_MULTIPLIER, portion);
    let cap = portion / math::PRECISION_MULTIPLIER;
    Ok(fee_raw.min(cap))
}

/// The engine must be able to pay the fee out of its stake custody.
fn require_custody_covers(env: &Env, config: &Config, fee: i128) -> Result<(), ContractError> {
    if fee > 0 && tokens::engine_balance(env, &config.stake_token) < fee {
        return Err(ContractError::VotingDoesNotHaveEnoughFunds);
    }
    Ok(())
}
