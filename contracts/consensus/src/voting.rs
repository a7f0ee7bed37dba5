//! Token-weighted voting and absolute-majority resolution.
//!
//! A vote's weight is the caller's vote-token balance sampled at the moment
//! the vote is cast. The sampled weight is stored with the vote record, so a
//! re-cast removes exactly what the earlier cast added even if the voter's
//! balance changed in between.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::lifecycle;
use crate::math;
use crate::proposal::{Proposal, ProposalState};
use crate::tokens;
use crate::{Config, ContractError};

// ── Storage keys ──────────────────────────────────────────────────────────────

const VOTE: Symbol = symbol_short!("VOTE");

// TTL: ~60 days at 5s/ledger
const TTL_THRESHOLD: u32 = 1_036_800;
const TTL_EXTEND_TO: u32 = 2_073_600;

// ── Types ─────────────────────────────────────────────────────────────────────

/// A voter's recorded choice. Discriminants are part of the public encoding.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Vote {
    Absent = 0,
    Yea = 1,
    Nay = 2,
}

/// A cast vote together with the weight it carried into the tally.
#[contracttype]
#[derive(Clone, Debug)]
pub struct VoteRecord {
    pub choice: Vote,
    pub weight: i128,
}

// ── Storage helpers ──────────────────────────────────────────────────────────

fn vote_key(proposal_id: u64, voter: &Address) -> (Symbol, u64, Address) {
    (VOTE, proposal_id, voter.clone())
}

fn store_vote(env: &Env, proposal_id: u64, voter: &Address, record: &VoteRecord) {
    let key = vote_key(proposal_id, voter);
    env.storage().persistent().set(&key, record);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub(crate) fn load_vote(env: &Env, proposal_id: u64, voter: &Address) -> Option<VoteRecord> {
    env.storage().persistent().get(&vote_key(proposal_id, voter))
}

// ── Vote application ─────────────────────────────────────────────────────────

/// Apply or replace `voter`'s choice on `proposal` and run the
/// absolute-majority test.
///
/// Returns the weight that entered the tally.
pub(crate) fn apply_vote(
    env: &Env,
    config: &Config,
    proposal: &mut Proposal,
    voter: &Address,
    supports: bool,
) -> Result<i128, ContractError> {
    if proposal.state.is_terminal() {
        return Err(ContractError::ProposalIsClosed);
    }

    let weight = tokens::balance(env, &config.vote_token, voter);
    if weight <= 0 {
        return Err(ContractError::UserHasNoVotingPower);
    }

    // Remove the previous cast, at the weight it was recorded with.
    if let Some(prior) = load_vote(env, proposal.id, voter) {
        match prior.choice {
            Vote::Yea => proposal.yea = math::checked_sub(env, proposal.yea, prior.weight),
            Vote::Nay => proposal.nay = math::checked_sub(env, proposal.nay, prior.weight),
            Vote::Absent => {}
        }
    }

    let choice = if supports { Vote::Yea } else { Vote::Nay };
    if supports {
        proposal.yea = math::checked_add(env, proposal.yea, weight);
    } else {
        proposal.nay = math::checked_add(env, proposal.nay, weight);
    }
    store_vote(env, proposal.id, voter, &VoteRecord { choice, weight });

    // Absolute majority: the yea tally measured against the whole vote-token
    // supply, not just the votes cast. Only a yea majority resolves; there is
    // no negative terminal by vote.
    let yea_pct = math::mul_div(env, proposal.yea, math::PCT_BASE, config.vote_supply);
    if yea_pct >= config.support_pct {
        lifecycle::transition(env, proposal, ProposalState::Resolved);
    }

    Ok(weight)
}
