//! Proposal records and their storage.
//!
//! Proposals live in a dense, append-only collection keyed by a `u64` index
//! assigned at creation, starting from 0. Records are never deleted; the
//! terminal states simply stop accepting mutations.

use soroban_sdk::{contracttype, symbol_short, Env, String, Symbol};

// ── Storage keys ──────────────────────────────────────────────────────────────

pub(crate) const PROPOSAL_CTR: Symbol = symbol_short!("PROP_CTR");
pub(crate) const PROPOSAL: Symbol = symbol_short!("PROP");

// TTL: ~60 days at 5s/ledger
const TTL_THRESHOLD: u32 = 1_036_800;
const TTL_EXTEND_TO: u32 = 2_073_600;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Lifecycle state of a proposal.
///
/// ```text
/// Queued ──(confidence ≥ T)──► Pended ──(pended ≥ P, poke)──► Boosted
///    ▲                           │                               │
///    │        (confidence < T)   │                               │ (deadline, poke)
///    │                           ▼                               ▼
///    │                       Unpended ──(confidence ≥ T)──►  Resolved
///    │                           │
///    └───────── creation         │
///
/// Queued/Unpended/Pended ──(queue deadline, poke)──► Expired
/// any non-terminal       ──(yea absolute majority)──► Resolved
/// ```
///
/// Discriminants are part of the public encoding and must not change.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ProposalState {
    Queued = 0,
    Unpended = 1,
    Pended = 2,
    Boosted = 3,
    Resolved = 4,
    Expired = 5,
}

impl ProposalState {
    /// Resolved and Expired accept no further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Resolved | ProposalState::Expired)
    }
}

/// The on-chain proposal record.
///
/// Per-voter and per-staker sub-ledgers are stored separately, keyed by
/// `(proposal, account)`; see `voting.rs` and `staking.rs`.
#[contracttype]
#[derive(Clone, Debug)]
pub struct Proposal {
    pub id: u64,
    /// Opaque string carried for observers; the engine never interprets it.
    pub metadata: String,
    pub state: ProposalState,
    /// Creation instant. Never reset, not even on boost, so a proposal
    /// boosted late in the queue phase gets a correspondingly short window.
    pub start_date: u64,
    /// Duration after which the proposal expires on its current track:
    /// the queue period until boost, the boost period after.
    pub lifetime: u64,
    /// Instant the proposal most recently entered Pended; 0 in every other
    /// state.
    pub last_pended_date: u64,
    /// Cumulative vote-token weight in favour, sampled at vote time.
    pub yea: i128,
    /// Cumulative vote-token weight against, sampled at vote time.
    pub nay: i128,
    /// Total stake tokens committed toward boosting.
    pub upstake: i128,
    /// Total stake tokens committed against boosting.
    pub downstake: i128,
}

// ── Storage helpers ──────────────────────────────────────────────────────────

/// Allocate the next dense proposal id.
pub(crate) fn next_id(env: &Env) -> u64 {
    let id: u64 = env.storage().instance().get(&PROPOSAL_CTR).unwrap_or(0u64);
    env.storage()
        .instance()
        .set(&PROPOSAL_CTR, &id.saturating_add(1));
    id
}

/// Number of proposals ever created.
pub(crate) fn count(env: &Env) -> u64 {
    env.storage().instance().get(&PROPOSAL_CTR).unwrap_or(0u64)
}

pub(crate) fn proposal_key(id: u64) -> (Symbol, u64) {
    (PROPOSAL, id)
}

pub(crate) fn store(env: &Env, proposal: &Proposal) {
    let key = proposal_key(proposal.id);
    env.storage().persistent().set(&key, proposal);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub(crate) fn load(env: &Env, id: u64) -> Option<Proposal> {
    env.storage().persistent().get(&proposal_key(id))
}
