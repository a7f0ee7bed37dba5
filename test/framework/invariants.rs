//! # State Invariant Definitions & Verification
//!
//! Defines the engine invariants that must hold after every operation.
//! Single-snapshot invariants are checked through the [`Invariant`] trait
//! and composed via [`InvariantSet`]; terminality, which relates two
//! successive snapshots, has its own checker.

extern crate std;

use std::string::String;
use std::vec::Vec;

use consensus::proposal::ProposalState;

use super::EngineSnapshot;

// ── Invariant Trait ──────────────────────────────────────────────────────────

/// A named invariant that can be verified against a state snapshot.
pub trait Invariant {
    /// Human-readable name for error messages.
    fn name(&self) -> &str;

    /// Check the invariant. Returns `Ok(())` on success, `Err(description)`
    /// on violation.
    fn check(&self, snapshot: &EngineSnapshot) -> Result<(), String>;
}

/// A composed set of invariants checked together.
#[derive(Default)]
pub struct InvariantSet {
    invariants: Vec<std::boxed::Box<dyn Invariant>>,
}

impl InvariantSet {
    /// The full battery of single-snapshot engine invariants.
    pub fn standard() -> Self {
        let mut set = Self::default();
        set.add(StakeConservation);
        set.add(SubLedgerConsistency);
        set.add(NonNegativeTallies);
        set.add(PendedTimestampCoherence);
        set
    }

    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(std::boxed::Box::new(invariant));
    }

    /// Check every invariant, panicking with a readable report on violation.
    pub fn assert_all(&self, snapshot: &EngineSnapshot) {
        for invariant in &self.invariants {
            if let Err(violation) = invariant.check(snapshot) {
                panic!("invariant '{}' violated: {}", invariant.name(), violation);
            }
        }
    }
}

// ── Built-in Invariants ──────────────────────────────────────────────────────

/// **Stake Conservation**: the engine's custody balance equals the stake
/// committed across all proposals minus the poke fees already paid out.
///
/// This is the most critical financial invariant. A violation means stake
/// tokens are being created or destroyed by stake/unstake/poke operations.
pub struct StakeConservation;

impl Invariant for StakeConservation {
    fn name(&self) -> &str {
        "engine balance == total committed - fees paid"
    }

    fn check(&self, snapshot: &EngineSnapshot) -> Result<(), String> {
        let expected = snapshot.total_committed() - snapshot.fees_paid;
        if snapshot.engine_balance != expected {
            return Err(std::format!(
                "engine balance {} != committed {} - fees {}",
                snapshot.engine_balance,
                snapshot.total_committed(),
                snapshot.fees_paid
            ));
        }
        Ok(())
    }
}

/// **Sub-Ledger Consistency**: each proposal's aggregate upstake and
/// downstake equal the sums over its per-staker sub-ledgers.
pub struct SubLedgerConsistency;

impl Invariant for SubLedgerConsistency {
    fn name(&self) -> &str {
        "aggregates == sum(sub-ledgers)"
    }

    fn check(&self, snapshot: &EngineSnapshot) -> Result<(), String> {
        for proposal in &snapshot.proposals {
            let up: i128 = proposal.stakes.iter().map(|(_, u, _)| u).sum();
            let down: i128 = proposal.stakes.iter().map(|(_, _, d)| d).sum();
            if proposal.upstake != up || proposal.downstake != down {
                return Err(std::format!(
                    "proposal {}: aggregates ({}, {}) != sums ({}, {})",
                    proposal.id, proposal.upstake, proposal.downstake, up, down
                ));
            }
        }
        Ok(())
    }
}

/// **Non-Negative Tallies**: tallies, stakes, and sub-ledgers never dip
/// below zero. Underflow here means a subtraction bug in vote replacement
/// or unstaking.
pub struct NonNegativeTallies;

impl Invariant for NonNegativeTallies {
    fn name(&self) -> &str {
        "tallies and stakes >= 0"
    }

    fn check(&self, snapshot: &EngineSnapshot) -> Result<(), String> {
        for proposal in &snapshot.proposals {
            if proposal.yea < 0
                || proposal.nay < 0
                || proposal.upstake < 0
                || proposal.downstake < 0
            {
                return Err(std::format!("proposal {} has a negative field", proposal.id));
            }
            for (addr, up, down) in &proposal.stakes {
                if *up < 0 || *down < 0 {
                    return Err(std::format!(
                        "proposal {}: staker {:?} has a negative sub-ledger",
                        proposal.id, addr
                    ));
                }
            }
        }
        Ok(())
    }
}

/// **Pended Timestamp Coherence**: a proposal is Pended exactly when its
/// `last_pended_date` is non-zero.
pub struct PendedTimestampCoherence;

impl Invariant for PendedTimestampCoherence {
    fn name(&self) -> &str {
        "state == Pended <=> last_pended_date != 0"
    }

    fn check(&self, snapshot: &EngineSnapshot) -> Result<(), String> {
        for proposal in &snapshot.proposals {
            let pended = proposal.state == ProposalState::Pended;
            if pended != (proposal.last_pended_date != 0) {
                return Err(std::format!(
                    "proposal {}: state {:?} with last_pended_date {}",
                    proposal.id, proposal.state, proposal.last_pended_date
                ));
            }
        }
        Ok(())
    }
}

// ── Cross-Snapshot Checks ────────────────────────────────────────────────────

/// **Monotone Terminality**: once Resolved or Expired, a proposal's state
/// never changes again.
pub fn assert_terminality_monotone(before: &EngineSnapshot, after: &EngineSnapshot) {
    for prev in &before.proposals {
        let terminal = matches!(
            prev.state,
            ProposalState::Resolved | ProposalState::Expired
        );
        if !terminal {
            continue;
        }
        let cur = after
            .proposals
            .iter()
            .find(|p| p.id == prev.id)
            .expect("proposals are never deleted");
        assert_eq!(
            cur.state, prev.state,
            "terminal proposal {} changed state",
            prev.id
        );
    }
}
