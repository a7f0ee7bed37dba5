//! # Consensus Engine — Property-Based Tests
//!
//! Exercises the engine through the testing framework:
//! - Round-trip and idempotence properties (stake/unstake, re-vote)
//! - Rejection of invalid amounts
//! - Fee-cap bounds on lifecycle pokes
//! - Full invariant battery under randomized action sequences

extern crate std;

use proptest::prelude::*;
use soroban_sdk::Address;

use test_framework::generators::*;
use test_framework::invariants::*;
use test_framework::*;

// ── Action dispatch ──────────────────────────────────────────────────────────

/// Apply one randomized action, tolerating rejections: error paths are part
/// of the state space under test.
fn apply_action(
    harness: &mut EngineTestHarness,
    voters: &[Address],
    stakers: &[Address],
    num_proposals: u64,
    action: &EngineAction,
) {
    match action {
        EngineAction::Vote { voter, proposal, supports } => {
            let voter = &voters[*voter as usize % voters.len()];
            let id = *proposal as u64 % num_proposals;
            let _ = harness.client.try_vote(voter, &id, supports);
        }
        EngineAction::Stake { staker, proposal, amount, supports } => {
            let staker = &stakers[*staker as usize % stakers.len()];
            let id = *proposal as u64 % num_proposals;
            let _ = harness.client.try_stake(staker, &id, amount, supports);
        }
        EngineAction::Unstake { staker, proposal, amount, supports } => {
            let staker = &stakers[*staker as usize % stakers.len()];
            let id = *proposal as u64 % num_proposals;
            let _ = harness.client.try_unstake(staker, &id, amount, supports);
        }
        EngineAction::Boost { caller, proposal } => {
            let caller = stakers[*caller as usize % stakers.len()].clone();
            let id = *proposal as u64 % num_proposals;
            let _ = harness.try_boost(&caller, id);
        }
        EngineAction::Expire { caller, proposal } => {
            let caller = stakers[*caller as usize % stakers.len()].clone();
            let id = *proposal as u64 % num_proposals;
            let _ = harness.try_expire(&caller, id);
        }
        EngineAction::Resolve { caller, proposal } => {
            let caller = stakers[*caller as usize % stakers.len()].clone();
            let id = *proposal as u64 % num_proposals;
            let _ = harness.try_resolve(&caller, id);
        }
        EngineAction::AdvanceTime { secs } => {
            harness.env.advance_time(*secs);
        }
    }
}

// ── Properties ───────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// **Property**: staking `amount` moves exactly `amount` into custody
    /// and onto the proposal's aggregate.
    #[test]
    fn prop_stake_increases_aggregate(amount in positive_amount_strategy()) {
        let mut env = TestEnv::new();
        let mut harness = EngineTestHarness::new(&mut env);
        let staker = harness.create_staker(amount);
        let id = harness.create_proposal(&staker);

        harness.stake(&staker, id, amount, true);

        let record = harness.client.get_proposal(&id).unwrap();
        prop_assert_eq!(record.upstake, amount);
        prop_assert_eq!(harness.engine_balance(), amount);
        prop_assert_eq!(harness.stake_balance(&staker), 0);
    }

    /// **Property**: stake followed by a full unstake restores the
    /// sub-ledger, the aggregate, and both token balances exactly.
    #[test]
    fn prop_stake_unstake_round_trip(
        amount in positive_amount_strategy(),
        supports in any::<bool>(),
    ) {
        let mut env = TestEnv::new();
        let mut harness = EngineTestHarness::new(&mut env);
        let staker = harness.create_staker(amount);
        let id = harness.create_proposal(&staker);

        harness.stake(&staker, id, amount, supports);
        harness.unstake(&staker, id, amount, supports);

        let record = harness.client.get_proposal(&id).unwrap();
        prop_assert_eq!(record.upstake, 0);
        prop_assert_eq!(record.downstake, 0);
        prop_assert_eq!(harness.client.get_upstake(&id, &staker), 0);
        prop_assert_eq!(harness.client.get_downstake(&id, &staker), 0);
        prop_assert_eq!(harness.engine_balance(), 0);
        prop_assert_eq!(harness.stake_balance(&staker), amount);
    }

    /// **Property**: re-casting the same choice with an unchanged balance
    /// leaves the tallies exactly where they were.
    #[test]
    fn prop_revote_same_choice_is_noop(supports in any::<bool>()) {
        let mut env = TestEnv::new();
        let mut harness = EngineTestHarness::new(&mut env);
        let voters = harness.create_voters();
        let id = harness.create_proposal(&voters[0]);

        harness.vote(&voters[4], id, supports);
        let first = harness.client.get_proposal(&id).unwrap();

        harness.vote(&voters[4], id, supports);
        let second = harness.client.get_proposal(&id).unwrap();

        prop_assert_eq!(first.yea, second.yea);
        prop_assert_eq!(first.nay, second.nay);
    }

    /// **Property**: zero and negative stake amounts are always rejected.
    #[test]
    fn prop_invalid_amounts_rejected(amount in invalid_amount_strategy()) {
        let mut env = TestEnv::new();
        let mut harness = EngineTestHarness::new(&mut env);
        let staker = harness.create_staker(1_000_000);
        let id = harness.create_proposal(&staker);

        let result = harness.client.try_stake(&staker, &id, &amount, &true);
        prop_assert!(result.is_err(),
            "staking amount {} should have been rejected", amount);
    }

    /// **Property**: a poke fee never exceeds the upstake-derived cap.
    #[test]
    fn prop_poke_fee_bounded_by_cap(
        upstake in 1i128..=1_000i128,
        lateness in 0u64..=100_000u64,
    ) {
        let mut env = TestEnv::new();
        let mut harness = EngineTestHarness::new(&mut env);
        let staker = harness.create_staker(upstake);
        let id = harness.create_proposal(&staker);

        harness.stake(&staker, id, upstake, true);
        harness.env.advance_time(QUEUE_PERIOD + lateness);

        let poker = staker.clone();
        let fee = harness.try_expire(&poker, id);
        prop_assert!(fee.is_some(), "expiry past the deadline must succeed");
        let fee = fee.unwrap();
        prop_assert!(fee >= 0);
        prop_assert!(fee <= upstake / COMPENSATION_FEE_PCT,
            "fee {} exceeds cap for upstake {}", fee, upstake);
    }

    /// **Property**: the full invariant battery holds after every action of
    /// a randomized governance session, and terminal proposals never move.
    #[test]
    fn prop_invariants_hold_under_random_actions(
        actions in engine_action_sequence(3, 15),
    ) {
        let mut env = TestEnv::new();
        let mut harness = EngineTestHarness::new(&mut env);
        let voters = harness.create_voters();
        let stakers: std::vec::Vec<Address> = (0..4)
            .map(|_| harness.create_staker(1_000_000_000))
            .collect();

        let creator = stakers[0].clone();
        let num_proposals = 2u64;
        for _ in 0..num_proposals {
            harness.create_proposal(&creator);
        }

        let invariants = InvariantSet::standard();
        let mut previous = harness.snapshot();
        invariants.assert_all(&previous);

        for action in &actions {
            apply_action(&mut harness, &voters, &stakers, num_proposals, action);

            let current = harness.snapshot();
            invariants.assert_all(&current);
            assert_terminality_monotone(&previous, &current);
            previous = current;
        }
    }
}
