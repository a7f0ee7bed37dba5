#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token::{Client as TokenClient, StellarAssetClient},
    Address, Env, String,
};

use consensus::{proposal::ProposalState, ConsensusContract, ConsensusContractClient};

/// Actions modelling all engine entry points plus time control.
///
/// Each variant carries the minimal data needed for execution. Values are
/// bounded to realistic ranges to avoid wasting fuzz cycles on trivially
/// rejected inputs.
#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Vote { supports: bool },
    Stake { amount: u16, supports: bool },
    Unstake { amount: u16, supports: bool },
    Boost,
    Expire,
    Resolve,
    AdvanceTime { delta: u16 },
}

const PRECISION: i128 = 10_000_000_000_000_000;

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_700_000_000);

    let vote_tok = env.register_stellar_asset_contract_v2(Address::generate(&env));
    let stake_tok = env.register_stellar_asset_contract_v2(Address::generate(&env));

    let contract_id = env.register(ConsensusContract, ());
    let client = ConsensusContractClient::new(&env, &contract_id);

    if client
        .try_init(
            &vote_tok.address(),
            &stake_tok.address(),
            &10_000i128,
            &(51 * PRECISION),
            &86_400u64,
            &21_600u64,
            &3_600u64,
            &3_600u64,
            &10i128,
            &4i128,
        )
        .is_err()
    {
        return;
    }

    let mut users = vec![];
    for i in 0i128..4 {
        let u = Address::generate(&env);
        // Mint voting power and stake tokens so actions can succeed.
        StellarAssetClient::new(&env, &vote_tok.address()).mint(&u, &(1_000 * (i + 1)));
        StellarAssetClient::new(&env, &stake_tok.address()).mint(&u, &1_000_000i128);
        TokenClient::new(&env, &stake_tok.address()).approve(
            &u,
            &contract_id,
            &1_000_000i128,
            &1_000_000u32,
        );
        users.push(u);
    }

    let id = client.create_proposal(&users[0], &String::from_str(&env, "fuzzed"));

    // ── Invariants checked after every action ──
    // - aggregates match the per-user sub-ledgers and never go negative
    // - custody balance equals committed stake minus fees paid out
    // - terminal states never change
    let mut fees_paid = 0i128;
    let mut terminal: Option<ProposalState> = None;

    for (i, action) in actions.into_iter().enumerate() {
        let caller = &users[i % users.len()];
        match action {
            FuzzAction::Vote { supports } => {
                let _ = client.try_vote(caller, &id, &supports);
            }
            FuzzAction::Stake { amount, supports } => {
                let amt = (amount as i128).max(1);
                let _ = client.try_stake(caller, &id, &amt, &supports);
            }
            FuzzAction::Unstake { amount, supports } => {
                let amt = (amount as i128).max(1);
                let _ = client.try_unstake(caller, &id, &amt, &supports);
            }
            FuzzAction::Boost => {
                if let Ok(Ok(fee)) = client.try_boost_proposal(caller, &id) {
                    fees_paid += fee;
                }
            }
            FuzzAction::Expire => {
                if let Ok(Ok(fee)) = client.try_expire_non_boosted(caller, &id) {
                    fees_paid += fee;
                }
            }
            FuzzAction::Resolve => {
                if let Ok(Ok(fee)) = client.try_resolve_boosted(caller, &id) {
                    fees_paid += fee;
                }
            }
            FuzzAction::AdvanceTime { delta } => {
                let ts = env.ledger().timestamp().saturating_add(delta as u64);
                env.ledger().set_timestamp(ts);
            }
        }

        // ── Post-action invariant checks ──
        let record = client.get_proposal(&id).unwrap();
        assert!(record.upstake >= 0, "INVARIANT VIOLATION: upstake negative");
        assert!(record.downstake >= 0, "INVARIANT VIOLATION: downstake negative");
        assert!(record.yea >= 0 && record.nay >= 0, "INVARIANT VIOLATION: tally negative");

        let mut up_sum = 0i128;
        let mut down_sum = 0i128;
        for u in &users {
            let up = client.get_upstake(&id, u);
            let down = client.get_downstake(&id, u);
            assert!(up >= 0 && down >= 0, "INVARIANT VIOLATION: sub-ledger negative");
            up_sum += up;
            down_sum += down;
        }
        assert_eq!(up_sum, record.upstake, "INVARIANT VIOLATION: upstake != sum");
        assert_eq!(down_sum, record.downstake, "INVARIANT VIOLATION: downstake != sum");

        let custody = TokenClient::new(&env, &stake_tok.address()).balance(&contract_id);
        assert_eq!(
            custody,
            record.upstake + record.downstake - fees_paid,
            "INVARIANT VIOLATION: custody out of balance"
        );

        let pended = record.state == ProposalState::Pended;
        assert_eq!(
            pended,
            record.last_pended_date != 0,
            "INVARIANT VIOLATION: pended timestamp incoherent"
        );

        match terminal {
            Some(state) => assert_eq!(
                state, record.state,
                "INVARIANT VIOLATION: terminal state changed"
            ),
            None => {
                if matches!(record.state, ProposalState::Resolved | ProposalState::Expired) {
                    terminal = Some(record.state);
                }
            }
        }
    }
});
