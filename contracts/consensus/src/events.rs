//! Structured event publishing for the consensus engine.

use soroban_sdk::{symbol_short, Address, Env, String};

use crate::proposal::ProposalState;

pub fn publish_proposal_created(env: &Env, id: u64, creator: &Address, metadata: &String) {
    env.events().publish(
        (symbol_short!("PROP_NEW"), id),
        (creator.clone(), metadata.clone()),
    );
}

pub fn publish_vote_casted(env: &Env, id: u64, voter: &Address, supports: bool, weight: i128) {
    env.events().publish(
        (symbol_short!("VOTE_CAST"), id),
        (voter.clone(), supports, weight),
    );
}

pub fn publish_upstake(env: &Env, id: u64, staker: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("UPSTAKE"), id), (staker.clone(), amount));
}

pub fn publish_downstake(env: &Env, id: u64, staker: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("DNSTAKE"), id), (staker.clone(), amount));
}

pub fn publish_withdraw_upstake(env: &Env, id: u64, staker: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("WD_UPSTK"), id), (staker.clone(), amount));
}

pub fn publish_withdraw_downstake(env: &Env, id: u64, staker: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("WD_DNSTK"), id), (staker.clone(), amount));
}

pub fn publish_state_changed(env: &Env, id: u64, new_state: ProposalState) {
    env.events()
        .publish((symbol_short!("PROP_STAT"), id), new_state);
}
