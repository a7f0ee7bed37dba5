#![no_std]

//! # Holographic Consensus engine
//!
//! A governance engine that derives proposal outcomes from token-weighted
//! votes and stakes along two parallel paths:
//!
//! - **Queue track**: a proposal resolves the moment its yea tally reaches an
//!   absolute majority of the vote-token supply, or expires once the queue
//!   period elapses.
//! - **Boost track**: stakers back proposals with a second token; when the
//!   upstake/downstake confidence ratio holds above a threshold for long
//!   enough, anyone may boost the proposal onto a shorter decision window
//!   that resolves by plurality when it elapses.
//!
//! Lifecycle pokes (`boost_proposal`, `expire_non_boosted`,
//! `resolve_boosted`) are permissionless and pay the caller a compensation
//! fee from the stake custody, scaled by how late the poke is.
//!
//! Voting power is the caller's balance on the vote-token ledger, sampled at
//! vote time. Stakes are held in custody by the engine on the stake-token
//! ledger and returned on withdrawal. Both ledgers are external SEP-41
//! tokens; the engine only marks outcomes and never executes proposal
//! content.

pub mod events;
pub mod lifecycle;
pub mod math;
pub mod proposal;
pub mod staking;
pub mod tokens;
pub mod voting;

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Env, String,
    Symbol,
};

use proposal::{Proposal, ProposalState};
use voting::Vote;

// ── Storage key constants ─────────────────────────────────────────────────────

const CONFIG: Symbol = symbol_short!("CONFIG");

// ── Error codes ───────────────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidInput = 3,
    InitSupportTooSmall = 4,
    InitSupportTooBig = 5,
    ProposalDoesNotExist = 6,
    ProposalIsClosed = 7,
    ProposalIsBoosted = 8,
    ProposalIsNotBoosted = 9,
    ProposalIsActive = 10,
    ProposalDoesNotHaveEnoughConfidence = 11,
    ProposalHasntHadConfidenceEnoughTime = 12,
    UserHasNoVotingPower = 13,
    SenderDoesNotHaveEnoughFunds = 14,
    InsufficientAllowance = 15,
    SenderDoesNotHaveRequiredStake = 16,
    VotingDoesNotHaveEnoughFunds = 17,
    InvalidCompensationFee = 18,
    ArithmeticOverflow = 19,
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Engine parameters, immutable after `init`.
#[contracttype]
#[derive(Clone, Debug)]
pub struct Config {
    /// Ledger whose balances are voting power.
    pub vote_token: Address,
    /// Ledger whose tokens back stakes and pay poke fees.
    pub stake_token: Address,
    /// Total vote-token supply, the denominator of the absolute-majority
    /// test. Captured here because SEP-41 exposes no supply entry point.
    pub vote_supply: i128,
    /// Yea fraction of `vote_supply` that resolves a proposal outright,
    /// in `PCT_BASE` scale (10^18 is 100 %).
    pub support_pct: i128,
    /// Queue-track window, seconds from creation.
    pub queue_period: u64,
    /// Boost-track window, seconds from creation (not from boost).
    pub boost_period: u64,
    /// Quiet-ending extension carried for consumers; the engine itself does
    /// not read it.
    pub boost_period_extension: u64,
    /// How long confidence must hold before a Pended proposal may boost.
    pub pended_boost_period: u64,
    /// Divisor of the fee cap: a poke fee never exceeds
    /// `upstake / compensation_fee_pct`.
    pub compensation_fee_pct: i128,
    /// Confidence threshold as a plain multiplier; Pended requires
    /// `upstake / downstake >= confidence_threshold_base`.
    pub confidence_threshold_base: i128,
}

// ── Contract ──────────────────────────────────────────────────────────────────

#[contract]
pub struct ConsensusContract;

#[contractimpl]
impl ConsensusContract {
    // ── Initialisation ────────────────────────────────────────────────────────

    /// Bootstrap the engine with its two ledgers and timing parameters.
    ///
    /// `support_pct` must be at least 50 % and below 100 % of `PCT_BASE`.
    /// No relation between `queue_period` and `boost_period` is enforced: a
    /// boost period longer than the queue period lengthens the deadline on
    /// boost, and that configuration is tolerated as-is.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        env: Env,
        vote_token: Address,
        stake_token: Address,
        vote_supply: i128,
        support_pct: i128,
        queue_period: u64,
        boost_period: u64,
        boost_period_extension: u64,
        pended_boost_period: u64,
        compensation_fee_pct: i128,
        confidence_threshold_base: i128,
    ) -> Result<(), ContractError> {
        if env.storage().instance().has(&CONFIG) {
            return Err(ContractError::AlreadyInitialized);
        }
        if support_pct < 50 * math::PRECISION_MULTIPLIER {
            return Err(ContractError::InitSupportTooSmall);
        }
        if support_pct >= math::PCT_BASE {
            return Err(ContractError::InitSupportTooBig);
        }
        if vote_supply <= 0 || compensation_fee_pct <= 0 || confidence_threshold_base <= 0 {
            return Err(ContractError::InvalidInput);
        }

        let config = Config {
            vote_token,
            stake_token,
            vote_supply,
            support_pct,
            queue_period,
            boost_period,
            boost_period_extension,
            pended_boost_period,
            compensation_fee_pct,
            confidence_threshold_base,
        };
        env.storage().instance().set(&CONFIG, &config);

        Ok(())
    }

    // ── Proposal creation ─────────────────────────────────────────────────────

    /// Create a proposal in Queued state and return its dense id.
    ///
    /// `metadata` is carried verbatim for observers; the engine never
    /// interprets it.
    pub fn create_proposal(
        env: Env,
        creator: Address,
        metadata: String,
    ) -> Result<u64, ContractError> {
        let config = Self::config(&env)?;
        creator.require_auth();

        let id = proposal::next_id(&env);
        let record = Proposal {
            id,
            metadata: metadata.clone(),
            state: ProposalState::Queued,
            start_date: env.ledger().timestamp(),
            lifetime: config.queue_period,
            last_pended_date: 0,
            yea: 0,
            nay: 0,
            upstake: 0,
            downstake: 0,
        };

        proposal::store(&env, &record);
        events::publish_proposal_created(&env, id, &creator, &metadata);

        Ok(id)
    }

    // ── Voting ────────────────────────────────────────────────────────────────

    /// Cast or replace `voter`'s choice on a proposal.
    ///
    /// The weight is the voter's vote-token balance right now; a re-cast
    /// first removes the weight recorded with the earlier vote. If the yea
    /// tally reaches an absolute majority of the vote supply, the proposal
    /// resolves immediately.
    pub fn vote(
        env: Env,
        voter: Address,
        proposal_id: u64,
        supports: bool,
    ) -> Result<(), ContractError> {
        let config = Self::config(&env)?;
        voter.require_auth();

        let mut record =
            proposal::load(&env, proposal_id).ok_or(ContractError::ProposalDoesNotExist)?;
        let weight = voting::apply_vote(&env, &config, &mut record, &voter, supports)?;
        proposal::store(&env, &record);

        events::publish_vote_casted(&env, proposal_id, &voter, supports, weight);

        Ok(())
    }

    // ── Staking ───────────────────────────────────────────────────────────────

    /// Commit `amount` stake tokens for (`supports`) or against boosting a
    /// proposal. The tokens move into the engine's custody.
    pub fn stake(
        env: Env,
        staker: Address,
        proposal_id: u64,
        amount: i128,
        supports: bool,
    ) -> Result<(), ContractError> {
        let config = Self::config(&env)?;
        staker.require_auth();

        let mut record =
            proposal::load(&env, proposal_id).ok_or(ContractError::ProposalDoesNotExist)?;
        staking::apply_stake(&env, &config, &mut record, &staker, amount, supports)?;
        proposal::store(&env, &record);

        // Token motion after all state writes.
        tokens::deposit(&env, &config.stake_token, &staker, amount);

        if supports {
            events::publish_upstake(&env, proposal_id, &staker, amount);
        } else {
            events::publish_downstake(&env, proposal_id, &staker, amount);
        }

        Ok(())
    }

    /// Withdraw `amount` previously committed stake tokens from a proposal.
    pub fn unstake(
        env: Env,
        staker: Address,
        proposal_id: u64,
        amount: i128,
        supports: bool,
    ) -> Result<(), ContractError> {
        let config = Self::config(&env)?;
        staker.require_auth();

        let mut record =
            proposal::load(&env, proposal_id).ok_or(ContractError::ProposalDoesNotExist)?;
        staking::apply_unstake(&env, &config, &mut record, &staker, amount, supports)?;
        proposal::store(&env, &record);

        tokens::pay_out(&env, &config.stake_token, &staker, amount);

        if supports {
            events::publish_withdraw_upstake(&env, proposal_id, &staker, amount);
        } else {
            events::publish_withdraw_downstake(&env, proposal_id, &staker, amount);
        }

        Ok(())
    }

    // ── Lifecycle pokes ───────────────────────────────────────────────────────

    /// Promote a Pended proposal to the Boosted fast track.
    ///
    /// Permissionless once the proposal has held its confidence for the
    /// pended interval. Pays the caller a compensation fee from the stake
    /// custody and returns it.
    pub fn boost_proposal(
        env: Env,
        caller: Address,
        proposal_id: u64,
    ) -> Result<i128, ContractError> {
        let config = Self::config(&env)?;
        caller.require_auth();

        let mut record =
            proposal::load(&env, proposal_id).ok_or(ContractError::ProposalDoesNotExist)?;
        let now = env.ledger().timestamp();
        let fee = lifecycle::boost(&env, &config, &mut record, now)?;
        proposal::store(&env, &record);

        if fee > 0 {
            tokens::pay_out(&env, &config.stake_token, &caller, fee);
        }

        Ok(fee)
    }

    /// Expire a queue-track proposal whose window elapsed. Pays the caller a
    /// compensation fee and returns it.
    pub fn expire_non_boosted(
        env: Env,
        caller: Address,
        proposal_id: u64,
    ) -> Result<i128, ContractError> {
        let config = Self::config(&env)?;
        caller.require_auth();

        let mut record =
            proposal::load(&env, proposal_id).ok_or(ContractError::ProposalDoesNotExist)?;
        let now = env.ledger().timestamp();
        let fee = lifecycle::expire_non_boosted(&env, &config, &mut record, now)?;
        proposal::store(&env, &record);

        if fee > 0 {
            tokens::pay_out(&env, &config.stake_token, &caller, fee);
        }

        Ok(fee)
    }

    /// Resolve a Boosted proposal whose decision window elapsed. Pays the
    /// caller a compensation fee and returns it.
    pub fn resolve_boosted(
        env: Env,
        caller: Address,
        proposal_id: u64,
    ) -> Result<i128, ContractError> {
        let config = Self::config(&env)?;
        caller.require_auth();

        let mut record =
            proposal::load(&env, proposal_id).ok_or(ContractError::ProposalDoesNotExist)?;
        let now = env.ledger().timestamp();
        let fee = lifecycle::resolve_boosted(&env, &config, &mut record, now)?;
        proposal::store(&env, &record);

        if fee > 0 {
            tokens::pay_out(&env, &config.stake_token, &caller, fee);
        }

        Ok(fee)
    }

    // ── View functions ────────────────────────────────────────────────────────

    pub fn get_proposal(env: Env, proposal_id: u64) -> Option<Proposal> {
        proposal::load(&env, proposal_id)
    }

    /// A voter's recorded choice, `Absent` if none.
    pub fn get_vote(env: Env, proposal_id: u64, voter: Address) -> Vote {
        voting::load_vote(&env, proposal_id, &voter)
            .map(|r| r.choice)
            .unwrap_or(Vote::Absent)
    }

    pub fn get_upstake(env: Env, proposal_id: u64, staker: Address) -> i128 {
        staking::upstake_of(&env, proposal_id, &staker)
    }

    pub fn get_downstake(env: Env, proposal_id: u64, staker: Address) -> i128 {
        staking::downstake_of(&env, proposal_id, &staker)
    }

    /// The proposal's confidence ratio in `PRECISION_MULTIPLIER` scale.
    pub fn get_confidence(env: Env, proposal_id: u64) -> Option<i128> {
        proposal::load(&env, proposal_id).map(|p| staking::confidence(&env, &p))
    }

    pub fn num_proposals(env: Env) -> u64 {
        proposal::count(&env)
    }

    pub fn get_config(env: Env) -> Result<Config, ContractError> {
        Self::config(&env)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&CONFIG)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn config(env: &Env) -> Result<Config, ContractError> {
        env.storage()
            .instance()
            .get(&CONFIG)
            .ok_or(ContractError::NotInitialized)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
