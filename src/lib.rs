#![no_std]

multiversx_sc::imports!();

pub mod allocation;
pub mod reward_recipient_proxy;
pub mod types;
pub mod voting_power_source_proxy;

use types::{Dial, DialAllocation, EmissionSchedule, HistoricVotes, Preference, VoterPreferences};

// ============================================================
// Constants
// ============================================================

/// Slots in a voter's preference array
pub const MAX_PREFERENCES: usize = 16;

/// Weight denominator: 200 = 100% of a voter's power
pub const WEIGHT_SCALE: u64 = 200;

/// Fixed-allocation caps are percentages of the epoch pool
pub const MAX_CAP: u64 = 100;

/// Distribution period: one week in seconds
pub const ONE_WEEK: u64 = 604_800;

// ============================================================
// Error messages
// ============================================================

pub const ERR_UNAUTHORIZED: &str = "Unauthorized";
pub const ERR_INVALID_DIAL: &str = "Invalid dial";
pub const ERR_INVALID_INPUTS: &str = "Invalid inputs";
pub const ERR_IMBALANCED_WEIGHTS: &str = "Imbalanced weights";
pub const ERR_ZERO_WEIGHT: &str = "Zero weight";
pub const ERR_TOO_MANY_PREFERENCES: &str = "Too many preferences";
pub const ERR_WRONG_EPOCH: &str = "Wrong epoch number";
pub const ERR_MUST_WAIT_FOR_NEW_PERIOD: &str = "Must wait for new period";
pub const ERR_UNAUTHORIZED_SOURCE: &str = "Unauthorized source";
pub const ERR_INVALID_SOURCE: &str = "Invalid staking contract";
pub const ERR_INVALID_PAYMENT: &str = "Invalid payment";

// ============================================================
// Contract
// ============================================================

#[multiversx_sc::contract]
pub trait EmissionsController {
    // ========================================================
    // Init / Upgrade
    // ========================================================

    #[init]
    fn init(
        &self,
        reward_token: TokenIdentifier,
        governor: ManagedAddress,
        emission_slope: BigUint,
        emission_intercept: BigUint,
        emission_epochs: u64,
    ) {
        require!(reward_token.is_valid_esdt_identifier(), ERR_INVALID_INPUTS);
        require!(!governor.is_zero(), ERR_INVALID_INPUTS);
        require!(emission_epochs > 0, ERR_INVALID_INPUTS);
        // The curve must not cross zero inside the horizon
        require!(
            emission_intercept >= &emission_slope * emission_epochs,
            ERR_INVALID_INPUTS
        );

        self.reward_token().set(&reward_token);
        self.governor().set(&governor);
        self.emission_schedule().set(EmissionSchedule {
            slope: emission_slope,
            intercept: emission_intercept,
            epochs: emission_epochs,
        });

        let epoch = self.blockchain().get_block_timestamp() / ONE_WEEK;
        self.start_epoch().set(epoch);
        self.last_epoch().set(epoch);
        self.dial_count().set(0u64);
        self.remaining_rewards().set(BigUint::zero());
    }

    #[upgrade]
    fn upgrade(&self) {}

    // ========================================================
    // ENDPOINT: addDial
    // Governor registers a new recipient. Ids are never reused.
    // ========================================================

    #[endpoint(addDial)]
    fn add_dial(&self, recipient: ManagedAddress, cap: u8, notify: bool) -> u64 {
        self.require_governor();
        require!(!recipient.is_zero(), ERR_INVALID_DIAL);
        require!(
            !self.dial_recipients().contains(&recipient),
            ERR_INVALID_DIAL
        );
        require!((cap as u64) <= MAX_CAP, ERR_INVALID_DIAL);

        let dial_id = self.dial_count().get();
        let dial = Dial {
            recipient: recipient.clone(),
            notify,
            cap,
            disabled: false,
            balance: BigUint::zero(),
        };
        self.dials(dial_id).set(&dial);
        self.dial_count().set(dial_id + 1);
        self.dial_recipients().insert(recipient.clone());

        // Before the first distribution closes, the upcoming epoch is the
        // first one this dial can be snapshotted in.
        let start_epoch = self.start_epoch().get();
        let last_epoch = self.last_epoch().get();
        let seed_epoch = if last_epoch == start_epoch {
            start_epoch + 1
        } else {
            last_epoch
        };
        self.dial_vote_history(dial_id).push(&HistoricVotes {
            votes: BigUint::zero(),
            epoch: seed_epoch,
        });

        self.added_dial_event(dial_id, &recipient, cap);

        dial_id
    }

    // ========================================================
    // ENDPOINT: updateDial
    // Flags only. Balance, votes and history are untouched.
    // ========================================================

    #[endpoint(updateDial)]
    fn update_dial(&self, dial_id: u64, disabled: bool, notify: bool) {
        self.require_governor();
        self.require_valid_dial(dial_id);

        let mut dial = self.dials(dial_id).get();
        dial.disabled = disabled;
        dial.notify = notify;
        self.dials(dial_id).set(&dial);

        self.updated_dial_event(dial_id, disabled, notify);
    }

    // ========================================================
    // ENDPOINT: addStakingContract
    // Registers a voting power source.
    // ========================================================

    #[endpoint(addStakingContract)]
    fn add_staking_contract(&self, source: ManagedAddress) {
        self.require_governor();
        require!(!source.is_zero(), ERR_INVALID_SOURCE);
        require!(
            self.blockchain().is_smart_contract(&source),
            ERR_INVALID_SOURCE
        );
        require!(
            self.staking_contracts().insert(source.clone()),
            ERR_INVALID_SOURCE
        );

        let now = self.blockchain().get_block_timestamp();
        self.staking_contract_added_time(&source).set(now);

        self.added_staking_contract_event(&source, now);
    }

    // ========================================================
    // ENDPOINT: addRewards
    // Governor tops up the emission reserve.
    // ========================================================

    #[endpoint(addRewards)]
    #[payable("*")]
    fn add_rewards(&self) {
        self.require_governor();

        let payment = self.call_value().single_esdt();
        require!(
            payment.token_identifier == self.reward_token().get(),
            ERR_INVALID_PAYMENT
        );
        require!(payment.amount > 0u64, ERR_INVALID_PAYMENT);

        self.remaining_rewards()
            .update(|remaining| *remaining += &payment.amount);

        self.added_rewards_event(&payment.amount);
    }

    // ========================================================
    // ENDPOINT: setVoterDialWeights
    // Replaces the caller's preferences, moving its voting power
    // from the old dials to the new ones.
    // ========================================================

    #[endpoint(setVoterDialWeights)]
    fn set_voter_dial_weights(&self, preferences: ManagedVec<Preference>) {
        let voter = self.blockchain().get_caller();
        if let Err(err) =
            allocation::validate_preferences(&preferences, self.dial_count().get())
        {
            sc_panic!(err);
        }

        let votes_now = self.get_votes(voter.clone());
        let mut voter_prefs = self.load_voter_preferences(&voter);

        // ── Reverse the previous contribution ──
        for pref in voter_prefs.active() {
            let old_votes = allocation::weighted_votes(&voter_prefs.votes_cast, pref.weight);
            self.remove_dial_votes(pref.dial_id, &old_votes);
        }

        // ── Apply the new one at current voting power ──
        voter_prefs.preferences = [Preference::EMPTY; MAX_PREFERENCES];
        for (i, pref) in preferences.iter().enumerate() {
            voter_prefs.preferences[i] = Preference {
                dial_id: pref.dial_id,
                weight: pref.weight,
            };
            let new_votes = allocation::weighted_votes(&votes_now, pref.weight);
            self.add_dial_votes(pref.dial_id, &new_votes);
        }

        voter_prefs.votes_cast = votes_now;
        voter_prefs.last_source_poke = self.blockchain().get_block_timestamp();
        self.voter_preferences(&voter).set(&voter_prefs);

        self.preferences_changed_event(&voter, &preferences);
    }

    // ========================================================
    // ENDPOINT: pokeSources
    // Anyone can reconcile a voter's cached power with the
    // live sum across sources. No-op when nothing changed.
    // ========================================================

    #[endpoint(pokeSources)]
    fn poke_sources(&self, voter: ManagedAddress) {
        let mut voter_prefs = self.load_voter_preferences(&voter);
        if !voter_prefs.has_preferences() {
            return;
        }

        let votes_now = self.get_votes(voter.clone());
        if votes_now == voter_prefs.votes_cast {
            return;
        }

        if votes_now > voter_prefs.votes_cast {
            let delta = &votes_now - &voter_prefs.votes_cast;
            for pref in voter_prefs.active() {
                self.add_dial_votes(pref.dial_id, &allocation::weighted_votes(&delta, pref.weight));
            }
        } else {
            let delta = &voter_prefs.votes_cast - &votes_now;
            for pref in voter_prefs.active() {
                self.remove_dial_votes(
                    pref.dial_id,
                    &allocation::weighted_votes(&delta, pref.weight),
                );
            }
        }

        voter_prefs.votes_cast = votes_now.clone();
        voter_prefs.last_source_poke = self.blockchain().get_block_timestamp();
        self.voter_preferences(&voter).set(&voter_prefs);

        self.sources_poked_event(&voter, &votes_now);
    }

    // ========================================================
    // ENDPOINT: onVotingPowerMoved
    // Hook called synchronously by a registered source whenever
    // it moves voting power. Zero address = mint / burn side.
    // ========================================================

    #[endpoint(onVotingPowerMoved)]
    fn on_voting_power_moved(&self, from: ManagedAddress, to: ManagedAddress, amount: BigUint) {
        let source = self.blockchain().get_caller();
        require!(
            self.staking_contracts().contains(&source),
            ERR_UNAUTHORIZED_SOURCE
        );

        let source_added_time = self.staking_contract_added_time(&source).get();
        if !from.is_zero() {
            self.shift_voter_votes(&from, &amount, false, source_added_time);
        }
        if !to.is_zero() {
            self.shift_voter_votes(&to, &amount, true, source_added_time);
        }

        self.votes_cast_event(&source, &from, &to, &amount);
    }

    // ========================================================
    // ENDPOINT: calculateRewards
    // Closes the next epoch. At most one per elapsed week.
    // ========================================================

    #[endpoint(calculateRewards)]
    fn calculate_rewards(&self) {
        let now = self.blockchain().get_block_timestamp();
        let last_epoch = self.last_epoch().get();
        require!(
            now >= (last_epoch + 1) * ONE_WEEK,
            ERR_MUST_WAIT_FOR_NEW_PERIOD
        );

        let epoch = last_epoch + 1;
        let pool = self.top_line_emission(epoch);

        let dial_count = self.dial_count().get();
        let mut allocations = ManagedVec::new();
        for dial_id in 0..dial_count {
            let dial = self.dials(dial_id).get();
            allocations.push(DialAllocation {
                cap: dial.cap,
                disabled: dial.disabled,
                votes: self.dial_votes(dial_id).get(),
            });
        }

        let awards = allocation::split_rewards(&pool, &allocations);

        for dial_id in 0..dial_count {
            let row = allocations.get(dial_id as usize);
            if row.disabled {
                continue;
            }

            let award = awards.get(dial_id as usize);
            if *award > 0u64 {
                self.dials(dial_id)
                    .update(|dial| dial.balance += &*award);
            }

            self.dial_vote_history(dial_id).push(&HistoricVotes {
                votes: row.votes.clone(),
                epoch,
            });
        }

        self.last_epoch().set(epoch);
        self.remaining_rewards()
            .update(|remaining| *remaining = allocation::saturating_sub(remaining, &pool));

        self.period_rewards_event(epoch, &awards);
    }

    // ========================================================
    // ENDPOINT: donate
    // Credits dial balances directly, outside the epoch cycle.
    // ========================================================

    #[endpoint(donate)]
    #[payable("*")]
    fn donate(&self, dial_ids: ManagedVec<u64>, amounts: ManagedVec<BigUint>) {
        require!(
            !dial_ids.is_empty() && dial_ids.len() == amounts.len(),
            ERR_INVALID_INPUTS
        );

        let payment = self.call_value().single_esdt();
        require!(
            payment.token_identifier == self.reward_token().get(),
            ERR_INVALID_PAYMENT
        );

        let dial_count = self.dial_count().get();
        let mut total = BigUint::zero();
        for (i, dial_id) in dial_ids.iter().enumerate() {
            require!(dial_id < dial_count, ERR_INVALID_DIAL);

            let amount = amounts.get(i);
            total += &*amount;
            self.dials(dial_id)
                .update(|dial| dial.balance += &*amount);

            self.donated_rewards_event(dial_id, &amount);
        }

        require!(payment.amount == total, ERR_INVALID_PAYMENT);
    }

    // ========================================================
    // ENDPOINT: distributeRewards
    // Pushes accumulated balances out. Order and duplicates do
    // not matter; empty balances are skipped.
    // ========================================================

    #[endpoint(distributeRewards)]
    fn distribute_rewards(&self, dial_ids: MultiValueEncoded<u64>) {
        let dial_count = self.dial_count().get();
        let reward_token = self.reward_token().get();

        for dial_id in dial_ids {
            require!(dial_id < dial_count, ERR_INVALID_DIAL);

            let mut dial = self.dials(dial_id).get();
            if dial.balance == 0u64 {
                continue;
            }

            let amount = core::mem::replace(&mut dial.balance, BigUint::zero());
            self.dials(dial_id).set(&dial);

            if dial.notify {
                self.tx()
                    .to(&dial.recipient)
                    .typed(reward_recipient_proxy::RewardRecipientProxy)
                    .notify_reward_amount(amount.clone())
                    .single_esdt(&reward_token, 0, &amount)
                    .sync_call();
            } else {
                self.send()
                    .direct_esdt(&dial.recipient, &reward_token, 0, &amount);
            }

            self.distributed_reward_event(dial_id, &amount);
        }
    }

    // ========================================================
    // INTERNAL: access control
    // ========================================================

    fn require_governor(&self) {
        let caller = self.blockchain().get_caller();
        require!(caller == self.governor().get(), ERR_UNAUTHORIZED);
    }

    fn require_valid_dial(&self, dial_id: u64) {
        require!(dial_id < self.dial_count().get(), ERR_INVALID_DIAL);
    }

    // ========================================================
    // INTERNAL: vote aggregation
    // Dial totals are only ever adjusted by deltas; voters are
    // never enumerated.
    // ========================================================

    fn load_voter_preferences(&self, voter: &ManagedAddress) -> VoterPreferences<Self::Api> {
        if self.voter_preferences(voter).is_empty() {
            VoterPreferences::new()
        } else {
            self.voter_preferences(voter).get()
        }
    }

    fn add_dial_votes(&self, dial_id: u64, amount: &BigUint) {
        if *amount == 0u64 {
            return;
        }
        self.dial_votes(dial_id).update(|votes| *votes += amount);
    }

    /// Truncation can leave a dial a few units short of what is removed;
    /// the total floors at zero.
    fn remove_dial_votes(&self, dial_id: u64, amount: &BigUint) {
        if *amount == 0u64 {
            return;
        }
        self.dial_votes(dial_id)
            .update(|votes| *votes = allocation::saturating_sub(votes, amount));
    }

    /// Applies a source-reported power change to one side of a move.
    ///
    /// Skipped when the account has no preferences, or when its cached
    /// `votes_cast` predates the source (a poke will pick it up instead).
    fn shift_voter_votes(
        &self,
        account: &ManagedAddress,
        amount: &BigUint,
        increase: bool,
        source_added_time: u64,
    ) {
        let mut voter_prefs = self.load_voter_preferences(account);
        if !voter_prefs.has_preferences() || voter_prefs.last_source_poke < source_added_time {
            return;
        }

        for pref in voter_prefs.active() {
            let share = allocation::weighted_votes(amount, pref.weight);
            if increase {
                self.add_dial_votes(pref.dial_id, &share);
            } else {
                self.remove_dial_votes(pref.dial_id, &share);
            }
        }

        voter_prefs.votes_cast = if increase {
            &voter_prefs.votes_cast + amount
        } else {
            allocation::saturating_sub(&voter_prefs.votes_cast, amount)
        };
        self.voter_preferences(account).set(&voter_prefs);
    }

    // ========================================================
    // VIEWS
    // ========================================================

    /// Live voting power summed across every registered source.
    #[view(getVotes)]
    fn get_votes(&self, voter: ManagedAddress) -> BigUint {
        let mut total = BigUint::zero();
        for source in self.staking_contracts().iter() {
            let power: BigUint = self
                .tx()
                .to(&source)
                .typed(voting_power_source_proxy::VotingPowerSourceProxy)
                .voting_power_of(voter.clone())
                .returns(ReturnsResult)
                .sync_call();
            total += power;
        }
        total
    }

    #[view(topLineEmission)]
    fn top_line_emission(&self, epoch: u64) -> BigUint {
        allocation::top_line_emission(
            &self.emission_schedule().get(),
            self.start_epoch().get(),
            epoch,
        )
        .unwrap_or_else(|err| sc_panic!(err))
    }

    #[view(epochs)]
    fn epochs(&self) -> MultiValue2<u64, u64> {
        (self.start_epoch().get(), self.last_epoch().get()).into()
    }

    #[view(getDial)]
    fn get_dial(&self, dial_id: u64) -> Dial<Self::Api> {
        self.require_valid_dial(dial_id);
        self.dials(dial_id).get()
    }

    #[view(getDialCount)]
    fn get_dial_count(&self) -> u64 {
        self.dial_count().get()
    }

    /// Current vote total of every dial, by id.
    #[view(getDialVotes)]
    fn get_dial_votes(&self) -> MultiValueEncoded<BigUint> {
        let mut result = MultiValueEncoded::new();
        for dial_id in 0..self.dial_count().get() {
            result.push(self.dial_votes(dial_id).get());
        }
        result
    }

    #[view(getDialVoteHistory)]
    fn get_dial_vote_history(&self, dial_id: u64) -> MultiValueEncoded<HistoricVotes<Self::Api>> {
        self.require_valid_dial(dial_id);

        let mut result = MultiValueEncoded::new();
        for snapshot in self.dial_vote_history(dial_id).iter() {
            result.push(snapshot);
        }
        result
    }

    #[view(getVoterPreferences)]
    fn get_voter_preferences(&self, voter: ManagedAddress) -> MultiValueEncoded<Preference> {
        let mut result = MultiValueEncoded::new();
        for pref in self.load_voter_preferences(&voter).active() {
            result.push(*pref);
        }
        result
    }

    #[view(getStakingContracts)]
    fn get_staking_contracts(&self) -> MultiValueEncoded<ManagedAddress> {
        let mut result = MultiValueEncoded::new();
        for source in self.staking_contracts().iter() {
            result.push(source);
        }
        result
    }

    #[view(getRemainingRewards)]
    fn get_remaining_rewards(&self) -> BigUint {
        self.remaining_rewards().get()
    }

    // ========================================================
    // EVENTS
    // ========================================================

    #[event("addedDial")]
    fn added_dial_event(
        &self,
        #[indexed] dial_id: u64,
        #[indexed] recipient: &ManagedAddress,
        cap: u8,
    );

    #[event("updatedDial")]
    fn updated_dial_event(&self, #[indexed] dial_id: u64, #[indexed] disabled: bool, notify: bool);

    #[event("addedStakingContract")]
    fn added_staking_contract_event(&self, #[indexed] source: &ManagedAddress, added_time: u64);

    #[event("addedRewards")]
    fn added_rewards_event(&self, amount: &BigUint);

    #[event("preferencesChanged")]
    fn preferences_changed_event(
        &self,
        #[indexed] voter: &ManagedAddress,
        preferences: &ManagedVec<Preference>,
    );

    #[event("sourcesPoked")]
    fn sources_poked_event(&self, #[indexed] voter: &ManagedAddress, votes_cast: &BigUint);

    #[event("votesCast")]
    fn votes_cast_event(
        &self,
        #[indexed] source: &ManagedAddress,
        #[indexed] from: &ManagedAddress,
        #[indexed] to: &ManagedAddress,
        amount: &BigUint,
    );

    #[event("periodRewards")]
    fn period_rewards_event(&self, #[indexed] epoch: u64, rewards: &ManagedVec<BigUint>);

    #[event("donatedRewards")]
    fn donated_rewards_event(&self, #[indexed] dial_id: u64, amount: &BigUint);

    #[event("distributedReward")]
    fn distributed_reward_event(&self, #[indexed] dial_id: u64, amount: &BigUint);

    // ========================================================
    // STORAGE
    // ========================================================

    // ── Configuration ──

    #[storage_mapper("governor")]
    fn governor(&self) -> SingleValueMapper<ManagedAddress>;

    #[storage_mapper("rewardToken")]
    fn reward_token(&self) -> SingleValueMapper<TokenIdentifier>;

    #[storage_mapper("emissionSchedule")]
    fn emission_schedule(&self) -> SingleValueMapper<EmissionSchedule<Self::Api>>;

    // ── Epochs ──

    #[storage_mapper("startEpoch")]
    fn start_epoch(&self) -> SingleValueMapper<u64>;

    #[storage_mapper("lastEpoch")]
    fn last_epoch(&self) -> SingleValueMapper<u64>;

    #[storage_mapper("remainingRewards")]
    fn remaining_rewards(&self) -> SingleValueMapper<BigUint>;

    // ── Dials ──

    #[storage_mapper("dialCount")]
    fn dial_count(&self) -> SingleValueMapper<u64>;

    #[storage_mapper("dials")]
    fn dials(&self, dial_id: u64) -> SingleValueMapper<Dial<Self::Api>>;

    #[storage_mapper("dialRecipients")]
    fn dial_recipients(&self) -> UnorderedSetMapper<ManagedAddress>;

    #[storage_mapper("dialVotes")]
    fn dial_votes(&self, dial_id: u64) -> SingleValueMapper<BigUint>;

    #[storage_mapper("dialVoteHistory")]
    fn dial_vote_history(&self, dial_id: u64) -> VecMapper<HistoricVotes<Self::Api>>;

    // ── Voters ──

    #[storage_mapper("voterPreferences")]
    fn voter_preferences(
        &self,
        voter: &ManagedAddress,
    ) -> SingleValueMapper<VoterPreferences<Self::Api>>;

    // ── Voting power sources ──

    #[storage_mapper("stakingContracts")]
    fn staking_contracts(&self) -> UnorderedSetMapper<ManagedAddress>;

    #[storage_mapper("stakingContractAddedTime")]
    fn staking_contract_added_time(&self, source: &ManagedAddress) -> SingleValueMapper<u64>;
}
