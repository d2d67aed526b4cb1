//! Reward arithmetic shared by the contract endpoints.
//!
//! All amounts (voting power, dial votes, rewards) use the reward token's
//! fixed-point scale. Fractions truncate.

multiversx_sc::imports!();

use crate::types::{DialAllocation, EmissionSchedule, Preference};
use crate::{
    ERR_IMBALANCED_WEIGHTS, ERR_INVALID_DIAL, ERR_INVALID_INPUTS, ERR_TOO_MANY_PREFERENCES, ERR_WRONG_EPOCH,
    ERR_ZERO_WEIGHT, MAX_CAP, MAX_PREFERENCES, WEIGHT_SCALE,
};

/// Pool emitted for `epoch`, counted from `start_epoch`.
pub fn top_line_emission<M: ManagedTypeApi>(
    schedule: &EmissionSchedule<M>,
    start_epoch: u64,
    epoch: u64,
) -> Result<BigUint<M>, &'static str> {
    if epoch <= start_epoch {
        return Err(ERR_WRONG_EPOCH);
    }
    let delta = epoch - start_epoch;
    if delta > schedule.epochs {
        return Err(ERR_WRONG_EPOCH);
    }

    let decay = &schedule.slope * delta;
    if decay > schedule.intercept {
        return Ok(BigUint::zero());
    }
    Ok(&schedule.intercept - &decay)
}

/// `amount * weight / 200`, truncating.
pub fn weighted_votes<M: ManagedTypeApi>(amount: &BigUint<M>, weight: u8) -> BigUint<M> {
    (amount * weight as u64) / WEIGHT_SCALE
}

/// Checks a proposed preference list before anything is written.
///
/// `dial_count` bounds valid ids. A dial may appear at most once.
pub fn validate_preferences<M: ManagedTypeApi>(
    preferences: &ManagedVec<M, Preference>,
    dial_count: u64,
) -> Result<(), &'static str> {
    let len = preferences.len();
    if len == 0 {
        return Err(ERR_INVALID_INPUTS);
    }
    if len > MAX_PREFERENCES {
        return Err(ERR_TOO_MANY_PREFERENCES);
    }

    let mut total_weight: u64 = 0;
    for (i, pref) in preferences.iter().enumerate() {
        if pref.dial_id >= dial_count {
            return Err(ERR_INVALID_DIAL);
        }
        if (0..i).any(|j| preferences.get(j).dial_id == pref.dial_id) {
            return Err(ERR_INVALID_DIAL);
        }
        if pref.weight == 0 {
            return Err(ERR_ZERO_WEIGHT);
        }
        total_weight += pref.weight as u64;
    }

    if total_weight > WEIGHT_SCALE {
        return Err(ERR_IMBALANCED_WEIGHTS);
    }
    Ok(())
}

/// Fixed share of `pool` for a dial with `cap` percent.
pub fn fixed_award<M: ManagedTypeApi>(pool: &BigUint<M>, cap: u8) -> BigUint<M> {
    (pool * cap as u64) / MAX_CAP
}

/// Splits `pool` across `dials`, returning one award per dial in the same order.
///
/// Enabled dials with a cap take `pool * cap / 100`. What remains, floored at
/// zero, is shared by the enabled uncapped dials pro rata to their votes. Disabled dials get zero
/// and their votes are left out of the denominator.
pub fn split_rewards<M: ManagedTypeApi>(
    pool: &BigUint<M>,
    dials: &ManagedVec<M, DialAllocation<M>>,
) -> ManagedVec<M, BigUint<M>> {
    let mut fixed_total = BigUint::zero();
    let mut total_weighted_votes = BigUint::zero();
    for dial in dials.iter() {
        if dial.disabled {
            continue;
        }
        if dial.is_fixed() {
            fixed_total += fixed_award(pool, dial.cap);
        } else {
            total_weighted_votes += &dial.votes;
        }
    }

    let weighted_pool = if fixed_total >= *pool {
        BigUint::zero()
    } else {
        pool - &fixed_total
    };

    let mut awards = ManagedVec::new();
    for dial in dials.iter() {
        let award = if dial.disabled {
            BigUint::zero()
        } else if dial.is_fixed() {
            fixed_award(pool, dial.cap)
        } else if total_weighted_votes > 0u64 {
            (&weighted_pool * &dial.votes) / &total_weighted_votes
        } else {
            BigUint::zero()
        };
        awards.push(award);
    }
    awards
}

/// `a - b`, or zero when `b > a`.
pub fn saturating_sub<M: ManagedTypeApi>(a: &BigUint<M>, b: &BigUint<M>) -> BigUint<M> {
    if b >= a {
        BigUint::zero()
    } else {
        a - b
    }
}
