use emissions_controller::allocation::{
    saturating_sub, split_rewards, top_line_emission, validate_preferences, weighted_votes,
};
use emissions_controller::types::{DialAllocation, EmissionSchedule, Preference};
use emissions_controller::{
    ERR_IMBALANCED_WEIGHTS, ERR_INVALID_DIAL, ERR_INVALID_INPUTS, ERR_TOO_MANY_PREFERENCES,
    ERR_WRONG_EPOCH, ERR_ZERO_WEIGHT,
};
use multiversx_sc::types::{BigUint, ManagedVec};
use multiversx_sc_scenario::api::StaticApi;

const START_EPOCH: u64 = 2_800;

fn big(value: u64) -> BigUint<StaticApi> {
    BigUint::from(value)
}

fn schedule() -> EmissionSchedule<StaticApi> {
    EmissionSchedule {
        slope: big(1_000),
        intercept: big(312_000),
        epochs: 312,
    }
}

fn preferences(entries: &[(u64, u8)]) -> ManagedVec<StaticApi, Preference> {
    let mut result = ManagedVec::new();
    for (dial_id, weight) in entries {
        result.push(Preference {
            dial_id: *dial_id,
            weight: *weight,
        });
    }
    result
}

fn dial(cap: u8, disabled: bool, votes: u64) -> DialAllocation<StaticApi> {
    DialAllocation {
        cap,
        disabled,
        votes: big(votes),
    }
}

fn awards_of(pool: u64, dials: &[DialAllocation<StaticApi>]) -> Vec<u64> {
    let mut rows = ManagedVec::new();
    for row in dials {
        rows.push(row.clone());
    }
    split_rewards(&big(pool), &rows)
        .iter()
        .map(|award| award.to_u64().unwrap())
        .collect()
}

// ============================================================
// Emission curve
// ============================================================

#[test]
fn emission_decays_linearly_to_zero_at_horizon() {
    let schedule = schedule();

    assert_eq!(
        top_line_emission(&schedule, START_EPOCH, START_EPOCH + 1).unwrap(),
        big(311_000)
    );
    assert_eq!(
        top_line_emission(&schedule, START_EPOCH, START_EPOCH + 2).unwrap(),
        big(310_000)
    );
    assert_eq!(
        top_line_emission(&schedule, START_EPOCH, START_EPOCH + 312).unwrap(),
        big(0)
    );
}

#[test]
fn emission_outside_horizon_is_rejected() {
    let schedule = schedule();

    for epoch in [START_EPOCH - 1, START_EPOCH, START_EPOCH + 313] {
        assert_eq!(
            top_line_emission(&schedule, START_EPOCH, epoch).unwrap_err(),
            ERR_WRONG_EPOCH
        );
    }
}

// ============================================================
// Preference validation
// ============================================================

#[test]
fn sixteen_preferences_summing_to_full_weight_are_accepted() {
    // 8 * 13 + 8 * 12 = 200
    let entries: Vec<(u64, u8)> = (0..16u64)
        .map(|dial_id| (dial_id, if dial_id < 8 { 13 } else { 12 }))
        .collect();

    assert_eq!(validate_preferences(&preferences(&entries), 20), Ok(()));
}

#[test]
fn seventeenth_preference_is_rejected() {
    let entries: Vec<(u64, u8)> = (0..17u64).map(|dial_id| (dial_id, 10)).collect();

    assert_eq!(
        validate_preferences(&preferences(&entries), 20),
        Err(ERR_TOO_MANY_PREFERENCES)
    );
}

#[test]
fn malformed_preferences_are_rejected() {
    assert_eq!(
        validate_preferences(&preferences(&[]), 3),
        Err(ERR_INVALID_INPUTS)
    );
    assert_eq!(
        validate_preferences(&preferences(&[(0, 100), (1, 0)]), 3),
        Err(ERR_ZERO_WEIGHT)
    );
    assert_eq!(
        validate_preferences(&preferences(&[(0, 150), (1, 51)]), 3),
        Err(ERR_IMBALANCED_WEIGHTS)
    );
    assert_eq!(
        validate_preferences(&preferences(&[(3, 200)]), 3),
        Err(ERR_INVALID_DIAL)
    );
    assert_eq!(
        validate_preferences(&preferences(&[(1, 50), (1, 50)]), 3),
        Err(ERR_INVALID_DIAL)
    );
}

#[test]
fn partial_weight_is_allowed() {
    assert_eq!(
        validate_preferences(&preferences(&[(0, 40), (2, 60)]), 3),
        Ok(())
    );
}

// ============================================================
// Vote arithmetic
// ============================================================

#[test]
fn weighted_votes_truncate() {
    assert_eq!(weighted_votes(&big(300), 200), big(300));
    assert_eq!(weighted_votes(&big(300), 100), big(150));
    assert_eq!(weighted_votes(&big(7), 1), big(0));
    assert_eq!(weighted_votes(&big(999), 40), big(199));
}

#[test]
fn saturating_sub_floors_at_zero() {
    assert_eq!(saturating_sub(&big(10), &big(3)), big(7));
    assert_eq!(saturating_sub(&big(3), &big(10)), big(0));
    assert_eq!(saturating_sub(&big(3), &big(3)), big(0));
}

// ============================================================
// Reward split
// ============================================================

#[test]
fn weighted_pool_is_shared_pro_rata_to_votes() {
    let awards = awards_of(
        311_000,
        &[dial(0, false, 300), dial(0, false, 600), dial(0, false, 0)],
    );

    assert_eq!(awards, vec![103_666, 207_333, 0]);
}

#[test]
fn fixed_dials_take_their_cap_before_weighting() {
    // Votes on a capped dial do not matter
    let awards = awards_of(
        1_000,
        &[dial(10, false, 999), dial(0, false, 300), dial(0, false, 600)],
    );

    assert_eq!(awards, vec![100, 300, 600]);
    assert_eq!(awards.iter().sum::<u64>(), 1_000);
}

#[test]
fn disabled_dials_get_nothing_and_leave_the_denominator() {
    let awards = awards_of(
        500,
        &[dial(0, true, 100), dial(0, false, 200), dial(0, false, 300)],
    );
    assert_eq!(awards, vec![0, 200, 300]);

    // A disabled fixed dial frees its share for the weighted dials
    let awards = awards_of(1_000, &[dial(20, true, 0), dial(0, false, 50)]);
    assert_eq!(awards, vec![0, 1_000]);
}

#[test]
fn no_votes_means_no_weighted_awards() {
    let awards = awards_of(
        1_000,
        &[dial(25, false, 0), dial(0, false, 0), dial(0, false, 0)],
    );

    assert_eq!(awards, vec![250, 0, 0]);
}

#[test]
fn fixed_caps_past_the_pool_are_paid_in_full() {
    let awards = awards_of(
        1_000,
        &[dial(60, false, 0), dial(41, false, 0), dial(0, false, 500)],
    );

    assert_eq!(awards, vec![600, 410, 0]);
}
