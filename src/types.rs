multiversx_sc::imports!();
multiversx_sc::derive_imports!();

// ============================================================
// Dial: a registered reward recipient
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct Dial<M: ManagedTypeApi> {
    /// Receives disbursed rewards.
    pub recipient: ManagedAddress<M>,
    /// Invoke the recipient's `notifyRewardAmount` hook on disbursement.
    pub notify: bool,
    /// Fixed share of every epoch pool in percent (0 = weighted by votes).
    pub cap: u8,
    /// Excluded from awards and vote history snapshots while set.
    pub disabled: bool,
    /// Rewards credited but not yet disbursed.
    pub balance: BigUint<M>,
}

// ============================================================
// Vote history snapshot
// ============================================================

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct HistoricVotes<M: ManagedTypeApi> {
    pub votes: BigUint<M>,
    pub epoch: u64,
}

// ============================================================
// Voter preferences: fixed-capacity slot array
// ============================================================

#[type_abi]
#[derive(
    TopEncode,
    TopDecode,
    NestedEncode,
    NestedDecode,
    ManagedVecItem,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Debug,
)]
pub struct Preference {
    pub dial_id: u64,
    /// Out of `WEIGHT_SCALE` (200 = 100%).
    pub weight: u8,
}

impl Preference {
    /// Unused slot marker; never a valid dial id.
    pub const EMPTY_DIAL_ID: u64 = u64::MAX;

    pub const EMPTY: Preference = Preference {
        dial_id: Self::EMPTY_DIAL_ID,
        weight: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.dial_id == Self::EMPTY_DIAL_ID
    }
}

#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct VoterPreferences<M: ManagedTypeApi> {
    /// Voting power last attributed across `preferences`.
    pub votes_cast: BigUint<M>,
    /// Timestamp of the last fresh read of all sources (0 = never).
    pub last_source_poke: u64,
    pub preferences: [Preference; crate::MAX_PREFERENCES],
}

impl<M: ManagedTypeApi> VoterPreferences<M> {
    pub fn new() -> Self {
        VoterPreferences {
            votes_cast: BigUint::zero(),
            last_source_poke: 0,
            preferences: [Preference::EMPTY; crate::MAX_PREFERENCES],
        }
    }

    pub fn has_preferences(&self) -> bool {
        !self.preferences[0].is_empty()
    }

    /// Set slots, in order, stopping at the first sentinel.
    pub fn active(&self) -> impl Iterator<Item = &Preference> {
        self.preferences.iter().take_while(|p| !p.is_empty())
    }
}

// ============================================================
// Emission schedule
// ============================================================

/// `P(delta) = intercept - slope * delta` for `1 <= delta <= epochs`.
#[type_abi]
#[derive(TopEncode, TopDecode, NestedEncode, NestedDecode, Clone, PartialEq, Debug)]
pub struct EmissionSchedule<M: ManagedTypeApi> {
    pub slope: BigUint<M>,
    pub intercept: BigUint<M>,
    pub epochs: u64,
}

// ============================================================
// Allocation input, one row per dial
// ============================================================

#[derive(ManagedVecItem, Clone, PartialEq, Debug)]
pub struct DialAllocation<M: ManagedTypeApi> {
    pub cap: u8,
    pub disabled: bool,
    pub votes: BigUint<M>,
}

impl<M: ManagedTypeApi> DialAllocation<M> {
    /// Takes `cap` percent of the pool regardless of votes.
    pub fn is_fixed(&self) -> bool {
        self.cap > 0
    }
}
