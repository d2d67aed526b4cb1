#![no_std]

multiversx_sc::imports!();

/// Test double for a staking contract: a settable voting power source that
/// can also be registered as a notifying dial.
#[multiversx_sc::contract]
pub trait MockStaking {
    #[init]
    fn init(&self) {}

    #[endpoint(setVotingPower)]
    fn set_voting_power(&self, account: ManagedAddress, amount: BigUint) {
        self.voting_power(&account).set(&amount);
    }

    #[view(votingPowerOf)]
    fn voting_power_of(&self, account: ManagedAddress) -> BigUint {
        self.voting_power(&account).get()
    }

    #[endpoint(notifyRewardAmount)]
    #[payable("*")]
    fn notify_reward_amount(&self, amount: BigUint) {
        let payment = self.call_value().single_esdt();
        require!(payment.amount == amount, "Amount mismatch");

        self.notified_rewards().update(|total| *total += &amount);
    }

    #[storage_mapper("votingPower")]
    fn voting_power(&self, account: &ManagedAddress) -> SingleValueMapper<BigUint>;

    #[storage_mapper("notifiedRewards")]
    fn notified_rewards(&self) -> SingleValueMapper<BigUint>;
}
