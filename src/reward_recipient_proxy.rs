use multiversx_sc::proxy_imports::*;

/// Intake hook of a dial created with `notify = true`.
pub struct RewardRecipientProxy;

impl<Env, From, To, Gas> TxProxyTrait<Env, From, To, Gas> for RewardRecipientProxy
where
    Env: TxEnv,
    From: TxFrom<Env>,
    To: TxTo<Env>,
    Gas: TxGas<Env>,
{
    type TxProxyMethods = RewardRecipientProxyMethods<Env, From, To, Gas>;

    fn proxy_methods(self, tx: Tx<Env, From, To, (), Gas, (), ()>) -> Self::TxProxyMethods {
        RewardRecipientProxyMethods { wrapped_tx: tx }
    }
}

pub struct RewardRecipientProxyMethods<Env, From, To, Gas>
where
    Env: TxEnv,
    From: TxFrom<Env>,
    To: TxTo<Env>,
    Gas: TxGas<Env>,
{
    wrapped_tx: Tx<Env, From, To, (), Gas, (), ()>,
}

impl<Env, From, To, Gas> RewardRecipientProxyMethods<Env, From, To, Gas>
where
    Env: TxEnv,
    Env::Api: VMApi,
    From: TxFrom<Env>,
    To: TxTo<Env>,
    Gas: TxGas<Env>,
{
    /// Payable: the reward tokens travel with the call.
    pub fn notify_reward_amount<Arg0: ProxyArg<BigUint<Env::Api>>>(
        self,
        amount: Arg0,
    ) -> TxTypedCall<Env, From, To, (), Gas, ()> {
        self.wrapped_tx
            .raw_call("notifyRewardAmount")
            .argument(&amount)
            .original_result()
    }
}
