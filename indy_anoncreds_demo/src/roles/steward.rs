use std::sync::Arc;

use indy_ledger::{
    ledger::sign_and_submit_request, pool::LocalPool, requests::build_nym_request,
    wallet::WalletRegistry,
};

use crate::actor::{Actor, ActorProfile};

/// The genesis steward, who onboards everyone else as a verinym.
pub struct Steward {
    pub actor: Actor,
}

impl Steward {
    pub async fn bootstrap(
        wallets: &WalletRegistry,
        pool: Arc<LocalPool>,
        seed: &str,
    ) -> anyhow::Result<Self> {
        let profile = ActorProfile::new("Sovrin Steward", "sovrin_steward_wallet", None);
        let actor = Actor::create(&profile, wallets, pool, Some(seed)).await?;
        Ok(Self { actor })
    }

    /// Create the target's wallet and DID, then register the DID on the ledger with the
    /// profile's role.
    pub async fn onboard_verinym(
        &self,
        profile: &ActorProfile,
        wallets: &WalletRegistry,
    ) -> anyhow::Result<Actor> {
        let actor = Actor::create(profile, wallets, self.actor.pool.clone(), None).await?;

        let nym_request = build_nym_request(
            &self.actor.did,
            &actor.did,
            Some(&actor.verkey),
            None,
            profile.role,
        );
        tracing::info!(
            steward = %self.actor.did,
            target = %actor.did,
            role = ?profile.role,
            "send NYM"
        );
        sign_and_submit_request(
            self.actor.pool.as_ref(),
            &self.actor.wallet,
            &self.actor.did,
            nym_request,
        )
        .await?;

        Ok(actor)
    }
}
