use std::sync::Arc;

use indy_ledger::{
    error::Provisioned,
    pool::LocalPool,
    requests::Role,
    wallet::{Wallet, WalletConfig, WalletCredentials, WalletRegistry},
};

/// Who an actor is before it has a wallet or a DID.
#[derive(Debug, Clone)]
pub struct ActorProfile {
    pub name: &'static str,
    pub wallet_config: WalletConfig,
    pub wallet_credentials: WalletCredentials,
    /// Role granted on the ledger when the actor is onboarded as a verinym.
    pub role: Option<Role>,
}

impl ActorProfile {
    pub fn new(name: &'static str, wallet_id: &str, role: Option<Role>) -> Self {
        Self {
            name,
            wallet_config: WalletConfig {
                id: wallet_id.to_owned(),
            },
            wallet_credentials: WalletCredentials {
                key: format!("{wallet_id}_key"),
            },
            role,
        }
    }
}

/// A party in the walkthrough: an open wallet, a DID stored in it, and the pool it talks to.
pub struct Actor {
    pub name: &'static str,
    pub wallet: Wallet,
    pub did: String,
    pub verkey: String,
    pub pool: Arc<LocalPool>,
}

impl Actor {
    pub async fn create(
        profile: &ActorProfile,
        wallets: &WalletRegistry,
        pool: Arc<LocalPool>,
        seed: Option<&str>,
    ) -> anyhow::Result<Self> {
        tracing::info!(actor = profile.name, "create wallet");
        let (wallet, provisioned) =
            wallets.ensure_wallet(&profile.wallet_config, &profile.wallet_credentials)?;
        if provisioned == Provisioned::AlreadyExisted {
            tracing::info!(actor = profile.name, wallet = wallet.id(), "wallet already exists, opened it");
        }

        let did_info = wallet.create_and_store_my_did(seed).await?;
        tracing::info!(actor = profile.name, did = %did_info.did, "DID created");

        Ok(Self {
            name: profile.name,
            wallet,
            did: did_info.did,
            verkey: did_info.verkey,
            pool,
        })
    }
}
