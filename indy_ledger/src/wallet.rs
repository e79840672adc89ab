use std::{collections::HashMap, sync::Arc};

use dashmap::{mapref::entry::Entry, DashMap};
use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    did::{did_info_for_key, signing_key_from_seed, DidInfo},
    error::{Provisioned, WalletError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCredentials {
    pub key: String,
}

/// A generic tagged record stored in a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub id: String,
    pub value: Value,
    pub tags: HashMap<String, String>,
}

struct StoredDid {
    info: DidInfo,
    signing_key: SigningKey,
}

#[derive(Default)]
struct WalletContents {
    dids: HashMap<String, StoredDid>,
    // record type -> record id -> record
    records: HashMap<String, HashMap<String, WalletRecord>>,
}

struct StoredWallet {
    key: String,
    contents: Arc<RwLock<WalletContents>>,
}

/// Named wallets, each guarded by its own key.
#[derive(Clone, Default)]
pub struct WalletRegistry {
    wallets: Arc<DashMap<String, StoredWallet>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> Result<(), WalletError> {
        match self.wallets.entry(config.id.clone()) {
            Entry::Occupied(_) => Err(WalletError::AlreadyExists(config.id.clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(StoredWallet {
                    key: credentials.key.clone(),
                    contents: Default::default(),
                });
                tracing::debug!(wallet = %config.id, "wallet created");
                Ok(())
            }
        }
    }

    pub fn open_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> Result<Wallet, WalletError> {
        let stored = self
            .wallets
            .get(&config.id)
            .ok_or_else(|| WalletError::NotFound(config.id.clone()))?;

        if stored.key != credentials.key {
            return Err(WalletError::AccessDenied(config.id.clone()));
        }

        Ok(Wallet {
            id: config.id.clone(),
            contents: stored.contents.clone(),
        })
    }

    /// Create the wallet unless it already exists, then open it.
    pub fn ensure_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> Result<(Wallet, Provisioned), WalletError> {
        let provisioned =
            Provisioned::from_wallet_result(self.create_wallet(config, credentials))?;
        let wallet = self.open_wallet(config, credentials)?;
        Ok((wallet, provisioned))
    }
}

/// An open wallet handle. Cloning shares the underlying storage.
#[derive(Clone)]
pub struct Wallet {
    id: String,
    contents: Arc<RwLock<WalletContents>>,
}

impl Wallet {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn create_and_store_my_did(&self, seed: Option<&str>) -> Result<DidInfo, WalletError> {
        let signing_key = signing_key_from_seed(seed)?;
        let info = did_info_for_key(&signing_key);

        let mut contents = self.contents.write().await;
        if let Some(existing) = contents.dids.get(&info.did) {
            // re-creating a seeded DID is fine, as long as it is the same key
            if existing.info == info {
                return Ok(info);
            }
            return Err(WalletError::DuplicateDid(info.did));
        }
        contents.dids.insert(
            info.did.clone(),
            StoredDid {
                info: info.clone(),
                signing_key,
            },
        );

        tracing::debug!(wallet = %self.id, did = %info.did, "DID stored");
        Ok(info)
    }

    /// Sign `message` with the key of a DID held in this wallet. Returns the base58 signature.
    pub async fn sign(&self, did: &str, message: &[u8]) -> Result<String, WalletError> {
        let contents = self.contents.read().await;
        let stored = contents
            .dids
            .get(did)
            .ok_or_else(|| WalletError::DidNotFound(did.to_owned()))?;
        let signature = stored.signing_key.sign(message);
        Ok(bs58::encode(signature.to_bytes()).into_string())
    }

    pub async fn add_record(
        &self,
        record_type: &str,
        record: WalletRecord,
    ) -> Result<(), WalletError> {
        let mut contents = self.contents.write().await;
        contents
            .records
            .entry(record_type.to_owned())
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    pub async fn get_record(&self, record_type: &str, id: &str) -> Result<WalletRecord, WalletError> {
        let contents = self.contents.read().await;
        contents
            .records
            .get(record_type)
            .and_then(|records| records.get(id))
            .cloned()
            .ok_or_else(|| WalletError::RecordNotFound {
                record_type: record_type.to_owned(),
                id: id.to_owned(),
            })
    }

    /// All records of a type whose tags contain every `(name, value)` in `tag_query`.
    pub async fn search_records(
        &self,
        record_type: &str,
        tag_query: &HashMap<String, String>,
    ) -> Vec<WalletRecord> {
        let contents = self.contents.read().await;
        let Some(records) = contents.records.get(record_type) else {
            return Vec::new();
        };

        let mut found: Vec<WalletRecord> = records
            .values()
            .filter(|record| {
                tag_query
                    .iter()
                    .all(|(name, value)| record.tags.get(name) == Some(value))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }
}
