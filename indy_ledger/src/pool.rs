use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{sync::RwLock, time::Instant};

use crate::{
    did::{author_of_legacy_id, did_info_for_key, signing_key_from_seed, verify_signature},
    error::{LedgerError, Provisioned},
    ledger::Ledger,
    requests::{LedgerRequest, Operation, Role},
    responses::{LedgerReply, ReplyResult, REPLY_OP},
};

/// A NYM present from the start of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisTxn {
    pub dest: String,
    pub verkey: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl GenesisTxn {
    /// The genesis NYM of a steward whose key is derived from `seed`.
    pub fn steward_from_seed(seed: &str) -> Result<Self, LedgerError> {
        let info = did_info_for_key(&signing_key_from_seed(Some(seed))?);
        Ok(Self {
            dest: info.did,
            verkey: info.verkey,
            role: Some(Role::Steward),
        })
    }

    /// Read genesis transactions from a file holding one JSON object per line.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Self>, LedgerError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let txns = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<Self>, _>>()?;
        if txns.is_empty() {
            return Err(LedgerError::InvalidGenesis(format!(
                "no transactions in {}",
                path.as_ref().display()
            )));
        }
        Ok(txns)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub genesis_txns: Vec<GenesisTxn>,
    /// How long a committed write stays invisible to reads.
    pub replication_lag: Duration,
}

/// Named pool ledger configs, and the pools opened from them.
#[derive(Clone, Default)]
pub struct PoolRegistry {
    configs: Arc<DashMap<String, PoolConfig>>,
    open_pools: Arc<DashMap<String, Arc<LocalPool>>>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_pool_ledger_config(&self, name: &str, config: PoolConfig) -> Result<(), LedgerError> {
        if config.genesis_txns.is_empty() {
            return Err(LedgerError::InvalidGenesis(format!("pool {name} has no genesis")));
        }
        match self.configs.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(LedgerError::PoolAlreadyExists(name.to_owned())),
            Entry::Vacant(vacant) => {
                vacant.insert(config);
                Ok(())
            }
        }
    }

    /// Create the config unless one with this name exists already.
    pub fn ensure_pool_ledger_config(
        &self,
        name: &str,
        config: PoolConfig,
    ) -> Result<Provisioned, LedgerError> {
        Provisioned::from_pool_result(self.create_pool_ledger_config(name, config))
    }

    /// Open the pool for a config. Opening the same name twice gives the same pool.
    pub fn open_pool_ledger(&self, name: &str) -> Result<Arc<LocalPool>, LedgerError> {
        if let Some(pool) = self.open_pools.get(name) {
            return Ok(pool.clone());
        }
        let config = self
            .configs
            .get(name)
            .map(|c| c.clone())
            .ok_or_else(|| LedgerError::PoolNotFound(name.to_owned()))?;

        let pool = self
            .open_pools
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(LocalPool::new(name, config)))
            .clone();
        tracing::info!(pool = name, "pool ledger opened");
        Ok(pool)
    }
}

#[derive(Debug, Clone)]
struct NymRecord {
    verkey: String,
    role: Option<Role>,
    seq_no: u64,
    txn_time: u64,
    visible_at: Instant,
}

#[derive(Debug, Clone)]
struct StoredTxn {
    author: String,
    data: Value,
    seq_no: u64,
    txn_time: u64,
    visible_at: Instant,
}

#[derive(Default)]
struct LedgerState {
    seq_no: u64,
    nyms: HashMap<String, NymRecord>,
    schemas: HashMap<String, StoredTxn>,
    cred_defs: HashMap<String, StoredTxn>,
    revoc_reg_defs: HashMap<String, StoredTxn>,
    // ordered by seq_no
    revoc_reg_entries: HashMap<String, Vec<StoredTxn>>,
}

/// An in-process ledger pool.
///
/// Writes are checked the way a validator pool would check them (signature
/// against the registered verkey, role permissions, id authorship) and are
/// ordered by sequence number. Reads only observe a write once the pool's
/// replication lag has passed since it was committed.
pub struct LocalPool {
    name: String,
    replication_lag: Duration,
    genesis_epoch: u64,
    opened_at: Instant,
    state: RwLock<LedgerState>,
}

impl LocalPool {
    pub fn new(name: &str, config: PoolConfig) -> Self {
        let opened_at = Instant::now();
        let genesis_epoch = Utc::now().timestamp().max(0) as u64;

        let mut state = LedgerState::default();
        for txn in config.genesis_txns {
            state.seq_no += 1;
            state.nyms.insert(
                txn.dest,
                NymRecord {
                    verkey: txn.verkey,
                    role: txn.role,
                    seq_no: state.seq_no,
                    txn_time: genesis_epoch,
                    visible_at: opened_at,
                },
            );
        }

        Self {
            name: name.to_owned(),
            replication_lag: config.replication_lag,
            genesis_epoch,
            opened_at,
            state: RwLock::new(state),
        }
    }

    /// Ledger time in epoch seconds: wall clock at open plus runtime time elapsed since.
    pub fn current_time(&self) -> u64 {
        self.genesis_epoch + self.opened_at.elapsed().as_secs()
    }

    async fn apply_write(&self, request: &LedgerRequest) -> Result<LedgerReply, LedgerError> {
        let submitter = request.identifier.clone().ok_or_else(|| LedgerError::Unauthorized {
            submitter: String::new(),
            reason: "write carries no submitter".to_owned(),
        })?;
        let unauthorized = |reason: String| LedgerError::Unauthorized {
            submitter: submitter.clone(),
            reason,
        };

        let mut state = self.state.write().await;

        let submitter_nym = state
            .nyms
            .get(&submitter)
            .cloned()
            .ok_or_else(|| unauthorized("submitter is not on the ledger".to_owned()))?;
        let signature = request
            .signature
            .as_deref()
            .ok_or_else(|| unauthorized("write is not signed".to_owned()))?;
        if !verify_signature(&submitter_nym.verkey, &request.signature_input()?, signature) {
            return Err(unauthorized("signature does not verify".to_owned()));
        }

        let txn_time = self.current_time();
        let visible_at = Instant::now() + self.replication_lag;
        let seq_no = state.seq_no + 1;
        let stored = |data: Value| StoredTxn {
            author: submitter.clone(),
            data,
            seq_no,
            txn_time,
            visible_at,
        };

        let id = match &request.operation {
            Operation::Nym {
                dest, verkey, role, ..
            } => {
                let submitter_role = submitter_nym.role;
                let allowed = match role {
                    Some(_) => submitter_role.is_some_and(|r| r.can_assign_roles()),
                    None => submitter_role.is_some(),
                };
                if !allowed {
                    return Err(unauthorized(format!(
                        "cannot register a NYM with role {role:?}"
                    )));
                }
                if state.nyms.contains_key(dest) {
                    return Err(LedgerError::Rejected(format!("NYM {dest} already registered")));
                }
                let verkey = verkey
                    .clone()
                    .ok_or_else(|| LedgerError::Rejected(format!("NYM {dest} has no verkey")))?;
                state.nyms.insert(
                    dest.clone(),
                    NymRecord {
                        verkey,
                        role: *role,
                        seq_no,
                        txn_time,
                        visible_at,
                    },
                );
                dest.clone()
            }
            Operation::Schema { id, data } => {
                self.check_anoncreds_author(&submitter, submitter_nym.role, id)?;
                if state.schemas.contains_key(id) {
                    return Err(LedgerError::Rejected(format!("schema {id} already exists")));
                }
                state.schemas.insert(id.clone(), stored(data.clone()));
                id.clone()
            }
            Operation::CredDef { id, data } => {
                self.check_anoncreds_author(&submitter, submitter_nym.role, id)?;
                if state.cred_defs.contains_key(id) {
                    return Err(LedgerError::Rejected(format!("cred def {id} already exists")));
                }
                state.cred_defs.insert(id.clone(), stored(data.clone()));
                id.clone()
            }
            Operation::RevocRegDef {
                id,
                cred_def_id,
                data,
            } => {
                self.check_anoncreds_author(&submitter, submitter_nym.role, id)?;
                if !state.cred_defs.contains_key(cred_def_id) {
                    return Err(LedgerError::Rejected(format!(
                        "cred def {cred_def_id} not found for registry {id}"
                    )));
                }
                if state.revoc_reg_defs.contains_key(id) {
                    return Err(LedgerError::Rejected(format!("registry {id} already exists")));
                }
                state.revoc_reg_defs.insert(id.clone(), stored(data.clone()));
                id.clone()
            }
            Operation::RevocRegEntry {
                revoc_reg_def_id,
                value,
            } => {
                let def = state.revoc_reg_defs.get(revoc_reg_def_id).ok_or_else(|| {
                    LedgerError::Rejected(format!("registry {revoc_reg_def_id} not found"))
                })?;
                if def.author != submitter {
                    return Err(unauthorized(format!(
                        "only the author of {revoc_reg_def_id} may update it"
                    )));
                }
                state
                    .revoc_reg_entries
                    .entry(revoc_reg_def_id.clone())
                    .or_default()
                    .push(stored(value.clone()));
                revoc_reg_def_id.clone()
            }
            read => {
                return Err(LedgerError::Rejected(format!(
                    "{} is not a write",
                    read.txn_name()
                )))
            }
        };
        state.seq_no = seq_no;

        tracing::info!(
            pool = %self.name,
            txn = request.operation.txn_name(),
            id = %id,
            seq_no,
            txn_time,
            "write committed"
        );

        Ok(self.reply(request, Some(id), Some(json!({}))).with_txn(seq_no, txn_time))
    }

    fn check_anoncreds_author(
        &self,
        submitter: &str,
        role: Option<Role>,
        id: &str,
    ) -> Result<(), LedgerError> {
        if !role.is_some_and(|r| r.can_write_anoncreds_objects()) {
            return Err(LedgerError::Unauthorized {
                submitter: submitter.to_owned(),
                reason: "role may not write anoncreds objects".to_owned(),
            });
        }
        if author_of_legacy_id(id) != submitter {
            return Err(LedgerError::Unauthorized {
                submitter: submitter.to_owned(),
                reason: format!("{id} is not authored by the submitter"),
            });
        }
        Ok(())
    }

    async fn answer_read(&self, request: &LedgerRequest) -> Result<LedgerReply, LedgerError> {
        let state = self.state.read().await;
        let now = Instant::now();
        let visible = |txn: &&StoredTxn| txn.visible_at <= now;

        let reply = match &request.operation {
            Operation::GetNym { dest } => {
                match state.nyms.get(dest).filter(|nym| nym.visible_at <= now) {
                    Some(nym) => self
                        .reply(
                            request,
                            Some(dest.clone()),
                            Some(json!({ "dest": dest, "verkey": nym.verkey, "role": nym.role })),
                        )
                        .with_txn(nym.seq_no, nym.txn_time),
                    None => self.reply(request, Some(dest.clone()), None),
                }
            }
            Operation::GetSchema { id } => {
                self.object_reply(request, id, state.schemas.get(id).filter(visible))
            }
            Operation::GetCredDef { id } => {
                self.object_reply(request, id, state.cred_defs.get(id).filter(visible))
            }
            Operation::GetRevocRegDef { id } => {
                self.object_reply(request, id, state.revoc_reg_defs.get(id).filter(visible))
            }
            Operation::GetRevocReg {
                revoc_reg_def_id,
                timestamp,
            } => {
                let entry = latest_entry_at(&state, revoc_reg_def_id, *timestamp, now);
                self.object_reply(request, revoc_reg_def_id, entry)
            }
            Operation::GetRevocRegDelta {
                revoc_reg_def_id,
                from,
                to,
            } => {
                let accum_to = latest_entry_at(&state, revoc_reg_def_id, *to, now);
                let accum_from =
                    from.and_then(|from| latest_entry_at(&state, revoc_reg_def_id, from, now));
                match accum_to {
                    Some(accum_to) => {
                        let (issued, revoked) = index_changes(accum_from, accum_to);
                        let mut value = json!({
                            "accum_to": { "value": accum_to.data, "txnTime": accum_to.txn_time },
                            "issued": issued,
                            "revoked": revoked,
                        });
                        if let Some(accum_from) = accum_from {
                            value["accum_from"] =
                                json!({ "value": accum_from.data, "txnTime": accum_from.txn_time });
                        }
                        self.reply(
                            request,
                            Some(revoc_reg_def_id.clone()),
                            Some(json!({ "value": value })),
                        )
                        .with_txn(accum_to.seq_no, accum_to.txn_time)
                    }
                    None => self.reply(request, Some(revoc_reg_def_id.clone()), None),
                }
            }
            write => {
                return Err(LedgerError::Rejected(format!(
                    "{} is not a read",
                    write.txn_name()
                )))
            }
        };
        Ok(reply)
    }

    fn object_reply(
        &self,
        request: &LedgerRequest,
        id: &str,
        txn: Option<&StoredTxn>,
    ) -> LedgerReply {
        match txn {
            Some(txn) => self
                .reply(request, Some(id.to_owned()), Some(txn.data.clone()))
                .with_txn(txn.seq_no, txn.txn_time),
            None => self.reply(request, Some(id.to_owned()), None),
        }
    }

    fn reply(&self, request: &LedgerRequest, id: Option<String>, data: Option<Value>) -> LedgerReply {
        let txn_type = serde_json::to_value(&request.operation)
            .ok()
            .and_then(|op| op["type"].as_str().map(str::to_owned))
            .unwrap_or_default();
        LedgerReply {
            op: REPLY_OP.to_owned(),
            result: ReplyResult {
                txn_type,
                req_id: request.req_id,
                identifier: request.identifier.clone(),
                id,
                data,
                seq_no: None,
                txn_time: None,
            },
        }
    }
}

impl LedgerReply {
    fn with_txn(mut self, seq_no: u64, txn_time: u64) -> Self {
        self.result.seq_no = Some(seq_no);
        self.result.txn_time = Some(txn_time);
        self
    }
}

/// The last visible registry entry committed at or before `timestamp`.
fn latest_entry_at<'a>(
    state: &'a LedgerState,
    revoc_reg_def_id: &str,
    timestamp: u64,
    now: Instant,
) -> Option<&'a StoredTxn> {
    state
        .revoc_reg_entries
        .get(revoc_reg_def_id)?
        .iter()
        .filter(|txn| txn.visible_at <= now && txn.txn_time <= timestamp)
        .last()
}

/// Indices whose revocation flag changed between two entries, as (issued, revoked).
fn index_changes(from: Option<&StoredTxn>, to: &StoredTxn) -> (Vec<u32>, Vec<u32>) {
    let flags = |txn: &StoredTxn| -> Vec<u64> {
        txn.data["revocationList"]
            .as_array()
            .map(|list| list.iter().map(|v| v.as_u64().unwrap_or(0)).collect())
            .unwrap_or_default()
    };
    let to_flags = flags(to);
    let from_flags = from.map(flags).unwrap_or_else(|| vec![0; to_flags.len()]);

    let mut issued = Vec::new();
    let mut revoked = Vec::new();
    for (idx, now_flag) in to_flags.iter().enumerate() {
        let before = from_flags.get(idx).copied().unwrap_or(0);
        match (before, *now_flag) {
            (1, 0) => issued.push(idx as u32),
            (0, 1) => revoked.push(idx as u32),
            _ => {}
        }
    }
    (issued, revoked)
}

#[async_trait]
impl Ledger for LocalPool {
    async fn submit_request(&self, request: &LedgerRequest) -> Result<LedgerReply, LedgerError> {
        if request.operation.is_write() {
            self.apply_write(request).await
        } else {
            self.answer_read(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{
        did::DidInfo,
        ledger::sign_and_submit_request,
        requests::{
            build_get_nym_request, build_get_revoc_reg_delta_request, build_get_revoc_reg_request,
            build_get_schema_request, build_nym_request, build_revoc_reg_entry_request,
            build_schema_request,
        },
        responses::{parse_get_revoc_reg_delta_response, parse_get_schema_response},
        retry::{ensure_previous_request_applied, RetryPolicy},
        wallet::{Wallet, WalletConfig, WalletCredentials, WalletRegistry},
    };

    const STEWARD_SEED: &str = "000000000000000000000000Steward1";

    async fn steward_and_pool(lag: Duration) -> (Arc<LocalPool>, Wallet, DidInfo) {
        let registry = PoolRegistry::new();
        registry
            .create_pool_ledger_config(
                "pool1",
                PoolConfig {
                    genesis_txns: vec![GenesisTxn::steward_from_seed(STEWARD_SEED).unwrap()],
                    replication_lag: lag,
                },
            )
            .unwrap();
        let pool = registry.open_pool_ledger("pool1").unwrap();

        let wallets = WalletRegistry::new();
        let (wallet, _) = wallets
            .ensure_wallet(
                &WalletConfig {
                    id: "steward_wallet".to_owned(),
                },
                &WalletCredentials {
                    key: "steward_wallet_key".to_owned(),
                },
            )
            .unwrap();
        let steward = wallet.create_and_store_my_did(Some(STEWARD_SEED)).await.unwrap();
        (pool, wallet, steward)
    }

    async fn onboard(pool: &LocalPool, wallet: &Wallet, steward: &DidInfo, role: Role) -> DidInfo {
        let did = wallet.create_and_store_my_did(None).await.unwrap();
        let nym = build_nym_request(&steward.did, &did.did, Some(&did.verkey), None, Some(role));
        sign_and_submit_request(pool, wallet, &steward.did, nym)
            .await
            .unwrap();
        did
    }

    #[test]
    fn test_pool_config_already_exists() {
        let registry = PoolRegistry::new();
        let config = PoolConfig {
            genesis_txns: vec![GenesisTxn::steward_from_seed(STEWARD_SEED).unwrap()],
            replication_lag: Duration::ZERO,
        };
        registry.create_pool_ledger_config("pool1", config.clone()).unwrap();

        assert!(matches!(
            registry.create_pool_ledger_config("pool1", config.clone()),
            Err(LedgerError::PoolAlreadyExists(_))
        ));
        assert_eq!(
            registry.ensure_pool_ledger_config("pool1", config).unwrap(),
            Provisioned::AlreadyExisted
        );
        assert!(matches!(
            registry.open_pool_ledger("pool2"),
            Err(LedgerError::PoolNotFound(_))
        ));
    }

    #[test]
    fn test_genesis_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let txn = GenesisTxn::steward_from_seed(STEWARD_SEED).unwrap();
        writeln!(file, "{}", serde_json::to_string(&txn).unwrap()).unwrap();
        writeln!(file).unwrap();

        let loaded = GenesisTxn::load_file(file.path()).unwrap();
        assert_eq!(loaded, vec![txn]);
    }

    #[tokio::test]
    async fn test_unsigned_and_unauthorized_writes_rejected() {
        let (pool, wallet, steward) = steward_and_pool(Duration::ZERO).await;

        // unsigned
        let unsigned = build_schema_request(&steward.did, &format!("{}:2:s:1.0", steward.did), json!({}));
        assert!(matches!(
            pool.submit_request(&unsigned).await,
            Err(LedgerError::Unauthorized { .. })
        ));

        // a DID without a role cannot assign roles
        let plain = wallet.create_and_store_my_did(None).await.unwrap();
        let nym = build_nym_request(&steward.did, &plain.did, Some(&plain.verkey), None, None);
        sign_and_submit_request(pool.as_ref(), &wallet, &steward.did, nym)
            .await
            .unwrap();
        let other = wallet.create_and_store_my_did(None).await.unwrap();
        let nym = build_nym_request(&plain.did, &other.did, Some(&other.verkey), None, Some(Role::Endorser));
        assert!(matches!(
            sign_and_submit_request(pool.as_ref(), &wallet, &plain.did, nym).await,
            Err(LedgerError::Unauthorized { .. })
        ));

        // schema ids must carry the author's DID
        let endorser = onboard(&pool, &wallet, &steward, Role::Endorser).await;
        let foreign_id = format!("{}:2:s:1.0", steward.did);
        let schema = build_schema_request(&endorser.did, &foreign_id, json!({}));
        assert!(matches!(
            sign_and_submit_request(pool.as_ref(), &wallet, &endorser.did, schema).await,
            Err(LedgerError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_tampered_request_rejected() {
        let (pool, wallet, steward) = steward_and_pool(Duration::ZERO).await;
        let target = wallet.create_and_store_my_did(None).await.unwrap();

        let mut nym = build_nym_request(&steward.did, &target.did, Some(&target.verkey), None, None);
        nym.identifier = Some(steward.did.clone());
        let signature = wallet
            .sign(&steward.did, &nym.signature_input().unwrap())
            .await
            .unwrap();
        nym.signature = Some(signature);
        nym.operation = Operation::Nym {
            dest: target.did.clone(),
            verkey: Some(target.verkey.clone()),
            alias: None,
            role: Some(Role::Trustee),
        };

        assert!(matches!(
            pool.submit_request(&nym).await,
            Err(LedgerError::Unauthorized { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_observe_writes_after_replication_lag() {
        let lag = Duration::from_secs(2);
        let (pool, wallet, steward) = steward_and_pool(lag).await;
        let government = onboard(&pool, &wallet, &steward, Role::Endorser).await;

        let get_nym = build_get_nym_request(None, &government.did);
        assert!(!pool.submit_request(&get_nym).await.unwrap().has_data());

        let schema_id = format!("{}:2:Transcript:1.2", government.did);
        let schema = build_schema_request(&government.did, &schema_id, json!({ "name": "Transcript" }));
        sign_and_submit_request(pool.as_ref(), &wallet, &government.did, schema)
            .await
            .unwrap();

        let get_schema = build_get_schema_request(None, &schema_id);
        assert!(!pool.submit_request(&get_schema).await.unwrap().has_data());

        // the retry helper sleeps through the lag
        let policy = RetryPolicy::fixed(3, Duration::from_secs(1));
        let reply = ensure_previous_request_applied(pool.as_ref(), &get_schema, &policy, LedgerReply::has_data)
            .await
            .unwrap();
        let schema = parse_get_schema_response(&reply).unwrap();
        assert_eq!(schema.id, schema_id);
        assert_eq!(schema.data["name"], "Transcript");
        assert!(schema.seq_no.is_some());

        assert!(pool.submit_request(&get_nym).await.unwrap().has_data());
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_entries_by_time() {
        let (pool, wallet, steward) = steward_and_pool(Duration::ZERO).await;
        let issuer = onboard(&pool, &wallet, &steward, Role::Endorser).await;

        // registries need a cred def and a definition on the ledger first
        let cred_def_id = format!("{}:3:CL:1:tag", issuer.did);
        let rev_reg_id = format!("{}:4:{cred_def_id}:CL_ACCUM:tag", issuer.did);
        let requests = vec![
            crate::requests::build_cred_def_request(&issuer.did, &cred_def_id, json!({})),
            crate::requests::build_revoc_reg_def_request(&issuer.did, &rev_reg_id, &cred_def_id, json!({})),
        ];
        for request in requests {
            sign_and_submit_request(pool.as_ref(), &wallet, &issuer.did, request)
                .await
                .unwrap();
        }

        let entry = |flags: Vec<u8>| {
            build_revoc_reg_entry_request(&issuer.did, &rev_reg_id, json!({ "revocationList": flags }))
        };
        sign_and_submit_request(pool.as_ref(), &wallet, &issuer.did, entry(vec![0, 0, 0]))
            .await
            .unwrap();
        let first = pool.current_time();

        tokio::time::advance(Duration::from_secs(3)).await;
        sign_and_submit_request(pool.as_ref(), &wallet, &issuer.did, entry(vec![0, 1, 0]))
            .await
            .unwrap();
        let second = pool.current_time();
        assert!(second > first);

        let at_first = pool
            .submit_request(&build_get_revoc_reg_request(None, &rev_reg_id, first))
            .await
            .unwrap();
        assert_eq!(at_first.result.txn_time, Some(first));
        assert_eq!(at_first.result.data.unwrap()["revocationList"], json!([0, 0, 0]));

        let before_any = pool
            .submit_request(&build_get_revoc_reg_request(None, &rev_reg_id, first - 1))
            .await
            .unwrap();
        assert!(!before_any.has_data());

        let delta = pool
            .submit_request(&build_get_revoc_reg_delta_request(None, &rev_reg_id, Some(first), second))
            .await
            .unwrap();
        let delta = parse_get_revoc_reg_delta_response(&delta).unwrap();
        assert_eq!(delta.timestamp, second);
        assert_eq!(delta.revoked, vec![1]);
        assert!(delta.issued.is_empty());

        // only the registry author may add entries
        let stranger = onboard(&pool, &wallet, &steward, Role::Endorser).await;
        let foreign = build_revoc_reg_entry_request(&stranger.did, &rev_reg_id, json!({}));
        assert!(matches!(
            sign_and_submit_request(pool.as_ref(), &wallet, &stranger.did, foreign).await,
            Err(LedgerError::Unauthorized { .. })
        ));
    }
}
