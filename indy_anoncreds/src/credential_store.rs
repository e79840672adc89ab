//! Holder-side credential storage and proof request search, backed by wallet records.

use std::collections::HashMap;

use anoncreds::types::{Credential, PresentationRequest};
use indy_ledger::wallet::{Wallet, WalletRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    aggregation::IdentifierRecord,
    error::AnoncredsLedgerError,
    identifiers::{issuer_of, parse_schema_id},
};

pub const CREDENTIAL_RECORD_TYPE: &str = "credential";

const SCHEMA_ID_TAG: &str = "schema_id";
const CRED_DEF_ID_TAG: &str = "cred_def_id";
const ISSUER_DID_TAG: &str = "issuer_did";
const SCHEMA_ISSUER_DID_TAG: &str = "schema_issuer_did";
const SCHEMA_NAME_TAG: &str = "schema_name";
const SCHEMA_VERSION_TAG: &str = "schema_version";
const REV_REG_ID_TAG: &str = "rev_reg_id";

fn attr_marker_tag(name: &str) -> String {
    format!("attr::{}::marker", attr_common_view(name))
}

fn attr_value_tag(name: &str) -> String {
    format!("attr::{}::value", attr_common_view(name))
}

/// Attribute names match case-insensitively and ignoring whitespace.
pub fn attr_common_view(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// What a holder knows about one stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialInfo {
    pub referent: String,
    pub attrs: HashMap<String, String>,
    pub schema_id: String,
    pub cred_def_id: String,
    pub rev_reg_id: Option<String>,
    pub cred_rev_id: Option<u32>,
}

impl From<&CredentialInfo> for IdentifierRecord {
    fn from(info: &CredentialInfo) -> Self {
        IdentifierRecord {
            schema_id: info.schema_id.clone(),
            cred_def_id: info.cred_def_id.clone(),
            rev_reg_id: info.rev_reg_id.clone(),
            cred_rev_id: info.cred_rev_id,
            timestamp: None,
        }
    }
}

/// Credentials matching each referent of a proof request.
#[derive(Debug, Default)]
pub struct ProofRequestSearch {
    matches: HashMap<String, Vec<CredentialInfo>>,
}

impl ProofRequestSearch {
    /// Up to `count` credentials for a referent, in storage order.
    pub fn fetch_for_referent(&self, referent: &str, count: usize) -> Vec<CredentialInfo> {
        self.matches
            .get(referent)
            .map(|found| found.iter().take(count).cloned().collect())
            .unwrap_or_default()
    }

    pub fn first_for_referent(&self, referent: &str) -> Result<CredentialInfo, AnoncredsLedgerError> {
        self.fetch_for_referent(referent, 1)
            .pop()
            .ok_or_else(|| AnoncredsLedgerError::CredentialNotFound(referent.to_owned()))
    }
}

pub struct CredentialStore {
    wallet: Wallet,
}

impl CredentialStore {
    pub fn new(wallet: Wallet) -> Self {
        Self { wallet }
    }

    /// Store a processed credential, returning its referent.
    pub async fn store_credential(
        &self,
        credential: &Credential,
    ) -> Result<String, AnoncredsLedgerError> {
        let referent = uuid::Uuid::new_v4().to_string();
        let value = serde_json::to_value(credential)?;

        let schema_id = credential.schema_id.0.clone();
        let cred_def_id = credential.cred_def_id.0.clone();

        let mut tags = HashMap::from([
            (SCHEMA_ID_TAG.to_owned(), schema_id.clone()),
            (CRED_DEF_ID_TAG.to_owned(), cred_def_id.clone()),
            (ISSUER_DID_TAG.to_owned(), issuer_of(&cred_def_id)?.to_owned()),
        ]);
        if let Ok((schema_issuer, name, version)) = parse_schema_id(&schema_id) {
            tags.insert(SCHEMA_ISSUER_DID_TAG.to_owned(), schema_issuer.to_owned());
            tags.insert(SCHEMA_NAME_TAG.to_owned(), name.to_owned());
            tags.insert(SCHEMA_VERSION_TAG.to_owned(), version.to_owned());
        }
        if let Some(rev_reg_id) = &credential.rev_reg_id {
            tags.insert(REV_REG_ID_TAG.to_owned(), rev_reg_id.0.clone());
        }
        for (name, raw) in raw_values(&value) {
            tags.insert(attr_marker_tag(&name), "1".to_owned());
            tags.insert(attr_value_tag(&name), raw);
        }

        self.wallet
            .add_record(
                CREDENTIAL_RECORD_TYPE,
                WalletRecord {
                    id: referent.clone(),
                    value,
                    tags,
                },
            )
            .await?;

        tracing::info!(wallet = self.wallet.id(), referent = %referent, cred_def_id = %cred_def_id, "credential stored");
        Ok(referent)
    }

    pub async fn get_credential(&self, referent: &str) -> Result<Credential, AnoncredsLedgerError> {
        let record = self.get_record(referent).await?;
        Ok(serde_json::from_value(record.value)?)
    }

    async fn get_record(&self, referent: &str) -> Result<WalletRecord, AnoncredsLedgerError> {
        self.wallet
            .get_record(CREDENTIAL_RECORD_TYPE, referent)
            .await
            .map_err(|_| AnoncredsLedgerError::CredentialNotFound(referent.to_owned()))
    }

    /// Find stored credentials for every attribute and predicate referent of `request`.
    pub async fn search_for_proof_request(
        &self,
        request: &PresentationRequest,
    ) -> Result<ProofRequestSearch, AnoncredsLedgerError> {
        let request = serde_json::to_value(request)?;
        let mut search = ProofRequestSearch::default();

        for section in ["requested_attributes", "requested_predicates"] {
            let Some(referents) = request[section].as_object() else {
                continue;
            };
            for (referent, info) in referents {
                let names = requested_names(info);
                let found = self.search(&names, &info["restrictions"]).await?;
                tracing::debug!(referent = %referent, found = found.len(), "searched credentials for referent");
                search.matches.insert(referent.clone(), found);
            }
        }
        Ok(search)
    }

    async fn search(
        &self,
        names: &[String],
        restrictions: &Value,
    ) -> Result<Vec<CredentialInfo>, AnoncredsLedgerError> {
        let markers: HashMap<String, String> = names
            .iter()
            .map(|name| (attr_marker_tag(name), "1".to_owned()))
            .collect();

        self.wallet
            .search_records(CREDENTIAL_RECORD_TYPE, &markers)
            .await
            .into_iter()
            .filter(|record| matches_restrictions(restrictions, &record.tags))
            .map(credential_info)
            .collect()
    }
}

fn requested_names(info: &Value) -> Vec<String> {
    if let Some(name) = info["name"].as_str() {
        return vec![name.to_owned()];
    }
    info["names"]
        .as_array()
        .map(|names| {
            names
                .iter()
                .filter_map(|name| name.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

fn raw_values(credential: &Value) -> Vec<(String, String)> {
    credential["values"]
        .as_object()
        .map(|values| {
            values
                .iter()
                .filter_map(|(name, value)| {
                    value["raw"].as_str().map(|raw| (name.clone(), raw.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn credential_info(record: WalletRecord) -> Result<CredentialInfo, AnoncredsLedgerError> {
    let credential: Credential = serde_json::from_value(record.value.clone())?;
    Ok(CredentialInfo {
        attrs: raw_values(&record.value).into_iter().collect(),
        schema_id: credential.schema_id.0.clone(),
        cred_def_id: credential.cred_def_id.0.clone(),
        rev_reg_id: credential.rev_reg_id.as_ref().map(|id| id.0.clone()),
        cred_rev_id: credential.signature.extract_index(),
        referent: record.id,
    })
}

fn tag_for_restriction(key: &str) -> String {
    match key {
        "issuer_id" => ISSUER_DID_TAG.to_owned(),
        "schema_issuer_id" => SCHEMA_ISSUER_DID_TAG.to_owned(),
        other => match other
            .strip_prefix("attr::")
            .and_then(|rest| rest.rsplit_once("::"))
        {
            Some((name, suffix)) => format!("attr::{}::{suffix}", attr_common_view(name)),
            None => other.to_owned(),
        },
    }
}

/// Evaluate a restriction query against a credential's tags. A list is any-of, an object
/// is all-of its entries, and `$and`, `$or`, `$not`, `$neq`, `$in` are honoured.
pub fn matches_restrictions(query: &Value, tags: &HashMap<String, String>) -> bool {
    match query {
        Value::Null => true,
        Value::Array(any_of) => {
            any_of.is_empty() || any_of.iter().any(|q| matches_restrictions(q, tags))
        }
        Value::Object(all_of) => all_of.iter().all(|(key, expected)| match key.as_str() {
            "$and" => expected
                .as_array()
                .is_some_and(|qs| qs.iter().all(|q| matches_restrictions(q, tags))),
            "$or" => expected
                .as_array()
                .is_some_and(|qs| qs.iter().any(|q| matches_restrictions(q, tags))),
            "$not" => !matches_restrictions(expected, tags),
            key => {
                let actual = tags.get(&tag_for_restriction(key));
                match expected {
                    Value::String(value) => actual == Some(value),
                    Value::Object(op) => {
                        if let Some(neq) = op.get("$neq").and_then(Value::as_str) {
                            actual.is_some_and(|a| a != neq)
                        } else if let Some(options) = op.get("$in").and_then(Value::as_array) {
                            actual.is_some_and(|a| options.iter().any(|o| o.as_str() == Some(a.as_str())))
                        } else {
                            false
                        }
                    }
                    _ => false,
                }
            }
        }),
        _ => false,
    }
}
