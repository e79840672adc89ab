//! A small JSON-RPC client for the rippled methods anchoring needs.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use url::Url;

use crate::{error::AnchorError, transaction::Payment};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Seeds with this prefix encode an Ed25519 key.
const ED25519_SEED_PREFIX: &str = "sEd";

#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub account_data: AccountRoot,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountRoot {
    pub account: String,
    pub sequence: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct LedgerCurrent {
    ledger_current_index: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct LedgerHeader {
    ledger_index: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResult {
    pub engine_result: String,
    #[serde(default)]
    pub engine_result_message: String,
    pub tx_json: SubmittedTx,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedTx {
    pub hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxResult {
    pub hash: String,
    #[serde(default)]
    pub validated: bool,
    pub ledger_index: Option<u32>,
    pub meta: Option<TxMeta>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxMeta {
    pub transaction_result: String,
}

#[derive(Debug, Clone)]
pub struct XrplClient {
    http: reqwest::Client,
    url: Url,
}

impl XrplClient {
    pub fn new(url: &str) -> Result<Self, AnchorError> {
        let url = Url::parse(url)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| AnchorError::Http {
                method: "client_init".to_owned(),
                source,
            })?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, AnchorError> {
        let http_err = |source| AnchorError::Http {
            method: method.to_owned(),
            source,
        };

        tracing::debug!(method, "JSON-RPC request");
        let body: Value = self
            .http
            .post(self.url.clone())
            .json(&json!({ "method": method, "params": [params] }))
            .send()
            .await
            .map_err(http_err)?
            .error_for_status()
            .map_err(http_err)?
            .json()
            .await
            .map_err(http_err)?;

        let result = body.get("result").cloned().ok_or_else(|| AnchorError::InvalidResponse {
            method: method.to_owned(),
            reason: "no result".to_owned(),
        })?;
        if result["status"] == "error" {
            return Err(AnchorError::Rpc {
                method: method.to_owned(),
                error: result["error"].as_str().unwrap_or("unknown").to_owned(),
                message: result["error_message"].as_str().unwrap_or_default().to_owned(),
            });
        }
        serde_json::from_value(result).map_err(|e| AnchorError::InvalidResponse {
            method: method.to_owned(),
            reason: e.to_string(),
        })
    }

    /// The account's state in the current open ledger.
    pub async fn account_info(&self, account: &str) -> Result<AccountInfo, AnchorError> {
        self.request(
            "account_info",
            json!({ "account": account, "ledger_index": "current" }),
        )
        .await
    }

    pub async fn ledger_current(&self) -> Result<u32, AnchorError> {
        let current: LedgerCurrent = self.request("ledger_current", json!({})).await?;
        Ok(current.ledger_current_index)
    }

    /// Index of the most recent ledger the network has validated.
    pub async fn validated_ledger_index(&self) -> Result<u32, AnchorError> {
        let header: LedgerHeader = self
            .request("ledger", json!({ "ledger_index": "validated" }))
            .await?;
        Ok(header.ledger_index)
    }

    /// Sign and submit in one call. The server signs with `secret`.
    pub async fn submit(&self, payment: &Payment, secret: &str) -> Result<SubmitResult, AnchorError> {
        let mut params = json!({ "tx_json": payment });
        if secret.starts_with(ED25519_SEED_PREFIX) {
            params["seed"] = json!(secret);
            params["key_type"] = json!("ed25519");
        } else {
            params["secret"] = json!(secret);
        }
        self.request("submit", params).await
    }

    /// Look a transaction up by hash. `None` while the server does not know it.
    pub async fn tx(&self, hash: &str) -> Result<Option<TxResult>, AnchorError> {
        match self.request("tx", json!({ "transaction": hash })).await {
            Ok(tx) => Ok(Some(tx)),
            Err(AnchorError::Rpc { error, .. }) if error == "txnNotFound" => Ok(None),
            Err(e) => Err(e),
        }
    }
}
