use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LedgerError;

pub const REPLY_OP: &str = "REPLY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReply {
    pub op: String,
    pub result: ReplyResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyResult {
    #[serde(rename = "type")]
    pub txn_type: String,
    #[serde(rename = "reqId")]
    pub req_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Authoritative id of the object the reply is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(rename = "seqNo", skip_serializing_if = "Option::is_none")]
    pub seq_no: Option<u64>,
    #[serde(rename = "txnTime", skip_serializing_if = "Option::is_none")]
    pub txn_time: Option<u64>,
}

impl LedgerReply {
    /// The checker used by most reads: the reply carries non-null `data`.
    pub fn has_data(&self) -> bool {
        self.result.data.as_ref().is_some_and(|data| !data.is_null())
    }
}

/// A decoded ledger object, keyed by the id the ledger reported.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerObject {
    pub id: String,
    pub data: Value,
    pub seq_no: Option<u64>,
    pub txn_time: Option<u64>,
}

/// A decoded revocation registry delta.
#[derive(Debug, Clone, PartialEq)]
pub struct RevocRegDelta {
    pub revoc_reg_def_id: String,
    /// The registry entry value as of the delta's upper bound.
    pub accum_to: Value,
    pub issued: Vec<u32>,
    pub revoked: Vec<u32>,
    /// Ledger time of the entry `accum_to` was taken from.
    pub timestamp: u64,
}

fn expect_reply(reply: &LedgerReply, txn_type: &str) -> Result<(), LedgerError> {
    if reply.op != REPLY_OP {
        return Err(LedgerError::InvalidReply(format!(
            "expected {REPLY_OP}, got {}",
            reply.op
        )));
    }
    if reply.result.txn_type != txn_type {
        return Err(LedgerError::InvalidReply(format!(
            "expected txn type {txn_type}, got {}",
            reply.result.txn_type
        )));
    }
    Ok(())
}

fn parse_object(reply: &LedgerReply, txn_type: &str) -> Result<LedgerObject, LedgerError> {
    expect_reply(reply, txn_type)?;
    let id = reply
        .result
        .id
        .clone()
        .ok_or_else(|| LedgerError::InvalidReply("reply carries no id".to_owned()))?;
    let data = match &reply.result.data {
        Some(data) if !data.is_null() => data.clone(),
        _ => return Err(LedgerError::InvalidReply(format!("no data for {id}"))),
    };
    Ok(LedgerObject {
        id,
        data,
        seq_no: reply.result.seq_no,
        txn_time: reply.result.txn_time,
    })
}

pub fn parse_get_nym_response(reply: &LedgerReply) -> Result<LedgerObject, LedgerError> {
    parse_object(reply, "105")
}

pub fn parse_get_schema_response(reply: &LedgerReply) -> Result<LedgerObject, LedgerError> {
    parse_object(reply, "107")
}

pub fn parse_get_cred_def_response(reply: &LedgerReply) -> Result<LedgerObject, LedgerError> {
    parse_object(reply, "108")
}

pub fn parse_get_revoc_reg_def_response(reply: &LedgerReply) -> Result<LedgerObject, LedgerError> {
    parse_object(reply, "115")
}

/// Parse a point-in-time registry reply. The returned object always carries `txn_time`.
pub fn parse_get_revoc_reg_response(reply: &LedgerReply) -> Result<LedgerObject, LedgerError> {
    let object = parse_object(reply, "116")?;
    if object.txn_time.is_none() {
        return Err(LedgerError::InvalidReply(format!(
            "registry entry for {} has no txnTime",
            object.id
        )));
    }
    Ok(object)
}

pub fn parse_get_revoc_reg_delta_response(reply: &LedgerReply) -> Result<RevocRegDelta, LedgerError> {
    let object = parse_object(reply, "117")?;
    let value = &object.data["value"];

    let accum_to = &value["accum_to"];
    let timestamp = accum_to["txnTime"].as_u64().ok_or_else(|| {
        LedgerError::InvalidReply(format!("delta for {} has no accum_to.txnTime", object.id))
    })?;

    let indices = |field: &str| -> Result<Vec<u32>, LedgerError> {
        match &value[field] {
            Value::Null => Ok(Vec::new()),
            other => Ok(serde_json::from_value(other.clone())?),
        }
    };

    Ok(RevocRegDelta {
        revoc_reg_def_id: object.id.clone(),
        accum_to: accum_to["value"].clone(),
        issued: indices("issued")?,
        revoked: indices("revoked")?,
        timestamp,
    })
}
