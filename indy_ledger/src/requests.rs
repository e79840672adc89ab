use std::{fmt, str::FromStr};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LedgerError;

pub const PROTOCOL_VERSION: u8 = 2;

/// Ledger roles, carried on the wire as their node codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "0")]
    Trustee,
    #[serde(rename = "2")]
    Steward,
    #[serde(rename = "101")]
    Endorser,
    #[serde(rename = "201")]
    NetworkMonitor,
}

impl Role {
    /// Roles allowed to author schemas, credential definitions and revocation registries.
    pub fn can_write_anoncreds_objects(&self) -> bool {
        matches!(self, Role::Trustee | Role::Steward | Role::Endorser)
    }

    /// Roles allowed to register a NYM carrying a role.
    pub fn can_assign_roles(&self) -> bool {
        matches!(self, Role::Trustee | Role::Steward)
    }
}

impl FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRUSTEE" | "0" => Ok(Role::Trustee),
            "STEWARD" | "2" => Ok(Role::Steward),
            "ENDORSER" | "TRUST_ANCHOR" | "101" => Ok(Role::Endorser),
            "NETWORK_MONITOR" | "201" => Ok(Role::NetworkMonitor),
            other => Err(LedgerError::Rejected(format!("unknown role: {other}"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Trustee => "TRUSTEE",
            Role::Steward => "STEWARD",
            Role::Endorser => "ENDORSER",
            Role::NetworkMonitor => "NETWORK_MONITOR",
        };
        f.write_str(name)
    }
}

/// A ledger operation, tagged with its transaction type code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    #[serde(rename = "1")]
    Nym {
        dest: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        verkey: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
    },
    #[serde(rename = "105")]
    GetNym { dest: String },
    #[serde(rename = "101")]
    Schema { id: String, data: Value },
    #[serde(rename = "107")]
    GetSchema { id: String },
    #[serde(rename = "102")]
    CredDef { id: String, data: Value },
    #[serde(rename = "108")]
    GetCredDef { id: String },
    #[serde(rename = "113")]
    RevocRegDef {
        id: String,
        #[serde(rename = "credDefId")]
        cred_def_id: String,
        data: Value,
    },
    #[serde(rename = "115")]
    GetRevocRegDef { id: String },
    #[serde(rename = "114")]
    RevocRegEntry {
        #[serde(rename = "revocRegDefId")]
        revoc_reg_def_id: String,
        value: Value,
    },
    #[serde(rename = "116")]
    GetRevocReg {
        #[serde(rename = "revocRegDefId")]
        revoc_reg_def_id: String,
        timestamp: u64,
    },
    #[serde(rename = "117")]
    GetRevocRegDelta {
        #[serde(rename = "revocRegDefId")]
        revoc_reg_def_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<u64>,
        to: u64,
    },
}

impl Operation {
    pub fn txn_name(&self) -> &'static str {
        match self {
            Operation::Nym { .. } => "NYM",
            Operation::GetNym { .. } => "GET_NYM",
            Operation::Schema { .. } => "SCHEMA",
            Operation::GetSchema { .. } => "GET_SCHEMA",
            Operation::CredDef { .. } => "CRED_DEF",
            Operation::GetCredDef { .. } => "GET_CRED_DEF",
            Operation::RevocRegDef { .. } => "REVOC_REG_DEF",
            Operation::GetRevocRegDef { .. } => "GET_REVOC_REG_DEF",
            Operation::RevocRegEntry { .. } => "REVOC_REG_ENTRY",
            Operation::GetRevocReg { .. } => "GET_REVOC_REG",
            Operation::GetRevocRegDelta { .. } => "GET_REVOC_REG_DELTA",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::Nym { .. }
                | Operation::Schema { .. }
                | Operation::CredDef { .. }
                | Operation::RevocRegDef { .. }
                | Operation::RevocRegEntry { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRequest {
    #[serde(rename = "reqId")]
    pub req_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub operation: Operation,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl LedgerRequest {
    fn new(submitter_did: Option<&str>, operation: Operation) -> Self {
        let req_id = Utc::now()
            .timestamp_nanos_opt()
            .map(|nanos| nanos as u64)
            .unwrap_or_else(rand::random);
        Self {
            req_id,
            identifier: submitter_did.map(str::to_owned),
            operation,
            protocol_version: PROTOCOL_VERSION,
            signature: None,
        }
    }

    /// The bytes a submitter signs: the request serialized without its signature.
    pub fn signature_input(&self) -> Result<Vec<u8>, LedgerError> {
        let unsigned = LedgerRequest {
            signature: None,
            ..self.clone()
        };
        Ok(serde_json::to_vec(&unsigned)?)
    }
}

pub fn build_nym_request(
    submitter_did: &str,
    target_did: &str,
    verkey: Option<&str>,
    alias: Option<&str>,
    role: Option<Role>,
) -> LedgerRequest {
    LedgerRequest::new(
        Some(submitter_did),
        Operation::Nym {
            dest: target_did.to_owned(),
            verkey: verkey.map(str::to_owned),
            alias: alias.map(str::to_owned),
            role,
        },
    )
}

pub fn build_get_nym_request(submitter_did: Option<&str>, target_did: &str) -> LedgerRequest {
    LedgerRequest::new(
        submitter_did,
        Operation::GetNym {
            dest: target_did.to_owned(),
        },
    )
}

pub fn build_schema_request(submitter_did: &str, schema_id: &str, schema: Value) -> LedgerRequest {
    LedgerRequest::new(
        Some(submitter_did),
        Operation::Schema {
            id: schema_id.to_owned(),
            data: schema,
        },
    )
}

pub fn build_get_schema_request(submitter_did: Option<&str>, schema_id: &str) -> LedgerRequest {
    LedgerRequest::new(
        submitter_did,
        Operation::GetSchema {
            id: schema_id.to_owned(),
        },
    )
}

pub fn build_cred_def_request(
    submitter_did: &str,
    cred_def_id: &str,
    cred_def: Value,
) -> LedgerRequest {
    LedgerRequest::new(
        Some(submitter_did),
        Operation::CredDef {
            id: cred_def_id.to_owned(),
            data: cred_def,
        },
    )
}

pub fn build_get_cred_def_request(submitter_did: Option<&str>, cred_def_id: &str) -> LedgerRequest {
    LedgerRequest::new(
        submitter_did,
        Operation::GetCredDef {
            id: cred_def_id.to_owned(),
        },
    )
}

pub fn build_revoc_reg_def_request(
    submitter_did: &str,
    revoc_reg_def_id: &str,
    cred_def_id: &str,
    revoc_reg_def: Value,
) -> LedgerRequest {
    LedgerRequest::new(
        Some(submitter_did),
        Operation::RevocRegDef {
            id: revoc_reg_def_id.to_owned(),
            cred_def_id: cred_def_id.to_owned(),
            data: revoc_reg_def,
        },
    )
}

pub fn build_get_revoc_reg_def_request(
    submitter_did: Option<&str>,
    revoc_reg_def_id: &str,
) -> LedgerRequest {
    LedgerRequest::new(
        submitter_did,
        Operation::GetRevocRegDef {
            id: revoc_reg_def_id.to_owned(),
        },
    )
}

pub fn build_revoc_reg_entry_request(
    submitter_did: &str,
    revoc_reg_def_id: &str,
    value: Value,
) -> LedgerRequest {
    LedgerRequest::new(
        Some(submitter_did),
        Operation::RevocRegEntry {
            revoc_reg_def_id: revoc_reg_def_id.to_owned(),
            value,
        },
    )
}

pub fn build_get_revoc_reg_request(
    submitter_did: Option<&str>,
    revoc_reg_def_id: &str,
    timestamp: u64,
) -> LedgerRequest {
    LedgerRequest::new(
        submitter_did,
        Operation::GetRevocReg {
            revoc_reg_def_id: revoc_reg_def_id.to_owned(),
            timestamp,
        },
    )
}

pub fn build_get_revoc_reg_delta_request(
    submitter_did: Option<&str>,
    revoc_reg_def_id: &str,
    from: Option<u64>,
    to: u64,
) -> LedgerRequest {
    LedgerRequest::new(
        submitter_did,
        Operation::GetRevocRegDelta {
            revoc_reg_def_id: revoc_reg_def_id.to_owned(),
            from,
            to,
        },
    )
}
