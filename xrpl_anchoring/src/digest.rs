//! Fingerprints of credential documents, in the form a Payment's `InvoiceID` carries.

use std::path::Path;

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::error::AnchorError;

/// The document anchored when no credentials file is given.
pub fn default_credentials() -> Value {
    json!({
        "name": "John Doe",
        "email": "johndoe@gmail.com",
        "age": 30,
    })
}

pub fn load_credentials(path: Option<&Path>) -> Result<Value, AnchorError> {
    match path {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(default_credentials()),
    }
}

/// Compact JSON with object keys sorted at every depth.
pub fn canonical_json(value: &Value) -> Result<String, AnchorError> {
    Ok(serde_json::to_string(&sorted(value))?)
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(entries) => {
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&entries[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Uppercase hex SHA-256 of the canonical encoding: a valid 256-bit `InvoiceID`.
pub fn invoice_id(credentials: &Value) -> Result<String, AnchorError> {
    let digest = Sha256::digest(canonical_json(credentials)?.as_bytes());
    Ok(hex::encode_upper(digest))
}
