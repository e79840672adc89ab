//! Conversions between anoncreds primitives and the JSON payloads carried by ledger transactions.
//! Currently just the serde JSON form of each type.

use anoncreds::{
    data_types::{cred_def::CredentialDefinition, schema::Schema},
    types::{RevocationRegistryDefinition, RevocationStatusList},
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub trait LedgerDataTransformer: Sized {
    fn to_ledger_data(&self) -> Result<Value, serde_json::Error>;
    fn from_ledger_data(data: Value) -> Result<Self, serde_json::Error>;
}

fn serialize<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

fn deserialize<T: DeserializeOwned>(data: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(data)
}

impl LedgerDataTransformer for Schema {
    fn to_ledger_data(&self) -> Result<Value, serde_json::Error> {
        serialize(self)
    }

    fn from_ledger_data(data: Value) -> Result<Self, serde_json::Error> {
        deserialize(data)
    }
}

impl LedgerDataTransformer for CredentialDefinition {
    fn to_ledger_data(&self) -> Result<Value, serde_json::Error> {
        serialize(self)
    }

    fn from_ledger_data(data: Value) -> Result<Self, serde_json::Error> {
        deserialize(data)
    }
}

impl LedgerDataTransformer for RevocationRegistryDefinition {
    fn to_ledger_data(&self) -> Result<Value, serde_json::Error> {
        serialize(self)
    }

    fn from_ledger_data(data: Value) -> Result<Self, serde_json::Error> {
        deserialize(data)
    }
}

/// Registry entries carry the whole status list. The ledger's own transaction time is
/// authoritative for the list's timestamp, so it is stripped on the way in.
impl LedgerDataTransformer for RevocationStatusList {
    fn to_ledger_data(&self) -> Result<Value, serde_json::Error> {
        let mut data = serialize(self)?;
        if let Some(map) = data.as_object_mut() {
            map.remove("timestamp");
        }
        Ok(data)
    }

    fn from_ledger_data(data: Value) -> Result<Self, serde_json::Error> {
        deserialize(data)
    }
}

/// Clone a value through its serde form, for anoncreds types that do not implement `Clone`.
pub fn serde_clone<T: Serialize + DeserializeOwned>(value: &T) -> Result<T, serde_json::Error> {
    serde_json::from_value(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_ledger_data() {
        let schema = anoncreds::issuer::create_schema(
            "Transcript",
            "1.2",
            String::from("Th7MpTaRZVRYnPiabds81Y"),
            (&["first_name", "last_name"][..]).into(),
        )
        .unwrap();

        let data = schema.to_ledger_data().unwrap();
        assert_eq!(data["name"], "Transcript");
        assert_eq!(data["version"], "1.2");

        let back = Schema::from_ledger_data(data.clone()).unwrap();
        assert_eq!(back.name, schema.name);
        assert_eq!(back.to_ledger_data().unwrap(), data);
    }
}
