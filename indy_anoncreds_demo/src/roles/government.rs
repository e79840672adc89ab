use indy_anoncreds::{identifiers, registrar::IndyAnoncredsRegistrar};
use indy_ledger::pool::LocalPool;

use crate::actor::Actor;

pub const TRANSCRIPT_SCHEMA_NAME: &str = "Transcript";
pub const TRANSCRIPT_SCHEMA_VERSION: &str = "1.2";
pub const TRANSCRIPT_ATTRIBUTES: &[&str] = &[
    "first_name",
    "last_name",
    "degree",
    "status",
    "year",
    "average",
    "ssn",
];

/// Authors the schemas issuers build on.
pub struct Government {
    pub actor: Actor,
    anoncreds_registrar: IndyAnoncredsRegistrar<LocalPool>,
}

impl Government {
    pub fn bootstrap(actor: Actor) -> Self {
        let anoncreds_registrar =
            IndyAnoncredsRegistrar::new(actor.pool.clone(), actor.wallet.clone());
        Self {
            actor,
            anoncreds_registrar,
        }
    }

    /// Create the Transcript schema and send it to the ledger, returning its id.
    pub async fn publish_transcript_schema(&self) -> anyhow::Result<String> {
        tracing::info!(actor = self.actor.name, "create \"Transcript\" schema");
        let schema = anoncreds::issuer::create_schema(
            TRANSCRIPT_SCHEMA_NAME,
            TRANSCRIPT_SCHEMA_VERSION,
            self.actor.did.clone(),
            TRANSCRIPT_ATTRIBUTES.into(),
        )?;
        let schema_id = identifiers::schema_id(
            &self.actor.did,
            TRANSCRIPT_SCHEMA_NAME,
            TRANSCRIPT_SCHEMA_VERSION,
        );

        tracing::info!(actor = self.actor.name, "send \"Transcript\" schema to ledger");
        let written = self
            .anoncreds_registrar
            .write_schema(&self.actor.did, &schema_id, &schema)
            .await?;
        Ok(written.id)
    }
}
