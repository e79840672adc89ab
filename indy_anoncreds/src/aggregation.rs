//! Assemble the ledger objects a prover or verifier needs for one presentation.
//!
//! Identifiers are resolved strictly one after another: a tails file is opened for exactly
//! one identifier and released before the next is looked at.

use std::collections::{BTreeMap, HashMap};

use anoncreds::{
    data_types::{
        cred_def::{CredentialDefinition, CredentialDefinitionId},
        rev_reg_def::RevocationRegistryDefinitionId,
        schema::{Schema, SchemaId},
    },
    prover::create_or_update_revocation_state,
    types::{CredentialRevocationState, RevocationRegistryDefinition, RevocationStatusList},
};
use chrono::Utc;
use indy_ledger::ledger::Ledger;
use serde::{Deserialize, Serialize};

use crate::{error::AnoncredsLedgerError, resolver::IndyAnoncredsResolver, tails::TailsReaderConfig};

/// One credential reference, as held by a prover or listed in a presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    pub schema_id: String,
    pub cred_def_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_rev_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

#[derive(Debug, Default)]
pub struct ProverLedgerEntities {
    pub schemas: HashMap<SchemaId, Schema>,
    pub cred_defs: HashMap<CredentialDefinitionId, CredentialDefinition>,
    /// rev_reg_id -> timestamp -> state
    pub rev_states: HashMap<String, BTreeMap<u64, CredentialRevocationState>>,
}

impl ProverLedgerEntities {
    pub fn schemas_by_ref(&self) -> HashMap<&SchemaId, &Schema> {
        self.schemas.iter().collect()
    }

    pub fn cred_defs_by_ref(&self) -> HashMap<&CredentialDefinitionId, &CredentialDefinition> {
        self.cred_defs.iter().collect()
    }

    /// The most recent revocation state derived for a registry.
    pub fn rev_state(&self, rev_reg_id: &str) -> Option<(u64, &CredentialRevocationState)> {
        self.rev_states
            .get(rev_reg_id)?
            .iter()
            .next_back()
            .map(|(timestamp, state)| (*timestamp, state))
    }
}

#[derive(Debug, Default)]
pub struct VerifierLedgerEntities {
    pub schemas: HashMap<SchemaId, Schema>,
    pub cred_defs: HashMap<CredentialDefinitionId, CredentialDefinition>,
    pub rev_reg_defs: HashMap<RevocationRegistryDefinitionId, RevocationRegistryDefinition>,
    /// rev_reg_id -> timestamp -> status list
    pub rev_regs: HashMap<String, BTreeMap<u64, RevocationStatusList>>,
}

impl VerifierLedgerEntities {
    pub fn schemas_by_ref(&self) -> HashMap<&SchemaId, &Schema> {
        self.schemas.iter().collect()
    }

    pub fn cred_defs_by_ref(&self) -> HashMap<&CredentialDefinitionId, &CredentialDefinition> {
        self.cred_defs.iter().collect()
    }

    pub fn rev_reg_defs_by_ref(
        &self,
    ) -> HashMap<&RevocationRegistryDefinitionId, &RevocationRegistryDefinition> {
        self.rev_reg_defs.iter().collect()
    }

    pub fn status_lists(&self) -> Vec<&RevocationStatusList> {
        self.rev_regs.values().flat_map(BTreeMap::values).collect()
    }
}

async fn fetch_schema_and_cred_def<L>(
    resolver: &IndyAnoncredsResolver<L>,
    item: &IdentifierRecord,
    actor: &str,
    schemas: &mut HashMap<SchemaId, Schema>,
    cred_defs: &mut HashMap<CredentialDefinitionId, CredentialDefinition>,
) -> Result<(), AnoncredsLedgerError>
where
    L: Ledger + ?Sized,
{
    tracing::info!(actor, schema_id = %item.schema_id, "get schema from ledger");
    let schema = resolver.fetch_schema(&item.schema_id).await?;
    schemas.insert(SchemaId::new_unchecked(schema.id), schema.value);

    tracing::info!(actor, cred_def_id = %item.cred_def_id, "get cred def from ledger");
    let cred_def = resolver.fetch_cred_def(&item.cred_def_id).await?;
    cred_defs.insert(CredentialDefinitionId::new_unchecked(cred_def.id), cred_def.value);
    Ok(())
}

/// Fetch schemas, cred defs and revocation states for the credentials a prover will present.
///
/// For identifiers with a revocation registry, the registry's state between
/// `timestamp_from` and `timestamp_to` (default: now) is read and a revocation state is
/// derived for the identifier's `cred_rev_id`, keyed by the time of the ledger entry used.
pub async fn prover_get_entities_from_ledger<L>(
    resolver: &IndyAnoncredsResolver<L>,
    identifiers: &HashMap<String, IdentifierRecord>,
    actor: &str,
    timestamp_from: Option<u64>,
    timestamp_to: Option<u64>,
) -> Result<ProverLedgerEntities, AnoncredsLedgerError>
where
    L: Ledger + ?Sized,
{
    let mut entities = ProverLedgerEntities::default();

    for item in identifiers.values() {
        fetch_schema_and_cred_def(
            resolver,
            item,
            actor,
            &mut entities.schemas,
            &mut entities.cred_defs,
        )
        .await?;

        let Some(rev_reg_id) = &item.rev_reg_id else {
            continue;
        };
        let cred_rev_id = item
            .cred_rev_id
            .ok_or_else(|| AnoncredsLedgerError::MissingCredRevId {
                rev_reg_id: rev_reg_id.clone(),
            })?;

        tracing::info!(actor, rev_reg_id = %rev_reg_id, "get rev reg def from ledger");
        let rev_reg_def = resolver.fetch_rev_reg_def(rev_reg_id).await?;

        let timestamp_to = timestamp_to.unwrap_or_else(|| Utc::now().timestamp() as u64);
        tracing::info!(actor, rev_reg_id = %rev_reg_id, ?timestamp_from, timestamp_to, "get rev reg delta from ledger");
        let delta = resolver
            .fetch_rev_reg_delta(rev_reg_id, timestamp_from, timestamp_to)
            .await?;

        let tails_path = TailsReaderConfig::for_rev_reg_def(&rev_reg_def.value)?.open()?;

        tracing::info!(actor, rev_reg_id = %rev_reg_id, timestamp = delta.timestamp, "create revocation state");
        let rev_state = create_or_update_revocation_state(
            &tails_path,
            &rev_reg_def.value,
            &delta.status_list,
            cred_rev_id,
            None,
            None,
        )?;

        entities
            .rev_states
            .insert(rev_reg_def.id, BTreeMap::from([(delta.timestamp, rev_state)]));
    }

    Ok(entities)
}

/// Fetch schemas, cred defs, registry definitions and registry snapshots needed to verify a
/// presentation over `identifiers`.
///
/// Each registry is read as of `timestamp` when given, otherwise as of the identifier's own
/// timestamp.
pub async fn verifier_get_entities_from_ledger<L>(
    resolver: &IndyAnoncredsResolver<L>,
    identifiers: &[IdentifierRecord],
    actor: &str,
    timestamp: Option<u64>,
) -> Result<VerifierLedgerEntities, AnoncredsLedgerError>
where
    L: Ledger + ?Sized,
{
    let mut entities = VerifierLedgerEntities::default();

    for item in identifiers {
        fetch_schema_and_cred_def(
            resolver,
            item,
            actor,
            &mut entities.schemas,
            &mut entities.cred_defs,
        )
        .await?;

        let Some(rev_reg_id) = &item.rev_reg_id else {
            continue;
        };
        let as_of = timestamp
            .or(item.timestamp)
            .ok_or_else(|| AnoncredsLedgerError::MissingTimestamp {
                rev_reg_id: rev_reg_id.clone(),
            })?;

        tracing::info!(actor, rev_reg_id = %rev_reg_id, "get rev reg def from ledger");
        let rev_reg_def = resolver.fetch_rev_reg_def(rev_reg_id).await?;

        tracing::info!(actor, rev_reg_id = %rev_reg_id, as_of, "get rev reg from ledger");
        let rev_reg = resolver.fetch_rev_reg(rev_reg_id, as_of).await?;

        entities
            .rev_regs
            .entry(rev_reg.rev_reg_id)
            .or_default()
            .insert(rev_reg.timestamp, rev_reg.status_list);
        entities.rev_reg_defs.insert(
            RevocationRegistryDefinitionId::new_unchecked(rev_reg_def.id),
            rev_reg_def.value,
        );
    }

    Ok(entities)
}
