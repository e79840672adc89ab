use std::{collections::BTreeSet, path::Path};

use anoncreds::{
    data_types::{cred_def::CredentialDefinition, rev_reg::RevocationRegistryId},
    tails::{TailsFileReader, TailsFileWriter},
    types::{
        Credential, CredentialDefinitionConfig, CredentialDefinitionPrivate,
        CredentialKeyCorrectnessProof, CredentialOffer, CredentialRequest,
        CredentialRevocationConfig, CredentialValues, RegistryType, RevocationRegistryDefinition,
        RevocationRegistryDefinitionPrivate, RevocationStatusList, SignatureType,
    },
};
use anyhow::Context;
use indy_anoncreds::{
    identifiers, ledger_data_transformer::serde_clone, registrar::IndyAnoncredsRegistrar,
    resolver::IndyAnoncredsResolver,
};
use indy_ledger::{pool::LocalPool, retry::RetryPolicy};

use crate::actor::Actor;

/// Revocation registry capacity for the demo
const MAX_CRED_NUM: u32 = 100;

pub struct Issuer {
    pub actor: Actor,
    anoncreds_registrar: IndyAnoncredsRegistrar<LocalPool>,
    anoncreds_resolver: IndyAnoncredsResolver<LocalPool>,
    issuer_data: Option<IssuerData>,
}

struct IssuerData {
    schema_id: String,
    cred_def_id: String,
    cred_def: CredentialDefinition,
    cred_def_private: CredentialDefinitionPrivate,
    correctness_proof: CredentialKeyCorrectnessProof,
    registry: Option<IssuerRegistry>,
    protocol_data: IssuerProtocolFlowData,
}

struct IssuerRegistry {
    rev_reg_def_id: String,
    rev_reg_def: RevocationRegistryDefinition,
    rev_reg_def_private: RevocationRegistryDefinitionPrivate,
    rev_list: RevocationStatusList,
    /// Next free index. Index `0` is not usable, so issuance starts at 1.
    next_cred_rev_id: u32,
}

/// lazily set data from protocol flows
#[derive(Default)]
struct IssuerProtocolFlowData {
    cred_offer: Option<CredentialOffer>,
}

/// What the issuer published for a credential definition.
#[derive(Debug, Clone)]
pub struct PublishedCredDef {
    pub cred_def_id: String,
    pub rev_reg_def_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum CredRevocationUpdateType {
    Revoke,
    Issue,
}

impl Issuer {
    pub fn bootstrap(actor: Actor, retry_policy: RetryPolicy) -> Self {
        let anoncreds_registrar =
            IndyAnoncredsRegistrar::new(actor.pool.clone(), actor.wallet.clone());
        let anoncreds_resolver = IndyAnoncredsResolver::new(actor.pool.clone(), retry_policy)
            .with_submitter(actor.did.clone());
        Self {
            actor,
            anoncreds_registrar,
            anoncreds_resolver,
            issuer_data: None,
        }
    }

    fn data(&self) -> anyhow::Result<&IssuerData> {
        self.issuer_data
            .as_ref()
            .context("issuer has no credential definition yet")
    }

    fn data_mut(&mut self) -> anyhow::Result<&mut IssuerData> {
        self.issuer_data
            .as_mut()
            .context("issuer has no credential definition yet")
    }

    /// Create a credential definition for the schema and send it to the ledger. With
    /// `tails_dir`, the definition is revocable and a registry is published alongside it.
    pub async fn publish_cred_def(
        &mut self,
        schema_id: &str,
        tag: &str,
        tails_dir: Option<&Path>,
    ) -> anyhow::Result<PublishedCredDef> {
        let actor = self.actor.name;
        let issuer_did = self.actor.did.clone();

        tracing::info!(actor, schema_id, "get schema from ledger");
        let schema = self.anoncreds_resolver.fetch_schema(schema_id).await?;
        let schema_seq_no = schema
            .seq_no
            .with_context(|| format!("schema {schema_id} has no seqNo"))?;

        tracing::info!(actor, tag, revocable = tails_dir.is_some(), "create cred def");
        let (cred_def, cred_def_private, correctness_proof) =
            anoncreds::issuer::create_credential_definition(
                schema.id.clone(),
                &schema.value,
                issuer_did.clone(),
                tag,
                SignatureType::CL,
                CredentialDefinitionConfig::new(tails_dir.is_some()),
            )?;
        let cred_def_id = identifiers::cred_def_id(&issuer_did, schema_seq_no, tag);

        tracing::info!(actor, cred_def_id = %cred_def_id, "send cred def to ledger");
        self.anoncreds_registrar
            .write_cred_def(&issuer_did, &cred_def_id, &cred_def)
            .await?;

        let registry = match tails_dir {
            Some(tails_dir) => Some(self.publish_registry(&cred_def, &cred_def_id, tag, tails_dir).await?),
            None => None,
        };
        let published = PublishedCredDef {
            cred_def_id: cred_def_id.clone(),
            rev_reg_def_id: registry.as_ref().map(|r| r.rev_reg_def_id.clone()),
        };

        self.issuer_data = Some(IssuerData {
            schema_id: schema.id,
            cred_def_id,
            cred_def,
            cred_def_private,
            correctness_proof,
            registry,
            protocol_data: Default::default(),
        });
        Ok(published)
    }

    async fn publish_registry(
        &self,
        cred_def: &CredentialDefinition,
        cred_def_id: &str,
        tag: &str,
        tails_dir: &Path,
    ) -> anyhow::Result<IssuerRegistry> {
        let actor = self.actor.name;
        let issuer_did = self.actor.did.clone();

        std::fs::create_dir_all(tails_dir)
            .with_context(|| format!("creating tails dir {}", tails_dir.display()))?;
        let mut tw = TailsFileWriter::new(Some(tails_dir.to_string_lossy().into_owned()));

        tracing::info!(actor, tag, max_cred_num = MAX_CRED_NUM, "create rev reg def");
        let (rev_reg_def, rev_reg_def_private) = anoncreds::issuer::create_revocation_registry_def(
            cred_def,
            cred_def_id.to_owned(),
            issuer_did.clone(),
            tag,
            RegistryType::CL_ACCUM,
            MAX_CRED_NUM,
            &mut tw,
        )?;
        let rev_reg_def_id = identifiers::rev_reg_def_id(&issuer_did, cred_def_id, tag);

        tracing::info!(actor, rev_reg_def_id = %rev_reg_def_id, "send rev reg def to ledger");
        self.anoncreds_registrar
            .write_rev_reg_def(&issuer_did, &rev_reg_def_id, &rev_reg_def)
            .await?;

        let rev_list = anoncreds::issuer::create_revocation_status_list(
            rev_reg_def_id.clone(),
            &rev_reg_def,
            issuer_did.clone(),
            None,
            true,
        )?;
        let (rev_list, _) = self.publish_rev_list(&rev_reg_def_id, &rev_list).await?;

        Ok(IssuerRegistry {
            rev_reg_def_id,
            rev_reg_def,
            rev_reg_def_private,
            rev_list,
            next_cred_rev_id: 1,
        })
    }

    /// Write a status list entry, wait until readers observe it, and return it stamped
    /// with its ledger time.
    async fn publish_rev_list(
        &self,
        rev_reg_def_id: &str,
        rev_list: &RevocationStatusList,
    ) -> anyhow::Result<(RevocationStatusList, u64)> {
        let written = self
            .anoncreds_registrar
            .write_rev_status_list(&self.actor.did, rev_reg_def_id, rev_list)
            .await?;
        tracing::info!(
            actor = self.actor.name,
            rev_reg_def_id,
            txn_time = written.txn_time,
            "submitted rev list entry"
        );

        self.anoncreds_resolver
            .await_rev_reg_entry(rev_reg_def_id, written.txn_time)
            .await?;

        let stamped = anoncreds::issuer::update_revocation_status_list_timestamp_only(
            written.txn_time,
            rev_list,
        );
        Ok((stamped, written.txn_time))
    }

    pub fn create_offer(&mut self) -> anyhow::Result<CredentialOffer> {
        let data = self.data_mut()?;
        tracing::info!(cred_def_id = %data.cred_def_id, "create credential offer");
        let offer = anoncreds::issuer::create_credential_offer(
            data.schema_id.clone(),
            data.cred_def_id.clone(),
            &data.correctness_proof,
        )?;

        data.protocol_data.cred_offer = Some(serde_clone(&offer)?);
        Ok(offer)
    }

    /// Issue a credential for the outstanding offer. Revocable credentials take the next
    /// free index of the registry.
    pub fn create_credential(
        &mut self,
        cred_request: &CredentialRequest,
        values: CredentialValues,
    ) -> anyhow::Result<Credential> {
        let actor = self.actor.name;
        let data = self.data_mut()?;
        let offer = data
            .protocol_data
            .cred_offer
            .as_ref()
            .context("no credential offer outstanding")?;

        let Some(registry) = data.registry.as_mut() else {
            tracing::info!(actor, "create credential");
            return Ok(anoncreds::issuer::create_credential(
                &data.cred_def,
                &data.cred_def_private,
                offer,
                cred_request,
                values,
                None,
                None,
                None,
            )?);
        };

        let cred_rev_id = registry.next_cred_rev_id;
        tracing::info!(actor, cred_rev_id, "create revocable credential");
        let tr = TailsFileReader::new_tails_reader(&registry.rev_reg_def.value.tails_location);
        let credential = anoncreds::issuer::create_credential(
            &data.cred_def,
            &data.cred_def_private,
            offer,
            cred_request,
            values,
            Some(RevocationRegistryId::new_unchecked(
                registry.rev_reg_def_id.clone(),
            )),
            Some(&registry.rev_list),
            Some(CredentialRevocationConfig {
                reg_def: &registry.rev_reg_def,
                reg_def_private: &registry.rev_reg_def_private,
                registry_idx: cred_rev_id,
                tails_reader: tr,
            }),
        )?;
        registry.next_cred_rev_id += 1;
        Ok(credential)
    }

    /// Revoke or re-issue the credential at `cred_rev_id`, returning the ledger time of
    /// the status list entry that records it.
    pub async fn update_credential_revocation(
        &mut self,
        cred_rev_id: u32,
        update_type: CredRevocationUpdateType,
    ) -> anyhow::Result<u64> {
        let registry = self
            .data()?
            .registry
            .as_ref()
            .context("credential definition is not revocable")?;

        // these are the changes to apply, not the complete list
        let update_list = BTreeSet::from([cred_rev_id]);
        let (issued_updates, revoked_updates) = match update_type {
            CredRevocationUpdateType::Issue => (Some(update_list), None),
            CredRevocationUpdateType::Revoke => (None, Some(update_list)),
        };

        tracing::info!(actor = self.actor.name, cred_rev_id, ?update_type, "update rev list");
        let new_list = anoncreds::issuer::update_revocation_status_list(
            None,
            issued_updates,
            revoked_updates,
            &registry.rev_reg_def,
            &registry.rev_list,
        )?;
        let rev_reg_def_id = registry.rev_reg_def_id.clone();
        let (new_list, timestamp) = self.publish_rev_list(&rev_reg_def_id, &new_list).await?;

        if let Some(registry) = self.data_mut()?.registry.as_mut() {
            registry.rev_list = new_list;
        }
        Ok(timestamp)
    }
}
