use std::collections::HashMap;

use anoncreds::types::{
    Credential, CredentialOffer, CredentialRequest, CredentialRequestMetadata, LinkSecret,
    PresentCredentials, Presentation, PresentationRequest,
};
use anyhow::Context;
use indy_anoncreds::{
    aggregation::{prover_get_entities_from_ledger, IdentifierRecord},
    credential_store::{CredentialInfo, CredentialStore},
    resolver::IndyAnoncredsResolver,
};
use indy_ledger::{pool::LocalPool, retry::RetryPolicy};
use serde_json::Value;

use crate::actor::Actor;

const LINK_SECRET_ID: &str = "main";

pub struct Holder {
    pub actor: Actor,
    anoncreds_resolver: IndyAnoncredsResolver<LocalPool>,
    credential_store: CredentialStore,
    link_secret: LinkSecret,
    protocol_data: HolderProtocolFlowData,
}

#[derive(Default)]
struct HolderProtocolFlowData {
    request_metadata: Option<CredentialRequestMetadata>,
}

/// Which referents of a proof request are answered from credentials, and how.
struct Selection {
    credential: CredentialInfo,
    attributes: Vec<(String, bool)>,
    predicates: Vec<String>,
}

impl Holder {
    pub fn bootstrap(actor: Actor, retry_policy: RetryPolicy) -> anyhow::Result<Self> {
        let link_secret = anoncreds::prover::create_link_secret()?;
        let anoncreds_resolver = IndyAnoncredsResolver::new(actor.pool.clone(), retry_policy)
            .with_submitter(actor.did.clone());
        let credential_store = CredentialStore::new(actor.wallet.clone());

        Ok(Self {
            actor,
            anoncreds_resolver,
            credential_store,
            link_secret,
            protocol_data: Default::default(),
        })
    }

    pub async fn accept_offer(
        &mut self,
        cred_offer: &CredentialOffer,
    ) -> anyhow::Result<CredentialRequest> {
        tracing::info!(actor = self.actor.name, cred_def_id = %cred_offer.cred_def_id.0, "get cred def from ledger");
        let cred_def = self
            .anoncreds_resolver
            .fetch_cred_def(&cred_offer.cred_def_id.0)
            .await?;

        tracing::info!(actor = self.actor.name, "create credential request");
        let (cred_request, cred_request_metadata) = anoncreds::prover::create_credential_request(
            Some(self.actor.did.as_str()),
            None,
            &cred_def.value,
            &self.link_secret,
            LINK_SECRET_ID,
            cred_offer,
        )?;

        self.protocol_data.request_metadata = Some(cred_request_metadata);
        Ok(cred_request)
    }

    /// Process an issued credential against the outstanding request and keep it in the
    /// wallet, returning its referent.
    pub async fn store_credential(&mut self, mut credential: Credential) -> anyhow::Result<String> {
        let request_metadata = self
            .protocol_data
            .request_metadata
            .take()
            .context("no credential request outstanding")?;

        let cred_def = self
            .anoncreds_resolver
            .fetch_cred_def(&credential.cred_def_id.0)
            .await?;
        let rev_reg_def = match &credential.rev_reg_id {
            Some(rev_reg_id) => Some(self.anoncreds_resolver.fetch_rev_reg_def(&rev_reg_id.0).await?),
            None => None,
        };

        anoncreds::prover::process_credential(
            &mut credential,
            &request_metadata,
            &self.link_secret,
            &cred_def.value,
            rev_reg_def.as_ref().map(|def| &def.value),
        )?;

        tracing::info!(actor = self.actor.name, "store credential");
        Ok(self.credential_store.store_credential(&credential).await?)
    }

    /// Answer a proof request from stored credentials. Referents listed in
    /// `self_attested` are answered with the given values; everything else is revealed
    /// from the first matching credential.
    pub async fn present(
        &self,
        presentation_request: &PresentationRequest,
        self_attested: &HashMap<String, String>,
    ) -> anyhow::Result<Presentation> {
        let actor = self.actor.name;
        let request = serde_json::to_value(presentation_request)?;

        tracing::info!(actor, "search credentials for proof request");
        let search = self
            .credential_store
            .search_for_proof_request(presentation_request)
            .await?;

        let mut selections: HashMap<String, Selection> = HashMap::new();
        let mut select = |referent: &str| -> anyhow::Result<String> {
            let credential = search.first_for_referent(referent)?;
            let key = credential.referent.clone();
            selections.entry(key.clone()).or_insert_with(|| Selection {
                credential,
                attributes: Vec::new(),
                predicates: Vec::new(),
            });
            Ok(key)
        };

        let mut picks = Vec::new();
        for referent in referents(&request, "requested_attributes") {
            if self_attested.contains_key(&referent) {
                continue;
            }
            picks.push((select(&referent)?, referent, true));
        }
        for referent in referents(&request, "requested_predicates") {
            picks.push((select(&referent)?, referent, false));
        }
        for (key, referent, is_attribute) in picks {
            if let Some(selection) = selections.get_mut(&key) {
                if is_attribute {
                    selection.attributes.push((referent, true));
                } else {
                    selection.predicates.push(referent);
                }
            }
        }

        // revocation is only proven when the request asks for an interval
        let non_revoked = &request["non_revoked"];
        let wants_non_revoked = non_revoked.is_object();
        let identifiers: HashMap<String, IdentifierRecord> = selections
            .iter()
            .map(|(key, selection)| {
                let mut record = IdentifierRecord::from(&selection.credential);
                if !wants_non_revoked {
                    record.rev_reg_id = None;
                    record.cred_rev_id = None;
                }
                (key.clone(), record)
            })
            .collect();

        let entities = prover_get_entities_from_ledger(
            &self.anoncreds_resolver,
            &identifiers,
            actor,
            non_revoked["from"].as_u64(),
            non_revoked["to"].as_u64(),
        )
        .await?;

        let mut credentials: HashMap<String, Credential> = HashMap::new();
        for key in selections.keys() {
            credentials.insert(key.clone(), self.credential_store.get_credential(key).await?);
        }

        let mut creds_to_present = PresentCredentials::default();
        for (key, selection) in &selections {
            let credential = &credentials[key];
            let rev_state = identifiers[key]
                .rev_reg_id
                .as_deref()
                .and_then(|rev_reg_id| entities.rev_state(rev_reg_id));

            let mut added_cred = match rev_state {
                Some((timestamp, state)) => {
                    creds_to_present.add_credential(credential, Some(timestamp), Some(state))
                }
                None => creds_to_present.add_credential(credential, None, None),
            };
            for (referent, revealed) in &selection.attributes {
                added_cred.add_requested_attribute(referent.clone(), *revealed);
            }
            for referent in &selection.predicates {
                added_cred.add_requested_predicate(referent.clone());
            }
        }

        tracing::info!(actor, credentials = selections.len(), self_attested = self_attested.len(), "create presentation");
        Ok(anoncreds::prover::create_presentation(
            presentation_request,
            creds_to_present,
            Some(self_attested.clone()),
            &self.link_secret,
            &entities.schemas_by_ref(),
            &entities.cred_defs_by_ref(),
        )?)
    }
}

fn referents(request: &Value, section: &str) -> Vec<String> {
    request[section]
        .as_object()
        .map(|referents| referents.keys().cloned().collect())
        .unwrap_or_default()
}
