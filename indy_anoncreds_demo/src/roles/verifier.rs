use std::collections::HashMap;

use anoncreds::types::{Presentation, PresentationRequest};
use anyhow::Context;
use indy_anoncreds::{
    aggregation::{verifier_get_entities_from_ledger, IdentifierRecord},
    resolver::IndyAnoncredsResolver,
};
use indy_ledger::{pool::LocalPool, retry::RetryPolicy};
use serde_json::{json, Value};

use crate::actor::Actor;

pub struct Verifier {
    pub actor: Actor,
    anoncreds_resolver: IndyAnoncredsResolver<LocalPool>,
    protocol_data: VerifierProtocolFlowData,
}

#[derive(Default)]
struct VerifierProtocolFlowData {
    proof_request: Option<PresentationRequest>,
}

/// Outcome of checking a presentation, with the values it disclosed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub valid: bool,
    /// referent -> raw revealed value
    pub revealed: HashMap<String, String>,
    /// referent -> self-attested value
    pub self_attested: HashMap<String, String>,
}

impl Verifier {
    pub fn bootstrap(actor: Actor, retry_policy: RetryPolicy) -> Self {
        let anoncreds_resolver = IndyAnoncredsResolver::new(actor.pool.clone(), retry_policy)
            .with_submitter(actor.did.clone());
        Self {
            actor,
            anoncreds_resolver,
            protocol_data: Default::default(),
        }
    }

    /// Build the Job-Application proof request. Transcript attributes and the average
    /// predicate are restricted to `cred_def_id`; with `non_revoked_to`, the credential
    /// must also be unrevoked as of that ledger time.
    pub fn request_job_application(
        &mut self,
        cred_def_id: &str,
        non_revoked_to: Option<u64>,
    ) -> anyhow::Result<PresentationRequest> {
        let nonce = anoncreds::verifier::generate_nonce()?;
        let restrictions = json!([{ "cred_def_id": cred_def_id }]);

        let mut proof_req_raw = json!({
            "nonce": nonce,
            "name": "Job-Application",
            "version": "0.1",
            "requested_attributes": {
                "attr1_referent": { "name": "first_name" },
                "attr2_referent": { "name": "last_name" },
                "attr3_referent": { "name": "degree", "restrictions": restrictions },
                "attr4_referent": { "name": "status", "restrictions": restrictions },
                "attr5_referent": { "name": "ssn", "restrictions": restrictions },
                "attr6_referent": { "name": "phone_number" },
            },
            "requested_predicates": {
                "predicate1_referent": {
                    "name": "average",
                    "p_type": ">=",
                    "p_value": 4,
                    "restrictions": restrictions,
                },
            },
        });
        if let Some(to) = non_revoked_to {
            proof_req_raw["non_revoked"] = json!({ "to": to });
        }

        tracing::info!(actor = self.actor.name, ?non_revoked_to, "create \"Job-Application\" proof request");
        self.protocol_data.proof_request = Some(serde_json::from_value(proof_req_raw.clone())?);
        Ok(serde_json::from_value(proof_req_raw)?)
    }

    /// Verify a presentation against the outstanding proof request.
    ///
    /// Registry snapshots are read as of the timestamp the prover presented for each
    /// credential.
    pub async fn verify_presentation(
        &self,
        presentation: &Presentation,
    ) -> anyhow::Result<VerificationReport> {
        let actor = self.actor.name;
        let proof_request = self
            .protocol_data
            .proof_request
            .as_ref()
            .context("no proof request outstanding")?;

        let presentation_json = serde_json::to_value(presentation)?;
        let identifiers: Vec<IdentifierRecord> =
            serde_json::from_value(presentation_json["identifiers"].clone())?;

        let entities =
            verifier_get_entities_from_ledger(&self.anoncreds_resolver, &identifiers, actor, None)
                .await?;
        let rev_reg_defs = entities.rev_reg_defs_by_ref();
        let (rev_reg_defs, status_lists) = if rev_reg_defs.is_empty() {
            (None, None)
        } else {
            (Some(&rev_reg_defs), Some(entities.status_lists()))
        };

        tracing::info!(actor, credentials = identifiers.len(), "verify proof");
        let valid = anoncreds::verifier::verify_presentation(
            presentation,
            proof_request,
            &entities.schemas_by_ref(),
            &entities.cred_defs_by_ref(),
            rev_reg_defs,
            status_lists,
            None,
        )?;

        let requested_proof = &presentation_json["requested_proof"];
        Ok(VerificationReport {
            valid,
            revealed: string_map(&requested_proof["revealed_attrs"], |attr| attr["raw"].as_str()),
            self_attested: string_map(&requested_proof["self_attested_attrs"], Value::as_str),
        })
    }
}

fn string_map<'a>(
    section: &'a Value,
    extract: impl Fn(&'a Value) -> Option<&'a str>,
) -> HashMap<String, String> {
    section
        .as_object()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(referent, value)| {
                    extract(value).map(|raw| (referent.clone(), raw.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default()
}
