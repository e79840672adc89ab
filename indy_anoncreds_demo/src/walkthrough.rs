//! The Getting Started walkthrough: a steward onboards Government, Faber and Acme, Faber
//! issues Alice a transcript, and Alice uses it to apply for a job at Acme.

use std::{collections::HashMap, sync::Arc, time::Duration};

use anoncreds::types::MakeCredentialValues;
use anyhow::{ensure, Context};
use indy_ledger::{
    error::Provisioned,
    pool::{GenesisTxn, LocalPool, PoolConfig, PoolRegistry},
    requests::Role,
    wallet::WalletRegistry,
};

use crate::{
    actor::{Actor, ActorProfile},
    config::DemoConfig,
    roles::{
        government::Government,
        holder::Holder,
        issuer::{CredRevocationUpdateType, Issuer},
        steward::Steward,
        verifier::{VerificationReport, Verifier},
    },
};

const TRANSCRIPT_CRED_DEF_TAG: &str = "TAG1";

/// Pause between revocation updates so each lands in its own ledger second.
const REVOCATION_SETTLE: Duration = Duration::from_secs(2);

const TRANSCRIPT_VALUES: &[(&str, &str)] = &[
    ("first_name", "Alice"),
    ("last_name", "Garcia"),
    ("degree", "Bachelor of Science, Marketing"),
    ("status", "graduated"),
    ("ssn", "123-45-6789"),
    ("year", "2015"),
    ("average", "5"),
];

const SELF_ATTESTED: &[(&str, &str)] = &[
    ("attr1_referent", "Alice"),
    ("attr2_referent", "Garcia"),
    ("attr6_referent", "123-45-6789"),
];

const EXPECTED_REVEALED: &[(&str, &str)] = &[
    ("attr3_referent", "Bachelor of Science, Marketing"),
    ("attr4_referent", "graduated"),
    ("attr5_referent", "123-45-6789"),
];

/// What the walkthrough observed.
#[derive(Debug)]
pub struct WalkthroughOutcome {
    pub job_application: VerificationReport,
    pub revocation: Option<RevocationOutcome>,
}

#[derive(Debug)]
pub struct RevocationOutcome {
    pub cred_rev_id: u32,
    pub revoked_presentation_accepted: bool,
    pub reissued: VerificationReport,
}

async fn open_pool(config: &DemoConfig) -> anyhow::Result<Arc<LocalPool>> {
    let genesis_txns = match &config.genesis_txn_path {
        Some(path) => GenesisTxn::load_file(path)
            .with_context(|| format!("loading genesis from {}", path.display()))?,
        None => vec![GenesisTxn::steward_from_seed(&config.steward_seed)?],
    };

    let pools = PoolRegistry::new();
    let provisioned = pools.ensure_pool_ledger_config(
        &config.pool_name,
        PoolConfig {
            genesis_txns,
            replication_lag: config.replication_lag,
        },
    )?;
    if provisioned == Provisioned::AlreadyExisted {
        tracing::info!(pool = %config.pool_name, "pool ledger config already exists");
    }
    tracing::info!(pool = %config.pool_name, lag = ?config.replication_lag, "open pool ledger");
    Ok(pools.open_pool_ledger(&config.pool_name)?)
}

fn transcript_values() -> anyhow::Result<MakeCredentialValues> {
    let mut values = MakeCredentialValues::default();
    for (name, raw) in TRANSCRIPT_VALUES {
        values.add_raw(*name, *raw)?;
    }
    Ok(values)
}

fn self_attested() -> HashMap<String, String> {
    SELF_ATTESTED
        .iter()
        .map(|(referent, value)| (referent.to_string(), value.to_string()))
        .collect()
}

fn check_job_application(report: &VerificationReport) -> anyhow::Result<()> {
    for (referent, expected) in EXPECTED_REVEALED {
        let revealed = report.revealed.get(*referent).map(String::as_str);
        ensure!(
            revealed == Some(*expected),
            "{referent} revealed {revealed:?}, expected {expected:?}"
        );
    }
    for (referent, expected) in SELF_ATTESTED {
        let attested = report.self_attested.get(*referent).map(String::as_str);
        ensure!(
            attested == Some(*expected),
            "{referent} self-attested {attested:?}, expected {expected:?}"
        );
    }
    ensure!(report.valid, "job application proof did not verify");
    Ok(())
}

/// Ask Alice for a job application and check it, as of the current ledger time when
/// `non_revoked` is set. A presentation that cannot be built counts as not accepted.
async fn apply_for_job(
    acme: &mut Verifier,
    alice: &Holder,
    cred_def_id: &str,
    non_revoked: bool,
) -> anyhow::Result<Option<VerificationReport>> {
    let non_revoked_to = non_revoked.then(|| acme.actor.pool.current_time());
    let proof_request = acme.request_job_application(cred_def_id, non_revoked_to)?;

    let presentation = match alice.present(&proof_request, &self_attested()).await {
        Ok(presentation) => presentation,
        Err(e) => {
            tracing::info!(actor = alice.actor.name, "could not build presentation: {e:#}");
            return Ok(None);
        }
    };
    match acme.verify_presentation(&presentation).await {
        Ok(report) => Ok(Some(report)),
        Err(e) => {
            tracing::info!(actor = acme.actor.name, "presentation rejected: {e:#}");
            Ok(None)
        }
    }
}

pub async fn run(config: &DemoConfig) -> anyhow::Result<WalkthroughOutcome> {
    tracing::info!("Getting started -> started");

    let pool = open_pool(config).await?;
    let wallets = WalletRegistry::new();

    tracing::info!("== Getting Trust Anchor credentials - Government Onboarding ==");
    let steward = Steward::bootstrap(&wallets, pool.clone(), &config.steward_seed).await?;
    let government = steward
        .onboard_verinym(
            &ActorProfile::new("Government", "government_wallet", Some(Role::Endorser)),
            &wallets,
        )
        .await?;

    tracing::info!("== Getting Trust Anchor credentials - Faber Onboarding ==");
    let faber = steward
        .onboard_verinym(
            &ActorProfile::new("Faber", "faber_wallet", Some(Role::Endorser)),
            &wallets,
        )
        .await?;

    tracing::info!("== Getting Trust Anchor credentials - Acme Onboarding ==");
    let acme = steward
        .onboard_verinym(
            &ActorProfile::new("Acme", "acme_wallet", Some(Role::Endorser)),
            &wallets,
        )
        .await?;

    tracing::info!("== Credential Schemas Setup ==");
    let government = Government::bootstrap(government);
    let transcript_schema_id = government.publish_transcript_schema().await?;

    tracing::info!("== Faber Credential Definition Setup ==");
    let mut faber = Issuer::bootstrap(faber, config.retry_policy);
    let transcript_cred_def = faber
        .publish_cred_def(
            &transcript_schema_id,
            TRANSCRIPT_CRED_DEF_TAG,
            config.revocable.then_some(config.tails_dir.as_path()),
        )
        .await?;
    tracing::info!(
        cred_def_id = %transcript_cred_def.cred_def_id,
        rev_reg_def_id = ?transcript_cred_def.rev_reg_def_id,
        "transcript cred def published"
    );
    let cred_def_id = transcript_cred_def.cred_def_id;

    tracing::info!("== Getting Transcript with Faber ==");
    let alice = Actor::create(
        &ActorProfile::new("Alice", "alice_wallet", None),
        &wallets,
        pool.clone(),
        None,
    )
    .await?;
    let mut alice = Holder::bootstrap(alice, config.retry_policy)?;

    let transcript_cred_offer = faber.create_offer()?;
    let transcript_cred_request = alice.accept_offer(&transcript_cred_offer).await?;
    let transcript_cred = faber.create_credential(&transcript_cred_request, transcript_values()?.into())?;
    let cred_rev_id = transcript_cred.signature.extract_index();
    alice.store_credential(transcript_cred).await?;

    tracing::info!("== Apply for the job with Acme ==");
    let mut acme = Verifier::bootstrap(acme, config.retry_policy);
    let job_application = apply_for_job(&mut acme, &alice, &cred_def_id, config.revocable)
        .await?
        .context("job application was not accepted")?;
    check_job_application(&job_application)?;
    tracing::info!(actor = acme.actor.name, "job application verified");

    let revocation = if config.revocable {
        let cred_rev_id = cred_rev_id.context("revocable transcript has no revocation index")?;

        tracing::info!("== Faber revokes the transcript ==");
        faber
            .update_credential_revocation(cred_rev_id, CredRevocationUpdateType::Revoke)
            .await?;
        tokio::time::sleep(REVOCATION_SETTLE).await;
        let revoked = apply_for_job(&mut acme, &alice, &cred_def_id, true).await?;
        let revoked_presentation_accepted = revoked.is_some_and(|report| report.valid);
        ensure!(
            !revoked_presentation_accepted,
            "presentation of a revoked transcript was accepted"
        );

        tracing::info!("== Faber re-issues the transcript ==");
        faber
            .update_credential_revocation(cred_rev_id, CredRevocationUpdateType::Issue)
            .await?;
        tokio::time::sleep(REVOCATION_SETTLE).await;
        let reissued = apply_for_job(&mut acme, &alice, &cred_def_id, true)
            .await?
            .context("job application after re-issue was not accepted")?;
        check_job_application(&reissued)?;

        Some(RevocationOutcome {
            cred_rev_id,
            revoked_presentation_accepted,
            reissued,
        })
    } else {
        None
    };

    tracing::info!("Getting started -> done");
    Ok(WalkthroughOutcome {
        job_application,
        revocation,
    })
}
