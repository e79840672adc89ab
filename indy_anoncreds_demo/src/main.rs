mod actor;
mod config;
mod roles;
mod walkthrough;

use tracing_subscriber::EnvFilter;

use crate::config::DemoConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = DemoConfig::load();
    let outcome = walkthrough::run(&config).await?;

    tracing::info!(
        valid = outcome.job_application.valid,
        revealed = outcome.job_application.revealed.len(),
        self_attested = outcome.job_application.self_attested.len(),
        "job application accepted"
    );
    if let Some(revocation) = outcome.revocation {
        tracing::info!(
            cred_rev_id = revocation.cred_rev_id,
            revoked_accepted = revocation.revoked_presentation_accepted,
            reissued_valid = revocation.reissued.valid,
            "revocation round trip completed"
        );
    }
    Ok(())
}
