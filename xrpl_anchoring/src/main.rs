use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xrpl_anchoring::{
    anchor::{AnchorRequest, Anchorer, EngineResultClass},
    client::XrplClient,
    digest::{invoice_id, load_credentials},
    transaction::DROPS_PER_XRP,
};

/// Anchor a credential document on the XRP Ledger as the InvoiceID of a Payment.
#[derive(Parser, Debug)]
#[command(name = "xrpl_anchoring", version, about, long_about = None)]
struct Cli {
    /// JSON-RPC endpoint of a rippled server
    #[arg(long, env = "XRPL_RPC_URL", default_value = "https://s.altnet.rippletest.net:51234/")]
    rpc_url: String,

    /// Sending account
    #[arg(long, env = "XRPL_ACCOUNT", default_value = "raBiQyQUWvGiUEt8YW9ThW2WdnM8rajFL3")]
    account: String,

    #[arg(long, env = "XRPL_DESTINATION", default_value = "rBjFFJkrfTvTwSzJGSTw45iGKjxxtoFXGc")]
    destination: String,

    /// Secret seed of the sending account, used by the server to sign
    #[arg(long, env = "XRPL_SEED", hide_env_values = true)]
    seed: String,

    /// Account sequence to use instead of the one reported by the server
    #[arg(long, env = "XRPL_SEQUENCE")]
    sequence: Option<u32>,

    #[arg(long, default_value_t = DROPS_PER_XRP)]
    amount_drops: u64,

    #[arg(long, default_value_t = 12)]
    fee_drops: u64,

    /// JSON document to anchor. Defaults to a demo credential.
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Wait until the payment is in a validated ledger
    #[arg(long)]
    wait: bool,

    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let credentials = load_credentials(cli.credentials.as_deref())
        .context("loading credentials to anchor")?;
    let invoice_id = invoice_id(&credentials)?;
    tracing::info!(invoice_id = %invoice_id, "hashed credentials");

    let client = XrplClient::new(&cli.rpc_url)?;
    tracing::info!(url = %client.url(), "using JSON-RPC endpoint");
    let anchorer = Anchorer::new(client, cli.seed, Duration::from_millis(cli.poll_interval_ms));

    let request = AnchorRequest {
        account: cli.account,
        destination: cli.destination,
        amount_drops: cli.amount_drops,
        fee_drops: cli.fee_drops,
        sequence: cli.sequence,
        invoice_id,
    };
    let (submitted, validated) = anchorer.anchor(&request, cli.wait).await?;

    tracing::info!(
        hash = %submitted.hash,
        engine_result = %submitted.engine_result,
        class = ?submitted.class,
        "payment submitted"
    );
    anyhow::ensure!(
        validated.is_some() || submitted.class != EngineResultClass::ClaimedFee,
        "payment {} failed with {}",
        submitted.hash,
        submitted.engine_result
    );
    if let Some(validated) = validated {
        tracing::info!(
            hash = %validated.hash,
            ledger_index = ?validated.ledger_index,
            result = %validated.result,
            "payment validated"
        );
    }
    Ok(())
}
