use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use indy_ledger::retry::{RetryPolicy, DEFAULT_READ_ATTEMPTS, DEFAULT_READ_DELAY};

const POOL_NAME_ENV_VAR: &str = "POOL_NAME";
const STEWARD_SEED_ENV_VAR: &str = "STEWARD_SEED";
const GENESIS_TXN_PATH_ENV_VAR: &str = "GENESIS_TXN_PATH";
const REPLICATION_LAG_MS_ENV_VAR: &str = "LEDGER_REPLICATION_LAG_MS";
const READ_ATTEMPTS_ENV_VAR: &str = "LEDGER_READ_ATTEMPTS";
const READ_DELAY_MS_ENV_VAR: &str = "LEDGER_READ_DELAY_MS";
const READ_BACKOFF_ENV_VAR: &str = "LEDGER_READ_BACKOFF";
const TAILS_DIR_ENV_VAR: &str = "TAILS_DIR";
const REVOCABLE_ENV_VAR: &str = "REVOCABLE_TRANSCRIPT";

const DEFAULT_POOL_NAME: &str = "pool1";
const DEFAULT_STEWARD_SEED: &str = "000000000000000000000000Steward1";
const DEFAULT_REPLICATION_LAG: Duration = Duration::from_millis(1500);
const DEFAULT_TAILS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tails");

/// Exponential backoff doubles the delay per attempt, up to this cap.
const EXPONENTIAL_BACKOFF_FACTOR: u32 = 2;
const EXPONENTIAL_BACKOFF_CAP: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub pool_name: String,
    pub steward_seed: String,
    /// JSON-lines genesis file. Without one, genesis holds just the steward.
    pub genesis_txn_path: Option<PathBuf>,
    pub replication_lag: Duration,
    pub retry_policy: RetryPolicy,
    pub tails_dir: PathBuf,
    /// Issue the transcript from a revocable cred def, and run the revocation steps.
    pub revocable: bool,
}

impl DemoConfig {
    /// load from env, else local
    pub fn load() -> Self {
        match Self::try_from_env() {
            Ok(c) => {
                tracing::info!("loaded config from env");
                c
            }
            Err(e) => {
                tracing::warn!("failed to load config from env: {e:#}");
                tracing::info!("loading local config");
                Self::local()
            }
        }
    }

    pub fn local() -> Self {
        Self {
            pool_name: DEFAULT_POOL_NAME.to_owned(),
            steward_seed: DEFAULT_STEWARD_SEED.to_owned(),
            genesis_txn_path: None,
            replication_lag: DEFAULT_REPLICATION_LAG,
            retry_policy: RetryPolicy::default(),
            tails_dir: PathBuf::from(DEFAULT_TAILS_DIR),
            revocable: false,
        }
    }

    fn try_from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        let local = Self::local();

        let attempts = parse_var(READ_ATTEMPTS_ENV_VAR)?.unwrap_or(DEFAULT_READ_ATTEMPTS);
        let delay = parse_var(READ_DELAY_MS_ENV_VAR)?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_READ_DELAY);
        let retry_policy = match var(READ_BACKOFF_ENV_VAR).as_deref() {
            None | Some("fixed") => RetryPolicy::fixed(attempts, delay),
            Some("exponential") => RetryPolicy::exponential(
                attempts,
                delay,
                EXPONENTIAL_BACKOFF_FACTOR,
                EXPONENTIAL_BACKOFF_CAP,
            ),
            Some(other) => bail!("{READ_BACKOFF_ENV_VAR} must be fixed or exponential, got {other}"),
        };
        retry_policy.validate()?;

        Ok(Self {
            pool_name: var(POOL_NAME_ENV_VAR).unwrap_or(local.pool_name),
            steward_seed: var(STEWARD_SEED_ENV_VAR).unwrap_or(local.steward_seed),
            genesis_txn_path: var(GENESIS_TXN_PATH_ENV_VAR).map(PathBuf::from),
            replication_lag: parse_var(REPLICATION_LAG_MS_ENV_VAR)?
                .map(Duration::from_millis)
                .unwrap_or(local.replication_lag),
            retry_policy,
            tails_dir: var(TAILS_DIR_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or(local.tails_dir),
            revocable: parse_var(REVOCABLE_ENV_VAR)?.unwrap_or(local.revocable),
        })
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(name)
        .map(|v| v.parse::<T>().with_context(|| format!("invalid {name}: {v}")))
        .transpose()
}
