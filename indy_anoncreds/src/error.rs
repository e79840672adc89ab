use indy_ledger::error::{LedgerError, WalletError};

#[derive(Debug, thiserror::Error)]
pub enum AnoncredsLedgerError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("anoncreds error: {0}")]
    Anoncreds(#[from] anoncreds::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("identifier for registry {rev_reg_id} carries no cred_rev_id")]
    MissingCredRevId { rev_reg_id: String },

    #[error("identifier for registry {rev_reg_id} carries no timestamp")]
    MissingTimestamp { rev_reg_id: String },

    #[error("tails file not found: {0}")]
    TailsNotFound(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("credential not found: {0}")]
    CredentialNotFound(String),
}
