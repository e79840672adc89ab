/// Errors raised by ledger pools, requests and replies.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("pool ledger config already exists: {0}")]
    PoolAlreadyExists(String),

    #[error("pool ledger config not found: {0}")]
    PoolNotFound(String),

    #[error("ledger read still unsatisfied after {attempts} attempts")]
    ReadExhausted { attempts: u32 },

    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(&'static str),

    #[error("request from {submitter} is not authorized: {reason}")]
    Unauthorized { submitter: String, reason: String },

    #[error("request rejected by the ledger: {0}")]
    Rejected(String),

    #[error("invalid ledger reply: {0}")]
    InvalidReply(String),

    #[error("invalid genesis transactions: {0}")]
    InvalidGenesis(String),

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by wallet storage and key management.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("wallet already exists: {0}")]
    AlreadyExists(String),

    #[error("wallet not found: {0}")]
    NotFound(String),

    #[error("access denied to wallet: {0}")]
    AccessDenied(String),

    #[error("DID not found in wallet: {0}")]
    DidNotFound(String),

    #[error("DID already stored in wallet: {0}")]
    DuplicateDid(String),

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("record not found: {record_type}/{id}")]
    RecordNotFound { record_type: String, id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outcome of an idempotent provisioning call (wallet or pool config creation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExisted,
}

impl Provisioned {
    /// Fold a wallet creation result, keeping `AlreadyExists` non-fatal.
    pub fn from_wallet_result(result: Result<(), WalletError>) -> Result<Self, WalletError> {
        match result {
            Ok(()) => Ok(Provisioned::Created),
            Err(WalletError::AlreadyExists(_)) => Ok(Provisioned::AlreadyExisted),
            Err(e) => Err(e),
        }
    }

    /// Fold a pool config creation result, keeping `PoolAlreadyExists` non-fatal.
    pub fn from_pool_result(result: Result<(), LedgerError>) -> Result<Self, LedgerError> {
        match result {
            Ok(()) => Ok(Provisioned::Created),
            Err(LedgerError::PoolAlreadyExists(_)) => Ok(Provisioned::AlreadyExisted),
            Err(e) => Err(e),
        }
    }
}
