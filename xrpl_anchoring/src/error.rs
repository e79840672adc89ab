#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    #[error("invalid JSON-RPC endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("{method} request failed: {source}")]
    Http {
        method: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} returned {error}: {message}")]
    Rpc {
        method: String,
        error: String,
        message: String,
    },
    #[error("{method} returned an unexpected response: {reason}")]
    InvalidResponse { method: String, reason: String },
    #[error("transaction rejected with {engine_result}: {message}")]
    Rejected {
        engine_result: String,
        message: String,
    },
    #[error("transaction {hash} was validated with {result}")]
    Failed { hash: String, result: String },
    #[error("transaction {hash} expired: not validated by ledger {last_ledger_sequence}")]
    Expired {
        hash: String,
        last_ledger_sequence: u32,
    },
    #[error("credentials file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
