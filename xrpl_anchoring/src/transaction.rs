use serde::{Deserialize, Serialize};

/// Drops per XRP.
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// A Payment as submitted in `tx_json`. Amounts and fees are in drops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payment {
    pub transaction_type: String,
    pub account: String,
    pub destination: String,
    pub amount: String,
    pub fee: String,
    #[serde(rename = "InvoiceID")]
    pub invoice_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ledger_sequence: Option<u32>,
}

impl Payment {
    pub fn new(
        account: impl Into<String>,
        destination: impl Into<String>,
        amount_drops: u64,
        fee_drops: u64,
        invoice_id: impl Into<String>,
    ) -> Self {
        Self {
            transaction_type: "Payment".to_owned(),
            account: account.into(),
            destination: destination.into(),
            amount: amount_drops.to_string(),
            fee: fee_drops.to_string(),
            invoice_id: invoice_id.into(),
            sequence: None,
            last_ledger_sequence: None,
        }
    }
}
