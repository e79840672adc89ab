//! Prepare, submit and confirm an anchoring Payment.

use std::time::Duration;

use crate::{
    client::{TxResult, XrplClient},
    error::AnchorError,
    transaction::Payment,
};

/// How many ledgers past the current one a transaction may still be validated in.
pub const LAST_LEDGER_OFFSET: u32 = 20;

pub const SUCCESS_RESULT: &str = "tesSUCCESS";

/// The family an engine result code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineResultClass {
    /// `tes`: applied.
    Success,
    /// `ter`: not applied yet, may be retried or is queued.
    Retry,
    /// `tec`: included in a ledger and the fee claimed, but the payment failed.
    ClaimedFee,
    /// `tef`, `tel`, `tem` and anything else: not included.
    Rejected,
}

impl EngineResultClass {
    pub fn of(engine_result: &str) -> Self {
        match engine_result.get(..3) {
            Some("tes") => Self::Success,
            Some("ter") => Self::Retry,
            Some("tec") => Self::ClaimedFee,
            _ => Self::Rejected,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnchorRequest {
    pub account: String,
    pub destination: String,
    pub amount_drops: u64,
    pub fee_drops: u64,
    /// Taken from the account when not given.
    pub sequence: Option<u32>,
    pub invoice_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub hash: String,
    pub engine_result: String,
    pub class: EngineResultClass,
    pub last_ledger_sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub hash: String,
    pub ledger_index: Option<u32>,
    pub result: String,
}

pub struct Anchorer {
    client: XrplClient,
    secret: String,
    poll_interval: Duration,
}

impl Anchorer {
    pub fn new(client: XrplClient, secret: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            client,
            secret: secret.into(),
            poll_interval,
        }
    }

    /// Build the Payment, filling in the sequence and the last ledger it may land in.
    pub async fn prepare(&self, request: &AnchorRequest) -> Result<Payment, AnchorError> {
        let mut payment = Payment::new(
            &request.account,
            &request.destination,
            request.amount_drops,
            request.fee_drops,
            &request.invoice_id,
        );

        let sequence = match request.sequence {
            Some(sequence) => sequence,
            None => {
                self.client
                    .account_info(&request.account)
                    .await?
                    .account_data
                    .sequence
            }
        };
        let current = self.client.ledger_current().await?;

        payment.sequence = Some(sequence);
        payment.last_ledger_sequence = Some(current + LAST_LEDGER_OFFSET);
        tracing::info!(
            account = %payment.account,
            sequence,
            last_ledger_sequence = current + LAST_LEDGER_OFFSET,
            invoice_id = %payment.invoice_id,
            "prepared payment"
        );
        Ok(payment)
    }

    /// Submit a prepared Payment. Rejected transactions are an error; everything else
    /// may still end up in a validated ledger.
    pub async fn submit(&self, payment: &Payment) -> Result<Submitted, AnchorError> {
        let last_ledger_sequence =
            payment
                .last_ledger_sequence
                .ok_or_else(|| AnchorError::InvalidResponse {
                    method: "submit".to_owned(),
                    reason: "payment has no LastLedgerSequence".to_owned(),
                })?;

        let result = self.client.submit(payment, &self.secret).await?;
        let class = EngineResultClass::of(&result.engine_result);
        tracing::info!(
            hash = %result.tx_json.hash,
            engine_result = %result.engine_result,
            ?class,
            "submitted payment"
        );

        match class {
            EngineResultClass::Rejected => {
                return Err(AnchorError::Rejected {
                    engine_result: result.engine_result,
                    message: result.engine_result_message,
                });
            }
            EngineResultClass::ClaimedFee => tracing::warn!(
                hash = %result.tx_json.hash,
                engine_result = %result.engine_result,
                message = %result.engine_result_message,
                "payment failed provisionally, the fee is claimed if it is validated"
            ),
            EngineResultClass::Success | EngineResultClass::Retry => {}
        }
        Ok(Submitted {
            hash: result.tx_json.hash,
            engine_result: result.engine_result,
            class,
            last_ledger_sequence,
        })
    }

    /// Poll until the transaction is in a validated ledger, or until a validated ledger
    /// past its `LastLedgerSequence` no longer holds it.
    pub async fn wait_for_validation(&self, submitted: &Submitted) -> Result<Validated, AnchorError> {
        loop {
            if let Some(tx) = self.client.tx(&submitted.hash).await? {
                if tx.validated {
                    return validated(tx);
                }
            }

            // the open ledger can pass LastLedgerSequence while that ledger awaits validation
            let validated_index = self.client.validated_ledger_index().await?;
            if validated_index > submitted.last_ledger_sequence {
                return Err(AnchorError::Expired {
                    hash: submitted.hash.clone(),
                    last_ledger_sequence: submitted.last_ledger_sequence,
                });
            }
            tracing::debug!(hash = %submitted.hash, validated_index, "waiting for validation");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Prepare and submit, then wait for validation when `wait` is set.
    pub async fn anchor(
        &self,
        request: &AnchorRequest,
        wait: bool,
    ) -> Result<(Submitted, Option<Validated>), AnchorError> {
        let payment = self.prepare(request).await?;
        let submitted = self.submit(&payment).await?;
        if !wait {
            return Ok((submitted, None));
        }
        let validated = self.wait_for_validation(&submitted).await?;
        Ok((submitted, Some(validated)))
    }
}

fn validated(tx: TxResult) -> Result<Validated, AnchorError> {
    let result = tx
        .meta
        .map(|meta| meta.transaction_result)
        .ok_or_else(|| AnchorError::InvalidResponse {
            method: "tx".to_owned(),
            reason: "validated transaction has no meta".to_owned(),
        })?;
    if result != SUCCESS_RESULT {
        return Err(AnchorError::Failed {
            hash: tx.hash,
            result,
        });
    }
    Ok(Validated {
        hash: tx.hash,
        ledger_index: tx.ledger_index,
        result,
    })
}
