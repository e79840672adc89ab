use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::LedgerError, requests::LedgerRequest, responses::LedgerReply, wallet::Wallet,
};

/// A ledger that accepts requests and answers with replies.
///
/// Writes are expected to be signed (see [sign_and_submit_request]); reads are not.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn submit_request(&self, request: &LedgerRequest) -> Result<LedgerReply, LedgerError>;
}

#[async_trait]
impl<L> Ledger for Arc<L>
where
    L: Ledger + ?Sized,
{
    async fn submit_request(&self, request: &LedgerRequest) -> Result<LedgerReply, LedgerError> {
        (**self).submit_request(request).await
    }
}

/// Sign `request` with the submitter's key from `wallet`, then submit it.
pub async fn sign_and_submit_request<L>(
    ledger: &L,
    wallet: &Wallet,
    submitter_did: &str,
    mut request: LedgerRequest,
) -> Result<LedgerReply, LedgerError>
where
    L: Ledger + ?Sized,
{
    request.identifier = Some(submitter_did.to_owned());
    request.signature = None;
    let signature = wallet
        .sign(submitter_did, &request.signature_input()?)
        .await?;
    request.signature = Some(signature);

    tracing::debug!(
        submitter = submitter_did,
        txn = request.operation.txn_name(),
        "submitting signed request"
    );
    ledger.submit_request(&request).await
}
