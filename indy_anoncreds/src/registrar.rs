use std::sync::Arc;

use anoncreds::{
    data_types::{cred_def::CredentialDefinition, schema::Schema},
    types::{RevocationRegistryDefinition, RevocationStatusList},
};
use indy_ledger::{
    ledger::{sign_and_submit_request, Ledger},
    requests::{
        build_cred_def_request, build_revoc_reg_def_request, build_revoc_reg_entry_request,
        build_schema_request, LedgerRequest,
    },
    responses::LedgerReply,
    wallet::Wallet,
};

use crate::{error::AnoncredsLedgerError, ledger_data_transformer::LedgerDataTransformer};

/// Where a write landed on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenEntity {
    pub id: String,
    pub seq_no: u64,
    pub txn_time: u64,
}

impl WrittenEntity {
    fn from_reply(reply: &LedgerReply) -> Result<Self, AnoncredsLedgerError> {
        let missing = |field: &str| {
            indy_ledger::error::LedgerError::InvalidReply(format!("write reply has no {field}"))
        };
        Ok(Self {
            id: reply.result.id.clone().ok_or_else(|| missing("id"))?,
            seq_no: reply.result.seq_no.ok_or_else(|| missing("seqNo"))?,
            txn_time: reply.result.txn_time.ok_or_else(|| missing("txnTime"))?,
        })
    }
}

/// Writes anoncreds objects to the ledger as signed transactions from the issuer's wallet.
pub struct IndyAnoncredsRegistrar<L: ?Sized> {
    ledger: Arc<L>,
    wallet: Wallet,
}

impl<L> IndyAnoncredsRegistrar<L>
where
    L: Ledger + ?Sized,
{
    pub fn new(ledger: Arc<L>, wallet: Wallet) -> Self {
        Self { ledger, wallet }
    }

    pub async fn write_schema(
        &self,
        issuer_did: &str,
        schema_id: &str,
        schema: &Schema,
    ) -> Result<WrittenEntity, AnoncredsLedgerError> {
        let request = build_schema_request(issuer_did, schema_id, schema.to_ledger_data()?);
        self.submit(issuer_did, request).await
    }

    pub async fn write_cred_def(
        &self,
        issuer_did: &str,
        cred_def_id: &str,
        cred_def: &CredentialDefinition,
    ) -> Result<WrittenEntity, AnoncredsLedgerError> {
        let request = build_cred_def_request(issuer_did, cred_def_id, cred_def.to_ledger_data()?);
        self.submit(issuer_did, request).await
    }

    pub async fn write_rev_reg_def(
        &self,
        issuer_did: &str,
        rev_reg_def_id: &str,
        rev_reg_def: &RevocationRegistryDefinition,
    ) -> Result<WrittenEntity, AnoncredsLedgerError> {
        let request = build_revoc_reg_def_request(
            issuer_did,
            rev_reg_def_id,
            &rev_reg_def.cred_def_id.0,
            rev_reg_def.to_ledger_data()?,
        );
        self.submit(issuer_did, request).await
    }

    /// Append a status list entry to a registry. The entry's `txn_time` is the timestamp
    /// readers will see it under.
    pub async fn write_rev_status_list(
        &self,
        issuer_did: &str,
        rev_reg_def_id: &str,
        rev_list: &RevocationStatusList,
    ) -> Result<WrittenEntity, AnoncredsLedgerError> {
        let request =
            build_revoc_reg_entry_request(issuer_did, rev_reg_def_id, rev_list.to_ledger_data()?);
        self.submit(issuer_did, request).await
    }

    async fn submit(
        &self,
        issuer_did: &str,
        request: LedgerRequest,
    ) -> Result<WrittenEntity, AnoncredsLedgerError> {
        let txn = request.operation.txn_name();
        let reply =
            sign_and_submit_request(self.ledger.as_ref(), &self.wallet, issuer_did, request).await?;
        let written = WrittenEntity::from_reply(&reply)?;
        tracing::info!(
            issuer = issuer_did,
            txn,
            id = %written.id,
            seq_no = written.seq_no,
            "anoncreds object written"
        );
        Ok(written)
    }
}
