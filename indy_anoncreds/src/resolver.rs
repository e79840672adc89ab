use std::sync::Arc;

use anoncreds::{
    data_types::{cred_def::CredentialDefinition, schema::Schema},
    types::{RevocationRegistryDefinition, RevocationStatusList},
};
use indy_ledger::{
    ledger::Ledger,
    requests::{
        build_get_cred_def_request, build_get_revoc_reg_def_request,
        build_get_revoc_reg_delta_request, build_get_revoc_reg_request, build_get_schema_request,
        LedgerRequest,
    },
    responses::{
        parse_get_cred_def_response, parse_get_revoc_reg_def_response,
        parse_get_revoc_reg_delta_response, parse_get_revoc_reg_response,
        parse_get_schema_response, LedgerObject, LedgerReply,
    },
    retry::{ensure_previous_request_applied, RetryPolicy},
};

use crate::{error::AnoncredsLedgerError, ledger_data_transformer::LedgerDataTransformer};

/// A decoded ledger object, keyed by the id the ledger reported for it.
#[derive(Debug)]
pub struct Resolved<T> {
    pub id: String,
    pub value: T,
    pub seq_no: Option<u64>,
    pub txn_time: Option<u64>,
}

impl<T: LedgerDataTransformer> Resolved<T> {
    fn decode(object: LedgerObject) -> Result<Self, AnoncredsLedgerError> {
        Ok(Self {
            value: T::from_ledger_data(object.data)?,
            id: object.id,
            seq_no: object.seq_no,
            txn_time: object.txn_time,
        })
    }
}

/// A status list as of some ledger time, stamped with the time of the entry it came from.
#[derive(Debug)]
pub struct ResolvedStatusList {
    pub rev_reg_id: String,
    pub status_list: RevocationStatusList,
    pub timestamp: u64,
}

/// Reads anoncreds objects from the ledger, waiting out replication lag.
pub struct IndyAnoncredsResolver<L: ?Sized> {
    ledger: Arc<L>,
    submitter_did: Option<String>,
    retry_policy: RetryPolicy,
}

impl<L> IndyAnoncredsResolver<L>
where
    L: Ledger + ?Sized,
{
    pub fn new(ledger: Arc<L>, retry_policy: RetryPolicy) -> Self {
        Self {
            ledger,
            submitter_did: None,
            retry_policy,
        }
    }

    /// Attach a submitter DID to every read this resolver sends.
    pub fn with_submitter(mut self, submitter_did: impl Into<String>) -> Self {
        self.submitter_did = Some(submitter_did.into());
        self
    }

    fn submitter(&self) -> Option<&str> {
        self.submitter_did.as_deref()
    }

    async fn read(&self, request: LedgerRequest) -> Result<LedgerReply, AnoncredsLedgerError> {
        self.read_until(request, LedgerReply::has_data).await
    }

    async fn read_until<F>(
        &self,
        request: LedgerRequest,
        checker: F,
    ) -> Result<LedgerReply, AnoncredsLedgerError>
    where
        F: Fn(&LedgerReply) -> bool,
    {
        Ok(ensure_previous_request_applied(
            self.ledger.as_ref(),
            &request,
            &self.retry_policy,
            checker,
        )
        .await?)
    }

    pub async fn fetch_schema(&self, schema_id: &str) -> Result<Resolved<Schema>, AnoncredsLedgerError> {
        tracing::debug!(schema_id, "fetching schema");
        let reply = self
            .read(build_get_schema_request(self.submitter(), schema_id))
            .await?;
        Resolved::decode(parse_get_schema_response(&reply)?)
    }

    pub async fn fetch_cred_def(
        &self,
        cred_def_id: &str,
    ) -> Result<Resolved<CredentialDefinition>, AnoncredsLedgerError> {
        tracing::debug!(cred_def_id, "fetching cred def");
        let reply = self
            .read(build_get_cred_def_request(self.submitter(), cred_def_id))
            .await?;
        Resolved::decode(parse_get_cred_def_response(&reply)?)
    }

    pub async fn fetch_rev_reg_def(
        &self,
        rev_reg_def_id: &str,
    ) -> Result<Resolved<RevocationRegistryDefinition>, AnoncredsLedgerError> {
        tracing::debug!(rev_reg_def_id, "fetching rev reg def");
        let reply = self
            .read(build_get_revoc_reg_def_request(self.submitter(), rev_reg_def_id))
            .await?;
        Resolved::decode(parse_get_revoc_reg_def_response(&reply)?)
    }

    /// The registry's status list as of `timestamp_to`. With `timestamp_from`, the ledger
    /// also reports which indices changed since then.
    pub async fn fetch_rev_reg_delta(
        &self,
        rev_reg_id: &str,
        timestamp_from: Option<u64>,
        timestamp_to: u64,
    ) -> Result<ResolvedStatusList, AnoncredsLedgerError> {
        tracing::debug!(rev_reg_id, ?timestamp_from, timestamp_to, "fetching rev reg delta");
        let reply = self
            .read(build_get_revoc_reg_delta_request(
                self.submitter(),
                rev_reg_id,
                timestamp_from,
                timestamp_to,
            ))
            .await?;
        let delta = parse_get_revoc_reg_delta_response(&reply)?;
        tracing::debug!(
            rev_reg_id,
            issued = ?delta.issued,
            revoked = ?delta.revoked,
            "rev reg delta"
        );
        stamped_status_list(delta.revoc_reg_def_id, delta.accum_to, delta.timestamp)
    }

    /// The registry's status list at `timestamp`: the last entry written at or before it.
    pub async fn fetch_rev_reg(
        &self,
        rev_reg_id: &str,
        timestamp: u64,
    ) -> Result<ResolvedStatusList, AnoncredsLedgerError> {
        tracing::debug!(rev_reg_id, timestamp, "fetching rev reg");
        let reply = self
            .read(build_get_revoc_reg_request(self.submitter(), rev_reg_id, timestamp))
            .await?;
        let object = parse_get_revoc_reg_response(&reply)?;
        let txn_time = object.txn_time.ok_or_else(|| AnoncredsLedgerError::MissingTimestamp {
            rev_reg_id: object.id.clone(),
        })?;
        stamped_status_list(object.id, object.data, txn_time)
    }

    /// Wait until the registry entry written at `txn_time` is the one readers observe.
    pub async fn await_rev_reg_entry(
        &self,
        rev_reg_id: &str,
        txn_time: u64,
    ) -> Result<ResolvedStatusList, AnoncredsLedgerError> {
        let reply = self
            .read_until(
                build_get_revoc_reg_request(self.submitter(), rev_reg_id, txn_time),
                |reply| reply.has_data() && reply.result.txn_time == Some(txn_time),
            )
            .await?;
        let object = parse_get_revoc_reg_response(&reply)?;
        stamped_status_list(object.id, object.data, txn_time)
    }
}

fn stamped_status_list(
    rev_reg_id: String,
    data: serde_json::Value,
    timestamp: u64,
) -> Result<ResolvedStatusList, AnoncredsLedgerError> {
    let status_list = RevocationStatusList::from_ledger_data(data)?;
    let status_list =
        anoncreds::issuer::update_revocation_status_list_timestamp_only(timestamp, &status_list);
    Ok(ResolvedStatusList {
        rev_reg_id,
        status_list,
        timestamp,
    })
}
