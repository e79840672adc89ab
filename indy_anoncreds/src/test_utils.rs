use std::{sync::Arc, time::Duration};

use anoncreds::{
    tails::TailsFileWriter,
    types::{CredentialDefinitionConfig, RegistryType, SignatureType},
};
use indy_ledger::{
    ledger::sign_and_submit_request,
    pool::{GenesisTxn, LocalPool, PoolConfig, PoolRegistry},
    requests::{build_nym_request, Role},
    retry::RetryPolicy,
    wallet::{Wallet, WalletConfig, WalletCredentials, WalletRegistry},
};
use tempfile::TempDir;

use crate::{
    aggregation::IdentifierRecord, identifiers, registrar::IndyAnoncredsRegistrar,
    resolver::IndyAnoncredsResolver,
};

pub const STEWARD_SEED: &str = "000000000000000000000000Steward1";

/// A pool with one onboarded issuer, for exercising reads against real ledger objects.
pub struct TestLedger {
    pub pool: Arc<LocalPool>,
    pub wallet: Wallet,
    pub issuer_did: String,
    pub tails_dir: TempDir,
}

pub struct PublishedCredDef {
    pub schema_id: String,
    pub cred_def_id: String,
    pub registry: Option<PublishedRegistry>,
}

pub struct PublishedRegistry {
    pub rev_reg_id: String,
    pub entry_time: u64,
}

impl PublishedCredDef {
    pub fn identifier(&self) -> IdentifierRecord {
        IdentifierRecord {
            schema_id: self.schema_id.clone(),
            cred_def_id: self.cred_def_id.clone(),
            rev_reg_id: None,
            cred_rev_id: None,
            timestamp: None,
        }
    }
}

impl TestLedger {
    pub async fn bootstrap() -> Self {
        let pools = PoolRegistry::new();
        pools
            .create_pool_ledger_config(
                "test_pool",
                PoolConfig {
                    genesis_txns: vec![GenesisTxn::steward_from_seed(STEWARD_SEED).unwrap()],
                    replication_lag: Duration::ZERO,
                },
            )
            .unwrap();
        let pool = pools.open_pool_ledger("test_pool").unwrap();

        let (wallet, _) = WalletRegistry::new()
            .ensure_wallet(
                &WalletConfig {
                    id: "test_wallet".to_owned(),
                },
                &WalletCredentials {
                    key: "test_wallet_key".to_owned(),
                },
            )
            .unwrap();
        let steward = wallet.create_and_store_my_did(Some(STEWARD_SEED)).await.unwrap();
        let issuer = wallet.create_and_store_my_did(None).await.unwrap();

        let nym = build_nym_request(
            &steward.did,
            &issuer.did,
            Some(&issuer.verkey),
            None,
            Some(Role::Endorser),
        );
        sign_and_submit_request(pool.as_ref(), &wallet, &steward.did, nym)
            .await
            .unwrap();

        Self {
            pool,
            wallet,
            issuer_did: issuer.did,
            tails_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn resolver(&self) -> IndyAnoncredsResolver<LocalPool> {
        IndyAnoncredsResolver::new(
            self.pool.clone(),
            RetryPolicy::fixed(3, Duration::from_millis(10)),
        )
    }

    pub fn registrar(&self) -> IndyAnoncredsRegistrar<LocalPool> {
        IndyAnoncredsRegistrar::new(self.pool.clone(), self.wallet.clone())
    }

    pub async fn publish_cred_def(
        &self,
        schema_name: &str,
        tag: &str,
        revocable: bool,
    ) -> PublishedCredDef {
        let registrar = self.registrar();
        let issuer = &self.issuer_did;

        let schema = anoncreds::issuer::create_schema(
            schema_name,
            "1.0",
            issuer.clone(),
            (&["name", "age"][..]).into(),
        )
        .unwrap();
        let schema_id = identifiers::schema_id(issuer, schema_name, "1.0");
        let written_schema = registrar
            .write_schema(issuer, &schema_id, &schema)
            .await
            .unwrap();

        let cred_def_id = identifiers::cred_def_id(issuer, written_schema.seq_no, tag);
        let (cred_def, _, _) = anoncreds::issuer::create_credential_definition(
            schema_id.clone(),
            &schema,
            issuer.clone(),
            tag,
            SignatureType::CL,
            CredentialDefinitionConfig::new(revocable),
        )
        .unwrap();
        registrar
            .write_cred_def(issuer, &cred_def_id, &cred_def)
            .await
            .unwrap();

        let registry = if revocable {
            let mut tw = TailsFileWriter::new(Some(self.tails_dir.path().to_string_lossy().into_owned()));
            let (rev_reg_def, _) = anoncreds::issuer::create_revocation_registry_def(
                &cred_def,
                cred_def_id.clone(),
                issuer.clone(),
                tag,
                RegistryType::CL_ACCUM,
                10,
                &mut tw,
            )
            .unwrap();
            let rev_reg_id = identifiers::rev_reg_def_id(issuer, &cred_def_id, tag);
            registrar
                .write_rev_reg_def(issuer, &rev_reg_id, &rev_reg_def)
                .await
                .unwrap();

            let rev_list = anoncreds::issuer::create_revocation_status_list(
                rev_reg_id.clone(),
                &rev_reg_def,
                issuer.clone(),
                None,
                true,
            )
            .unwrap();
            let entry = registrar
                .write_rev_status_list(issuer, &rev_reg_id, &rev_list)
                .await
                .unwrap();
            Some(PublishedRegistry {
                rev_reg_id,
                entry_time: entry.txn_time,
            })
        } else {
            None
        };

        PublishedCredDef {
            schema_id,
            cred_def_id,
            registry,
        }
    }
}
