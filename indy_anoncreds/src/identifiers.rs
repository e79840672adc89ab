//! Legacy ledger identifiers for anoncreds objects.

use crate::error::AnoncredsLedgerError;

pub const SCHEMA_MARKER: &str = "2";
pub const CRED_DEF_MARKER: &str = "3";
pub const REV_REG_MARKER: &str = "4";
pub const CL_SIGNATURE_TYPE: &str = "CL";
pub const CL_ACCUM_REGISTRY_TYPE: &str = "CL_ACCUM";

/// `did:2:name:version`
pub fn schema_id(issuer_did: &str, name: &str, version: &str) -> String {
    format!("{issuer_did}:{SCHEMA_MARKER}:{name}:{version}")
}

/// `did:3:CL:schemaSeqNo:tag`
pub fn cred_def_id(issuer_did: &str, schema_seq_no: u64, tag: &str) -> String {
    format!("{issuer_did}:{CRED_DEF_MARKER}:{CL_SIGNATURE_TYPE}:{schema_seq_no}:{tag}")
}

/// `did:4:credDefId:CL_ACCUM:tag`
pub fn rev_reg_def_id(issuer_did: &str, cred_def_id: &str, tag: &str) -> String {
    format!("{issuer_did}:{REV_REG_MARKER}:{cred_def_id}:{CL_ACCUM_REGISTRY_TYPE}:{tag}")
}

/// Split a schema id into its issuer, name and version.
pub fn parse_schema_id(id: &str) -> Result<(&str, &str, &str), AnoncredsLedgerError> {
    let parts: Vec<&str> = id.split(':').collect();
    match parts.as_slice() {
        [did, SCHEMA_MARKER, name, version] => Ok((*did, *name, *version)),
        _ => Err(AnoncredsLedgerError::InvalidIdentifier(id.to_owned())),
    }
}

/// The issuer DID that authored a schema, cred def or registry id.
pub fn issuer_of(id: &str) -> Result<&str, AnoncredsLedgerError> {
    match id.split_once(':') {
        Some((did, _)) if !did.is_empty() => Ok(did),
        _ => Err(AnoncredsLedgerError::InvalidIdentifier(id.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DID: &str = "V4SGRU86Z58d6TV7PBUe6f";

    #[test]
    fn test_id_formats() {
        let schema = schema_id(DID, "Transcript", "1.2");
        assert_eq!(schema, "V4SGRU86Z58d6TV7PBUe6f:2:Transcript:1.2");

        let cred_def = cred_def_id(DID, 12, "TAG1");
        assert_eq!(cred_def, "V4SGRU86Z58d6TV7PBUe6f:3:CL:12:TAG1");

        assert_eq!(
            rev_reg_def_id(DID, &cred_def, "TAG1"),
            "V4SGRU86Z58d6TV7PBUe6f:4:V4SGRU86Z58d6TV7PBUe6f:3:CL:12:TAG1:CL_ACCUM:TAG1"
        );
    }

    #[test]
    fn test_parse_schema_id() {
        let (did, name, version) = parse_schema_id(&schema_id(DID, "Transcript", "1.2")).unwrap();
        assert_eq!((did, name, version), (DID, "Transcript", "1.2"));

        assert!(parse_schema_id("V4SGRU86Z58d6TV7PBUe6f:3:CL:12:TAG1").is_err());
        assert_eq!(issuer_of(&cred_def_id(DID, 1, "t")).unwrap(), DID);
        assert!(issuer_of("no-separator").is_err());
    }
}
