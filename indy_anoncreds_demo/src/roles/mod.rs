pub mod government;
pub mod holder;
pub mod issuer;
pub mod steward;
pub mod verifier;
