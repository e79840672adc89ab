pub mod anchor;
pub mod client;
pub mod digest;
pub mod error;
pub mod transaction;
