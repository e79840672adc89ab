pub mod did;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod requests;
pub mod responses;
pub mod retry;
pub mod wallet;
