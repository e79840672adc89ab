pub mod aggregation;
pub mod credential_store;
pub mod error;
pub mod identifiers;
pub mod ledger_data_transformer;
pub mod registrar;
pub mod resolver;
pub mod tails;

#[cfg(test)]
mod test_utils;
