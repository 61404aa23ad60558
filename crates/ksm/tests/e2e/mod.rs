//! End-to-end tests for entity key lifecycle, signing and transactions.

pub mod api_contract_test;
pub mod banking_flow_test;
pub mod concurrency_test;
pub mod persistence_test;
pub mod store_failure_test;
