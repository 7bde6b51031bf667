//! Flow and pipeline tests against the in-memory ledger

mod test_helpers;

mod initialize_flow_tests;
mod mint_flow_tests;
