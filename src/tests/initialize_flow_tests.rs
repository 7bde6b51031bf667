use super::test_helpers::{Scenario, NAME, START_MILLIS, SYMBOL, URI};
use crate::flows::InitializeRequest;
use crate::test_utils::mint_account_data;
use crate::tx_builder::InitializeAddresses;

/// Name and symbol as encoded after the 8-byte discriminator
fn sent_identity(data: &[u8]) -> (String, String) {
    let mut offset = 8;
    let mut read = || {
        let len = u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap()) as usize;
        let value = String::from_utf8(data[offset + 4..offset + 4 + len].to_vec()).unwrap();
        offset += 4 + len;
        value
    };
    let name = read();
    let symbol = read();
    (name, symbol)
}

fn request(token_type: &str) -> InitializeRequest {
    InitializeRequest {
        name: NAME.to_string(),
        symbol: SYMBOL.to_string(),
        uri: URI.to_string(),
        token_type: token_type.to_string(),
    }
}

#[tokio::test]
async fn test_initialize_returns_derived_addresses() {
    let s = Scenario::new();
    let result = s.orchestrator().initialize(&request("standard")).await;

    assert!(result.success, "{:?}", result.message);
    let data = result.data.unwrap();
    let expected = InitializeAddresses::derive(&s.config.network, NAME, SYMBOL).unwrap();
    assert_eq!(data.mint_address, s.mint);
    assert_eq!(data.mint_address, expected.mint);
    assert_eq!(data.config_account_address, expected.config_account);
    assert_eq!(data.metadata_account_address, expected.metadata_account);
    assert!(data.transaction_signature.is_some());
    assert_eq!(s.ledger.sent_transactions().len(), 1);
}

#[tokio::test]
async fn test_start_time_taken_from_clock() {
    let s = Scenario::new();
    s.orchestrator().initialize(&request("standard")).await;

    let sent = s.ledger.sent_transactions();
    let program_ix = sent[0].message.instructions().last().unwrap();
    let stamp = (START_MILLIS / 1000).to_le_bytes();
    assert!(program_ix.data.windows(stamp.len()).any(|w| w == stamp.as_slice()));
}

#[tokio::test]
async fn test_already_initialized() {
    let s = Scenario::new();
    s.ledger
        .set_account(s.mint, spl_token::id(), mint_account_data(0, 9));

    let result = s.orchestrator().initialize(&request("standard")).await;

    assert!(!result.success);
    assert_eq!(result.message.as_deref(), Some("Token has already been initialized"));
    assert_eq!(s.ledger.simulated_count(), 0);
}

#[tokio::test]
async fn test_unknown_token_type() {
    let s = Scenario::new();
    let result = s.orchestrator().initialize(&request("exotic")).await;
    assert_eq!(result.message.as_deref(), Some("Token type not supported"));
}

#[tokio::test]
async fn test_invalid_identity_rejected_before_ledger_access() {
    let s = Scenario::new();
    let mut bad = request("standard");
    bad.name = String::new();
    let result = s.orchestrator().initialize(&bad).await;
    assert!(!result.success);

    let mut bad = request("standard");
    bad.symbol = "S".repeat(40);
    let result = s.orchestrator().initialize(&bad).await;
    assert!(!result.success);
    assert_eq!(s.ledger.simulated_count(), 0);
}

#[tokio::test]
async fn test_simulation_failure() {
    let s = Scenario::new();
    s.ledger
        .fail_simulation("custom program error: 0x0", &["Program log: already in use"]);
    let result = s.orchestrator().initialize(&request("meme")).await;
    assert!(!result.success);
    assert!(s.ledger.sent_transactions().is_empty());
    assert_eq!(s.observer.errors().len(), 1);
}

#[tokio::test]
async fn test_nul_padded_identity_targets_sent_mint() {
    let s = Scenario::new();
    let mut padded = request("standard");
    padded.name = format!("{NAME}\0\0");
    padded.symbol = format!("{SYMBOL}\0");

    let result = s.orchestrator().initialize(&padded).await;

    assert!(result.success, "{:?}", result.message);
    let data = result.data.unwrap();
    let sent = s.ledger.sent_transactions();
    let program_ix = sent[0].message.instructions().last().unwrap();
    let (sent_name, sent_symbol) = sent_identity(&program_ix.data);
    assert_eq!(sent_name, NAME);
    assert_eq!(sent_symbol, SYMBOL);

    let (expected_mint, _) = s.pdas.mint(&sent_name, &sent_symbol).unwrap();
    assert_eq!(data.mint_address, expected_mint);
    assert_eq!(data.mint_address, s.mint);
}

#[tokio::test]
async fn test_nul_padded_identity_sees_existing_mint() {
    let s = Scenario::new();
    s.ledger
        .set_account(s.mint, spl_token::id(), mint_account_data(0, 9));
    let mut padded = request("standard");
    padded.name = format!("{NAME}\0");

    let result = s.orchestrator().initialize(&padded).await;

    assert_eq!(result.message.as_deref(), Some("Token has already been initialized"));
    assert_eq!(s.ledger.simulated_count(), 0);
}

#[tokio::test]
async fn test_name_of_only_nul_bytes_rejected() {
    let s = Scenario::new();
    let mut bad = request("standard");
    bad.name = "\0\0\0".to_string();
    let result = s.orchestrator().initialize(&bad).await;
    assert!(!result.success);
    assert_eq!(s.ledger.simulated_count(), 0);
}
