//! Mint flow: preconditions, referral rules and submission outcomes

use super::test_helpers::{Scenario, BASE_FEE, CODE};
use crate::flows::REFERRAL_USED_UP;
use crate::ledger::{LedgerError, SignatureState};
use crate::pda::associated_token_address;
use crate::program::REFERRAL_USAGE_CAP;
use crate::submission::{SubmissionLock, ALREADY_PROCESSED_CAVEAT};
use crate::test_utils::ObservedEvent;
use crate::types::FlowResult;
use crate::types::TransactionPayload;
use solana_sdk::{message::VersionedMessage, pubkey::Pubkey};
use std::time::Duration;

fn mint_str(scenario: &Scenario) -> String {
    scenario.mint.to_string()
}

fn assert_failed<T: std::fmt::Debug>(result: &FlowResult<T>, message: &str) {
    assert!(!result.success, "expected failure, got {:?}", result);
    assert_eq!(result.message.as_deref(), Some(message));
    assert!(result.data.is_none());
}

#[tokio::test]
async fn test_mint_submits_v0_transaction() {
    let s = Scenario::mintable();
    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;

    assert!(result.success, "{:?}", result.message);
    assert_eq!(result.message, None);
    let data: TransactionPayload = result.data.unwrap();
    assert_eq!(data.wallet_address, s.user());
    assert_eq!(data.token_account_address, associated_token_address(&s.user(), &s.mint));
    assert_eq!(
        data.wrapped_native_account_address,
        associated_token_address(&s.user(), &spl_token::native_mint::id())
    );
    assert!(data.transaction_signature.is_some());
    assert!(data.token_page_url.ends_with(&format!("/token/{}", s.mint)));

    let sent = s.ledger.sent_transactions();
    assert_eq!(sent.len(), 1);
    match &sent[0].message {
        VersionedMessage::V0(message) => {
            assert_eq!(message.address_table_lookups.len(), 1);
            assert_eq!(message.address_table_lookups[0].account_key, s.config.network.lookup_table);
        }
        VersionedMessage::Legacy(_) => panic!("mint must compile to v0"),
    }
    assert_eq!(s.wallet.signed_count(), 1);
}

#[tokio::test]
async fn test_mint_creates_only_missing_accounts() {
    let s = Scenario::mintable();
    s.orchestrator().mint(&mint_str(&s), CODE).await;
    // budget, wrapped native, token account, mint
    assert_eq!(s.ledger.sent_transactions()[0].message.instructions().len(), 4);

    let s = Scenario::mintable();
    s.seed_user_token_accounts();
    s.orchestrator().mint(&mint_str(&s), CODE).await;
    assert_eq!(s.ledger.sent_transactions()[0].message.instructions().len(), 2);
}

#[tokio::test]
async fn test_wallet_required() {
    let s = Scenario::mintable();
    let result = s.orchestrator_without_wallet().mint(&mint_str(&s), CODE).await;
    assert_failed(&result, "Wallet is not connected");
    assert_eq!(s.ledger.simulated_count(), 0);
}

#[tokio::test]
async fn test_missing_inputs() {
    let s = Scenario::mintable();
    let orchestrator = s.orchestrator();

    assert_failed(&orchestrator.mint("", CODE).await, "Mint address is not provided");
    assert_failed(&orchestrator.mint(&mint_str(&s), "").await, "Urc code is not provided");

    let result = orchestrator.mint("not-a-key", CODE).await;
    assert!(!result.success);
}

#[tokio::test]
async fn test_unknown_code() {
    let s = Scenario::mintable();
    let result = s.orchestrator().mint(&mint_str(&s), "nobody").await;
    assert_failed(&result, "Code account does not exist");
}

#[tokio::test]
async fn test_referrer_token_account_required() {
    let s = Scenario::mintable();
    s.ledger.remove_account(&s.referrer_ata(&s.referrer));
    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;
    assert_failed(&result, "Referrer ata not exist");
}

#[tokio::test]
async fn test_code_hash_mismatch() {
    let s = Scenario::mintable();
    let referral_account = s.referral_account(&s.referrer);
    s.ledger.set_program_account(
        referral_account,
        s.program_id(),
        &crate::test_utils::AccountFixture::referral(
            Pubkey::new_unique(),
            s.referrer,
            s.referrer_ata(&s.referrer),
            3,
        ),
    );
    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;
    assert_failed(&result, "Code hash not match");
}

#[tokio::test]
async fn test_referral_used_up() {
    let s = Scenario::new();
    s.seed_token();
    s.seed_referral(s.referrer, REFERRAL_USAGE_CAP);

    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;

    assert_failed(&result, REFERRAL_USED_UP);
    assert_eq!(s.ledger.simulated_count(), 0);
}

#[tokio::test]
async fn test_referral_below_cap_allowed() {
    let s = Scenario::new();
    s.seed_token();
    s.seed_referral(s.referrer, REFERRAL_USAGE_CAP - 1);
    assert!(s.orchestrator().mint(&mint_str(&s), CODE).await.success);
}

#[tokio::test]
async fn test_admin_referral_not_capped() {
    let s = Scenario::new();
    s.seed_token();
    s.seed_referral(s.admin, REFERRAL_USAGE_CAP + 10);

    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;

    assert!(result.success, "{:?}", result.message);
}

#[tokio::test]
async fn test_self_referral_rejected() {
    let s = Scenario::new();
    s.seed_token();
    s.seed_referral(s.user(), 0);

    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;

    assert_failed(&result, "Referrer can not be same as wallet");
}

#[tokio::test]
async fn test_balance_below_fee() {
    let s = Scenario::mintable();
    s.ledger.set_balance(s.user(), BASE_FEE - 1);
    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;
    assert_failed(&result, "Balance not enough");

    s.ledger.set_balance(s.user(), 0);
    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;
    assert_failed(&result, "Balance not enough");

    s.ledger.set_balance(s.user(), BASE_FEE);
    assert!(s.orchestrator().mint(&mint_str(&s), CODE).await.success);
}

#[tokio::test]
async fn test_missing_token_config() {
    let s = Scenario::mintable();
    let (config_account, _) = s.pdas.config(&s.mint).unwrap();
    s.ledger.remove_account(&config_account);
    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;
    assert_failed(&result, "Token config account does not exist");
}

#[tokio::test]
async fn test_simulation_failure_reports_and_sends_nothing() {
    let s = Scenario::mintable();
    s.ledger.fail_simulation(
        "Error processing Instruction 3: custom program error: 0x1771",
        &["Program log: Mint window closed"],
    );

    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;

    assert!(!result.success);
    let message = result.message.unwrap();
    assert!(message.starts_with("Transaction simulation failed"));
    assert!(message.contains("0x1771"));
    assert!(s.ledger.sent_transactions().is_empty());
    assert_eq!(s.wallet.signed_count(), 0);
}

#[tokio::test]
async fn test_already_processed_is_success_with_caveat() {
    let s = Scenario::mintable();
    s.ledger.set_send_error(Some(LedgerError::AlreadyProcessed {
        endpoint: "mock://ledger".into(),
    }));
    s.ledger.set_status(None);

    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;

    assert!(result.success);
    assert_eq!(result.message.as_deref(), Some(ALREADY_PROCESSED_CAVEAT));
    assert!(result.data.unwrap().transaction_signature.is_some());
    assert_eq!(
        s.observer.events().last(),
        Some(&ObservedEvent::Success(
            "mint".into(),
            Some(ALREADY_PROCESSED_CAVEAT.into())
        ))
    );
}

#[tokio::test]
async fn test_on_chain_failure() {
    let s = Scenario::mintable();
    s.ledger.set_status(Some(SignatureState {
        confirmed: true,
        err: Some("InstructionError(3, Custom(6001))".into()),
    }));
    s.ledger.set_transaction_logs(&["Program log: Epoch supply exhausted"]);

    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;

    assert!(!result.success);
    assert_eq!(
        result.message.as_deref(),
        Some("Transaction failed: InstructionError(3, Custom(6001))")
    );
}

#[tokio::test]
async fn test_second_submission_within_window_refused() {
    let s = Scenario::mintable();
    // another tab holding the shared lock record
    let other = SubmissionLock::new(
        s.lock_store.clone(),
        s.clock.clone(),
        Duration::from_millis(s.config.pipeline.lock_window_ms),
    );
    let _held = other.acquire().unwrap();

    s.clock.advance(1_999);
    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;
    assert!(!result.success);
    assert!(result.message.unwrap().contains("still processing"));
    assert_eq!(s.ledger.simulated_count(), 0);

    s.clock.advance(1);
    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;
    assert!(result.success, "{:?}", result.message);
}

#[tokio::test]
async fn test_observer_notified_once_per_call() {
    let s = Scenario::mintable();
    let orchestrator = s.orchestrator();

    orchestrator.mint(&mint_str(&s), "").await;
    orchestrator.mint(&mint_str(&s), CODE).await;

    assert_eq!(
        s.observer.events(),
        vec![
            ObservedEvent::Start("mint".into()),
            ObservedEvent::Error("mint".into(), "Urc code is not provided".into()),
            ObservedEvent::Start("mint".into()),
            ObservedEvent::Success("mint".into(), None),
        ]
    );
}

#[tokio::test]
async fn test_missing_lookup_table() {
    let s = Scenario::mintable();
    s.ledger.remove_account(&s.config.network.lookup_table);
    let result = s.orchestrator().mint(&mint_str(&s), CODE).await;
    assert_failed(&result, "Address lookup table not found");
}
