//! Test Utilities Module
//!
//! In-memory stand-ins for the ledger, the wallet and the clock, plus
//! encoders that produce raw account buffers in the layouts the decoders
//! read. Nothing here touches the network.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::decode::{
    Collection, CodeAccountData, Creator, InitializeTokenConfigData, SystemConfigData,
    TokenConfigData, TokenMintState, TokenReferralData, TokenRefundData,
};
use crate::decode::ProgramAccount;
use crate::flows::FlowObserver;
use crate::ledger::{LedgerError, LedgerRpc, SignatureState, SimulationOutcome};
use crate::program::account_discriminator;
use crate::submission::Clock;
use crate::wallet::{WalletError, WalletSigner};
use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::{
    account::Account,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use spl_token::solana_program::program_option::COption;
use spl_token::solana_program::program_pack::Pack;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, Account>,
    account_errors: HashMap<Pubkey, LedgerError>,
    balances: HashMap<Pubkey, u64>,
    token_balances: HashMap<Pubkey, u64>,
    simulation: SimulationOutcome,
    simulate_error: Option<LedgerError>,
    send_error: Option<LedgerError>,
    status: Option<SignatureState>,
    block_height: u64,
    transaction_logs: Vec<String>,
    simulated: Vec<VersionedTransaction>,
    sent: Vec<VersionedTransaction>,
    status_queries: usize,
}

/// In-memory ledger with scripted simulation, send and status results
pub struct MockLedger {
    state: Mutex<LedgerState>,
    blockhash: Hash,
    last_valid_block_height: u64,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    /// Empty ledger whose transactions simulate cleanly and confirm at once
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                status: Some(SignatureState {
                    confirmed: true,
                    err: None,
                }),
                block_height: 100,
                ..LedgerState::default()
            }),
            blockhash: Hash::new_from_array([7u8; 32]),
            last_valid_block_height: 250,
        }
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    pub fn set_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        let account = Account {
            lamports: 1_000_000,
            data,
            owner,
            executable: false,
            rent_epoch: 0,
        };
        self.state.lock().accounts.insert(address, account);
    }

    /// Store a program account in its on-ledger layout
    pub fn set_program_account<T: EncodeAccount>(&self, address: Pubkey, owner: Pubkey, value: &T) {
        self.set_account(address, owner, value.to_account_data());
    }

    pub fn remove_account(&self, address: &Pubkey) {
        let mut state = self.state.lock();
        state.accounts.remove(address);
        state.token_balances.remove(address);
    }

    /// Make every fetch of `address` fail with `err`
    pub fn fail_account(&self, address: Pubkey, err: LedgerError) {
        self.state.lock().account_errors.insert(address, err);
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.state.lock().balances.insert(address, lamports);
    }

    /// Create a token account holding `amount` raw units
    pub fn set_token_account(&self, address: Pubkey, amount: u64) {
        self.set_account(address, spl_token::id(), vec![0u8; 165]);
        self.state.lock().token_balances.insert(address, amount);
    }

    pub fn set_simulation(&self, outcome: SimulationOutcome) {
        self.state.lock().simulation = outcome;
    }

    pub fn fail_simulation(&self, err: &str, logs: &[&str]) {
        self.set_simulation(SimulationOutcome {
            err: Some(err.to_string()),
            logs: logs.iter().map(|l| l.to_string()).collect(),
            units_consumed: Some(1_200),
        });
    }

    pub fn set_simulate_error(&self, err: Option<LedgerError>) {
        self.state.lock().simulate_error = err;
    }

    pub fn set_send_error(&self, err: Option<LedgerError>) {
        self.state.lock().send_error = err;
    }

    pub fn set_status(&self, status: Option<SignatureState>) {
        self.state.lock().status = status;
    }

    pub fn set_block_height(&self, height: u64) {
        self.state.lock().block_height = height;
    }

    pub fn set_transaction_logs(&self, logs: &[&str]) {
        self.state.lock().transaction_logs = logs.iter().map(|l| l.to_string()).collect();
    }

    pub fn simulated_count(&self) -> usize {
        self.state.lock().simulated.len()
    }

    pub fn last_simulated(&self) -> Option<VersionedTransaction> {
        self.state.lock().simulated.last().cloned()
    }

    pub fn sent_transactions(&self) -> Vec<VersionedTransaction> {
        self.state.lock().sent.clone()
    }

    pub fn status_queries(&self) -> usize {
        self.state.lock().status_queries
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    fn endpoint(&self) -> &str {
        "mock://ledger"
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, LedgerError> {
        let state = self.state.lock();
        if let Some(err) = state.account_errors.get(address) {
            return Err(err.clone());
        }
        Ok(state.accounts.get(address).cloned())
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        let state = self.state.lock();
        Ok(state
            .balances
            .get(address)
            .copied()
            .or_else(|| state.accounts.get(address).map(|a| a.lamports))
            .unwrap_or(0))
    }

    async fn get_latest_blockhash(&self) -> Result<(Hash, u64), LedgerError> {
        Ok((self.blockhash, self.last_valid_block_height))
    }

    async fn get_block_height(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().block_height)
    }

    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<SimulationOutcome, LedgerError> {
        let mut state = self.state.lock();
        state.simulated.push(transaction.clone());
        if let Some(err) = state.simulate_error.clone() {
            return Err(err);
        }
        Ok(state.simulation.clone())
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, LedgerError> {
        let mut state = self.state.lock();
        if let Some(err) = state.send_error.clone() {
            return Err(err);
        }
        state.sent.push(transaction.clone());
        transaction
            .signatures
            .first()
            .copied()
            .ok_or_else(|| LedgerError::InvalidResponse("unsigned transaction".to_string()))
    }

    async fn get_signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<SignatureState>, LedgerError> {
        let mut state = self.state.lock();
        state.status_queries += 1;
        Ok(state.status.clone())
    }

    async fn get_transaction_logs(&self, _signature: &Signature) -> Result<Vec<String>, LedgerError> {
        Ok(self.state.lock().transaction_logs.clone())
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<Option<u64>, LedgerError> {
        Ok(self.state.lock().token_balances.get(address).copied())
    }
}

/// Keypair-backed wallet that can be told to refuse
pub struct MockWallet {
    keypair: Keypair,
    reject: AtomicBool,
    signed: AtomicUsize,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            keypair: Keypair::new(),
            reject: AtomicBool::new(false),
            signed: AtomicUsize::new(0),
        }
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn signed_count(&self) -> usize {
        self.signed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, WalletError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected);
        }
        let signed = VersionedTransaction::try_new(transaction.message, &[&self.keypair])
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(signed)
    }
}

/// One observer callback, in the order received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Start(String),
    Error(String, String),
    Success(String, Option<String>),
}

/// Observer that records every callback
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Error(_, message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl FlowObserver for RecordingObserver {
    fn on_start(&self, operation: &str) {
        self.events.lock().push(ObservedEvent::Start(operation.to_string()));
    }

    fn on_error(&self, operation: &str, message: &str) {
        self.events
            .lock()
            .push(ObservedEvent::Error(operation.to_string(), message.to_string()));
    }

    fn on_success(&self, operation: &str, caveat: Option<&str>) {
        self.events.lock().push(ObservedEvent::Success(
            operation.to_string(),
            caveat.map(str::to_string),
        ));
    }
}

/// Writes a program account in its on-ledger layout
pub trait EncodeAccount {
    fn to_account_data(&self) -> Vec<u8>;
}

fn with_discriminator(name: &str) -> Vec<u8> {
    account_discriminator(name).to_vec()
}

fn put_mint_state(buf: &mut Vec<u8>, state: &TokenMintState) {
    buf.extend_from_slice(&state.supply.to_le_bytes());
    buf.extend_from_slice(&state.current_era.to_le_bytes());
    buf.extend_from_slice(&state.current_epoch.to_le_bytes());
    buf.extend_from_slice(&state.elapsed_seconds_epoch.to_le_bytes());
    buf.extend_from_slice(&state.start_timestamp_epoch.to_le_bytes());
    buf.extend_from_slice(&state.last_difficulty_coefficient_epoch.to_le_bytes());
    buf.extend_from_slice(&state.difficulty_coefficient_epoch.to_le_bytes());
    buf.extend_from_slice(&state.mint_size_epoch.to_le_bytes());
    buf.extend_from_slice(&state.quantity_minted_epoch.to_le_bytes());
    buf.extend_from_slice(&state.target_mint_size_epoch.to_le_bytes());
    buf.extend_from_slice(&state.total_mint_fee.to_le_bytes());
    buf.extend_from_slice(&state.total_referrer_fee.to_le_bytes());
    buf.extend_from_slice(&state.total_tokens.to_le_bytes());
}

impl EncodeAccount for TokenConfigData {
    fn to_account_data(&self) -> Vec<u8> {
        let mut buf = with_discriminator(Self::NAME);
        buf.extend_from_slice(self.admin.as_ref());
        buf.extend_from_slice(self.mint.as_ref());
        buf.extend_from_slice(self.fee_vault.as_ref());
        put_mint_state(&mut buf, &self.mint_state);
        // same borsh layout the initialize instruction sends
        buf.extend_from_slice(&borsh::to_vec(&self.config).unwrap_or_default());
        buf
    }
}

impl EncodeAccount for SystemConfigData {
    fn to_account_data(&self) -> Vec<u8> {
        let mut buf = with_discriminator(Self::NAME);
        buf.extend_from_slice(self.admin.as_ref());
        buf.extend_from_slice(&self.count.to_le_bytes());
        buf.extend_from_slice(&self.referral_usage_max_count.to_le_bytes());
        buf.extend_from_slice(self.protocol_fee_account.as_ref());
        buf.extend_from_slice(&self.refund_fee_rate.to_le_bytes());
        buf.extend_from_slice(&self.referrer_reset_interval.to_le_bytes());
        buf.extend_from_slice(&self.update_metadata_fee.to_le_bytes());
        buf.extend_from_slice(&self.customized_deploy_fee.to_le_bytes());
        buf.extend_from_slice(&self.init_pool_wsol_amount.to_le_bytes());
        buf.extend_from_slice(&self.graduate_fee_rate.to_le_bytes());
        buf.extend_from_slice(&self.min_graduate_fee.to_le_bytes());
        buf.extend_from_slice(&self.swap_create_fee.to_le_bytes());
        buf
    }
}

impl EncodeAccount for TokenReferralData {
    fn to_account_data(&self) -> Vec<u8> {
        let mut buf = with_discriminator(Self::NAME);
        buf.extend_from_slice(self.code_hash.as_ref());
        buf.extend_from_slice(self.referrer_main.as_ref());
        buf.extend_from_slice(self.referrer_ata.as_ref());
        buf.extend_from_slice(&self.usage_count.to_le_bytes());
        buf.extend_from_slice(&self.active_timestamp.to_le_bytes());
        buf
    }
}

impl EncodeAccount for CodeAccountData {
    fn to_account_data(&self) -> Vec<u8> {
        let mut buf = with_discriminator(Self::NAME);
        buf.extend_from_slice(self.referral_account.as_ref());
        buf
    }
}

impl EncodeAccount for TokenRefundData {
    fn to_account_data(&self) -> Vec<u8> {
        let mut buf = with_discriminator(Self::NAME);
        buf.extend_from_slice(self.owner.as_ref());
        buf.extend_from_slice(&self.total_tokens.to_le_bytes());
        buf.extend_from_slice(&self.total_mint_fee.to_le_bytes());
        buf.extend_from_slice(&self.total_referrer_fee.to_le_bytes());
        buf
    }
}

/// Ready-made account values
pub struct AccountFixture;

impl AccountFixture {
    pub fn init_config() -> InitializeTokenConfigData {
        InitializeTokenConfigData {
            target_eras: 1,
            epoches_per_era: 200,
            target_seconds_per_epoch: 3600,
            reduce_ratio: 0.75,
            initial_mint_size: 100_000_000_000_000,
            initial_target_mint_size_per_epoch: 1_000_000_000_000_000,
            fee_rate: 100_000_000,
            liquidity_tokens_ratio: 0.2,
            start_timestamp: 1_700_000_000,
        }
    }

    /// Token config with difficulty 2.0 and a 0.1 SOL fee rate
    pub fn token_config(admin: Pubkey, mint: Pubkey) -> TokenConfigData {
        TokenConfigData {
            admin,
            mint,
            fee_vault: Pubkey::new_unique(),
            mint_state: TokenMintState {
                supply: 1_000_000_000_000_000,
                current_era: 1,
                current_epoch: 3,
                elapsed_seconds_epoch: 120,
                start_timestamp_epoch: 1_700_000_000,
                last_difficulty_coefficient_epoch: 1.5,
                difficulty_coefficient_epoch: 2.0,
                mint_size_epoch: 100_000_000_000_000,
                quantity_minted_epoch: 4,
                target_mint_size_epoch: 1_000_000_000_000_000,
                total_mint_fee: 400_000_000,
                total_referrer_fee: 20_000_000,
                total_tokens: 400_000_000_000_000,
            },
            config: Self::init_config(),
        }
    }

    pub fn system_config(admin: Pubkey, protocol_fee_account: Pubkey) -> SystemConfigData {
        SystemConfigData {
            admin,
            count: 12,
            referral_usage_max_count: 50,
            protocol_fee_account,
            refund_fee_rate: 0.0125,
            referrer_reset_interval: 86_400,
            update_metadata_fee: 100_000_000,
            customized_deploy_fee: 500_000_000,
            init_pool_wsol_amount: 100_000_000,
            graduate_fee_rate: 0.01,
            min_graduate_fee: 10_000_000,
            swap_create_fee: 150_000_000,
        }
    }

    pub fn referral(
        code_hash: Pubkey,
        referrer_main: Pubkey,
        referrer_ata: Pubkey,
        usage_count: u32,
    ) -> TokenReferralData {
        TokenReferralData {
            code_hash,
            referrer_main,
            referrer_ata,
            usage_count,
            active_timestamp: 1_700_000_000,
        }
    }
}

/// Packed SPL mint account with no authorities
pub fn mint_account_data(supply: u64, decimals: u8) -> Vec<u8> {
    let mint = spl_token::state::Mint {
        mint_authority: COption::None,
        supply,
        decimals,
        is_initialized: true,
        freeze_authority: COption::None,
    };
    let mut data = vec![0u8; spl_token::state::Mint::LEN];
    mint.pack_into_slice(&mut data);
    data
}

/// Address lookup table account holding `addresses`, never deactivated
pub fn lookup_table_data(addresses: &[Pubkey]) -> Vec<u8> {
    const META_SIZE: usize = 56;
    let mut data = Vec::with_capacity(META_SIZE + addresses.len() * 32);
    data.extend_from_slice(&1u32.to_le_bytes()); // ProgramState::LookupTable
    data.extend_from_slice(&u64::MAX.to_le_bytes()); // deactivation_slot
    data.extend_from_slice(&0u64.to_le_bytes()); // last_extended_slot
    data.push(0); // last_extended_slot_start_index
    data.push(0); // authority: None
    data.resize(META_SIZE, 0);
    for address in addresses {
        data.extend_from_slice(address.as_ref());
    }
    data
}

/// Synthetic legacy metadata account
#[derive(Debug, Clone)]
pub struct MetadataBuffer {
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub creators: Vec<Creator>,
    pub collection: Option<Collection>,
    pub is_mutable: bool,
}

impl MetadataBuffer {
    pub fn new(name: &str, symbol: &str, uri: &str) -> Self {
        Self {
            update_authority: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            uri: uri.to_string(),
            creators: Vec::new(),
            collection: None,
            is_mutable: true,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        fn put_str(buf: &mut Vec<u8>, s: &str) {
            buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
            buf.extend_from_slice(s.as_bytes());
        }

        let mut buf = vec![4u8];
        buf.extend_from_slice(self.update_authority.as_ref());
        buf.extend_from_slice(self.mint.as_ref());
        put_str(&mut buf, &self.name);
        put_str(&mut buf, &self.symbol);
        put_str(&mut buf, &self.uri);
        buf.extend_from_slice(&500u16.to_le_bytes());

        if self.creators.is_empty() {
            buf.push(0);
        } else {
            buf.push(1);
            buf.extend_from_slice(&(self.creators.len() as u32).to_le_bytes());
            for creator in &self.creators {
                buf.extend_from_slice(creator.address.as_ref());
                buf.push(creator.verified as u8);
                buf.push(creator.share);
            }
        }

        match &self.collection {
            Some(collection) => {
                buf.push(1);
                buf.extend_from_slice(collection.key.as_ref());
                buf.push(collection.verified as u8);
            }
            None => buf.push(0),
        }

        buf.push(self.is_mutable as u8);
        buf
    }
}
