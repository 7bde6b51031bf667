//! Shared fixtures for the flow and pipeline tests
//!
//! [`Scenario`] seeds a [`MockLedger`] with everything a mint, refund or
//! initialize needs for one token, so each test only changes the piece
//! it is about.

use crate::config::{Config, Network};
use crate::decode::{CodeAccountData, TokenRefundData};
use crate::flows::Orchestrator;
use crate::pda::{associated_token_address, PdaBuilder};
use crate::submission::{BuiltTransaction, MemoryLockStore};
use crate::test_utils::{
    lookup_table_data, mint_account_data, AccountFixture, ManualClock, MetadataBuffer, MockLedger,
    MockWallet, RecordingObserver,
};
use crate::tx_builder::{
    assemble_initialize, assemble_mint, assemble_refund, build_transaction, InitializeAddresses,
    InstructionPlan, MessageFormat, MintAddresses, MintParams, PoolAccounts, RefundAddresses,
    RefundParams,
};
use crate::types::TokenMetadata;
use crate::wallet::WalletSigner;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use std::sync::Arc;

pub const NAME: &str = "Fair Launch";
pub const SYMBOL: &str = "FAIR";
pub const URI: &str = "https://arweave.net/fair-launch.json";
pub const CODE: &str = "friend42";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const SUPPLY: u64 = 1_000_000_000_000_000;
/// Fee with a referrer holding nothing: the token's full fee rate
pub const BASE_FEE: u64 = 100_000_000;
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// Devnet configuration with fast confirmation polling
pub fn test_config() -> Config {
    let mut config = Config::for_network(Network::Devnet).unwrap();
    config.pipeline.confirm_poll_interval_ms = 5;
    config.pipeline.confirm_timeout_secs = 1;
    config
}

/// Minimal unsigned transaction paid by `payer`
pub fn simple_transaction(payer: &Pubkey, ledger: &MockLedger) -> BuiltTransaction {
    let ix = Instruction::new_with_bytes(
        Pubkey::new_unique(),
        &[1, 2, 3],
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(Pubkey::new_unique(), false),
        ],
    );
    let transaction =
        build_transaction(MessageFormat::Legacy, payer, &[ix], None, ledger.blockhash()).unwrap();
    BuiltTransaction {
        transaction,
        last_valid_block_height: 250,
    }
}

pub struct Scenario {
    pub config: Config,
    pub ledger: Arc<MockLedger>,
    pub wallet: Arc<MockWallet>,
    pub observer: Arc<RecordingObserver>,
    pub clock: Arc<ManualClock>,
    pub lock_store: Arc<MemoryLockStore>,
    pub pdas: PdaBuilder,
    pub mint: Pubkey,
    /// Token config admin; exempt from the referral usage cap
    pub admin: Pubkey,
    /// Ordinary referrer
    pub referrer: Pubkey,
}

impl Scenario {
    /// Funded wallet and a lookup table; no token accounts yet
    pub fn new() -> Self {
        let config = test_config();
        let pdas = PdaBuilder::new(config.network.program_id, config.network.metadata_program_id);
        let (mint, _) = pdas.mint(NAME, SYMBOL).unwrap();
        let scenario = Self {
            config,
            ledger: Arc::new(MockLedger::new()),
            wallet: Arc::new(MockWallet::new()),
            observer: RecordingObserver::new(),
            clock: Arc::new(ManualClock::new(START_MILLIS)),
            lock_store: Arc::new(MemoryLockStore::new()),
            pdas,
            mint,
            admin: Pubkey::new_unique(),
            referrer: Pubkey::new_unique(),
        };
        scenario
            .ledger
            .set_balance(scenario.user(), LAMPORTS_PER_SOL);
        scenario.seed_lookup_table();
        scenario
    }

    /// Launched token whose referral `CODE` belongs to the ordinary referrer
    pub fn mintable() -> Self {
        let scenario = Self::new();
        scenario.seed_token();
        scenario.seed_referral(scenario.referrer, 3);
        scenario
    }

    pub fn user(&self) -> Pubkey {
        self.wallet.pubkey()
    }

    pub fn program_id(&self) -> Pubkey {
        self.config.network.program_id
    }

    pub fn orchestrator(&self) -> Orchestrator {
        self.orchestrator_without_wallet()
            .with_wallet(self.wallet.clone())
    }

    pub fn orchestrator_without_wallet(&self) -> Orchestrator {
        Orchestrator::new(&self.config, self.ledger.clone())
            .with_observer(self.observer.clone())
            .with_clock(self.clock.clone())
            .with_lock_store(self.lock_store.clone())
    }

    pub fn code_hash(&self) -> Pubkey {
        self.pdas.code_hash(CODE).unwrap().0
    }

    pub fn referrer_ata(&self, referrer: &Pubkey) -> Pubkey {
        associated_token_address(referrer, &self.mint)
    }

    pub fn referral_account(&self, referrer: &Pubkey) -> Pubkey {
        self.pdas.referral(&self.mint, referrer).unwrap().0
    }

    /// Mint, metadata and token config accounts
    pub fn seed_token(&self) {
        let program_id = self.program_id();
        self.ledger
            .set_account(self.mint, spl_token::id(), mint_account_data(SUPPLY, 9));

        let (metadata_account, _) = self.pdas.metadata(&self.mint).unwrap();
        let mut metadata = MetadataBuffer::new(NAME, SYMBOL, URI);
        metadata.mint = self.mint;
        self.ledger.set_account(
            metadata_account,
            self.config.network.metadata_program_id,
            metadata.encode(),
        );

        let (config_account, _) = self.pdas.config(&self.mint).unwrap();
        self.ledger.set_program_account(
            config_account,
            program_id,
            &AccountFixture::token_config(self.admin, self.mint),
        );
    }

    /// Code account, referral record and an empty referrer token account.
    /// `referrer` must be the admin, the ordinary referrer or the user.
    pub fn seed_referral(&self, referrer: Pubkey, usage_count: u32) {
        let program_id = self.program_id();
        let code_hash = self.code_hash();
        let referral_account = self.referral_account(&referrer);
        let referrer_ata = self.referrer_ata(&referrer);

        let (code_account, _) = self.pdas.code_account(&code_hash).unwrap();
        self.ledger.set_program_account(
            code_account,
            program_id,
            &CodeAccountData { referral_account },
        );
        self.ledger.set_program_account(
            referral_account,
            program_id,
            &AccountFixture::referral(code_hash, referrer, referrer_ata, usage_count),
        );
        self.ledger.set_token_account(referrer_ata, 0);
    }

    /// Refund record for the wallet on this token, owned by `owner`
    pub fn seed_refund(&self, owner: Pubkey) {
        let (refund_account, _) = self.pdas.refund(&self.mint, &self.user()).unwrap();
        self.ledger.set_program_account(
            refund_account,
            self.program_id(),
            &TokenRefundData {
                owner,
                total_tokens: 200_000_000_000_000,
                total_mint_fee: 200_000_000,
                total_referrer_fee: 5_000_000,
            },
        );
    }

    /// User token and wrapped-native accounts, so no creation is planned
    pub fn seed_user_token_accounts(&self) {
        let user = self.user();
        self.ledger
            .set_token_account(associated_token_address(&user, &self.mint), 100_000_000_000_000);
        self.ledger.set_token_account(
            associated_token_address(&user, &spl_token::native_mint::id()),
            0,
        );
    }

    /// Lookup table covering every non-signer account any flow can touch
    fn seed_lookup_table(&self) {
        let network = &self.config.network;
        let user = self.user();
        let referrers = [self.admin, self.referrer, user];
        let mut keys = Vec::new();

        let mut collect = |plan: InstructionPlan| {
            for ix in &plan.instructions {
                keys.extend(ix.accounts.iter().filter(|m| !m.is_signer).map(|m| m.pubkey));
            }
        };

        let addresses = InitializeAddresses::derive(network, NAME, SYMBOL).unwrap();
        let metadata = TokenMetadata {
            name: NAME.to_string(),
            symbol: SYMBOL.to_string(),
            uri: URI.to_string(),
            decimals: Some(9),
        };
        collect(
            assemble_initialize(
                network,
                &user,
                &addresses,
                &metadata,
                &AccountFixture::init_config(),
                300_000,
            )
            .unwrap(),
        );

        let pool = PoolAccounts::derive(&network.swap, &user, &self.mint).unwrap();
        for referrer in referrers {
            let addresses = MintAddresses::derive(network, &user, &self.mint, &referrer).unwrap();
            let params = MintParams {
                name: NAME,
                symbol: SYMBOL,
                code_hash: self.code_hash(),
                create_destination: true,
                create_wsol_account: true,
                compute_units: 500_000,
            };
            collect(assemble_mint(network, &addresses, &pool, &params).unwrap());
        }

        let addresses = RefundAddresses::derive(network, &user, &self.mint).unwrap();
        let params = RefundParams {
            name: NAME,
            symbol: SYMBOL,
            create_payer_wsol: true,
            create_protocol_wsol: true,
            compute_units: 300_000,
        };
        collect(assemble_refund(network, &addresses, &params).unwrap());

        keys.sort();
        keys.dedup();
        self.ledger.set_account(
            network.lookup_table,
            solana_sdk::address_lookup_table::program::id(),
            lookup_table_data(&keys),
        );
    }
}
