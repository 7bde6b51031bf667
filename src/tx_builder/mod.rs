//! Transaction assembly
//!
//! Turns validated inputs into ordered instruction lists and unsigned
//! transactions. Nothing in here talks to the ledger: callers fetch account
//! state, check preconditions and pass the results in.
//!
//! - **errors**: assembly error taxonomy
//! - **instructions**: program instruction builders, typed account sets, ordering checks
//! - **pool**: swap-pool bootstrap accounts and mint canonicalization
//! - **message**: legacy/v0 compilation and packet-size checks
//! - **initialize**, **mint**, **refund**: per-operation assembly

pub mod errors;
pub use errors::AssemblyError;

pub mod initialize;
pub mod instructions;
pub mod message;
pub mod mint;
pub mod pool;
pub mod refund;

pub use initialize::{assemble_initialize, InitializeAddresses};
pub use instructions::{plan_instructions, sanity_check_ix_order, InstructionPlan};
pub use message::{build_transaction, build_transaction_auto, decode_lookup_table, MessageFormat};
pub use mint::{assemble_mint, MintAddresses, MintParams};
pub use pool::{canonicalize, compare_mints, PoolAccounts, POOL_ACCOUNT_COUNT};
pub use refund::{assemble_refund, RefundAddresses, RefundParams};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::decode::InitializeTokenConfigData;
    use crate::pda::{associated_token_address, PdaBuilder};
    use crate::types::TokenMetadata;
    use solana_sdk::{compute_budget, pubkey::Pubkey};

    fn network() -> NetworkConfig {
        NetworkConfig::devnet().unwrap()
    }

    fn init_config() -> InitializeTokenConfigData {
        InitializeTokenConfigData {
            target_eras: 1,
            epoches_per_era: 200,
            target_seconds_per_epoch: 3600,
            reduce_ratio: 0.75,
            initial_mint_size: 1_000,
            initial_target_mint_size_per_epoch: 10_000,
            fee_rate: 100_000_000,
            liquidity_tokens_ratio: 0.2,
            start_timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_initialize_addresses_match_pda_builder() {
        let network = network();
        let addresses = InitializeAddresses::derive(&network, "Fair", "FAIR").unwrap();
        let pdas = PdaBuilder::new(network.program_id, network.metadata_program_id);
        assert_eq!(addresses.mint, pdas.mint("Fair", "fair").unwrap().0);
        assert_eq!(addresses.config_account, pdas.config(&addresses.mint).unwrap().0);
        assert_eq!(
            addresses.token_vault,
            associated_token_address(&addresses.config_account, &addresses.mint)
        );
    }

    #[test]
    fn test_initialize_plan_shape() {
        let network = network();
        let payer = Pubkey::new_unique();
        let addresses = InitializeAddresses::derive(&network, "Fair", "FAIR").unwrap();
        let metadata = TokenMetadata {
            name: "Fair\0".into(),
            symbol: "FAIR".into(),
            uri: "ipfs://x".into(),
            decimals: None,
        };
        let plan =
            assemble_initialize(&network, &payer, &addresses, &metadata, &init_config(), 300_000)
                .unwrap();
        assert_eq!(plan.instructions.len(), 2);
        assert_eq!(plan.instructions[0].program_id, compute_budget::id());
        assert_eq!(plan.instructions[1].program_id, network.program_id);
        // NUL stripped before encoding: discriminator, then "Fair" with a 4-byte length
        assert_eq!(&plan.instructions[1].data[8..12], &4u32.to_le_bytes());
        assert_eq!(&plan.instructions[1].data[12..16], b"Fair");
    }

    #[test]
    fn test_mint_plan_orders_creations() {
        let network = network();
        let user = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let referrer = Pubkey::new_unique();
        let addresses = MintAddresses::derive(&network, &user, &mint, &referrer).unwrap();
        let pool = PoolAccounts::derive(&network.swap, &user, &mint).unwrap();
        let params = MintParams {
            name: "Fair",
            symbol: "FAIR",
            code_hash: Pubkey::new_unique(),
            create_destination: true,
            create_wsol_account: true,
            compute_units: 500_000,
        };
        let plan = assemble_mint(&network, &addresses, &pool, &params).unwrap();

        assert_eq!(plan.instructions.len(), 4);
        assert_eq!(plan.account_creations, 2);
        // Wrapped native account is created before the token account
        let wsol_create = &plan.instructions[1];
        let token_create = &plan.instructions[2];
        assert_eq!(wsol_create.accounts[1].pubkey, addresses.destination_wsol_ata);
        assert_eq!(token_create.accounts[1].pubkey, addresses.destination);

        let mint_ix = &plan.instructions[3];
        let named = 24;
        assert_eq!(mint_ix.accounts.len(), named + POOL_ACCOUNT_COUNT);
        assert_eq!(mint_ix.accounts[named].pubkey, network.swap.program_id);
        assert_eq!(mint_ix.accounts[named + 1].pubkey, user);
    }

    #[test]
    fn test_mint_plan_skips_existing_accounts() {
        let network = network();
        let user = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let addresses = MintAddresses::derive(&network, &user, &mint, &Pubkey::new_unique()).unwrap();
        let pool = PoolAccounts::derive(&network.swap, &user, &mint).unwrap();
        let params = MintParams {
            name: "Fair",
            symbol: "FAIR",
            code_hash: Pubkey::new_unique(),
            create_destination: false,
            create_wsol_account: false,
            compute_units: 500_000,
        };
        let plan = assemble_mint(&network, &addresses, &pool, &params).unwrap();
        assert_eq!(plan.instructions.len(), 2);
    }

    #[test]
    fn test_refund_plan_creates_protocol_account_for_protocol_owner() {
        let network = network();
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let addresses = RefundAddresses::derive(&network, &payer, &mint).unwrap();
        let params = RefundParams {
            name: "Fair",
            symbol: "FAIR",
            create_payer_wsol: false,
            create_protocol_wsol: true,
            compute_units: 300_000,
        };
        let plan = assemble_refund(&network, &addresses, &params).unwrap();
        assert_eq!(plan.instructions.len(), 3);
        let create = &plan.instructions[1];
        // [funder, ata, owner, mint, ...]
        assert_eq!(create.accounts[0].pubkey, payer);
        assert_eq!(create.accounts[1].pubkey, addresses.protocol_wsol_vault);
        assert_eq!(create.accounts[2].pubkey, network.protocol_fee_account);
    }
}
