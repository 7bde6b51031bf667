use super::{FlowError, FlowOutput, Orchestrator};
use crate::decode::{CodeAccountData, TokenConfigData, TokenReferralData};
use crate::fee::{compute_fee, FeeQuote};
use crate::program::REFERRAL_USAGE_CAP;
use crate::structured_logging::FlowLogger;
use crate::tx_builder::{assemble_mint, MessageFormat, MintAddresses, MintParams, PoolAccounts};
use crate::types::{parse_address, FlowResult, ReferralRecord, TransactionPayload};
use solana_sdk::pubkey::Pubkey;

pub const REFERRAL_USED_UP: &str = "This referral code has been used up";

/// Usage cap applies unless the referrer is the token's admin
pub(crate) fn check_usage_cap(record: &TokenReferralData, admin: &Pubkey) -> Result<(), FlowError> {
    if record.usage_count >= REFERRAL_USAGE_CAP && record.referrer_main != *admin {
        return Err(FlowError::precondition(REFERRAL_USED_UP));
    }
    Ok(())
}

impl Orchestrator {
    /// Mint the current epoch's allotment of `mint_address` using referral `code`
    pub async fn mint(&self, mint_address: &str, code: &str) -> FlowResult<TransactionPayload> {
        let (logger, timer) = self.begin("mint", mint_address);
        let result = self.try_mint(&logger, mint_address, code).await;
        self.finish(&logger, &timer, result)
    }

    async fn try_mint(
        &self,
        logger: &FlowLogger,
        mint_address: &str,
        code: &str,
    ) -> Result<FlowOutput<TransactionPayload>, FlowError> {
        let wallet = self.wallet()?;
        let user = wallet.pubkey();
        if mint_address.trim().is_empty() {
            return Err(FlowError::validation("Mint address is not provided"));
        }
        let mint = parse_address("Mint address", mint_address)?;
        if code.is_empty() {
            return Err(FlowError::validation("Urc code is not provided"));
        }

        let referral = self.resolve_referral(code).await?;
        logger.log_step("referral", &referral.referrer_main.to_string());
        let addresses =
            MintAddresses::derive(&self.config.network, &user, &mint, &referral.referrer_main)?;

        if !self.ledger.account_exists(&addresses.referrer_ata).await? {
            return Err(FlowError::precondition("Referrer ata not exist"));
        }
        let record: TokenReferralData = self
            .fetch_optional(&addresses.referral_account)
            .await?
            .ok_or_else(|| FlowError::precondition("Referral account does not exist"))?;
        if record.code_hash != referral.code_hash {
            return Err(FlowError::precondition("Code hash not match"));
        }
        let token_config: TokenConfigData = self
            .fetch_optional(&addresses.config_account)
            .await?
            .ok_or_else(|| FlowError::precondition("Token config account does not exist"))?;
        check_usage_cap(&record, &token_config.admin)?;
        if referral.referrer_main == user {
            return Err(FlowError::precondition("Referrer can not be same as wallet"));
        }

        let quote = self
            .quote_with_config(&mint, &token_config, &addresses.referrer_ata)
            .await?;
        let balance = self.ledger.get_balance(&user).await?;
        logger.log_step("quote", &format!("fee={} balance={}", quote.fee, balance));
        if balance == 0 || balance < quote.fee {
            return Err(FlowError::precondition("Balance not enough"));
        }

        let metadata = self.read_metadata(&mint).await?;
        let pool = PoolAccounts::derive(&self.config.network.swap, &user, &mint)?;
        let params = MintParams {
            name: &metadata.name,
            symbol: &metadata.symbol,
            code_hash: referral.code_hash,
            create_destination: !self.ledger.account_exists(&addresses.destination).await?,
            create_wsol_account: !self
                .ledger
                .account_exists(&addresses.destination_wsol_ata)
                .await?,
            compute_units: self.pipeline.config().mint_compute_units,
        };
        let plan = assemble_mint(&self.config.network, &addresses, &pool, &params)?;
        logger.log_step("assembled", &format!("{} instructions", plan.instructions.len()));

        let table = self
            .lookup_table()
            .await?
            .ok_or_else(|| FlowError::precondition("Address lookup table not found"))?;
        let built = self
            .build(&user, &plan, Some(MessageFormat::V0), Some(&table))
            .await?;
        let receipt = self.submit(wallet.as_ref(), built).await?;

        let signature = receipt.signature.map(|s| s.to_string());
        Ok(FlowOutput {
            data: TransactionPayload {
                wallet_address: user,
                token_account_address: addresses.destination,
                wrapped_native_account_address: addresses.destination_wsol_ata,
                transaction_signature: signature.clone(),
                token_page_url: self.config.network.token_page_url(&mint),
            },
            signature,
            caveat: receipt.caveat().map(str::to_string),
        })
    }

    /// Fee for minting `mint` through the referrer holding `referrer_ata`
    pub(super) async fn quote_with_config(
        &self,
        mint: &Pubkey,
        token_config: &TokenConfigData,
        referrer_ata: &Pubkey,
    ) -> Result<FeeQuote, FlowError> {
        let supply = self.mint_info(mint).await?.supply;
        let referrer_balance = self
            .ledger
            .get_token_account_balance(referrer_ata)
            .await?
            .unwrap_or(0);
        Ok(compute_fee(
            token_config.fee_rate(),
            token_config.difficulty_coefficient(),
            referrer_balance,
            supply,
        )?)
    }

    /// code → code hash → code account → referral record
    pub(super) async fn resolve_referral(&self, code: &str) -> Result<ReferralRecord, FlowError> {
        if code.is_empty() {
            return Err(FlowError::validation("Urc code is not provided"));
        }
        let (code_hash, _) = self.pdas.code_hash(code)?;
        let (code_account, _) = self.pdas.code_account(&code_hash)?;
        let pointer: CodeAccountData = self
            .fetch_optional(&code_account)
            .await?
            .ok_or_else(|| FlowError::precondition("Code account does not exist"))?;
        let referral: TokenReferralData = self
            .fetch_optional(&pointer.referral_account)
            .await?
            .ok_or_else(|| FlowError::precondition("Referral account does not exist"))?;
        Ok(ReferralRecord {
            code_hash,
            referrer_main: referral.referrer_main,
            referrer_ata: referral.referrer_ata,
            usage_count: referral.usage_count,
            referral_account: pointer.referral_account,
        })
    }
}
