use super::{FlowError, FlowOutput, Orchestrator};
use crate::decode::TokenRefundData;
use crate::structured_logging::FlowLogger;
use crate::tx_builder::{assemble_refund, RefundAddresses, RefundParams};
use crate::types::{parse_address, validate_token_identity, FlowResult, TransactionPayload};

/// Caveat reported when the ledger says the refund was already processed
pub const REFUND_CAVEAT: &str = "Something went wrong but you have refund successfully";

impl Orchestrator {
    /// Return the caller's minted tokens for `mint_address` and reclaim fees.
    ///
    /// `name` and `symbol` must derive to `mint_address`.
    pub async fn refund(
        &self,
        mint_address: &str,
        name: &str,
        symbol: &str,
    ) -> FlowResult<TransactionPayload> {
        let (logger, timer) = self.begin("refund", mint_address);
        let result = self.try_refund(&logger, mint_address, name, symbol).await;
        self.finish(&logger, &timer, result)
    }

    async fn try_refund(
        &self,
        logger: &FlowLogger,
        mint_address: &str,
        name: &str,
        symbol: &str,
    ) -> Result<FlowOutput<TransactionPayload>, FlowError> {
        let wallet = self.wallet()?;
        let payer = wallet.pubkey();
        let mint = parse_address("Mint address", mint_address)?;
        validate_token_identity(name, symbol)?;

        let (expected_mint, _) = self.pdas.mint(name, symbol)?;
        if expected_mint != mint {
            return Err(FlowError::validation("Mint address is not correct"));
        }

        let addresses = RefundAddresses::derive(&self.config.network, &payer, &mint)?;
        let record: TokenRefundData = self
            .fetch_optional(&addresses.refund_account)
            .await?
            .ok_or_else(|| FlowError::precondition("Refund account does not exist"))?;
        if record.owner != payer {
            return Err(FlowError::precondition("Only User Account Allowed"));
        }
        logger.log_step("refund_record", &format!("total_tokens={}", record.total_tokens));

        let params = RefundParams {
            name,
            symbol,
            create_payer_wsol: !self.ledger.account_exists(&addresses.payer_wsol_vault).await?,
            create_protocol_wsol: !self
                .ledger
                .account_exists(&addresses.protocol_wsol_vault)
                .await?,
            compute_units: self.pipeline.config().refund_compute_units,
        };
        let plan = assemble_refund(&self.config.network, &addresses, &params)?;

        let table = self.lookup_table().await?;
        let built = self.build(&payer, &plan, None, table.as_ref()).await?;
        let receipt = self.submit(wallet.as_ref(), built).await?;

        let signature = receipt.signature.map(|s| s.to_string());
        Ok(FlowOutput {
            data: TransactionPayload {
                wallet_address: payer,
                token_account_address: addresses.token_ata,
                wrapped_native_account_address: addresses.payer_wsol_vault,
                transaction_signature: signature.clone(),
                token_page_url: self.config.network.token_page_url(&mint),
            },
            signature,
            caveat: receipt.caveat().map(|_| REFUND_CAVEAT.to_string()),
        })
    }
}
