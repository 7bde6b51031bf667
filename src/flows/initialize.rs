use super::{FlowError, FlowOutput, Orchestrator};
use crate::program::TOKEN_DECIMALS;
use crate::structured_logging::FlowLogger;
use crate::tx_builder::{assemble_initialize, InitializeAddresses};
use crate::types::{validate_token_identity, FlowResult, InitializePayload, TokenMetadata};
use serde::Deserialize;

/// Caller input for launching a token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitializeRequest {
    pub name: String,
    pub symbol: String,
    /// Metadata JSON location, already uploaded
    pub uri: String,
    /// Key into the configured launch presets
    pub token_type: String,
}

impl Orchestrator {
    /// Create the mint, its config account and legacy metadata
    pub async fn initialize(&self, request: &InitializeRequest) -> FlowResult<InitializePayload> {
        let (logger, timer) = self.begin("initialize", &request.symbol);
        let result = self.try_initialize(&logger, request).await;
        self.finish(&logger, &timer, result)
    }

    async fn try_initialize(
        &self,
        logger: &FlowLogger,
        request: &InitializeRequest,
    ) -> Result<FlowOutput<InitializePayload>, FlowError> {
        let wallet = self.wallet()?;
        let payer = wallet.pubkey();
        // the program derives the mint from the NUL-free strings it receives
        let metadata = TokenMetadata {
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            uri: request.uri.clone(),
            decimals: Some(TOKEN_DECIMALS),
        }
        .sanitized();
        validate_token_identity(&metadata.name, &metadata.symbol)?;
        let preset = self
            .preset(&request.token_type)
            .ok_or_else(|| FlowError::validation("Token type not supported"))?;

        let addresses =
            InitializeAddresses::derive(&self.config.network, &metadata.name, &metadata.symbol)?;
        if self.ledger.account_exists(&addresses.mint).await? {
            return Err(FlowError::precondition("Token has already been initialized"));
        }
        logger.log_step("mint_address", &addresses.mint.to_string());

        let start_timestamp = self.clock.now_millis() / 1000;
        let config = preset.to_init_config(start_timestamp);
        let plan = assemble_initialize(
            &self.config.network,
            &payer,
            &addresses,
            &metadata,
            &config,
            self.pipeline.config().initialize_compute_units,
        )?;

        let table = self.lookup_table().await?;
        let built = self.build(&payer, &plan, None, table.as_ref()).await?;
        let receipt = self.submit(wallet.as_ref(), built).await?;

        let signature = receipt.signature.map(|s| s.to_string());
        Ok(FlowOutput {
            data: InitializePayload {
                mint_address: addresses.mint,
                config_account_address: addresses.config_account,
                metadata_account_address: addresses.metadata_account,
                transaction_signature: signature.clone(),
                token_page_url: self.config.network.token_page_url(&addresses.mint),
            },
            signature,
            caveat: receipt.caveat().map(str::to_string),
        })
    }
}
