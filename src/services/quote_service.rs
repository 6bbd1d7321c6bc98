use alloy::primitives::Address;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use super::pool_locator::PoolLocator;
use super::quote_engine::{QuoteEngine, Quoter};
use super::token_info::get_token_info;
use crate::config::Config;
use crate::models::{PoolDescriptor, QuoteResult, TokenDescriptor, TokenQuoteResponse};
use crate::sources::{ChainError, ConnectionProvider};
use crate::utils::format_fee_tier;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("{0}")]
    Connection(ChainError),
    #[error("Failed to get token info: {0}")]
    TokenInfo(ChainError),
    #[error("No {fee_tier} pool found for {symbol}")]
    PoolNotFound { fee_tier: String, symbol: String },
}

/// Partial results kept when a later stage fails.
#[derive(Default)]
struct Progress {
    token: Option<TokenDescriptor>,
    pool: Option<PoolDescriptor>,
}

/// End-to-end "quote this token against the reference asset".
pub struct QuoteService {
    provider: Arc<dyn ConnectionProvider>,
    locator: PoolLocator,
    engine: QuoteEngine,
    fee_tier: u32,
}

impl QuoteService {
    pub fn new(
        provider: Arc<dyn ConnectionProvider>,
        locator: PoolLocator,
        engine: QuoteEngine,
        fee_tier: u32,
    ) -> Self {
        Self {
            provider,
            locator,
            engine,
            fee_tier,
        }
    }

    pub fn from_config(config: &Config, provider: Arc<dyn ConnectionProvider>) -> Self {
        let uniswap = &config.uniswap;
        let locator = PoolLocator::new(uniswap.factory, uniswap.reference_asset);
        let engine = QuoteEngine::new(
            Quoter::new(uniswap.quoter, uniswap.reference_asset, uniswap.reference_decimals),
            uniswap.reference_symbol.clone(),
            config.quote.price_impact_percent,
            &config.quote.probe_amounts,
        );
        Self::new(provider, locator, engine, uniswap.fee_tier)
    }

    /// Never fails: errors become `success: false` with whatever token and
    /// pool data was already read.
    #[instrument(skip(self))]
    pub async fn get_token_with_quote(&self, token: Address, amount: f64) -> TokenQuoteResponse {
        let mut progress = Progress::default();
        match self.run(token, amount, &mut progress).await {
            Ok(quote) => {
                if quote.is_success() {
                    debug!(method = %quote.method(), "quote complete");
                } else {
                    warn!("No live quote for {}, returning pool data only", token);
                }
                TokenQuoteResponse {
                    success: true,
                    token: progress.token,
                    pool: progress.pool,
                    quote: Some(quote),
                    error: None,
                }
            }
            Err(e) => {
                error!("Error processing token {}: {}", token, e);
                TokenQuoteResponse::failed(e.to_string(), progress.token, progress.pool)
            }
        }
    }

    async fn run(
        &self,
        token: Address,
        amount: f64,
        progress: &mut Progress,
    ) -> Result<QuoteResult, QuoteError> {
        let conn = self
            .provider
            .connection()
            .await
            .map_err(QuoteError::Connection)?;

        let info = get_token_info(token, conn.as_ref())
            .await
            .map_err(QuoteError::TokenInfo)?;
        let info = progress.token.insert(info);
        info!("✓ {} ({}) decimals={}", info.symbol, info.name, info.decimals);

        let pool = self
            .locator
            .locate(token, self.fee_tier, conn.as_ref())
            .await
            .ok_or_else(|| QuoteError::PoolNotFound {
                fee_tier: format_fee_tier(self.fee_tier),
                symbol: info.symbol.clone(),
            })?;
        let decimals = info.decimals;
        let pool = progress.pool.insert(pool);

        Ok(self
            .engine
            .get_quote(token, pool, decimals, conn.as_ref(), amount)
            .await)
    }
}
