use alloy::primitives::{
    aliases::{U160, U24},
    utils::{format_units, parse_units},
    Address, U256,
};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{PoolDescriptor, Quote, QuoteFailure, QuoteResult, QuotingMethod};
use crate::sources::abi::IQuoter;
use crate::sources::{read, ChainConnection, ChainError};
use crate::utils::format_fixed;

/// Scale factors are floored to this many fractional steps (three decimals).
const SCALE_PRECISION: u64 = 1_000;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("cannot encode amount {amount} with {decimals} decimals: {reason}")]
    Units {
        amount: String,
        decimals: u8,
        reason: String,
    },
    #[error("probe {probe} is not below requested amount {requested}")]
    ProbeTooLarge { probe: f64, requested: f64 },
    #[error("pool has no usable reference-asset price")]
    NoSpotPrice,
    #[error("amount overflow while scaling")]
    Overflow,
}

/// Everything a strategy needs to price one request.
pub struct QuoteRequest<'a> {
    pub token: Address,
    pub pool: &'a PoolDescriptor,
    pub token_decimals: u8,
    pub amount: f64,
}

/// Raw output of a successful strategy, in token base units.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub method: QuotingMethod,
    pub used_amount: f64,
    pub amount_out: U256,
}

/// Simulates exact-input single-hop swaps from the reference asset.
pub struct Quoter {
    address: Address,
    reference_asset: Address,
    reference_decimals: u8,
}

impl Quoter {
    pub fn new(address: Address, reference_asset: Address, reference_decimals: u8) -> Self {
        Self {
            address,
            reference_asset,
            reference_decimals,
        }
    }

    pub fn reference_units(&self, amount: f64) -> Result<U256, StrategyError> {
        to_units(amount, self.reference_decimals)
    }

    /// `eth_call` of the quoter; the quoter reverts internally, so this is
    /// never sent as a transaction.
    pub async fn quote_exact_input(
        &self,
        conn: &dyn ChainConnection,
        token_out: Address,
        fee_tier: u32,
        amount_in: U256,
    ) -> Result<U256, ChainError> {
        let call = IQuoter::quoteExactInputSingleCall {
            tokenIn: self.reference_asset,
            tokenOut: token_out,
            fee: U24::from(fee_tier),
            amountIn: amount_in,
            sqrtPriceLimitX96: U160::ZERO,
        };
        read(conn, self.address, call).await
    }
}

/// One step of the quoting cascade.
#[async_trait]
pub trait QuoteStrategy: Send + Sync {
    fn name(&self) -> String;

    async fn attempt(
        &self,
        quoter: &Quoter,
        req: &QuoteRequest<'_>,
        conn: &dyn ChainConnection,
    ) -> Result<Attempt, StrategyError>;
}

/// Quotes the full requested size.
pub struct DirectQuote;

#[async_trait]
impl QuoteStrategy for DirectQuote {
    fn name(&self) -> String {
        "direct".to_string()
    }

    async fn attempt(
        &self,
        quoter: &Quoter,
        req: &QuoteRequest<'_>,
        conn: &dyn ChainConnection,
    ) -> Result<Attempt, StrategyError> {
        let amount_in = quoter.reference_units(req.amount)?;
        let amount_out = quoter
            .quote_exact_input(conn, req.token, req.pool.fee_tier, amount_in)
            .await?;
        Ok(Attempt {
            method: QuotingMethod::Direct,
            used_amount: req.amount,
            amount_out,
        })
    }
}

/// Quotes a smaller probe size and extrapolates linearly.
pub struct ScaledQuote {
    pub probe: f64,
}

#[async_trait]
impl QuoteStrategy for ScaledQuote {
    fn name(&self) -> String {
        format!("scaled({})", self.probe)
    }

    async fn attempt(
        &self,
        quoter: &Quoter,
        req: &QuoteRequest<'_>,
        conn: &dyn ChainConnection,
    ) -> Result<Attempt, StrategyError> {
        if self.probe >= req.amount {
            return Err(StrategyError::ProbeTooLarge {
                probe: self.probe,
                requested: req.amount,
            });
        }

        let requested_in = quoter.reference_units(req.amount)?;
        let probe_in = quoter.reference_units(self.probe)?;
        let probe_out = quoter
            .quote_exact_input(conn, req.token, req.pool.fee_tier, probe_in)
            .await?;

        Ok(Attempt {
            method: QuotingMethod::Scaled,
            used_amount: self.probe,
            amount_out: scale_output(probe_out, requested_in, probe_in)?,
        })
    }
}

/// Last resort: the pool's tick price times the requested amount.
pub struct SpotPriceQuote;

#[async_trait]
impl QuoteStrategy for SpotPriceQuote {
    fn name(&self) -> String {
        "spot price".to_string()
    }

    async fn attempt(
        &self,
        _quoter: &Quoter,
        req: &QuoteRequest<'_>,
        _conn: &dyn ChainConnection,
    ) -> Result<Attempt, StrategyError> {
        let rate = req
            .pool
            .tokens_per_reference
            .filter(|r| r.is_finite() && *r > 0.0)
            .ok_or(StrategyError::NoSpotPrice)?;

        Ok(Attempt {
            method: QuotingMethod::SpotPrice,
            used_amount: req.amount,
            amount_out: to_units(rate * req.amount, req.token_decimals)?,
        })
    }
}

/// `probe_out * floor(requested_in / probe_in, 3 decimals)`.
pub fn scale_output(probe_out: U256, requested_in: U256, probe_in: U256) -> Result<U256, StrategyError> {
    let precision = U256::from(SCALE_PRECISION);
    let factor = requested_in
        .checked_mul(precision)
        .and_then(|v| v.checked_div(probe_in))
        .ok_or(StrategyError::Overflow)?;
    probe_out
        .checked_mul(factor)
        .map(|v| v / precision)
        .ok_or(StrategyError::Overflow)
}

/// Encodes a decimal amount into integer base units, truncating digits
/// beyond `decimals`.
pub fn to_units(amount: f64, decimals: u8) -> Result<U256, StrategyError> {
    let err = |reason: String| StrategyError::Units {
        amount: amount.to_string(),
        decimals,
        reason,
    };
    if !amount.is_finite() || amount < 0.0 {
        return Err(err("not a non-negative finite number".to_string()));
    }

    // f64 Display is the shortest round-trip form and never uses exponents.
    let mut text = amount.to_string();
    if let Some(dot) = text.find('.') {
        let keep = if decimals == 0 {
            dot
        } else {
            (dot + 1 + decimals as usize).min(text.len())
        };
        text.truncate(keep);
    }

    parse_units(&text, decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| err(e.to_string()))
}

pub fn apply_price_impact(amount: f64, price_impact_percent: f64) -> f64 {
    amount * (1.0 + price_impact_percent / 100.0)
}

pub struct QuoteEngine {
    quoter: Quoter,
    reference_symbol: String,
    price_impact_percent: f64,
    strategies: Vec<Box<dyn QuoteStrategy>>,
}

impl QuoteEngine {
    /// Direct, then one scaled attempt per probe (largest first), then spot price.
    pub fn new(
        quoter: Quoter,
        reference_symbol: String,
        price_impact_percent: f64,
        probe_amounts: &[f64],
    ) -> Self {
        let mut strategies: Vec<Box<dyn QuoteStrategy>> = vec![Box::new(DirectQuote)];
        strategies.extend(
            probe_amounts
                .iter()
                .map(|&probe| Box::new(ScaledQuote { probe }) as Box<dyn QuoteStrategy>),
        );
        strategies.push(Box::new(SpotPriceQuote));
        Self::with_strategies(quoter, reference_symbol, price_impact_percent, strategies)
    }

    pub fn with_strategies(
        quoter: Quoter,
        reference_symbol: String,
        price_impact_percent: f64,
        strategies: Vec<Box<dyn QuoteStrategy>>,
    ) -> Self {
        Self {
            quoter,
            reference_symbol,
            price_impact_percent,
            strategies,
        }
    }

    /// Runs the cascade and stops at the first strategy that yields an amount.
    pub async fn get_quote(
        &self,
        token: Address,
        pool: &PoolDescriptor,
        token_decimals: u8,
        conn: &dyn ChainConnection,
        amount: f64,
    ) -> QuoteResult {
        let req = QuoteRequest {
            token,
            pool,
            token_decimals,
            amount,
        };

        let mut last_error = None;
        for strategy in &self.strategies {
            let outcome = match strategy.attempt(&self.quoter, &req, conn).await {
                Ok(attempt) => self.finish(&req, attempt),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(quote) => {
                    info!(
                        "✓ {} quote for {}: {} ({} {})",
                        quote.quoting_method, token, quote.quote_format, amount, self.reference_symbol
                    );
                    return QuoteResult::Quoted(quote);
                }
                Err(e) => {
                    warn!("{} quote failed for {}: {}", strategy.name(), token, e);
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no quoting strategy configured".to_string());
        QuoteResult::Failed(QuoteFailure {
            success: false,
            error: format!("Failed to get quote: {reason}"),
            eth_amount: amount,
            quoting_method: QuotingMethod::Failed,
            price_impact: self.price_impact_percent,
            price: pool.price,
            token_per_eth: pool.reference_format.clone(),
            pool_format: self.pool_format(pool),
        })
    }

    fn finish(&self, req: &QuoteRequest<'_>, attempt: Attempt) -> Result<Quote, StrategyError> {
        let units_err = |reason: String| StrategyError::Units {
            amount: attempt.amount_out.to_string(),
            decimals: req.token_decimals,
            reason,
        };
        let raw_quote =
            format_units(attempt.amount_out, req.token_decimals).map_err(|e| units_err(e.to_string()))?;
        let raw: f64 = raw_quote.parse().map_err(|e: std::num::ParseFloatError| units_err(e.to_string()))?;

        let adjusted_quote = format_fixed(apply_price_impact(raw, self.price_impact_percent), 2);
        let quote_format = format!("{} {}", adjusted_quote, req.pool.token_symbol());

        Ok(Quote {
            eth_amount: req.amount,
            quoting_method: attempt.method,
            used_amount: attempt.used_amount,
            raw_quote,
            price_impact: self.price_impact_percent,
            adjusted_quote,
            token_per_eth: req.pool.reference_format.clone(),
            quote_format,
            pool_format: self.pool_format(req.pool),
        })
    }

    fn pool_format(&self, pool: &PoolDescriptor) -> Option<String> {
        pool.reference_format.as_ref().map(|rate| {
            format!("{} {} per 1 {}", rate, pool.token_symbol(), self.reference_symbol)
        })
    }
}
