use alloy::primitives::{aliases::U24, Address};
use tracing::{debug, instrument, warn};

use super::tick_math::price_from_tick;
use super::token_info::{read_decimals, read_symbol};
use crate::models::PoolDescriptor;
use crate::sources::abi::{IUniswapV3Factory, IUniswapV3Pool};
use crate::sources::{read, ChainConnection, ChainError};
use crate::utils::format_number;

/// Finds the pool pairing a token with the reference asset and reads its state.
pub struct PoolLocator {
    factory: Address,
    reference_asset: Address,
}

impl PoolLocator {
    pub fn new(factory: Address, reference_asset: Address) -> Self {
        Self {
            factory,
            reference_asset,
        }
    }

    /// Best effort: a missing pool and a failed read both come back as `None`.
    #[instrument(skip(self, conn))]
    pub async fn locate(
        &self,
        token: Address,
        fee_tier: u32,
        conn: &dyn ChainConnection,
    ) -> Option<PoolDescriptor> {
        match self.try_locate(token, fee_tier, conn).await {
            Ok(Some(pool)) => Some(pool),
            Ok(None) => {
                debug!("no pool for {} at fee tier {}", token, fee_tier);
                None
            }
            Err(e) => {
                warn!("Error getting pool for {}: {}", token, e);
                None
            }
        }
    }

    async fn try_locate(
        &self,
        token: Address,
        fee_tier: u32,
        conn: &dyn ChainConnection,
    ) -> Result<Option<PoolDescriptor>, ChainError> {
        let Some(pool_address) = self.find_pool_address(token, fee_tier, conn).await? else {
            return Ok(None);
        };
        self.read_pool(pool_address, token, fee_tier, conn).await.map(Some)
    }

    async fn find_pool_address(
        &self,
        token: Address,
        fee_tier: u32,
        conn: &dyn ChainConnection,
    ) -> Result<Option<Address>, ChainError> {
        let fee = U24::from(fee_tier);
        let forward = IUniswapV3Factory::getPoolCall {
            tokenA: token,
            tokenB: self.reference_asset,
            fee,
        };
        let pool = read(conn, self.factory, forward).await?;
        if !pool.is_zero() {
            return Ok(Some(pool));
        }

        // Some factories validate argument order; retry reversed.
        let reverse = IUniswapV3Factory::getPoolCall {
            tokenA: self.reference_asset,
            tokenB: token,
            fee,
        };
        let pool = read(conn, self.factory, reverse).await?;
        Ok((!pool.is_zero()).then_some(pool))
    }

    async fn read_pool(
        &self,
        pool_address: Address,
        token: Address,
        fee_tier: u32,
        conn: &dyn ChainConnection,
    ) -> Result<PoolDescriptor, ChainError> {
        let (token0, token1, slot0, liquidity) = futures::try_join!(
            read(conn, pool_address, IUniswapV3Pool::token0Call {}),
            read(conn, pool_address, IUniswapV3Pool::token1Call {}),
            read(conn, pool_address, IUniswapV3Pool::slot0Call {}),
            read(conn, pool_address, IUniswapV3Pool::liquidityCall {}),
        )?;

        let (symbol0, symbol1, decimals0, decimals1) = futures::try_join!(
            read_symbol(conn, token0),
            read_symbol(conn, token1),
            read_decimals(conn, token0),
            read_decimals(conn, token1),
        )?;

        let tick = i32::try_from(slot0.tick).map_err(|e| ChainError::Decode {
            call: "slot0()",
            reason: e.to_string(),
        })?;

        // Address equality is byte-wise, so hex casing in the request is irrelevant.
        let token_is_token0 = token0 == token;
        let pricing = PoolPricing::derive(
            tick,
            decimals0,
            decimals1,
            token_is_token0,
            self.reference_side(token0, token1, token_is_token0),
        );
        debug!(
            %pool_address, tick, token_is_token0, price = pricing.price,
            "pool state"
        );

        Ok(PoolDescriptor {
            pool_address,
            fee_tier,
            token0,
            token1,
            symbol0,
            symbol1,
            decimals0,
            decimals1,
            tick,
            liquidity,
            token_is_token0,
            price: pricing.price,
            tokens_per_reference: pricing.tokens_per_reference,
            reference_format: pricing.tokens_per_reference.map(|v| format_number(v, 2)),
        })
    }

    /// Whether the side opposite the requested token holds the reference asset.
    fn reference_side(&self, token0: Address, token1: Address, token_is_token0: bool) -> bool {
        let other = if token_is_token0 { token1 } else { token0 };
        other == self.reference_asset
    }
}

/// Prices derived from a pool tick, corrected for which side holds the token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolPricing {
    pub price: f64,
    pub tokens_per_reference: Option<f64>,
}

impl PoolPricing {
    pub fn derive(
        tick: i32,
        decimals0: u8,
        decimals1: u8,
        token_is_token0: bool,
        paired_with_reference: bool,
    ) -> Self {
        // Tick price is always token1 per token0.
        let raw = price_from_tick(tick, decimals0, decimals1);
        let price = if token_is_token0 { raw } else { 1.0 / raw };
        let tokens_per_reference = paired_with_reference.then(|| {
            if token_is_token0 {
                1.0 / raw
            } else {
                raw
            }
        });
        Self {
            price,
            tokens_per_reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::abi::IUniswapV3Pool::slot0Return;
    use crate::sources::stub::StubConnection;
    use alloy::primitives::{address, aliases::{I24, U160}};

    const FACTORY: Address = address!("1F98431c8aD98523631AE4a59f267346ea31F984");
    const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    // Sorts above WETH, so WETH is token0 of its pool.
    const PEPE: Address = address!("f982a1fd2e0e9f1ad0a1fe1d4b4a2d2a2a2a2a2a");
    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    const POOL: Address = address!("1111111111111111111111111111111111111111");

    fn locator() -> PoolLocator {
        PoolLocator::new(FACTORY, WETH)
    }

    fn get_pool(a: Address, b: Address) -> IUniswapV3Factory::getPoolCall {
        IUniswapV3Factory::getPoolCall {
            tokenA: a,
            tokenB: b,
            fee: U24::from(100u32),
        }
    }

    fn slot0(tick: i32) -> slot0Return {
        slot0Return {
            sqrtPriceX96: U160::ZERO,
            tick: I24::try_from(tick).unwrap(),
            observationIndex: 0,
            observationCardinality: 1,
            observationCardinalityNext: 1,
            feeProtocol: 0,
            unlocked: true,
        }
    }

    fn with_pool(
        conn: StubConnection,
        token0: Address,
        token1: Address,
        tick: i32,
        liquidity: u128,
    ) -> StubConnection {
        conn.with_call(POOL, IUniswapV3Pool::token0Call {}, &token0)
            .with_call(POOL, IUniswapV3Pool::token1Call {}, &token1)
            .with_call(POOL, IUniswapV3Pool::slot0Call {}, &slot0(tick))
            .with_call(POOL, IUniswapV3Pool::liquidityCall {}, &liquidity)
    }

    #[tokio::test]
    async fn no_pool_in_either_direction_is_none() {
        let conn = StubConnection::new()
            .with_call(FACTORY, get_pool(DAI, WETH), &Address::ZERO)
            .with_call(FACTORY, get_pool(WETH, DAI), &Address::ZERO);
        assert!(locator().locate(DAI, 100, &conn).await.is_none());
        assert_eq!(conn.call_count(), 2);
    }

    #[tokio::test]
    async fn factory_failure_is_none() {
        let conn = StubConnection::new().with_revert(FACTORY, get_pool(DAI, WETH), "boom");
        assert!(locator().locate(DAI, 100, &conn).await.is_none());
    }

    #[tokio::test]
    async fn pool_read_failure_is_none() {
        let conn = StubConnection::new()
            .with_call(FACTORY, get_pool(DAI, WETH), &POOL)
            .with_call(POOL, IUniswapV3Pool::token0Call {}, &DAI)
            .with_call(POOL, IUniswapV3Pool::token1Call {}, &WETH)
            .with_revert(POOL, IUniswapV3Pool::slot0Call {}, "paused");
        assert!(locator().locate(DAI, 100, &conn).await.is_none());
    }

    #[tokio::test]
    async fn token_as_token0() {
        let conn = with_pool(
            StubConnection::new().with_call(FACTORY, get_pool(DAI, WETH), &POOL),
            DAI,
            WETH,
            -76_013,
            5_000_000_000_000_000_000_000u128,
        )
        .with_erc20(DAI, "DAI", 18)
        .with_erc20(WETH, "WETH", 18);

        let pool = locator().locate(DAI, 100, &conn).await.unwrap();
        assert!(pool.token_is_token0);
        assert_eq!(pool.pool_address, POOL);
        assert_eq!(pool.fee_tier, 100);
        assert_eq!((pool.symbol0.as_str(), pool.symbol1.as_str()), ("DAI", "WETH"));
        assert_eq!(pool.token_symbol(), "DAI");
        assert_eq!(pool.liquidity, 5_000_000_000_000_000_000_000u128);

        let raw = price_from_tick(-76_013, 18, 18);
        assert_eq!(pool.price, raw);
        let per_weth = pool.tokens_per_reference.unwrap();
        assert_eq!(per_weth, 1.0 / raw);
        assert!((per_weth - 2000.0).abs() < 1.0);
        assert_eq!(pool.reference_format, Some(format_number(per_weth, 2)));
    }

    #[tokio::test]
    async fn token_as_token1_found_by_reversed_lookup() {
        // Forward lookup misses, reversed argument order finds the pool.
        let conn = with_pool(
            StubConnection::new()
                .with_call(FACTORY, get_pool(PEPE, WETH), &Address::ZERO)
                .with_call(FACTORY, get_pool(WETH, PEPE), &POOL),
            WETH,
            PEPE,
            76_013,
            42,
        )
        .with_erc20(WETH, "WETH", 18)
        .with_erc20(PEPE, "PEPE", 18);

        let pool = locator().locate(PEPE, 100, &conn).await.unwrap();
        assert!(!pool.token_is_token0);
        assert_eq!(pool.token_symbol(), "PEPE");

        let raw = price_from_tick(76_013, 18, 18);
        assert!((raw - 2000.0).abs() < 1.0);
        assert_eq!(pool.price, 1.0 / raw);
        assert_eq!(pool.tokens_per_reference, Some(raw));
        assert_eq!(pool.reference_format.as_deref(), Some(format_number(raw, 2).as_str()));
    }

    #[tokio::test]
    async fn token_order_comes_from_pool_not_lookup() {
        // Factory answers the reversed query, but DAI is still token0.
        let conn = with_pool(
            StubConnection::new()
                .with_call(FACTORY, get_pool(DAI, WETH), &Address::ZERO)
                .with_call(FACTORY, get_pool(WETH, DAI), &POOL),
            DAI,
            WETH,
            0,
            1,
        )
        .with_erc20(DAI, "DAI", 18)
        .with_erc20(WETH, "WETH", 18);

        let pool = locator().locate(DAI, 100, &conn).await.unwrap();
        assert!(pool.token_is_token0);
    }

    #[tokio::test]
    async fn non_reference_pair_has_no_reference_format() {
        let locator = PoolLocator::new(FACTORY, USDC);
        let conn = with_pool(
            StubConnection::new().with_call(
                FACTORY,
                IUniswapV3Factory::getPoolCall {
                    tokenA: DAI,
                    tokenB: USDC,
                    fee: U24::from(100u32),
                },
                &POOL,
            ),
            DAI,
            WETH,
            -76_013,
            1,
        )
        .with_erc20(DAI, "DAI", 18)
        .with_erc20(WETH, "WETH", 18);

        let pool = locator.locate(DAI, 100, &conn).await.unwrap();
        assert!(pool.tokens_per_reference.is_none());
        assert!(pool.reference_format.is_none());
        assert_eq!(pool.price, price_from_tick(-76_013, 18, 18));
    }

    #[test]
    fn inverted_price_matches_opposite_perspective() {
        let a = PoolPricing::derive(1234, 6, 18, false, true);
        let b = PoolPricing::derive(-1234, 18, 6, true, true);
        let rel = ((a.price - b.price) / b.price).abs();
        assert!(rel < 1e-12);
    }

    #[test]
    fn serializes_liquidity_as_string() {
        let pricing = PoolPricing::derive(0, 18, 18, true, true);
        let pool = PoolDescriptor {
            pool_address: POOL,
            fee_tier: 100,
            token0: DAI,
            token1: WETH,
            symbol0: "DAI".into(),
            symbol1: "WETH".into(),
            decimals0: 18,
            decimals1: 18,
            tick: 0,
            liquidity: u128::MAX,
            token_is_token0: true,
            price: pricing.price,
            tokens_per_reference: pricing.tokens_per_reference,
            reference_format: Some("1".into()),
        };
        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["liquidity"], u128::MAX.to_string());
        assert_eq!(json["tokenIsToken0"], true);
        assert_eq!(json["referenceFormat"], "1");
        assert!(json.get("tokensPerReference").is_none());
    }
}
