use alloy::primitives::Address;
use serde::{Serialize, Serializer};

/// Snapshot of a Uniswap V3 pool pairing the requested token with the
/// reference asset, built from on-chain reads at query time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDescriptor {
    pub pool_address: Address,
    pub fee_tier: u32,
    pub token0: Address,
    pub token1: Address,
    pub symbol0: String,
    pub symbol1: String,
    pub decimals0: u8,
    pub decimals1: u8,
    pub tick: i32,
    #[serde(serialize_with = "as_string")]
    pub liquidity: u128,
    pub token_is_token0: bool,
    /// Reference-asset units paid for one unit of the requested token.
    pub price: f64,
    /// Requested-token units per one reference-asset unit. `None` when the
    /// pool does not pair the token against the reference asset.
    #[serde(skip)]
    pub tokens_per_reference: Option<f64>,
    /// Display form of `tokens_per_reference`.
    pub reference_format: Option<String>,
}

impl PoolDescriptor {
    pub fn token_symbol(&self) -> &str {
        if self.token_is_token0 {
            &self.symbol0
        } else {
            &self.symbol1
        }
    }
}

fn as_string<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
