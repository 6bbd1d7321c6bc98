/// Price ratio between adjacent ticks.
pub const TICK_BASE: f64 = 1.0001;

/// Tick bounds enforced by Uniswap V3 pools (a subset of the int24 range).
pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// token1-per-token0 price at `tick`, adjusted for token decimals.
///
/// Display-grade: the `f64` power loses precision compared to the pool's
/// Q64.96 sqrt price and must not be used for settlement.
pub fn price_from_tick(tick: i32, decimals0: u8, decimals1: u8) -> f64 {
    let decimal_shift = decimals1 as i32 - decimals0 as i32;
    TICK_BASE.powf(tick as f64) * 10f64.powi(decimal_shift)
}
