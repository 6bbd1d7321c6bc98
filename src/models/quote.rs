use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuotingMethod {
    #[serde(rename = "direct")]
    Direct,
    #[serde(rename = "scaled")]
    Scaled,
    #[serde(rename = "spot price")]
    SpotPrice,
    #[serde(rename = "failed")]
    Failed,
}

impl std::fmt::Display for QuotingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotingMethod::Direct => write!(f, "direct"),
            QuotingMethod::Scaled => write!(f, "scaled"),
            QuotingMethod::SpotPrice => write!(f, "spot price"),
            QuotingMethod::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub eth_amount: f64,
    pub quoting_method: QuotingMethod,
    /// Reference amount actually simulated (the probe size for scaled quotes).
    pub used_amount: f64,
    pub raw_quote: String,
    pub price_impact: f64,
    pub adjusted_quote: String,
    pub token_per_eth: Option<String>,
    pub quote_format: String,
    pub pool_format: Option<String>,
}

/// Returned when no strategy in the cascade produced an amount. Keeps the
/// pool pricing so callers still have something to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFailure {
    pub success: bool,
    pub error: String,
    pub eth_amount: f64,
    pub quoting_method: QuotingMethod,
    pub price_impact: f64,
    pub price: f64,
    pub token_per_eth: Option<String>,
    pub pool_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuoteResult {
    Quoted(Quote),
    Failed(QuoteFailure),
}

impl QuoteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, QuoteResult::Quoted(_))
    }

    pub fn method(&self) -> QuotingMethod {
        match self {
            QuoteResult::Quoted(q) => q.quoting_method,
            QuoteResult::Failed(f) => f.quoting_method,
        }
    }
}
