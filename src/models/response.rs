use serde::Serialize;
use super::{PoolDescriptor, QuoteResult, TokenDescriptor};

/// Top-level result of a token quote. `success` only reflects token and pool
/// discovery; the quote carries its own failure shape.
#[derive(Debug, Clone, Serialize)]
pub struct TokenQuoteResponse {
    pub success: bool,
    pub token: Option<TokenDescriptor>,
    pub pool: Option<PoolDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuoteResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TokenQuoteResponse {
    pub fn failed(
        error: String,
        token: Option<TokenDescriptor>,
        pool: Option<PoolDescriptor>,
    ) -> Self {
        Self {
            success: false,
            token,
            pool,
            quote: None,
            error: Some(error),
        }
    }
}
