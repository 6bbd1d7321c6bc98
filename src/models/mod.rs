pub mod pool;
pub mod quote;
pub mod response;
pub mod token;

pub use pool::PoolDescriptor;
pub use quote::{Quote, QuoteFailure, QuoteResult, QuotingMethod};
pub use response::TokenQuoteResponse;
pub use token::TokenDescriptor;
