pub mod pool_locator;
pub mod quote_engine;
pub mod quote_service;
pub mod tick_math;
pub mod token_info;

pub use quote_service::QuoteService;
