pub mod abi;
pub mod rpc;
#[cfg(test)]
pub mod stub;

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Read-only handle to a node: view calls and non-mutating call simulation.
#[async_trait]
pub trait ChainConnection: Send + Sync {
    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<Bytes, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;
}

/// Hands out one verified live connection per request.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn connection(&self) -> Result<Arc<dyn ChainConnection>, ChainError>;
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC setup error: {0}")]
    Setup(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("failed to decode {call} result: {reason}")]
    Decode { call: &'static str, reason: String },
    #[error("All providers failed")]
    AllProvidersFailed,
}

/// Encodes `call`, runs it against `to` and decodes the typed return value.
pub async fn read<C>(conn: &dyn ChainConnection, to: Address, call: C) -> Result<C::Return, ChainError>
where
    C: SolCall + Send,
{
    let data = conn.call(to, call.abi_encode()).await?;
    C::abi_decode_returns(&data).map_err(|e| ChainError::Decode {
        call: C::SIGNATURE,
        reason: e.to_string(),
    })
}
