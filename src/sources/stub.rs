//! Deterministic in-memory chain used by unit tests.

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::abi::IERC20;
use super::{ChainConnection, ChainError, ConnectionProvider};

/// Answers calls whose `(to, calldata)` was registered up front; anything
/// else reverts.
pub struct StubConnection {
    responses: HashMap<(Address, Vec<u8>), Result<Bytes, String>>,
    block_number: Option<u64>,
    calls: AtomicUsize,
}

impl StubConnection {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            block_number: Some(1),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_block_number(mut self, block: Option<u64>) -> Self {
        self.block_number = block;
        self
    }

    pub fn with_call<C: SolCall>(mut self, to: Address, call: C, ret: &C::Return) -> Self {
        self.responses
            .insert((to, call.abi_encode()), Ok(C::abi_encode_returns(ret).into()));
        self
    }

    pub fn with_revert<C: SolCall>(mut self, to: Address, call: C, reason: &str) -> Self {
        self.responses
            .insert((to, call.abi_encode()), Err(reason.to_string()));
        self
    }

    /// Registers raw return bytes, for responses the typed encoder cannot express.
    pub fn with_raw<C: SolCall>(mut self, to: Address, call: C, data: Vec<u8>) -> Self {
        self.responses.insert((to, call.abi_encode()), Ok(data.into()));
        self
    }

    /// Symbol, name (`"<symbol> Token"`) and decimals for an ERC-20.
    pub fn with_erc20(self, token: Address, symbol: &str, decimals: u8) -> Self {
        self.with_call(token, IERC20::symbolCall {}, &symbol.to_string())
            .with_call(token, IERC20::nameCall {}, &format!("{symbol} Token"))
            .with_call(token, IERC20::decimalsCall {}, &decimals)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChainConnection for StubConnection {
    async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<Bytes, ChainError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.responses.get(&(to, calldata)) {
            Some(Ok(data)) => Ok(data.clone()),
            Some(Err(reason)) => Err(ChainError::Reverted(reason.clone())),
            None => Err(ChainError::Reverted("no stubbed response".to_string())),
        }
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.block_number
            .ok_or_else(|| ChainError::Transport("connection refused".to_string()))
    }
}

/// Always hands out the same connection, or fails like an exhausted failover.
pub struct StubProvider {
    conn: Option<Arc<StubConnection>>,
}

impl StubProvider {
    pub fn new(conn: Arc<StubConnection>) -> Self {
        Self { conn: Some(conn) }
    }

    pub fn unavailable() -> Self {
        Self { conn: None }
    }
}

#[async_trait]
impl ConnectionProvider for StubProvider {
    async fn connection(&self) -> Result<Arc<dyn ChainConnection>, ChainError> {
        match &self.conn {
            Some(conn) => Ok(conn.clone()),
            None => Err(ChainError::AllProvidersFailed),
        }
    }
}
