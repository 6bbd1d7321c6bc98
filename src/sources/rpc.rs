use alloy::{
    primitives::{Address, Bytes, U64},
    rpc::{
        client::RpcClient,
        types::{BlockNumberOrTag, TransactionInput, TransactionRequest},
    },
    transports::{http::Http, TransportError},
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ChainConnection, ChainError, ConnectionProvider};

/// JSON-RPC connection to a single node. Timeouts are enforced by the
/// underlying HTTP client and surface as ordinary transport errors.
pub struct RpcConnection {
    url: String,
    rpc: RpcClient,
}

impl RpcConnection {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ChainError> {
        let parsed = Url::parse(url).map_err(|e| ChainError::Setup(format!("{url}: {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Setup(e.to_string()))?;
        let rpc = RpcClient::new(Http::with_client(client, parsed), false);
        Ok(Self { url: url.to_string(), rpc })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn map_transport_error(e: TransportError) -> ChainError {
    match e.as_error_resp() {
        Some(payload) => ChainError::Reverted(payload.message.to_string()),
        None => ChainError::Transport(e.to_string()),
    }
}

#[async_trait]
impl ChainConnection for RpcConnection {
    async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<Bytes, ChainError> {
        let request = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::both(calldata.into()));
        debug!(%to, url = %self.url, "eth_call");
        self.rpc
            .request("eth_call", (request, BlockNumberOrTag::Latest))
            .await
            .map_err(map_transport_error)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let block: U64 = self
            .rpc
            .request_noparams("eth_blockNumber")
            .await
            .map_err(map_transport_error)?;
        Ok(block.to::<u64>())
    }
}

/// Tries each candidate endpoint in order and returns the first one that
/// answers `eth_blockNumber`.
pub struct FailoverProvider {
    candidates: Vec<(String, Arc<dyn ChainConnection>)>,
}

impl FailoverProvider {
    pub fn new(candidates: Vec<(String, Arc<dyn ChainConnection>)>) -> Self {
        Self { candidates }
    }

    pub fn from_urls(urls: &[String], timeout: Duration) -> Result<Self, ChainError> {
        let mut candidates: Vec<(String, Arc<dyn ChainConnection>)> = Vec::with_capacity(urls.len());
        for url in urls {
            let conn = RpcConnection::new(url, timeout)?;
            candidates.push((conn.url().to_string(), Arc::new(conn)));
        }
        Ok(Self::new(candidates))
    }
}

#[async_trait]
impl ConnectionProvider for FailoverProvider {
    async fn connection(&self) -> Result<Arc<dyn ChainConnection>, ChainError> {
        for (url, conn) in &self.candidates {
            match conn.block_number().await {
                Ok(block) => {
                    info!("✓ Connected to provider: {} (block {})", url, block);
                    return Ok(conn.clone());
                }
                Err(e) => warn!("Provider {} failed: {}", url, e),
            }
        }
        Err(ChainError::AllProvidersFailed)
    }
}
