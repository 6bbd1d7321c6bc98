use alloy::primitives::Address;
use serde::Serialize;

/// ERC-20 metadata read fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenDescriptor {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}
