use alloy::primitives::Address;
use tracing::debug;

use crate::models::TokenDescriptor;
use crate::sources::abi::IERC20;
use crate::sources::{read, ChainConnection, ChainError};

pub async fn read_symbol(conn: &dyn ChainConnection, token: Address) -> Result<String, ChainError> {
    read(conn, token, IERC20::symbolCall {}).await
}

pub async fn read_decimals(conn: &dyn ChainConnection, token: Address) -> Result<u8, ChainError> {
    read(conn, token, IERC20::decimalsCall {}).await
}

pub async fn read_name(conn: &dyn ChainConnection, token: Address) -> Result<String, ChainError> {
    read(conn, token, IERC20::nameCall {}).await
}

/// Reads symbol, name and decimals. Any failed read fails the lookup.
pub async fn get_token_info(
    token: Address,
    conn: &dyn ChainConnection,
) -> Result<TokenDescriptor, ChainError> {
    let (symbol, name, decimals) = futures::try_join!(
        read_symbol(conn, token),
        read_name(conn, token),
        read_decimals(conn, token),
    )?;
    debug!(%token, %symbol, decimals, "token metadata");

    Ok(TokenDescriptor {
        address: token,
        symbol,
        name,
        decimals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::stub::StubConnection;
    use alloy::primitives::{address, U256};

    const TOKEN: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

    #[tokio::test]
    async fn reads_all_metadata() {
        let conn = StubConnection::new().with_erc20(TOKEN, "DAI", 18);
        let info = get_token_info(TOKEN, &conn).await.unwrap();
        assert_eq!(
            info,
            TokenDescriptor {
                address: TOKEN,
                symbol: "DAI".to_string(),
                name: "DAI Token".to_string(),
                decimals: 18,
            }
        );
    }

    #[tokio::test]
    async fn fails_when_any_read_reverts() {
        let conn = StubConnection::new()
            .with_call(TOKEN, IERC20::symbolCall {}, &"DAI".to_string())
            .with_call(TOKEN, IERC20::decimalsCall {}, &18u8)
            .with_revert(TOKEN, IERC20::nameCall {}, "not an ERC-20");
        let err = get_token_info(TOKEN, &conn).await.unwrap_err();
        assert!(matches!(err, ChainError::Reverted(_)));
    }

    #[tokio::test]
    async fn rejects_out_of_range_decimals() {
        let conn = StubConnection::new()
            .with_call(TOKEN, IERC20::symbolCall {}, &"BAD".to_string())
            .with_call(TOKEN, IERC20::nameCall {}, &"Bad".to_string())
            .with_raw(TOKEN, IERC20::decimalsCall {}, U256::from(1024).to_be_bytes::<32>().to_vec());
        let err = get_token_info(TOKEN, &conn).await.unwrap_err();
        assert!(matches!(err, ChainError::Decode { .. }));
    }
}
