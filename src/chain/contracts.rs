//! Contract interfaces queried through `eth_call`.

use super::ChainReader;
use crate::error::{ChainError, ChainResult};
use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolCall};
use tracing::debug;

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }

    interface IERC721Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function totalSupply() external view returns (uint256);
    }

    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    interface IEnsResolver {
        function name(bytes32 node) external view returns (string);
        function addr(bytes32 node) external view returns (address);
    }
}

/// ABI-encode `call`, run it against `to` and decode the return data.
pub async fn call_contract<R, C>(
    reader: &R,
    to: alloy_primitives::Address,
    call: C,
) -> ChainResult<C::Return>
where
    R: ChainReader + ?Sized,
    C: SolCall + Send,
{
    debug!("eth_call {} on {}", C::SIGNATURE, to);

    let data = reader.call(to, Bytes::from(call.abi_encode())).await?;
    if data.is_empty() {
        return Err(ChainError::decode(C::SIGNATURE, "empty return data"));
    }

    C::abi_decode_returns(&data, true).map_err(|e| ChainError::decode(C::SIGNATURE, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};

    #[test]
    fn test_balance_of_encoding() {
        let account = address!("d8da6bf26964af9d7eed9e03e53415d37aa96045");
        let encoded = IERC20::balanceOfCall { account }.abi_encode();

        assert_eq!(encoded.len(), 4 + 32);
        assert_eq!(&encoded[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(&encoded[16..], account.as_slice());
    }

    #[test]
    fn test_string_return_decoding() {
        let data = IERC721Metadata::nameCall::abi_encode_returns(&("CryptoPunks".to_string(),));
        let decoded = IERC721Metadata::nameCall::abi_decode_returns(&data, true).unwrap();
        assert_eq!(decoded._0, "CryptoPunks");
    }

    #[test]
    fn test_uint_return_decoding() {
        let data = IERC721Metadata::totalSupplyCall::abi_encode_returns(&(U256::from(10_000),));
        let decoded = IERC721Metadata::totalSupplyCall::abi_decode_returns(&data, true).unwrap();
        assert_eq!(decoded._0, U256::from(10_000));
    }
}
