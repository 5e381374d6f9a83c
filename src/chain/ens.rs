//! ENS reverse resolution.

use super::contracts::{call_contract, IEnsRegistry, IEnsResolver};
use super::ChainReader;
use crate::error::ChainResult;
use crate::models::Address;
use alloy_primitives::{address, keccak256, B256};
use tracing::debug;

/// ENS registry, deployed at the same address on mainnet and Sepolia.
pub const ENS_REGISTRY: alloy_primitives::Address =
    address!("00000000000c2e074ec69a0dfb2997ba6c7d2e1e");

/// EIP-137 namehash.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    for label in name.rsplit('.').filter(|label| !label.is_empty()) {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        node = keccak256(buf);
    }
    node
}

/// Node of `<hex>.addr.reverse` for an address.
pub fn reverse_node(address: &Address) -> B256 {
    let lower = address.to_lowercase();
    namehash(&format!("{}.addr.reverse", &lower[2..]))
}

/// Look up the primary name of `address`. A missing resolver or an empty
/// name both mean "no name".
///
/// Anyone can point their reverse record at any name, so the name is only
/// returned when it forward-resolves back to `address`.
pub async fn reverse_resolve<R>(reader: &R, address: &Address) -> ChainResult<Option<String>>
where
    R: ChainReader + ?Sized,
{
    let node = reverse_node(address);

    let Some(resolver) = resolver_of(reader, node).await? else {
        debug!("No reverse resolver set for {}", address);
        return Ok(None);
    };

    let name = call_contract(reader, resolver, IEnsResolver::nameCall { node })
        .await?
        ._0;
    if name.is_empty() {
        return Ok(None);
    }

    let forward = namehash(&name);
    let Some(resolver) = resolver_of(reader, forward).await? else {
        debug!("{} has no forward resolver, ignoring reverse record", name);
        return Ok(None);
    };

    let resolved = call_contract(reader, resolver, IEnsResolver::addrCall { node: forward })
        .await?
        ._0;
    if resolved != address.to_alloy() {
        debug!(
            "{} resolves to {}, not {}; ignoring reverse record",
            name, resolved, address
        );
        return Ok(None);
    }

    Ok(Some(name))
}

async fn resolver_of<R>(reader: &R, node: B256) -> ChainResult<Option<alloy_primitives::Address>>
where
    R: ChainReader + ?Sized,
{
    let resolver = call_contract(reader, ENS_REGISTRY, IEnsRegistry::resolverCall { node })
        .await?
        ._0;
    Ok((!resolver.is_zero()).then_some(resolver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use alloy_primitives::{b256, Bytes, U256};
    use alloy_sol_types::SolCall;
    use async_trait::async_trait;
    use std::collections::HashMap;

    const OWNER: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
    const RESOLVER: alloy_primitives::Address =
        address!("231b0ee14048e9dccd1d247744d114a4eb5e8e63");

    /// Answers `eth_call` from a table keyed by target and calldata.
    #[derive(Default)]
    struct EnsChain {
        calls: HashMap<(alloy_primitives::Address, Vec<u8>), Vec<u8>>,
    }

    impl EnsChain {
        fn answer<C: SolCall>(&mut self, to: alloy_primitives::Address, call: C, ret: Vec<u8>) {
            self.calls.insert((to, call.abi_encode()), ret);
        }

        /// Reverse record of `owner` naming `name`, whose forward record
        /// points at `forward_target`.
        fn with_records(
            owner: &Address,
            name: &str,
            forward_target: alloy_primitives::Address,
        ) -> Self {
            let mut chain = Self::default();
            let reverse = reverse_node(owner);
            let forward = namehash(name);

            chain.answer(
                ENS_REGISTRY,
                IEnsRegistry::resolverCall { node: reverse },
                IEnsRegistry::resolverCall::abi_encode_returns(&(RESOLVER,)),
            );
            chain.answer(
                RESOLVER,
                IEnsResolver::nameCall { node: reverse },
                IEnsResolver::nameCall::abi_encode_returns(&(name.to_string(),)),
            );
            chain.answer(
                ENS_REGISTRY,
                IEnsRegistry::resolverCall { node: forward },
                IEnsRegistry::resolverCall::abi_encode_returns(&(RESOLVER,)),
            );
            chain.answer(
                RESOLVER,
                IEnsResolver::addrCall { node: forward },
                IEnsResolver::addrCall::abi_encode_returns(&(forward_target,)),
            );
            chain
        }
    }

    #[async_trait]
    impl ChainReader for EnsChain {
        async fn native_balance(&self, _address: &Address) -> ChainResult<U256> {
            Ok(U256::ZERO)
        }

        async fn transaction_count(&self, _address: &Address) -> ChainResult<u64> {
            Ok(0)
        }

        async fn block_number(&self) -> ChainResult<u64> {
            Ok(0)
        }

        async fn code(&self, _address: &Address) -> ChainResult<Bytes> {
            Ok(Bytes::new())
        }

        async fn call(&self, to: alloy_primitives::Address, data: Bytes) -> ChainResult<Bytes> {
            self.calls
                .get(&(to, data.to_vec()))
                .map(|ret| Bytes::from(ret.clone()))
                .ok_or_else(|| ChainError::Rpc {
                    code: 3,
                    message: "execution reverted".to_string(),
                })
        }
    }

    #[test]
    fn test_reverse_name_confirmed_by_forward_record() {
        let owner = Address::parse(OWNER).unwrap();
        let chain = EnsChain::with_records(&owner, "vitalik.eth", owner.to_alloy());

        let name = tokio_test::block_on(reverse_resolve(&chain, &owner)).unwrap();
        assert_eq!(name.as_deref(), Some("vitalik.eth"));
    }

    #[test]
    fn test_claimed_name_pointing_elsewhere_is_ignored() {
        let impostor = Address::parse("0x000000000000000000000000000000000000dEaD").unwrap();
        let real_owner = Address::parse(OWNER).unwrap();
        let chain = EnsChain::with_records(&impostor, "vitalik.eth", real_owner.to_alloy());

        let name = tokio_test::block_on(reverse_resolve(&chain, &impostor)).unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn test_claimed_name_without_forward_resolver_is_ignored() {
        let owner = Address::parse(OWNER).unwrap();
        let mut chain = EnsChain::with_records(&owner, "vitalik.eth", owner.to_alloy());
        chain.answer(
            ENS_REGISTRY,
            IEnsRegistry::resolverCall {
                node: namehash("vitalik.eth"),
            },
            IEnsRegistry::resolverCall::abi_encode_returns(&(alloy_primitives::Address::ZERO,)),
        );

        let name = tokio_test::block_on(reverse_resolve(&chain, &owner)).unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn test_no_reverse_resolver_means_no_name() {
        let owner = Address::parse(OWNER).unwrap();
        let mut chain = EnsChain::default();
        chain.answer(
            ENS_REGISTRY,
            IEnsRegistry::resolverCall {
                node: reverse_node(&owner),
            },
            IEnsRegistry::resolverCall::abi_encode_returns(&(alloy_primitives::Address::ZERO,)),
        );

        let name = tokio_test::block_on(reverse_resolve(&chain, &owner)).unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
    }

    #[test]
    fn test_reverse_node_ignores_case() {
        let mixed = Address::parse("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045").unwrap();
        let lower = Address::parse("0xd8da6bf26964af9d7eed9e03e53415d37aa96045").unwrap();
        assert_eq!(reverse_node(&mixed), reverse_node(&lower));
        assert_ne!(reverse_node(&mixed), B256::ZERO);
    }
}
