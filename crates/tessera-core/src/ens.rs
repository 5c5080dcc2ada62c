//! ENS name resolution
//!
//! Forward resolution walks from the full name towards the root looking
//! for a resolver. A resolver found on a parent is only used when it
//! supports wildcard resolution (ENSIP-10); record lookups against such a
//! resolver go through `resolve(dnsEncode(name), calldata)`. Reverse
//! lookups are checked against forward resolution before being returned.

use alloy::primitives::{keccak256, Address, Bytes, FixedBytes, B256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use alloy::network::TransactionBuilder;
use alloy::sol;
use alloy::sol_types::SolCall;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, WalletError};
use crate::network;
use crate::provider::ProviderHandle;

sol! {
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    interface IEnsResolver {
        function addr(bytes32 node) external view returns (address);
        function name(bytes32 node) external view returns (string);
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
        function resolve(bytes name, bytes data) external view returns (bytes);
    }
}

/// `resolve(bytes,bytes)` interface id
const WILDCARD_INTERFACE: [u8; 4] = [0x90, 0x61, 0xb9, 0x23];

/// Normalise a name for hashing
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// ENS namehash of a dotted name
pub fn namehash(name: &str) -> B256 {
    let name = normalize(name);
    if name.is_empty() {
        return B256::ZERO;
    }

    name.rsplit('.').fold(B256::ZERO, |node, label| {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        keccak256(buf)
    })
}

/// DNS wire-format encoding of a name (length-prefixed labels, zero terminated)
pub fn dns_encode(name: &str) -> Result<Bytes> {
    let name = normalize(name);
    let mut encoded = Vec::with_capacity(name.len() + 2);

    for label in name.split('.').filter(|l| !l.is_empty()) {
        let len = u8::try_from(label.len())
            .ok()
            .filter(|len| *len <= 63)
            .ok_or_else(|| WalletError::Ens(format!("invalid DNS label '{}'", label)))?;
        encoded.push(len);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);

    Ok(Bytes::from(encoded))
}

/// `<hex address>.addr.reverse`
pub fn reverse_name(address: Address) -> String {
    format!("{}.addr.reverse", hex::encode(address.as_slice()))
}

/// A resolver contract responsible for a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolver {
    pub address: Address,
    pub name: String,
    /// Inherited from a parent name; queries are wrapped in `resolve`
    #[serde(skip)]
    pub wildcard: bool,
}

/// ENS client bound to one provider and registry
#[derive(Debug, Clone)]
pub struct Ens {
    provider: DynProvider,
    registry: Address,
}

impl Ens {
    pub fn new(provider: DynProvider, registry: Address) -> Self {
        Self { provider, registry }
    }

    /// Look up the registry for the provider's chain
    pub async fn connect(handle: &ProviderHandle) -> Result<Self> {
        let chain_id = handle.chain_id().await?;
        let registry = network::ens_registry(chain_id).ok_or_else(|| {
            WalletError::Ens(format!("network does not support ENS (chainId={})", chain_id))
        })?;
        Ok(Self::new(handle.provider().clone(), registry))
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    pub async fn resolver(&self, name: &str) -> Result<Option<Resolver>> {
        let name = normalize(name);
        let mut current = name.as_str();

        loop {
            if current.is_empty() || current == "." {
                return Ok(None);
            }
            if name != "eth" && current == "eth" {
                return Ok(None);
            }

            if let Some(address) = self.registry_resolver(current).await? {
                if current != name && !self.supports_wildcard(address).await {
                    debug!(name = %name, parent = current, "Parent resolver lacks wildcard support");
                    return Ok(None);
                }
                return Ok(Some(Resolver {
                    address,
                    name: name.clone(),
                    wildcard: current != name,
                }));
            }

            current = match current.split_once('.') {
                Some((_, parent)) => parent,
                None => "",
            };
        }
    }

    /// Forward resolution; plain addresses pass through
    pub async fn resolve_name(&self, name: &str) -> Result<Option<Address>> {
        if let Ok(address) = name.trim().parse::<Address>() {
            return Ok(Some(address));
        }

        let Some(resolver) = self.resolver(name).await? else {
            return Ok(None);
        };

        let call = IEnsResolver::addrCall {
            node: namehash(&resolver.name),
        };
        let address = self.resolver_call(&resolver, call).await?;

        Ok((!address.is_zero()).then_some(address))
    }

    /// Reverse resolution, verified against the forward record
    pub async fn lookup_address(&self, address: Address) -> Result<Option<String>> {
        let reverse = reverse_name(address);
        let Some(resolver) = self.resolver(&reverse).await? else {
            return Ok(None);
        };

        let call = IEnsResolver::nameCall {
            node: namehash(&reverse),
        };
        let name = self.resolver_call(&resolver, call).await?;

        if name.is_empty() {
            return Ok(None);
        }

        match self.resolve_name(&name).await? {
            Some(forward) if forward == address => Ok(Some(name)),
            _ => {
                debug!(%address, name = %name, "Reverse record does not resolve back");
                Ok(None)
            }
        }
    }

    /// Query a record, wrapping the call for wildcard resolvers
    async fn resolver_call<C: SolCall>(&self, resolver: &Resolver, call: C) -> Result<C::Return> {
        let output = if resolver.wildcard {
            let wrapped = IEnsResolver::resolveCall {
                name: dns_encode(&resolver.name)?,
                data: Bytes::from(call.abi_encode()),
            };
            let raw = self.eth_call(resolver.address, wrapped.abi_encode()).await?;
            IEnsResolver::resolveCall::abi_decode_returns(&raw)
                .map_err(|e| WalletError::Ens(e.to_string()))?
        } else {
            self.eth_call(resolver.address, call.abi_encode()).await?
        };

        C::abi_decode_returns(&output).map_err(|e| WalletError::Ens(e.to_string()))
    }

    async fn registry_resolver(&self, name: &str) -> Result<Option<Address>> {
        let call = IEnsRegistry::resolverCall {
            node: namehash(name),
        };
        let output = self.eth_call(self.registry, call.abi_encode()).await?;
        let address = IEnsRegistry::resolverCall::abi_decode_returns(&output)
            .map_err(|e| WalletError::Ens(e.to_string()))?;

        Ok((!address.is_zero()).then_some(address))
    }

    async fn supports_wildcard(&self, resolver: Address) -> bool {
        let call = IEnsResolver::supportsInterfaceCall {
            interfaceId: FixedBytes(WILDCARD_INTERFACE),
        };
        match self.eth_call(resolver, call.abi_encode()).await {
            Ok(output) => {
                IEnsResolver::supportsInterfaceCall::abi_decode_returns(&output).unwrap_or(false)
            }
            Err(_) => false,
        }
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Bytes> {
        let request = TransactionRequest::default()
            .with_to(to)
            .with_input(data);
        Ok(self.provider.call(request).await?)
    }
}

/// Parse an address, or resolve it as an ENS name
pub async fn resolve_address_or_name(handle: &ProviderHandle, input: &str) -> Result<Address> {
    if let Ok(address) = input.trim().parse::<Address>() {
        return Ok(address);
    }
    if !input.contains('.') {
        return Err(WalletError::InvalidAddress(input.to_string()));
    }

    Ens::connect(handle)
        .await?
        .resolve_name(input)
        .await?
        .ok_or_else(|| WalletError::Ens(format!("could not resolve name {}", input.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing;
    use alloy::primitives::address;
    use alloy::sol_types::SolValue;

    fn word(address: Address) -> Bytes {
        Bytes::from(address.abi_encode())
    }

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth").to_string(),
            "0x93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            namehash("foo.eth").to_string(),
            "0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
        assert_eq!(namehash("Foo.ETH"), namehash("foo.eth"));
    }

    #[test]
    fn test_reverse_name() {
        let addr = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(
            reverse_name(addr),
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266.addr.reverse"
        );
    }

    #[tokio::test]
    async fn test_resolve_name_through_registry() {
        let (handle, asserter) = testing::mocked();
        let resolver = address!("4976fb03C32e5B8cfe2b6cCB31c09Ba78EBaBa41");
        let target = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

        asserter.push_success(&"0x1");
        asserter.push_success(&word(resolver));
        asserter.push_success(&word(target));

        let ens = Ens::connect(&handle).await.unwrap();
        assert_eq!(ens.registry(), network::ENS_REGISTRY);
        assert_eq!(ens.resolve_name("vitalik.eth").await.unwrap(), Some(target));
    }

    #[test]
    fn test_dns_encode() {
        assert_eq!(
            dns_encode("foo.eth").unwrap(),
            Bytes::from_static(b"\x03foo\x03eth\x00")
        );
        assert_eq!(dns_encode("").unwrap(), Bytes::from_static(b"\x00"));
        assert!(dns_encode(&format!("{}.eth", "a".repeat(64))).is_err());
    }

    #[tokio::test]
    async fn test_wildcard_resolver_wraps_query() {
        let (handle, asserter) = testing::mocked();
        let ens = Ens::new(handle.provider().clone(), network::ENS_REGISTRY);
        let resolver = address!("231b0Ee14048e9dCcD1d247744d114a4EB5E8E63");
        let target = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

        // no resolver for the full name, one on the parent
        asserter.push_success(&word(Address::ZERO));
        asserter.push_success(&word(resolver));
        asserter.push_success(&Bytes::from(true.abi_encode()));

        let found = ens.resolver("pay.wild.eth").await.unwrap().unwrap();
        assert!(found.wildcard);
        assert_eq!(found.address, resolver);
        assert_eq!(found.name, "pay.wild.eth");

        let (handle, asserter) = testing::mocked();
        let ens = Ens::new(handle.provider().clone(), network::ENS_REGISTRY);
        asserter.push_success(&word(Address::ZERO));
        asserter.push_success(&word(resolver));
        asserter.push_success(&Bytes::from(true.abi_encode()));
        // resolve(bytes,bytes) returns the addr() output as bytes
        let record = Bytes::from(target.abi_encode());
        asserter.push_success(&Bytes::from((record,).abi_encode_params()));

        assert_eq!(ens.resolve_name("pay.wild.eth").await.unwrap(), Some(target));
    }

    #[tokio::test]
    async fn test_parent_without_wildcard_is_ignored() {
        let (handle, asserter) = testing::mocked();
        let ens = Ens::new(handle.provider().clone(), network::ENS_REGISTRY);
        let resolver = address!("231b0Ee14048e9dCcD1d247744d114a4EB5E8E63");

        asserter.push_success(&word(Address::ZERO));
        asserter.push_success(&word(resolver));
        asserter.push_success(&Bytes::from(false.abi_encode()));

        assert_eq!(ens.resolve_name("pay.wild.eth").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolver_missing() {
        let (handle, asserter) = testing::mocked();
        let ens = Ens::new(handle.provider().clone(), network::ENS_REGISTRY);

        // nothing registered for "nobody.eth"; the walk stops at "eth"
        asserter.push_success(&word(Address::ZERO));
        assert_eq!(ens.resolver("nobody.eth").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_connect_unsupported_chain() {
        let (handle, asserter) = testing::mocked();
        asserter.push_success(&"0x7a69");
        let err = Ens::connect(&handle).await.unwrap_err();
        assert!(err.to_string().contains("network does not support ENS"));
    }

    #[tokio::test]
    async fn test_resolve_plain_address() {
        let (handle, _asserter) = testing::mocked();
        let resolved =
            resolve_address_or_name(&handle, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
                .await
                .unwrap();
        assert_eq!(resolved, address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(resolve_address_or_name(&handle, "garbage").await.is_err());
    }
}
