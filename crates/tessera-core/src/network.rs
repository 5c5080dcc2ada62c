//! Known EVM networks
//!
//! Names follow the conventional ethers identifiers (`homestead` for
//! mainnet). Chains not in the table are reported as `unknown`.

use alloy::primitives::{address, Address};
use serde::Serialize;

/// ENS registry deployed at the same address on mainnet and its testnets
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// Static description of a known chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownNetwork {
    pub chain_id: u64,
    pub name: &'static str,
    pub ens_registry: Option<Address>,
}

pub const KNOWN_NETWORKS: &[KnownNetwork] = &[
    KnownNetwork {
        chain_id: 1,
        name: "homestead",
        ens_registry: Some(ENS_REGISTRY),
    },
    KnownNetwork {
        chain_id: 3,
        name: "ropsten",
        ens_registry: Some(ENS_REGISTRY),
    },
    KnownNetwork {
        chain_id: 4,
        name: "rinkeby",
        ens_registry: Some(ENS_REGISTRY),
    },
    KnownNetwork {
        chain_id: 5,
        name: "goerli",
        ens_registry: Some(ENS_REGISTRY),
    },
    KnownNetwork {
        chain_id: 10,
        name: "optimism",
        ens_registry: None,
    },
    KnownNetwork {
        chain_id: 56,
        name: "bnb",
        ens_registry: None,
    },
    KnownNetwork {
        chain_id: 100,
        name: "xdai",
        ens_registry: None,
    },
    KnownNetwork {
        chain_id: 137,
        name: "matic",
        ens_registry: None,
    },
    KnownNetwork {
        chain_id: 8453,
        name: "base",
        ens_registry: None,
    },
    KnownNetwork {
        chain_id: 42161,
        name: "arbitrum",
        ens_registry: None,
    },
    KnownNetwork {
        chain_id: 80001,
        name: "maticmum",
        ens_registry: None,
    },
    KnownNetwork {
        chain_id: 11155111,
        name: "sepolia",
        ens_registry: Some(ENS_REGISTRY),
    },
];

pub fn lookup(chain_id: u64) -> Option<&'static KnownNetwork> {
    KNOWN_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

pub fn network_name(chain_id: u64) -> &'static str {
    lookup(chain_id).map(|n| n.name).unwrap_or("unknown")
}

pub fn ens_registry(chain_id: u64) -> Option<Address> {
    lookup(chain_id).and_then(|n| n.ens_registry)
}

/// Network summary as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,
    pub chain_id: u64,
    /// EIP-55 checksummed registry address
    pub ens_address: Option<String>,
}

impl Network {
    pub fn from_chain_id(chain_id: u64) -> Self {
        Self {
            name: network_name(chain_id).to_string(),
            chain_id,
            ens_address: ens_registry(chain_id).map(|a| a.to_checksum(None)),
        }
    }
}
