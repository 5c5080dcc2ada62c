//! Tessera Core - Wallet construction, key storage and provider glue
//!
//! This crate provides the wallet and provider operations behind the
//! Tessera MCP server: key material from private keys, BIP-39 mnemonics and
//! encrypted keystores, message and typed-data signing, and transaction
//! population against a JSON-RPC endpoint.

pub mod block;
pub mod ens;
pub mod error;
pub mod fees;
pub mod hd;
pub mod keystore;
pub mod mnemonic;
pub mod network;
pub mod provider;
pub mod transaction;
pub mod typed_data;
pub mod units;
pub mod wallet;

pub use block::{BlockSelector, BlockTag};
pub use ens::{Ens, Resolver};
pub use error::{Result, WalletError};
pub use fees::FeeData;
pub use hd::{DerivationPath, ExtendedPrivateKey, PathComponent, DEFAULT_ETHEREUM_PATH};
pub use keystore::{Kdf, ScryptParams};
pub use mnemonic::{Locale, MnemonicPhrase, VALID_WORD_COUNTS};
pub use network::{Network, KNOWN_NETWORKS};
pub use provider::{ProviderHandle, ProviderRegistry, ProviderStatus, DEFAULT_PROVIDER_URL};
pub use transaction::{PopulatedTransaction, SentTransaction, SignedTransaction, TransactionInput};
pub use typed_data::TypedDataRequest;
pub use units::Quantity;
pub use wallet::{Wallet, WalletSource};

/// Word count of mnemonics generated by [`Wallet::create_random`]
pub const RANDOM_WALLET_WORDS: usize = 12;
