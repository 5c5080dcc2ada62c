//! Wallet construction and signing
//!
//! A [`Wallet`] wraps a local secp256k1 signer and, when it was built from
//! a mnemonic, remembers the phrase and derivation path it came from.
//!
//! # Wallet data resolution
//!
//! Tools accept a single opaque `wallet` string. [`Wallet::resolve`] decides
//! what it is:
//!
//! - starts with `{`: encrypted keystore JSON (a password is required)
//! - 12, 15, 18, 21 or 24 words: mnemonic phrase
//! - anything else: raw private key
//!
//! When no data is supplied the configured fallback private key is used.

use std::fmt;

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};
use crate::hd::{DerivationPath, ExtendedPrivateKey};
use crate::keystore::{self, Kdf};
use crate::mnemonic::{self, Locale, MnemonicPhrase};
use crate::typed_data::TypedDataRequest;

/// How opaque wallet data should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletSource {
    EncryptedJson,
    Mnemonic,
    PrivateKey,
}

impl WalletSource {
    pub fn classify(data: &str) -> Self {
        if keystore::is_keystore_json(data) {
            WalletSource::EncryptedJson
        } else if mnemonic::is_valid_word_count(mnemonic::word_count(data)) {
            WalletSource::Mnemonic
        } else {
            WalletSource::PrivateKey
        }
    }
}

/// Mnemonic a wallet was derived from
#[derive(Clone)]
pub struct MnemonicInfo {
    pub phrase: Zeroizing<String>,
    pub path: DerivationPath,
    pub locale: Locale,
}

impl fmt::Debug for MnemonicInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnemonicInfo")
            .field("path", &self.path.to_string())
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

/// A key-holding wallet
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    mnemonic: Option<MnemonicInfo>,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("has_mnemonic", &self.mnemonic.is_some())
            .finish_non_exhaustive()
    }
}

impl Wallet {
    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self {
            signer,
            mnemonic: None,
        }
    }

    /// Create a wallet from a hex-encoded private key (with or without 0x)
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);

        if key.len() != 64 {
            return Err(WalletError::InvalidPrivateKey(
                "expected 32 bytes of hex".to_string(),
            ));
        }

        let bytes = Zeroizing::new(
            hex::decode(key).map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?,
        );
        let signer = PrivateKeySigner::from_slice(&bytes)
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;

        Ok(Self::from_signer(signer))
    }

    /// Create a wallet from a mnemonic phrase
    ///
    /// `path` defaults to `m/44'/60'/0'/0/0`. An unrecognised `locale` falls
    /// back to English.
    pub fn from_mnemonic(phrase: &str, path: Option<&str>, locale: Option<&str>) -> Result<Self> {
        let locale = match locale {
            Some(code) => Some(code.parse::<Locale>().unwrap_or_else(|_| {
                warn!(locale = code, "Unknown mnemonic locale, using English");
                Locale::English
            })),
            None => None,
        };
        let path = parse_path(path)?;
        let parsed = mnemonic::parse(phrase, locale)?;

        Self::from_mnemonic_phrase(&parsed, path)
    }

    pub fn from_mnemonic_phrase(phrase: &MnemonicPhrase, path: DerivationPath) -> Result<Self> {
        let seed = phrase.seed();
        let key = ExtendedPrivateKey::from_seed(seed.as_slice())?.derive_path(&path)?;
        let signer = PrivateKeySigner::from_slice(key.secret_bytes().as_slice())
            .map_err(|e| WalletError::HdDerivation(e.to_string()))?;

        debug!(path = %path, "Derived wallet from mnemonic");

        Ok(Self {
            signer,
            mnemonic: Some(MnemonicInfo {
                phrase: phrase.phrase(),
                path,
                locale: phrase.locale(),
            }),
        })
    }

    /// Decrypt a keystore JSON wallet
    pub fn from_encrypted_json(json: &str, password: &str) -> Result<Self> {
        let decrypted = keystore::decrypt(json, password)?;
        let signer = PrivateKeySigner::from_slice(&decrypted.secret)
            .map_err(|e| WalletError::Keystore(format!("invalid decrypted key: {}", e)))?;

        if let Some(expected) = decrypted.address {
            if expected != signer.address() {
                return Err(WalletError::Keystore(
                    "keystore address does not match decrypted key".to_string(),
                ));
            }
        }

        Ok(Self::from_signer(signer))
    }

    /// Create a new random wallet backed by a fresh 12-word mnemonic
    pub fn create_random(path: Option<&str>, locale: Option<&str>) -> Result<Self> {
        let locale = locale
            .map(str::parse::<Locale>)
            .transpose()?
            .unwrap_or_default();
        let path = parse_path(path)?;
        let phrase = mnemonic::generate(crate::RANDOM_WALLET_WORDS, locale)?;

        Self::from_mnemonic_phrase(&phrase, path)
    }

    /// Build a wallet from opaque wallet data
    pub fn resolve(
        data: Option<&str>,
        password: Option<&str>,
        fallback_private_key: Option<&str>,
    ) -> Result<Self> {
        let data = match data.map(str::trim).filter(|d| !d.is_empty()) {
            Some(data) => data,
            None => {
                let key = fallback_private_key.ok_or(WalletError::MissingWalletData)?;
                return Self::from_private_key(key);
            }
        };

        let source = WalletSource::classify(data);
        debug!(?source, "Resolving wallet data");

        match source {
            WalletSource::EncryptedJson => match password.filter(|p| !p.is_empty()) {
                Some(password) => Self::from_encrypted_json(data, password),
                None => Err(WalletError::PasswordRequired),
            },
            WalletSource::Mnemonic => Self::from_mnemonic(data, None, None),
            WalletSource::PrivateKey => Self::from_private_key(data),
        }
        .map_err(WalletError::invalid_wallet_data)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-55 checksummed address
    pub fn address_checksummed(&self) -> String {
        self.address().to_checksum(None)
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.signer.to_bytes())))
    }

    /// Uncompressed SEC1 public key (`0x04...`)
    pub fn public_key_hex(&self) -> String {
        let point = self
            .signer
            .credential()
            .verifying_key()
            .to_encoded_point(false);
        format!("0x{}", hex::encode(point.as_bytes()))
    }

    pub fn mnemonic(&self) -> Option<&MnemonicInfo> {
        self.mnemonic.as_ref()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Encrypt into keystore JSON
    pub fn encrypt(&self, password: &str, kdf: Kdf) -> Result<String> {
        let secret = Zeroizing::new(self.signer.to_bytes().0);
        keystore::encrypt(secret.as_slice(), self.address(), password, kdf)
    }

    /// EIP-191 personal message signature
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        self.signer
            .sign_message_sync(message)
            .map_err(|e| WalletError::Signing(e.to_string()))
    }

    pub fn sign_hash(&self, hash: &B256) -> Result<Signature> {
        self.signer
            .sign_hash_sync(hash)
            .map_err(|e| WalletError::Signing(e.to_string()))
    }

    /// EIP-712 typed data signature
    pub fn sign_typed_data(&self, request: &TypedDataRequest) -> Result<Signature> {
        let hash = request.signing_hash()?;
        self.sign_hash(&hash)
    }
}

fn parse_path(path: Option<&str>) -> Result<DerivationPath> {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => path.parse(),
        None => Ok(DerivationPath::default()),
    }
}

/// Hex encoding of a 65-byte `r || s || v` signature
pub fn signature_hex(signature: &Signature) -> String {
    format!("0x{}", hex::encode(signature.as_bytes()))
}

/// Parse a 65-byte hex signature
pub fn parse_signature(signature: &str) -> Result<Signature> {
    let raw = signature.trim();
    let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(raw))
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))?;
    Signature::from_raw(&bytes).map_err(|e| WalletError::InvalidSignature(e.to_string()))
}

/// Recover the signer of an EIP-191 message
pub fn verify_message(message: &[u8], signature: &str) -> Result<Address> {
    parse_signature(signature)?
        .recover_address_from_msg(message)
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))
}

/// Case-insensitive comparison of a caller-supplied address with a recovered one
pub fn addresses_match(claimed: &str, recovered: Address) -> bool {
    let claimed = claimed.trim();
    let claimed = claimed.strip_prefix("0x").unwrap_or(claimed);
    claimed.eq_ignore_ascii_case(&hex::encode(recovered.as_slice()))
}
