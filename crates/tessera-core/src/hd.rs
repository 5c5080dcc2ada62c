//! Hierarchical Deterministic (HD) key derivation
//!
//! BIP-32 private child derivation over secp256k1 together with parsing
//! of BIP-44 style paths such as `m/44'/60'/0'/0/0`.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, Scalar, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};

/// Offset added to an index for hardened derivation
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Default Ethereum account path used for mnemonic wallets
pub const DEFAULT_ETHEREUM_PATH: &str = "m/44'/60'/0'/0/0";

type HmacSha512 = Hmac<Sha512>;

/// HD derivation path component
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathComponent {
    /// Index value (without the hardened bit)
    pub index: u32,
    /// Whether this is a hardened derivation
    pub hardened: bool,
}

impl PathComponent {
    /// Create a normal (non-hardened) component
    pub fn normal(index: u32) -> Self {
        Self {
            index,
            hardened: false,
        }
    }

    /// Create a hardened component
    pub fn hardened(index: u32) -> Self {
        Self {
            index,
            hardened: true,
        }
    }

    /// Get the value to use in derivation (adds 2^31 for hardened)
    pub fn value(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for PathComponent {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let (digits, hardened) = match s.strip_suffix(|c: char| matches!(c, '\'' | 'h' | 'H')) {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WalletError::InvalidDerivationPath(format!(
                "invalid path component '{}'",
                s
            )));
        }

        let index: u32 = digits.parse().map_err(|_| {
            WalletError::InvalidDerivationPath(format!("path index out of range '{}'", s))
        })?;

        if index >= HARDENED_OFFSET {
            return Err(WalletError::InvalidDerivationPath(format!(
                "path index out of range '{}'",
                s
            )));
        }

        Ok(Self { index, hardened })
    }
}

/// HD derivation path (e.g., m/44'/60'/0'/0/0)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DerivationPath {
    pub components: Vec<PathComponent>,
}

impl DerivationPath {
    /// Create a new derivation path
    pub fn new(components: Vec<PathComponent>) -> Self {
        Self { components }
    }

    /// BIP-44 Ethereum account path: m/44'/60'/0'/0/{index}
    pub fn ethereum(index: u32) -> Self {
        Self {
            components: vec![
                PathComponent::hardened(44),
                PathComponent::hardened(60),
                PathComponent::hardened(0),
                PathComponent::normal(0),
                PathComponent::normal(index),
            ],
        }
    }

    /// Number of derivation steps below the master key
    pub fn depth(&self) -> usize {
        self.components.len()
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self::ethereum(0)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut parts = s.split('/');

        match parts.next() {
            Some("m") | Some("M") => {}
            _ => {
                return Err(WalletError::InvalidDerivationPath(format!(
                    "path must start with 'm': {}",
                    s
                )))
            }
        }

        let components = parts
            .map(PathComponent::from_str)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { components })
    }
}

/// Extended private key (secret scalar plus chain code)
#[derive(Clone)]
pub struct ExtendedPrivateKey {
    secret: SecretKey,
    chain_code: Zeroizing<[u8; 32]>,
}

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivateKey").finish_non_exhaustive()
    }
}

impl ExtendedPrivateKey {
    /// Master key from a BIP-39 seed
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let (il, ir) = hmac_sha512(b"Bitcoin seed", &[seed])?;
        let secret = SecretKey::from_slice(il.as_slice())
            .map_err(|_| WalletError::HdDerivation("seed produced an invalid master key".into()))?;

        Ok(Self {
            secret,
            chain_code: ir,
        })
    }

    /// Derive a single child (CKDpriv)
    pub fn derive_child(&self, component: PathComponent) -> Result<Self> {
        let index = component.value().to_be_bytes();

        let (il, ir) = if component.hardened {
            let secret = self.secret.to_bytes();
            hmac_sha512(
                self.chain_code.as_slice(),
                &[&[0u8][..], secret.as_slice(), &index[..]],
            )?
        } else {
            let public = self.secret.public_key().to_encoded_point(true);
            hmac_sha512(self.chain_code.as_slice(), &[public.as_bytes(), &index[..]])?
        };

        let tweak = Option::<Scalar>::from(Scalar::from_repr(*FieldBytes::from_slice(
            il.as_slice(),
        )))
        .ok_or_else(|| {
            WalletError::HdDerivation(format!("derived tweak out of range at {}", component))
        })?;

        let child = tweak + *self.secret.to_nonzero_scalar();
        let secret = SecretKey::from_bytes(&child.to_repr()).map_err(|_| {
            WalletError::HdDerivation(format!("derived key is zero at {}", component))
        })?;

        Ok(Self {
            secret,
            chain_code: ir,
        })
    }

    /// Walk a full derivation path from this key
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.components
            .iter()
            .try_fold(self.clone(), |key, component| key.derive_child(*component))
    }

    /// Raw 32-byte secret
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(self.secret.to_bytes().as_slice());
        out
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<(Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>)> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| WalletError::HdDerivation(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let output = mac.finalize().into_bytes();

    let mut il = Zeroizing::new([0u8; 32]);
    let mut ir = Zeroizing::new([0u8; 32]);
    il.copy_from_slice(&output[..32]);
    ir.copy_from_slice(&output[32..]);
    Ok((il, ir))
}
