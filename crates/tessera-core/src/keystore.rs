//! Web3 Secret Storage (v3) keystores
//!
//! Encrypted JSON wallets: the secret key is encrypted with aes-128-ctr
//! under a key stretched from the password with scrypt or pbkdf2, and
//! authenticated with keccak256(derived_key[16..32] ++ ciphertext).

use aes::cipher::{KeyIvInit, StreamCipher};
use alloy::primitives::{keccak256, Address};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

const KEYSTORE_VERSION: u64 = 3;
const CIPHER: &str = "aes-128-ctr";
const DERIVED_KEY_LEN: usize = 32;

/// Scrypt cost parameters as accepted from callers (`{ "N", "r", "p" }`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParams {
    #[serde(rename = "N", alias = "n")]
    pub n: u64,
    pub r: u32,
    pub p: u32,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            n: 131_072,
            r: 8,
            p: 1,
        }
    }
}

impl ScryptParams {
    fn to_scrypt(self, dklen: usize) -> Result<scrypt::Params> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(WalletError::Keystore(format!(
                "scrypt N must be a power of two greater than 1, got {}",
                self.n
            )));
        }
        let log_n = self.n.trailing_zeros() as u8;
        scrypt::Params::new(log_n, self.r, self.p, dklen)
            .map_err(|e| WalletError::Keystore(format!("invalid scrypt parameters: {}", e)))
    }
}

/// Key derivation used when encrypting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kdf {
    Scrypt(ScryptParams),
    Pbkdf2 { rounds: u32 },
}

impl Default for Kdf {
    fn default() -> Self {
        Kdf::Scrypt(ScryptParams::default())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct KeystoreFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default)]
    id: Option<String>,
    version: u64,
    #[serde(alias = "Crypto")]
    crypto: CryptoSection,
}

#[derive(Debug, Serialize, Deserialize)]
struct CryptoSection {
    cipher: String,
    cipherparams: CipherParams,
    ciphertext: String,
    kdf: String,
    kdfparams: serde_json::Value,
    mac: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CipherParams {
    iv: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScryptKdfParams {
    dklen: usize,
    n: u64,
    r: u32,
    p: u32,
    salt: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Pbkdf2KdfParams {
    c: u32,
    dklen: usize,
    prf: String,
    salt: String,
}

/// Secret recovered from a keystore
pub struct DecryptedKey {
    pub secret: Zeroizing<Vec<u8>>,
    /// Address recorded in the file, when present
    pub address: Option<Address>,
}

/// Encrypt a 32-byte secret key into keystore JSON
pub fn encrypt(secret: &[u8], address: Address, password: &str, kdf: Kdf) -> Result<String> {
    let mut rng = rand::thread_rng();
    let mut salt = [0u8; 32];
    let mut iv = [0u8; 16];
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut iv);

    let (derived, kdf_name, kdfparams) = match kdf {
        Kdf::Scrypt(params) => {
            let derived = derive_scrypt(password, &salt, params, DERIVED_KEY_LEN)?;
            let kdfparams = ScryptKdfParams {
                dklen: DERIVED_KEY_LEN,
                n: params.n,
                r: params.r,
                p: params.p,
                salt: hex::encode(salt),
            };
            (derived, "scrypt", serde_json::to_value(kdfparams)?)
        }
        Kdf::Pbkdf2 { rounds } => {
            let derived = derive_pbkdf2(password, &salt, rounds, DERIVED_KEY_LEN);
            let kdfparams = Pbkdf2KdfParams {
                c: rounds,
                dklen: DERIVED_KEY_LEN,
                prf: "hmac-sha256".to_string(),
                salt: hex::encode(salt),
            };
            (derived, "pbkdf2", serde_json::to_value(kdfparams)?)
        }
    };

    let mut ciphertext = secret.to_vec();
    apply_cipher(&derived[..16], &iv, &mut ciphertext)?;
    let mac = compute_mac(&derived, &ciphertext);

    let file = KeystoreFile {
        address: Some(hex::encode(address.as_slice())),
        id: Some(uuid::Uuid::new_v4().to_string()),
        version: KEYSTORE_VERSION,
        crypto: CryptoSection {
            cipher: CIPHER.to_string(),
            cipherparams: CipherParams {
                iv: hex::encode(iv),
            },
            ciphertext: hex::encode(&ciphertext),
            kdf: kdf_name.to_string(),
            kdfparams,
            mac: hex::encode(mac),
        },
    };

    debug!(kdf = kdf_name, "Encrypted keystore");
    Ok(serde_json::to_string(&file)?)
}

/// Decrypt keystore JSON with a password
pub fn decrypt(json: &str, password: &str) -> Result<DecryptedKey> {
    let file: KeystoreFile = serde_json::from_str(json)
        .map_err(|e| WalletError::Keystore(format!("malformed keystore JSON: {}", e)))?;

    if file.version != KEYSTORE_VERSION {
        return Err(WalletError::Keystore(format!(
            "unsupported keystore version {}",
            file.version
        )));
    }

    let crypto = &file.crypto;
    if !crypto.cipher.eq_ignore_ascii_case(CIPHER) {
        return Err(WalletError::Keystore(format!(
            "unsupported cipher {}",
            crypto.cipher
        )));
    }

    let derived = match crypto.kdf.to_ascii_lowercase().as_str() {
        "scrypt" => {
            let params: ScryptKdfParams = serde_json::from_value(crypto.kdfparams.clone())
                .map_err(|e| WalletError::Keystore(format!("invalid scrypt params: {}", e)))?;
            let salt = decode_hex("salt", &params.salt)?;
            let cost = ScryptParams {
                n: params.n,
                r: params.r,
                p: params.p,
            };
            derive_scrypt(password, &salt, cost, params.dklen)?
        }
        "pbkdf2" => {
            let params: Pbkdf2KdfParams = serde_json::from_value(crypto.kdfparams.clone())
                .map_err(|e| WalletError::Keystore(format!("invalid pbkdf2 params: {}", e)))?;
            if params.prf != "hmac-sha256" {
                return Err(WalletError::Keystore(format!(
                    "unsupported pbkdf2 prf {}",
                    params.prf
                )));
            }
            let salt = decode_hex("salt", &params.salt)?;
            derive_pbkdf2(password, &salt, params.c, params.dklen)
        }
        other => {
            return Err(WalletError::Keystore(format!("unsupported kdf {}", other)));
        }
    };

    if derived.len() < DERIVED_KEY_LEN {
        return Err(WalletError::Keystore("derived key too short".into()));
    }

    let mut ciphertext = decode_hex("ciphertext", &crypto.ciphertext)?;
    let expected_mac = decode_hex("mac", &crypto.mac)?;
    if compute_mac(&derived, &ciphertext).as_slice() != expected_mac.as_slice() {
        return Err(WalletError::IncorrectPassword);
    }

    let iv = decode_hex("iv", &crypto.cipherparams.iv)?;
    apply_cipher(&derived[..16], &iv, &mut ciphertext)?;

    let address = match file.address.as_deref() {
        Some(raw) if !raw.is_empty() => {
            let prefixed = if raw.starts_with("0x") {
                raw.to_string()
            } else {
                format!("0x{}", raw)
            };
            Some(
                prefixed
                    .parse::<Address>()
                    .map_err(|e| WalletError::Keystore(format!("invalid address: {}", e)))?,
            )
        }
        _ => None,
    };

    Ok(DecryptedKey {
        secret: Zeroizing::new(ciphertext),
        address,
    })
}

/// Whether a string looks like keystore JSON
pub fn is_keystore_json(data: &str) -> bool {
    data.trim_start().starts_with('{')
}

fn derive_scrypt(
    password: &str,
    salt: &[u8],
    params: ScryptParams,
    dklen: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let params = params.to_scrypt(dklen)?;
    let mut out = Zeroizing::new(vec![0u8; dklen]);
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut out)
        .map_err(|e| WalletError::Keystore(format!("scrypt failed: {}", e)))?;
    Ok(out)
}

fn derive_pbkdf2(password: &str, salt: &[u8], rounds: u32, dklen: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(vec![0u8; dklen]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

fn apply_cipher(key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<()> {
    let mut cipher = Aes128Ctr::new_from_slices(key, iv)
        .map_err(|e| WalletError::Keystore(format!("invalid cipher parameters: {}", e)))?;
    cipher.apply_keystream(data);
    Ok(())
}

fn compute_mac(derived: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(16 + ciphertext.len());
    preimage.extend_from_slice(&derived[16..32]);
    preimage.extend_from_slice(ciphertext);
    keccak256(&preimage).0
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| WalletError::Keystore(format!("invalid {} hex: {}", field, e)))
}
