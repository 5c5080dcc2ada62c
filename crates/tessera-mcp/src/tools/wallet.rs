//! Wallet construction and key material tools

use serde::Deserialize;
use serde_json::{json, Value};
use tessera_core::keystore::{Kdf, ScryptParams};
use tessera_core::mnemonic::{self, Locale};
use tessera_core::Wallet;
use zeroize::Zeroizing;

use super::{define, respond, schema, Reply, ToolContext, ToolError, CONFIGURE, GENERATE, LOCAL};
use crate::protocol::{Tool, ToolsCallResult};
use crate::validation::Args;

pub fn definitions() -> Vec<Tool> {
    vec![
        define(
            "wallet_provider_set",
            "Set Provider",
            "Set the provider URL. By default, the provider URL is set to the ETH mainnet \
             or the URL set in the PROVIDER_URL environment variable.",
            schema::object(
                json!({ "providerURL": { "type": "string", "description": "The provider RPC URL" } }),
                &["providerURL"],
            ),
            CONFIGURE,
        ),
        define(
            "wallet_create_random",
            "Create Random Wallet",
            "Create a new wallet with a random private key",
            schema::object(
                json!({
                    "password": { "type": "string", "description": "Optional password to encrypt the wallet" },
                    "path": { "type": "string", "description": "Optional HD path" },
                    "locale": { "type": "string", "description": "Optional locale for the wordlist" }
                }),
                &[],
            ),
            GENERATE,
        ),
        define(
            "wallet_from_private_key",
            "Wallet From Private Key",
            "Create a wallet from a private key",
            schema::object(
                json!({ "privateKey": { "type": "string", "description": "The private key" } }),
                &["privateKey"],
            ),
            LOCAL,
        ),
        define(
            "wallet_create_mnemonic_phrase",
            "Create Mnemonic Phrase",
            "Create a mnemonic phrase",
            schema::object(
                json!({
                    "length": {
                        "type": "number",
                        "description": "The length of the mnemonic phrase",
                        "enum": mnemonic::VALID_WORD_COUNTS
                    },
                    "locale": { "type": "string", "description": "Optional locale for the wordlist" }
                }),
                &["length"],
            ),
            GENERATE,
        ),
        define(
            "wallet_from_mnemonic",
            "Wallet From Mnemonic",
            "Create a wallet from a mnemonic phrase",
            schema::object(
                json!({
                    "mnemonic": { "type": "string", "description": "The mnemonic phrase" },
                    "path": { "type": "string", "description": "Optional HD path" },
                    "locale": { "type": "string", "description": "Optional locale for the wordlist" }
                }),
                &["mnemonic"],
            ),
            LOCAL,
        ),
        define(
            "wallet_from_encrypted_json",
            "Wallet From Encrypted JSON",
            "Create a wallet by decrypting an encrypted JSON wallet",
            schema::object(
                json!({
                    "json": { "type": "string", "description": "The encrypted JSON wallet" },
                    "password": { "type": "string", "description": "The password to decrypt the wallet" }
                }),
                &["json", "password"],
            ),
            LOCAL,
        ),
        define(
            "wallet_encrypt",
            "Encrypt Wallet",
            "Encrypt a wallet with a password",
            schema::object(
                json!({
                    "wallet": { "type": "string", "description": "The wallet to encrypt (private key, mnemonic, or JSON)" },
                    "password": { "type": "string", "description": "The password to encrypt the wallet" },
                    "options": {
                        "type": "object",
                        "description": "Optional encryption options",
                        "properties": {
                            "scrypt": {
                                "type": "object",
                                "properties": {
                                    "N": { "type": "number" },
                                    "r": { "type": "number" },
                                    "p": { "type": "number" }
                                }
                            }
                        }
                    }
                }),
                &["wallet", "password"],
            ),
            GENERATE,
        ),
        define(
            "wallet_get_address",
            "Get Wallet Address",
            "Get the wallet address",
            schema::object(schema::wallet(), &[]),
            LOCAL,
        ),
        define(
            "wallet_get_public_key",
            "Get Wallet Public Key",
            "Get the wallet public key",
            schema::object(schema::wallet(), &[]),
            LOCAL,
        ),
        define(
            "wallet_get_private_key",
            "Get Wallet Private Key",
            "Get the wallet private key (with appropriate security warnings)",
            schema::object(schema::wallet(), &[]),
            LOCAL,
        ),
        define(
            "wallet_get_mnemonic",
            "Get Wallet Mnemonic",
            "Get the wallet mnemonic phrase (with appropriate security warnings)",
            schema::object(schema::wallet(), &[]),
            LOCAL,
        ),
    ]
}

/// Address and keys, plus the phrase when the wallet came from one
fn describe(wallet: &Wallet, with_mnemonic: bool) -> Value {
    let mut result = json!({
        "address": wallet.address_checksummed(),
        "privateKey": wallet.private_key_hex().as_str(),
        "publicKey": wallet.public_key_hex(),
    });
    if with_mnemonic {
        result["mnemonic"] = json!(wallet.mnemonic().map(|m| m.phrase.as_str()));
    }
    result
}

/// Run keystore and key-derivation work off the async executor
async fn blocking<T, F>(work: F) -> Result<T, ToolError>
where
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ToolError::Failed(e.to_string()))?
}

pub async fn provider_set(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("set provider", async {
        let url = args.require_str("providerURL", "Provider URL is required")?;
        let handle = ctx.providers.set(url).await?;
        Ok(Reply::new(
            json!({ "providerURL": handle.url() }),
            "Provider set successfully",
        ))
    })
    .await
}

pub async fn create_random(args: &Args) -> ToolsCallResult {
    respond("create wallet", async {
        let path = args.optional_str("path")?.map(str::to_owned);
        let locale = args.optional_str("locale")?.map(str::to_owned);
        let password = args.optional_str("password")?.map(|p| Zeroizing::new(p.to_owned()));

        let result = blocking(move || {
            let wallet = Wallet::create_random(path.as_deref(), locale.as_deref())?;
            let mut result = describe(&wallet, true);
            if let Some(password) = password {
                result["encryptedWallet"] = json!(wallet.encrypt(&password, Kdf::default())?);
            }
            Ok(result)
        })
        .await?;

        Ok(Reply::new(result, "Wallet created successfully"))
    })
    .await
}

pub async fn from_private_key(args: &Args) -> ToolsCallResult {
    respond("create wallet from private key", async {
        let key = args.require_str("privateKey", "Private key is required")?;
        let wallet = Wallet::from_private_key(key)?;
        Ok(Reply::new(
            describe(&wallet, false),
            "Wallet created from private key successfully",
        ))
    })
    .await
}

pub async fn create_mnemonic_phrase(args: &Args) -> ToolsCallResult {
    respond("create mnemonic phrase", async {
        let length = args
            .require("length", "Length is required")?
            .as_u64()
            .ok_or_else(|| ToolError::Failed("length must be a positive integer".to_string()))?;
        let locale = match args.optional_str("locale")? {
            Some(code) => code.parse::<Locale>()?,
            None => Locale::default(),
        };

        let phrase = mnemonic::generate(length as usize, locale)?;
        Ok(Reply::new(
            json!({ "mnemonic": phrase.phrase().as_str() }),
            "Mnemonic phrase created successfully",
        ))
    })
    .await
}

pub async fn from_mnemonic(args: &Args) -> ToolsCallResult {
    respond("create wallet from mnemonic", async {
        let phrase = Zeroizing::new(args.require_str("mnemonic", "Mnemonic is required")?.to_owned());
        let path = args.optional_str("path")?.map(str::to_owned);
        let locale = args.optional_str("locale")?.map(str::to_owned);

        let wallet = blocking(move || {
            Ok(Wallet::from_mnemonic(&phrase, path.as_deref(), locale.as_deref())?)
        })
        .await?;

        Ok(Reply::new(
            describe(&wallet, true),
            "Wallet created from mnemonic successfully",
        ))
    })
    .await
}

pub async fn from_encrypted_json(args: &Args) -> ToolsCallResult {
    respond("create wallet from encrypted JSON", async {
        let json = args.require_str("json", "Encrypted JSON is required")?.to_owned();
        let password = Zeroizing::new(args.require_str("password", "Password is required")?.to_owned());

        let wallet = blocking(move || Ok(Wallet::from_encrypted_json(&json, &password)?)).await?;

        Ok(Reply::new(
            describe(&wallet, false),
            "Wallet created from encrypted JSON successfully",
        ))
    })
    .await
}

/// `options` of `wallet_encrypt`; unset scrypt fields keep their defaults
#[derive(Debug, Default, Deserialize)]
struct EncryptOptions {
    #[serde(default)]
    scrypt: Option<ScryptOverrides>,
}

#[derive(Debug, Default, Deserialize)]
struct ScryptOverrides {
    #[serde(default, rename = "N", alias = "n")]
    n: Option<u64>,
    #[serde(default)]
    r: Option<u32>,
    #[serde(default)]
    p: Option<u32>,
}

impl EncryptOptions {
    fn kdf(&self) -> Kdf {
        let defaults = ScryptParams::default();
        match &self.scrypt {
            Some(overrides) => Kdf::Scrypt(ScryptParams {
                n: overrides.n.unwrap_or(defaults.n),
                r: overrides.r.unwrap_or(defaults.r),
                p: overrides.p.unwrap_or(defaults.p),
            }),
            None => Kdf::Scrypt(defaults),
        }
    }
}

pub async fn encrypt(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("encrypt wallet", async {
        args.require("wallet", "Wallet is required")?;
        let password = Zeroizing::new(args.require_str("password", "Password is required")?.to_owned());
        let kdf = args
            .optional_typed::<EncryptOptions>("options")?
            .unwrap_or_default()
            .kdf();

        let wallet = ctx.wallet(args).await?;
        let encrypted = blocking(move || Ok(wallet.encrypt(&password, kdf)?)).await?;

        Ok(Reply::new(
            json!({ "encryptedWallet": encrypted }),
            "Wallet encrypted successfully",
        ))
    })
    .await
}

pub async fn get_address(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get wallet address", async {
        let wallet = ctx.wallet(args).await?;
        Ok(Reply::new(
            json!({ "address": wallet.address_checksummed() }),
            "Wallet address retrieved successfully",
        ))
    })
    .await
}

pub async fn get_public_key(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get wallet public key", async {
        let wallet = ctx.wallet(args).await?;
        Ok(Reply::new(
            json!({ "publicKey": wallet.public_key_hex() }),
            "Wallet public key retrieved successfully",
        ))
    })
    .await
}

pub async fn get_private_key(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get wallet private key", async {
        let wallet = ctx.wallet(args).await?;
        Ok(Reply::new(
            json!({ "privateKey": wallet.private_key_hex().as_str() }),
            "WARNING: Never share your private key with anyone. Wallet private key retrieved successfully",
        ))
    })
    .await
}

pub async fn get_mnemonic(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get wallet mnemonic", async {
        let wallet = ctx.wallet(args).await?;
        let info = wallet.mnemonic().ok_or_else(|| {
            ToolError::Rejected("This wallet does not have a mnemonic phrase".to_string())
        })?;
        Ok(Reply::new(
            json!({ "mnemonic": info.phrase.as_str() }),
            "WARNING: Never share your mnemonic phrase with anyone. Wallet mnemonic retrieved successfully",
        ))
    })
    .await
}
