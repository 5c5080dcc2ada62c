//! Error types for wallet and provider operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("unsupported mnemonic locale: {0}")]
    UnsupportedLocale(String),

    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    #[error("HD derivation error: {0}")]
    HdDerivation(String),

    #[error("keystore error: {0}")]
    Keystore(String),

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("Wallet data is required or set PRIVATE_KEY environment variable")]
    MissingWalletData,

    #[error("Password is required for encrypted JSON wallets")]
    PasswordRequired,

    #[error("Invalid wallet data: {0}")]
    InvalidWalletData(Box<WalletError>),

    #[error("This wallet does not have a mnemonic phrase")]
    NoMnemonic,

    #[error("Invalid provider URL: {0}")]
    InvalidProviderUrl(String),

    #[error("{0}")]
    Rpc(#[from] alloy::transports::TransportError),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid block tag: {0}")]
    InvalidBlockTag(String),

    #[error("invalid hex data: {0}")]
    InvalidHex(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid typed data: {0}")]
    TypedData(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("ENS error: {0}")]
    Ens(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WalletError {
    /// Wrap a construction failure the way wallet resolution reports it
    pub fn invalid_wallet_data(inner: WalletError) -> Self {
        match inner {
            WalletError::InvalidWalletData(_) => inner,
            other => WalletError::InvalidWalletData(Box::new(other)),
        }
    }
}
