//! Transaction population, signing and broadcast
//!
//! [`populate`] fills in whatever the caller left out:
//!
//! - `to` is resolved through ENS when it is not a plain address
//! - fees: legacy `gasPrice` for type 0/1, EIP-1559 fields for type 2, and
//!   for untyped requests whichever the network supports
//! - `nonce` from the pending transaction count
//! - `gasLimit` from `eth_estimateGas`
//! - `chainId` from the provider
//!
//! RPC calls are only made for fields that are missing.

use alloy::eips::eip2718::Encodable2718;
use alloy::eips::eip2930::AccessList;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::ens;
use crate::error::{Result, WalletError};
use crate::fees::FeeData;
use crate::provider::ProviderHandle;
use crate::units::Quantity;
use crate::wallet::Wallet;

/// Loosely-typed transaction object as supplied by callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub value: Option<Quantity>,
    #[serde(default)]
    pub gas_limit: Option<Quantity>,
    #[serde(default)]
    pub gas_price: Option<Quantity>,
    #[serde(default)]
    pub nonce: Option<Quantity>,
    #[serde(default, rename = "type")]
    pub tx_type: Option<Quantity>,
    #[serde(default)]
    pub max_fee_per_gas: Option<Quantity>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<Quantity>,
    #[serde(default)]
    pub chain_id: Option<Quantity>,
    #[serde(default)]
    pub access_list: Option<AccessList>,
}

impl TransactionInput {
    /// Calldata, with an empty string or bare `0x` treated as absent
    pub fn data_bytes(&self) -> Result<Option<Bytes>> {
        self.data
            .as_deref()
            .map(str::trim)
            .map(|d| d.strip_prefix("0x").unwrap_or(d))
            .filter(|d| !d.is_empty())
            .map(|d| {
                hex::decode(d)
                    .map(Bytes::from)
                    .map_err(|e| WalletError::InvalidHex(e.to_string()))
            })
            .transpose()
    }

    /// Transaction type, restricted to 0, 1 and 2
    pub fn envelope_type(&self) -> Result<Option<u8>> {
        match self.tx_type.map(|q| q.to_u64()).transpose()? {
            None => Ok(None),
            Some(t @ 0..=2) => Ok(Some(t as u8)),
            Some(other) => Err(WalletError::Transaction(format!(
                "unsupported transaction type {}",
                other
            ))),
        }
    }

    fn from_address(&self) -> Result<Option<Address>> {
        self.from
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| {
                f.parse::<Address>()
                    .map_err(|_| WalletError::InvalidAddress(f.to_string()))
            })
            .transpose()
    }

    async fn resolve_to(&self, handle: &ProviderHandle) -> Result<Option<Address>> {
        match self.to.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(to) => ens::resolve_address_or_name(handle, to).await.map(Some),
            None => Ok(None),
        }
    }

    /// Copy every caller-supplied field onto a request
    fn apply(&self, mut request: TransactionRequest) -> Result<TransactionRequest> {
        if let Some(data) = self.data_bytes()? {
            request.set_input(data);
        }
        if let Some(value) = self.value {
            request.set_value(value.value());
        }
        if let Some(gas) = self.gas_limit {
            request.set_gas_limit(gas.to_u64()?);
        }
        if let Some(price) = self.gas_price {
            request.set_gas_price(price.to_u128()?);
        }
        if let Some(fee) = self.max_fee_per_gas {
            request.set_max_fee_per_gas(fee.to_u128()?);
        }
        if let Some(tip) = self.max_priority_fee_per_gas {
            request.set_max_priority_fee_per_gas(tip.to_u128()?);
        }
        if let Some(nonce) = self.nonce {
            request.set_nonce(nonce.to_u64()?);
        }
        if let Some(chain_id) = self.chain_id {
            request.set_chain_id(chain_id.to_u64()?);
        }
        if let Some(list) = &self.access_list {
            request.set_access_list(list.clone());
        }
        Ok(request)
    }
}

fn check_from(claimed: Option<Address>, signer: Address) -> Result<()> {
    match claimed {
        Some(claimed) if claimed != signer => Err(WalletError::Transaction(format!(
            "from address mismatch: {} is not {}",
            claimed, signer
        ))),
        _ => Ok(()),
    }
}

/// Request for `eth_call`, with `from` defaulting to the given sender
pub async fn call_request(
    handle: &ProviderHandle,
    input: &TransactionInput,
    sender: Option<Address>,
) -> Result<TransactionRequest> {
    let claimed = input.from_address()?;
    if let Some(sender) = sender {
        check_from(claimed, sender)?;
    }

    let mut request = input.apply(TransactionRequest::default())?;
    if let Some(to) = input.resolve_to(handle).await? {
        request.set_to(to);
    }
    if let Some(from) = claimed.or(sender) {
        request.set_from(from);
    }
    Ok(request)
}

/// Request for `eth_estimateGas`
pub async fn estimate_request(
    handle: &ProviderHandle,
    input: &TransactionInput,
) -> Result<TransactionRequest> {
    call_request(handle, input, None).await
}

/// A transaction with every field required for signing
#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedTransaction {
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub value: U256,
    pub data: Bytes,
    pub chain_id: u64,
    pub tx_type: u8,
    pub access_list: Option<AccessList>,
}

impl PopulatedTransaction {
    pub fn to_request(&self) -> TransactionRequest {
        let mut request = TransactionRequest::default()
            .with_from(self.from)
            .with_nonce(self.nonce)
            .with_gas_limit(self.gas_limit)
            .with_value(self.value)
            .with_input(self.data.clone())
            .with_chain_id(self.chain_id);

        match self.to {
            Some(to) => request.set_to(to),
            None => request.set_create(),
        }

        if self.tx_type == 2 {
            if let Some(fee) = self.max_fee_per_gas {
                request.set_max_fee_per_gas(fee);
            }
            if let Some(tip) = self.max_priority_fee_per_gas {
                request.set_max_priority_fee_per_gas(tip);
            }
        } else if let Some(price) = self.gas_price {
            request.set_gas_price(price);
        }

        // An access list plus a gas price selects EIP-2930
        match (&self.access_list, self.tx_type) {
            (Some(list), 1 | 2) => request.set_access_list(list.clone()),
            (None, 1) => request.set_access_list(AccessList::default()),
            _ => {}
        }

        request
    }

    /// JSON summary with quantities as decimal strings
    pub fn summary(&self) -> Value {
        json!({
            "to": self.to.map(|a| a.to_checksum(None)),
            "from": self.from.to_checksum(None),
            "nonce": self.nonce,
            "gasLimit": self.gas_limit.to_string(),
            "gasPrice": self.gas_price.map(|p| p.to_string()),
            "data": self.data.to_string(),
            "value": self.value.to_string(),
            "chainId": self.chain_id,
            "type": self.tx_type,
            "maxFeePerGas": self.max_fee_per_gas.map(|f| f.to_string()),
            "maxPriorityFeePerGas": self.max_priority_fee_per_gas.map(|f| f.to_string()),
        })
    }
}

/// Fill in every missing field needed to sign for `signer`
pub async fn populate(
    handle: &ProviderHandle,
    signer: Address,
    input: &TransactionInput,
) -> Result<PopulatedTransaction> {
    check_from(input.from_address()?, signer)?;

    let provider = handle.provider();
    let to = input.resolve_to(handle).await?;
    let data = input.data_bytes()?.unwrap_or_default();
    let value = input.value.map(|q| q.value()).unwrap_or_default();
    let mut tx_type = input.envelope_type()?;
    let mut gas_price = input.gas_price.map(|q| q.to_u128()).transpose()?;
    let mut max_fee = input.max_fee_per_gas.map(|q| q.to_u128()).transpose()?;
    let mut max_priority = input
        .max_priority_fee_per_gas
        .map(|q| q.to_u128())
        .transpose()?;

    let has_eip1559 = max_fee.is_some() || max_priority.is_some();
    if gas_price.is_some() && (tx_type == Some(2) || has_eip1559) {
        return Err(WalletError::Transaction(
            "eip-1559 transaction do not support gasPrice".to_string(),
        ));
    }
    if matches!(tx_type, Some(0 | 1)) && has_eip1559 {
        return Err(WalletError::Transaction(
            "pre-eip-1559 transaction do not support maxFeePerGas/maxPriorityFeePerGas"
                .to_string(),
        ));
    }

    match tx_type {
        Some(0 | 1) => {
            if gas_price.is_none() {
                gas_price = Some(provider.get_gas_price().await?);
            }
        }
        None | Some(2) if max_fee.is_some() && max_priority.is_some() => {
            tx_type = Some(2);
        }
        _ => {
            let fees = FeeData::fetch(provider).await?;
            debug!(?fees, "Fetched fee data for population");

            if tx_type.is_none() {
                if fees.supports_eip1559() {
                    tx_type = Some(2);
                    match gas_price.take() {
                        Some(price) => {
                            max_fee = Some(price);
                            max_priority = Some(price);
                        }
                        None => {
                            max_fee = max_fee.or(fees.max_fee_per_gas);
                            max_priority = max_priority.or(fees.max_priority_fee_per_gas);
                        }
                    }
                } else if let Some(price) = fees.gas_price {
                    if has_eip1559 {
                        return Err(WalletError::Transaction(
                            "network does not support EIP-1559".to_string(),
                        ));
                    }
                    gas_price = gas_price.or(Some(price));
                    tx_type = Some(0);
                } else {
                    return Err(WalletError::Transaction(
                        "failed to get consistent fee data".to_string(),
                    ));
                }
            } else {
                max_fee = max_fee.or(fees.max_fee_per_gas);
                max_priority = max_priority.or(fees.max_priority_fee_per_gas);
                if max_fee.is_none() || max_priority.is_none() {
                    return Err(WalletError::Transaction(
                        "network does not support EIP-1559".to_string(),
                    ));
                }
            }
        }
    }

    let nonce = match input.nonce {
        Some(nonce) => nonce.to_u64()?,
        None => provider.get_transaction_count(signer).pending().await?,
    };

    let gas_limit = match input.gas_limit {
        Some(gas) => gas.to_u64()?,
        None => {
            let mut estimate = TransactionRequest::default()
                .with_from(signer)
                .with_value(value)
                .with_input(data.clone());
            if let Some(to) = to {
                estimate.set_to(to);
            }
            if let Some(price) = gas_price {
                estimate.set_gas_price(price);
            }
            if let Some(fee) = max_fee {
                estimate.set_max_fee_per_gas(fee);
            }
            if let Some(tip) = max_priority {
                estimate.set_max_priority_fee_per_gas(tip);
            }
            provider.estimate_gas(estimate).await.map_err(|e| {
                WalletError::Transaction(format!(
                    "cannot estimate gas; transaction may fail or may require manual gas limit: {}",
                    e
                ))
            })?
        }
    };

    let chain_id = match input.chain_id {
        Some(chain_id) => chain_id.to_u64()?,
        None => provider.get_chain_id().await?,
    };

    Ok(PopulatedTransaction {
        from: signer,
        to,
        nonce,
        gas_limit,
        gas_price,
        max_fee_per_gas: max_fee,
        max_priority_fee_per_gas: max_priority,
        value,
        data,
        chain_id,
        tx_type: tx_type.unwrap_or(0),
        access_list: input.access_list.clone(),
    })
}

/// An RLP/EIP-2718 encoded, signed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Bytes,
    pub hash: B256,
}

pub async fn sign(wallet: &Wallet, populated: &PopulatedTransaction) -> Result<SignedTransaction> {
    let signer = EthereumWallet::from(wallet.signer().clone());
    let envelope = populated
        .to_request()
        .build(&signer)
        .await
        .map_err(|e| WalletError::Transaction(e.to_string()))?;

    let raw = Bytes::from(envelope.encoded_2718());
    let hash = keccak256(&raw);
    Ok(SignedTransaction { raw, hash })
}

/// A broadcast transaction
#[derive(Debug, Clone, PartialEq)]
pub struct SentTransaction {
    pub hash: B256,
    pub transaction: PopulatedTransaction,
}

impl SentTransaction {
    pub fn summary(&self) -> Value {
        let populated = &self.transaction;
        json!({
            "hash": self.hash.to_string(),
            "nonce": populated.nonce,
            "gasLimit": populated.gas_limit.to_string(),
            "gasPrice": populated.gas_price.map(|p| p.to_string()),
            "data": populated.data.to_string(),
            "value": populated.value.to_string(),
            "chainId": populated.chain_id,
            "from": populated.from.to_checksum(None),
            "to": populated.to.map(|a| a.to_checksum(None)),
            "type": populated.tx_type,
        })
    }
}

/// Populate, sign and broadcast
pub async fn send(
    handle: &ProviderHandle,
    wallet: &Wallet,
    input: &TransactionInput,
) -> Result<SentTransaction> {
    let populated = populate(handle, wallet.address(), input).await?;
    let signed = sign(wallet, &populated).await?;

    handle.provider().send_raw_transaction(&signed.raw).await?;
    debug!(hash = %signed.hash, "Transaction broadcast");

    Ok(SentTransaction {
        hash: signed.hash,
        transaction: populated,
    })
}
