//! EIP-712 typed structured data
//!
//! Callers provide `domain`, `types` and `value` separately. The primary
//! type is inferred as the one struct no other struct refers to, and any
//! `EIP712Domain` entry in `types` is ignored since the domain separator is
//! computed from the domain object itself.

use std::collections::BTreeSet;

use alloy::dyn_abi::TypedData;
use alloy::primitives::{Address, B256};
use serde_json::{json, Map, Value};

use crate::error::{Result, WalletError};
use crate::wallet::parse_signature;

const DOMAIN_TYPE: &str = "EIP712Domain";

/// A validated typed-data payload ready for hashing
#[derive(Debug, Clone)]
pub struct TypedDataRequest {
    primary_type: String,
    typed: TypedData,
}

impl TypedDataRequest {
    pub fn new(domain: &Value, types: &Value, value: &Value) -> Result<Self> {
        let types = types
            .as_object()
            .ok_or_else(|| WalletError::TypedData("types must be an object".into()))?;

        let mut struct_types: Map<String, Value> = types
            .iter()
            .filter(|(name, _)| name.as_str() != DOMAIN_TYPE)
            .map(|(name, fields)| (name.clone(), fields.clone()))
            .collect();

        let primary_type = infer_primary_type(&struct_types)?;

        // Let the domain object drive the domain separator
        struct_types.remove(DOMAIN_TYPE);

        let typed: TypedData = serde_json::from_value(json!({
            "types": struct_types,
            "primaryType": primary_type,
            "domain": domain,
            "message": value,
        }))
        .map_err(|e| WalletError::TypedData(e.to_string()))?;

        Ok(Self {
            primary_type,
            typed,
        })
    }

    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    /// `keccak256("\x19\x01" ++ domainSeparator ++ hashStruct(message))`
    pub fn signing_hash(&self) -> Result<B256> {
        self.typed
            .eip712_signing_hash()
            .map_err(|e| WalletError::TypedData(e.to_string()))
    }
}

/// Recover the signer of a typed-data signature
pub fn verify_typed_data(request: &TypedDataRequest, signature: &str) -> Result<Address> {
    let hash = request.signing_hash()?;
    parse_signature(signature)?
        .recover_address_from_prehash(&hash)
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))
}

fn infer_primary_type(types: &Map<String, Value>) -> Result<String> {
    let mut referenced = BTreeSet::new();

    for (name, fields) in types {
        let fields = fields.as_array().ok_or_else(|| {
            WalletError::TypedData(format!("fields of type {} must be an array", name))
        })?;

        for field in fields {
            let field_type = field
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    WalletError::TypedData(format!("field of type {} has no type", name))
                })?;
            let base = field_type.split('[').next().unwrap_or(field_type);
            if base != name && types.contains_key(base) {
                referenced.insert(base.to_string());
            }
        }
    }

    let mut candidates = types.keys().filter(|name| !referenced.contains(*name));

    match (candidates.next(), candidates.next()) {
        (Some(primary), None) => Ok(primary.clone()),
        (None, _) => Err(WalletError::TypedData("missing primary type".into())),
        (Some(_), Some(_)) => Err(WalletError::TypedData(
            "ambiguous primary types or unused types".into(),
        )),
    }
}
