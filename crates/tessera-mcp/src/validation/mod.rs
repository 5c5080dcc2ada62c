//! Request and argument validation
//!
//! Protocol-level checks return [`JsonRpcError`]s. Tool argument checks
//! return [`ToolError`]s, which end up in the tool's error envelope.

use alloy::primitives::{Address, B256, U256};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::protocol::{JsonRpcError, JsonRpcRequest, JSONRPC_VERSION};
use crate::tools::ToolError;

// ============================================================================
// Protocol
// ============================================================================

/// Reject requests that are not well-formed JSON-RPC 2.0
pub fn validate_request(request: &JsonRpcRequest) -> Result<(), JsonRpcError> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(JsonRpcError::invalid_request(format!(
            "unsupported jsonrpc version: {}",
            request.jsonrpc
        )));
    }
    if request.method.is_empty() {
        return Err(JsonRpcError::invalid_request("empty method"));
    }
    if request.method.starts_with("rpc.") {
        return Err(JsonRpcError::invalid_request(format!(
            "reserved method name: {}",
            request.method
        )));
    }
    Ok(())
}

/// Resource URIs must use our scheme and contain no traversal
pub fn validate_resource_uri(uri: &str) -> Result<&str, JsonRpcError> {
    match uri.strip_prefix(crate::resources::URI_SCHEME) {
        Some(rest) if !rest.is_empty() && !rest.contains("..") => Ok(rest),
        _ => Err(JsonRpcError::resource_not_found(uri)),
    }
}

/// Deserialize request params, with `None` for absent params
pub fn parse_params<T: DeserializeOwned>(
    request: &JsonRpcRequest,
) -> Result<Option<T>, JsonRpcError> {
    request
        .params
        .clone()
        .filter(|p| !p.is_null())
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

/// Deserialize request params that must be present
pub fn require_params<T: DeserializeOwned>(request: &JsonRpcRequest) -> Result<T, JsonRpcError> {
    parse_params(request)?.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
}

// ============================================================================
// Tool arguments
// ============================================================================

/// Whether a value counts as supplied (`null`, `false`, `""` and `0` do not)
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The `arguments` object of a `tools/call`
#[derive(Debug, Clone, Default)]
pub struct Args {
    fields: Map<String, Value>,
}

impl Args {
    pub fn new(arguments: Value) -> Result<Self, ToolError> {
        match arguments {
            Value::Null => Ok(Self::default()),
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ToolError::Rejected(format!(
                "Tool arguments must be an object, got {}",
                json_type(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| is_present(v))
    }

    /// A supplied value, or `message` verbatim
    pub fn require(&self, key: &str, message: &str) -> Result<&Value, ToolError> {
        self.get(key)
            .ok_or_else(|| ToolError::Rejected(message.to_string()))
    }

    /// Check several keys at once, failing with one shared message
    pub fn require_all(&self, keys: &[&str], message: &str) -> Result<(), ToolError> {
        if keys.iter().all(|key| self.get(key).is_some()) {
            Ok(())
        } else {
            Err(ToolError::Rejected(message.to_string()))
        }
    }

    pub fn require_str(&self, key: &str, message: &str) -> Result<&str, ToolError> {
        let value = self.require(key, message)?;
        value
            .as_str()
            .ok_or_else(|| ToolError::Failed(format!("{} must be a string", key)))
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<&str>, ToolError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(ToolError::Failed(format!("{} must be a string", key))),
        }
    }

    pub fn optional_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Deserialize a required field
    pub fn require_typed<T: DeserializeOwned>(
        &self,
        key: &str,
        message: &str,
    ) -> Result<T, ToolError> {
        let value = self.require(key, message)?;
        decode(key, value)
    }

    pub fn optional_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ToolError> {
        self.get(key).map(|value| decode(key, value)).transpose()
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, ToolError> {
    T::deserialize(value).map_err(|e| ToolError::Failed(format!("invalid {}: {}", key, e)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Values
// ============================================================================

/// A 20-byte hex address; checksum casing is not enforced
pub fn validate_evm_address(address: &str) -> Result<Address, ToolError> {
    let hex = validate_hex_string(address, Some(20))?;
    Ok(Address::from_slice(&hex))
}

/// A 32-byte hex hash
pub fn validate_hash(hash: &str) -> Result<B256, ToolError> {
    let hex = validate_hex_string(hash, Some(32))?;
    Ok(B256::from_slice(&hex))
}

/// A storage slot as a hex or decimal quantity
pub fn validate_slot(position: &str) -> Result<U256, ToolError> {
    let trimmed = position.trim();
    let parsed = match trimmed.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(trimmed, 10),
    };
    parsed.map_err(|_| ToolError::Failed(format!("invalid storage position: {}", position)))
}

/// `0x`-prefixed hex of an optional exact byte length
pub fn validate_hex_string(s: &str, expected_bytes: Option<usize>) -> Result<Vec<u8>, ToolError> {
    let digits = s
        .trim()
        .strip_prefix("0x")
        .ok_or_else(|| ToolError::Failed(format!("hex value must start with 0x: {}", s)))?;

    let bytes = hex::decode(digits)
        .map_err(|e| ToolError::Failed(format!("invalid hex value {}: {}", s, e)))?;

    match expected_bytes {
        Some(expected) if bytes.len() != expected => Err(ToolError::Failed(format!(
            "expected {} bytes, got {}: {}",
            expected,
            bytes.len(),
            s
        ))),
        _ => Ok(bytes),
    }
}
