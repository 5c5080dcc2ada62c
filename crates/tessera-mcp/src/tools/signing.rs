//! Message and EIP-712 signing

use serde_json::{json, Value};
use tessera_core::typed_data::{self, TypedDataRequest};
use tessera_core::wallet::{self as keys, signature_hex};

use super::{define, respond, schema, Reply, ToolContext, ToolError, LOCAL};
use crate::protocol::{Tool, ToolsCallResult};
use crate::validation::Args;

pub fn definitions() -> Vec<Tool> {
    let typed_data = json!({
        "domain": { "type": "object", "description": "The domain data" },
        "types": { "type": "object", "description": "The type definitions" },
        "value": { "type": "object", "description": "The value to sign" }
    });

    vec![
        define(
            "wallet_sign_message",
            "Sign Message",
            "Sign a message",
            schema::object(
                schema::with(
                    schema::wallet(),
                    json!({ "message": { "type": "string", "description": "The message to sign" } }),
                ),
                &["message"],
            ),
            LOCAL,
        ),
        define(
            "wallet_sign_typed_data",
            "Sign Typed Data",
            "Sign typed data (EIP-712)",
            schema::object(
                schema::with(schema::wallet(), typed_data.clone()),
                &["domain", "types", "value"],
            ),
            LOCAL,
        ),
        define(
            "wallet_verify_message",
            "Verify Message",
            "Verify a signed message",
            schema::object(
                json!({
                    "message": { "type": "string", "description": "The original message" },
                    "signature": { "type": "string", "description": "The signature to verify" },
                    "address": { "type": "string", "description": "The address that supposedly signed the message" }
                }),
                &["message", "signature", "address"],
            ),
            LOCAL,
        ),
        define(
            "wallet_verify_typed_data",
            "Verify Typed Data",
            "Verify signed typed data",
            schema::object(
                schema::with(
                    typed_data,
                    json!({
                        "signature": { "type": "string", "description": "The signature to verify" },
                        "address": { "type": "string", "description": "The address that supposedly signed the data" }
                    }),
                ),
                &["domain", "types", "value", "signature", "address"],
            ),
            LOCAL,
        ),
    ]
}

/// `domain`, `types` and `value` as given by the caller
fn typed_parts(args: &Args) -> (Value, Value, Value) {
    let part = |key| args.get(key).cloned().unwrap_or(Value::Null);
    (part("domain"), part("types"), part("value"))
}

fn string_field<'a>(args: &'a Args, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::Failed(format!("{} must be a string", key)))
}

pub async fn sign_message(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("sign message", async {
        let message = args.require_str("message", "Message is required")?;
        let wallet = ctx.wallet(args).await?;
        let signature = wallet.sign_message(message.as_bytes())?;

        Ok(Reply::new(
            json!({ "signature": signature_hex(&signature), "message": message }),
            "Message signed successfully",
        ))
    })
    .await
}

pub async fn sign_typed_data(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("sign typed data", async {
        args.require_all(
            &["domain", "types", "value"],
            "Domain, types, and value are required",
        )?;
        let (domain, types, value) = typed_parts(args);
        let request = TypedDataRequest::new(&domain, &types, &value)?;

        let wallet = ctx.wallet(args).await?;
        let signature = wallet.sign_typed_data(&request)?;

        Ok(Reply::new(
            json!({
                "signature": signature_hex(&signature),
                "domain": domain,
                "types": types,
                "value": value,
            }),
            "Typed data signed successfully",
        ))
    })
    .await
}

pub async fn verify_message(args: &Args) -> ToolsCallResult {
    respond("verify message", async {
        args.require_all(
            &["message", "signature", "address"],
            "Message, signature, and address are required",
        )?;
        let message = string_field(args, "message")?;
        let signature = string_field(args, "signature")?;
        let address = string_field(args, "address")?;

        let recovered = keys::verify_message(message.as_bytes(), signature)?;
        let is_valid = keys::addresses_match(address, recovered);

        Ok(Reply::new(
            json!({ "isValid": is_valid, "recoveredAddress": recovered.to_checksum(None) }),
            if is_valid {
                "Signature is valid"
            } else {
                "Signature is invalid"
            },
        ))
    })
    .await
}

pub async fn verify_typed_data(args: &Args) -> ToolsCallResult {
    respond("verify typed data", async {
        args.require_all(
            &["domain", "types", "value", "signature", "address"],
            "Domain, types, value, signature, and address are required",
        )?;
        let (domain, types, value) = typed_parts(args);
        let signature = string_field(args, "signature")?;
        let address = string_field(args, "address")?;

        let request = TypedDataRequest::new(&domain, &types, &value)?;
        let recovered = typed_data::verify_typed_data(&request, signature)?;
        let is_valid = keys::addresses_match(address, recovered);

        Ok(Reply::new(
            json!({ "isValid": is_valid, "recoveredAddress": recovered.to_checksum(None) }),
            if is_valid {
                "Typed data signature is valid"
            } else {
                "Typed data signature is invalid"
            },
        ))
    })
    .await
}
