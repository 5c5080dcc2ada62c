//! Tessera MCP prompt definitions
//!
//! Prompts walk an agent through multi-tool workflows.

use serde_json::{Map, Value};
use tessera_core::network;

use crate::protocol::{Prompt, PromptArgument, PromptMessage, PromptsGetResult};

type Arguments = Map<String, Value>;

fn argument(name: &str, description: &str, required: bool) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        description: Some(description.to_string()),
        required: Some(required),
    }
}

pub fn get_all_prompts() -> Vec<Prompt> {
    vec![
        Prompt {
            name: "send_native_transfer".to_string(),
            title: Some("Send Native Transfer".to_string()),
            description: Some(
                "Guided workflow for sending ether (or the chain's native token)".to_string(),
            ),
            arguments: Some(vec![
                argument("to", "Recipient address or ENS name", true),
                argument("amount", "Amount in ether, e.g. '0.1'", true),
                argument("chain_id", "Expected chain ID (default: 1)", false),
            ]),
        },
        Prompt {
            name: "verify_signature".to_string(),
            title: Some("Verify Signature".to_string()),
            description: Some("Check who signed a message".to_string()),
            arguments: Some(vec![
                argument("message", "The signed message", true),
                argument("signature", "The 65-byte hex signature", true),
                argument("address", "The address expected to have signed", true),
            ]),
        },
        Prompt {
            name: "inspect_transaction".to_string(),
            title: Some("Inspect Transaction".to_string()),
            description: Some("Look up a transaction and explain its outcome".to_string()),
            arguments: Some(vec![argument(
                "transaction_hash",
                "The 32-byte transaction hash",
                true,
            )]),
        },
    ]
}

/// Render a prompt with its arguments
pub fn get_prompt(name: &str, arguments: Option<&Arguments>) -> Result<PromptsGetResult, String> {
    let empty = Arguments::new();
    let args = arguments.unwrap_or(&empty);

    match name {
        "send_native_transfer" => send_native_transfer(args),
        "verify_signature" => verify_signature(args),
        "inspect_transaction" => inspect_transaction(args),
        _ => Err(format!("Unknown prompt: {}", name)),
    }
}

fn required<'a>(args: &'a Arguments, name: &str) -> Result<&'a str, String> {
    args.get(name)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("Missing required argument: {}", name))
}

fn chain_id(args: &Arguments) -> Result<u64, String> {
    match args.get("chain_id") {
        None | Some(Value::Null) => Ok(1),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| format!("Invalid chain_id: {}", n)),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid chain_id: {}", s)),
        Some(other) => Err(format!("Invalid chain_id: {}", other)),
    }
}

fn send_native_transfer(args: &Arguments) -> Result<PromptsGetResult, String> {
    let to = required(args, "to")?;
    let amount = required(args, "amount")?;
    let chain_id = chain_id(args)?;
    let network = network::network_name(chain_id);

    let text = format!(
        r#"Send {amount} ether to {to} on {network} (chain ID {chain_id}).

## Pre-flight Checks

1. **Confirm the network** with `network_get_network`. Stop if the chain ID is not {chain_id}.
2. **Check the sender** with `wallet_get_address` and `wallet_get_balance`. The balance must cover {amount} ether plus gas.
3. If `{to}` is an ENS name, **resolve it** with `provider_resolve_name` and show the address to the user.

## Build and Review

4. **Populate** the transaction with `wallet_populate_transaction`:
   ```json
   {{ "transaction": {{ "to": "{to}", "value": "<{amount} ether in wei>" }} }}
   ```
5. Show the populated nonce, gas limit and fees to the user and ask for confirmation.

## Broadcast

6. **Send** with `wallet_send_transaction` using the same transaction object.
7. **Follow up** with `provider_get_transaction_receipt` until a receipt is returned.

## Notes

- `value` is in wei: 1 ether = 1000000000000000000 wei.
- Sending is irreversible. Never send without explicit confirmation."#
    );

    Ok(PromptsGetResult {
        description: Some(format!("Send {} ether to {} on {}", amount, to, network)),
        messages: vec![PromptMessage::user(text)],
    })
}

fn verify_signature(args: &Arguments) -> Result<PromptsGetResult, String> {
    let message = required(args, "message")?;
    let signature = required(args, "signature")?;
    let address = required(args, "address")?;

    let text = format!(
        r#"Verify that {address} signed the message below.

Message:
```
{message}
```

1. Call `wallet_verify_message`:
   ```json
   {{ "message": {message_json}, "signature": "{signature}", "address": "{address}" }}
   ```
2. Report `isValid` and the `recoveredAddress`.
3. If the signature is invalid, say which address actually signed it. If the message looks like EIP-712 typed data, suggest `wallet_verify_typed_data` instead."#,
        message_json = Value::String(message.to_string()),
    );

    Ok(PromptsGetResult {
        description: Some(format!("Verify a signature from {}", address)),
        messages: vec![PromptMessage::user(text)],
    })
}

fn inspect_transaction(args: &Arguments) -> Result<PromptsGetResult, String> {
    let hash = required(args, "transaction_hash")?;

    let text = format!(
        r#"Explain what transaction {hash} did.

1. Fetch it with `provider_get_transaction` (`transactionHash`: "{hash}"). A null result means the node does not know this hash.
2. Fetch the receipt with `provider_get_transaction_receipt`. A null receipt means it is still pending.
3. Summarise:
   - sender, recipient and value in ether
   - status (success or reverted), gas used and effective gas price
   - emitted logs, grouped by contract address
4. If the recipient has code (`provider_get_code`), say that it was a contract interaction."#
    );

    Ok(PromptsGetResult {
        description: Some(format!("Inspect transaction {}", hash)),
        messages: vec![PromptMessage::user(text)],
    })
}
