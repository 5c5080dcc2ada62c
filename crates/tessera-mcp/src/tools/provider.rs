//! Chain queries against the provider

use alloy::primitives::B256;
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use serde_json::{json, Value};
use tessera_core::ens;
use tessera_core::transaction::{self as tx, TransactionInput};
use tessera_core::{BlockSelector, BlockTag};

use super::{define, respond, schema, Reply, ToolContext, ToolError, QUERY};
use crate::protocol::{Tool, ToolsCallResult};
use crate::validation::{validate_hash, validate_slot, Args};

pub fn definitions() -> Vec<Tool> {
    let hash = json!({
        "transactionHash": { "type": "string", "description": "The transaction hash" }
    });
    let address = json!({
        "address": { "type": "string", "description": "The address or ENS name" }
    });

    vec![
        define(
            "provider_get_block",
            "Get Block",
            "Get a block by number or hash",
            schema::object(
                schema::with(
                    schema::provider(),
                    json!({
                        "blockHashOrBlockTag": {
                            "type": "string",
                            "description": "Block hash or block tag (latest, pending, etc.)"
                        },
                        "includeTransactions": {
                            "type": "boolean",
                            "description": "Whether to include full transactions or just hashes"
                        }
                    }),
                ),
                &["blockHashOrBlockTag"],
            ),
            QUERY,
        ),
        define(
            "provider_get_transaction",
            "Get Transaction",
            "Get a transaction by hash",
            schema::object(schema::with(schema::provider(), hash.clone()), &["transactionHash"]),
            QUERY,
        ),
        define(
            "provider_get_transaction_receipt",
            "Get Transaction Receipt",
            "Get a transaction receipt",
            schema::object(schema::with(schema::provider(), hash), &["transactionHash"]),
            QUERY,
        ),
        define(
            "provider_get_code",
            "Get Code",
            "Get the code at an address",
            schema::object(
                schema::with(schema::with(schema::provider(), address.clone()), schema::block_tag()),
                &["address"],
            ),
            QUERY,
        ),
        define(
            "provider_get_storage_at",
            "Get Storage",
            "Get the storage at a position for an address",
            schema::object(
                schema::with(
                    schema::with(schema::with(schema::provider(), address), schema::block_tag()),
                    json!({
                        "position": { "type": "string", "description": "The storage position" }
                    }),
                ),
                &["address", "position"],
            ),
            QUERY,
        ),
        define(
            "provider_estimate_gas",
            "Estimate Gas",
            "Estimate the gas required for a transaction",
            schema::object(
                schema::with(
                    schema::provider(),
                    json!({ "transaction": schema::transaction("The transaction to estimate gas for", true) }),
                ),
                &["transaction"],
            ),
            QUERY,
        ),
        define(
            "provider_get_logs",
            "Get Logs",
            "Get logs that match a filter",
            schema::object(
                schema::with(
                    schema::provider(),
                    json!({
                        "filter": {
                            "type": "object",
                            "description": "The filter to apply",
                            "properties": {
                                "address": { "type": "string" },
                                "topics": { "type": "array", "items": { "type": ["string", "null"] } },
                                "fromBlock": { "type": "string" },
                                "toBlock": { "type": "string" },
                                "blockHash": { "type": "string" }
                            }
                        }
                    }),
                ),
                &["filter"],
            ),
            QUERY,
        ),
    ]
}

/// A block hash, a tag, or a bare block number
fn block_selector(value: &Value) -> Result<BlockSelector, ToolError> {
    match value {
        Value::String(s) => Ok(s.parse()?),
        Value::Number(n) => n
            .as_u64()
            .map(|n| BlockSelector::Tag(BlockTag::Number(n)))
            .ok_or_else(|| ToolError::Failed(format!("invalid block number: {}", n))),
        other => Err(ToolError::Failed(format!("invalid block selector: {}", other))),
    }
}

fn transaction_hash(args: &Args) -> Result<B256, ToolError> {
    validate_hash(args.require_str("transactionHash", "Transaction hash is required")?)
}

pub async fn get_block(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get block", async {
        let selector = block_selector(
            args.require("blockHashOrBlockTag", "Block hash or block tag is required")?,
        )?;
        let full = args.optional_bool("includeTransactions");
        let handle = ctx.provider(args).await?;

        let request = handle.provider().get_block(selector.to_block_id());
        let block = if full {
            request.full().await?
        } else {
            request.hashes().await?
        };

        Ok(Reply::new(json!({ "block": block }), "Block retrieved successfully"))
    })
    .await
}

pub async fn get_transaction(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get transaction", async {
        let hash = transaction_hash(args)?;
        let handle = ctx.provider(args).await?;
        let transaction = handle.provider().get_transaction_by_hash(hash).await?;

        Ok(Reply::new(
            json!({ "transaction": transaction }),
            "Transaction retrieved successfully",
        ))
    })
    .await
}

pub async fn get_transaction_receipt(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get transaction receipt", async {
        let hash = transaction_hash(args)?;
        let handle = ctx.provider(args).await?;
        let receipt = handle.provider().get_transaction_receipt(hash).await?;

        Ok(Reply::new(
            json!({ "receipt": receipt }),
            "Transaction receipt retrieved successfully",
        ))
    })
    .await
}

pub async fn get_code(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get code", async {
        let target = args.require_str("address", "Address is required")?;
        let block = args.optional_typed::<BlockTag>("blockTag")?.unwrap_or_default();
        let handle = ctx.provider(args).await?;

        let address = ens::resolve_address_or_name(&handle, target).await?;
        let code = handle
            .provider()
            .get_code_at(address)
            .block_id(block.to_block_id())
            .await?;

        Ok(Reply::new(
            json!({ "code": code.to_string() }),
            "Code retrieved successfully",
        ))
    })
    .await
}

pub async fn get_storage_at(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get storage", async {
        let target = args.require_str("address", "Address is required")?;
        let position = match args.require("position", "Position is required")? {
            Value::String(s) => validate_slot(s)?,
            other => validate_slot(&other.to_string())?,
        };
        let block = args.optional_typed::<BlockTag>("blockTag")?.unwrap_or_default();
        let handle = ctx.provider(args).await?;

        let address = ens::resolve_address_or_name(&handle, target).await?;
        let storage = handle
            .provider()
            .get_storage_at(address, position)
            .block_id(block.to_block_id())
            .await?;

        Ok(Reply::new(
            json!({ "storage": B256::from(storage).to_string() }),
            "Storage retrieved successfully",
        ))
    })
    .await
}

pub async fn estimate_gas(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("estimate gas", async {
        let input: TransactionInput =
            args.require_typed("transaction", "Transaction is required")?;
        let handle = ctx.provider(args).await?;

        let request = tx::estimate_request(&handle, &input).await?;
        let gas = handle.provider().estimate_gas(request).await?;

        Ok(Reply::new(
            json!({ "gasEstimate": gas.to_string() }),
            "Gas estimate retrieved successfully",
        ))
    })
    .await
}

pub async fn get_logs(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get logs", async {
        let filter: Filter = args.require_typed("filter", "Filter is required")?;
        let handle = ctx.provider(args).await?;
        let logs = handle.provider().get_logs(&filter).await?;

        Ok(Reply::new(json!({ "logs": logs }), "Logs retrieved successfully"))
    })
    .await
}
