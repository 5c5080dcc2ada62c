//! Network information

use alloy::providers::Provider;
use serde_json::json;
use tessera_core::{FeeData, Network};

use super::{define, respond, schema, Reply, ToolContext, QUERY};
use crate::protocol::{Tool, ToolsCallResult};
use crate::validation::Args;

pub fn definitions() -> Vec<Tool> {
    vec![
        define(
            "network_get_network",
            "Get Network",
            "Get the current network information",
            schema::object(schema::provider(), &[]),
            QUERY,
        ),
        define(
            "network_get_block_number",
            "Get Block Number",
            "Get the current block number",
            schema::object(schema::provider(), &[]),
            QUERY,
        ),
        define(
            "network_get_fee_data",
            "Get Fee Data",
            "Get the current fee data (base fee, max priority fee, etc.)",
            schema::object(schema::provider(), &[]),
            QUERY,
        ),
    ]
}

pub async fn get_network(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get network information", async {
        let handle = ctx.provider(args).await?;
        let network = Network::from_chain_id(handle.chain_id().await?);

        Ok(Reply::new(
            json!({ "network": network }),
            "Network information retrieved successfully",
        ))
    })
    .await
}

pub async fn get_block_number(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get block number", async {
        let handle = ctx.provider(args).await?;
        let block_number = handle.provider().get_block_number().await?;

        Ok(Reply::new(
            json!({ "blockNumber": block_number }),
            "Block number retrieved successfully",
        ))
    })
    .await
}

pub async fn get_fee_data(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get fee data", async {
        let handle = ctx.provider(args).await?;
        let fees = FeeData::fetch(handle.provider()).await?;
        let decimal = |v: Option<u128>| v.map(|v| v.to_string());

        Ok(Reply::new(
            json!({
                "feeData": {
                    "gasPrice": decimal(fees.gas_price),
                    "maxFeePerGas": decimal(fees.max_fee_per_gas),
                    "maxPriorityFeePerGas": decimal(fees.max_priority_fee_per_gas),
                }
            }),
            "Fee data retrieved successfully",
        ))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_get_network_mainnet() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0x1");

        let result = call(&ctx, "network_get_network", json!({})).await;
        assert_eq!(result.message(), "Network information retrieved successfully");
        assert_eq!(
            structured(&result),
            &json!({
                "network": {
                    "name": "homestead",
                    "chainId": 1,
                    "ensAddress": "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e"
                }
            })
        );
    }

    #[tokio::test]
    async fn test_get_network_unknown_chain() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0x7a69");

        let result = call(&ctx, "network_get_network", json!({})).await;
        let network = &structured(&result)["network"];
        assert_eq!(network["name"], "unknown");
        assert_eq!(network["chainId"], 31337);
        assert_eq!(network["ensAddress"], Value::Null);
    }

    #[tokio::test]
    async fn test_get_block_number() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0x1312d00");

        let result = call(&ctx, "network_get_block_number", json!({})).await;
        assert_eq!(result.message(), "Block number retrieved successfully");
        assert_eq!(structured(&result), &json!({ "blockNumber": 20000000 }));
    }

    #[tokio::test]
    async fn test_get_fee_data_legacy_chain() {
        let (ctx, asserter) = mocked_context(None);
        // no latest block, so no base fee
        asserter.push_success(&Value::Null);
        asserter.push_success(&"0x3b9aca00");

        let result = call(&ctx, "network_get_fee_data", json!({})).await;
        assert_eq!(result.message(), "Fee data retrieved successfully");
        assert_eq!(
            structured(&result),
            &json!({
                "feeData": {
                    "gasPrice": "1000000000",
                    "maxFeePerGas": null,
                    "maxPriorityFeePerGas": null
                }
            })
        );
    }

    #[tokio::test]
    async fn test_network_rpc_failure() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_failure_msg("connection refused");

        let result = call(&ctx, "network_get_block_number", json!({})).await;
        assert!(result.is_error());
        assert!(result.message().starts_with("Failed to get block number: "));
    }
}
