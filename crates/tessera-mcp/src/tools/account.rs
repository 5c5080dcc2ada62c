//! Queries about the caller's own account

use alloy::primitives::U256;
use alloy::providers::Provider;
use serde_json::json;
use tessera_core::transaction::{self, TransactionInput};
use tessera_core::units::{format_ether, format_gwei};
use tessera_core::BlockTag;

use super::{define, respond, schema, Reply, ToolContext, QUERY};
use crate::protocol::{Tool, ToolsCallResult};
use crate::validation::Args;

pub fn definitions() -> Vec<Tool> {
    let wallet_and_provider = schema::with(schema::wallet(), schema::provider());

    vec![
        define(
            "wallet_get_balance",
            "Get Balance",
            "Get the balance of the wallet",
            schema::object(
                schema::with(wallet_and_provider.clone(), schema::block_tag()),
                &[],
            ),
            QUERY,
        ),
        define(
            "wallet_get_chain_id",
            "Get Chain ID",
            "Get the chain ID the wallet is connected to",
            schema::object(wallet_and_provider.clone(), &[]),
            QUERY,
        ),
        define(
            "wallet_get_gas_price",
            "Get Gas Price",
            "Get the current gas price",
            schema::object(wallet_and_provider.clone(), &[]),
            QUERY,
        ),
        define(
            "wallet_get_transaction_count",
            "Get Transaction Count",
            "Get the number of transactions sent from this account (nonce)",
            schema::object(
                schema::with(wallet_and_provider.clone(), schema::block_tag()),
                &[],
            ),
            QUERY,
        ),
        define(
            "wallet_call",
            "Call Contract",
            "Call a contract method without sending a transaction",
            schema::object(
                schema::with(
                    schema::with(wallet_and_provider, schema::block_tag()),
                    json!({ "transaction": schema::transaction("The transaction to call", false) }),
                ),
                &["transaction"],
            ),
            QUERY,
        ),
    ]
}

pub async fn get_balance(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get wallet balance", async {
        let block = args.optional_typed::<BlockTag>("blockTag")?.unwrap_or_default();
        let wallet = ctx.wallet(args).await?;
        let handle = ctx.provider(args).await?;

        let balance: U256 = handle
            .provider()
            .get_balance(wallet.address())
            .block_id(block.to_block_id())
            .await?;

        Ok(Reply::new(
            json!({
                "balance": balance.to_string(),
                "balanceInEth": format_ether(balance)?,
            }),
            "Wallet balance retrieved successfully",
        ))
    })
    .await
}

pub async fn get_chain_id(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get chain ID", async {
        // the wallet is resolved only so bad wallet data is still reported
        ctx.wallet(args).await?;
        let handle = ctx.provider(args).await?;
        let chain_id = handle.chain_id().await?;

        Ok(Reply::new(
            json!({ "chainId": chain_id }),
            "Chain ID retrieved successfully",
        ))
    })
    .await
}

pub async fn get_gas_price(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get gas price", async {
        ctx.wallet(args).await?;
        let handle = ctx.provider(args).await?;
        let gas_price = U256::from(handle.provider().get_gas_price().await?);

        Ok(Reply::new(
            json!({
                "gasPrice": gas_price.to_string(),
                "gasPriceInGwei": format_gwei(gas_price)?,
            }),
            "Gas price retrieved successfully",
        ))
    })
    .await
}

pub async fn get_transaction_count(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get transaction count", async {
        let block = args.optional_typed::<BlockTag>("blockTag")?.unwrap_or_default();
        let wallet = ctx.wallet(args).await?;
        let handle = ctx.provider(args).await?;

        let count = handle
            .provider()
            .get_transaction_count(wallet.address())
            .block_id(block.to_block_id())
            .await?;

        Ok(Reply::new(
            json!({ "transactionCount": count }),
            "Transaction count retrieved successfully",
        ))
    })
    .await
}

pub async fn call(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("call contract", async {
        let input: TransactionInput =
            args.require_typed("transaction", "Transaction is required")?;
        let block = args.optional_typed::<BlockTag>("blockTag")?.unwrap_or_default();
        let wallet = ctx.wallet(args).await?;
        let handle = ctx.provider(args).await?;

        let request = transaction::call_request(&handle, &input, Some(wallet.address())).await?;
        let output = handle
            .provider()
            .call(request)
            .block(block.to_block_id())
            .await?;

        Ok(Reply::new(
            json!({ "result": output.to_string() }),
            "Contract call executed successfully",
        ))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_balance() {
        let (ctx, asserter) = mocked_context(Some(ANVIL_KEY));
        asserter.push_success(&"0x14d1120d7b160000");

        let result = call(&ctx, "wallet_get_balance", json!({})).await;
        assert_eq!(result.message(), "Wallet balance retrieved successfully");
        assert_eq!(
            structured(&result),
            &json!({ "balance": "1500000000000000000", "balanceInEth": "1.5" })
        );
    }

    #[tokio::test]
    async fn test_get_balance_bad_block_tag() {
        let (ctx, _) = mocked_context(Some(ANVIL_KEY));
        let result = call(&ctx, "wallet_get_balance", json!({ "blockTag": "tomorrow" })).await;
        assert!(result.is_error());
        assert!(result.message().starts_with("Failed to get wallet balance: "));
    }

    #[tokio::test]
    async fn test_get_balance_rpc_failure() {
        let (ctx, asserter) = mocked_context(Some(ANVIL_KEY));
        asserter.push_failure_msg("header not found");

        let result = call(&ctx, "wallet_get_balance", json!({})).await;
        assert!(result.is_error());
        assert!(result.message().starts_with("Failed to get wallet balance: "));
        assert!(result.message().contains("header not found"));
    }

    #[tokio::test]
    async fn test_get_chain_id() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0xaa36a7");

        let result = call(&ctx, "wallet_get_chain_id", json!({ "wallet": ANVIL_KEY })).await;
        assert_eq!(structured(&result), &json!({ "chainId": 11155111 }));
    }

    #[tokio::test]
    async fn test_get_gas_price() {
        let (ctx, asserter) = mocked_context(Some(ANVIL_KEY));
        asserter.push_success(&"0x4a817c800");

        let result = call(&ctx, "wallet_get_gas_price", json!({})).await;
        assert_eq!(result.message(), "Gas price retrieved successfully");
        assert_eq!(
            structured(&result),
            &json!({ "gasPrice": "20000000000", "gasPriceInGwei": "20.0" })
        );
    }

    #[tokio::test]
    async fn test_get_transaction_count() {
        let (ctx, asserter) = mocked_context(Some(ANVIL_KEY));
        asserter.push_success(&"0x7");

        let result = call(
            &ctx,
            "wallet_get_transaction_count",
            json!({ "blockTag": "pending" }),
        )
        .await;
        assert_eq!(structured(&result), &json!({ "transactionCount": 7 }));
    }

    #[tokio::test]
    async fn test_call() {
        let (ctx, asserter) = mocked_context(Some(ANVIL_KEY));
        asserter.push_success(&"0x000000000000000000000000000000000000000000000000000000000000002a");

        let result = call(
            &ctx,
            "wallet_call",
            json!({
                "transaction": {
                    "to": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                    "data": "0x18160ddd"
                }
            }),
        )
        .await;

        assert_eq!(result.message(), "Contract call executed successfully");
        assert_eq!(
            structured(&result)["result"],
            "0x000000000000000000000000000000000000000000000000000000000000002a"
        );
    }

    #[tokio::test]
    async fn test_call_requires_transaction() {
        let (ctx, _) = mocked_context(Some(ANVIL_KEY));
        let result = call(&ctx, "wallet_call", json!({})).await;
        assert_eq!(result.message(), "Transaction is required");
    }

    #[tokio::test]
    async fn test_call_rejects_foreign_from() {
        let (ctx, _) = mocked_context(Some(ANVIL_KEY));
        let result = call(
            &ctx,
            "wallet_call",
            json!({
                "transaction": {
                    "to": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                    "from": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
                }
            }),
        )
        .await;
        assert!(result.message().starts_with("Failed to call contract: "));
        assert!(result.message().contains("from address mismatch"));
    }
}
