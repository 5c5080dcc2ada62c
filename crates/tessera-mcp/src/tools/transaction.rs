//! Transaction population, signing and broadcast tools

use serde_json::json;
use tessera_core::transaction::{self as tx, TransactionInput};

use super::{define, respond, schema, Reply, ToolContext, BROADCAST, QUERY};
use crate::protocol::{Tool, ToolsCallResult};
use crate::validation::Args;

fn transaction_schema(description: &str) -> serde_json::Value {
    schema::object(
        schema::with(
            schema::with(schema::wallet(), schema::provider()),
            json!({ "transaction": schema::transaction(description, true) }),
        ),
        &["transaction"],
    )
}

pub fn definitions() -> Vec<Tool> {
    vec![
        define(
            "wallet_send_transaction",
            "Send Transaction",
            "Send a transaction",
            transaction_schema("The transaction to send"),
            BROADCAST,
        ),
        define(
            "wallet_sign_transaction",
            "Sign Transaction",
            "Sign a transaction without sending it",
            transaction_schema("The transaction to sign"),
            QUERY,
        ),
        define(
            "wallet_populate_transaction",
            "Populate Transaction",
            "Populate a transaction with missing fields",
            transaction_schema("The transaction to populate"),
            QUERY,
        ),
    ]
}

fn transaction_input(args: &Args) -> Result<TransactionInput, super::ToolError> {
    args.require_typed("transaction", "Transaction is required")
}

pub async fn send(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("send transaction", async {
        let input = transaction_input(args)?;
        let wallet = ctx.wallet(args).await?;
        let handle = ctx.provider(args).await?;

        let sent = tx::send(&handle, &wallet, &input).await?;
        Ok(Reply::new(sent.summary(), "Transaction sent successfully"))
    })
    .await
}

pub async fn sign(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("sign transaction", async {
        let input = transaction_input(args)?;
        let wallet = ctx.wallet(args).await?;
        let handle = ctx.provider(args).await?;

        let populated = tx::populate(&handle, wallet.address(), &input).await?;
        let signed = tx::sign(&wallet, &populated).await?;

        Ok(Reply::new(
            json!({ "signedTransaction": signed.raw.to_string() }),
            "Transaction signed successfully",
        ))
    })
    .await
}

pub async fn populate(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("populate transaction", async {
        let input = transaction_input(args)?;
        let wallet = ctx.wallet(args).await?;
        let handle = ctx.provider(args).await?;

        let populated = tx::populate(&handle, wallet.address(), &input).await?;
        Ok(Reply::new(
            json!({ "populatedTransaction": populated.summary() }),
            "Transaction populated successfully",
        ))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use serde_json::{json, Value};

    const RECIPIENT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn legacy_transfer() -> Value {
        json!({
            "to": RECIPIENT,
            "value": "1000000000000000000",
            "nonce": 3,
            "gasLimit": 21000,
            "gasPrice": "20000000000",
            "chainId": 1,
            "type": 0
        })
    }

    #[tokio::test]
    async fn test_populate_fully_specified() {
        let (ctx, _) = mocked_context(Some(ANVIL_KEY));
        let result = call(
            &ctx,
            "wallet_populate_transaction",
            json!({
                "transaction": {
                    "to": RECIPIENT,
                    "nonce": 0,
                    "gasLimit": "21000",
                    "chainId": 1,
                    "maxFeePerGas": "30000000000",
                    "maxPriorityFeePerGas": "1500000000"
                }
            }),
        )
        .await;

        assert_eq!(result.message(), "Transaction populated successfully");
        let populated = &structured(&result)["populatedTransaction"];
        assert_eq!(populated["type"], 2);
        assert_eq!(populated["from"], ANVIL_ADDRESS);
        assert_eq!(populated["to"], RECIPIENT);
        assert_eq!(populated["gasLimit"], "21000");
        assert_eq!(populated["gasPrice"], Value::Null);
        assert_eq!(populated["maxFeePerGas"], "30000000000");
        assert_eq!(populated["value"], "0");
    }

    #[tokio::test]
    async fn test_populate_fetches_missing_fields() {
        let (ctx, asserter) = mocked_context(Some(ANVIL_KEY));
        // gas price, nonce, estimate, chain id
        asserter.push_success(&"0x4a817c800");
        asserter.push_success(&"0x2");
        asserter.push_success(&"0x5208");
        asserter.push_success(&"0x1");

        let result = call(
            &ctx,
            "wallet_populate_transaction",
            json!({ "transaction": { "to": RECIPIENT, "type": 0 } }),
        )
        .await;

        assert!(!result.is_error(), "{}", result.message());
        let populated = &structured(&result)["populatedTransaction"];
        assert_eq!(populated["nonce"], 2);
        assert_eq!(populated["gasPrice"], "20000000000");
        assert_eq!(populated["chainId"], 1);
    }

    #[tokio::test]
    async fn test_sign_transaction() {
        let (ctx, _) = mocked_context(Some(ANVIL_KEY));
        let result = call(
            &ctx,
            "wallet_sign_transaction",
            json!({ "transaction": legacy_transfer() }),
        )
        .await;

        assert_eq!(result.message(), "Transaction signed successfully");
        let raw = structured(&result)["signedTransaction"].as_str().unwrap();
        assert!(raw.starts_with("0xf8") || raw.starts_with("0xf9"));
    }

    #[tokio::test]
    async fn test_send_transaction() {
        let (ctx, asserter) = mocked_context(Some(ANVIL_KEY));
        asserter.push_success(&format!("0x{}", "11".repeat(32)));

        let result = call(
            &ctx,
            "wallet_send_transaction",
            json!({ "transaction": legacy_transfer() }),
        )
        .await;

        assert_eq!(result.message(), "Transaction sent successfully");
        let sent = structured(&result);
        assert_eq!(sent["hash"].as_str().unwrap().len(), 66);
        assert_eq!(sent["nonce"], 3);
        assert_eq!(sent["gasLimit"], "21000");
        assert_eq!(sent["gasPrice"], "20000000000");
        assert_eq!(sent["value"], "1000000000000000000");
        assert_eq!(sent["from"], ANVIL_ADDRESS);
        assert_eq!(sent["to"], RECIPIENT);
        assert_eq!(sent["type"], 0);
    }

    #[tokio::test]
    async fn test_send_requires_transaction() {
        let (ctx, _) = mocked_context(Some(ANVIL_KEY));
        let result = call(&ctx, "wallet_send_transaction", json!({ "transaction": null })).await;
        assert_eq!(result.message(), "Transaction is required");
    }

    #[tokio::test]
    async fn test_invalid_transaction_shape() {
        let (ctx, _) = mocked_context(Some(ANVIL_KEY));
        let result = call(
            &ctx,
            "wallet_populate_transaction",
            json!({ "transaction": { "to": RECIPIENT, "value": "lots" } }),
        )
        .await;
        assert!(result
            .message()
            .starts_with("Failed to populate transaction: invalid transaction: "));
    }

    #[tokio::test]
    async fn test_conflicting_fee_fields() {
        let (ctx, _) = mocked_context(Some(ANVIL_KEY));
        let result = call(
            &ctx,
            "wallet_sign_transaction",
            json!({
                "transaction": {
                    "to": RECIPIENT,
                    "gasPrice": "1",
                    "maxFeePerGas": "2"
                }
            }),
        )
        .await;
        assert!(result.is_error());
        assert!(result.message().contains("eip-1559 transaction do not support gasPrice"));
    }
}
