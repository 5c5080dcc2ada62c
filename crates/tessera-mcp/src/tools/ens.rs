//! ENS lookups

use serde_json::json;
use tessera_core::Ens;

use super::{define, respond, schema, Reply, ToolContext, QUERY};
use crate::protocol::{Tool, ToolsCallResult};
use crate::validation::{validate_evm_address, Args};

pub fn definitions() -> Vec<Tool> {
    let name = json!({ "name": { "type": "string", "description": "The ENS name" } });

    vec![
        define(
            "provider_get_ens_resolver",
            "Get ENS Resolver",
            "Get the resolver for an ENS name",
            schema::object(schema::with(schema::provider(), name.clone()), &["name"]),
            QUERY,
        ),
        define(
            "provider_lookup_address",
            "Lookup ENS Name",
            "Lookup the ENS name for an address",
            schema::object(
                schema::with(
                    schema::provider(),
                    json!({ "address": { "type": "string", "description": "The address to lookup" } }),
                ),
                &["address"],
            ),
            QUERY,
        ),
        define(
            "provider_resolve_name",
            "Resolve ENS Name",
            "Resolve an ENS name to an address",
            schema::object(schema::with(schema::provider(), name), &["name"]),
            QUERY,
        ),
    ]
}

pub async fn get_resolver(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("get ENS resolver", async {
        let name = args.require_str("name", "ENS name is required")?;
        let handle = ctx.provider(args).await?;
        let resolver = Ens::connect(&handle).await?.resolver(name).await?;

        let message = if resolver.is_some() {
            "ENS resolver retrieved successfully"
        } else {
            "No resolver found for this ENS name"
        };
        let resolver = resolver.map(|r| {
            json!({ "address": r.address.to_checksum(None), "name": r.name })
        });

        Ok(Reply::new(json!({ "resolver": resolver }), message))
    })
    .await
}

pub async fn lookup_address(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("lookup ENS name", async {
        let address = validate_evm_address(args.require_str("address", "Address is required")?)?;
        let handle = ctx.provider(args).await?;
        let name = Ens::connect(&handle).await?.lookup_address(address).await?;

        let message = if name.is_some() {
            "ENS name retrieved successfully"
        } else {
            "No ENS name found for this address"
        };
        Ok(Reply::new(json!({ "name": name }), message))
    })
    .await
}

pub async fn resolve_name(ctx: &ToolContext, args: &Args) -> ToolsCallResult {
    respond("resolve ENS name", async {
        let name = args.require_str("name", "ENS name is required")?;
        let handle = ctx.provider(args).await?;
        let address = Ens::connect(&handle).await?.resolve_name(name).await?;

        let message = if address.is_some() {
            "ENS name resolved successfully"
        } else {
            "Could not resolve this ENS name"
        };
        Ok(Reply::new(
            json!({ "address": address.map(|a| a.to_checksum(None)) }),
            message,
        ))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use alloy::primitives::{address, Address, Bytes};
    use alloy::sol_types::SolValue;
    use serde_json::json;

    fn word(address: Address) -> Bytes {
        Bytes::from(address.abi_encode())
    }

    const RESOLVER: Address = address!("4976fb03C32e5B8cfe2b6cCB31c09Ba78EBaBa41");
    const VITALIK: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

    #[tokio::test]
    async fn test_resolve_name() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0x1");
        asserter.push_success(&word(RESOLVER));
        asserter.push_success(&word(VITALIK));

        let result = call(&ctx, "provider_resolve_name", json!({ "name": "vitalik.eth" })).await;
        assert_eq!(result.message(), "ENS name resolved successfully");
        assert_eq!(
            structured(&result),
            &json!({ "address": "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045" })
        );
    }

    #[tokio::test]
    async fn test_resolve_unregistered_name() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0x1");
        asserter.push_success(&word(Address::ZERO));

        let result = call(&ctx, "provider_resolve_name", json!({ "name": "nobody.eth" })).await;
        assert!(!result.is_error());
        assert_eq!(result.message(), "Could not resolve this ENS name");
        assert_eq!(structured(&result), &json!({ "address": null }));
    }

    #[tokio::test]
    async fn test_get_resolver() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0x1");
        asserter.push_success(&word(RESOLVER));

        let result = call(&ctx, "provider_get_ens_resolver", json!({ "name": "vitalik.eth" })).await;
        assert_eq!(result.message(), "ENS resolver retrieved successfully");
        assert_eq!(
            structured(&result),
            &json!({
                "resolver": {
                    "address": "0x4976fb03C32e5B8cfe2b6cCB31c09Ba78EBaBa41",
                    "name": "vitalik.eth"
                }
            })
        );
    }

    #[tokio::test]
    async fn test_get_resolver_missing() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0x1");
        asserter.push_success(&word(Address::ZERO));

        let result = call(&ctx, "provider_get_ens_resolver", json!({ "name": "nobody.eth" })).await;
        assert_eq!(result.message(), "No resolver found for this ENS name");
        assert_eq!(structured(&result), &json!({ "resolver": null }));
    }

    #[tokio::test]
    async fn test_lookup_address_without_reverse_record() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0x1");
        // <addr>.addr.reverse, addr.reverse, reverse
        for _ in 0..3 {
            asserter.push_success(&word(Address::ZERO));
        }

        let result = call(&ctx, "provider_lookup_address", json!({ "address": ANVIL_ADDRESS })).await;
        assert_eq!(result.message(), "No ENS name found for this address");
        assert_eq!(structured(&result), &json!({ "name": null }));
    }

    #[tokio::test]
    async fn test_unsupported_network() {
        let (ctx, asserter) = mocked_context(None);
        asserter.push_success(&"0x7a69");

        let result = call(&ctx, "provider_resolve_name", json!({ "name": "vitalik.eth" })).await;
        assert!(result.is_error());
        assert!(result
            .message()
            .starts_with("Failed to resolve ENS name: ENS error: network does not support ENS"));
    }

    #[tokio::test]
    async fn test_required_fields() {
        let (ctx, _) = mocked_context(None);
        let resolver = call(&ctx, "provider_get_ens_resolver", json!({})).await;
        assert_eq!(resolver.message(), "ENS name is required");

        let lookup = call(&ctx, "provider_lookup_address", json!({})).await;
        assert_eq!(lookup.message(), "Address is required");
    }
}
