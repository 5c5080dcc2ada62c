//! Tessera MCP resources
//!
//! Read-only context: the provider currently in use and the table of
//! networks the server knows by name.

use serde_json::{json, Value};
use tessera_core::network::{self, KnownNetwork, KNOWN_NETWORKS};

use crate::protocol::{Resource, ResourceContent, ResourceTemplate, ResourcesReadResult};
use crate::tools::ToolContext;

pub const URI_SCHEME: &str = "tessera://";

const PROVIDER_URI: &str = "tessera://provider";
const NETWORKS_URI: &str = "tessera://networks";
const NETWORK_PREFIX: &str = "tessera://networks/";

pub fn get_all_resources() -> Vec<Resource> {
    vec![
        Resource {
            uri: PROVIDER_URI.to_string(),
            name: "Provider".to_string(),
            title: Some("Current Provider".to_string()),
            description: Some(
                "The JSON-RPC endpoint used by tools that do not pass their own provider"
                    .to_string(),
            ),
            mime_type: Some("application/json".to_string()),
        },
        Resource {
            uri: NETWORKS_URI.to_string(),
            name: "Networks".to_string(),
            title: Some("Known Networks".to_string()),
            description: Some("Chain IDs with their network names and ENS registries".to_string()),
            mime_type: Some("application/json".to_string()),
        },
    ]
}

pub fn get_all_templates() -> Vec<ResourceTemplate> {
    vec![ResourceTemplate {
        uri_template: "tessera://networks/{chain_id}".to_string(),
        name: "Network".to_string(),
        title: Some("Network by Chain ID".to_string()),
        description: Some("Name and ENS registry for a single chain ID".to_string()),
        mime_type: Some("application/json".to_string()),
    }]
}

fn describe(known: &KnownNetwork) -> Value {
    json!({
        "chainId": known.chain_id,
        "name": known.name,
        "ensAddress": known.ens_registry.map(|a| a.to_checksum(None)),
    })
}

fn single(uri: &str, value: Value) -> ResourcesReadResult {
    ResourcesReadResult {
        contents: vec![ResourceContent::json(uri, &value)],
    }
}

/// Read a resource by URI
pub async fn read_resource(ctx: &ToolContext, uri: &str) -> Result<ResourcesReadResult, String> {
    match uri {
        PROVIDER_URI => {
            let status = ctx.providers.status().await;
            Ok(single(uri, json!(status)))
        }
        NETWORKS_URI => {
            let networks: Vec<Value> = KNOWN_NETWORKS.iter().map(describe).collect();
            Ok(single(uri, json!({ "networks": networks })))
        }
        _ => match uri.strip_prefix(NETWORK_PREFIX) {
            Some(chain_id) => {
                let chain_id: u64 = chain_id
                    .parse()
                    .map_err(|_| format!("Invalid chain ID: {}", chain_id))?;
                let known = network::lookup(chain_id)
                    .ok_or_else(|| format!("Unknown network: {}", chain_id))?;
                Ok(single(uri, describe(known)))
            }
            None => Err(format!("Unknown resource: {}", uri)),
        },
    }
}
