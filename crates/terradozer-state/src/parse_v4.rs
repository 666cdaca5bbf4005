use serde_json::Value;
use terradozer_domain::{ProviderKey, ResourceAddress, ResourceDescriptor, ResourceMode};

use crate::error::StateError;
use crate::provider;

/// Parse the `resources` array of a version-4 (or later) state document.
///
/// Each block carries an explicit `mode` and a schema-shaped `attributes`
/// object per instance; that whole object is preserved as `prior_attrs` so
/// the Provider Adapter can coerce force-destroy fields without a round trip
/// through the provider's schema RPC.
pub fn parse(path: &str, doc: &Value) -> Result<Vec<ResourceDescriptor>, StateError> {
    let resources = doc
        .get("resources")
        .and_then(Value::as_array)
        .ok_or_else(|| StateError::MalformedResource {
            path: path.to_string(),
            message: "missing \"resources\" array".to_string(),
        })?;

    let mut out = Vec::new();
    for block in resources {
        out.extend(parse_block(path, block)?);
    }
    Ok(out)
}

fn parse_block(path: &str, block: &Value) -> Result<Vec<ResourceDescriptor>, StateError> {
    let resource_type = block
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| StateError::MalformedResource {
            path: path.to_string(),
            message: "resource block missing \"type\"".to_string(),
        })?
        .to_string();

    let name = block
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let module = block
        .get("module")
        .and_then(Value::as_str)
        .unwrap_or("root")
        .to_string();

    let mode = match block.get("mode").and_then(Value::as_str) {
        Some("data") => ResourceMode::Data,
        _ => ResourceMode::Managed,
    };

    let provider_raw = block.get("provider").and_then(Value::as_str).unwrap_or_default();
    let provider_key = ProviderKey::new(provider::normalize(provider_raw));

    let instances = block
        .get("instances")
        .and_then(Value::as_array)
        .ok_or_else(|| StateError::MalformedResource {
            path: path.to_string(),
            message: format!("resource {module}.{resource_type}.{name} missing \"instances\""),
        })?;

    let mut out = Vec::with_capacity(instances.len());
    for instance in instances {
        let attributes = instance.get("attributes").cloned();
        let id = attributes
            .as_ref()
            .and_then(|a| a.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let instance_key = instance
            .get("index_key")
            .map(|k| match k {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();

        out.push(ResourceDescriptor {
            resource_type: resource_type.clone(),
            id,
            provider_key: provider_key.clone(),
            mode,
            prior_attrs: attributes,
            address: ResourceAddress {
                module: module.clone(),
                resource: name.clone(),
                instance_key,
            },
        });
    }

    Ok(out)
}
