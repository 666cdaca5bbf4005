use serde_json::Value;
use terradozer_domain::{ProviderKey, ResourceAddress, ResourceDescriptor, ResourceMode};

use crate::error::StateError;
use crate::provider;

/// Parse the `modules` array of a version-3 state document.
///
/// v3 addresses a resource as `<type>.<name>` (or `data.<type>.<name>` for a
/// data source), optionally suffixed with `.<index>` when the resource was
/// created via `count`. Attributes live under `primary.attributes` as a flat
/// `string -> string` map; there is no schema-shaped tree to preserve, so
/// `prior_attrs` is always `None` for this dialect.
pub fn parse(path: &str, doc: &Value) -> Result<Vec<ResourceDescriptor>, StateError> {
    let modules = doc
        .get("modules")
        .and_then(Value::as_array)
        .ok_or_else(|| StateError::MalformedResource {
            path: path.to_string(),
            message: "missing \"modules\" array".to_string(),
        })?;

    let mut out = Vec::new();
    for module in modules {
        let module_path = module_address(module);
        let resources = module
            .get("resources")
            .and_then(Value::as_object)
            .ok_or_else(|| StateError::MalformedResource {
                path: path.to_string(),
                message: format!("module {module_path} missing \"resources\" object"),
            })?;

        for (key, entry) in resources {
            out.push(parse_entry(path, &module_path, key, entry)?);
        }
    }
    Ok(out)
}

fn module_address(module: &Value) -> String {
    module
        .get("path")
        .and_then(Value::as_array)
        .map(|segs| {
            segs.iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(".")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "root".to_string())
}

fn parse_entry(
    path: &str,
    module_path: &str,
    key: &str,
    entry: &Value,
) -> Result<ResourceDescriptor, StateError> {
    let (mode, address_key) = if let Some(rest) = key.strip_prefix("data.") {
        (ResourceMode::Data, rest)
    } else {
        (ResourceMode::Managed, key)
    };

    let mut parts = address_key.splitn(3, '.');
    let resource_type = parts.next().unwrap_or_default().to_string();
    let name = parts.next().unwrap_or_default().to_string();
    let instance_key = parts.next().unwrap_or_default().to_string();

    let id = entry
        .get("primary")
        .and_then(|p| p.get("id"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let provider_raw = entry
        .get("provider")
        .and_then(Value::as_str)
        .unwrap_or("provider.");
    let provider_key = ProviderKey::new(provider::normalize(provider_raw));

    Ok(ResourceDescriptor {
        resource_type,
        id,
        provider_key,
        mode,
        prior_attrs: None,
        address: ResourceAddress {
            module: module_path.to_string(),
            resource: name,
            instance_key,
        },
    })
}
