use std::path::Path;

use serde_json::Value;
use terradozer_domain::{Catalog, StateFormat};
use tracing::debug;

use crate::error::StateError;
use crate::{parse_v3, parse_v4};

/// Load and parse a state file into a [`Catalog`].
///
/// Dispatches on the document's top-level `version` field; everything past
/// that is dialect-specific and handled by [`parse_v3`] or [`parse_v4`].
pub fn load(path: &Path) -> Result<Catalog, StateError> {
    let display_path = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|e| StateError::Io {
        path: display_path.clone(),
        source: e,
    })?;

    let doc: Value = serde_json::from_str(&content).map_err(|e| StateError::JsonParse {
        path: display_path.clone(),
        source: e,
    })?;

    let version = doc
        .get("version")
        .and_then(Value::as_i64)
        .ok_or_else(|| StateError::MissingVersion {
            path: display_path.clone(),
        })?;

    debug!(path = %display_path, version, "loaded state document");

    let (format, resources) = match version {
        3 => (StateFormat::V3, parse_v3::parse(&display_path, &doc)?),
        4 => (StateFormat::V4, parse_v4::parse(&display_path, &doc)?),
        other => {
            return Err(StateError::UnsupportedVersion {
                path: display_path,
                version: other,
            })
        }
    };

    let catalog = Catalog::new(format, resources);
    debug!(count = catalog.len(), "catalog built");
    Ok(catalog)
}
