pub mod error;
pub mod loader;
mod parse_v3;
mod parse_v4;
mod provider;

pub use error::StateError;
pub use loader::load;

pub use terradozer_domain::{Catalog, ProviderKey, ResourceDescriptor, ResourceMode, StateFormat};

/// Deduplicated, first-seen-order provider keys referenced by a catalog's
/// managed resources. Thin re-export so callers don't need to reach into
/// `terradozer-domain` directly for the State Loader's public surface.
pub fn provider_keys(catalog: &Catalog) -> Vec<ProviderKey> {
    catalog.provider_keys()
}
