pub mod types;

pub use types::{Catalog, ProviderKey, ResourceAddress, ResourceDescriptor, ResourceMode, StateFormat};
