use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Normalized provider address, e.g. `aws` or `registry.terraform.io/hashicorp/aws`
/// reduced to its short name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderKey(pub String);

impl ProviderKey {
    pub fn new(s: impl Into<String>) -> Self {
        ProviderKey(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Enums ─────────────────────────────────────────────────────────────────────

/// Whether a resource is actually destroyable.
///
/// Only `Managed` resources are ever surfaced to the scheduler; `Data`
/// resources are filtered out at enumeration time (state §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    Managed,
    Data,
}

impl std::fmt::Display for ResourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceMode::Managed => write!(f, "managed"),
            ResourceMode::Data => write!(f, "data"),
        }
    }
}

/// Which on-disk dialect a [`Catalog`] was materialized from. Carried purely
/// for diagnostics; it has no bearing on scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateFormat {
    V3,
    V4,
}

impl std::fmt::Display for StateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateFormat::V3 => write!(f, "v3"),
            StateFormat::V4 => write!(f, "v4"),
        }
    }
}

// ── Resource Descriptor ────────────────────────────────────────────────────────

/// Immutable record identifying one destroyable unit.
///
/// `id` may be empty for a malformed or partially-written state entry; it is
/// retained rather than dropped so the Resource Engine can decide (via its
/// id-only refresh strategy) whether the resource is reachable at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub resource_type: String,
    pub id: String,
    pub provider_key: ProviderKey,
    pub mode: ResourceMode,
    /// Present whenever the state dialect preserved a schema-shaped attribute
    /// tree for this instance (always for v4 with a known schema; never for v3).
    pub prior_attrs: Option<Value>,
    /// `(moduleAddress, resourceAddress, instanceKey)` — the sort key that
    /// gives catalog enumeration its deterministic order.
    pub address: ResourceAddress,
}

/// The tuple a [`Catalog`] is sorted by, so repeated runs over the same state
/// file enumerate resources in the same order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceAddress {
    pub module: String,
    pub resource: String,
    pub instance_key: String,
}

impl std::fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.instance_key.is_empty() {
            write!(f, "{}.{}", self.module, self.resource)
        } else {
            write!(f, "{}.{}[{}]", self.module, self.resource, self.instance_key)
        }
    }
}

// ── Catalog ────────────────────────────────────────────────────────────────────

/// Deterministic ordered sequence of [`ResourceDescriptor`]s extracted from a
/// state file. Produced by the State Loader, consumed by the Scheduler, never
/// mutated thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub format: StateFormat,
    resources: Vec<ResourceDescriptor>,
}

impl Catalog {
    /// Build a catalog, sorting resources by `(module, resource, instance_key)`
    /// so enumeration is reproducible regardless of on-disk ordering.
    pub fn new(format: StateFormat, mut resources: Vec<ResourceDescriptor>) -> Self {
        resources.sort_by(|a, b| a.address.cmp(&b.address));
        Self { format, resources }
    }

    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Only the `managed` descriptors with a resolvable provider key are ever
    /// destroyable; callers (the Plugin Host, then the Scheduler) filter on
    /// this directly rather than re-deriving it.
    pub fn managed(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.iter().filter(|d| d.mode == ResourceMode::Managed)
    }

    /// Deduplicated, first-seen-order sequence of provider keys referenced by
    /// this catalog's managed resources.
    pub fn provider_keys(&self) -> Vec<ProviderKey> {
        let mut seen = std::collections::HashSet::new();
        let mut keys = Vec::new();
        for d in self.managed() {
            if seen.insert(d.provider_key.clone()) {
                keys.push(d.provider_key.clone());
            }
        }
        keys
    }
}
