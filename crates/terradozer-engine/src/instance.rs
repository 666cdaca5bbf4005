use std::sync::Arc;

use serde_json::Value;
use terradozer_domain::ResourceDescriptor;
use terradozer_plugin::ProviderAdapter;
use tracing::warn;

/// A small, comparable enum with a `Display` used only in log lines, never
/// parsed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Refreshed,
    GoneRemote,
    Destroyed,
    TransientFailure,
    PermanentFailure,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Created => "created",
            Phase::Refreshed => "refreshed",
            Phase::GoneRemote => "gone_remote",
            Phase::Destroyed => "destroyed",
            Phase::TransientFailure => "transient_failure",
            Phase::PermanentFailure => "permanent_failure",
        };
        write!(f, "{s}")
    }
}

/// Runtime view the Resource Engine owns per descriptor: a non-owning
/// reference to the adapter the Plugin Host constructed, plus the mutable
/// state machine described in spec §3/§4.4.
pub struct ResourceInstance {
    pub descriptor: ResourceDescriptor,
    pub adapter: Arc<ProviderAdapter>,
    pub current_state: Option<Value>,
    pub phase: Phase,
}

impl ResourceInstance {
    pub fn new(descriptor: ResourceDescriptor, adapter: Arc<ProviderAdapter>) -> Self {
        Self {
            descriptor,
            adapter,
            current_state: None,
            phase: Phase::Created,
        }
    }

    pub(crate) fn mark_refreshed(&mut self, state: Value) {
        self.current_state = Some(state);
        self.phase = Phase::Refreshed;
    }

    pub(crate) fn mark_gone_remote(&mut self) {
        self.current_state = None;
        self.phase = Phase::GoneRemote;
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.phase = Phase::Destroyed;
    }

    pub(crate) fn mark_transient_failure(&mut self) {
        self.phase = Phase::TransientFailure;
    }

    pub(crate) fn mark_permanent_failure(&mut self) {
        self.phase = Phase::PermanentFailure;
    }

    pub(crate) fn warn_import_ambiguity(&self, candidate_count: usize) {
        warn!(
            address = %self.descriptor.address,
            resource_type = %self.descriptor.resource_type,
            candidate_count,
            "import returned multiple descriptors; using the type-matched one"
        );
    }
}
