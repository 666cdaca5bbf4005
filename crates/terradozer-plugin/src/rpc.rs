use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: String::new(),
        }
    }

    /// The text the retry classifier matches against — same string an
    /// operator would see in plugin logs.
    pub fn rendered(&self) -> String {
        if self.detail.is_empty() {
            self.summary.clone()
        } else {
            format!("{}: {}", self.summary, self.detail)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedResource {
    pub type_name: String,
    pub state: Value,
}

/// Typed capability set a running provider plugin exposes: Configure,
/// Import, Read, Destroy. `GrpcProviderRpc` is the real tonic client;
/// `FakeProviderRpc` is the in-memory stand-in every higher-level test uses
/// instead of spawning a subprocess.
#[async_trait]
pub trait ProviderRpc: Send + Sync {
    async fn configure(&self, config: Value) -> Result<(), Diagnostic>;

    async fn import(&self, type_name: &str, id: &str) -> Result<Vec<ImportedResource>, Diagnostic>;

    async fn read(&self, type_name: &str, current_state: &Value) -> Result<Option<Value>, Diagnostic>;

    /// `planned_state` is always `None` for terradozer's use — a destroy is
    /// always "apply toward a null planned state".
    async fn destroy(&self, type_name: &str, prior_state: &Value) -> Result<Option<Value>, Diagnostic>;
}
