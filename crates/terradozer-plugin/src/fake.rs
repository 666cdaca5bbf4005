use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::rpc::{Diagnostic, ImportedResource, ProviderRpc};

/// Scripted responses for one operation: consumed front-to-back, the last
/// entry repeats once exhausted so a test doesn't need to script every call
/// when the tail is uniform (e.g. "always fails the same way").
struct Script<T> {
    queued: Vec<Result<T, Diagnostic>>,
}

impl<T: Clone> Script<T> {
    fn new(queued: Vec<Result<T, Diagnostic>>) -> Self {
        Self { queued }
    }

    fn next(&self, call_index: usize) -> Result<T, Diagnostic> {
        let idx = call_index.min(self.queued.len().saturating_sub(1));
        self.queued[idx].clone()
    }
}

/// In-memory stand-in for a provider plugin, used by every test above the
/// subprocess boundary: one trait, one real implementation, one scripted
/// double.
pub struct FakeProviderRpc {
    configure_result: Script<()>,
    import_result: Script<Vec<ImportedResource>>,
    read_result: Script<Option<Value>>,
    destroy_result: Script<Option<Value>>,
    call_counts: Mutex<[usize; 4]>,
}

const CONFIGURE: usize = 0;
const IMPORT: usize = 1;
const READ: usize = 2;
const DESTROY: usize = 3;

impl FakeProviderRpc {
    pub fn builder() -> FakeProviderRpcBuilder {
        FakeProviderRpcBuilder::default()
    }

    pub fn calls(&self, op: &str) -> usize {
        let idx = match op {
            "configure" => CONFIGURE,
            "import" => IMPORT,
            "read" => READ,
            "destroy" => DESTROY,
            _ => panic!("unknown op {op}"),
        };
        self.call_counts.lock().unwrap()[idx]
    }

    fn bump(&self, idx: usize) -> usize {
        let mut counts = self.call_counts.lock().unwrap();
        let n = counts[idx];
        counts[idx] += 1;
        n
    }
}

#[async_trait]
impl ProviderRpc for FakeProviderRpc {
    async fn configure(&self, _config: Value) -> Result<(), Diagnostic> {
        let call = self.bump(CONFIGURE);
        self.configure_result.next(call)
    }

    async fn import(&self, _type_name: &str, _id: &str) -> Result<Vec<ImportedResource>, Diagnostic> {
        let call = self.bump(IMPORT);
        self.import_result.next(call)
    }

    async fn read(&self, _type_name: &str, _current_state: &Value) -> Result<Option<Value>, Diagnostic> {
        let call = self.bump(READ);
        self.read_result.next(call)
    }

    async fn destroy(&self, _type_name: &str, _prior_state: &Value) -> Result<Option<Value>, Diagnostic> {
        let call = self.bump(DESTROY);
        self.destroy_result.next(call)
    }
}

#[derive(Default)]
pub struct FakeProviderRpcBuilder {
    configure: Vec<Result<(), Diagnostic>>,
    import: Vec<Result<Vec<ImportedResource>, Diagnostic>>,
    read: Vec<Result<Option<Value>, Diagnostic>>,
    destroy: Vec<Result<Option<Value>, Diagnostic>>,
}

impl FakeProviderRpcBuilder {
    pub fn configure(mut self, result: Result<(), Diagnostic>) -> Self {
        self.configure.push(result);
        self
    }

    pub fn import(mut self, result: Result<Vec<ImportedResource>, Diagnostic>) -> Self {
        self.import.push(result);
        self
    }

    pub fn read(mut self, result: Result<Option<Value>, Diagnostic>) -> Self {
        self.read.push(result);
        self
    }

    pub fn destroy(mut self, result: Result<Option<Value>, Diagnostic>) -> Self {
        self.destroy.push(result);
        self
    }

    pub fn build(self) -> FakeProviderRpc {
        FakeProviderRpc {
            configure_result: Script::new(if self.configure.is_empty() {
                vec![Ok(())]
            } else {
                self.configure
            }),
            import_result: Script::new(if self.import.is_empty() {
                vec![Ok(Vec::new())]
            } else {
                self.import
            }),
            read_result: Script::new(if self.read.is_empty() {
                vec![Ok(None)]
            } else {
                self.read
            }),
            destroy_result: Script::new(if self.destroy.is_empty() {
                vec![Ok(None)]
            } else {
                self.destroy
            }),
            call_counts: Mutex::new([0; 4]),
        }
    }
}
