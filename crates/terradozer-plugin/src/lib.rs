pub mod adapter;
pub mod classify;
pub mod error;
pub mod fake;
pub mod grpc;
pub mod handshake;
pub mod host;
pub mod registry;
pub mod rpc;

pub use adapter::{ClassifiedError, ProviderAdapter};
pub use error::{OperationTimedOut, PluginLifecycleError};
pub use fake::FakeProviderRpc;
pub use grpc::GrpcProviderRpc;
pub use host::{PluginHost, PluginMeta, PluginProcess};
pub use rpc::{Diagnostic, ImportedResource, ProviderRpc, Severity};
