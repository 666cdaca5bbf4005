use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginLifecycleError {
    #[error("failed to install plugin {name} {version_constraint}: {message}")]
    InstallFailed {
        name: String,
        version_constraint: String,
        message: String,
    },

    #[error("failed to launch plugin {name}: {message}")]
    LaunchFailed { name: String, message: String },

    #[error("handshake with plugin {name} failed: {message}")]
    HandshakeFailed { name: String, message: String },

    #[error("failed to configure plugin {name}: {message}")]
    ConfigureFailed { name: String, message: String },
}

/// A retryable failure whose retry budget expired before a call succeeded.
#[derive(Debug, Error)]
#[error("{op} timed out after retry budget of {budget:?}: {cause}")]
pub struct OperationTimedOut {
    pub op: &'static str,
    pub budget: std::time::Duration,
    pub cause: String,
}
