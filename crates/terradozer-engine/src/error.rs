use terradozer_domain::ResourceAddress;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("refresh failed for {address}: {message}")]
pub struct RefreshError {
    pub address: ResourceAddress,
    pub message: String,
}

#[derive(Debug, Error)]
#[error("destroy of {address} failed (retryable): {cause}")]
pub struct RetryableDestroyError {
    pub address: ResourceAddress,
    pub cause: String,
    /// True when the cause is specifically an exhausted retry budget
    /// (`OperationTimedOut`) rather than a first-attempt classification.
    pub timed_out: bool,
}

#[derive(Debug, Error)]
#[error("destroy of {address} failed (permanent): {cause}")]
pub struct PermanentDestroyError {
    pub address: ResourceAddress,
    pub cause: String,
}
