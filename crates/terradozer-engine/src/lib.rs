pub mod destroy;
pub mod error;
pub mod instance;
pub mod refresh;

pub use destroy::DestroyOutcome;
pub use error::{PermanentDestroyError, RefreshError, RetryableDestroyError};
pub use instance::{Phase, ResourceInstance};
