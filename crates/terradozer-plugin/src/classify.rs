use serde_json::Value;

/// Generic transport-level failures: timeouts, dropped connections, generic
/// request errors.
pub const RETRYABLE_TRANSPORT: &[&str] = &[
    "request timeout",
    "requesttimeout",
    "response timeout",
    "connection reset",
    "request error",
    "transport error",
    "context deadline exceeded",
];

/// Service-specific rate limiting.
pub const THROTTLING: &[&str] = &[
    "throttling",
    "throttled",
    "too many requests",
    "provisioning throughput exceeded",
    "prior request not complete",
    "transaction in progress",
    "rate exceeded",
];

/// Expired credentials or session tokens.
pub const CREDENTIALS_EXPIRED: &[&str] = &[
    "expired session",
    "expired token",
    "expiredtoken",
    "token has expired",
    "request expired",
    "credentials have expired",
];

/// Whether a diagnostic's rendered message classifies as retryable, by
/// substring match against the three known sets.
pub fn is_retryable(message: &str) -> bool {
    let lower = message.to_lowercase();
    RETRYABLE_TRANSPORT
        .iter()
        .chain(THROTTLING)
        .chain(CREDENTIALS_EXPIRED)
        .any(|needle| lower.contains(needle))
}

/// Flip any top-level boolean field named `force_destroy` or
/// `force_detach_policies` to `true`. Every other field, including nested
/// objects, is left untouched. `Value::Null` and non-object values pass
/// through unchanged.
pub fn coerce_force_destroy(state: &Value) -> Value {
    let Value::Object(map) = state else {
        return state.clone();
    };

    let mut coerced = map.clone();
    for key in ["force_destroy", "force_detach_policies"] {
        if let Some(Value::Bool(_)) = coerced.get(key) {
            coerced.insert(key.to_string(), Value::Bool(true));
        }
    }
    Value::Object(coerced)
}
