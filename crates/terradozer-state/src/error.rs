use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed json in {path}: {source}")]
    JsonParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} has no top-level \"version\" field")]
    MissingVersion { path: String },

    #[error("{path} declares unsupported state version {version} (supported: 3, 4)")]
    UnsupportedVersion { path: String, version: i64 },

    #[error("resource entry malformed in {path}: {message}")]
    MalformedResource { path: String, message: String },
}
