use std::collections::HashMap;

/// Base URL the plugin binary is downloaded from. Overridable in tests so
/// `install()` never makes a real network call during the test suite.
#[derive(Debug, Clone)]
pub struct BaseUrls {
    pub releases: String,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            releases: "https://releases.hashicorp.com".into(),
        }
    }
}

/// A provider's default configuration profile: which config keys exist and
/// which ambient environment variable (if any) supplies each one.
#[derive(Debug, Clone)]
pub struct DefaultProfile {
    pub pinned_version: &'static str,
    /// config key -> ambient env var name
    pub env_sources: &'static [(&'static str, &'static str)],
}

/// Built-in provider profiles. Only `aws` ships one; anything else is
/// silently skipped by `init_all`.
pub fn profile_for(provider: &str) -> Option<DefaultProfile> {
    match provider {
        "aws" => Some(DefaultProfile {
            pinned_version: "2.68.0",
            env_sources: &[
                ("profile", "AWS_PROFILE"),
                ("region", "AWS_DEFAULT_REGION"),
                ("access_key", "AWS_ACCESS_KEY_ID"),
                ("secret_key", "AWS_SECRET_ACCESS_KEY"),
                ("shared_credentials_file", "AWS_SHARED_CREDENTIALS_FILE"),
                ("token", "AWS_SESSION_TOKEN"),
            ],
        }),
        _ => None,
    }
}

/// Build the configuration object for a provider, reading each source's
/// ambient environment variable. Fields whose variable is unset are left out
/// entirely; the plugin treats an absent field as unset.
pub fn build_config_value(profile: &DefaultProfile) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (key, env_var) in profile.env_sources {
        if let Ok(value) = std::env::var(env_var) {
            map.insert((*key).to_string(), serde_json::Value::String(value));
        }
    }
    serde_json::Value::Object(map)
}

/// `<prefix>-provider-<name>_v<version>_x<protocol>` naming convention for
/// the installed binary.
pub fn binary_name(prefix: &str, name: &str, version: &str, protocol: u32) -> String {
    format!("{prefix}-provider-{name}_v{version}_x{protocol}")
}

pub fn env_snapshot(profile: &DefaultProfile) -> HashMap<&'static str, String> {
    profile
        .env_sources
        .iter()
        .filter_map(|(key, var)| std::env::var(var).ok().map(|v| (*key, v)))
        .collect()
}
