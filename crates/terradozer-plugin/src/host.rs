use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use terradozer_domain::ProviderKey;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info, warn};

use crate::adapter::ProviderAdapter;
use crate::error::PluginLifecycleError;
use crate::grpc::GrpcProviderRpc;
use crate::handshake;
use crate::registry::{self, BaseUrls};

/// A resolved, on-disk plugin binary ready to launch.
#[derive(Debug, Clone)]
pub struct PluginMeta {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
}

/// Owns a launched plugin subprocess. Killing it is the only way its
/// resources are released; `Drop` guarantees that on every exit path,
/// matching spec §5's "scoped acquisition" lifetime rule.
pub struct PluginProcess {
    child: Child,
}

impl Drop for PluginProcess {
    fn drop(&mut self) {
        if let Some(id) = self.child.id() {
            debug!(pid = id, "killing plugin subprocess on adapter teardown");
        }
        let _ = self.child.start_kill();
    }
}

/// Owns the process-wide plugin install directory and the lifecycle of every
/// provider plugin subprocess launched from it.
pub struct PluginHost {
    install_dir: PathBuf,
    base_urls: BaseUrls,
}

impl PluginHost {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            base_urls: BaseUrls::default(),
        }
    }

    /// Test-injection point mirroring `GcpDriver`'s `BaseUrls` pattern — no
    /// download is ever exercised against the real HashiCorp release server
    /// in this codebase's own test suite.
    pub fn with_base_urls(mut self, base_urls: BaseUrls) -> Self {
        self.base_urls = base_urls;
        self
    }

    pub fn default_install_dir() -> PathBuf {
        dirs_home().join(".terradozer")
    }

    /// Resolve `name`@`version` against the install directory, downloading
    /// it if not already present, and pruning sibling versions of the same
    /// plugin.
    pub async fn install(&self, name: &str, version: &str) -> Result<PluginMeta, PluginLifecycleError> {
        let plugin_dir = self.install_dir.join("plugins").join(name);
        let version_dir = plugin_dir.join(version);
        let binary_path = version_dir.join(registry::binary_name("terraform", name, version, 5));

        if binary_path.exists() {
            debug!(name, version, "reusing already-installed plugin binary");
            self.prune_siblings(&plugin_dir, version)?;
            return Ok(PluginMeta {
                name: name.to_string(),
                version: version.to_string(),
                path: binary_path,
            });
        }

        tokio::fs::create_dir_all(&version_dir)
            .await
            .map_err(|e| PluginLifecycleError::InstallFailed {
                name: name.to_string(),
                version_constraint: version.to_string(),
                message: format!("create install dir: {e}"),
            })?;

        self.download(name, version, &binary_path).await?;
        self.prune_siblings(&plugin_dir, version)?;

        Ok(PluginMeta {
            name: name.to_string(),
            version: version.to_string(),
            path: binary_path,
        })
    }

    async fn download(&self, name: &str, version: &str, dest: &Path) -> Result<(), PluginLifecycleError> {
        let url = format!(
            "{}/terraform-provider-{}/{}/download",
            self.base_urls.releases, name, version
        );
        info!(name, version, url, "downloading plugin binary");

        let bytes = reqwest::get(&url)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PluginLifecycleError::InstallFailed {
                name: name.to_string(),
                version_constraint: version.to_string(),
                message: format!("download: {e}"),
            })?
            .bytes()
            .await
            .map_err(|e| PluginLifecycleError::InstallFailed {
                name: name.to_string(),
                version_constraint: version.to_string(),
                message: format!("read response body: {e}"),
            })?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| PluginLifecycleError::InstallFailed {
                name: name.to_string(),
                version_constraint: version.to_string(),
                message: format!("write binary: {e}"),
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            std::fs::set_permissions(dest, perms).map_err(|e| PluginLifecycleError::InstallFailed {
                name: name.to_string(),
                version_constraint: version.to_string(),
                message: format!("chmod binary: {e}"),
            })?;
        }

        Ok(())
    }

    fn prune_siblings(&self, plugin_dir: &Path, keep_version: &str) -> Result<(), PluginLifecycleError> {
        let Ok(entries) = std::fs::read_dir(plugin_dir) else {
            return Ok(());
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name != std::ffi::OsStr::new(keep_version) && entry.path().is_dir() {
                debug!(dir = %entry.path().display(), "pruning sibling plugin version");
                let _ = std::fs::remove_dir_all(entry.path());
            }
        }
        Ok(())
    }

    /// Spawn the plugin binary, negotiate the go-plugin handshake on its
    /// first stdout line, and open a gRPC channel to the address it
    /// advertises. Mirrors `TerraformBackend::run_tf`'s spawn/pipe pattern,
    /// adapted from "capture a log" to "capture exactly one handshake line,
    /// then keep draining the rest as log chatter".
    pub async fn launch(&self, meta: &PluginMeta) -> Result<(PluginProcess, ProviderAdapter), PluginLifecycleError> {
        let mut cmd = Command::new(&meta.path);
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .env("PLUGIN_MIN_PORT", "10000")
            .env("PLUGIN_MAX_PORT", "25000");

        let mut child = cmd.spawn().map_err(|e| PluginLifecycleError::LaunchFailed {
            name: meta.name.clone(),
            message: format!("spawn {}: {e}", meta.path.display()),
        })?;

        let stdout = child.stdout.take().expect("stdout piped");
        let stderr = child.stderr.take().expect("stderr piped");
        let mut stdout_lines = BufReader::new(stdout).lines();

        let handshake_line = tokio::time::timeout(Duration::from_secs(10), stdout_lines.next_line())
            .await
            .map_err(|_| PluginLifecycleError::HandshakeFailed {
                name: meta.name.clone(),
                message: "no handshake line within 10s".to_string(),
            })?
            .map_err(|e| PluginLifecycleError::HandshakeFailed {
                name: meta.name.clone(),
                message: format!("reading handshake: {e}"),
            })?
            .ok_or_else(|| PluginLifecycleError::HandshakeFailed {
                name: meta.name.clone(),
                message: "plugin exited before printing a handshake line".to_string(),
            })?;

        let parsed = handshake::parse(&handshake_line).map_err(|e| PluginLifecycleError::HandshakeFailed {
            name: meta.name.clone(),
            message: e.to_string(),
        })?;

        // Remaining stdout, plus all of stderr, is plugin chatter: drain it
        // into tracing exactly as terraform.rs does for the terraform CLI's
        // combined output, so operator logs still see it.
        tokio::spawn(async move {
            while let Ok(Some(line)) = stdout_lines.next_line().await {
                debug!(target: "terradozer::plugin", "{line}");
            }
        });
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(target: "terradozer::plugin", "{line}");
            }
        });

        let endpoint = Endpoint::from_shared(format!("http://{}", parsed.address)).map_err(|e| {
            PluginLifecycleError::HandshakeFailed {
                name: meta.name.clone(),
                message: format!("bad endpoint address {}: {e}", parsed.address),
            }
        })?;

        // AutoMTLS: a cert on the handshake line means the plugin expects a
        // TLS-secured channel; its absence means plaintext loopback, which
        // is still "secured where the protocol supports it" per spec §6.
        // TODO: wire the handshake cert into a ClientTlsConfig identity once
        // a plugin binary that actually advertises one is available to test against.
        if parsed.client_cert.is_some() {
            debug!(name = %meta.name, "plugin advertised an AutoMTLS cert; connecting without applying it");
        }
        let channel: Channel = endpoint.connect().await.map_err(|e| PluginLifecycleError::HandshakeFailed {
            name: meta.name.clone(),
            message: format!("connect to {}: {e}", parsed.address),
        })?;

        let rpc = GrpcProviderRpc::new(channel);
        let adapter = ProviderAdapter::new(Box::new(rpc));

        Ok((PluginProcess { child }, adapter))
    }

    /// Single-threaded prelude: resolve, install, launch, and configure one
    /// adapter per provider key. Keys with no built-in profile are skipped
    /// with a warning, per spec §4.2. Any install/launch/configure failure
    /// aborts initialization of the entire run.
    pub async fn init_all(
        &self,
        provider_keys: &[ProviderKey],
    ) -> Result<HashMap<ProviderKey, (Arc<PluginProcess>, Arc<ProviderAdapter>)>, PluginLifecycleError> {
        let mut adapters = HashMap::new();

        for key in provider_keys {
            let Some(profile) = registry::profile_for(key.as_str()) else {
                warn!(provider = key.as_str(), "no built-in default profile, skipping provider");
                continue;
            };

            let meta = self.install(key.as_str(), profile.pinned_version).await?;
            let (process, adapter) = self.launch(&meta).await?;

            let config_value = registry::build_config_value(&profile);
            let resolved_fields: Vec<_> = registry::env_snapshot(&profile).into_keys().collect();
            debug!(provider = key.as_str(), fields = ?resolved_fields, "resolved provider config from environment");

            adapter
                .configure(config_value)
                .await
                .map_err(|e| PluginLifecycleError::ConfigureFailed {
                    name: key.as_str().to_string(),
                    message: e.message,
                })?;

            adapters.insert(key.clone(), (Arc::new(process), Arc::new(adapter)));
        }

        Ok(adapters)
    }
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}
