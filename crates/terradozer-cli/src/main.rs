mod cli;
mod confirm;
mod report;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use terradozer_engine::ResourceInstance;
use terradozer_plugin::PluginHost;
use terradozer_scheduler::SchedulerConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // clap's default conflicts_with error exits with code 2; the CLI
    // contract wants exit 1 for every fatal condition, so parse errors are
    // reported the same way as any other fatal error instead of letting
    // clap terminate the process itself.
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayVersion => {
            print!("{e}");
            std::process::exit(0);
        }
        Err(e) => {
            e.print().ok();
            anyhow::bail!("invalid arguments");
        }
    };

    init_tracing(args.debug);

    let catalog = terradozer_state::load(&args.state_path)
        .with_context(|| format!("loading state file {}", args.state_path.display()))?;

    let provider_keys = terradozer_state::provider_keys(&catalog);
    info!(resources = catalog.len(), providers = provider_keys.len(), "catalog loaded");

    let host = PluginHost::new(PluginHost::default_install_dir());
    let adapters = host
        .init_all(&provider_keys)
        .await
        .context("initializing provider plugins")?;

    let mut instances = Vec::new();
    for descriptor in catalog.managed() {
        match adapters.get(&descriptor.provider_key) {
            Some((_, adapter)) => instances.push(ResourceInstance::new(descriptor.clone(), Arc::clone(adapter))),
            None => warn!(
                address = %descriptor.address,
                provider = %descriptor.provider_key,
                "no initialized adapter for this provider, skipping resource"
            ),
        }
    }

    if instances.is_empty() {
        println!("nothing to delete");
        return Ok(());
    }

    if !args.dry_run && !args.force {
        let confirmed = confirm::confirm_destroy(instances.len())?;
        if !confirmed {
            anyhow::bail!("aborted: confirmation not given");
        }
    }

    let config = SchedulerConfig {
        parallel: args.parallel,
        per_resource_timeout: std::time::Duration::from_secs(args.timeout),
        dry_run: args.dry_run,
    };

    let summary = terradozer_scheduler::run_until_fixed_point(instances, &config).await;
    println!("{}", report::render(&summary, args.dry_run));

    Ok(())
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive("terradozer_plugin=debug".parse().unwrap())
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
