use std::sync::Arc;

use terradozer_engine::{destroy, refresh, DestroyOutcome, Phase, ResourceInstance};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::summary::DestructionSummary;

enum WorkerOutcome {
    Deleted,
    Gone,
    WouldDelete,
    RefreshDropped,
    Retry,
    PermanentFailure,
}

async fn run_one(instance: &mut ResourceInstance, dry_run: bool, timeout: std::time::Duration) -> WorkerOutcome {
    if let Err(e) = refresh::refresh(instance).await {
        warn!(address = %e.address, message = %e.message, "refresh failed, dropping resource from this run");
        return WorkerOutcome::RefreshDropped;
    }

    match instance.phase {
        Phase::GoneRemote => return WorkerOutcome::Gone,
        Phase::Refreshed => {}
        other => unreachable!("refresh() left instance in unexpected phase {other}"),
    }

    if dry_run {
        return WorkerOutcome::WouldDelete;
    }

    match destroy::destroy(instance, timeout).await {
        DestroyOutcome::Deleted => WorkerOutcome::Deleted,
        DestroyOutcome::Gone => WorkerOutcome::Gone,
        DestroyOutcome::Retry(e) => {
            warn!(address = %e.address, cause = %e.cause, timed_out = e.timed_out, "destroy failed, will retry next round");
            WorkerOutcome::Retry
        }
        DestroyOutcome::Fail(e) => {
            warn!(address = %e.address, cause = %e.cause, "destroy failed permanently");
            WorkerOutcome::PermanentFailure
        }
    }
}

/// Bounded worker pool consuming a channel sized to the input list: `N`
/// spawned tasks drain a shared channel, then are joined. Returns the
/// instances that classified retryable this round alongside the round's
/// tallies.
async fn run_one_round(
    instances: Vec<ResourceInstance>,
    config: &SchedulerConfig,
) -> (DestructionSummary, Vec<ResourceInstance>) {
    let input_len = instances.len();
    let (job_tx, job_rx) = mpsc::channel(input_len.max(1));
    let job_rx = Arc::new(Mutex::new(job_rx));

    for instance in instances {
        job_tx.send(instance).await.ok();
    }
    drop(job_tx);

    let (res_tx, mut res_rx) = mpsc::channel(input_len.max(1));
    let worker_count = config.parallel.max(1).min(input_len.max(1));
    let mut workers = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let job_rx = job_rx.clone();
        let res_tx = res_tx.clone();
        let dry_run = config.dry_run;
        let timeout = config.per_resource_timeout;

        workers.push(tokio::spawn(async move {
            loop {
                let next = { job_rx.lock().await.recv().await };
                let Some(mut instance) = next else { break };
                let outcome = run_one(&mut instance, dry_run, timeout).await;
                if res_tx.send((instance, outcome)).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(res_tx);

    let mut summary = DestructionSummary::default();
    let mut retry_set = Vec::new();

    for _ in 0..input_len {
        let Some((instance, outcome)) = res_rx.recv().await else {
            break;
        };
        match outcome {
            WorkerOutcome::Deleted => summary.deleted += 1,
            WorkerOutcome::Gone => summary.gone_remote += 1,
            WorkerOutcome::WouldDelete => summary.would_delete += 1,
            WorkerOutcome::RefreshDropped | WorkerOutcome::PermanentFailure => summary.permanent_failures += 1,
            WorkerOutcome::Retry => retry_set.push(instance),
        }
    }

    for worker in workers {
        let _ = worker.await;
    }

    (summary, retry_set)
}

/// Iterate-until-fixed-point parallel destruction, per spec §4.5. Each round
/// drains fully before the next launches; this is a loop rather than literal
/// recursion so stack depth stays bounded regardless of retry-round count —
/// an implementation detail, not an observable semantics change.
pub async fn run_until_fixed_point(
    mut instances: Vec<ResourceInstance>,
    config: &SchedulerConfig,
) -> DestructionSummary {
    let mut total = DestructionSummary::default();

    loop {
        if instances.is_empty() {
            break;
        }

        let round_size = instances.len();
        info!(round_size, "starting destruction round");
        let (round, retry_set) = run_one_round(instances, config).await;

        total.deleted += round.deleted;
        total.gone_remote += round.gone_remote;
        total.permanent_failures += round.permanent_failures;
        total.would_delete += round.would_delete;

        let deleted_this_round = round.deleted + round.gone_remote;

        if retry_set.is_empty() {
            break;
        }

        if deleted_this_round == 0 {
            warn!(count = retry_set.len(), "no progress this round, retries exceeded");
            total.unresolved_retryable += retry_set.len();
            break;
        }

        instances = retry_set;
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;
    use terradozer_domain::{ProviderKey, ResourceAddress, ResourceDescriptor, ResourceMode};
    use terradozer_plugin::{Diagnostic, FakeProviderRpc, ProviderAdapter};

    fn descriptor(resource: &str, id: &str) -> ResourceDescriptor {
        ResourceDescriptor {
            resource_type: "aws_vpc".into(),
            id: id.into(),
            provider_key: ProviderKey::new("aws"),
            mode: ResourceMode::Managed,
            prior_attrs: Some(json!({ "id": id })),
            address: ResourceAddress {
                module: "root".into(),
                resource: resource.into(),
                instance_key: "".into(),
            },
        }
    }

    #[tokio::test]
    async fn single_resource_happy_path() {
        let fake = FakeProviderRpc::builder()
            .read(Ok(Some(json!({ "id": "vpc-aaaa" }))))
            .destroy(Ok(None))
            .build();
        let adapter = StdArc::new(ProviderAdapter::new(Box::new(fake)));
        let instance = ResourceInstance::new(descriptor("main", "vpc-aaaa"), adapter);

        let summary = run_until_fixed_point(vec![instance], &SchedulerConfig::default()).await;
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.total(), 1);
    }

    #[tokio::test]
    async fn dry_run_never_calls_destroy() {
        let fake = FakeProviderRpc::builder().read(Ok(Some(json!({ "id": "vpc-aaaa" })))).build();
        let adapter = StdArc::new(ProviderAdapter::new(Box::new(fake)));
        let instance = ResourceInstance::new(descriptor("main", "vpc-aaaa"), adapter);

        let config = SchedulerConfig {
            dry_run: true,
            ..SchedulerConfig::default()
        };
        let summary = run_until_fixed_point(vec![instance], &config).await;
        assert_eq!(summary.would_delete, 1);
        assert_eq!(summary.deleted, 0);
    }

    #[tokio::test]
    async fn gone_remote_resource_never_calls_destroy() {
        let fake = FakeProviderRpc::builder().read(Ok(None)).build();
        let adapter = StdArc::new(ProviderAdapter::new(Box::new(fake)));
        let instance = ResourceInstance::new(descriptor("main", "vpc-aaaa"), adapter);

        let summary = run_until_fixed_point(vec![instance], &SchedulerConfig::default()).await;
        assert_eq!(summary.gone_remote, 1);
        assert_eq!(summary.deleted, 0);
    }

    #[tokio::test]
    async fn retries_exhausted_reports_unresolved_retryable() {
        let fake = FakeProviderRpc::builder()
            .read(Ok(Some(json!({ "id": "vpc-aaaa" }))))
            .destroy(Err(Diagnostic::error("Throttling: rate exceeded")))
            .build();
        let adapter = StdArc::new(ProviderAdapter::new(Box::new(fake)));
        let instance = ResourceInstance::new(descriptor("main", "vpc-aaaa"), adapter);

        let config = SchedulerConfig {
            parallel: 1,
            per_resource_timeout: std::time::Duration::from_millis(200),
            dry_run: false,
        };
        let summary = run_until_fixed_point(vec![instance], &config).await;
        assert_eq!(summary.unresolved_retryable, 1);
        assert_eq!(summary.deleted, 0);
    }

    #[tokio::test]
    async fn dependency_ordering_without_graph_resolves_across_two_rounds() {
        // VPC's first destroy attempt is classified retryable (subnet still
        // exists); the subnet destroys cleanly in round one, and the VPC
        // destroy succeeds once retried alone in round two.
        let vpc_calls = StdArc::new(AtomicUsize::new(0));
        let vpc_calls_clone = vpc_calls.clone();

        struct VpcThenSucceed {
            calls: StdArc<AtomicUsize>,
        }

        #[async_trait::async_trait]
        impl terradozer_plugin::ProviderRpc for VpcThenSucceed {
            async fn configure(&self, _: serde_json::Value) -> Result<(), Diagnostic> {
                Ok(())
            }
            async fn import(&self, _: &str, _: &str) -> Result<Vec<terradozer_plugin::ImportedResource>, Diagnostic> {
                Ok(vec![])
            }
            async fn read(&self, _: &str, _: &serde_json::Value) -> Result<Option<serde_json::Value>, Diagnostic> {
                Ok(Some(json!({ "id": "vpc-x" })))
            }
            async fn destroy(&self, _: &str, _: &serde_json::Value) -> Result<Option<serde_json::Value>, Diagnostic> {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(Diagnostic::error("DependencyViolation: still has dependents (request error, retry)"))
                } else {
                    Ok(None)
                }
            }
        }

        let vpc_adapter = StdArc::new(ProviderAdapter::new(Box::new(VpcThenSucceed { calls: vpc_calls_clone })));
        let subnet_adapter = StdArc::new(ProviderAdapter::new(Box::new(
            FakeProviderRpc::builder()
                .read(Ok(Some(json!({ "id": "subnet-y" }))))
                .destroy(Ok(None))
                .build(),
        )));

        let vpc = ResourceInstance::new(descriptor("vpc", "vpc-x"), vpc_adapter);
        let subnet = ResourceInstance::new(descriptor("subnet", "subnet-y"), subnet_adapter);

        let config = SchedulerConfig {
            parallel: 2,
            per_resource_timeout: std::time::Duration::from_secs(5),
            dry_run: false,
        };
        let summary = run_until_fixed_point(vec![vpc, subnet], &config).await;
        assert_eq!(summary.deleted, 2);
        assert_eq!(vpc_calls.load(Ordering::SeqCst), 2);
    }
}
