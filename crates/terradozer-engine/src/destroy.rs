use std::time::Duration;

use crate::error::{PermanentDestroyError, RetryableDestroyError};
use crate::instance::{Phase, ResourceInstance};

/// The per-decision-point sum type spec §9's Design Notes recommend over
/// exception unwinding.
pub enum DestroyOutcome {
    Deleted,
    Gone,
    Retry(RetryableDestroyError),
    Fail(PermanentDestroyError),
}

/// Destroy a `Refreshed` instance. Calling this on `Created` is a
/// programmer error — refresh must run first, per spec §3's invariant that
/// an instance transitions through `Refreshed` (or `GoneRemote`) before any
/// destroy attempt.
pub async fn destroy(instance: &mut ResourceInstance, budget: Duration) -> DestroyOutcome {
    match instance.phase {
        Phase::GoneRemote => return DestroyOutcome::Gone,
        Phase::Refreshed => {}
        other => panic!("destroy() called on instance in phase {other}, expected Refreshed or GoneRemote"),
    }

    let resource_type = instance.descriptor.resource_type.clone();
    let prior_state = instance.current_state.clone().unwrap_or(serde_json::Value::Null);

    match instance.adapter.destroy(&resource_type, &prior_state, budget).await {
        Ok(_) => {
            instance.mark_destroyed();
            DestroyOutcome::Deleted
        }
        Err(e) if e.retryable => {
            instance.mark_transient_failure();
            DestroyOutcome::Retry(RetryableDestroyError {
                address: instance.descriptor.address.clone(),
                cause: e.message,
                timed_out: e.timed_out,
            })
        }
        Err(e) => {
            instance.mark_permanent_failure();
            DestroyOutcome::Fail(PermanentDestroyError {
                address: instance.descriptor.address.clone(),
                cause: e.message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use terradozer_domain::{ProviderKey, ResourceAddress, ResourceDescriptor, ResourceMode};
    use terradozer_plugin::{Diagnostic, FakeProviderRpc, ProviderAdapter};

    fn refreshed_instance(fake: FakeProviderRpc) -> ResourceInstance {
        let descriptor = ResourceDescriptor {
            resource_type: "aws_vpc".into(),
            id: "vpc-aaaa".into(),
            provider_key: ProviderKey::new("aws"),
            mode: ResourceMode::Managed,
            prior_attrs: None,
            address: ResourceAddress {
                module: "root".into(),
                resource: "main".into(),
                instance_key: "".into(),
            },
        };
        let adapter = Arc::new(ProviderAdapter::new(Box::new(fake)));
        let mut instance = ResourceInstance::new(descriptor, adapter);
        instance.mark_refreshed(json!({ "id": "vpc-aaaa" }));
        instance
    }

    #[tokio::test]
    async fn successful_destroy_yields_deleted() {
        let fake = FakeProviderRpc::builder().destroy(Ok(None)).build();
        let mut instance = refreshed_instance(fake);

        let outcome = destroy(&mut instance, Duration::from_secs(5)).await;
        assert!(matches!(outcome, DestroyOutcome::Deleted));
        assert_eq!(instance.phase, Phase::Destroyed);
    }

    #[tokio::test]
    async fn gone_remote_instance_short_circuits_without_rpc() {
        let fake = FakeProviderRpc::builder().build();
        let mut instance = refreshed_instance(fake);
        instance.mark_gone_remote();

        let outcome = destroy(&mut instance, Duration::from_secs(5)).await;
        assert!(matches!(outcome, DestroyOutcome::Gone));
    }

    #[tokio::test]
    async fn permanent_failure_yields_fail_outcome() {
        let fake = FakeProviderRpc::builder()
            .destroy(Err(Diagnostic::error("InvalidParameterValue: bad state")))
            .build();
        let mut instance = refreshed_instance(fake);

        let outcome = destroy(&mut instance, Duration::from_secs(5)).await;
        assert!(matches!(outcome, DestroyOutcome::Fail(_)));
        assert_eq!(instance.phase, Phase::PermanentFailure);
    }

    #[tokio::test]
    async fn retryable_failure_yields_retry_outcome() {
        let fake = FakeProviderRpc::builder()
            .destroy(Err(Diagnostic::error("Throttling: rate exceeded")))
            .build();
        let mut instance = refreshed_instance(fake);

        let outcome = destroy(&mut instance, Duration::from_millis(100)).await;
        assert!(matches!(outcome, DestroyOutcome::Retry(_)));
        assert_eq!(instance.phase, Phase::TransientFailure);
    }

    #[tokio::test]
    #[should_panic(expected = "expected Refreshed or GoneRemote")]
    async fn destroy_on_created_instance_panics() {
        let fake = FakeProviderRpc::builder().build();
        let descriptor = ResourceDescriptor {
            resource_type: "aws_vpc".into(),
            id: "vpc-aaaa".into(),
            provider_key: ProviderKey::new("aws"),
            mode: ResourceMode::Managed,
            prior_attrs: None,
            address: ResourceAddress {
                module: "root".into(),
                resource: "main".into(),
                instance_key: "".into(),
            },
        };
        let adapter = Arc::new(ProviderAdapter::new(Box::new(fake)));
        let mut instance = ResourceInstance::new(descriptor, adapter);

        destroy(&mut instance, Duration::from_secs(1)).await;
    }
}
