use serde_json::{json, Value};

use crate::error::RefreshError;
use crate::instance::ResourceInstance;

/// Choose one of three strategies to bring an instance out of `Created`,
/// per spec §4.4. Strategy 1 is terminal (no fallback on failure); strategy
/// 2 falls through to strategy 3 only when Import itself fails classifiably
/// or yields no candidates.
pub async fn refresh(instance: &mut ResourceInstance) -> Result<(), RefreshError> {
    if let Some(prior) = instance.descriptor.prior_attrs.clone() {
        let resource_type = instance.descriptor.resource_type.clone();
        return apply_read(instance, &resource_type, prior).await;
    }

    match instance
        .adapter
        .import(&instance.descriptor.resource_type, &instance.descriptor.id)
        .await
    {
        Ok(candidates) if !candidates.is_empty() => refresh_via_import_candidates(instance, candidates).await,
        _ => refresh_via_synthetic_state(instance).await,
    }
}

async fn refresh_via_import_candidates(
    instance: &mut ResourceInstance,
    candidates: Vec<terradozer_plugin::ImportedResource>,
) -> Result<(), RefreshError> {
    let total = candidates.len();
    let resource_type = instance.descriptor.resource_type.clone();

    let mut matched_state: Option<Value> = None;
    for candidate in candidates.into_iter().filter(|c| c.type_name == resource_type) {
        match instance.adapter.read(&resource_type, &candidate.state).await {
            Ok(Some(state)) => {
                matched_state = Some(state);
                break;
            }
            Ok(None) => continue,
            Err(e) => {
                return Err(RefreshError {
                    address: instance.descriptor.address.clone(),
                    message: e.message,
                })
            }
        }
    }

    match matched_state {
        Some(state) => {
            if total > 1 {
                instance.warn_import_ambiguity(total);
            }
            instance.mark_refreshed(state);
            Ok(())
        }
        None => refresh_via_synthetic_state(instance).await,
    }
}

async fn refresh_via_synthetic_state(instance: &mut ResourceInstance) -> Result<(), RefreshError> {
    let synthetic = json!({ "id": instance.descriptor.id });
    let resource_type = instance.descriptor.resource_type.clone();
    apply_read(instance, &resource_type, synthetic).await
}

async fn apply_read(instance: &mut ResourceInstance, resource_type: &str, state: Value) -> Result<(), RefreshError> {
    match instance.adapter.read(resource_type, &state).await {
        Ok(Some(new_state)) => {
            instance.mark_refreshed(new_state);
            Ok(())
        }
        Ok(None) => {
            instance.mark_gone_remote();
            Ok(())
        }
        Err(e) => Err(RefreshError {
            address: instance.descriptor.address.clone(),
            message: e.message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use terradozer_domain::{ProviderKey, ResourceAddress, ResourceDescriptor, ResourceMode};
    use terradozer_plugin::{Diagnostic, FakeProviderRpc, ImportedResource, ProviderAdapter};

    fn descriptor(prior_attrs: Option<Value>) -> ResourceDescriptor {
        ResourceDescriptor {
            resource_type: "aws_vpc".into(),
            id: "vpc-aaaa".into(),
            provider_key: ProviderKey::new("aws"),
            mode: ResourceMode::Managed,
            prior_attrs,
            address: ResourceAddress {
                module: "root".into(),
                resource: "main".into(),
                instance_key: "".into(),
            },
        }
    }

    #[tokio::test]
    async fn strategy_one_reads_directly_when_prior_attrs_present() {
        let prior = json!({ "id": "vpc-aaaa" });
        let fake = FakeProviderRpc::builder().read(Ok(Some(json!({ "id": "vpc-aaaa", "cidr": "10.0.0.0/16" })))).build();
        let adapter = Arc::new(ProviderAdapter::new(Box::new(fake)));
        let mut instance = ResourceInstance::new(descriptor(Some(prior)), adapter);

        refresh(&mut instance).await.unwrap();
        assert_eq!(instance.phase, crate::instance::Phase::Refreshed);
        assert!(instance.current_state.is_some());
    }

    #[tokio::test]
    async fn strategy_one_null_read_becomes_gone_remote() {
        let prior = json!({ "id": "vpc-aaaa" });
        let fake = FakeProviderRpc::builder().read(Ok(None)).build();
        let adapter = Arc::new(ProviderAdapter::new(Box::new(fake)));
        let mut instance = ResourceInstance::new(descriptor(Some(prior)), adapter);

        refresh(&mut instance).await.unwrap();
        assert_eq!(instance.phase, crate::instance::Phase::GoneRemote);
    }

    #[tokio::test]
    async fn strategy_two_imports_then_reads_type_matched_candidate() {
        let fake = FakeProviderRpc::builder()
            .import(Ok(vec![ImportedResource {
                type_name: "aws_vpc".into(),
                state: json!({ "id": "vpc-aaaa" }),
            }]))
            .read(Ok(Some(json!({ "id": "vpc-aaaa", "cidr": "10.0.0.0/16" }))))
            .build();
        let adapter = Arc::new(ProviderAdapter::new(Box::new(fake)));
        let mut instance = ResourceInstance::new(descriptor(None), adapter);

        refresh(&mut instance).await.unwrap();
        assert_eq!(instance.phase, crate::instance::Phase::Refreshed);
    }

    #[tokio::test]
    async fn strategy_three_used_when_import_yields_nothing() {
        let fake = FakeProviderRpc::builder()
            .import(Ok(vec![]))
            .read(Ok(Some(json!({ "id": "vpc-aaaa" }))))
            .build();
        let adapter = Arc::new(ProviderAdapter::new(Box::new(fake)));
        let mut instance = ResourceInstance::new(descriptor(None), adapter);

        refresh(&mut instance).await.unwrap();
        assert_eq!(instance.phase, crate::instance::Phase::Refreshed);
    }

    #[tokio::test]
    async fn strategy_three_used_when_import_fails_classifiably() {
        let fake = FakeProviderRpc::builder()
            .import(Err(Diagnostic::error("InvalidParameterValue: cannot import this type")))
            .read(Ok(None))
            .build();
        let adapter = Arc::new(ProviderAdapter::new(Box::new(fake)));
        let mut instance = ResourceInstance::new(descriptor(None), adapter);

        refresh(&mut instance).await.unwrap();
        assert_eq!(instance.phase, crate::instance::Phase::GoneRemote);
    }

    #[tokio::test]
    async fn synthetic_state_not_found_remotely_yields_gone_remote() {
        let fake = FakeProviderRpc::builder().import(Ok(vec![])).read(Ok(None)).build();
        let adapter = Arc::new(ProviderAdapter::new(Box::new(fake)));
        let mut instance = ResourceInstance::new(descriptor(None), adapter);

        refresh(&mut instance).await.unwrap();
        assert_eq!(instance.phase, crate::instance::Phase::GoneRemote);
    }

    #[tokio::test]
    async fn strategy_one_permanent_read_error_is_refresh_error() {
        let prior = json!({ "id": "vpc-aaaa" });
        let fake = FakeProviderRpc::builder()
            .read(Err(Diagnostic::error("InvalidParameterValue: malformed id")))
            .build();
        let adapter = Arc::new(ProviderAdapter::new(Box::new(fake)));
        let mut instance = ResourceInstance::new(descriptor(Some(prior)), adapter);

        let err = refresh(&mut instance).await.unwrap_err();
        assert!(err.message.contains("malformed id"));
    }
}
