use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use terradozer_domain::{ResourceMode, StateFormat};

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn fixture(content: &str) -> std::path::PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut path = std::env::temp_dir();
    path.push(format!("terradozer-state-it-{}-{n}.tfstate", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn v3_fixture_enumerates_managed_resources_only() {
    let path = fixture(
        r#"{
            "version": 3,
            "modules": [{
                "path": ["root"],
                "resources": {
                    "aws_vpc.main": {
                        "type": "aws_vpc",
                        "provider": "provider.aws",
                        "primary": { "id": "vpc-abc", "attributes": { "id": "vpc-abc" } }
                    },
                    "data.aws_region.current": {
                        "type": "aws_region",
                        "provider": "provider.aws",
                        "primary": { "id": "us-east-1", "attributes": {} }
                    }
                }
            }]
        }"#,
    );

    let catalog = terradozer_state::load(&path).unwrap();
    assert!(matches!(catalog.format, StateFormat::V3));
    assert_eq!(catalog.managed().count(), 1);
    let vpc = catalog.managed().next().unwrap();
    assert_eq!(vpc.id, "vpc-abc");
    assert_eq!(vpc.provider_key.as_str(), "aws");

    std::fs::remove_file(&path).ok();
}

#[test]
fn v4_fixture_preserves_prior_attrs_for_force_destroy_coercion() {
    let path = fixture(
        r#"{
            "version": 4,
            "resources": [{
                "module": "root",
                "mode": "managed",
                "type": "aws_s3_bucket",
                "name": "artifacts",
                "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
                "instances": [{
                    "attributes": { "id": "artifacts-bucket", "force_destroy": false }
                }]
            }]
        }"#,
    );

    let catalog = terradozer_state::load(&path).unwrap();
    let bucket = catalog.managed().next().unwrap();
    let attrs = bucket.prior_attrs.as_ref().unwrap();
    assert_eq!(attrs.get("force_destroy").and_then(|v| v.as_bool()), Some(false));

    std::fs::remove_file(&path).ok();
}

#[test]
fn multi_provider_state_yields_all_provider_keys_in_first_seen_order() {
    let path = fixture(
        r#"{
            "version": 4,
            "resources": [
                {
                    "mode": "managed", "type": "aws_vpc", "name": "main",
                    "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
                    "instances": [{ "attributes": { "id": "vpc-1" } }]
                },
                {
                    "mode": "managed", "type": "google_project", "name": "proj",
                    "provider": "provider[\"registry.terraform.io/hashicorp/google\"]",
                    "instances": [{ "attributes": { "id": "proj-1" } }]
                }
            ]
        }"#,
    );

    let catalog = terradozer_state::load(&path).unwrap();
    let keys: Vec<_> = terradozer_state::provider_keys(&catalog)
        .into_iter()
        .map(|k| k.as_str().to_string())
        .collect();
    assert_eq!(keys, vec!["aws".to_string(), "google".to_string()]);

    std::fs::remove_file(&path).ok();
}

#[test]
fn unsupported_version_is_rejected() {
    let path = fixture(r#"{"version": 1}"#);
    let err = terradozer_state::load(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported state version"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn data_mode_never_surfaces_as_managed() {
    let path = fixture(
        r#"{
            "version": 4,
            "resources": [{
                "mode": "data", "type": "aws_ami", "name": "base",
                "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
                "instances": [{ "attributes": { "id": "ami-1" } }]
            }]
        }"#,
    );

    let catalog = terradozer_state::load(&path).unwrap();
    assert_eq!(catalog.managed().count(), 0);
    assert_eq!(
        catalog.resources().iter().filter(|r| r.mode == ResourceMode::Data).count(),
        1
    );
    std::fs::remove_file(&path).ok();
}
