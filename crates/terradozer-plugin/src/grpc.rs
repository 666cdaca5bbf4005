use async_trait::async_trait;
use serde_json::Value;
use tonic::transport::Channel;

use crate::rpc::{Diagnostic, ImportedResource, ProviderRpc, Severity};

pub mod proto {
    tonic::include_proto!("terradozer.plugin.v1");
}

use proto::provider_service_client::ProviderServiceClient;
use proto::{ApplyRequest, ConfigureRequest, ImportRequest, ReadRequest};

/// The real plugin client: one tonic channel per launched subprocess.
pub struct GrpcProviderRpc {
    client: ProviderServiceClient<Channel>,
}

impl GrpcProviderRpc {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: ProviderServiceClient::new(channel),
        }
    }
}

fn first_error(diags: &[proto::Diagnostic]) -> Option<Diagnostic> {
    diags
        .iter()
        .find(|d| d.severity == proto::diagnostic::Severity::Error as i32)
        .map(|d| Diagnostic {
            severity: Severity::Error,
            summary: d.summary.clone(),
            detail: d.detail.clone(),
        })
}

#[async_trait]
impl ProviderRpc for GrpcProviderRpc {
    async fn configure(&self, config: Value) -> Result<(), Diagnostic> {
        let mut client = self.client.clone();
        let resp = client
            .configure(ConfigureRequest {
                config_json: config.to_string(),
            })
            .await
            .map_err(|e| Diagnostic::error(format!("transport error: {e}")))?
            .into_inner();

        match first_error(&resp.diagnostics) {
            Some(d) => Err(d),
            None => Ok(()),
        }
    }

    async fn import(&self, type_name: &str, id: &str) -> Result<Vec<ImportedResource>, Diagnostic> {
        let mut client = self.client.clone();
        let resp = client
            .import_resource_state(ImportRequest {
                type_name: type_name.to_string(),
                id: id.to_string(),
            })
            .await
            .map_err(|e| Diagnostic::error(format!("transport error: {e}")))?
            .into_inner();

        if let Some(d) = first_error(&resp.diagnostics) {
            return Err(d);
        }

        resp.results
            .into_iter()
            .map(|r| {
                serde_json::from_str(&r.state_json)
                    .map(|state| ImportedResource {
                        type_name: r.type_name,
                        state,
                    })
                    .map_err(|e| Diagnostic::error(format!("malformed import state json: {e}")))
            })
            .collect()
    }

    async fn read(&self, type_name: &str, current_state: &Value) -> Result<Option<Value>, Diagnostic> {
        let mut client = self.client.clone();
        let resp = client
            .read_resource(ReadRequest {
                type_name: type_name.to_string(),
                current_state_json: current_state.to_string(),
            })
            .await
            .map_err(|e| Diagnostic::error(format!("transport error: {e}")))?
            .into_inner();

        if let Some(d) = first_error(&resp.diagnostics) {
            return Err(d);
        }

        match resp.new_state_json {
            Some(json) if !json.is_empty() => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| Diagnostic::error(format!("malformed read state json: {e}"))),
            _ => Ok(None),
        }
    }

    async fn destroy(&self, type_name: &str, prior_state: &Value) -> Result<Option<Value>, Diagnostic> {
        let mut client = self.client.clone();
        let resp = client
            .apply_resource_change(ApplyRequest {
                type_name: type_name.to_string(),
                prior_state_json: prior_state.to_string(),
                planned_state_json: None,
            })
            .await
            .map_err(|e| Diagnostic::error(format!("transport error: {e}")))?
            .into_inner();

        if let Some(d) = first_error(&resp.diagnostics) {
            return Err(d);
        }

        match resp.new_state_json {
            Some(json) if !json.is_empty() => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| Diagnostic::error(format!("malformed apply state json: {e}"))),
            _ => Ok(None),
        }
    }
}
