//! Terraform Provider Implementation
//!
//! Implements the Terraform Plugin Protocol for FortiManager.

use crate::client::FortiManagerClient;
use crate::config::ProviderConfig;
use crate::resources::{get_all_resources, ProviderContext, Resource, ResourceState};
use crate::schema::{
    AttributeType, Diagnostic, ProviderSchema, RpcRequest, RpcResponse, SchemaAttribute,
    SchemaBlock,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Runtime;

/// FortiManager Terraform Provider
pub struct FortiManagerProvider {
    context: Arc<RwLock<Option<ProviderContext>>>,
    resources: HashMap<String, Box<dyn Resource>>,
    runtime: Runtime,
}

fn state_param(params: &Value, key: &str) -> Option<ResourceState> {
    params.get(key).and_then(ResourceState::from_value)
}

impl FortiManagerProvider {
    /// Create a new provider
    pub fn new() -> std::io::Result<Self> {
        let resources: HashMap<String, Box<dyn Resource>> = get_all_resources()
            .into_iter()
            .map(|r| (r.type_name().to_string(), r))
            .collect();

        Ok(Self {
            context: Arc::new(RwLock::new(None)),
            resources,
            runtime: Runtime::new()?,
        })
    }

    /// Get provider schema
    fn get_schema(&self) -> ProviderSchema {
        let provider_block = SchemaBlock::new()
            .with_attribute(
                "hostname",
                SchemaAttribute::string()
                    .with_description(
                        "FortiManager address; defaults to FORTIMANAGER_ACCESS_HOSTNAME",
                    )
                    .optional(),
            )
            .with_attribute(
                "username",
                SchemaAttribute::string()
                    .with_description("Administrator name; defaults to FORTIMANAGER_ADMIN_USERNAME")
                    .optional(),
            )
            .with_attribute(
                "password",
                SchemaAttribute::string()
                    .with_description("Administrator password; defaults to FORTIMANAGER_ADMIN_PASSWORD")
                    .optional()
                    .sensitive(),
            )
            .with_attribute(
                "token",
                SchemaAttribute::string()
                    .with_description("API key (alternative to username/password)")
                    .optional()
                    .sensitive(),
            )
            .with_attribute(
                "insecure",
                SchemaAttribute::bool()
                    .with_description("Skip TLS verification")
                    .optional()
                    .with_default(serde_json::json!(false)),
            )
            .with_attribute(
                "cabundlefile",
                SchemaAttribute::string()
                    .with_description("PEM file with an additional trusted CA")
                    .optional(),
            )
            .with_attribute(
                "adom",
                SchemaAttribute::string()
                    .with_description("ADOM locked in workspace mode")
                    .optional()
                    .with_default(serde_json::json!("root")),
            )
            .with_attribute(
                "workspace_mode",
                SchemaAttribute::string()
                    .with_description("disable or normal")
                    .optional()
                    .with_default(serde_json::json!("disable")),
            )
            .with_attribute(
                "import_options",
                SchemaAttribute::list(AttributeType::String)
                    .with_description("key=value path parameters used when importing")
                    .optional(),
            )
            .with_attribute(
                "retries",
                SchemaAttribute::number()
                    .with_description("Attempts per request on connection failures")
                    .optional()
                    .with_default(serde_json::json!(1)),
            )
            .with_description("FortiManager managed device configuration provider");

        let mut schema = ProviderSchema::new(provider_block);

        // Add resource schemas
        for (name, resource) in &self.resources {
            schema = schema.with_resource(name, resource.schema());
        }

        schema
    }

    /// Configure the provider
    fn configure(&self, config: ProviderConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let resolved = match config.resolve() {
            Ok(resolved) => resolved,
            Err(e) => {
                diagnostics.push(Diagnostic::error(&e.to_string()));
                return diagnostics;
            }
        };

        if resolved.insecure {
            diagnostics.push(Diagnostic::warning("TLS certificate verification is disabled"));
        }

        let client = match self.runtime.block_on(FortiManagerClient::connect(&resolved)) {
            Ok(client) => client,
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error("Failed to connect to FortiManager").with_detail(&e.to_string()),
                );
                return diagnostics;
            }
        };

        tracing::info!("Configured FortiManager provider for {}", resolved.hostname);

        // A reconfigure replaces the previous session
        self.close_session();
        *self.context.write().unwrap_or_else(PoisonError::into_inner) = Some(ProviderContext {
            client,
            import_options: resolved.import_options,
        });

        diagnostics
    }

    /// Drop the configured context, logging out of its session
    fn close_session(&self) {
        let context = self
            .context
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(mut ctx) = context {
            if let Err(e) = self.runtime.block_on(ctx.client.logout()) {
                tracing::warn!("Failed to log out of FortiManager: {}", e);
            }
        }
    }

    /// Get the configured context
    fn get_context(&self) -> Result<ProviderContext, Diagnostic> {
        self.context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| Diagnostic::error("Provider not configured"))
    }

    /// Look up the resource named by `type_name`
    fn resource(&self, id: i64, params: &Value) -> Result<&dyn Resource, RpcResponse> {
        let type_name = params
            .get("type_name")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| {
                RpcResponse::diagnostics(
                    id,
                    vec![Diagnostic::error(&format!("Unknown resource type: {}", type_name))],
                )
            })
    }

    /// Handle an RPC request
    pub fn handle_request(&self, input: &str) -> String {
        let request: RpcRequest = match serde_json::from_str(input) {
            Ok(r) => r,
            Err(e) => {
                return serde_json::to_string(&RpcResponse::error(
                    0,
                    -32700,
                    &format!("Parse error: {}", e),
                ))
                .unwrap_or_default();
            }
        };

        tracing::debug!("Handling {}", request.method);

        let response = match request.method.as_str() {
            "GetProviderSchema" => self.handle_get_schema(request.id),
            "ConfigureProvider" => self.handle_configure(request.id, &request.params),
            "ValidateResourceConfig" => {
                self.handle_validate_resource(request.id, &request.params)
            }
            "PlanResourceChange" => self.handle_plan_resource(request.id, &request.params),
            "ApplyResourceChange" => self.handle_apply_resource(request.id, &request.params),
            "ReadResource" => self.handle_read_resource(request.id, &request.params),
            "ImportResourceState" => self.handle_import_resource(request.id, &request.params),
            "StopProvider" => self.handle_stop(request.id),
            _ => RpcResponse::error(
                request.id,
                -32601,
                &format!("Method not found: {}", request.method),
            ),
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            serde_json::to_string(&RpcResponse::error(
                request.id,
                -32603,
                &format!("Serialization error: {}", e),
            ))
            .unwrap_or_default()
        })
    }

    /// Handle GetProviderSchema
    fn handle_get_schema(&self, id: i64) -> RpcResponse {
        let schema = self.get_schema();
        RpcResponse::success(id, serde_json::to_value(schema).unwrap_or_default())
    }

    /// Handle ConfigureProvider
    fn handle_configure(&self, id: i64, params: &Value) -> RpcResponse {
        let config: ProviderConfig = match params.get("config") {
            Some(c) if !c.is_null() => match serde_json::from_value(c.clone()) {
                Ok(config) => config,
                Err(e) => {
                    return RpcResponse::diagnostics(
                        id,
                        vec![Diagnostic::error(&format!("Invalid provider configuration: {}", e))],
                    )
                }
            },
            _ => ProviderConfig::default(),
        };

        RpcResponse::diagnostics(id, self.configure(config))
    }

    /// Handle ValidateResourceConfig
    fn handle_validate_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };

        let config = state_param(params, "config").unwrap_or_default();
        RpcResponse::diagnostics(id, resource.validate(&config))
    }

    /// Handle PlanResourceChange
    fn handle_plan_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };

        // Destroy plans carry a null proposed state
        let Some(proposed_state) = state_param(params, "proposed_new_state") else {
            return RpcResponse::success(
                id,
                serde_json::json!({ "planned_state": null, "diagnostics": [] }),
            );
        };
        let prior_state = state_param(params, "prior_state");

        match resource.plan_change(prior_state.as_ref(), &proposed_state) {
            Ok(planned) => RpcResponse::success(
                id,
                serde_json::json!({
                    "planned_state": planned.state.values,
                    "requires_replace": planned.requires_replace,
                    "diagnostics": []
                }),
            ),
            Err(diagnostics) => RpcResponse::diagnostics(id, diagnostics),
        }
    }

    /// Handle ApplyResourceChange
    fn handle_apply_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };

        let ctx = match self.get_context() {
            Ok(c) => c,
            Err(diag) => return RpcResponse::diagnostics(id, vec![diag]),
        };

        let planned_state = state_param(params, "planned_state");
        let prior_state = state_param(params, "prior_state");

        let result = self.runtime.block_on(async {
            match (prior_state, planned_state) {
                // Delete
                (Some(prior), None) => resource.delete(&ctx, &prior).await.map(|_| None),
                (None, None) => Ok(None),
                // Create
                (None, Some(planned)) => resource.create(&ctx, &planned).await.map(Some),
                // Update
                (Some(prior), Some(planned)) => {
                    resource.update(&ctx, &prior, &planned).await.map(Some)
                }
            }
        });

        match result {
            Ok(Some(new_state)) => RpcResponse::success(
                id,
                serde_json::json!({
                    "new_state": new_state.values,
                    "diagnostics": []
                }),
            ),
            Ok(None) => RpcResponse::success(
                id,
                serde_json::json!({
                    "new_state": null,
                    "diagnostics": []
                }),
            ),
            Err(diagnostics) => RpcResponse::diagnostics(id, diagnostics),
        }
    }

    /// Handle ReadResource
    fn handle_read_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };

        let ctx = match self.get_context() {
            Ok(c) => c,
            Err(diag) => return RpcResponse::diagnostics(id, vec![diag]),
        };

        let current_state = state_param(params, "current_state").unwrap_or_default();

        let result = self
            .runtime
            .block_on(async { resource.read(&ctx, &current_state).await });

        match result {
            Ok(state) => {
                let new_state = if state.is_empty() {
                    // Resource no longer exists
                    Value::Null
                } else {
                    Value::Object(state.values)
                };
                RpcResponse::success(
                    id,
                    serde_json::json!({
                        "new_state": new_state,
                        "diagnostics": []
                    }),
                )
            }
            Err(diagnostics) => RpcResponse::diagnostics(id, diagnostics),
        }
    }

    /// Handle ImportResourceState
    fn handle_import_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };

        let resource_id = params.get("id").and_then(|v| v.as_str()).unwrap_or("");

        let ctx = match self.get_context() {
            Ok(c) => c,
            Err(diag) => return RpcResponse::diagnostics(id, vec![diag]),
        };

        let result = self
            .runtime
            .block_on(async { resource.import(&ctx, resource_id).await });

        match result {
            Ok(state) if state.is_empty() => RpcResponse::diagnostics(
                id,
                vec![Diagnostic::error(&format!("Resource {} not found", resource_id))],
            ),
            Ok(state) => RpcResponse::success(
                id,
                serde_json::json!({
                    "imported_resources": [{
                        "type_name": resource.type_name(),
                        "state": state.values
                    }],
                    "diagnostics": []
                }),
            ),
            Err(diagnostics) => RpcResponse::diagnostics(id, diagnostics),
        }
    }

    /// Handle StopProvider: close the FortiManager session
    fn handle_stop(&self, id: i64) -> RpcResponse {
        self.close_session();
        RpcResponse::success(id, serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(method: &str, params: Value) -> String {
        serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": method, "params": params}).to_string()
    }

    fn parse(response: String) -> Value {
        serde_json::from_str(&response).unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let provider = FortiManagerProvider::new().unwrap();
        assert_eq!(provider.resources.len(), 7);
    }

    #[test]
    fn test_provider_schema() {
        let provider = FortiManagerProvider::new().unwrap();
        let schema = provider.get_schema();

        assert!(schema.provider.attributes.contains_key("hostname"));
        assert!(schema.provider.attributes["token"].sensitive);
        assert!(schema.provider.attributes.contains_key("import_options"));
        assert!(schema
            .resource_schemas
            .contains_key("fortimanager_system_sdwan_healthcheck"));
    }

    #[test]
    fn test_handle_get_schema() {
        let provider = FortiManagerProvider::new().unwrap();
        let response = provider.handle_request(
            r#"{"jsonrpc":"2.0","id":1,"method":"GetProviderSchema","params":{}}"#,
        );

        assert!(response.contains("provider"));
        assert!(response.contains("fortimanager_router_rip"));
    }

    #[test]
    fn test_handle_unknown_method() {
        let provider = FortiManagerProvider::new().unwrap();
        let response = parse(provider.handle_request(&request("UnknownMethod", serde_json::json!({}))));

        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["id"], 7);
    }

    #[test]
    fn test_handle_parse_error() {
        let provider = FortiManagerProvider::new().unwrap();
        let response = parse(provider.handle_request("not json"));
        assert_eq!(response["error"]["code"], -32700);
    }

    #[test]
    fn test_unknown_resource_type() {
        let provider = FortiManagerProvider::new().unwrap();
        let response = parse(provider.handle_request(&request(
            "ReadResource",
            serde_json::json!({"type_name": "fortimanager_nope", "current_state": {}}),
        )));

        assert_eq!(
            response["result"]["diagnostics"][0]["summary"],
            "Unknown resource type: fortimanager_nope"
        );
    }

    #[test]
    fn test_apply_requires_configuration() {
        let provider = FortiManagerProvider::new().unwrap();
        let response = parse(provider.handle_request(&request(
            "ApplyResourceChange",
            serde_json::json!({
                "type_name": "fortimanager_router_rip",
                "prior_state": null,
                "planned_state": {"device_name": "FGT-01", "device_vdom": "root"}
            }),
        )));

        assert_eq!(
            response["result"]["diagnostics"][0]["summary"],
            "Provider not configured"
        );
    }

    #[test]
    fn test_plan_reports_requires_replace() {
        let provider = FortiManagerProvider::new().unwrap();
        let response = parse(provider.handle_request(&request(
            "PlanResourceChange",
            serde_json::json!({
                "type_name": "fortimanager_vpn_ipsec_phase2interface",
                "prior_state": {"id": "p2", "name": "p2", "device_name": "FGT-01", "device_vdom": "root"},
                "proposed_new_state": {"name": "p2", "device_name": "FGT-01", "device_vdom": "vdom2"}
            }),
        )));

        assert_eq!(response["result"]["requires_replace"], serde_json::json!(["device_vdom"]));
        assert_eq!(response["result"]["planned_state"]["id"], "p2");
    }

    #[test]
    fn test_validate_resource_config() {
        let provider = FortiManagerProvider::new().unwrap();
        let response = parse(provider.handle_request(&request(
            "ValidateResourceConfig",
            serde_json::json!({
                "type_name": "fortimanager_system_admin",
                "config": {"accprofile": "super_admin"}
            }),
        )));

        assert_eq!(
            response["result"]["diagnostics"][0]["summary"],
            "name is required"
        );
    }

    #[test]
    fn test_stop_clears_configuration() {
        let provider = FortiManagerProvider::new().unwrap();
        *provider.context.write().unwrap() = Some(ProviderContext {
            client: FortiManagerClient::new("https://fmg.example.com").unwrap(),
            import_options: Default::default(),
        });

        let response = parse(provider.handle_request(&request("StopProvider", serde_json::json!({}))));

        assert_eq!(response["result"], serde_json::json!({}));
        assert!(provider.context.read().unwrap().is_none());
    }

    #[test]
    fn test_reconfigure_logs_out_previous_session() {
        let mock_runtime = Runtime::new().unwrap();
        let server = mock_runtime.block_on(MockServer::start());
        mock_runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/jsonrpc"))
                .and(body_partial_json(serde_json::json!({
                    "params": [{"url": "/sys/login/user"}]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "result": [{"status": {"code": 0, "message": "OK"}, "url": "/sys/login/user"}],
                    "session": "sess-1"
                })))
                .expect(2)
                .mount(&server),
        );
        mock_runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/jsonrpc"))
                .and(body_partial_json(serde_json::json!({
                    "params": [{"url": "/sys/logout"}],
                    "session": "sess-1"
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "result": [{"status": {"code": 0, "message": "OK"}, "url": "/sys/logout"}]
                })))
                .expect(1)
                .mount(&server),
        );

        let provider = FortiManagerProvider::new().unwrap();
        let configure = request(
            "ConfigureProvider",
            serde_json::json!({"config": {
                "hostname": server.uri(),
                "username": "admin",
                "password": "pw"
            }}),
        );
        provider.handle_request(&configure);
        let second = parse(provider.handle_request(&configure));

        assert_eq!(second["result"]["diagnostics"], serde_json::json!([]));
        assert!(provider.context.read().unwrap().is_some());
    }

    #[test]
    fn test_import_missing_object_is_an_error() {
        let mock_runtime = Runtime::new().unwrap();
        let server = mock_runtime.block_on(MockServer::start());
        mock_runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/jsonrpc"))
                .and(body_partial_json(serde_json::json!({
                    "method": "get",
                    "params": [{"url": "/pm/config/device/FGT-01/global/system/admin/ghost"}]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "result": [{"status": {"code": -3, "message": "Object does not exist"}}]
                })))
                .expect(1)
                .mount(&server),
        );

        let provider = FortiManagerProvider::new().unwrap();
        provider.handle_request(&request(
            "ConfigureProvider",
            serde_json::json!({"config": {
                "hostname": server.uri(),
                "token": "api-key",
                "import_options": ["device_name=FGT-01"]
            }}),
        ));

        let response = parse(provider.handle_request(&request(
            "ImportResourceState",
            serde_json::json!({"type_name": "fortimanager_system_admin", "id": "ghost"}),
        )));

        assert_eq!(
            response["result"]["diagnostics"][0]["summary"],
            "Resource ghost not found"
        );
        assert!(response["result"].get("imported_resources").is_none());
    }

    #[test]
    fn test_configure_and_apply_end_to_end() {
        let mock_runtime = Runtime::new().unwrap();
        let server = mock_runtime.block_on(MockServer::start());
        let url = "/pm/config/device/FGT-01/vdom/root/router/rip";
        mock_runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/jsonrpc"))
                .and(body_partial_json(serde_json::json!({
                    "method": "update",
                    "params": [{"url": url, "data": {"version": "2"}}]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "result": [{"status": {"code": 0, "message": "OK"}, "url": url}]
                })))
                .expect(1)
                .mount(&server),
        );
        mock_runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/jsonrpc"))
                .and(body_partial_json(serde_json::json!({"method": "get"})))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "result": [{"status": {"code": 0, "message": "OK"}, "url": url,
                                "data": {"version": "2", "update-timer": 30}}]
                })))
                .mount(&server),
        );

        let provider = FortiManagerProvider::new().unwrap();
        let configured = parse(provider.handle_request(&request(
            "ConfigureProvider",
            serde_json::json!({"config": {"hostname": server.uri(), "token": "api-key"}}),
        )));
        assert_eq!(configured["result"]["diagnostics"], serde_json::json!([]));

        let applied = parse(provider.handle_request(&request(
            "ApplyResourceChange",
            serde_json::json!({
                "type_name": "fortimanager_router_rip",
                "prior_state": null,
                "planned_state": {"device_name": "FGT-01", "device_vdom": "root", "version": "2"}
            }),
        )));

        let new_state = &applied["result"]["new_state"];
        assert_eq!(new_state["id"], "RouterRip");
        assert_eq!(new_state["update_timer"], 30);
        assert_eq!(new_state["dynamic_sort_subtable"], "false");
    }
}
