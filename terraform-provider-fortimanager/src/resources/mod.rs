//! Terraform Resources for FortiManager
//!
//! Every resource here is a FortiGate configuration object addressed through
//! FortiManager's device database. They share one implementation,
//! [`DeviceObjectResource`], and differ only in their [`ResourceDefinition`].

mod router_rip;
mod system_admin;
mod system_sdwan_healthcheck;
mod system_settings;
mod vpn_ipsec_phase2interface;
mod wirelesscontroller_widsprofile;
mod ztna_webproxy_apigateway;

use crate::client::{ClientError, FortiManagerClient, ObjectPath};
use crate::config::ImportOptions;
use crate::schema::{Diagnostic, ResourceSchema, SchemaAttribute, SchemaBlock};
use crate::wire::{
    assemble_object, expand_value, is_zero, refresh_object, Field, RefreshOptions, SortMode,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, Vec<Diagnostic>>;

/// Resource state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub values: Map<String, Value>,
}

impl ResourceState {
    pub fn new() -> Self {
        Self { values: Map::new() }
    }

    /// State from a JSON object; `None` for null or non-object values
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(|values| Self {
            values: values.clone(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(|v| v.as_str()).map(String::from)
    }

    /// String form of a string or numeric attribute, ignoring empty strings
    pub fn get_key(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Provider-level handles passed to every resource operation
#[derive(Clone)]
pub struct ProviderContext {
    pub client: FortiManagerClient,
    pub import_options: ImportOptions,
}

/// Outcome of planning a change
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub state: ResourceState,
    /// Attributes whose change forces replacement
    pub requires_replace: Vec<String>,
}

/// Resource trait
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name
    fn type_name(&self) -> &str;

    /// Get the schema for this resource
    fn schema(&self) -> ResourceSchema;

    /// Check a configuration before planning
    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic>;

    /// Plan changes
    fn plan_change(
        &self,
        current: Option<&ResourceState>,
        proposed: &ResourceState,
    ) -> ResourceResult<PlannedChange>;

    /// Create a new resource
    async fn create(
        &self,
        ctx: &ProviderContext,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState>;

    /// Read an existing resource; an empty state means it is gone
    async fn read(
        &self,
        ctx: &ProviderContext,
        current: &ResourceState,
    ) -> ResourceResult<ResourceState>;

    /// Update an existing resource
    async fn update(
        &self,
        ctx: &ProviderContext,
        current: &ResourceState,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState>;

    /// Delete a resource
    async fn delete(&self, ctx: &ProviderContext, current: &ResourceState) -> ResourceResult<()>;

    /// Import an existing object by ID
    async fn import(&self, ctx: &ProviderContext, id: &str) -> ResourceResult<ResourceState>;
}

// ============================================================================
// Resource definitions
// ============================================================================

/// A URL placeholder filled from a resource attribute
#[derive(Debug, Clone, Copy)]
pub struct PathParam {
    pub attribute: &'static str,
    pub placeholder: &'static str,
    pub description: &'static str,
}

pub const DEVICE_NAME: PathParam = PathParam {
    attribute: "device_name",
    placeholder: "{device}",
    description: "Name of the managed FortiGate",
};

pub const DEVICE_VDOM: PathParam = PathParam {
    attribute: "device_vdom",
    placeholder: "{vdom}",
    description: "VDOM of the managed FortiGate",
};

/// How an object is addressed within its collection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKey {
    /// Table entry keyed by the named attribute
    Mkey(&'static str),
    /// One object per device/VDOM
    Singleton,
}

/// Static description of one resource type
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    pub type_name: &'static str,
    /// Name used in error messages, e.g. `SystemAdmin`
    pub display_name: &'static str,
    pub description: &'static str,
    /// URL template with `{placeholder}`s for the path parameters
    pub path: &'static str,
    pub params: Vec<PathParam>,
    pub key: ObjectKey,
    pub fields: Vec<Field>,
}

/// Generic CRUD over one FortiManager device object
pub struct DeviceObjectResource {
    definition: ResourceDefinition,
}

impl DeviceObjectResource {
    pub fn new(definition: ResourceDefinition) -> Self {
        Self { definition }
    }

    fn error(&self, verb: &str, err: impl Display) -> Vec<Diagnostic> {
        vec![Diagnostic::error(&format!(
            "Error {} {} resource: {}",
            verb, self.definition.display_name, err
        ))]
    }

    /// Fill the URL template from state, falling back to import options
    fn resolve_collection(
        &self,
        ctx: &ProviderContext,
        state: &ResourceState,
    ) -> ResourceResult<(String, Vec<(&'static str, String)>)> {
        let mut url = self.definition.path.to_string();
        let mut resolved = Vec::with_capacity(self.definition.params.len());

        for param in &self.definition.params {
            let value = state
                .get_key(param.attribute)
                .or_else(|| ctx.import_options.get(param.attribute).map(String::from))
                .ok_or_else(|| {
                    vec![Diagnostic::error(&format!("{} is required", param.attribute))
                        .with_detail(
                            "Set it on the resource or pass it through the provider's import_options",
                        )
                        .with_attribute(vec![param.attribute.to_string()])]
                })?;
            url = url.replace(param.placeholder, &value);
            resolved.push((param.attribute, value));
        }

        Ok((url, resolved))
    }

    fn sort_mode(state: &ResourceState) -> SortMode {
        state
            .get_string("dynamic_sort_subtable")
            .and_then(|v| SortMode::parse(&v))
            .unwrap_or_default()
    }

    fn object_path(&self, collection: String, state: &ResourceState) -> ResourceResult<ObjectPath> {
        match self.definition.key {
            ObjectKey::Mkey(_) => {
                let id = state.get_key("id").ok_or_else(|| {
                    vec![Diagnostic::error(&format!(
                        "{} ID is required",
                        self.definition.display_name
                    ))]
                })?;
                Ok(ObjectPath::table(collection, id))
            }
            ObjectKey::Singleton => Ok(ObjectPath::singleton(collection)),
        }
    }

    async fn read_state(
        &self,
        ctx: &ProviderContext,
        current: &ResourceState,
        importing: bool,
    ) -> ResourceResult<ResourceState> {
        let def = &self.definition;
        let (collection, params) = self.resolve_collection(ctx, current)?;
        let path = self.object_path(collection, current)?;

        let response = match ctx.client.read_object(&path).await {
            Ok(Some(response)) => response,
            Ok(None) => {
                tracing::warn!(
                    "{} {} no longer exists, removing from state",
                    def.display_name,
                    path.object_url()
                );
                return Ok(ResourceState::new());
            }
            Err(e) => return Err(self.error("reading", e)),
        };

        let options = RefreshOptions {
            importing,
            sort: Self::sort_mode(current),
        };
        let values = refresh_object(&def.fields, &response, Some(&current.values), options)
            .map_err(|e| self.error("reading", e))?;

        let mut state = ResourceState { values };
        let id = match def.key {
            ObjectKey::Mkey(_) => path.mkey.clone().unwrap_or_default(),
            ObjectKey::Singleton => def.display_name.to_string(),
        };
        state.set("id", Value::String(id));
        for (attribute, value) in params {
            state.set(attribute, Value::String(value));
        }
        state.set(
            "dynamic_sort_subtable",
            current
                .get("dynamic_sort_subtable")
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| Value::String("false".to_string())),
        );

        Ok(state)
    }
}

#[async_trait]
impl Resource for DeviceObjectResource {
    fn type_name(&self) -> &str {
        self.definition.type_name
    }

    fn schema(&self) -> ResourceSchema {
        let def = &self.definition;
        let mut block = SchemaBlock::new()
            .with_attribute(
                "id",
                SchemaAttribute::string()
                    .with_description("Terraform identifier of the object")
                    .computed(),
            )
            .with_attribute(
                "dynamic_sort_subtable",
                SchemaAttribute::string()
                    .with_description("Sort nested blocks after reads: false, true or natural")
                    .optional()
                    .with_default(serde_json::json!("false")),
            )
            .with_description(def.description);

        for param in &def.params {
            block = block.with_attribute(
                param.attribute,
                SchemaAttribute::string()
                    .with_description(param.description)
                    .optional()
                    .computed()
                    .force_new(),
            );
        }

        let block = def
            .fields
            .iter()
            .fold(block, |block, field| field.add_to_schema(block));

        ResourceSchema::new(1, block)
    }

    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for field in &self.definition.fields {
            let value = config.get(field.name).unwrap_or(&Value::Null);
            if field.required && is_zero(value) {
                diagnostics.push(
                    Diagnostic::error(&format!("{} is required", field.name))
                        .with_attribute(vec![field.name.to_string()]),
                );
                continue;
            }
            if field.read_only && !value.is_null() {
                diagnostics.push(
                    Diagnostic::warning(&format!("{} is read-only and will be ignored", field.name))
                        .with_attribute(vec![field.name.to_string()]),
                );
                continue;
            }
            if let Err(e) = expand_value(field, value) {
                diagnostics.push(
                    Diagnostic::error(&format!("Invalid value for {}", field.name))
                        .with_detail(&e.to_string())
                        .with_attribute(vec![field.name.to_string()]),
                );
            }
        }

        if let Some(sort) = config.get_string("dynamic_sort_subtable") {
            if SortMode::parse(&sort).is_none() {
                diagnostics.push(
                    Diagnostic::error(&format!(
                        "Invalid dynamic_sort_subtable '{}', expected false, true or natural",
                        sort
                    ))
                    .with_attribute(vec!["dynamic_sort_subtable".to_string()]),
                );
            }
        }

        diagnostics
    }

    fn plan_change(
        &self,
        current: Option<&ResourceState>,
        proposed: &ResourceState,
    ) -> ResourceResult<PlannedChange> {
        let def = &self.definition;
        let mut state = proposed.clone();
        let mut requires_replace = Vec::new();

        if state.get("dynamic_sort_subtable").map_or(true, Value::is_null) {
            state.set("dynamic_sort_subtable", Value::String("false".to_string()));
        }

        let Some(prior) = current.filter(|c| !c.is_empty()) else {
            return Ok(PlannedChange {
                state,
                requires_replace,
            });
        };

        // Optional+computed attributes left out of the configuration keep
        // whatever FortiManager reported last
        let carried = def
            .fields
            .iter()
            .filter(|f| !f.required && !f.sensitive)
            .map(|f| f.name)
            .chain(def.params.iter().map(|p| p.attribute))
            .chain(std::iter::once("id"));
        for name in carried {
            let unset = state.get(name).map_or(true, Value::is_null);
            if let Some(previous) = prior.get(name).filter(|v| !v.is_null()) {
                if unset {
                    state.set(name, previous.clone());
                }
            }
        }

        let force_new = def
            .params
            .iter()
            .map(|p| p.attribute)
            .chain(def.fields.iter().filter(|f| f.force_new).map(|f| f.name));
        for name in force_new {
            if prior.get_key(name) != state.get_key(name) {
                requires_replace.push(name.to_string());
            }
        }

        if !requires_replace.is_empty() {
            tracing::debug!(
                "{} requires replacement: {:?}",
                def.display_name,
                requires_replace
            );
        }

        Ok(PlannedChange {
            state,
            requires_replace,
        })
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        let def = &self.definition;
        let (collection, _) = self.resolve_collection(ctx, planned)?;
        let payload =
            assemble_object(&def.fields, &planned.values, None).map_err(|e| self.error("creating", e))?;

        let (path, id) = match def.key {
            ObjectKey::Mkey(field) => {
                let mkey = planned.get_key(field).ok_or_else(|| {
                    self.error("creating", format!("{} is required", field))
                })?;
                (ObjectPath::table(collection, mkey.clone()), mkey)
            }
            ObjectKey::Singleton => (
                ObjectPath::singleton(collection),
                def.display_name.to_string(),
            ),
        };

        ctx.client
            .create_object(&path, payload)
            .await
            .map_err(|e| self.error("creating", e))?;
        tracing::info!("Created {} {}", def.display_name, id);

        let mut created = planned.clone();
        created.set("id", Value::String(id.clone()));
        let state = self.read_state(ctx, &created, false).await?;
        if state.is_empty() {
            return Err(self.error(
                "creating",
                format!("{} was not found after creation", id),
            ));
        }
        Ok(state)
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        current: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        self.read_state(ctx, current, false).await
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        current: &ResourceState,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        let def = &self.definition;
        let (collection, _) = self.resolve_collection(ctx, planned)?;
        let path = self.object_path(collection, current)?;
        let payload = assemble_object(&def.fields, &planned.values, Some(&current.values))
            .map_err(|e| self.error("updating", e))?;

        ctx.client
            .update_object(&path, payload)
            .await
            .map_err(|e| self.error("updating", e))?;
        tracing::info!("Updated {} {}", def.display_name, path.object_url());

        let mut updated = planned.clone();
        if let Some(id) = current.get("id") {
            updated.set("id", id.clone());
        }
        self.read_state(ctx, &updated, false).await
    }

    async fn delete(&self, ctx: &ProviderContext, current: &ResourceState) -> ResourceResult<()> {
        let def = &self.definition;
        if def.key == ObjectKey::Singleton {
            tracing::debug!(
                "{} cannot be deleted on the device, removing from state only",
                def.display_name
            );
            return Ok(());
        }

        let (collection, _) = self.resolve_collection(ctx, current)?;
        let path = self.object_path(collection, current)?;

        match ctx.client.delete_object(&path).await {
            Ok(()) => {
                tracing::info!("Deleted {} {}", def.display_name, path.object_url());
                Ok(())
            }
            Err(ClientError::NotFound(_)) => Ok(()), // Already deleted
            Err(e) => Err(self.error("deleting", e)),
        }
    }

    async fn import(&self, ctx: &ProviderContext, id: &str) -> ResourceResult<ResourceState> {
        let mut state = ResourceState::new();
        state.set("id", Value::String(id.to_string()));
        for param in &self.definition.params {
            if let Some(value) = ctx.import_options.get(param.attribute) {
                state.set(param.attribute, Value::String(value.to_string()));
            }
        }

        self.read_state(ctx, &state, true).await
    }
}

/// Get all available resources
pub fn get_all_resources() -> Vec<Box<dyn Resource>> {
    [
        system_settings::definition(),
        router_rip::definition(),
        system_admin::definition(),
        system_sdwan_healthcheck::definition(),
        vpn_ipsec_phase2interface::definition(),
        wirelesscontroller_widsprofile::definition(),
        ztna_webproxy_apigateway::definition(),
    ]
    .into_iter()
    .map(|definition| Box::new(DeviceObjectResource::new(definition)) as Box<dyn Resource>)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok(data: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "result": [{"status": {"code": 0, "message": "OK"}, "url": "/", "data": data}]
        }))
    }

    fn not_found() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "result": [{"status": {"code": -3, "message": "Object does not exist"}, "url": "/"}]
        }))
    }

    fn context(server: &MockServer, options: &[&str]) -> ProviderContext {
        let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
        ProviderContext {
            client: FortiManagerClient::new(&server.uri()).unwrap(),
            import_options: ImportOptions::parse(&options).unwrap(),
        }
    }

    fn state(value: Value) -> ResourceState {
        ResourceState::from_value(&value).unwrap()
    }

    fn admin() -> DeviceObjectResource {
        DeviceObjectResource::new(system_admin::definition())
    }

    fn rip() -> DeviceObjectResource {
        DeviceObjectResource::new(router_rip::definition())
    }

    const ADMIN_URL: &str = "/pm/config/device/FGT-01/global/system/admin";
    const RIP_URL: &str = "/pm/config/device/FGT-01/vdom/root/router/rip";

    #[test]
    fn test_resource_state() {
        let mut state = ResourceState::new();
        state.set("name", json!("ops"));
        state.set("fosid", json!(7));
        state.set("comments", json!(""));

        assert_eq!(state.get_string("name"), Some("ops".to_string()));
        assert_eq!(state.get_key("fosid"), Some("7".to_string()));
        assert_eq!(state.get_key("comments"), None);
        assert!(ResourceState::from_value(&Value::Null).is_none());
    }

    #[test]
    fn test_all_resources_have_unique_names() {
        let resources = get_all_resources();
        let names: HashSet<&str> = resources.iter().map(|r| r.type_name()).collect();
        assert_eq!(names.len(), resources.len());
        assert!(names.iter().all(|n| n.starts_with("fortimanager_")));
    }

    #[test]
    fn test_every_schema_has_path_parameters() {
        for resource in get_all_resources() {
            let schema = resource.schema();
            let device = &schema.block.attributes["device_name"];
            assert!(device.force_new && device.optional, "{}", resource.type_name());
            assert!(schema.block.attributes["id"].computed);
            assert!(schema.block.attributes.contains_key("dynamic_sort_subtable"));
        }
    }

    #[test]
    fn test_validate_required_and_sort() {
        let diags = admin().validate(&state(json!({
            "accprofile": "super_admin",
            "dynamic_sort_subtable": "sometimes"
        })));

        let summaries: Vec<&str> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert!(summaries.contains(&"name is required"));
        assert!(summaries
            .iter()
            .any(|s| s.starts_with("Invalid dynamic_sort_subtable 'sometimes'")));
    }

    #[test]
    fn test_validate_type_mismatch() {
        let diags = rip().validate(&state(json!({"update_timer": "soon"})));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Invalid value for update_timer");
        assert_eq!(diags[0].attribute, Some(vec!["update_timer".to_string()]));
    }

    #[test]
    fn test_plan_create_defaults_sort() {
        let planned = admin()
            .plan_change(None, &state(json!({"name": "ops"})))
            .unwrap();
        assert_eq!(planned.state.get_string("dynamic_sort_subtable"), Some("false".to_string()));
        assert!(planned.requires_replace.is_empty());
    }

    #[test]
    fn test_plan_requires_replace_on_device_change() {
        let prior = state(json!({
            "id": "ops", "name": "ops", "device_name": "FGT-01", "accprofile": "super_admin"
        }));
        let proposed = state(json!({"name": "ops", "device_name": "FGT-02"}));

        let planned = admin().plan_change(Some(&prior), &proposed).unwrap();
        assert_eq!(planned.requires_replace, vec!["device_name".to_string()]);
        assert_eq!(planned.state.get_string("accprofile"), Some("super_admin".to_string()));
        assert_eq!(planned.state.get_string("id"), Some("ops".to_string()));
    }

    #[test]
    fn test_plan_mkey_change_forces_new() {
        let prior = state(json!({"id": "ops", "name": "ops", "device_name": "FGT-01"}));
        let proposed = state(json!({"name": "ops2", "device_name": "FGT-01"}));

        let planned = admin().plan_change(Some(&prior), &proposed).unwrap();
        assert_eq!(planned.requires_replace, vec!["name".to_string()]);
    }

    #[tokio::test]
    async fn test_create_table_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "method": "add",
                "params": [{
                    "url": ADMIN_URL,
                    "data": {"name": "ops", "accprofile": "super_admin", "password": "s3cret", "vdom": ["root"]}
                }]
            })))
            .respond_with(ok(json!({"name": "ops"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "method": "get",
                "params": [{"url": format!("{}/ops", ADMIN_URL)}]
            })))
            .respond_with(ok(json!({
                "name": "ops",
                "accprofile": "super_admin",
                "password": "ENC XXXX",
                "vdom": "root",
                "trusthost1": ["0.0.0.0", "0.0.0.0"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server, &[]);
        let planned = state(json!({
            "device_name": "FGT-01",
            "name": "ops",
            "accprofile": "super_admin",
            "password": "s3cret",
            "vdom": ["root"]
        }));

        let created = admin().create(&ctx, &planned).await.unwrap();
        assert_eq!(created.get_string("id"), Some("ops".to_string()));
        assert_eq!(created.get_string("password"), Some("s3cret".to_string()));
        assert_eq!(created.get("vdom"), Some(&json!(["root"])));
        assert_eq!(created.get("trusthost1"), Some(&json!(["0.0.0.0", "0.0.0.0"])));
        assert_eq!(created.get_string("device_name"), Some("FGT-01".to_string()));
    }

    #[tokio::test]
    async fn test_create_error_is_wrapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "result": [{"status": {"code": -2, "message": "Object already exists"}, "url": ADMIN_URL}]
            })))
            .mount(&server)
            .await;

        let ctx = context(&server, &[]);
        let diags = admin()
            .create(&ctx, &state(json!({"device_name": "FGT-01", "name": "ops"})))
            .await
            .unwrap_err();
        assert_eq!(
            diags[0].summary,
            format!(
                "Error creating SystemAdmin resource: API error -2 on {}: Object already exists",
                ADMIN_URL
            )
        );
    }

    #[tokio::test]
    async fn test_read_missing_object_clears_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(not_found())
            .mount(&server)
            .await;

        let ctx = context(&server, &[]);
        let read = admin()
            .read(&ctx, &state(json!({"id": "ops", "device_name": "FGT-01"})))
            .await
            .unwrap();
        assert!(read.is_empty());
    }

    #[tokio::test]
    async fn test_read_requires_device_name() {
        let server = MockServer::start().await;
        let ctx = context(&server, &[]);

        let diags = admin()
            .read(&ctx, &state(json!({"id": "ops"})))
            .await
            .unwrap_err();
        assert_eq!(diags[0].summary, "device_name is required");
        assert_eq!(diags[0].attribute, Some(vec!["device_name".to_string()]));
    }

    #[tokio::test]
    async fn test_read_falls_back_to_import_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({"params": [{"url": RIP_URL}]})))
            .respond_with(ok(json!({"version": "2", "update-timer": 30})))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server, &["device_name=FGT-01", "device_vdom=root"]);
        let read = rip().read(&ctx, &state(json!({"id": "RouterRip"}))).await.unwrap();

        assert_eq!(read.get_string("device_vdom"), Some("root".to_string()));
        assert_eq!(read.get("update_timer"), Some(&json!(30)));
        assert_eq!(read.get_string("id"), Some("RouterRip".to_string()));
    }

    #[tokio::test]
    async fn test_update_sends_changed_attributes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "method": "update",
                "params": [{"url": format!("{}/ops", ADMIN_URL), "data": {"name": "ops", "comments": ""}}]
            })))
            .respond_with(ok(json!({"name": "ops"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({"method": "get"})))
            .respond_with(ok(json!({"name": "ops", "comments": ""})))
            .mount(&server)
            .await;

        let ctx = context(&server, &[]);
        let current = state(json!({
            "id": "ops", "device_name": "FGT-01", "name": "ops", "comments": "old"
        }));
        let planned = state(json!({"device_name": "FGT-01", "name": "ops", "comments": ""}));

        let updated = admin().update(&ctx, &current, &planned).await.unwrap();
        assert_eq!(updated.get_string("id"), Some("ops".to_string()));
        assert_eq!(updated.get_string("comments"), Some(String::new()));
    }

    #[tokio::test]
    async fn test_delete_table_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "method": "delete",
                "params": [{"url": format!("{}/ops", ADMIN_URL)}]
            })))
            .respond_with(not_found())
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(&server, &[]);
        admin()
            .delete(&ctx, &state(json!({"id": "ops", "device_name": "FGT-01"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_singleton_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ok(Value::Null))
            .expect(0)
            .mount(&server)
            .await;

        let ctx = context(&server, &[]);
        rip()
            .delete(&ctx, &state(json!({"id": "RouterRip", "device_name": "FGT-01", "device_vdom": "root"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_import_populates_nested_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({"method": "get", "params": [{"url": RIP_URL}]})))
            .respond_with(ok(json!({
                "version": "2",
                "network": [
                    {"id": 2, "prefix": ["10.2.0.0", "255.255.0.0"]},
                    {"id": 1, "prefix": ["10.1.0.0", "255.255.0.0"]}
                ],
                "passive-interface": ["port1", "port2"]
            })))
            .mount(&server)
            .await;

        let ctx = context(&server, &["device_name=FGT-01", "device_vdom=root"]);
        let imported = rip().import(&ctx, "RouterRip").await.unwrap();

        assert_eq!(imported.get_string("device_name"), Some("FGT-01".to_string()));
        assert_eq!(
            imported.get("network"),
            Some(&json!([
                {"id": 2, "prefix": ["10.2.0.0", "255.255.0.0"]},
                {"id": 1, "prefix": ["10.1.0.0", "255.255.0.0"]}
            ]))
        );
        assert_eq!(imported.get("passive_interface"), Some(&json!(["port1", "port2"])));
        assert_eq!(imported.get("distance"), Some(&json!([])));
    }
}
