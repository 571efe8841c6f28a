//! `fortimanager_ztna_webproxy_apigateway`: API gateways of a ZTNA web proxy

use super::{ObjectKey, PathParam, ResourceDefinition, DEVICE_NAME, DEVICE_VDOM};
use crate::wire::Field;

const WEB_PROXY: PathParam = PathParam {
    attribute: "web_proxy",
    placeholder: "{web_proxy}",
    description: "Name of the parent ZTNA web proxy",
};

fn realservers() -> Field {
    Field::block(
        "realservers",
        "id",
        vec![
            Field::int("id"),
            Field::string("addr_type"),
            Field::string("address"),
            Field::string("domain"),
            Field::string("health_check"),
            Field::string("health_check_proto"),
            Field::string("holddown_interval"),
            Field::string("http_host"),
            Field::string("ip"),
            Field::int("port"),
            Field::string("status"),
            Field::string("translate_host"),
            Field::string("verify_cert"),
            Field::int("weight"),
        ],
    )
    .describe("Real servers behind this gateway")
}

fn ssl_cipher_suites() -> Field {
    Field::block(
        "ssl_cipher_suites",
        "priority",
        vec![
            Field::int("priority"),
            Field::string("cipher"),
            Field::string_set("versions"),
        ],
    )
}

pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        type_name: "fortimanager_ztna_webproxy_apigateway",
        display_name: "ZtnaWebProxyApiGateway",
        description: "Configure API gateways of a ZTNA web proxy",
        path: "/pm/config/device/{device}/vdom/{vdom}/ztna/web-proxy/{web_proxy}/api-gateway",
        params: vec![DEVICE_NAME, DEVICE_VDOM, WEB_PROXY],
        key: ObjectKey::Mkey("fosid"),
        fields: vec![
            // `id` is taken by Terraform
            Field::int("fosid").wire("id").required().force_new(),
            Field::string("h2_support"),
            Field::string("h3_support"),
            Field::int("http_cookie_age"),
            Field::string("http_cookie_domain"),
            Field::string("http_cookie_domain_from_host"),
            Field::int("http_cookie_generation"),
            Field::string("http_cookie_path"),
            Field::string("http_cookie_share"),
            Field::string("https_cookie_secure"),
            Field::string("ldb_method"),
            Field::string("persistence"),
            Field::string("service"),
            Field::string("ssl_algorithm"),
            Field::string("ssl_dh_bits"),
            Field::string("ssl_max_version"),
            Field::string("ssl_min_version"),
            Field::string("ssl_renegotiation"),
            Field::string("url_map").describe("URL pattern to match"),
            Field::string("url_map_type"),
            Field::string("virtual_host"),
            realservers(),
            ssl_cipher_suites(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FortiManagerClient;
    use crate::config::ImportOptions;
    use crate::resources::{DeviceObjectResource, ProviderContext, Resource, ResourceState};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_under_parent_web_proxy() {
        let url = "/pm/config/device/FGT-01/vdom/root/ztna/web-proxy/wp1/api-gateway";
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "method": "add",
                "params": [{"url": url, "data": {
                    "id": 3,
                    "url-map": "/api",
                    "realservers": [{"id": 1, "ip": "10.0.0.10", "port": 8443}]
                }}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{"status": {"code": 0, "message": "OK"}, "url": url, "data": {"id": 3}}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "method": "get",
                "params": [{"url": format!("{}/3", url)}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{"status": {"code": 0, "message": "OK"}, "url": url, "data": {
                    "id": 3,
                    "url-map": "/api",
                    "realservers": [{"id": 1, "ip": "10.0.0.10", "port": 8443, "status": "active"}]
                }}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = ProviderContext {
            client: FortiManagerClient::new(&server.uri()).unwrap(),
            import_options: ImportOptions::default(),
        };
        let planned = ResourceState::from_value(&json!({
            "device_name": "FGT-01",
            "device_vdom": "root",
            "web_proxy": "wp1",
            "fosid": 3,
            "url_map": "/api",
            "realservers": [{"id": 1, "ip": "10.0.0.10", "port": 8443}]
        }))
        .unwrap();

        let state = DeviceObjectResource::new(definition())
            .create(&ctx, &planned)
            .await
            .unwrap();

        assert_eq!(state.get_string("id"), Some("3".to_string()));
        assert_eq!(state.get("fosid"), Some(&json!(3)));
        assert_eq!(state.get_string("web_proxy"), Some("wp1".to_string()));
        assert_eq!(state.get("realservers").unwrap()[0]["status"], json!("active"));
    }
}
