//! `fortimanager_system_sdwan_healthcheck`: SD-WAN performance SLA probes

use super::{ObjectKey, ResourceDefinition, DEVICE_NAME, DEVICE_VDOM};
use crate::wire::Field;

fn sla() -> Field {
    Field::block(
        "sla",
        "id",
        vec![
            Field::int("id").describe("SLA ID"),
            Field::string_set("link_cost_factor")
                .describe("Criteria on which to base the link cost: latency, jitter, packet-loss, mos"),
            Field::int("latency_threshold"),
            Field::int("jitter_threshold"),
            Field::int("packetloss_threshold"),
            Field::string("mos_threshold"),
            Field::int("priority_in_sla"),
            Field::int("priority_out_sla"),
        ],
    )
    .describe("Service level agreements")
}

pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        type_name: "fortimanager_system_sdwan_healthcheck",
        display_name: "SystemSdwanHealthCheck",
        description: "Configure SD-WAN health checks on a FortiGate managed by FortiManager",
        path: "/pm/config/device/{device}/vdom/{vdom}/system/sdwan/health-check",
        params: vec![DEVICE_NAME, DEVICE_VDOM],
        key: ObjectKey::Mkey("name"),
        fields: vec![
            Field::string("name").required().force_new(),
            Field::string("addr_mode"),
            Field::string("detect_mode"),
            Field::string("dns_request_domain"),
            Field::int("failtime"),
            Field::int("ha_priority"),
            Field::string("http_get"),
            Field::string("http_match"),
            Field::int("interval").describe("Probe interval in milliseconds"),
            Field::int_set("members").describe("Member sequence numbers to probe"),
            Field::string("password").sensitive(),
            Field::int("port"),
            Field::int("probe_count"),
            Field::string("probe_packets"),
            Field::int("probe_timeout"),
            Field::string("protocol"),
            Field::int("recoverytime"),
            Field::string("security_mode"),
            Field::string_set("server"),
            Field::int("sla_fail_log_period"),
            Field::int("sla_pass_log_period"),
            Field::string("system_dns"),
            Field::int("threshold_alert_jitter"),
            Field::int("threshold_alert_latency"),
            Field::int("threshold_alert_packetloss"),
            Field::int("threshold_warning_jitter"),
            Field::int("threshold_warning_latency"),
            Field::int("threshold_warning_packetloss"),
            Field::string("update_cascade_interface"),
            Field::string("update_static_route"),
            sla(),
        ],
    }
}
