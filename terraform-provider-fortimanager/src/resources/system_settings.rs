//! `fortimanager_system_settings`: per-VDOM operating settings

use super::{ObjectKey, ResourceDefinition, DEVICE_NAME, DEVICE_VDOM};
use crate::wire::Field;

pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        type_name: "fortimanager_system_settings",
        display_name: "SystemSettings",
        description: "Configure VDOM settings on a FortiGate managed by FortiManager",
        path: "/pm/config/device/{device}/vdom/{vdom}/system/settings",
        params: vec![DEVICE_NAME, DEVICE_VDOM],
        key: ObjectKey::Singleton,
        fields: vec![
            Field::string("comments").describe("VDOM comments"),
            Field::string("opmode").describe("Firewall operation mode: nat or transparent"),
            Field::string("inspection_mode").describe("Inspection mode: proxy or flow"),
            Field::string("ngfw_mode"),
            Field::string("status"),
            Field::string_list("manageip").describe("Transparent mode management address and netmask"),
            Field::string("gateway"),
            Field::string_list("ip").describe("Transparent mode address and netmask"),
            Field::string("device"),
            Field::string("central_nat"),
            Field::string("allow_subnet_overlap"),
            Field::string("asymroute"),
            Field::string("asymroute6"),
            Field::string("auxiliary_session"),
            Field::string("default_voip_alg_mode"),
            Field::string("firewall_session_dirty"),
            Field::string("gui_allow_unnamed_policy"),
            Field::string_set("gui_default_policy_columns"),
            Field::string("implicit_allow_dns"),
            Field::string("lan_extension_controller_addr"),
            Field::string("location_id"),
            Field::string("multicast_forward"),
            Field::string("sip_helper"),
            Field::string("sip_nat_trace"),
            Field::string("tcp_session_without_syn"),
            Field::string("utf8_spam_tagging"),
            Field::string("v4_ecmp_mode"),
            Field::int("ecmp_max_paths").describe("Maximum number of ECMP next hops"),
            Field::int("discovered_device_timeout"),
            Field::string_set("vpn_stats_log"),
            Field::int("vpn_stats_period"),
        ],
    }
}
