//! `fortimanager_router_rip`: RIP routing on a FortiGate VDOM

use super::{ObjectKey, ResourceDefinition, DEVICE_NAME, DEVICE_VDOM};
use crate::wire::Field;

fn distance() -> Field {
    Field::block(
        "distance",
        "id",
        vec![
            Field::int("id"),
            Field::string("access_list"),
            Field::int("distance"),
            Field::string_list("prefix"),
        ],
    )
    .describe("Administrative distance overrides")
}

fn distribute_list() -> Field {
    Field::block(
        "distribute_list",
        "id",
        vec![
            Field::int("id"),
            Field::string("direction"),
            Field::string("interface"),
            Field::string("listname"),
            Field::string("status"),
        ],
    )
}

fn interface() -> Field {
    Field::block(
        "interface",
        "name",
        vec![
            Field::string("name"),
            Field::string("auth_keychain"),
            Field::string("auth_mode"),
            Field::string("auth_string").sensitive(),
            Field::int("flags"),
            Field::string_set("receive_version"),
            Field::string_set("send_version"),
            Field::string("send_version2_broadcast"),
            Field::string("split_horizon"),
            Field::string("split_horizon_status"),
        ],
    )
    .describe("Per-interface RIP settings")
}

fn neighbor() -> Field {
    Field::block(
        "neighbor",
        "id",
        vec![Field::int("id"), Field::string("ip")],
    )
}

fn network() -> Field {
    Field::block(
        "network",
        "id",
        vec![Field::int("id"), Field::string_list("prefix")],
    )
}

fn offset_list() -> Field {
    Field::block(
        "offset_list",
        "id",
        vec![
            Field::int("id"),
            Field::string("access_list"),
            Field::string("direction"),
            Field::string("interface"),
            Field::int("offset"),
            Field::string("status"),
        ],
    )
}

pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        type_name: "fortimanager_router_rip",
        display_name: "RouterRip",
        description: "Configure RIP on a FortiGate managed by FortiManager",
        path: "/pm/config/device/{device}/vdom/{vdom}/router/rip",
        params: vec![DEVICE_NAME, DEVICE_VDOM],
        key: ObjectKey::Singleton,
        fields: vec![
            Field::string("default_information_originate"),
            Field::int("default_metric"),
            Field::int("garbage_timer"),
            Field::int("max_out_metric"),
            Field::string_set("passive_interface"),
            Field::int("recv_buffer_size"),
            Field::int("timeout_timer"),
            Field::int("update_timer"),
            Field::string("version").describe("RIP version: 1 or 2"),
            distance(),
            distribute_list(),
            interface(),
            neighbor(),
            network(),
            offset_list(),
        ],
    }
}
