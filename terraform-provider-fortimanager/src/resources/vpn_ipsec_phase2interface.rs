//! `fortimanager_vpn_ipsec_phase2interface`: route-based IPsec phase 2 selectors

use super::{ObjectKey, ResourceDefinition, DEVICE_NAME, DEVICE_VDOM};
use crate::wire::Field;

pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        type_name: "fortimanager_vpn_ipsec_phase2interface",
        display_name: "VpnIpsecPhase2Interface",
        description: "Configure VPN autokey tunnels on a FortiGate managed by FortiManager",
        path: "/pm/config/device/{device}/vdom/{vdom}/vpn/ipsec/phase2-interface",
        params: vec![DEVICE_NAME, DEVICE_VDOM],
        key: ObjectKey::Mkey("name"),
        fields: vec![
            Field::string("name").describe("IPsec tunnel name").required().force_new(),
            Field::string("phase1name").describe("Phase 1 this selector belongs to"),
            Field::string("add_route"),
            Field::string("auto_discovery_forwarder"),
            Field::string("auto_discovery_sender"),
            Field::string("auto_negotiate"),
            Field::string("comments"),
            Field::string_set("dhgrp"),
            Field::string("diffserv"),
            Field::string("encapsulation"),
            Field::string("initiator_ts_narrow"),
            Field::string("ipv4_df"),
            Field::string("keepalive"),
            Field::string("keylife_type"),
            Field::int("keylifekbs"),
            Field::int("keylifeseconds"),
            Field::string("l2tp"),
            Field::string("pfs"),
            Field::string_set("proposal").describe("Phase 2 encryption/authentication proposals"),
            Field::int("protocol"),
            Field::string("replay"),
            Field::string("route_overlap"),
            Field::string("single_source"),
            Field::string("src_addr_type"),
            Field::string("src_end_ip"),
            Field::string("src_end_ip6"),
            Field::string("src_name"),
            Field::string("src_name6"),
            Field::int("src_port"),
            Field::string("src_start_ip"),
            Field::string("src_start_ip6"),
            Field::string_list("src_subnet"),
            Field::string("src_subnet6"),
            Field::string("dst_addr_type"),
            Field::string("dst_end_ip"),
            Field::string("dst_end_ip6"),
            Field::string("dst_name"),
            Field::string("dst_name6"),
            Field::int("dst_port"),
            Field::string("dst_start_ip"),
            Field::string("dst_start_ip6"),
            Field::string_list("dst_subnet"),
            Field::string("dst_subnet6"),
        ],
    }
}
