//! `fortimanager_system_admin`: administrator accounts on a FortiGate

use super::{ObjectKey, ResourceDefinition, DEVICE_NAME};
use crate::wire::Field;

pub fn definition() -> ResourceDefinition {
    let mut fields = vec![
        Field::string("name")
            .describe("Administrator user name")
            .required()
            .force_new(),
        Field::string("accprofile").describe("Access profile for this administrator"),
        Field::string("accprofile_override"),
        Field::string("allow_remove_admin_session"),
        Field::string("comments"),
        Field::string("email_to"),
        Field::string("force_password_change"),
        Field::string("fortitoken"),
        Field::string("guest_auth"),
        Field::string("password").sensitive(),
        Field::string("peer_auth"),
        Field::string("peer_group"),
        Field::string("remote_auth"),
        Field::string("remote_group"),
        Field::string("schedule"),
        Field::string("sms_phone"),
        Field::string("two_factor"),
        Field::string_set("vdom").describe("VDOMs this administrator may access"),
        Field::string("wildcard"),
    ];

    // trusthost1..10 are address/netmask pairs, ip6-trusthost1..10 prefixes
    fields.extend(
        [
            "trusthost1", "trusthost2", "trusthost3", "trusthost4", "trusthost5",
            "trusthost6", "trusthost7", "trusthost8", "trusthost9", "trusthost10",
        ]
        .into_iter()
        .map(Field::string_list),
    );
    fields.extend(
        [
            "ip6_trusthost1", "ip6_trusthost2", "ip6_trusthost3", "ip6_trusthost4",
            "ip6_trusthost5", "ip6_trusthost6", "ip6_trusthost7", "ip6_trusthost8",
            "ip6_trusthost9", "ip6_trusthost10",
        ]
        .into_iter()
        .map(Field::string),
    );

    ResourceDefinition {
        type_name: "fortimanager_system_admin",
        display_name: "SystemAdmin",
        description: "Configure administrator accounts on a FortiGate managed by FortiManager",
        path: "/pm/config/device/{device}/global/system/admin",
        params: vec![DEVICE_NAME],
        key: ObjectKey::Mkey("name"),
        fields,
    }
}
