//! `fortimanager_wirelesscontroller_widsprofile`: wireless intrusion detection profiles

use super::{ObjectKey, ResourceDefinition, DEVICE_NAME, DEVICE_VDOM};
use crate::wire::Field;

pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        type_name: "fortimanager_wirelesscontroller_widsprofile",
        display_name: "WirelessControllerWidsProfile",
        description: "Configure wireless intrusion detection system (WIDS) profiles",
        path: "/pm/config/device/{device}/vdom/{vdom}/wireless-controller/wids-profile",
        params: vec![DEVICE_NAME, DEVICE_VDOM],
        key: ObjectKey::Mkey("name"),
        fields: vec![
            Field::string("name").required().force_new(),
            Field::string("comment"),
            Field::string("sensor_mode").describe("Scan radio bands: disable, foreign, both"),
            Field::string("ap_scan"),
            Field::int("ap_bgscan_period"),
            Field::int("ap_bgscan_intv"),
            Field::int("ap_bgscan_duration"),
            Field::int("ap_bgscan_idle"),
            Field::int("ap_bgscan_report_intv"),
            Field::string_set("ap_bgscan_disable_day"),
            Field::string("ap_bgscan_disable_start"),
            Field::string("ap_bgscan_disable_end"),
            Field::int("ap_fgscan_report_intv"),
            Field::string("ap_scan_passive"),
            Field::string("ap_scan_threshold"),
            Field::string("ap_auto_suppress"),
            Field::block(
                "ap_scan_channel_list_2g_5g",
                "chan",
                vec![Field::string("chan")],
            ),
            Field::block(
                "ap_scan_channel_list_6g",
                "chan",
                vec![Field::string("chan")],
            ),
            Field::string("asleap_attack"),
            Field::string("assoc_frame_flood"),
            Field::int("assoc_flood_thresh"),
            Field::int("assoc_flood_time"),
            Field::string("auth_frame_flood"),
            Field::int("auth_flood_thresh"),
            Field::int("auth_flood_time"),
            Field::string("deauth_broadcast"),
            Field::int("deauth_unknown_src_thresh"),
            Field::string("eapol_start_flood"),
            Field::int("eapol_start_intv"),
            Field::int("eapol_start_thresh"),
            Field::string("invalid_mac_oui"),
            Field::string("long_duration_attack"),
            Field::int("long_duration_thresh"),
            Field::string("null_ssid_probe_resp"),
            Field::string("spoofed_deauth"),
            Field::string("weak_wep_iv"),
            Field::string("wireless_bridge"),
        ],
    }
}
