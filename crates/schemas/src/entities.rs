//! Persisted settings entities.
//!
//! These are the rows of the settings document: which devices have been
//! seen, and which device-to-slot assignments the user configured. The
//! mapping configurations they reference live in the mapping crate and
//! are linked by content checksum.

use serde::{Deserialize, Serialize};

use crate::device::{DeviceCapabilities, DeviceClass};
use crate::identity::{InstanceId, ProductGuid};

/// One physical device as remembered across sessions.
///
/// Created on first enumeration and kept until the user removes it, so
/// offline devices keep their names, flags, and assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Stable instance identifier
    pub instance_id: InstanceId,
    /// Product identity shared across units of the model
    pub product_guid: ProductGuid,
    /// Display name as reported by the OS (or user-overridden)
    pub name: String,
    /// USB vendor id
    pub vendor_id: u16,
    /// USB product id
    pub product_id: u16,
    /// Broad classification
    #[serde(default)]
    pub class: DeviceClass,
    /// Declared capabilities at last open
    #[serde(default)]
    pub capabilities: DeviceCapabilities,
    /// Hidden from the device list
    #[serde(default)]
    pub hidden: bool,
    /// Eligible for the pipeline
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// One device-to-slot assignment.
///
/// Multiple settings may target the same slot (their outputs combine),
/// and one device may appear in several slots through separate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSetting {
    /// Which device this setting binds
    pub instance_id: InstanceId,
    /// Product identity, kept for re-matching when the instance is gone
    pub product_guid: ProductGuid,
    /// Target virtual slot, 0..=3
    pub slot: u8,
    /// Checksum of the mapping configuration this setting uses
    pub map_checksum: u64,
    /// Whether this assignment participates in the pipeline
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Tie-break order when several assignments feed one slot
    #[serde(default)]
    pub sort_order: i32,
    /// RFC 3339 creation timestamp, supplied by the caller
    #[serde(default)]
    pub created_at: String,
    /// RFC 3339 last-update timestamp, supplied by the caller
    #[serde(default)]
    pub updated_at: String,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_entry_serde_round_trip() {
        let entry = DeviceEntry {
            instance_id: InstanceId::from_triple(0x046D, 0xC216, 0),
            product_guid: ProductGuid::new(0x046D, 0xC216),
            name: "Dual Action".into(),
            vendor_id: 0x046D,
            product_id: 0xC216,
            class: DeviceClass::Gamepad,
            capabilities: DeviceCapabilities::new(4, 12).with_hats(1),
            hidden: false,
            enabled: true,
        };
        let json = serde_json::to_string(&entry).expect("serialize");
        let back: DeviceEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, entry);
    }

    #[test]
    fn user_setting_defaults() {
        let json = r#"{
            "instance_id": "deadbeefdeadbeef",
            "product_guid": "6d049bc2000000000000000000000000",
            "slot": 1,
            "map_checksum": 42
        }"#;
        let setting: UserSetting = serde_json::from_str(json).expect("deserialize");
        assert!(setting.enabled);
        assert_eq!(setting.sort_order, 0);
        assert_eq!(setting.slot, 1);
    }
}
