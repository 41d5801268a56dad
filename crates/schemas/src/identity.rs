//! Deterministic device identity.
//!
//! Instance ids must survive process restarts and OS reboots: the same
//! physical device plugged into the same port gets the same id, which is
//! what lets saved slot assignments reattach without user action. The
//! hash is therefore a fixed-offset FNV-1a rather than a randomly keyed
//! hasher.

use std::fmt;

use serde::{Deserialize, Serialize};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(seed: u64, bytes: &[u8]) -> u64 {
    let mut hash = seed;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Stable identifier for one physical device instance.
///
/// Derived from the stable hardware path when the OS supplies one, else
/// from `(vid, pid, enumeration index)`. Native pads get the literal
/// `XINPUT<slot>` form so they are recognizable in settings files.
///
/// # Examples
///
/// ```
/// use padforge_schemas::InstanceId;
///
/// let a = InstanceId::from_path(r"\\?\HID#VID_046D&PID_C29B", 0x046D, 0xC29B);
/// let b = InstanceId::from_path(r"\\?\HID#VID_046D&PID_C29B", 0x046D, 0xC29B);
/// assert_eq!(a, b);
///
/// assert_eq!(InstanceId::xinput(2).as_str(), "XINPUT2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Derive from a stable hardware path.
    pub fn from_path(path: &str, vid: u16, pid: u16) -> Self {
        let mut h = fnv1a(FNV_OFFSET, path.as_bytes());
        h = fnv1a(h, &vid.to_le_bytes());
        h = fnv1a(h, &pid.to_le_bytes());
        Self(format!("{h:016x}"))
    }

    /// Derive from `(vid, pid, enumeration index)` when no stable path exists.
    pub fn from_triple(vid: u16, pid: u16, index: usize) -> Self {
        let mut h = fnv1a(FNV_OFFSET, &vid.to_le_bytes());
        h = fnv1a(h, &pid.to_le_bytes());
        h = fnv1a(h, &(index as u64).to_le_bytes());
        Self(format!("{h:016x}"))
    }

    /// The synthetic id of a native pad occupying an OS XInput slot.
    pub fn xinput(slot: u8) -> Self {
        Self(format!("XINPUT{slot}"))
    }

    /// Whether this id names a native pad rather than an opened driver device.
    pub fn is_xinput(&self) -> bool {
        self.0.starts_with("XINPUT")
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Product identity shared by every unit of the same hardware model.
///
/// Sixteen bytes laid out `[vid_lo, vid_hi, pid_lo, pid_hi, 0 × 12]`,
/// matching the product GUID convention of the settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ProductGuid([u8; 16]);

impl ProductGuid {
    /// Build from vendor and product ids.
    pub fn new(vid: u16, pid: u16) -> Self {
        Self(product_guid(vid, pid))
    }

    /// Vendor id encoded in the first two bytes.
    pub fn vid(&self) -> u16 {
        u16::from_le_bytes([self.0[0], self.0[1]])
    }

    /// Product id encoded in the next two bytes.
    pub fn pid(&self) -> u16 {
        u16::from_le_bytes([self.0[2], self.0[3]])
    }

    /// The raw sixteen bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ProductGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl From<ProductGuid> for String {
    fn from(g: ProductGuid) -> Self {
        g.to_string()
    }
}

impl TryFrom<String> for ProductGuid {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("invalid product guid: {s:?}"));
        }
        let mut bytes = [0u8; 16];
        for (i, chunk) in s.as_bytes().chunks_exact(2).enumerate() {
            let hex = std::str::from_utf8(chunk).map_err(|e| e.to_string())?;
            bytes[i] = u8::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
        }
        Ok(Self(bytes))
    }
}

/// Raw product GUID bytes for `(vid, pid)`.
pub fn product_guid(vid: u16, pid: u16) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    bytes[0..2].copy_from_slice(&vid.to_le_bytes());
    bytes[2..4].copy_from_slice(&pid.to_le_bytes());
    bytes
}
