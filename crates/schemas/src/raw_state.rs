//! Raw input snapshots sampled from physical devices.

use serde::{Deserialize, Serialize};

/// Maximum axes per device.
pub const MAX_AXES: usize = 8;
/// Maximum sliders per device.
pub const MAX_SLIDERS: usize = 2;
/// Maximum hats per device.
pub const MAX_HATS: usize = 4;
/// Maximum buttons per device.
pub const MAX_BUTTONS: usize = 128;

/// Neutral (centered) axis and slider value.
pub const AXIS_CENTER: u16 = 0x8000;
/// Hat value meaning "centered / no direction".
pub const HAT_CENTERED: i32 = -1;

/// A snapshot of one device's inputs.
///
/// Array sizes are fixed at compile time. Entries beyond a device's
/// declared capability count always hold the neutral value, so readers
/// never need to consult the capabilities to stay in-range.
///
/// Hats are in centidegrees, `0..=35_999`, clockwise from up;
/// [`HAT_CENTERED`] when no direction is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInputState {
    /// Axis values, unsigned 16-bit centered at [`AXIS_CENTER`]
    pub axes: [u16; MAX_AXES],
    /// Slider values, same encoding as axes
    pub sliders: [u16; MAX_SLIDERS],
    /// Hat values in centidegrees, or [`HAT_CENTERED`]
    pub hats: [i32; MAX_HATS],
    /// Button states as a bitset, one bit per button index
    #[serde(with = "serde_byte_array")]
    pub buttons: [u8; MAX_BUTTONS / 8],
}

impl Default for RawInputState {
    fn default() -> Self {
        Self {
            axes: [AXIS_CENTER; MAX_AXES],
            sliders: [AXIS_CENTER; MAX_SLIDERS],
            hats: [HAT_CENTERED; MAX_HATS],
            buttons: [0; MAX_BUTTONS / 8],
        }
    }
}

impl RawInputState {
    /// A snapshot with every input at its neutral value.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Restore every input to its neutral value in place.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Button state by index; out-of-range indexes read released.
    pub fn button(&self, index: usize) -> bool {
        if index < MAX_BUTTONS {
            self.buttons[index / 8] & (1 << (index % 8)) != 0
        } else {
            false
        }
    }

    /// Set a button by index; out-of-range indexes are ignored.
    pub fn set_button(&mut self, index: usize, value: bool) {
        if index < MAX_BUTTONS {
            if value {
                self.buttons[index / 8] |= 1 << (index % 8);
            } else {
                self.buttons[index / 8] &= !(1 << (index % 8));
            }
        }
    }

    /// Axis by index; out-of-range indexes read centered.
    pub fn axis(&self, index: usize) -> u16 {
        self.axes.get(index).copied().unwrap_or(AXIS_CENTER)
    }

    /// Slider by index; out-of-range indexes read centered.
    pub fn slider(&self, index: usize) -> u16 {
        self.sliders.get(index).copied().unwrap_or(AXIS_CENTER)
    }

    /// Hat by index; out-of-range indexes read centered.
    pub fn hat(&self, index: usize) -> i32 {
        self.hats.get(index).copied().unwrap_or(HAT_CENTERED)
    }
}

/// Serde helper for the 16-byte button bitset: serialized as a sequence
/// so the settings document stays format-agnostic about fixed arrays.
mod serde_byte_array {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 16], ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_seq(bytes.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<[u8; 16], D::Error> {
        let v: Vec<u8> = Vec::deserialize(de)?;
        let len = v.len();
        v.try_into()
            .map_err(|_| D::Error::invalid_length(len, &"16 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_reads_neutral_everywhere() {
        let s = RawInputState::neutral();
        for i in 0..MAX_AXES {
            assert_eq!(s.axis(i), AXIS_CENTER);
        }
        for i in 0..MAX_HATS {
            assert_eq!(s.hat(i), HAT_CENTERED);
        }
        for i in 0..MAX_BUTTONS {
            assert!(!s.button(i));
        }
    }

    #[test]
    fn button_bitset_round_trip() {
        let mut s = RawInputState::neutral();
        s.set_button(0, true);
        s.set_button(63, true);
        s.set_button(127, true);
        assert!(s.button(0));
        assert!(s.button(63));
        assert!(s.button(127));
        assert!(!s.button(1));

        s.set_button(63, false);
        assert!(!s.button(63));
    }

    #[test]
    fn out_of_range_reads_are_neutral() {
        let s = RawInputState::neutral();
        assert_eq!(s.axis(MAX_AXES), AXIS_CENTER);
        assert_eq!(s.slider(MAX_SLIDERS), AXIS_CENTER);
        assert_eq!(s.hat(MAX_HATS), HAT_CENTERED);
        assert!(!s.button(MAX_BUTTONS + 5));
    }

    #[test]
    fn clear_restores_neutral() {
        let mut s = RawInputState::neutral();
        s.axes[0] = 0xFFFF;
        s.hats[1] = 9000;
        s.set_button(4, true);
        s.clear();
        assert_eq!(s, RawInputState::neutral());
    }
}
