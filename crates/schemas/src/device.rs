//! Device classification and capability descriptions.

use serde::{Deserialize, Serialize};

/// Broad classification of a physical input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Generic joystick
    #[default]
    Joystick,
    /// Console-style gamepad
    Gamepad,
    /// Racing wheel
    Wheel,
    /// Flight stick / HOTAS
    Flight,
    /// Keyboard used as a pad source
    Keyboard,
    /// Mouse used as a pad source
    Mouse,
    /// Auxiliary source merged into another device (extra HID buttons)
    Supplemental,
}

/// What a device can physically report and accept.
///
/// Counts are clamped to the fixed snapshot sizes when sampling; the
/// capability record keeps the declared values for display.
///
/// # Examples
///
/// ```
/// use padforge_schemas::DeviceCapabilities;
///
/// let caps = DeviceCapabilities::new(6, 16)
///     .with_hats(1)
///     .with_rumble();
/// assert_eq!(caps.axes, 6);
/// assert!(caps.rumble);
/// assert!(!caps.haptics);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Declared axis count
    pub axes: u8,
    /// Declared slider count
    pub sliders: u8,
    /// Declared hat count
    pub hats: u8,
    /// Declared button count
    pub buttons: u8,
    /// Supports plain dual-motor rumble
    pub rumble: bool,
    /// Supports driver-managed haptic effects
    pub haptics: bool,
    /// Exposes motion sensors
    pub sensors: bool,
}

impl DeviceCapabilities {
    /// Capabilities with the given axis and button counts, nothing else.
    pub fn new(axes: u8, buttons: u8) -> Self {
        Self {
            axes,
            buttons,
            ..Self::default()
        }
    }

    /// The canonical description of a native XInput-style pad:
    /// six axes (sticks plus both triggers), one hat, sixteen buttons,
    /// dual-motor rumble.
    pub fn native_pad() -> Self {
        Self {
            axes: 6,
            sliders: 0,
            hats: 1,
            buttons: 16,
            rumble: true,
            haptics: false,
            sensors: false,
        }
    }

    /// Set the slider count.
    pub fn with_sliders(mut self, sliders: u8) -> Self {
        self.sliders = sliders;
        self
    }

    /// Set the hat count.
    pub fn with_hats(mut self, hats: u8) -> Self {
        self.hats = hats;
        self
    }

    /// Mark plain rumble support.
    pub fn with_rumble(mut self) -> Self {
        self.rumble = true;
        self
    }

    /// Mark haptic-effect support.
    pub fn with_haptics(mut self) -> Self {
        self.haptics = true;
        self
    }

    /// Mark sensor support.
    pub fn with_sensors(mut self) -> Self {
        self.sensors = true;
        self
    }

    /// Whether any force-feedback path exists on this device.
    pub fn force_feedback(&self) -> bool {
        self.rumble || self.haptics
    }
}
