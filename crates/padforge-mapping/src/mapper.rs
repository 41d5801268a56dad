//! Per-assignment translation from raw state to a gamepad report.
//!
//! This is the hot path of the pipeline's map stage: pure, allocation
//! free, and run once per assignment per cycle.

use padforge_schemas::{RawInputState, XboxGamepad};

use crate::config::{MappingConfig, StickZone};
use crate::descriptor::{SourceKind, SourceRef};
use crate::output::{OutputKind, StickAxis, TriggerSide, OUTPUTS};

/// Processed values at or above this threshold count as pressed.
pub const PRESS_THRESHOLD: u16 = 0x8000;

/// Half of the ±45° POV window, in centidegrees. The window is inclusive
/// so diagonals count for both neighbouring directions.
const POV_WINDOW: i32 = 4_500;

/// Read the raw, unmodified value a descriptor addresses, 0–65535.
pub fn read_source(raw: &RawInputState, source: SourceKind) -> u16 {
    match source {
        SourceKind::Button(i) => {
            if raw.button(usize::from(i)) {
                u16::MAX
            } else {
                0
            }
        }
        SourceKind::Axis(i) => raw.axis(usize::from(i)),
        SourceKind::Slider(i) => raw.slider(usize::from(i)),
        SourceKind::Pov(i, direction) => {
            let hat = raw.hat(usize::from(i));
            if hat < 0 {
                return 0;
            }
            let diff = (hat - direction.centidegrees()).rem_euclid(36_000);
            let distance = diff.min(36_000 - diff);
            if distance <= POV_WINDOW {
                u16::MAX
            } else {
                0
            }
        }
    }
}

/// Apply the descriptor modifiers: half-axis first, then invert.
pub fn apply_modifiers(value: u16, half: bool, invert: bool) -> u16 {
    let mut v = i32::from(value);
    if half {
        v = (2 * v - 65_535).max(0);
    }
    if invert {
        v = 65_535 - v;
    }
    v as u16
}

/// Read and process one descriptor against a raw snapshot.
pub fn process(raw: &RawInputState, descriptor: SourceRef) -> u16 {
    apply_modifiers(
        read_source(raw, descriptor.source),
        descriptor.half,
        descriptor.invert,
    )
}

/// Apply a radial dead-zone / anti-dead-zone to one stick pair.
///
/// The L2 magnitude of the pair decides: below the dead-zone radius the
/// stick reads centered; above it the live annulus is stretched so its
/// inner edge lands at the anti-dead-zone radius and its outer edge at
/// full deflection.
pub fn apply_radial_deadzone(x: i16, y: i16, zone: StickZone) -> (i16, i16) {
    if zone.dead_zone == 0 && zone.anti_dead_zone == 0 {
        return (x, y);
    }

    const MAX: f64 = 32_767.0;
    let fx = f64::from(x);
    let fy = f64::from(y);
    let magnitude = (fx * fx + fy * fy).sqrt();

    let dead = f64::from(zone.dead_zone.min(100)) / 100.0 * MAX;
    let anti = f64::from(zone.anti_dead_zone.min(100)) / 100.0 * MAX;

    if magnitude < dead || dead >= MAX {
        return (0, 0);
    }

    let scaled = anti + (magnitude - dead) * (MAX - anti) / (MAX - dead);
    let ratio = if magnitude > 0.0 { scaled / magnitude } else { 0.0 };

    let clamp = |v: f64| -> i16 { v.round().clamp(-32_768.0, 32_767.0) as i16 };
    (clamp(fx * ratio), clamp(fy * ratio))
}

/// Translate one raw snapshot into one gamepad report.
///
/// The pure function behind Stage 3: everything the result depends on is
/// in the two arguments.
pub fn map_assignment(raw: &RawInputState, config: &MappingConfig) -> XboxGamepad {
    let mut pad = XboxGamepad::NEUTRAL;
    // Stick axes accumulate here so the radial dead-zone can see pairs.
    let mut stick = [0i16; 4];

    for def in &OUTPUTS {
        let Some(descriptor) = config.descriptors.get(def.output) else {
            continue;
        };
        let value = process(raw, descriptor);

        match def.kind {
            OutputKind::Button(mask) => {
                if value >= PRESS_THRESHOLD {
                    pad.press(mask);
                }
            }
            OutputKind::Trigger(side) => {
                let byte = (u32::from(value) * 255 / 65_535) as u8;
                match side {
                    TriggerSide::Left => pad.left_trigger = byte,
                    TriggerSide::Right => pad.right_trigger = byte,
                }
            }
            OutputKind::Stick(axis) => {
                let signed = (i32::from(value) - 32_768) as i16;
                stick[stick_index(axis)] = signed;
            }
        }
    }

    let (lx, ly) = apply_radial_deadzone(stick[0], stick[1], config.left_stick);
    let (rx, ry) = apply_radial_deadzone(stick[2], stick[3], config.right_stick);
    pad.thumb_lx = lx;
    pad.thumb_ly = ly;
    pad.thumb_rx = rx;
    pad.thumb_ry = ry;

    pad
}

fn stick_index(axis: StickAxis) -> usize {
    match axis {
        StickAxis::LeftX => 0,
        StickAxis::LeftY => 1,
        StickAxis::RightX => 2,
        StickAxis::RightY => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PovDirection;
    use crate::output::PadOutput;
    use padforge_schemas::buttons;

    fn raw_with_axis(index: usize, value: u16) -> RawInputState {
        let mut raw = RawInputState::neutral();
        raw.axes[index] = value;
        raw
    }

    #[test]
    fn button_reads_full_scale() {
        let mut raw = RawInputState::neutral();
        assert_eq!(read_source(&raw, SourceKind::Button(3)), 0);
        raw.set_button(3, true);
        assert_eq!(read_source(&raw, SourceKind::Button(3)), 65_535);
    }

    #[test]
    fn pov_window_includes_diagonals_for_both_neighbours() {
        let mut raw = RawInputState::neutral();
        raw.hats[0] = 4_500; // up-right
        assert_eq!(read_source(&raw, SourceKind::Pov(0, PovDirection::Up)), 65_535);
        assert_eq!(
            read_source(&raw, SourceKind::Pov(0, PovDirection::Right)),
            65_535
        );
        assert_eq!(read_source(&raw, SourceKind::Pov(0, PovDirection::Down)), 0);
        assert_eq!(read_source(&raw, SourceKind::Pov(0, PovDirection::Left)), 0);
    }

    #[test]
    fn pov_window_wraps_around_north() {
        let mut raw = RawInputState::neutral();
        raw.hats[0] = 33_000; // 330°, within 45° of up across the wrap
        assert_eq!(read_source(&raw, SourceKind::Pov(0, PovDirection::Up)), 65_535);
        assert_eq!(
            read_source(&raw, SourceKind::Pov(0, PovDirection::Left)),
            65_535
        );
    }

    #[test]
    fn centered_hat_reads_zero() {
        let raw = RawInputState::neutral();
        assert_eq!(read_source(&raw, SourceKind::Pov(0, PovDirection::Up)), 0);
    }

    #[test]
    fn half_axis_uses_upper_half() {
        assert_eq!(apply_modifiers(0, true, false), 0);
        assert_eq!(apply_modifiers(0x8000, true, false), 1);
        assert_eq!(apply_modifiers(0xFFFF, true, false), 65_535);
        // Lower half clips to zero.
        assert_eq!(apply_modifiers(0x4000, true, false), 0);
    }

    #[test]
    fn invert_mirrors() {
        assert_eq!(apply_modifiers(0, false, true), 65_535);
        assert_eq!(apply_modifiers(65_535, false, true), 0);
        assert_eq!(apply_modifiers(0x8000, false, true), 0x7FFF);
    }

    #[test]
    fn half_applies_before_invert() {
        // H then I: v=0 -> half 0 -> invert 65535.
        assert_eq!(apply_modifiers(0, true, true), 65_535);
        // v=0xFFFF -> half 65535 -> invert 0.
        assert_eq!(apply_modifiers(0xFFFF, true, true), 0);
    }

    #[test]
    fn extremes_survive_modifier_chains() {
        for v in [0u16, 65_535] {
            for half in [false, true] {
                for invert in [false, true] {
                    let out = apply_modifiers(v, half, invert);
                    assert!(out == 0 || out == 65_535, "{v} h={half} i={invert} -> {out}");
                }
            }
        }
    }

    #[test]
    fn button_passthrough_to_a() {
        let config = MappingConfig::default()
            .with_binding(PadOutput::A, SourceRef::plain(SourceKind::Button(0)));

        let raw = RawInputState::neutral();
        assert_eq!(map_assignment(&raw, &config).buttons, 0);

        let mut raw = RawInputState::neutral();
        raw.set_button(0, true);
        let pad = map_assignment(&raw, &config);
        assert_eq!(pad.buttons, buttons::A);
    }

    #[test]
    fn trigger_scaling_endpoints() {
        let config = MappingConfig::default()
            .with_binding(PadOutput::LeftTrigger, SourceRef::plain(SourceKind::Axis(4)));

        assert_eq!(map_assignment(&raw_with_axis(4, 0), &config).left_trigger, 0);
        assert_eq!(
            map_assignment(&raw_with_axis(4, 65_535), &config).left_trigger,
            255
        );
        assert_eq!(
            map_assignment(&raw_with_axis(4, 0x8000), &config).left_trigger,
            127
        );
    }

    #[test]
    fn small_deflection_inside_dead_zone_reads_centered() {
        let mut config = MappingConfig::default()
            .with_binding(PadOutput::LeftStickX, SourceRef::plain(SourceKind::Axis(0)))
            .with_binding(PadOutput::LeftStickY, SourceRef::plain(SourceKind::Axis(1)));
        config.left_stick = StickZone::new(20, 0);

        let mut raw = RawInputState::neutral();
        raw.axes[0] = 0x8800; // +2048 of deflection, under the 20% radius
        raw.axes[1] = 0x8000;
        let pad = map_assignment(&raw, &config);
        assert_eq!((pad.thumb_lx, pad.thumb_ly), (0, 0));
    }

    #[test]
    fn full_deflection_reaches_full_scale_through_dead_zone() {
        let mut config = MappingConfig::default()
            .with_binding(PadOutput::LeftStickX, SourceRef::plain(SourceKind::Axis(0)))
            .with_binding(PadOutput::LeftStickY, SourceRef::plain(SourceKind::Axis(1)));
        config.left_stick = StickZone::new(20, 0);

        let mut raw = RawInputState::neutral();
        raw.axes[0] = 0xFFFF;
        raw.axes[1] = 0x8000;
        let pad = map_assignment(&raw, &config);
        assert_eq!(pad.thumb_lx, i16::MAX);
        assert_eq!(pad.thumb_ly, 0);
    }

    #[test]
    fn anti_dead_zone_lifts_small_live_values() {
        // Just above a 10% dead zone with a 20% anti-dead-zone: output
        // magnitude must land at (or just above) the 20% floor.
        let (x, y) = apply_radial_deadzone(3_300, 0, StickZone::new(10, 20));
        assert!(x >= 6_550, "anti-dead-zone floor not applied: {x}");
        assert_eq!(y, 0);
    }

    #[test]
    fn dead_zone_of_full_range_zeroes_everything() {
        let (x, y) = apply_radial_deadzone(i16::MAX, i16::MIN, StickZone::new(100, 0));
        assert_eq!((x, y), (0, 0));
    }

    #[test]
    fn corner_deflection_does_not_overflow() {
        let (x, y) = apply_radial_deadzone(i16::MIN, i16::MIN, StickZone::new(5, 5));
        assert!(x <= 0 && y <= 0);
        // Clamped, not wrapped.
        assert!(x >= i16::MIN && y >= i16::MIN);
    }

    #[test]
    fn unbound_outputs_stay_neutral() {
        let config = MappingConfig::default();
        let mut raw = RawInputState::neutral();
        raw.set_button(0, true);
        raw.axes[0] = 0xFFFF;
        assert_eq!(map_assignment(&raw, &config), XboxGamepad::NEUTRAL);
    }
}
