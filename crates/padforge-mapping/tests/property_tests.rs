//! Property-based tests for descriptor round-tripping and mapper math.

use padforge_mapping::{
    apply_modifiers, MappingConfig, PadOutput, SourceKind, SourceRef, StickZone,
};
use proptest::prelude::*;

fn arb_source() -> impl Strategy<Value = SourceKind> {
    prop_oneof![
        (0u8..8).prop_map(SourceKind::Axis),
        (0u8..2).prop_map(SourceKind::Slider),
        (0u8..128).prop_map(SourceKind::Button),
        ((0u8..4), arb_direction()).prop_map(|(i, d)| SourceKind::Pov(i, d)),
    ]
}

fn arb_direction() -> impl Strategy<Value = padforge_mapping::PovDirection> {
    prop_oneof![
        Just(padforge_mapping::PovDirection::Up),
        Just(padforge_mapping::PovDirection::Down),
        Just(padforge_mapping::PovDirection::Left),
        Just(padforge_mapping::PovDirection::Right),
    ]
}

fn arb_descriptor() -> impl Strategy<Value = SourceRef> {
    (any::<bool>(), any::<bool>(), arb_source()).prop_map(|(invert, half, source)| SourceRef {
        invert,
        half,
        source,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // --- Round-trip: parse(serialize(d)) == d ---

    #[test]
    fn descriptor_survives_display_parse(descriptor in arb_descriptor()) {
        let text = descriptor.to_string();
        let back: SourceRef = text.parse().expect("canonical form parses");
        prop_assert_eq!(back, descriptor);
        // And the canonical form is a fixed point.
        prop_assert_eq!(back.to_string(), text);
    }

    // --- Monotonicity: no I prefix => monotone, I prefix => anti-monotone ---

    #[test]
    fn modifier_chain_is_monotone_without_invert(
        a in 0u16..=u16::MAX,
        b in 0u16..=u16::MAX,
        half in any::<bool>(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(apply_modifiers(lo, half, false) <= apply_modifiers(hi, half, false));
    }

    #[test]
    fn modifier_chain_is_anti_monotone_with_invert(
        a in 0u16..=u16::MAX,
        b in 0u16..=u16::MAX,
        half in any::<bool>(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(apply_modifiers(lo, half, true) >= apply_modifiers(hi, half, true));
    }

    // --- Dead-zone output always in range, zero inside the radius ---

    #[test]
    fn dead_zone_output_in_range(
        x in i16::MIN..=i16::MAX,
        y in i16::MIN..=i16::MAX,
        dead in 0u8..=100,
        anti in 0u8..=100,
    ) {
        let (ox, oy) = padforge_mapping::mapper::apply_radial_deadzone(
            x, y, StickZone::new(dead, anti),
        );
        // Reaching here means no overflow panic; the clamp keeps i16 range
        // by construction, so just pin the centered case.
        if x == 0 && y == 0 {
            prop_assert_eq!((ox, oy), (0, 0));
        }
    }

    // --- Checksum: serde round trip never moves the checksum ---

    #[test]
    fn checksum_stable_under_serde(
        descriptor in arb_descriptor(),
        dead in 0u8..=100,
        anti in 0u8..=100,
    ) {
        let mut config = MappingConfig::default()
            .with_binding(PadOutput::B, descriptor);
        config.right_stick = StickZone::new(dead, anti);

        let json = serde_json::to_string(&config).expect("serialize");
        let back: MappingConfig = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(back.checksum(), config.checksum());
    }
}
