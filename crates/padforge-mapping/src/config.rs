//! Mapping configuration: descriptors, dead-zones, force parameters.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::descriptor::SourceRef;
use crate::output::{PadOutput, OUTPUTS, OUTPUT_COUNT};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Radial dead-zone parameters for one stick.
///
/// Percentages of full deflection: below `dead_zone` the stick reads
/// centered; above it the remaining annulus is stretched to start at
/// `anti_dead_zone`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickZone {
    /// Inner radius as a percentage, 0–100
    #[serde(default)]
    pub dead_zone: u8,
    /// Output floor as a percentage, 0–100
    #[serde(default)]
    pub anti_dead_zone: u8,
}

impl StickZone {
    /// Both percentages, clamped to 100 on construction.
    pub fn new(dead_zone: u8, anti_dead_zone: u8) -> Self {
        Self {
            dead_zone: dead_zone.min(100),
            anti_dead_zone: anti_dead_zone.min(100),
        }
    }
}

/// Which effect family a haptic-capable device should receive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceEffectStyle {
    /// Left/right dual-magnitude effect
    #[default]
    DualMagnitude,
    /// Sine periodic effect with a motor-derived period
    SinePeriodic,
    /// Constant force with magnitude from the stronger motor
    ConstantForce,
}

/// Force-feedback parameters of one mapping configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceParams {
    /// Overall gain, 0–100
    pub overall_gain: u8,
    /// Left (heavy) motor gain, 0–100
    pub left_gain: u8,
    /// Right (light) motor gain, 0–100
    pub right_gain: u8,
    /// Exchange motors before routing to the device
    #[serde(default)]
    pub swap_motors: bool,
    /// Effect family for haptic-capable devices
    #[serde(default)]
    pub effect_style: ForceEffectStyle,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            overall_gain: 100,
            left_gain: 100,
            right_gain: 100,
            swap_motors: false,
            effect_style: ForceEffectStyle::default(),
        }
    }
}

/// The 21 descriptor slots, indexed by [`PadOutput`].
///
/// Serializes as a sequence of `(output label, descriptor text)` entries
/// walked through [`OUTPUTS`] in canonical order, skipping unbound
/// outputs. The entry shape carries the label as an attribute and the
/// descriptor as text content, so the settings document reads
/// `<Binding output="A">Button 0</Binding>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorSet(pub [Option<SourceRef>; OUTPUT_COUNT]);

#[derive(Serialize, Deserialize)]
struct BindingEntry {
    #[serde(rename = "@output")]
    output: String,
    #[serde(rename = "$text", default)]
    text: String,
}

impl DescriptorSet {
    /// The descriptor bound to an output, if any.
    pub fn get(&self, output: PadOutput) -> Option<SourceRef> {
        self.0[output.index()]
    }

    /// Bind or clear an output.
    pub fn set(&mut self, output: PadOutput, descriptor: Option<SourceRef>) {
        self.0[output.index()] = descriptor;
    }
}

impl Serialize for DescriptorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(OUTPUTS.iter().filter_map(|def| {
            self.0[def.output.index()].map(|descriptor| BindingEntry {
                output: def.label.to_string(),
                text: descriptor.to_string(),
            })
        }))
    }
}

impl<'de> Deserialize<'de> for DescriptorSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<BindingEntry>::deserialize(deserializer)?;
        let mut set = DescriptorSet::default();
        for entry in entries {
            let Some(output) = PadOutput::from_label(&entry.output) else {
                tracing::warn!(label = %entry.output, "unknown output label in mapping, ignored");
                continue;
            };
            // An unparseable binding degrades to "unbound", so a damaged
            // settings file costs one output, not the whole
            // configuration.
            match crate::descriptor::parse_binding(&entry.text) {
                Ok(descriptor) => set.set(output, descriptor),
                Err(e) => {
                    tracing::warn!(label = %entry.output, %e, "descriptor ignored");
                }
            }
        }
        Ok(set)
    }
}

/// A complete mapping configuration, named by its content checksum.
///
/// Configurations are immutable during a polling cycle; updates replace
/// the whole value. Two configurations with equal content have equal
/// checksums and are shared by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Descriptor per gamepad output; each serialized entry is one
    /// `<Binding output="...">` element in the settings document
    #[serde(rename = "Binding", default)]
    pub descriptors: DescriptorSet,
    /// Left stick dead-zone parameters
    #[serde(default)]
    pub left_stick: StickZone,
    /// Right stick dead-zone parameters
    #[serde(default)]
    pub right_stick: StickZone,
    /// Force-feedback parameters
    #[serde(default)]
    pub force: ForceParams,
}

impl MappingConfig {
    /// Bind one output, builder style.
    pub fn with_binding(mut self, output: PadOutput, descriptor: SourceRef) -> Self {
        self.descriptors.set(output, Some(descriptor));
        self
    }

    /// Deterministic checksum over the configuration content.
    ///
    /// Stable across processes and Rust versions (fixed-offset FNV-1a
    /// over the canonical field order), because it is persisted in
    /// settings documents as the link between user settings and their
    /// mapping configuration.
    pub fn checksum(&self) -> u64 {
        let mut hash = FNV_OFFSET;
        for def in &OUTPUTS {
            match self.descriptors.get(def.output) {
                Some(d) => hash = fnv1a_str(hash, &d.to_string()),
                None => hash = fnv1a_str(hash, ""),
            }
            // Field separator so "A: Button 1, B: -" != "A: -, B: Button 1".
            hash = fnv1a(hash, &[0xFF]);
        }
        for zone in [self.left_stick, self.right_stick] {
            hash = fnv1a(hash, &[zone.dead_zone, zone.anti_dead_zone]);
        }
        let force = &self.force;
        hash = fnv1a(
            hash,
            &[
                force.overall_gain,
                force.left_gain,
                force.right_gain,
                u8::from(force.swap_motors),
                force.effect_style as u8,
            ],
        );
        hash
    }
}

fn fnv1a(seed: u64, bytes: &[u8]) -> u64 {
    let mut hash = seed;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fnv1a_str(seed: u64, s: &str) -> u64 {
    fnv1a(seed, s.as_bytes())
}
