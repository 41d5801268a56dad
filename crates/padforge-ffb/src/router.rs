//! The per-device force-feedback state machine.

use padforge_devices::{EffectId, HapticEffect};
use padforge_mapping::{ForceEffectStyle, ForceParams};
use padforge_schemas::Vibration;

/// How the pipeline reaches a device's actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfRoute {
    /// Plain dual-motor rumble commands
    Rumble,
    /// Driver-managed haptic effects
    Haptic,
}

/// A command for the pipeline to run against the device driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfCommand {
    /// Stop plain rumble on both motors
    RumbleStop,
    /// Submit rumble magnitudes with effectively-infinite duration; the
    /// driver retains them until the next call, so a stalled pipeline
    /// never drops rumble mid-effect
    Rumble {
        /// Heavy motor magnitude
        left: u16,
        /// Light motor magnitude
        right: u16,
    },
    /// Create and start a haptic effect
    EffectStart(HapticEffect),
    /// Update the running effect in place
    EffectUpdate(EffectId, HapticEffect),
    /// Stop and destroy the running effect
    EffectStop(EffectId),
}

/// A planned submission: the command plus the final pair it encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfPlan {
    /// Command to execute against the driver
    pub command: FfCommand,
    /// The (left, right) pair after gains and swap
    pub pair: (u16, u16),
}

/// Apply the gain chain to one raw pair: per-motor gain, then overall
/// gain, both percentages, clipped into u16.
pub fn apply_gains(vibration: Vibration, params: &ForceParams) -> (u16, u16) {
    let scale = |raw: u16, gain: u8| -> u16 {
        let scaled = u32::from(raw) * u32::from(gain.min(100)) / 100;
        let scaled = scaled * u32::from(params.overall_gain.min(100)) / 100;
        scaled.min(u32::from(u16::MAX)) as u16
    };
    let left = scale(vibration.left_motor, params.left_gain);
    let right = scale(vibration.right_motor, params.right_gain);
    if params.swap_motors {
        (right, left)
    } else {
        (left, right)
    }
}

/// Per-device force-feedback runtime state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfState {
    last_sent: Option<(u16, u16)>,
    cached_gains: Option<(u8, u8, u8, bool)>,
    active_effect: Option<EffectId>,
    active: bool,
}

impl FfState {
    /// Fresh state: nothing sent, nothing running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the device is currently driven (last committed pair was
    /// non-zero).
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The last pair actually committed to the device.
    pub fn last_sent(&self) -> Option<(u16, u16)> {
        self.last_sent
    }

    /// The identifier of the running haptic effect, if any.
    pub fn active_effect(&self) -> Option<EffectId> {
        self.active_effect
    }

    /// Decide what to send for this cycle's vibration, or `None` when
    /// the submission would be bit-identical to the last committed one.
    pub fn plan(&self, vibration: Vibration, params: &ForceParams, route: FfRoute) -> Option<FfPlan> {
        let pair = apply_gains(vibration, params);
        let gains = gain_key(params);

        if self.last_sent == Some(pair) && self.cached_gains == Some(gains) {
            return None;
        }
        // Nothing has ever been sent and nothing is requested: the
        // motors are already silent, a stop would be noise.
        if self.last_sent.is_none() && pair == (0, 0) {
            return None;
        }

        let command = match route {
            FfRoute::Rumble => {
                if pair == (0, 0) {
                    FfCommand::RumbleStop
                } else {
                    FfCommand::Rumble {
                        left: pair.0,
                        right: pair.1,
                    }
                }
            }
            FfRoute::Haptic => {
                if pair == (0, 0) {
                    match self.active_effect {
                        Some(id) => FfCommand::EffectStop(id),
                        // Nothing running and nothing to run; just record
                        // the pair so the next non-zero isn't suppressed.
                        None => {
                            return Some(FfPlan {
                                command: FfCommand::RumbleStop,
                                pair,
                            })
                        }
                    }
                } else {
                    let effect = shape_effect(pair, params.effect_style);
                    match self.active_effect {
                        Some(id) => FfCommand::EffectUpdate(id, effect),
                        None => FfCommand::EffectStart(effect),
                    }
                }
            }
        };

        Some(FfPlan { command, pair })
    }

    /// Record a successful submission. `started` carries the id the
    /// driver returned for an [`FfCommand::EffectStart`].
    pub fn commit(&mut self, plan: &FfPlan, params: &ForceParams, started: Option<EffectId>) {
        self.last_sent = Some(plan.pair);
        self.cached_gains = Some(gain_key(params));
        self.active = plan.pair != (0, 0);
        match plan.command {
            FfCommand::EffectStart(_) => self.active_effect = started,
            FfCommand::EffectStop(_) => self.active_effect = None,
            _ => {}
        }
    }

    /// Forget everything, as on device disconnect. The next plan against
    /// a reopened device starts from a clean slate.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn gain_key(params: &ForceParams) -> (u8, u8, u8, bool) {
    (
        params.overall_gain,
        params.left_gain,
        params.right_gain,
        params.swap_motors,
    )
}

/// Translate a final pair into the configured effect family.
fn shape_effect(pair: (u16, u16), style: ForceEffectStyle) -> HapticEffect {
    let stronger = pair.0.max(pair.1);
    match style {
        ForceEffectStyle::DualMagnitude => HapticEffect::DualMagnitude {
            left: pair.0,
            right: pair.1,
        },
        // Stronger rumble spins faster: the period shrinks from 100 ms
        // at a whisper to 10 ms at full magnitude.
        ForceEffectStyle::SinePeriodic => HapticEffect::SinePeriodic {
            magnitude: stronger,
            period_ms: (10 + u32::from(u16::MAX - stronger) * 90 / u32::from(u16::MAX)) as u16,
        },
        ForceEffectStyle::ConstantForce => HapticEffect::ConstantForce { magnitude: stronger },
    }
}
