//! Property-based tests for the gain chain and change suppression.

use padforge_ffb::{apply_gains, FfRoute, FfState};
use padforge_mapping::ForceParams;
use padforge_schemas::Vibration;
use proptest::prelude::*;

fn arb_params() -> impl Strategy<Value = ForceParams> {
    (0u8..=100, 0u8..=100, 0u8..=100, any::<bool>()).prop_map(
        |(overall, left, right, swap)| ForceParams {
            overall_gain: overall,
            left_gain: left,
            right_gain: right,
            swap_motors: swap,
            ..ForceParams::default()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // --- Gains never amplify ---

    #[test]
    fn gains_never_exceed_raw_magnitudes(
        left in 0u16..=u16::MAX,
        right in 0u16..=u16::MAX,
        params in arb_params(),
    ) {
        let (l, r) = apply_gains(Vibration::new(left, right), &params);
        let cap = left.max(right);
        prop_assert!(l <= cap);
        prop_assert!(r <= cap);
    }

    #[test]
    fn zero_input_stays_zero(params in arb_params()) {
        prop_assert_eq!(apply_gains(Vibration::OFF, &params), (0, 0));
    }

    // --- Submitting the same vibration twice yields exactly one plan ---

    #[test]
    fn second_identical_submission_is_suppressed(
        left in 0u16..=u16::MAX,
        right in 0u16..=u16::MAX,
        params in arb_params(),
    ) {
        let mut state = FfState::new();
        let vibration = Vibration::new(left, right);

        if let Some(plan) = state.plan(vibration, &params, FfRoute::Rumble) {
            state.commit(&plan, &params, None);
        }
        prop_assert!(state.plan(vibration, &params, FfRoute::Rumble).is_none());
    }

    // --- The committed pair is exactly what the plan carried ---

    #[test]
    fn commit_records_the_planned_pair(
        left in 1u16..=u16::MAX,
        right in 0u16..=u16::MAX,
        params in arb_params(),
    ) {
        let mut state = FfState::new();
        match state.plan(Vibration::new(left, right), &params, FfRoute::Rumble) {
            Some(plan) => {
                state.commit(&plan, &params, None);
                prop_assert_eq!(state.last_sent(), Some(plan.pair));
            }
            // Gains can mute a non-zero input down to silence, which a
            // fresh state need not submit.
            None => prop_assert_eq!(state.last_sent(), None),
        }
    }
}
