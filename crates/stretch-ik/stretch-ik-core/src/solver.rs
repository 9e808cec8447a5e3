//! Stretch / slide / pole-lock scale solver.
//!
//! [`solve`] is a pure function of a [`SolverInputs`] snapshot. The stages always run in the
//! same order:
//!
//! 1. rest chain length, scaled by the floored global scale
//! 2. current root → tip distance
//! 3. outputs seeded with the rest lengths
//! 4. stretch blend (gated on `stretch`)
//! 5. slide blend (branch chosen by the sign of `slide`)
//! 6. pole-vector lock blend (gated on `poleVecLock`)
//!
//! The outputs are absolute segment lengths even though the host parameters are named
//! `upScale`/`downScale`; consuming rigs divide by the rest length themselves.
//!
//! Blend weights are not clamped and divisions are not guarded. A zero rest length on the
//! segment selected by `slide`, or a zero chain length with stretch enabled, yields a
//! non-finite pair that is handed back unchanged.

use tracing::trace;

use crate::config::{SolverConfig, MIN_GLOBAL_SCALE};
use crate::types::{ScalePair, SolverInputs};

/// Intermediate values of one solve, kept for inspection and tests.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolveTrace {
    pub global_scale: f64,
    pub chain_length: f64,
    pub current_length: f64,
    pub initial: ScalePair,
    pub after_stretch: ScalePair,
    pub after_slide: ScalePair,
    pub result: ScalePair,
}

/// Compute the output pair for `inputs`.
pub fn solve(inputs: &SolverInputs, cfg: &SolverConfig) -> ScalePair {
    solve_staged(inputs, cfg).result
}

/// Same as [`solve`] but returns every intermediate stage.
pub fn solve_staged(inputs: &SolverInputs, cfg: &SolverConfig) -> SolveTrace {
    let floor = cfg.min_global_scale.max(MIN_GLOBAL_SCALE);
    let global_scale = inputs.global_scale.max(floor);
    let chain_length = (inputs.up_init_length + inputs.down_init_length) * global_scale;

    let start = inputs.start_transform.translation();
    let end = inputs.end_transform.translation();
    let current_length = (end - start).norm();

    let initial = ScalePair::new(inputs.up_init_length, inputs.down_init_length);

    let after_stretch = if inputs.stretch > cfg.stretch_threshold {
        apply_stretch(initial, current_length, chain_length, inputs.stretch)
    } else {
        initial
    };

    let after_slide = apply_slide(after_stretch, inputs, chain_length, global_scale);

    let result = if inputs.pole_vec_lock > cfg.pole_lock_threshold {
        let pole = inputs.pole_vector_transform.translation();
        let start_pole_len = (pole - start).norm() / global_scale;
        let pole_end_len = (end - pole).norm() / global_scale;
        apply_pole_lock(
            after_slide,
            ScalePair::new(start_pole_len, pole_end_len),
            inputs.pole_vec_lock,
        )
    } else {
        after_slide
    };

    trace!(
        chain_length,
        current_length,
        stretched_up = after_stretch.up,
        stretched_down = after_stretch.down,
        slid_up = after_slide.up,
        slid_down = after_slide.down,
        up = result.up,
        down = result.down,
        "stretch ik solved"
    );

    SolveTrace {
        global_scale,
        chain_length,
        current_length,
        initial,
        after_stretch,
        after_slide,
        result,
    }
}

/// Elongate both segments by the stretch-weighted overshoot. Compression leaves them alone.
fn apply_stretch(
    pair: ScalePair,
    current_length: f64,
    chain_length: f64,
    stretch: f64,
) -> ScalePair {
    let ratio = current_length / chain_length;
    let delta = if ratio > 1.0 {
        (ratio - 1.0) * stretch + 1.0
    } else {
        1.0
    };
    ScalePair::new(pair.up * delta, pair.down * delta)
}

fn apply_slide(
    pair: ScalePair,
    inputs: &SolverInputs,
    chain_length: f64,
    global_scale: f64,
) -> ScalePair {
    let slide = inputs.slide;
    if slide >= 0.0 {
        let ratio = chain_length / (inputs.up_init_length * global_scale);
        let delta = (ratio - 1.0) * slide;
        ScalePair::new(pair.up * (delta + 1.0), pair.down * (1.0 - slide))
    } else {
        let ratio = chain_length / (inputs.down_init_length * global_scale);
        let delta = (ratio - 1.0) * -slide;
        ScalePair::new(pair.up * (1.0 + slide), pair.down * (delta + 1.0))
    }
}

#[inline]
fn apply_pole_lock(pair: ScalePair, pole: ScalePair, lock: f64) -> ScalePair {
    ScalePair::new(
        pair.up * (1.0 - lock) + pole.up * lock,
        pair.down * (1.0 - lock) + pole.down * lock,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transform4;
    use approx::assert_relative_eq;

    fn rest_inputs() -> SolverInputs {
        SolverInputs {
            start_transform: Transform4::from_translation(0.0, 0.0, 0.0),
            end_transform: Transform4::from_translation(10.0, 0.0, 0.0),
            up_init_length: 5.0,
            down_init_length: 5.0,
            global_scale: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn chain_at_rest_returns_rest_lengths() {
        let out = solve(&rest_inputs(), &SolverConfig::default());
        assert_eq!(out, ScalePair::new(5.0, 5.0));
    }

    #[test]
    fn full_stretch_follows_target() {
        let inputs = SolverInputs {
            stretch: 1.0,
            end_transform: Transform4::from_translation(20.0, 0.0, 0.0),
            ..rest_inputs()
        };
        let trace = solve_staged(&inputs, &SolverConfig::default());
        assert_eq!(trace.chain_length, 10.0);
        assert_eq!(trace.current_length, 20.0);
        assert_eq!(trace.result, ScalePair::new(10.0, 10.0));
    }

    #[test]
    fn partial_stretch_scales_overshoot() {
        let inputs = SolverInputs {
            stretch: 0.5,
            end_transform: Transform4::from_translation(20.0, 0.0, 0.0),
            ..rest_inputs()
        };
        let out = solve(&inputs, &SolverConfig::default());
        assert_relative_eq!(out.up, 7.5);
        assert_relative_eq!(out.down, 7.5);
    }

    #[test]
    fn compression_never_shortens() {
        let inputs = SolverInputs {
            stretch: 1.0,
            end_transform: Transform4::from_translation(4.0, 0.0, 0.0),
            ..rest_inputs()
        };
        let trace = solve_staged(&inputs, &SolverConfig::default());
        assert_eq!(trace.after_stretch, trace.initial);
    }

    #[test]
    fn positive_slide_moves_length_to_upper_segment() {
        let inputs = SolverInputs {
            slide: 1.0,
            ..rest_inputs()
        };
        let out = solve(&inputs, &SolverConfig::default());
        assert_eq!(out, ScalePair::new(10.0, 0.0));
    }

    #[test]
    fn negative_slide_moves_length_to_lower_segment() {
        let inputs = SolverInputs {
            slide: -0.5,
            up_init_length: 4.0,
            down_init_length: 6.0,
            ..rest_inputs()
        };
        let out = solve(&inputs, &SolverConfig::default());
        // ratio = 10 / 6, delta = (10/6 - 1) * 0.5
        assert_relative_eq!(out.down, 6.0 * ((10.0 / 6.0 - 1.0) * 0.5 + 1.0));
        assert_relative_eq!(out.up, 2.0);
    }

    #[test]
    fn full_pole_lock_replaces_lengths() {
        let inputs = SolverInputs {
            pole_vec_lock: 1.0,
            stretch: 1.0,
            slide: 0.3,
            pole_vector_transform: Transform4::from_translation(5.0, 3.0, 0.0),
            ..rest_inputs()
        };
        let out = solve(&inputs, &SolverConfig::default());
        let expected = 34f64.sqrt();
        assert_relative_eq!(out.up, expected);
        assert_relative_eq!(out.down, expected);
    }

    #[test]
    fn pole_lock_divides_by_global_scale() {
        let inputs = SolverInputs {
            pole_vec_lock: 1.0,
            global_scale: 2.0,
            pole_vector_transform: Transform4::from_translation(0.0, 8.0, 0.0),
            end_transform: Transform4::from_translation(0.0, 8.0, 6.0),
            ..rest_inputs()
        };
        let out = solve(&inputs, &SolverConfig::default());
        assert_relative_eq!(out.up, 4.0);
        assert_relative_eq!(out.down, 3.0);
    }

    #[test]
    fn global_scale_is_floored() {
        let inputs = SolverInputs {
            global_scale: -3.0,
            ..rest_inputs()
        };
        let trace = solve_staged(&inputs, &SolverConfig::default());
        assert_eq!(trace.global_scale, 0.001);
        assert_relative_eq!(trace.chain_length, 0.01);
    }

    #[test]
    fn configured_floor_never_drops_below_minimum() {
        let inputs = SolverInputs {
            global_scale: 0.0,
            pole_vec_lock: 1.0,
            pole_vector_transform: Transform4::from_translation(5.0, 3.0, 0.0),
            ..rest_inputs()
        };
        let cfg = SolverConfig {
            min_global_scale: 0.0,
            ..Default::default()
        };
        let trace = solve_staged(&inputs, &cfg);
        assert_eq!(trace.global_scale, MIN_GLOBAL_SCALE);
        assert!(trace.result.is_finite(), "{:?}", trace.result);
    }

    #[test]
    fn gates_use_configured_thresholds() {
        let inputs = SolverInputs {
            stretch: 0.0005,
            end_transform: Transform4::from_translation(20.0, 0.0, 0.0),
            ..rest_inputs()
        };
        let literal = solve(&inputs, &SolverConfig::default());
        assert_eq!(literal, ScalePair::new(5.0, 5.0));

        let eager = SolverConfig {
            stretch_threshold: 0.0,
            ..Default::default()
        };
        let out = solve(&inputs, &eager);
        assert!(out.up > 5.0);
    }

    #[test]
    fn zero_rest_length_on_slide_side_is_not_guarded() {
        let inputs = SolverInputs {
            up_init_length: 0.0,
            slide: 0.5,
            ..rest_inputs()
        };
        let out = solve(&inputs, &SolverConfig::default());
        assert!(!out.is_finite());
    }
}
