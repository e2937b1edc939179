use crate::anim::groups::AnimationGroups;
use crate::foundation::error::{SongvidError, SongvidResult};
use crate::foundation::time::{DURATION_EPSILON, TRUNCATION_REPORT_THRESHOLD, approx_eq};

/// How the background clip is stretched or cut to fit whole animation cycles.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct RenderStrategy {
    /// Length of the enhanced background in seconds.
    pub target_duration: f64,
    /// Repeat the background until it reaches `target_duration`.
    pub loop_base: bool,
    /// Seconds dropped from the end of the background.
    pub truncate_amount: f64,
}

impl RenderStrategy {
    /// Return `true` when the dropped tail is large enough to be worth reporting.
    pub fn reports_truncation(&self) -> bool {
        self.truncate_amount > TRUNCATION_REPORT_THRESHOLD
    }
}

/// Decide loop / truncate / exact fit for a background of `background_duration` seconds.
///
/// A cycle never ends mid-way: short backgrounds are looped up to one full cycle and long
/// backgrounds are cut down to the largest whole number of cycles.
pub fn compute_render_strategy(
    background_duration: f64,
    groups: &AnimationGroups,
) -> SongvidResult<RenderStrategy> {
    if !background_duration.is_finite() || background_duration < 0.0 {
        return Err(SongvidError::validation(format!(
            "background duration must be finite and >= 0, got {background_duration}"
        )));
    }

    let b = background_duration;
    let c = groups.cycle_duration();

    if c == 0.0 {
        return Ok(RenderStrategy {
            target_duration: b,
            loop_base: false,
            truncate_amount: 0.0,
        });
    }

    if approx_eq(b, c) {
        return Ok(RenderStrategy {
            target_duration: c,
            loop_base: false,
            truncate_amount: 0.0,
        });
    }

    if b < c {
        return Ok(RenderStrategy {
            target_duration: c,
            loop_base: true,
            truncate_amount: 0.0,
        });
    }

    let mut full_cycles = (b / c).floor().max(1.0);
    // `b / c` can land one ulp under an integer when `b` is a whole number of cycles.
    if b - (full_cycles + 1.0) * c >= -DURATION_EPSILON {
        full_cycles += 1.0;
    }
    let target_duration = full_cycles * c;

    Ok(RenderStrategy {
        target_duration,
        loop_base: false,
        truncate_amount: (b - target_duration).max(0.0),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/plan/strategy.rs"]
mod tests;
