//! Overlay visibility: on/off gates and fade curves built from a group's schedule.

use crate::expr::ast::{Expr, Segment};
use crate::foundation::error::{SongvidError, SongvidResult};
use crate::foundation::time::Interval;

/// How overlays appear and disappear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    /// Instant show/hide.
    #[default]
    Cut,
    /// Linear opacity ramps at both ends of every interval.
    Fade,
}

/// Time-domain visibility of one animation group.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Visibility {
    /// `1` while the group is scheduled, `0` otherwise.
    pub gate: Expr,
    /// Opacity in `[0, 1]`; only present for fades.
    pub alpha: Option<Expr>,
}

/// Build the gate and (for fades) alpha expressions for a group's intervals.
///
/// Each interval fades in over `transition_duration`, holds, then fades out. Intervals shorter
/// than two transitions produce a triangular pulse peaking at the midpoint. A zero-length fade
/// is a cut.
pub fn build_visibility(
    intervals: &[Interval],
    mode: TransitionMode,
    transition_duration: f64,
) -> SongvidResult<Visibility> {
    if !transition_duration.is_finite() || transition_duration < 0.0 {
        return Err(SongvidError::validation(format!(
            "transition duration must be finite and >= 0, got {transition_duration}"
        )));
    }

    let gate = Expr::any_of(
        intervals
            .iter()
            .map(|i| Expr::window(i.start, i.end))
            .collect(),
    );

    let alpha = match mode {
        TransitionMode::Fade if transition_duration > 0.0 => Some(Expr::max_of(
            intervals
                .iter()
                .map(|&i| fade_pulse(i, transition_duration))
                .collect(),
        )),
        TransitionMode::Fade | TransitionMode::Cut => None,
    };

    Ok(Visibility { gate, alpha })
}

fn fade_pulse(i: Interval, d: f64) -> Expr {
    let mid = i.midpoint();
    let rise_end = (i.start + d).min(mid);
    let fall_start = (i.end - d).max(mid);

    let mut segments = vec![Segment {
        start: i.start,
        end: rise_end,
        expr: Expr::ramp(i.start, i.start + d, 0.0, 1.0),
    }];
    if fall_start > rise_end {
        segments.push(Segment {
            start: rise_end,
            end: fall_start,
            expr: Expr::constant(1.0),
        });
    }
    segments.push(Segment {
        start: fall_start,
        end: i.end,
        expr: Expr::ramp(i.end - d, i.end, 1.0, 0.0),
    });

    Expr::Piecewise {
        segments,
        otherwise: Box::new(Expr::constant(0.0)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/visibility/build.rs"]
mod tests;
