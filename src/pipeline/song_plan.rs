use crate::anim::groups::{AnimationGroups, resolve_groups};
use crate::config::model::{OverlayDecl, TransitionConfig};
use crate::expr::ffmpeg::TimeVar;
use crate::foundation::error::SongvidResult;
use crate::plan::schedule::{ScheduleMap, compute_schedule};
use crate::plan::strategy::{RenderStrategy, compute_render_strategy};
use crate::visibility::{Visibility, build_visibility};

/// Render plan for one background: strategy, schedule and per-group visibility.
#[derive(Clone, Debug)]
pub struct SongPlan {
    /// Groups in cycle order.
    pub groups: AnimationGroups,
    /// Loop/truncate decision.
    pub strategy: RenderStrategy,
    /// Group intervals.
    pub schedule: ScheduleMap,
    /// Visibility per group, in cycle order.
    pub visibility: Vec<(String, Visibility)>,
}

impl SongPlan {
    /// Visibility for `group`, if it is scheduled.
    pub fn visibility_of(&self, group: &str) -> Option<&Visibility> {
        self.visibility
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, v)| v)
    }

    /// JSON summary with ffmpeg-serialized expressions.
    pub fn to_json(&self) -> serde_json::Value {
        let groups: Vec<serde_json::Value> = self
            .groups
            .iter()
            .map(|g| {
                let vis = self.visibility_of(&g.name);
                serde_json::json!({
                    "name": g.name,
                    "duration_s": g.duration,
                    "intervals": self.schedule.intervals(&g.name).unwrap_or(&[]),
                    "enable": vis.map(|v| v.gate.to_ffmpeg(TimeVar::Lower)),
                    "alpha": vis
                        .and_then(|v| v.alpha.as_ref())
                        .map(|a| a.to_ffmpeg(TimeVar::Lower)),
                })
            })
            .collect();
        serde_json::json!({
            "strategy": self.strategy,
            "cycle_duration_s": self.groups.cycle_duration(),
            "groups": groups,
        })
    }
}

/// Resolve groups, reconcile them against the background and build every group's
/// visibility.
pub fn plan_song(
    overlays: &[OverlayDecl],
    background_duration: f64,
    transitions: &TransitionConfig,
) -> SongvidResult<SongPlan> {
    let groups = resolve_groups(overlays)?;
    let strategy = compute_render_strategy(background_duration, &groups)?;
    let schedule = compute_schedule(&groups, strategy.target_duration)?;
    let visibility = schedule
        .iter()
        .map(|entry| {
            build_visibility(&entry.intervals, transitions.mode, transitions.duration_s)
                .map(|v| (entry.name.clone(), v))
        })
        .collect::<SongvidResult<Vec<_>>>()?;

    Ok(SongPlan {
        groups,
        strategy,
        schedule,
        visibility,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/song_plan.rs"]
mod tests;
