use crate::anim::groups::AnimationGroups;
use crate::foundation::error::{SongvidError, SongvidResult};
use crate::foundation::time::{DURATION_EPSILON, Interval};

/// Visible intervals of one animation group.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct GroupSchedule {
    /// Group name.
    pub name: String,
    /// Disjoint intervals in timeline order.
    pub intervals: Vec<Interval>,
}

/// Per-group visibility intervals, in group cycle order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct ScheduleMap {
    entries: Vec<GroupSchedule>,
}

impl ScheduleMap {
    /// Intervals scheduled for `name`, if the group exists.
    pub fn intervals(&self, name: &str) -> Option<&[Interval]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.intervals.as_slice())
    }

    /// Entries in group cycle order.
    pub fn iter(&self) -> std::slice::Iter<'_, GroupSchedule> {
        self.entries.iter()
    }

    /// Return `true` when there are no animation groups.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every interval of every group, sorted by start time.
    pub fn timeline(&self) -> Vec<(&str, Interval)> {
        let mut out: Vec<(&str, Interval)> = self
            .entries
            .iter()
            .flat_map(|e| e.intervals.iter().map(move |&i| (e.name.as_str(), i)))
            .collect();
        out.sort_by(|a, b| a.1.start.total_cmp(&b.1.start));
        out
    }
}

/// Tile `[0, target_duration)` by cycling through `groups` in order.
///
/// Each group gets one interval per cycle; the final interval is clipped to
/// `target_duration`. An empty group set yields an empty map.
pub fn compute_schedule(
    groups: &AnimationGroups,
    target_duration: f64,
) -> SongvidResult<ScheduleMap> {
    if !target_duration.is_finite() || target_duration < 0.0 {
        return Err(SongvidError::validation(format!(
            "target duration must be finite and >= 0, got {target_duration}"
        )));
    }

    let mut entries: Vec<GroupSchedule> = groups
        .iter()
        .map(|g| GroupSchedule {
            name: g.name.clone(),
            intervals: Vec::new(),
        })
        .collect();
    if entries.is_empty() {
        return Ok(ScheduleMap { entries });
    }

    let mut t = 0.0_f64;
    'cycles: loop {
        for (entry, group) in entries.iter_mut().zip(groups.iter()) {
            if t >= target_duration - DURATION_EPSILON {
                break 'cycles;
            }
            let mut end = t + group.duration;
            if end >= target_duration - DURATION_EPSILON {
                end = target_duration;
            }
            if end > t {
                entry.intervals.push(Interval { start: t, end });
            }
            t = end;
        }
    }

    Ok(ScheduleMap { entries })
}

#[cfg(test)]
#[path = "../../tests/unit/plan/schedule.rs"]
mod tests;
