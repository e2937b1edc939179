use std::collections::BTreeMap;

use crate::config::model::OverlayDecl;
use crate::foundation::error::{SongvidError, SongvidResult};
use crate::foundation::time::{approx_eq, ensure_positive_duration};

/// A named set of overlays sharing one on-screen duration.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AnimationGroup {
    /// Unique group name.
    pub name: String,
    /// On-screen duration in seconds.
    pub duration: f64,
}

/// Animation groups in first-declaration order.
///
/// The order is the cycle order used by the schedule generator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationGroups {
    groups: Vec<AnimationGroup>,
    index: BTreeMap<String, usize>,
}

impl AnimationGroups {
    /// Build from `(name, duration)` pairs, applying the same consistency rules as
    /// [`resolve_groups`].
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> SongvidResult<Self> {
        let mut out = Self::default();
        for (name, duration) in pairs {
            out.declare(name, duration)?;
        }
        Ok(out)
    }

    fn declare(&mut self, name: &str, duration: f64) -> SongvidResult<()> {
        let duration = ensure_positive_duration(&format!("group '{name}' duration"), duration)?;
        match self.index.get(name) {
            Some(&i) => {
                let first = self.groups[i].duration;
                if !approx_eq(first, duration) {
                    return Err(SongvidError::ConfigurationInconsistency {
                        group: name.to_owned(),
                        first,
                        second: duration,
                    });
                }
            }
            None => {
                self.index.insert(name.to_owned(), self.groups.len());
                self.groups.push(AnimationGroup {
                    name: name.to_owned(),
                    duration,
                });
            }
        }
        Ok(())
    }

    /// Groups in cycle order.
    pub fn iter(&self) -> std::slice::Iter<'_, AnimationGroup> {
        self.groups.iter()
    }

    /// Look up a group by name.
    pub fn get(&self, name: &str) -> Option<&AnimationGroup> {
        self.index.get(name).map(|&i| &self.groups[i])
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Return `true` when no overlay is grouped.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// One full pass through every group, in seconds.
    pub fn cycle_duration(&self) -> f64 {
        self.groups.iter().map(|g| g.duration).sum()
    }
}

impl<'a> IntoIterator for &'a AnimationGroups {
    type Item = &'a AnimationGroup;
    type IntoIter = std::slice::Iter<'a, AnimationGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Collect animation groups from overlay declarations.
///
/// Ungrouped declarations are skipped. A grouped declaration must carry a duration, and every
/// declaration of a group must agree with the first one.
pub fn resolve_groups(decls: &[OverlayDecl]) -> SongvidResult<AnimationGroups> {
    let mut out = AnimationGroups::default();
    for (i, decl) in decls.iter().enumerate() {
        let Some(name) = decl.group.as_deref() else {
            continue;
        };
        let duration = decl.duration_s.ok_or_else(|| {
            SongvidError::validation(format!(
                "overlays[{i}] belongs to group '{name}' but has no duration_s"
            ))
        })?;
        out.declare(name, duration)?;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/anim/groups.rs"]
mod tests;
