//! Render planning: reconcile the background against the animation cycle, then lay the cycle
//! out on the timeline.

pub(crate) mod schedule;
pub(crate) mod strategy;
