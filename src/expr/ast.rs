/// Expression over a single time variable `t` (seconds).
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// Constant value.
    Const {
        /// The value.
        value: f64,
    },
    /// `1` for `t` in `[start, end)`, `0` elsewhere.
    Window {
        /// Inclusive start.
        start: f64,
        /// Exclusive end.
        end: f64,
    },
    /// Unclamped straight line through `(t0, v0)` and `(t1, v1)`.
    Ramp {
        /// Time of `v0`.
        t0: f64,
        /// Time of `v1`.
        t1: f64,
        /// Value at `t0`.
        v0: f64,
        /// Value at `t1`.
        v1: f64,
    },
    /// First segment whose `[start, end)` contains `t`, else `otherwise`.
    Piecewise {
        /// Segments, tested in order.
        segments: Vec<Segment>,
        /// Fallback outside every segment.
        otherwise: Box<Expr>,
    },
    /// Maximum over all terms (`0` when empty).
    Max {
        /// Terms.
        terms: Vec<Expr>,
    },
    /// `1` when any term is positive, else `0`.
    Any {
        /// Terms.
        terms: Vec<Expr>,
    },
}

/// One half-open piece of a [`Expr::Piecewise`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Segment {
    /// Inclusive start.
    pub start: f64,
    /// Exclusive end.
    pub end: f64,
    /// Value inside the segment.
    pub expr: Expr,
}

impl Expr {
    /// Constant expression.
    pub fn constant(value: f64) -> Self {
        Self::Const { value }
    }

    /// Boolean window `[start, end)`.
    pub fn window(start: f64, end: f64) -> Self {
        Self::Window { start, end }
    }

    /// Linear ramp through `(t0, v0)` and `(t1, v1)`.
    pub fn ramp(t0: f64, t1: f64, v0: f64, v1: f64) -> Self {
        Self::Ramp { t0, t1, v0, v1 }
    }

    /// Max-of; collapses to the single term or `0`.
    pub fn max_of(mut terms: Vec<Expr>) -> Self {
        match terms.len() {
            0 => Self::constant(0.0),
            1 => terms.remove(0),
            _ => Self::Max { terms },
        }
    }

    /// Logical OR; an empty list is always false.
    pub fn any_of(terms: Vec<Expr>) -> Self {
        if terms.is_empty() {
            return Self::constant(0.0);
        }
        Self::Any { terms }
    }

    /// Evaluate at time `t`.
    pub fn eval(&self, t: f64) -> f64 {
        match self {
            Self::Const { value } => *value,
            Self::Window { start, end } => {
                if *start <= t && t < *end {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Ramp { t0, t1, v0, v1 } => {
                let span = t1 - t0;
                if span == 0.0 {
                    return *v1;
                }
                v0 + (v1 - v0) * (t - t0) / span
            }
            Self::Piecewise {
                segments,
                otherwise,
            } => segments
                .iter()
                .find(|s| s.start <= t && t < s.end)
                .map(|s| s.expr.eval(t))
                .unwrap_or_else(|| otherwise.eval(t)),
            Self::Max { terms } => terms
                .iter()
                .map(|e| e.eval(t))
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
                .unwrap_or(0.0),
            Self::Any { terms } => {
                if terms.iter().any(|e| e.eval(t) > 0.0) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + match self {
            Self::Const { .. } | Self::Window { .. } | Self::Ramp { .. } => 0,
            Self::Piecewise {
                segments,
                otherwise,
            } => segments.iter().map(|s| s.expr.node_count()).sum::<usize>() + otherwise.node_count(),
            Self::Max { terms } | Self::Any { terms } => terms.iter().map(Expr::node_count).sum(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expr/ast.rs"]
mod tests;
