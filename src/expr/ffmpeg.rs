use std::fmt::Write as _;

use crate::expr::ast::Expr;

/// Time variable name inside ffmpeg filters.
///
/// Most filters (`drawtext`, `overlay`) expose the timestamp as `t`; `geq` uses `T`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeVar {
    /// Lower-case `t`.
    Lower,
    /// Upper-case `T` (`geq`).
    Upper,
}

impl TimeVar {
    fn as_str(self) -> &'static str {
        match self {
            Self::Lower => "t",
            Self::Upper => "T",
        }
    }
}

impl Expr {
    /// Serialize to ffmpeg expression syntax.
    pub fn to_ffmpeg(&self, var: TimeVar) -> String {
        let mut out = String::new();
        write_expr(&mut out, self, var.as_str());
        out
    }
}

fn write_expr(out: &mut String, e: &Expr, t: &str) {
    match e {
        Expr::Const { value } => out.push_str(&num(*value)),
        Expr::Window { start, end } => {
            let _ = write!(out, "gte({t},{})*lt({t},{})", num(*start), num(*end));
        }
        Expr::Ramp { t0, t1, v0, v1 } => {
            let span = t1 - t0;
            if span == 0.0 {
                out.push_str(&num(*v1));
                return;
            }
            let _ = write!(
                out,
                "({}+{}*({t}-{})/{})",
                num(*v0),
                num(v1 - v0),
                num(*t0),
                num(span)
            );
        }
        Expr::Piecewise {
            segments,
            otherwise,
        } => {
            // Nest from the last segment outwards so the first segment is tested first.
            let mut tail = String::new();
            write_expr(&mut tail, otherwise, t);
            for s in segments.iter().rev() {
                let mut body = String::new();
                write_expr(&mut body, &s.expr, t);
                tail = format!(
                    "if(gte({t},{})*lt({t},{}),{body},{tail})",
                    num(s.start),
                    num(s.end)
                );
            }
            out.push_str(&tail);
        }
        Expr::Max { terms } => write_max(out, terms, t),
        Expr::Any { terms } => {
            out.push_str("gt(");
            write_max(out, terms, t);
            out.push_str(",0)");
        }
    }
}

/// Balanced `max` tree; nesting depth is logarithmic in the number of terms.
fn write_max(out: &mut String, terms: &[Expr], t: &str) {
    match terms {
        [] => out.push('0'),
        [only] => write_expr(out, only, t),
        _ => {
            let (left, right) = terms.split_at(terms.len() / 2);
            out.push_str("max(");
            write_max(out, left, t);
            out.push(',');
            write_max(out, right, t);
            out.push(')');
        }
    }
}

/// Fixed-point number without trailing zeros; negatives are parenthesized so they can follow
/// a binary operator.
fn num(v: f64) -> String {
    let mut s = format!("{v:.6}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_owned();
    }
    if s.starts_with('-') {
        format!("({s})")
    } else {
        s
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expr/ffmpeg.rs"]
mod tests;
