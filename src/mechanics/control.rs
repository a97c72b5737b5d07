/// Control mechanics: fixed-step nudges inside a band.

/// Signed step: x' = x + k * direction, then floored at `lo` and capped at `hi`.
///
/// Cap wins over floor when they cross, so `lo > hi` yields `hi`.
#[inline]
pub fn nudge(x: f64, direction: f64, k: f64, lo: f64, hi: f64) -> f64 {
    (x + k * direction).max(lo).min(hi)
}

/// Keep `x` inside `[lo, hi]` without stepping.
#[inline]
pub fn bound(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}
