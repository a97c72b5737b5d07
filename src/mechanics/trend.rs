/// Trend mechanics: tail window and mean first difference.

/// Number of trailing first differences inspected for a series of `len` rows:
/// ceil(10% of len), never more than the `len - 1` differences that exist.
#[inline]
pub fn tail_window(len: usize) -> usize {
    len.div_ceil(10).min(len.saturating_sub(1))
}

/// Mean of the last `window` first differences of `series`.
/// `None` when the series has no differences to look at.
pub fn mean_tail_diff(series: &[f64], window: usize) -> Option<f64> {
    let window = window.min(series.len().saturating_sub(1));
    if window == 0 {
        return None;
    }
    let tail = &series[series.len() - window - 1..];
    let sum: f64 = tail.windows(2).map(|w| w[1] - w[0]).sum();
    Some(sum / window as f64)
}
