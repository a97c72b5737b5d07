/// Population mechanics: capacity derivation and the logistic recurrence.

/// Smallest value of an iterator, `+inf` when empty.
#[inline]
pub fn min_or_inf<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().fold(f64::INFINITY, f64::min)
}

/// Effective carrying capacity: min(resource limit, prey limit, explicit cap).
#[inline]
pub fn capacity(resource_limit: f64, prey_limit: f64, explicit: Option<f64>) -> f64 {
    resource_limit
        .min(prey_limit)
        .min(explicit.unwrap_or(f64::INFINITY))
}

/// One logistic step N' = N + rN(K - N)/K.
///
/// `K = 0` holds the population at `N`. `K = +inf` degenerates to the
/// exponential step `N + rN`.
#[inline]
pub fn logistic(n: f64, r: f64, k: f64) -> f64 {
    if k == 0.0 {
        n
    } else if k.is_infinite() {
        n + r * n
    } else {
        n + r * n * ((k - n) / k)
    }
}

/// Remove predation loss and clamp at zero.
#[inline]
pub fn after_predation(n: f64, loss: f64) -> f64 {
    (n - loss).max(0.0)
}
