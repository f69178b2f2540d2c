//! Scalar helpers for frame-rate independent smoothing.

/// Critically damped approach of `current` toward `target`.
///
/// `velocity` carries the rate of change between calls and must be kept by
/// the caller. `smooth_time` is roughly the time to cover the distance; the
/// result never overshoots `target`.
#[must_use]
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;

    // Pade approximation of exp(-omega * dt)
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let output = target + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        *velocity = 0.0;
        return target;
    }

    output
}

/// Returns `true` when `a` and `b` differ by at most `epsilon`.
#[must_use]
pub fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}
