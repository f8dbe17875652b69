//! Bucket-interval resolution for numeric histograms.
//!
//! Linear "nice" ticks: tick spacing is 1, 2 or 5 times a power of ten, and
//! the domain is widened to whole multiples of that spacing. The resolved
//! spacing becomes the rounding interval that buckets values into bars.

/// Resolved histogram layout for one display range
#[derive(Debug, Clone, PartialEq)]
pub struct BucketResolution {
    /// Widened domain; its ends are the first and last tick
    pub extent: (f64, f64),
    /// Tick spacing, used as the rounding interval
    pub interval: f64,
    pub ticks: Vec<f64>,
}

/// Largest integer scale tried when snapping fractional steps
const MAX_INTEGER_SCALE: f64 = 1e15;

/// Tick spacing giving roughly `count` ticks over `[lo, hi]`
pub fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let count = count.max(1) as f64;
    let span = hi - lo;
    let mut step = 10f64.powf((span / count).log10().floor());
    let err = count / span * step;

    if err <= 0.15 {
        step *= 10.0;
    } else if err <= 0.35 {
        step *= 5.0;
    } else if err <= 0.75 {
        step *= 2.0;
    }
    step
}

/// Widen `[lo, hi]` outwards to multiples of the tick step.
///
/// Applied twice since the first widening can change the step.
pub fn nice_domain(lo: f64, hi: f64, count: usize) -> (f64, f64) {
    let mut domain = (lo, hi);
    for _ in 0..2 {
        let step = tick_step(domain.0, domain.1, count);
        if !(step > 0.0 && step.is_finite()) {
            break;
        }
        domain = (
            (domain.0 / step).floor() * step,
            (domain.1 / step).ceil() * step,
        );
    }
    domain
}

/// Power of ten that turns `step` into an integer
fn integer_scale(step: f64) -> f64 {
    let mut k = 1.0;
    while (step * k) % 1.0 != 0.0 && k < MAX_INTEGER_SCALE {
        k *= 10.0;
    }
    k
}

/// Tick values inside `[lo, hi]`, endpoints included when they fall on the grid
pub fn ticks(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    let step = tick_step(lo, hi, count);
    if !(step > 0.0 && step.is_finite()) {
        return vec![lo];
    }
    let start = (lo / step).ceil() * step;
    let stop = (hi / step).floor() * step + step * 0.5;

    // Walk in integer units to keep accumulated error out of the ticks
    let k = integer_scale(step);
    let (start, stop, step) = (start * k, stop * k, step * k);
    let mut out = Vec::new();
    let mut i = 0.0;
    loop {
        let j = start + step * i;
        if j >= stop {
            break;
        }
        out.push(j / k);
        i += 1.0;
    }
    out
}

/// Make an arbitrary `[min, max]` usable as a tick domain
fn sanitize_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if lo == hi {
        let pad = (lo.abs() * 0.1).max(1.0);
        return (lo - pad, hi + pad);
    }
    (lo, hi)
}

/// Resolve the histogram extent and bucket interval for a display range
pub fn resolve_buckets(min: f64, max: f64, count: usize) -> BucketResolution {
    let (lo, hi) = sanitize_range(min, max);
    let (lo, hi) = nice_domain(lo, hi, count);
    BucketResolution {
        extent: (lo, hi),
        interval: tick_step(lo, hi, count),
        ticks: ticks(lo, hi, count),
    }
}

/// Round to the nearest multiple of `interval`, halves rounding up
pub fn round_to(value: f64, interval: f64) -> f64 {
    if interval <= 0.0 || !interval.is_finite() {
        return value;
    }
    (value / interval + 0.5).floor() * interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_step_is_nice() {
        assert_eq!(tick_step(0.0, 100.0, 10), 10.0);
        assert_eq!(tick_step(0.0, 1.0, 10), 0.1);
        assert_eq!(tick_step(0.0, 100.0, 40), 2.0);
        assert_eq!(tick_step(-3.0, 7.0, 40), 0.2);
    }

    #[test]
    fn test_resolve_common_range() {
        let res = resolve_buckets(0.0, 97.3, 40);
        assert_eq!(res.interval, 2.0);
        assert_eq!(res.extent, (0.0, 98.0));
        assert_eq!(res.ticks.len(), 50);
        assert_eq!(res.ticks[1] - res.ticks[0], res.interval);
    }

    #[test]
    fn test_extent_contains_input() {
        for (min, max) in [(-13.7, 42.1), (0.001, 0.0093), (1e6, 3.3e6), (-5.0, -4.2)] {
            let res = resolve_buckets(min, max, 40);
            let slack = res.interval * 1e-9;
            assert!(res.extent.0 <= min + slack, "{:?} for {}..{}", res.extent, min, max);
            assert!(res.extent.1 >= max - slack, "{:?} for {}..{}", res.extent, min, max);
            assert!(res.interval > 0.0);
        }
    }

    #[test]
    fn test_fractional_ticks_are_clean() {
        let res = resolve_buckets(0.0, 1.0, 10);
        assert_eq!(res.ticks[3], 0.3);
        assert_eq!(res.extent, (0.0, 1.0));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(resolve_buckets(-2.5, 18.0, 40), resolve_buckets(-2.5, 18.0, 40));
    }

    #[test]
    fn test_degenerate_range() {
        let res = resolve_buckets(5.0, 5.0, 40);
        assert!(res.interval > 0.0);
        assert!(res.extent.0 < 5.0 && res.extent.1 > 5.0);

        let zero = resolve_buckets(0.0, 0.0, 40);
        assert!(zero.interval > 0.0);
        assert!(zero.extent.0 <= -1.0 && zero.extent.1 >= 1.0);
    }

    #[test]
    fn test_reversed_and_non_finite_ranges() {
        assert_eq!(resolve_buckets(10.0, 0.0, 40), resolve_buckets(0.0, 10.0, 40));
        let res = resolve_buckets(f64::NAN, 3.0, 40);
        assert_eq!(res.extent, (0.0, 1.0));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(3.9, 2.0), 4.0);
        assert_eq!(round_to(3.0, 2.0), 4.0);
        assert_eq!(round_to(2.9, 2.0), 2.0);
        assert_eq!(round_to(-3.0, 2.0), -2.0);
        assert_eq!(round_to(7.0, 0.0), 7.0);
    }
}
