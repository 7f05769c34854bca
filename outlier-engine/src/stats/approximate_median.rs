//! Single-pass approximate median.
//!
//! Tournament-of-triplets refinement after Battiato et al., "An Efficient
//! Algorithm for the Approximate Median Selection Problem". Each pass reorders
//! local triplets so smaller values drift to lower indices and larger values to
//! higher ones; after `round(cbrt(N))` passes the central element is taken as
//! the estimate.

/// Upper bound on Newton iterations in [`nth_root`].
const MAX_ROOT_ITERATIONS: usize = 200;

/// Estimate the median of `values` without sorting them.
///
/// The slice is reordered in place; its contents as a multiset are unchanged.
/// The returned value is always one of the input values. Returns `None` for an
/// empty slice.
///
/// # Example
///
/// ```
/// use outlier_engine::stats::approximate_median;
///
/// let mut pool = vec![10.0, 11.0, 12.0, 13.0, 12.0, 11.0];
/// assert_eq!(approximate_median(&mut pool), Some(12.0));
/// ```
pub fn approximate_median(values: &mut [f64]) -> Option<f64> {
    let size = values.len();
    if size == 0 {
        return None;
    }

    let passes = nth_root(size as f64, 3).round() as usize;
    let mut step: usize = 1;

    for _ in 0..passes {
        let mut i = (step - 1) / 2;
        if i >= size {
            break;
        }
        while i < size {
            triplet_adjust(values, i, step);
            i = i.saturating_add(step.saturating_mul(3));
        }
        step = step.saturating_mul(3);
    }

    Some(values[(size - 1) / 2])
}

// Compares positions `i`, `i + step` and `i + 2`. The third offset does not
// scale with `step`; it is kept as observed in the deployed estimator.
fn triplet_adjust(values: &mut [f64], i: usize, step: usize) {
    let size = values.len();
    let j = i + step;
    let k = i + 2;

    if i + 1 >= size || j + 1 >= size {
        return;
    }

    if values[i] < values[j] {
        if values[k] < values[i] {
            values.swap(i, j);
        } else if values[k] < values[j] {
            values.swap(j, k);
        }
    } else if values[i] < values[k] {
        values.swap(i, j);
    } else if values[k] > values[j] {
        values.swap(j, k);
    }
}

/// The `n`-th root of `a` by Newton's fixed-point iteration.
///
/// Returns 0 for non-positive `a`.
pub fn nth_root(a: f64, n: u32) -> f64 {
    if a <= 0.0 || n == 0 {
        return 0.0;
    }

    let n1 = n - 1;
    let n1f = n1 as f64;
    let rn = 1.0 / n as f64;
    let mut x = 1.0_f64;

    for _ in 0..MAX_ROOT_ITERATIONS {
        // t2 = a / x^(n-1), by square-and-multiply
        let mut potx = 1.0 / x;
        let mut t2 = a;
        let mut b = n1;
        while b > 0 {
            if b & 1 == 1 {
                t2 *= potx;
            }
            potx *= potx;
            b >>= 1;
        }

        let x0 = x;
        x = rn * (n1f * x + t2);
        if (x - x0).abs() * 1e15 < x {
            break;
        }
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random values for property checks.
    fn lcg_values(seed: u64, len: usize) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                ((state >> 33) % 10_000) as f64 / 100.0
            })
            .collect()
    }

    #[test]
    fn empty_input_has_no_estimate() {
        assert_eq!(approximate_median(&mut []), None);
    }

    #[test]
    fn single_value_is_its_own_median() {
        assert_eq!(approximate_median(&mut [4.2]), Some(4.2));
    }

    #[test]
    fn small_inputs() {
        assert_eq!(approximate_median(&mut [1.0, 2.0, 3.0]), Some(2.0));
        // Too short for any triplet: the central position is returned as is.
        assert_eq!(approximate_median(&mut [3.0, 1.0]), Some(3.0));
    }

    #[test]
    fn baseline_pool_estimates() {
        let mut pool = vec![10.0, 11.0, 12.0, 13.0, 12.0, 11.0];
        assert_eq!(approximate_median(&mut pool), Some(12.0));

        pool.extend_from_slice(&[10.0, 11.0, 12.0, 11.0, 13.0, 19.0]);
        assert_eq!(approximate_median(&mut pool), Some(11.0));
    }

    #[test]
    fn sorted_input_pins_observed_offsets() {
        // With a geometrically consistent third offset (i + 2*step) the
        // second pass would leave this sorted run alone and return 5.
        let mut values: Vec<f64> = (1..=9).map(f64::from).collect();
        assert_eq!(approximate_median(&mut values), Some(4.0));
        assert_eq!(values, vec![1.0, 2.0, 3.0, 5.0, 4.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn result_is_always_an_input_element() {
        for (seed, len) in [(1, 1), (2, 2), (3, 7), (4, 27), (5, 100), (6, 1000), (7, 4096)] {
            let input = lcg_values(seed, len);
            let mut work = input.clone();
            let estimate = approximate_median(&mut work).unwrap();
            assert!(input.contains(&estimate), "seed {} len {}", seed, len);
        }
    }

    #[test]
    fn reordering_preserves_contents() {
        let input = lcg_values(42, 500);
        let mut work = input.clone();
        approximate_median(&mut work);

        let mut a = input;
        let mut b = work;
        a.sort_by(f64::total_cmp);
        b.sort_by(f64::total_cmp);
        assert_eq!(a, b);
    }

    #[test]
    fn large_input_terminates() {
        let mut values = lcg_values(9, 200_000);
        assert!(approximate_median(&mut values).is_some());
    }

    #[test]
    fn nth_root_converges() {
        assert!((nth_root(27.0, 3) - 3.0).abs() < 1e-12);
        assert!((nth_root(1000.0, 3) - 10.0).abs() < 1e-12);
        assert!((nth_root(2.0, 3) - 1.259_921_049_894_873).abs() < 1e-12);
        assert!((nth_root(16.0, 4) - 2.0).abs() < 1e-12);
        assert_eq!(nth_root(1.0, 3), 1.0);
        assert_eq!(nth_root(0.0, 3), 0.0);
    }
}
