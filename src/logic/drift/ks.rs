//! Two-sample Kolmogorov-Smirnov test (two-sided)
//!
//! The statistic is the largest gap between the two empirical CDFs. The
//! p-value is exact (lattice path counting) while both samples hold at most
//! `EXACT_MAX_SAMPLES` values, and otherwise comes from the asymptotic
//! Kolmogorov distribution with Stephens' small-sample correction.

use std::cmp::Ordering;

/// Largest sample size for which the exact distribution is used
pub const EXACT_MAX_SAMPLES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Run the test on two unsorted, non-empty samples
pub fn ks_2samp(a: &[f64], b: &[f64]) -> KsResult {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));
    b.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));

    let statistic = ks_statistic(&a, &b);
    let p_value = ks_p_value(statistic, a.len(), b.len());

    KsResult { statistic, p_value }
}

/// Max ECDF distance between two sorted samples. Tied values advance both
/// sides together, so identical samples give exactly 0.
fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let mut i = 0usize;
    let mut j = 0usize;
    let mut d_max = 0.0f64;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d_max = d_max.max((i as f64 / n1 - j as f64 / n2).abs());
    }

    d_max
}

fn ks_p_value(statistic: f64, n1: usize, n2: usize) -> f64 {
    if statistic <= 0.0 || n1 == 0 || n2 == 0 {
        return 1.0;
    }

    if n1.max(n2) <= EXACT_MAX_SAMPLES {
        return exact_p_value(statistic, n1, n2);
    }

    let n_eff = (n1 * n2) as f64 / (n1 + n2) as f64;
    let sqrt_n = n_eff.sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * statistic;
    kolmogorov_survival(lambda)
}

/// P(D >= d) under the null hypothesis.
///
/// Walks the (m, n) lattice from (0, 0) to (m, n) carrying the probability
/// of each uniformly drawn merge order. Points where the ECDF gap reaches
/// `d` are cut, so what arrives at (m, n) is P(D < d).
fn exact_p_value(statistic: f64, m: usize, n: usize) -> f64 {
    let g = gcd(m, n);
    // Gaps are multiples of 1/lcm(m, n); compare in those integer units
    let h = (statistic * (m / g * n) as f64).round() as i64;
    let (step_i, step_j) = ((n / g) as i64, (m / g) as i64);

    let mut previous = vec![0.0f64; n + 1];
    let mut row = vec![0.0f64; n + 1];

    for i in 0..=m {
        for j in 0..=n {
            let mut p = if i == 0 && j == 0 {
                1.0
            } else {
                let remaining = (m + n + 1 - i - j) as f64;
                let mut p = 0.0;
                if i > 0 {
                    p += previous[j] * (m + 1 - i) as f64 / remaining;
                }
                if j > 0 {
                    p += row[j - 1] * (n + 1 - j) as f64 / remaining;
                }
                p
            };
            if (i as i64 * step_i - j as i64 * step_j).abs() >= h {
                p = 0.0;
            }
            row[j] = p;
        }
        std::mem::swap(&mut previous, &mut row);
    }

    (1.0 - previous[n]).clamp(0.0, 1.0)
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Q(λ) = 2 Σ (-1)^(k-1) exp(-2 k² λ²)
fn kolmogorov_survival(lambda: f64) -> f64 {
    let a2 = -2.0 * lambda * lambda;
    let mut sign = 2.0;
    let mut sum = 0.0;
    let mut previous = 0.0f64;

    for k in 1..=100 {
        let k = k as f64;
        let term = sign * (a2 * k * k).exp();
        sum += term;
        if term.abs() <= 0.001 * previous || term.abs() <= 1e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        previous = term.abs();
    }

    // Series does not settle for tiny λ, where Q is 1
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_samples() {
        let sample = [0.1, 0.4, 0.4, 0.9, 2.5, 3.0];
        let result = ks_2samp(&sample, &sample);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_constant_columns() {
        let zeros = [0.0; 20];
        let result = ks_2samp(&zeros, &zeros[..5]);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_disjoint_samples() {
        let reference: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let recent: Vec<f64> = (10..=19).map(|v| v as f64 * 10.0).collect();

        let result = ks_2samp(&reference, &recent);
        assert_eq!(result.statistic, 1.0);
        assert!(result.p_value < 0.001, "p = {}", result.p_value);
    }

    #[test]
    fn test_statistic_with_ties() {
        let a = [1.0, 2.0, 2.0, 3.0];
        let b = [2.0, 2.0, 3.0, 4.0];
        // ECDF gap is largest at x = 1 and x = 3: |0.25 - 0| and |1.0 - 0.75|
        let result = ks_2samp(&a, &b);
        assert!((result.statistic - 0.25).abs() < 1e-12);
        assert!(result.p_value > 0.9);
    }

    #[test]
    fn test_order_insensitive() {
        let a = [5.0, 1.0, 3.0, 2.0, 4.0];
        let b = [2.5, 0.5, 4.5, 1.5, 3.5, 6.0];
        let forward = ks_2samp(&a, &b);
        let backward = ks_2samp(&b, &a);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_exact_small_sample_p_value() {
        let a: Vec<f64> = (0..10).map(|v| v as f64).collect();
        let b: Vec<f64> = (6..16).map(|v| v as f64).collect();

        let result = ks_2samp(&a, &b);
        assert!((result.statistic - 0.6).abs() < 1e-12);
        // Asymptotic value here is 0.031, which would flag the column
        assert!((result.p_value - 0.052448).abs() < 1e-5, "p = {}", result.p_value);
    }

    #[test]
    fn test_exact_unequal_sizes() {
        assert!((exact_p_value(0.5, 5, 6) - 0.357143).abs() < 1e-5);
        // Only the two corner paths reach a full gap: 2 / C(20, 10)
        assert!((exact_p_value(1.0, 10, 10) - 2.0 / 184_756.0).abs() < 1e-12);
    }

    #[test]
    fn test_large_samples_use_asymptotic_distribution() {
        let n = EXACT_MAX_SAMPLES + 1;
        let n_eff = (n * n) as f64 / (2 * n) as f64;
        let lambda = (n_eff.sqrt() + 0.12 + 0.11 / n_eff.sqrt()) * 0.02;
        assert_eq!(ks_p_value(0.02, n, n), kolmogorov_survival(lambda));
    }

    #[test]
    fn test_survival_is_monotone() {
        let mut last = 1.0;
        for step in 1..40 {
            let q = kolmogorov_survival(step as f64 * 0.05);
            assert!(q <= last + 1e-12);
            assert!((0.0..=1.0).contains(&q));
            last = q;
        }
        // Known value: Q(1.0) ≈ 0.27
        assert!((kolmogorov_survival(1.0) - 0.2700).abs() < 1e-3);
    }
}
