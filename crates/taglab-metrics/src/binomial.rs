//! Exact binomial tail probabilities.

fn ln_choose(n: u64, k: u64) -> f64 {
    let k = k.min(n - k);
    (1..=k)
        .map(|i| ((n - k + i) as f64).ln() - (i as f64).ln())
        .sum()
}

/// One-sided upper tail `P(X >= k)` for `X ~ Binomial(n, p)`.
pub fn upper_tail(k: u64, n: u64, p: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > n {
        return 0.0;
    }
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }

    let (lp, lq) = (p.ln(), (1.0 - p).ln());
    let odds = lp - lq;
    // log of P(X = i), stepped from i = k upward
    let mut ln_term = ln_choose(n, k) + k as f64 * lp + (n - k) as f64 * lq;
    let mut tail = 0.0;
    for i in k..=n {
        tail += ln_term.exp();
        if i < n {
            ln_term += ((n - i) as f64).ln() - ((i + 1) as f64).ln() + odds;
        }
    }
    tail.clamp(0.0, 1.0)
}

/// p-value for "successes exceed chance" under a fair 50/50 null.
pub fn one_sided_fair(successes: u64, trials: u64) -> f64 {
    if trials == 0 {
        return 1.0;
    }
    upper_tail(successes, trials, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_four_of_five() {
        assert!(close(one_sided_fair(4, 5), 0.1875));
    }

    #[test]
    fn test_edges() {
        assert_eq!(one_sided_fair(0, 5), 1.0);
        assert_eq!(one_sided_fair(0, 0), 1.0);
        assert!(close(one_sided_fair(5, 5), 1.0 / 32.0));
        assert_eq!(upper_tail(6, 5, 0.5), 0.0);
    }

    #[test]
    fn test_matches_direct_sum() {
        // 15 of 20: (C(20,15)+...+C(20,20)) / 2^20 = 21700 / 1048576
        assert!(close(one_sided_fair(15, 20), 21700.0 / 1_048_576.0));
    }

    #[test]
    fn test_large_n_stays_finite() {
        let p = one_sided_fair(5200, 10_000);
        assert!(p > 0.0 && p < 0.001);
        assert!((one_sided_fair(5000, 10_000) - 0.5).abs() < 0.01);
    }
}
