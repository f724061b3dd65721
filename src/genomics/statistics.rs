//! Statistical tests behind the site annotators.
//!
//! Everything here is pure arithmetic over counts or value sets; the
//! annotators decide what goes in and how the result is formatted.

use statrs::function::erf::{erfc, erf_inv};
use statrs::function::factorial::ln_factorial;

/// Smallest p-value before phred scaling, keeps the score finite.
pub const MIN_PVALUE: f64 = 1e-320;

/// Both set sizes at or below this use the exact rank-sum distribution.
pub const EXACT_RANK_SUM_LIMIT: usize = 8;

/// Relative slack when comparing hypergeometric table probabilities.
const FISHER_RELATIVE_ERROR: f64 = 1.0 + 1e-7;

/// `-10 * log10(p)` with `p` floored at [`MIN_PVALUE`]; never `-0.0`.
pub fn phred_scale_p(p: f64) -> f64 {
    0.0 - 10.0 * p.max(MIN_PVALUE).log10()
}

/// Probability from a phred score.
pub fn phred_to_p(phred: f64) -> f64 {
    10f64.powf(-phred / 10.0)
}

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Inverse standard normal CDF, `p` clamped away from 0 and 1.
pub fn normal_quantile(p: f64) -> f64 {
    let p = p.clamp(1e-300, 1.0 - f64::EPSILON);
    std::f64::consts::SQRT_2 * erf_inv(2.0 * p - 1.0)
}

fn ln_choose(n: u64, k: u64) -> f64 {
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

/// Two-sided Fisher exact test on `[[a, b], [c, d]]`.
///
/// Sums the probability of every table with the observed margins that is
/// no more likely than the observed one.
pub fn fisher_exact_two_sided(table: [[u32; 2]; 2]) -> f64 {
    let [[a, b], [c, d]] = table.map(|row| row.map(u64::from));
    let row1 = a + b;
    let row2 = c + d;
    let col1 = a + c;
    let total = row1 + row2;
    if total == 0 {
        return 1.0;
    }

    let ln_denominator = ln_choose(total, col1);
    let prob = |x: u64| (ln_choose(row1, x) + ln_choose(row2, col1 - x) - ln_denominator).exp();

    let observed = prob(a);
    let low = col1.saturating_sub(row2);
    let high = row1.min(col1);
    let p: f64 = (low..=high)
        .map(prob)
        .filter(|&pr| pr <= observed * FISHER_RELATIVE_ERROR)
        .sum();
    p.min(1.0)
}

/// Outcome of a Mann-Whitney rank-sum comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSumResult {
    /// U statistic of the first set; ties count one half.
    pub u: f64,
    /// Signed z-score; negative when the first set ranks lower.
    pub z: f64,
    /// One-sided probability of a U at most this small.
    pub p: f64,
    /// Whether the exact null distribution was used.
    pub exact: bool,
}

/// Mann-Whitney U test of `set1` against `set2`.
///
/// Small samples use the exact distribution of U (mid-p) mapped back onto
/// the normal scale; larger ones use the normal approximation with mean
/// `nm/2` and variance `nm(n+m+1)/12`. `None` when either set is empty.
pub fn mann_whitney_u(set1: &[f64], set2: &[f64]) -> Option<RankSumResult> {
    let (n, m) = (set1.len(), set2.len());
    if n == 0 || m == 0 {
        return None;
    }

    let u: f64 = set1
        .iter()
        .map(|&x| {
            set2.iter()
                .map(|&y| match x.partial_cmp(&y) {
                    Some(std::cmp::Ordering::Greater) => 1.0,
                    Some(std::cmp::Ordering::Equal) => 0.5,
                    _ => 0.0,
                })
                .sum::<f64>()
        })
        .sum();

    if n <= EXACT_RANK_SUM_LIMIT && m <= EXACT_RANK_SUM_LIMIT {
        let distribution = exact_u_distribution(n, m);
        let p: f64 = distribution
            .iter()
            .enumerate()
            .map(|(k, &pr)| {
                let k = k as f64;
                if k < u {
                    pr
                } else if k == u {
                    0.5 * pr
                } else {
                    0.0
                }
            })
            .sum();
        return Some(RankSumResult {
            u,
            z: normal_quantile(p),
            p,
            exact: true,
        });
    }

    let (nf, mf) = (n as f64, m as f64);
    let mean = nf * mf / 2.0;
    let variance = nf * mf * (nf + mf + 1.0) / 12.0;
    let z = (u - mean) / variance.sqrt();
    Some(RankSumResult {
        u,
        z,
        p: normal_cdf(z),
        exact: false,
    })
}

/// Null distribution of U for set sizes `n` and `m`, indexed by U.
fn exact_u_distribution(n: usize, m: usize) -> Vec<f64> {
    // counts[i][j][u]: orderings of i + j values where the first set scores u
    let mut counts: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); m + 1]; n + 1];
    for i in 0..=n {
        for j in 0..=m {
            let mut dist = vec![0.0; i * j + 1];
            if i == 0 || j == 0 {
                dist[0] = 1.0;
            } else {
                // the largest value belongs to set1 (beats all j) or to set2
                for (u, &count) in counts[i - 1][j].iter().enumerate() {
                    dist[u + j] += count;
                }
                for (u, &count) in counts[i][j - 1].iter().enumerate() {
                    dist[u] += count;
                }
            }
            counts[i][j] = dist;
        }
    }
    let mut dist = std::mem::take(&mut counts[n][m]);
    let total: f64 = dist.iter().sum();
    dist.iter_mut().for_each(|c| *c /= total);
    dist
}

/// Exact Hardy-Weinberg equilibrium test on biallelic genotype counts.
///
/// Returns the probability of observing a heterozygote count at most as
/// likely as the observed one; 1 when there is nothing to test.
pub fn hardy_weinberg_p_value(hom_ref: usize, het: usize, hom_var: usize) -> f64 {
    let hom_rare = hom_ref.min(hom_var);
    let hom_common = hom_ref.max(hom_var);
    let genotypes = hom_rare + het + hom_common;
    let rare_copies = 2 * hom_rare + het;
    if genotypes == 0 || rare_copies == 0 {
        return 1.0;
    }

    let mut probs = vec![0.0f64; rare_copies + 1];
    let mut mid = rare_copies * (2 * genotypes - rare_copies) / (2 * genotypes);
    if mid % 2 != rare_copies % 2 {
        mid += 1;
    }
    let mid = mid.min(rare_copies);
    probs[mid] = 1.0;
    let mut sum = 1.0;

    let mut hets = mid;
    let mut rare = (rare_copies - mid) / 2;
    let mut common = genotypes - hets - rare;
    while hets >= 2 {
        let (h, r, c) = (hets as f64, rare as f64, common as f64);
        probs[hets - 2] = probs[hets] * h * (h - 1.0) / (4.0 * (r + 1.0) * (c + 1.0));
        sum += probs[hets - 2];
        hets -= 2;
        rare += 1;
        common += 1;
    }

    let mut hets = mid;
    let mut rare = (rare_copies - mid) / 2;
    let mut common = genotypes - hets - rare;
    while hets + 2 <= rare_copies {
        let (h, r, c) = (hets as f64, rare as f64, common as f64);
        probs[hets + 2] = probs[hets] * 4.0 * r * c / ((h + 2.0) * (h + 1.0));
        sum += probs[hets + 2];
        hets += 2;
        rare = rare.saturating_sub(1);
        common = common.saturating_sub(1);
    }

    let observed = probs.get(het).copied().unwrap_or(0.0);
    let p: f64 = probs
        .iter()
        .filter(|&&pr| pr <= observed * FISHER_RELATIVE_ERROR)
        .sum::<f64>()
        / sum;
    p.min(1.0)
}

/// Inbreeding coefficient `1 - observed_het / expected_het` for a
/// biallelic site.
///
/// Inputs are per-class genotype counts, typically sums of normalised
/// genotype likelihoods so they need not be integral. `None` when no
/// heterozygosity is expected.
pub fn inbreeding_coefficient(hom_ref: f64, het: f64, hom_var: f64) -> Option<f64> {
    let samples = hom_ref + het + hom_var;
    if samples <= 0.0 {
        return None;
    }
    let p = (2.0 * hom_ref + het) / (2.0 * samples);
    let expected_het = 2.0 * p * (1.0 - p) * samples;
    if expected_het <= 0.0 {
        return None;
    }
    Some(1.0 - het / expected_het)
}

/// Convert log10 values into probabilities summing to one.
pub fn normalize_from_log10(log10_values: &[f64]) -> Vec<f64> {
    let max = log10_values
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![0.0; log10_values.len()];
    }
    let raw: Vec<f64> = log10_values.iter().map(|v| 10f64.powf(v - max)).collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|v| v / total).collect()
}
