//! Harmonic-series salience of candidate fundamental periods.
//!
//! A candidate period $\tau$ is scored by walking its harmonic series through
//! the SACF. Each harmonic is searched for in a window of
//! $\pm(\tau / 25 + 4)$ lags around the previously found harmonic plus $\tau$,
//! so a single mis-located harmonic doesn't throw off the rest of the walk.
//! A harmonic is accepted when it sits inside the tolerance and rises above
//! the threshold at the base lag.
//!
//! With $A$ the summed amplitude of the accepted harmonics, $n$ their count and
//! $\hat\tau$ the mean of $\text{lag}_k / k$ over them, the salience is
//! $$ S = A \left(\frac{n}{M / \hat\tau}\right)^2 $$
//! where $M$ is the longest lag a series may reach. The second factor rewards
//! series that are as complete as the period allows.

use crate::detector::threshold::ThresholdTable;
use crate::float::Float;
use crate::utils::peak::argmax;

/// One step of a harmonic walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic<T>
where
    T: Float,
{
    /// Harmonic number; the base lag is order 1.
    pub order: usize,
    pub lag: usize,
    pub amplitude: T,
    /// Whether the harmonic passed the position and amplitude tests.
    pub accepted: bool,
}

/// Walk the harmonic series of `base_lag` through `sacf`, up to order
/// `m_max / base_lag`.
///
/// Every visited search-window maximum is returned, accepted or not, starting
/// with the base lag itself (always accepted). The walk stops early if a
/// search window would start beyond the end of `sacf`.
pub fn harmonic_walk<T: Float>(
    sacf: &[T],
    base_lag: usize,
    m_max: usize,
    threshold: T,
) -> Vec<Harmonic<T>> {
    if base_lag == 0 || base_lag >= sacf.len() {
        return vec![];
    }

    let mut series = vec![Harmonic {
        order: 1,
        lag: base_lag,
        amplitude: sacf[base_lag],
        accepted: true,
    }];

    let tolerance = base_lag as f64 / 25.0 + 4.0;
    let mut previous = base_lag;
    for order in 2..=m_max / base_lag {
        let estimate = (previous + base_lag) as f64;
        let start = (estimate - tolerance).max(0.0) as usize;
        let stop = ((estimate + tolerance + 1.0) as usize).min(sacf.len());
        if start >= stop {
            break;
        }

        let exact = match argmax(&sacf[start..stop]) {
            Some(offset) => start + offset,
            None => break,
        };
        let amplitude = sacf[exact];
        let accepted = (exact as f64 - estimate).abs() < tolerance && amplitude > threshold;
        series.push(Harmonic {
            order,
            lag: exact,
            amplitude,
            accepted,
        });
        previous = exact;
    }

    series
}

/// A scored candidate period.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T>
where
    T: Float,
{
    /// Lag of the local maximum the walk started from.
    pub lag: usize,
    /// Period refined from the accepted harmonics, in samples.
    pub period: T,
    pub salience: T,
    /// Number of accepted harmonics, including the base.
    pub harmonics: usize,
}

/// Score a harmonic walk produced by [harmonic_walk].
pub fn score<T: Float>(series: &[Harmonic<T>], m_max: usize) -> Option<Candidate<T>> {
    let base = series.first()?;

    let mut salience = T::zero();
    let mut period_sum = T::zero();
    let mut harmonics = 0;
    for h in series.iter().filter(|h| h.accepted) {
        salience = salience + h.amplitude;
        period_sum =
            period_sum + T::from_usize(h.lag).unwrap() / T::from_usize(h.order).unwrap();
        harmonics += 1;
    }
    if harmonics == 0 {
        return None;
    }

    let count = T::from_usize(harmonics).unwrap();
    let period = period_sum / count;
    let completeness = count / (T::from_usize(m_max).unwrap() / period);

    Some(Candidate {
        lag: base.lag,
        period,
        salience: salience * completeness * completeness,
        harmonics,
    })
}

/// Score every lag in `lags` and sort the candidates by decreasing salience.
/// Candidates with a non-finite salience are dropped.
///
/// Each walk is judged against the threshold at its own base lag.
pub fn rank_candidates<T: Float>(
    sacf: &[T],
    lags: &[usize],
    thresholds: &ThresholdTable<T>,
    m_max: usize,
) -> Vec<Candidate<T>> {
    let mut candidates: Vec<Candidate<T>> = lags
        .iter()
        .filter_map(|&lag| score(&harmonic_walk(sacf, lag, m_max, thresholds.at(lag)), m_max))
        .filter(|c| c.salience.is_finite())
        .collect();
    candidates.sort_by(|a, b| b.salience.total_cmp(&a.salience));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::detector::threshold::AdaptiveThreshold;
    use approx::assert_relative_eq;

    /// Narrow triangular bumps of height `amplitude(k)` at every multiple of
    /// `period`, on a zero background.
    fn comb(len: usize, period: f64, amplitude: impl Fn(usize) -> f64) -> Vec<f64> {
        let mut sacf = vec![0.0; len];
        let mut k = 1;
        while (k as f64 * period) < (len - 3) as f64 {
            let center = (k as f64 * period).round() as usize;
            let a = amplitude(k);
            sacf[center] += a;
            sacf[center - 1] += a / 2.0;
            sacf[center + 1] += a / 2.0;
            k += 1;
        }
        sacf
    }

    #[test]
    fn walk_finds_every_harmonic() {
        let sacf = comb(2100, 200.0, |_| 1.0);
        let series = harmonic_walk(&sacf, 200, 2048, 0.1);
        assert_eq!(series.len(), 10);
        for (i, h) in series.iter().enumerate() {
            assert_eq!(h.order, i + 1);
            assert_eq!(h.lag, 200 * (i + 1));
            assert!(h.accepted);
        }
    }

    #[test]
    fn walk_steps_from_previous_find() {
        // Harmonics drift by one lag per order, as with a slightly long period.
        let mut sacf = vec![0.0; 1000];
        for (k, lag) in [100, 201, 302, 403, 504, 605, 706, 807, 908].iter().enumerate() {
            sacf[*lag] = 1.0 / (k + 1) as f64;
        }
        let series = harmonic_walk(&sacf, 100, 900, 0.01);
        let lags: Vec<usize> = series.iter().map(|h| h.lag).collect();
        assert_eq!(lags, vec![100, 201, 302, 403, 504, 605, 706, 807, 908]);
        assert!(series.iter().all(|h| h.accepted));
    }

    #[test]
    fn weak_harmonics_are_visited_but_not_accepted() {
        let sacf = comb(2100, 200.0, |k| if k == 3 { 0.05 } else { 1.0 });
        let series = harmonic_walk(&sacf, 200, 2048, 0.1);
        assert_eq!(series.len(), 10);
        assert_eq!(series[2].lag, 600);
        assert!(!series[2].accepted);
        assert_eq!(series.iter().filter(|h| h.accepted).count(), 9);
    }

    #[test]
    fn walk_stops_at_end_of_sacf() {
        let sacf = comb(700, 200.0, |_| 1.0);
        let series = harmonic_walk(&sacf, 200, 2048, 0.1);
        assert_eq!(series.iter().map(|h| h.lag).collect::<Vec<_>>(), vec![200, 400, 600]);
        assert!(harmonic_walk(&sacf, 0, 2048, 0.1).is_empty());
        assert!(harmonic_walk(&sacf, 700, 2048, 0.1).is_empty());
    }

    #[test]
    fn complete_series_score() {
        let sacf = comb(2100, 200.0, |_| 1.0);
        let candidate = score(&harmonic_walk(&sacf, 200, 2048, 0.1), 2048).unwrap();
        assert_eq!(candidate.lag, 200);
        assert_eq!(candidate.harmonics, 10);
        assert_relative_eq!(candidate.period, 200.0, epsilon = 1e-9);
        let completeness = 10.0 / (2048.0 / 200.0);
        assert_relative_eq!(
            candidate.salience,
            10.0 * completeness * completeness,
            epsilon = 1e-9
        );
    }

    #[test]
    fn missing_harmonics_lower_the_score() {
        let full = comb(2100, 200.0, |_| 1.0);
        let gappy = comb(2100, 200.0, |k| if k % 2 == 0 { 0.0 } else { 1.0 });
        let full = score(&harmonic_walk(&full, 200, 2048, 0.1), 2048).unwrap();
        let gappy = score(&harmonic_walk(&gappy, 200, 2048, 0.1), 2048).unwrap();
        assert!(gappy.harmonics < full.harmonics);
        assert!(gappy.salience < full.salience / 4.0);
    }

    #[test]
    fn true_period_beats_its_multiples() {
        let sacf = comb(2100, 200.0, |k| (-0.0005 * 200.0 * k as f64).exp());
        let thresholds = AdaptiveThreshold::new(&DetectorConfig::default()).table(&sacf);
        let ranked = rank_candidates(&sacf, &[200, 400, 600], &thresholds, 2048);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].lag, 200);
        assert!(ranked[0].salience > ranked[1].salience);
        assert!(ranked[1].salience >= ranked[2].salience);
    }

    #[test]
    fn nan_salience_is_dropped() {
        let mut sacf = comb(2100, 200.0, |_| 1.0);
        sacf[600] = f64::NAN;
        let thresholds = AdaptiveThreshold::new(&DetectorConfig::default()).table(&sacf);
        let ranked = rank_candidates(&sacf, &[200, 400, 600], &thresholds, 2048);
        assert!(!ranked.is_empty());
        assert!(ranked.iter().all(|c| c.salience.is_finite()));
        assert!(ranked.iter().all(|c| c.lag != 600));
    }
}
