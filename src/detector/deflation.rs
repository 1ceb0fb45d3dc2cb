//! Removing an accepted pitch's harmonic footprint from the SACF.
//!
//! The amplitudes of the accepted, positive harmonics along the winner's
//! series are fitted with an exponential envelope. Each harmonic peak in the
//! deflation scope, bracketed by its nearest local
//! minima, is then scaled by `1 - min(1, envelope / peak) * window`, with a
//! Tukey window spanning the bracket. Peaks that stand above the envelope keep
//! the excess, which may belong to another pitch sharing that lag.

use log::trace;

use crate::config::DeflationScope;
use crate::detector::sacf::Sacf;
use crate::detector::salience::{harmonic_walk, Harmonic};
use crate::float::Float;
use crate::utils::peak::peak_bounds;
use crate::utils::stats::{fit_exponential, Envelope};
use crate::utils::window::tukey;

/// Amplitudes are raised to this before taking their logarithm.
const AMPLITUDE_FLOOR: f64 = 1e-10;

/// What a deflation round removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Deflation<T>
where
    T: Float,
{
    pub envelope: Envelope<T>,
    /// Lags whose peaks were attenuated, in walk order.
    pub lags: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct Deflator {
    pub m_max: usize,
    pub taper: f64,
    pub scope: DeflationScope,
}

impl Deflator {
    /// Deflate the harmonic series of `base_lag`.
    ///
    /// `threshold` decides which harmonics are accepted. Only those shape the
    /// envelope, and with [DeflationScope::AcceptedOnly] only those are
    /// attenuated.
    pub fn deflate<T: Float>(
        &self,
        sacf: &mut Sacf<T>,
        base_lag: usize,
        threshold: T,
    ) -> Deflation<T> {
        let series: Vec<Harmonic<T>> =
            harmonic_walk(sacf.values(), base_lag, self.m_max, threshold);
        let lags: Vec<usize> = series
            .iter()
            .filter(|h| match self.scope {
                DeflationScope::AllVisited => true,
                DeflationScope::AcceptedOnly => h.accepted,
            })
            .map(|h| h.lag)
            .collect();
        // Rejected window maxima are mostly background and would drag the fit
        // towards zero.
        let points: Vec<(T, T)> = series
            .iter()
            .filter(|h| h.accepted && h.amplitude > T::zero())
            .map(|h| (T::from_usize(h.lag).unwrap(), h.amplitude))
            .collect();
        let envelope = fit_exponential(&points, T::from_f64(AMPLITUDE_FLOOR).unwrap());
        trace!(
            "deflating {} peaks from lag {}, envelope {} * exp({} * lag)",
            lags.len(),
            base_lag,
            envelope.amplitude,
            envelope.rate
        );

        for &lag in lags.iter() {
            let actual = match sacf.peek(lag) {
                Some(v) if v > T::zero() => v,
                _ => continue,
            };
            let estimated = envelope.at(T::from_usize(lag).unwrap());
            let strength = (estimated / actual).min(T::one()).max(T::zero());

            let (left, right) = peak_bounds(sacf.values(), lag);
            let window: Vec<T> = tukey(right - left + 1, self.taper);
            sacf.attenuate(left, &window, strength);
        }

        Deflation { envelope, lags }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Smooth bumps at multiples of `period` on a small positive background.
    fn bumps(len: usize, period: f64, amplitude: impl Fn(usize) -> f64) -> Vec<f64> {
        (0..len)
            .map(|lag| {
                let mut v = 0.01;
                let mut k = 1;
                while k as f64 * period < len as f64 + period {
                    let d = (lag as f64 - k as f64 * period) / 4.0;
                    v += amplitude(k) * (-d * d).exp();
                    k += 1;
                }
                v
            })
            .collect()
    }

    fn deflator(scope: DeflationScope) -> Deflator {
        Deflator {
            m_max: 2048,
            taper: 0.2,
            scope,
        }
    }

    #[test]
    fn deflation_never_amplifies() {
        let original = bumps(2100, 200.0, |k| (-0.08 * k as f64).exp());
        let mut sacf = Sacf::new(original.clone());
        let deflation = deflator(DeflationScope::AllVisited).deflate(&mut sacf, 200, 0.025);

        assert_eq!(&deflation.lags[..3], &[200, 400, 600]);
        for lag in [200, 400, 600].iter() {
            assert!(sacf.peek(*lag).unwrap() <= original[*lag]);
        }
        for (after, before) in sacf.values().iter().zip(original.iter()) {
            assert!(after <= before);
        }
        assert_eq!(sacf.len(), original.len());
    }

    #[test]
    fn exact_envelope_removes_peaks() {
        let original = bumps(2100, 200.0, |k| (-0.08 * k as f64).exp());
        let mut sacf = Sacf::new(original.clone());
        deflator(DeflationScope::AllVisited).deflate(&mut sacf, 200, 0.025);

        // The background lifts the fitted envelope above most peaks, which are
        // then removed completely at their centre.
        let removed = [200, 400, 600, 800, 1000]
            .iter()
            .filter(|&&lag| sacf.peek(lag).unwrap() < 0.1 * original[lag])
            .count();
        assert!(removed >= 3, "{:?}", sacf.values());
    }

    #[test]
    fn single_point_series_is_left_alone() {
        // With m_max below twice the base lag the walk holds only the base,
        // too few points for a fit.
        let original = bumps(1000, 300.0, |_| 1.0);
        let mut sacf = Sacf::new(original.clone());
        let deflation = Deflator {
            m_max: 500,
            taper: 0.2,
            scope: DeflationScope::AllVisited,
        }
        .deflate(&mut sacf, 300, 0.025);

        assert_eq!(deflation.envelope, Envelope::flat());
        assert_eq!(sacf.values(), &original[..]);
    }

    #[test]
    fn accepted_only_skips_weak_harmonics() {
        let original = bumps(2100, 200.0, |k| if k == 2 { 0.02 } else { 1.0 });
        let mut all = Sacf::new(original.clone());
        let mut accepted = Sacf::new(original.clone());

        let all_lags = deflator(DeflationScope::AllVisited).deflate(&mut all, 200, 0.5).lags;
        let accepted_lags = deflator(DeflationScope::AcceptedOnly)
            .deflate(&mut accepted, 200, 0.5)
            .lags;

        assert!(all_lags.contains(&400));
        assert!(!accepted_lags.contains(&400));
        assert_eq!(accepted.peek(400), Some(original[400]));
    }

    #[test]
    fn envelope_ignores_rejected_harmonics() {
        // Even harmonics fall below the threshold and are visited but rejected.
        let original = bumps(2100, 200.0, |k| if k % 2 == 1 { 1.0 } else { 0.2 });
        let mut sacf = Sacf::new(original.clone());
        let deflation = deflator(DeflationScope::AllVisited).deflate(&mut sacf, 200, 0.5);

        assert_eq!(deflation.lags.len(), 10);
        // The fit runs through the odd harmonics only.
        assert_relative_eq!(deflation.envelope.at(600.0), 1.01, epsilon = 1e-3);
        for lag in [200, 600, 1000].iter() {
            assert!(sacf.peek(*lag).unwrap() < 0.05 * original[*lag]);
        }
    }

    #[test]
    fn non_positive_peaks_are_skipped() {
        let mut sacf = Sacf::new(vec![-1.0f64; 1000]);
        let deflation = deflator(DeflationScope::AllVisited).deflate(&mut sacf, 200, 0.025);
        assert!(!deflation.lags.is_empty());
        assert!(sacf.values().iter().all(|&v| v == -1.0));
    }
}
