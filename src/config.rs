//! Detector configuration.
//!
//! Every tunable of the pipeline lives in [DetectorConfig]. A detector takes
//! its configuration by value at construction and never mutates it, so two
//! detectors built from equal configurations behave identically.

use crate::error::{DetectionError, DetectionResult};

/// Which harmonic positions the deflator attenuates after a pitch is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeflationScope {
    /// Every search-window maximum visited by the harmonic walk, whether or not
    /// it passed the harmonic-validity test.
    AllVisited,
    /// Only positions that pass the validity test against the winning threshold.
    AcceptedOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Edges of the low analysis band, in Hz.
    pub low_band: (f64, f64),
    /// Edges of the high analysis band, in Hz. The high band is half-wave rectified.
    pub high_band: (f64, f64),
    /// Shortest fundamental period searched, in samples.
    pub m_lo: usize,
    /// Longest fundamental period searched, in samples.
    pub m_hi: usize,
    /// Longest lag a harmonic series may reach.
    pub m_max: usize,
    /// Width of the lag window the adaptive threshold takes its median over.
    pub sliding_window_size: usize,
    /// Multiplier applied to the local median.
    pub scale_factor: f64,
    /// Lower bound of the adaptive threshold.
    pub threshold_floor: f64,
    /// A winner is accepted only if its salience exceeds this multiple of the
    /// threshold at its own period.
    pub salience_ratio: f64,
    /// Rounds stop once the best candidate's salience falls below this
    /// fraction of the first reported pitch's salience. Zero disables the cut.
    pub relative_salience: f64,
    pub max_iterations: usize,
    /// Exponent applied to the magnitude spectrum in the generalized ACF.
    pub compression_gamma: f64,
    /// Tukey shape of the window applied to the frame before filtering.
    pub frame_taper: f64,
    /// Tukey shape of the window used to attenuate each harmonic peak.
    pub deflation_taper: f64,
    pub whitening_order: usize,
    pub warping_factor: f64,
    /// Pass band of the pre-whitener's linear-phase design, in Hz.
    pub whitening_band: (f64, f64),
    pub deflation_scope: DeflationScope,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            low_band: (27.5, 2250.0),
            high_band: (2250.0, 4186.0),
            m_lo: 30,
            m_hi: 735,
            m_max: 2048,
            sliding_window_size: 100,
            scale_factor: 1.5,
            threshold_floor: 0.025,
            salience_ratio: 5.0,
            relative_salience: 0.1,
            max_iterations: 10,
            compression_gamma: 0.6,
            frame_taper: 0.4,
            deflation_taper: 0.2,
            whitening_order: 8,
            warping_factor: 0.72,
            whitening_band: (20.0, 20000.0),
            deflation_scope: DeflationScope::AllVisited,
        }
    }
}

impl DetectorConfig {
    /// High band extended to 8 kHz and a shorter minimum period, for material
    /// with strong upper partials.
    pub fn wide_band() -> Self {
        DetectorConfig {
            high_band: (2250.0, 8000.0),
            m_lo: 10,
            ..Default::default()
        }
    }

    /// Check the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> DetectionResult<()> {
        if self.m_lo == 0 || self.m_lo >= self.m_hi {
            return Err(DetectionError::InvalidLagRange {
                m_lo: self.m_lo,
                m_hi: self.m_hi,
            });
        }
        if self.m_max < self.m_hi {
            return Err(DetectionError::InvalidHarmonicLimit {
                m_max: self.m_max,
                m_hi: self.m_hi,
            });
        }
        if self.max_iterations == 0 {
            return Err(DetectionError::ZeroIterations);
        }

        check_band("low", self.low_band)?;
        check_band("high", self.high_band)?;
        check_band("whitening", self.whitening_band)?;

        check_positive("compression_gamma", self.compression_gamma)?;
        check_positive("scale_factor", self.scale_factor)?;
        check_positive("salience_ratio", self.salience_ratio)?;

        if !self.threshold_floor.is_finite() || self.threshold_floor < 0.0 {
            return Err(DetectionError::InvalidParameter {
                name: "threshold_floor",
                value: self.threshold_floor,
            });
        }
        check_unit("relative_salience", self.relative_salience)?;
        check_unit("frame_taper", self.frame_taper)?;
        check_unit("deflation_taper", self.deflation_taper)?;

        if self.whitening_order == 0 {
            return Err(DetectionError::InvalidParameter {
                name: "whitening_order",
                value: 0.0,
            });
        }
        if !self.warping_factor.is_finite() || self.warping_factor.abs() >= 1.0 {
            return Err(DetectionError::InvalidParameter {
                name: "warping_factor",
                value: self.warping_factor,
            });
        }

        Ok(())
    }
}

/// Clamp a band to what a given sample rate can represent.
pub(crate) fn band_for_rate(
    name: &'static str,
    band: (f64, f64),
    sample_rate: usize,
) -> DetectionResult<(f64, f64)> {
    let nyquist = sample_rate as f64 / 2.0;
    let high = band.1.min(nyquist - 1.0);
    if band.0 <= 0.0 || band.0 >= high {
        return Err(DetectionError::InvalidBand {
            name,
            low: band.0,
            high,
        });
    }
    Ok((band.0, high))
}

fn check_band(name: &'static str, band: (f64, f64)) -> DetectionResult<()> {
    let (low, high) = band;
    if !low.is_finite() || !high.is_finite() || low <= 0.0 || low >= high {
        return Err(DetectionError::InvalidBand { name, low, high });
    }
    Ok(())
}

fn check_positive(name: &'static str, value: f64) -> DetectionResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DetectionError::InvalidParameter { name, value });
    }
    Ok(())
}

fn check_unit(name: &'static str, value: f64) -> DetectionResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DetectionError::InvalidParameter { name, value });
    }
    Ok(())
}
