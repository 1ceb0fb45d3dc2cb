//! Splitting a frame into the two analysis bands.
//!
//! The frame is tapered, pre-whitened and then band-pass filtered twice. Each
//! band is rescaled to the energy of the whitened frame so that the filters'
//! attenuation doesn't decide which band dominates the summary. The high band
//! is half-wave rectified, which turns the envelope periodicity of its upper
//! partials into energy at the fundamental.

use crate::config::{band_for_rate, DetectorConfig};
use crate::detector::whitening::Prewhitener;
use crate::error::DetectionResult;
use crate::float::Float;
use crate::utils::buffer::{new_real_buffer, square_sum};
use crate::utils::filters::BandPass;
use crate::utils::window::{apply_window, tukey};

/// Added to the filtered energy before it is used as a divisor.
const ENERGY_EPSILON: f64 = 1e-10;

pub struct Bands<T>
where
    T: Float,
{
    pub low: Vec<T>,
    pub high: Vec<T>,
}

pub struct BandSplitter<T>
where
    T: Float,
{
    taper: Vec<T>,
    whitener: Prewhitener<T>,
    low: BandPass<T>,
    high: BandPass<T>,
}

impl<T> BandSplitter<T>
where
    T: Float,
{
    pub fn new(config: &DetectorConfig, size: usize, sample_rate: usize) -> DetectionResult<Self> {
        let (low_lo, low_hi) = band_for_rate("low", config.low_band, sample_rate)?;
        let (high_lo, high_hi) = band_for_rate("high", config.high_band, sample_rate)?;
        let rate = sample_rate as f64;

        Ok(BandSplitter {
            taper: tukey(size, config.frame_taper),
            whitener: Prewhitener::new(config, sample_rate)?,
            low: BandPass::new(low_lo, low_hi, rate),
            high: BandPass::new(high_lo, high_hi, rate),
        })
    }

    pub fn split(&mut self, frame: &[T]) -> Bands<T> {
        assert_eq!(frame.len(), self.taper.len());

        let mut tapered = frame.to_vec();
        apply_window(&mut tapered, &self.taper);

        let mut whitened = new_real_buffer(frame.len());
        self.whitener.process(&tapered, &mut whitened);

        let mut low = new_real_buffer(frame.len());
        self.low.filter(&whitened, &mut low);
        match_energy(&whitened, &mut low);

        let mut high = new_real_buffer(frame.len());
        self.high.filter(&whitened, &mut high);
        match_energy(&whitened, &mut high);
        half_wave_rectify(&mut high);

        Bands { low, high }
    }
}

/// Scale `filtered` so that its energy matches that of `reference`.
pub fn match_energy<T: Float>(reference: &[T], filtered: &mut [T]) {
    let epsilon = T::from_f64(ENERGY_EPSILON).unwrap();
    let ratio = (square_sum(reference) / (square_sum(filtered) + epsilon)).sqrt();
    filtered.iter_mut().for_each(|v| *v = *v * ratio);
}

pub fn half_wave_rectify<T: Float>(signal: &mut [T]) {
    signal.iter_mut().for_each(|v| *v = (*v).max(T::zero()));
}
