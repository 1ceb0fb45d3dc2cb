//! Pre-whitening with a warped linear predictor.
//!
//! The predictor replaces the unit delays of an ordinary FIR predictor with a
//! chain of first-order all-pass sections, so that its few coefficients spend
//! their resolution on the low frequencies where musical pitches live. The
//! prediction is subtracted from the input and the residual, whose coarse
//! spectral tilt has been removed, is returned.
//!
//! Let $x$ be the input and $A(z)$ the warping all-pass. With stages
//! $y_0 = A x$, $y_i = A y_{i-1}$ and coefficients $c_0, \ldots, c_p$ the
//! output is
//! $$ r = x - \left(c_0 x + \sum_{i=1}^{p} c_i y_{i-1}\right). $$

use crate::config::{band_for_rate, DetectorConfig};
use crate::error::DetectionResult;
use crate::float::Float;
use crate::utils::buffer::new_real_buffer;
use crate::utils::filters::{fir_bandpass, WarpingAllPass};

pub struct Prewhitener<T>
where
    T: Float,
{
    coefficients: Vec<T>,
    allpass: WarpingAllPass<T>,
}

impl<T> Prewhitener<T>
where
    T: Float,
{
    pub fn new(config: &DetectorConfig, sample_rate: usize) -> DetectionResult<Self> {
        let (low, high) = band_for_rate("whitening", config.whitening_band, sample_rate)?;
        let coefficients = fir_bandpass(config.whitening_order + 1, low, high, sample_rate as f64);
        Ok(Prewhitener {
            coefficients,
            allpass: WarpingAllPass::new(config.warping_factor),
        })
    }

    pub fn order(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Whiten `input` into `output`. Both slices have the same length.
    pub fn process(&mut self, input: &[T], output: &mut [T]) {
        assert_eq!(input.len(), output.len());

        output
            .iter_mut()
            .zip(input.iter())
            .for_each(|(o, &x)| *o = x - self.coefficients[0] * x);

        let mut stage = input.to_vec();
        let mut next = new_real_buffer(input.len());
        for &c in self.coefficients[1..].iter() {
            self.allpass.filter(&stage, &mut next);
            output
                .iter_mut()
                .zip(next.iter())
                .for_each(|(o, &y)| *o = *o - c * y);
            std::mem::swap(&mut stage, &mut next);
        }
    }
}
