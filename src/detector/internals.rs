use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::float::Float;
use crate::utils::buffer::{compressed_modulus, copy_complex_to_real, copy_real_to_complex};
use crate::utils::buffer::{new_complex_buffer, new_real_buffer, BufferPool};

/// Forward and inverse plans for one transform length, sharing a scratch buffer.
struct Transform<T>
where
    T: Float,
{
    len: usize,
    fft: Arc<dyn Fft<T>>,
    inv_fft: Arc<dyn Fft<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T> Transform<T>
where
    T: Float,
{
    fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        let inv_fft = planner.plan_fft_inverse(len);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(inv_fft.get_inplace_scratch_len());

        Transform {
            len,
            fft,
            inv_fft,
            scratch: new_complex_buffer(scratch_len),
        }
    }

    fn autocorrelate(
        &mut self,
        signal: &[T],
        gamma: T,
        spectrum: &mut [Complex<T>],
        result: &mut [T],
    ) {
        let spectrum = &mut spectrum[..self.len];

        copy_real_to_complex(signal, spectrum);
        self.fft.process_with_scratch(spectrum, &mut self.scratch);
        compressed_modulus(spectrum, gamma);
        self.inv_fft.process_with_scratch(spectrum, &mut self.scratch);

        // rustfft doesn't normalize, so the round trip scales by the transform length.
        let normalization_const = T::one() / T::from_usize(self.len).unwrap();
        copy_complex_to_real(&spectrum[..result.len()], result);
        result.iter_mut().for_each(|r| *r = *r * normalization_const);
    }
}

/// Transform workspace for one frame size. Plans and scratch are created once
/// and reused across frames; spectra and band buffers come from a
/// `BufferPool` so repeated calls don't allocate.
pub struct DetectorInternals<T>
where
    T: Float,
{
    /// Number of samples in a frame.
    pub size: usize,
    /// Transform length, twice the frame size so that correlations don't wrap.
    pub padded_size: usize,
    pub buffers: BufferPool<T>,
    transform: Transform<T>,
}

impl<T> DetectorInternals<T>
where
    T: Float,
{
    pub fn new(size: usize) -> Self {
        let padded_size = 2 * size;
        DetectorInternals {
            size,
            padded_size,
            buffers: BufferPool::new(padded_size),
            transform: Transform::new(padded_size),
        }
    }

    /// Compute the generalized autocorrelation of `signal` into `result`:
    /// the inverse transform of the magnitude spectrum raised to `gamma`,
    /// keeping the non-negative lags `0..padded_size / 2`.
    ///
    /// With `gamma = 2` this is the ordinary (linear) autocorrelation
    ///
    /// > r(t) = sum_i x_i * x_{i+t}
    pub fn generalized_autocorrelation(&mut self, signal: &[T], gamma: T, result: &mut [T]) {
        assert!(signal.len() <= self.size);
        assert_eq!(result.len(), self.padded_size / 2);

        let mut spectrum = self.buffers.get_spectrum_buffer();
        self.transform
            .autocorrelate(signal, gamma, &mut spectrum[..], result);
    }

    /// Sum of the generalized autocorrelations of two band signals.
    pub fn summary_autocorrelation(&mut self, low: &[T], high: &[T], gamma: T) -> Vec<T> {
        assert!(low.len() <= self.size && high.len() <= self.size);
        let lags = self.padded_size / 2;

        let mut spectrum = self.buffers.get_spectrum_buffer();
        let mut band = self.buffers.get_band_buffer();
        let band = &mut band[..lags];
        let mut summary = new_real_buffer(lags);

        self.transform
            .autocorrelate(low, gamma, &mut spectrum[..], &mut summary);
        self.transform
            .autocorrelate(high, gamma, &mut spectrum[..], band);
        summary
            .iter_mut()
            .zip(band.iter())
            .for_each(|(s, b)| *s = *s + *b);
        summary
    }
}
