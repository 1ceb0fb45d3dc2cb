use object_pool::{Pool, Reusable};
use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;

use crate::float::Float;

pub fn new_real_buffer<T: Float>(size: usize) -> Vec<T> {
    vec![T::zero(); size]
}

pub fn new_complex_buffer<T: Float>(size: usize) -> Vec<Complex<T>> {
    vec![Complex::zero(); size]
}

/// Copy `input` into the real part of `output`, zeroing the imaginary parts
/// and everything past the end of `input` (zero padding).
pub fn copy_real_to_complex<T: Float>(input: &[T], output: &mut [Complex<T>]) {
    assert!(input.len() <= output.len());
    input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
        o.re = *i;
        o.im = T::zero();
    });
    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = Complex::zero())
}

/// Copy the real parts of `input` to `output`. `output` may be longer than
/// `input`, in which case the remainder is zeroed.
pub fn copy_complex_to_real<T: Float>(input: &[Complex<T>], output: &mut [T]) {
    assert!(input.len() <= output.len());
    input
        .iter()
        .map(|c| c.re)
        .zip(output.iter_mut())
        .for_each(|(i, o)| *o = i);

    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = T::zero());
}

/// Computes |x|^gamma for each complex value x in `arr`. This function
/// modifies `arr` in place and leaves the complex component zero.
///
/// `gamma = 2` gives the power spectrum; values below 1 compress large
/// magnitudes relative to small ones.
pub fn compressed_modulus<T: Float>(arr: &mut [Complex<T>], gamma: T) {
    let half_gamma = gamma / T::from_f64(2.0).unwrap();
    for s in arr.iter_mut() {
        s.re = (s.re * s.re + s.im * s.im).powf(half_gamma);
        s.im = T::zero();
    }
}

/// Compute the sum of the square of each element of `arr`.
pub fn square_sum<T: Float>(arr: &[T]) -> T {
    arr.iter().map(|&s| s * s).sum::<T>()
}

/// Scratch buffers for the autocorrelation transforms, all `buffer_size` long.
///
/// A buffer goes back to the pool when its [Reusable] handle is dropped and the
/// next request hands it out again with its old contents, so callers must
/// overwrite whatever they read.
///
/// ```rust
/// use sacf_pitch::utils::buffer::BufferPool;
///
/// let pool = BufferPool::<f64>::new(8);
/// {
///     let mut spectrum = pool.get_spectrum_buffer();
///     assert_eq!(spectrum.len(), 8);
///     spectrum[0].re = 1.0;
/// }
/// let spectrum = pool.get_spectrum_buffer();
/// assert_eq!(spectrum[0].re, 1.0);
/// ```
pub struct BufferPool<T> {
    bands: Pool<Vec<T>>,
    spectra: Pool<Vec<Complex<T>>>,
    pub buffer_size: usize,
}

impl<T: Float> BufferPool<T> {
    pub fn new(buffer_size: usize) -> Self {
        BufferPool {
            bands: Pool::new(0, || new_real_buffer(buffer_size)),
            spectra: Pool::new(0, || new_complex_buffer(buffer_size)),
            buffer_size,
        }
    }

    /// A real buffer, held until the handle is dropped.
    pub fn get_band_buffer(&self) -> Reusable<Vec<T>> {
        self.bands.pull(|| new_real_buffer(self.buffer_size))
    }

    /// A complex buffer, held until the handle is dropped.
    pub fn get_spectrum_buffer(&self) -> Reusable<Vec<Complex<T>>> {
        self.spectra.pull(|| new_complex_buffer(self.buffer_size))
    }
}
