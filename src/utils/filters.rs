//! Time-domain filters used to prepare a frame for autocorrelation.
//!
//! Coefficients are designed in `f64` and converted to the signal's [Float]
//! type once.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::float::Float;

/// Second-order IIR section, Direct Form II Transposed.
#[derive(Debug, Clone, Copy)]
pub struct Biquad<T>
where
    T: Float,
{
    b0: T,
    b1: T,
    b2: T,
    a1: T,
    a2: T,
    z1: T,
    z2: T,
}

impl<T> Biquad<T>
where
    T: Float,
{
    /// Build from RBJ cookbook coefficients, normalizing by `a0`.
    fn from_coefficients(b: [f64; 3], a: [f64; 3]) -> Self {
        let to_t = |v: f64| T::from_f64(v / a[0]).unwrap();
        Biquad {
            b0: to_t(b[0]),
            b1: to_t(b[1]),
            b2: to_t(b[2]),
            a1: to_t(a[1]),
            a2: to_t(a[2]),
            z1: T::zero(),
            z2: T::zero(),
        }
    }

    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        Biquad::from_coefficients(
            [(1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        )
    }

    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        Biquad::from_coefficients(
            [(1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        )
    }

    pub fn reset(&mut self) {
        self.z1 = T::zero();
        self.z2 = T::zero();
    }

    #[inline]
    pub fn process(&mut self, x: T) -> T {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

/// Band-pass made of a Butterworth high-pass at the lower edge followed by a
/// Butterworth low-pass at the upper edge.
#[derive(Debug, Clone, Copy)]
pub struct BandPass<T>
where
    T: Float,
{
    highpass: Biquad<T>,
    lowpass: Biquad<T>,
}

impl<T> BandPass<T>
where
    T: Float,
{
    pub fn new(low: f64, high: f64, sample_rate: f64) -> Self {
        BandPass {
            highpass: Biquad::highpass(low, FRAC_1_SQRT_2, sample_rate),
            lowpass: Biquad::lowpass(high, FRAC_1_SQRT_2, sample_rate),
        }
    }

    /// Filter `input` into `output`, starting from a zero state.
    pub fn filter(&mut self, input: &[T], output: &mut [T]) {
        assert_eq!(input.len(), output.len());
        self.highpass.reset();
        self.lowpass.reset();
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.lowpass.process(self.highpass.process(*x));
        }
    }
}

/// First-order all-pass section `H(z) = (-λ + z⁻¹) / (1 - λ z⁻¹)`.
///
/// Chaining these in place of unit delays warps the frequency axis; for
/// positive `λ` the low frequencies get more resolution.
#[derive(Debug, Clone, Copy)]
pub struct WarpingAllPass<T>
where
    T: Float,
{
    lambda: T,
    x1: T,
    y1: T,
}

impl<T> WarpingAllPass<T>
where
    T: Float,
{
    pub fn new(lambda: f64) -> Self {
        WarpingAllPass {
            lambda: T::from_f64(lambda).unwrap(),
            x1: T::zero(),
            y1: T::zero(),
        }
    }

    pub fn reset(&mut self) {
        self.x1 = T::zero();
        self.y1 = T::zero();
    }

    /// Filter `input` into `output`, starting from a zero state.
    pub fn filter(&mut self, input: &[T], output: &mut [T]) {
        assert_eq!(input.len(), output.len());
        self.reset();
        for (x, y) in input.iter().zip(output.iter_mut()) {
            let out = self.x1 - self.lambda * *x + self.lambda * self.y1;
            self.x1 = *x;
            self.y1 = out;
            *y = out;
        }
    }
}

/// Linear-phase band-pass FIR with `taps` coefficients, designed by
/// Hamming-windowing the ideal band-pass impulse response.
pub fn fir_bandpass<T: Float>(taps: usize, low: f64, high: f64, sample_rate: f64) -> Vec<T> {
    let f_low = low / sample_rate;
    let f_high = high / sample_rate;
    let center = (taps as f64 - 1.0) / 2.0;
    let sinc = |x: f64| {
        if x == 0.0 {
            1.0
        } else {
            (PI * x).sin() / (PI * x)
        }
    };

    (0..taps)
        .map(|n| {
            let m = n as f64 - center;
            let ideal = 2.0 * f_high * sinc(2.0 * f_high * m) - 2.0 * f_low * sinc(2.0 * f_low * m);
            let hamming = if taps > 1 {
                0.54 - 0.46 * (2.0 * PI * n as f64 / (taps as f64 - 1.0)).cos()
            } else {
                1.0
            };
            T::from_f64(ideal * hamming).unwrap()
        })
        .collect()
}
