//! Tapered windows.
//!
//! The Tukey (tapered cosine) window is flat in the middle and tapers to zero
//! over `alpha / 2` of its length on either side. `alpha = 0` gives a
//! rectangular window and `alpha = 1` a Hann window. Windows are symmetric:
//! both end samples are zero whenever `alpha > 0` and the size is at least 2.

use std::f64::consts::PI;

use crate::float::Float;

/// Returns `Some(trivial_window)` for degenerate sizes (0 or 1), or `None`
/// to indicate the caller should compute the full window.
#[inline]
fn trivial_window<T: Float>(size: usize) -> Option<Vec<T>> {
    match size {
        0 => Some(vec![]),
        1 => Some(vec![T::one()]),
        _ => None,
    }
}

pub fn hann<T: Float>(size: usize) -> Vec<T> {
    if let Some(w) = trivial_window(size) {
        return w;
    }
    let n = (size - 1) as f64;
    (0..size)
        .map(|i| T::from_f64(0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos()).unwrap())
        .collect()
}

pub fn tukey<T: Float>(size: usize, alpha: f64) -> Vec<T> {
    if let Some(w) = trivial_window(size) {
        return w;
    }
    if alpha <= 0.0 {
        return vec![T::one(); size];
    }
    if alpha >= 1.0 {
        return hann(size);
    }

    let n = (size - 1) as f64;
    let width = (alpha * n / 2.0).floor() as usize;
    (0..size)
        .map(|i| {
            let x = i as f64;
            let w = if i <= width {
                0.5 * (1.0 + (PI * (-1.0 + 2.0 * x / alpha / n)).cos())
            } else if i >= size - width - 1 {
                0.5 * (1.0 + (PI * (-2.0 / alpha + 1.0 + 2.0 * x / alpha / n)).cos())
            } else {
                1.0
            };
            T::from_f64(w).unwrap()
        })
        .collect()
}

/// Applies a window function to a slice in-place.
#[inline]
pub fn apply_window<T: Float>(data: &mut [T], window: &[T]) {
    for (sample, &w) in data.iter_mut().zip(window.iter()) {
        *sample = *sample * w;
    }
}
