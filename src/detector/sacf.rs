use crate::float::Float;
use crate::utils::stats::median;

/// Summary autocorrelation of one frame, indexed by lag.
///
/// The buffer is owned by a single detection call. Its length never changes;
/// the only write is [Sacf::attenuate], which the deflator uses to scale a
/// stretch of lags down towards zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Sacf<T>
where
    T: Float,
{
    values: Vec<T>,
}

impl<T> Sacf<T>
where
    T: Float,
{
    pub fn new(values: Vec<T>) -> Self {
        Sacf { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `lag`, if the lag is in range.
    pub fn peek(&self, lag: usize) -> Option<T> {
        self.values.get(lag).copied()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Median over all lags, zero when empty.
    pub fn median(&self) -> T {
        median(&mut self.values.clone()).unwrap_or_else(T::zero)
    }

    /// Multiply the lags starting at `start` by `1 - strength * window[i]`.
    ///
    /// `strength` and the window values are expected in `[0, 1]`, so the
    /// magnitude at every lag can only shrink. Lags past the end are ignored.
    pub fn attenuate(&mut self, start: usize, window: &[T], strength: T) {
        self.values
            .iter_mut()
            .skip(start)
            .zip(window.iter())
            .for_each(|(v, &w)| *v = *v * (T::one() - strength * w));
    }
}
