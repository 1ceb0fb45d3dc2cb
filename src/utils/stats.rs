use crate::float::Float;

/// Median of `values`, averaging the two middle values for even lengths.
/// `values` is reordered. Returns `None` for an empty slice.
pub fn median<T: Float>(values: &mut [T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / T::from_f64(2.0).unwrap())
    }
}

/// An exponential curve `amplitude * exp(rate * x)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope<T>
where
    T: Float,
{
    pub amplitude: T,
    pub rate: T,
}

impl<T> Envelope<T>
where
    T: Float,
{
    /// The zero curve.
    pub fn flat() -> Self {
        Envelope {
            amplitude: T::zero(),
            rate: T::zero(),
        }
    }

    pub fn at(&self, x: T) -> T {
        self.amplitude * (self.rate * x).exp()
    }
}

/// Least-squares fit of an [Envelope] through `points`, done as a straight line
/// through `(x, ln y)`. Each `y` is raised to at least `floor` before taking
/// the logarithm.
///
/// Fewer than two points, coincident `x` values or a non-finite result give
/// [Envelope::flat].
pub fn fit_exponential<T: Float>(points: &[(T, T)], floor: T) -> Envelope<T> {
    if points.len() < 2 {
        return Envelope::flat();
    }
    let n = T::from_usize(points.len()).unwrap();
    let log_points: Vec<(T, T)> = points.iter().map(|&(x, y)| (x, y.max(floor).ln())).collect();

    let mean_x = log_points.iter().map(|p| p.0).sum::<T>() / n;
    let mean_y = log_points.iter().map(|p| p.1).sum::<T>() / n;
    let (sxx, sxy) = log_points
        .iter()
        .fold((T::zero(), T::zero()), |(sxx, sxy), &(x, y)| {
            let dx = x - mean_x;
            (sxx + dx * dx, sxy + dx * (y - mean_y))
        });
    if sxx <= T::zero() {
        return Envelope::flat();
    }

    let rate = sxy / sxx;
    let amplitude = (mean_y - rate * mean_x).exp();
    if !rate.is_finite() || !amplitude.is_finite() {
        return Envelope::flat();
    }
    Envelope { amplitude, rate }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median(&mut [3.0f64, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0f64, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median::<f64>(&mut []), None);
    }

    #[test]
    fn median_orders_nan_last() {
        assert_eq!(median(&mut [f64::NAN, 3.0, 1.0]), Some(3.0));
        assert_eq!(median(&mut [2.0f32, f32::NAN, 1.0, 5.0, 4.0]), Some(4.0));
    }

    #[test]
    fn recovers_exact_exponential() {
        let points: Vec<(f64, f64)> = [100.0, 200.0, 300.0, 400.0]
            .iter()
            .map(|&x| (x, 0.8 * (-0.002f64 * x).exp()))
            .collect();
        let envelope = fit_exponential(&points, 1e-10);
        assert_relative_eq!(envelope.amplitude, 0.8, epsilon = 1e-9);
        assert_relative_eq!(envelope.rate, -0.002, epsilon = 1e-12);
        assert_relative_eq!(envelope.at(250.0), 0.8 * (-0.5f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn degenerate_fits_are_flat() {
        assert_eq!(fit_exponential(&[(10.0f64, 1.0)], 1e-10), Envelope::flat());
        assert_eq!(
            fit_exponential(&[(10.0f64, 1.0), (10.0, 2.0)], 1e-10),
            Envelope::flat()
        );
        assert_eq!(Envelope::<f64>::flat().at(100.0), 0.0);
    }

    #[test]
    fn non_positive_amplitudes_are_floored() {
        let envelope = fit_exponential(&[(1.0f64, 0.0), (2.0, -1.0), (3.0, 0.0)], 1e-10);
        assert!(envelope.amplitude.is_finite());
        assert_relative_eq!(envelope.rate, 0.0, epsilon = 1e-12);
        assert_relative_eq!(envelope.amplitude, 1e-10, epsilon = 1e-15);
    }
}
