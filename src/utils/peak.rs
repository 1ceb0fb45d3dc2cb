use crate::float::Float;

/// Iterator over the local maxima of a slice, in increasing index order.
///
/// A sample is a local maximum when it is strictly greater than its left
/// neighbour and the run of equal samples starting at it is followed by a
/// strictly smaller sample. Flat peaks report the (lower) middle index of the
/// plateau. The first and last samples are never peaks.
pub struct LocalMaxima<'a, T>
where
    T: Float,
{
    arr: &'a [T],
    i: usize,
}

pub fn detect_peaks<T: Float>(arr: &[T]) -> LocalMaxima<'_, T> {
    LocalMaxima { arr, i: 1 }
}

impl<'a, T> Iterator for LocalMaxima<'a, T>
where
    T: Float,
{
    type Item = (usize, T);

    fn next(&mut self) -> Option<Self::Item> {
        let arr = self.arr;
        let last = arr.len().saturating_sub(1);
        while self.i < last {
            let i = self.i;
            self.i += 1;
            if arr[i - 1] < arr[i] {
                let mut ahead = i + 1;
                while ahead < last && arr[ahead] == arr[i] {
                    ahead += 1;
                }
                if arr[ahead] < arr[i] {
                    self.i = ahead;
                    let peak = (i + ahead - 1) / 2;
                    return Some((peak, arr[peak]));
                }
            }
        }
        None
    }
}

/// Index of the first maximum of `arr`.
pub fn argmax<T: Float>(arr: &[T]) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (i, &v) in arr.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Bounds of the peak containing `center`: walk outwards while the values keep
/// decreasing and stop at the nearest local minimum on each side.
pub fn peak_bounds<T: Float>(arr: &[T], center: usize) -> (usize, usize) {
    assert!(center < arr.len());
    let mut left = center;
    while left > 0 && arr[left] > arr[left - 1] {
        left -= 1;
    }
    let mut right = center;
    while right + 1 < arr.len() && arr[right] > arr[right + 1] {
        right += 1;
    }
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_peaks() {
        let data = [0.0, 1.0, 0.0, 2.0, 3.0, 1.0, 1.0, 4.0];
        let peaks: Vec<_> = detect_peaks(&data).collect();
        assert_eq!(peaks, vec![(1, 1.0), (4, 3.0)]);
    }

    #[test]
    fn plateau_reports_middle() {
        let data = [0.0, 2.0, 2.0, 2.0, 2.0, 0.0, 1.0, 1.0, 1.0];
        let peaks: Vec<_> = detect_peaks(&data).collect();
        // The trailing plateau never comes back down, so it is not a peak.
        assert_eq!(peaks, vec![(2, 2.0)]);
    }

    #[test]
    fn short_inputs_have_no_peaks() {
        assert_eq!(detect_peaks::<f64>(&[]).count(), 0);
        assert_eq!(detect_peaks(&[1.0f64]).count(), 0);
        assert_eq!(detect_peaks(&[0.0f64, 1.0]).count(), 0);
    }

    #[test]
    fn first_maximum() {
        assert_eq!(argmax(&[1.0f64, 3.0, 2.0, 3.0]), Some(1));
        assert_eq!(argmax::<f64>(&[]), None);
    }

    #[test]
    fn bounds_stop_at_minima() {
        let data = [3.0, 1.0, 2.0, 5.0, 4.0, 0.5, 2.0];
        assert_eq!(peak_bounds(&data, 3), (1, 5));
        assert_eq!(peak_bounds(&data, 0), (0, 1));
        assert_eq!(peak_bounds(&data, 6), (5, 6));
    }
}
