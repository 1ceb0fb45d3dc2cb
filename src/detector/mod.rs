use crate::error::DetectionResult;
use crate::float::Float;
use crate::note::Note;

pub mod bands;
pub mod deflation;
pub mod internals;
pub mod iterative;
pub mod sacf;
pub mod salience;
pub mod threshold;
pub mod whitening;

pub trait PolyphonicDetector<T>
where
    T: Float,
{
    /// All pitches found in `signal`, most salient first. Silence and frames
    /// without a clear periodicity give an empty list.
    fn get_pitches(&mut self, signal: &[T], sample_rate: usize) -> DetectionResult<Vec<Note<T>>>;
}
