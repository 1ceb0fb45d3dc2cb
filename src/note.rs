//! Conversion between frequencies, piano key indices and note names.
//!
//! Keys follow the 88-key piano numbering: A0 is key 1, A4 (440 Hz) is key 49
//! and C8 is key 88. Keys outside that range are still named consistently.

use std::fmt;

use crate::float::Float;

/// Pitch classes, starting at A.
pub const NOTE_NAMES: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

const A4_KEY: i32 = 49;
const A4_FREQUENCY: f64 = 440.0;

/// Nearest piano key for `frequency`, or `None` if the frequency is not a
/// positive finite number.
pub fn key_from_frequency<T: Float>(frequency: T) -> Option<i32> {
    let frequency = frequency.to_f64()?;
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }
    let key = (A4_KEY as f64 + 12.0 * (frequency / A4_FREQUENCY).log2()).round();
    if key.abs() > i32::MAX as f64 {
        return None;
    }
    Some(key as i32)
}

/// Equal-tempered frequency of `key`.
pub fn frequency_from_key(key: i32) -> f64 {
    A4_FREQUENCY * 2f64.powf((key - A4_KEY) as f64 / 12.0)
}

/// Name of `key`, e.g. `"A4"` for key 49 or `"C#3"` for key 29.
pub fn note_name(key: i32) -> String {
    let pitch_class = (key.rem_euclid(12) + 11) % 12;
    let octave = (key + 8).div_euclid(12);
    format!("{}{}", NOTE_NAMES[pitch_class as usize], octave)
}

/// A pitch accepted by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Note<T>
where
    T: Float,
{
    pub frequency: T,
    /// Refined fundamental period, in samples.
    pub period: T,
    pub salience: T,
    pub key: i32,
}

impl<T> Note<T>
where
    T: Float,
{
    /// Build a note from a fundamental period in samples.
    pub fn from_period(period: T, sample_rate: usize, salience: T) -> Option<Self> {
        let frequency = T::from_usize(sample_rate)? / period;
        let key = key_from_frequency(frequency)?;
        Some(Note {
            frequency,
            period,
            salience,
            key,
        })
    }

    pub fn name(&self) -> String {
        note_name(self.key)
    }
}

impl<T> fmt::Display for Note<T>
where
    T: Float,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
