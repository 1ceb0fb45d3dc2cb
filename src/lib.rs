//! # SACF Pitch
//! *sacf_pitch* estimates the pitches sounding together in a frame of audio.
//! The frame is pre-whitened and split into a low and a high band, and the
//! generalized autocorrelations of the two bands are summed into a summary
//! autocorrelation function (SACF). Pitches are then taken out one at a time:
//! the candidate period whose harmonic series is most salient is reported and
//! its harmonics are deflated from the SACF before the next round.
//!
//! # Detectors
//!   * [IterativeDetector][detector::iterative::IterativeDetector] implements
//!     [PolyphonicDetector][detector::PolyphonicDetector] for frames of a fixed size.
//!   * [detect_pitches] runs a default detector over one frame and returns note names.
//!
//! All tunables are collected in [DetectorConfig].
//!
//! # Examples
//! ```
//! use sacf_pitch::detector::iterative::IterativeDetector;
//! use sacf_pitch::detector::PolyphonicDetector;
//! use sacf_pitch::DetectorConfig;
//!
//! fn main() {
//!     const SAMPLE_RATE: usize = 44100;
//!     const SIZE: usize = 4096;
//!
//!     // A 440 Hz tone with ten decaying harmonics.
//!     let dt = 1.0 / SAMPLE_RATE as f64;
//!     let freq = 440.0;
//!     let signal: Vec<f64> = (0..SIZE)
//!         .map(|x| {
//!             (1..=10)
//!                 .map(|h| {
//!                     0.8f64.powi(h - 1)
//!                         * (2.0 * std::f64::consts::PI * x as f64 * dt * freq * h as f64).sin()
//!                 })
//!                 .sum()
//!         })
//!         .collect();
//!
//!     let mut detector = IterativeDetector::new(SIZE, DetectorConfig::default()).unwrap();
//!     let notes = detector.get_pitches(&signal, SAMPLE_RATE).unwrap();
//!
//!     assert_eq!(notes[0].name(), "A4");
//!     for note in notes.iter() {
//!         println!("{}: {} Hz, salience {}", note, note.frequency, note.salience);
//!     }
//! }
//! ```

pub use config::{DeflationScope, DetectorConfig};
pub use detector::iterative::{detect_pitches, IterativeDetector};
pub use detector::PolyphonicDetector;
pub use error::{DetectionError, DetectionResult};
pub use note::Note;

pub mod config;
pub mod detector;
pub mod error;
pub mod float;
pub mod note;
pub mod utils;
