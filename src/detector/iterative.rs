//! Iterative estimate-and-cancel detection.
//!
//! Each round picks the most salient harmonic series left in the SACF, emits
//! it as a [Note] and deflates its footprint so the next round can find a
//! weaker pitch. A note already reported is deflated again but not repeated.
//! [Iteration] is the round-by-round state machine; [IterativeDetector]
//! builds it from a frame.

use log::{debug, trace};

use crate::config::DetectorConfig;
use crate::detector::bands::BandSplitter;
use crate::detector::deflation::{Deflation, Deflator};
use crate::detector::internals::DetectorInternals;
use crate::detector::sacf::Sacf;
use crate::detector::salience::rank_candidates;
use crate::detector::threshold::AdaptiveThreshold;
use crate::detector::PolyphonicDetector;
use crate::error::{DetectionError, DetectionResult};
use crate::float::Float;
use crate::note::Note;
use crate::utils::peak::detect_peaks;

/// Deflation has to take at least this fraction off the winning peak for the
/// rounds to go on.
const MIN_PEAK_DROP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Done,
}

/// Detection rounds over one SACF.
///
/// Every call to [Iterator::next] runs rounds until one yields a pitch not
/// reported before. The rounds end, leaving the state [State::Done], when
/// a round finds nothing salient, when deflation no longer lowers the winning
/// peak, or after `max_iterations` rounds.
pub struct Iteration<T>
where
    T: Float,
{
    sacf: Sacf<T>,
    sample_rate: usize,
    m_lo: usize,
    m_hi: usize,
    m_max: usize,
    max_iterations: usize,
    salience_ratio: T,
    relative_salience: T,
    threshold: AdaptiveThreshold<T>,
    deflator: Deflator,
    /// Salience of the first reported pitch.
    leading_salience: Option<T>,
    reported: Vec<i32>,
    last_deflation: Option<Deflation<T>>,
    rounds: usize,
    state: State,
}

impl<T> Iteration<T>
where
    T: Float,
{
    pub fn new(sacf: Sacf<T>, sample_rate: usize, config: &DetectorConfig) -> Self {
        Iteration {
            sacf,
            sample_rate,
            m_lo: config.m_lo,
            m_hi: config.m_hi,
            m_max: config.m_max,
            max_iterations: config.max_iterations,
            salience_ratio: T::from_f64(config.salience_ratio).unwrap(),
            relative_salience: T::from_f64(config.relative_salience).unwrap(),
            threshold: AdaptiveThreshold::new(config),
            deflator: Deflator {
                m_max: config.m_max,
                taper: config.deflation_taper,
                scope: config.deflation_scope,
            },
            leading_salience: None,
            reported: vec![],
            last_deflation: None,
            rounds: 0,
            state: State::Running,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Number of completed deflation rounds.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn sacf(&self) -> &Sacf<T> {
        &self.sacf
    }

    /// What the most recent round removed from the SACF.
    pub fn last_deflation(&self) -> Option<&Deflation<T>> {
        self.last_deflation.as_ref()
    }

    fn finish(&mut self, reason: &str) -> Option<Note<T>> {
        debug!("done after {} rounds: {}", self.rounds, reason);
        self.state = State::Done;
        None
    }

    fn step(&mut self) -> Option<Note<T>> {
        while self.state == State::Running {
            if let Some(note) = self.round() {
                return Some(note);
            }
        }
        None
    }

    /// Run one round. Yields nothing when the rounds are over or the winner
    /// had already been reported.
    fn round(&mut self) -> Option<Note<T>> {
        if self.rounds >= self.max_iterations {
            return self.finish("iteration limit reached");
        }

        let thresholds = self.threshold.table(self.sacf.values());
        let median = self.sacf.median();
        let (m_lo, m_hi) = (self.m_lo, self.m_hi);
        let lags: Vec<usize> = detect_peaks(self.sacf.values())
            .filter(|&(lag, value)| {
                lag >= m_lo && lag <= m_hi && value > median && value > thresholds.at(lag)
            })
            .map(|(lag, _)| lag)
            .collect();
        trace!("round {}: {} candidate peaks", self.rounds, lags.len());
        if lags.is_empty() {
            return self.finish("no candidate peaks");
        }

        let winner = match rank_candidates(self.sacf.values(), &lags, &thresholds, self.m_max)
            .into_iter()
            .next()
        {
            Some(candidate) => candidate,
            None => return self.finish("no harmonic series"),
        };

        let own_lag = winner.period.round().to_usize().unwrap_or(winner.lag);
        let threshold = thresholds.at(own_lag);
        if winner.salience <= self.salience_ratio * threshold {
            return self.finish("best candidate is not salient enough");
        }
        if let Some(leading) = self.leading_salience {
            if winner.salience < self.relative_salience * leading {
                return self.finish("best candidate is weak next to the leading pitch");
            }
        }

        let note = match Note::from_period(winner.period, self.sample_rate, winner.salience) {
            Some(note) => note,
            None => return self.finish("period has no note"),
        };
        debug!(
            "round {}: {} at period {} ({} Hz), salience {} against threshold {}",
            self.rounds, note, winner.period, note.frequency, winner.salience, threshold
        );

        let before = self.sacf.peek(winner.lag).unwrap_or_else(T::zero);
        let deflation = self.deflator.deflate(&mut self.sacf, winner.lag, threshold);
        trace!("round {}: deflated {} peaks", self.rounds, deflation.lags.len());
        self.last_deflation = Some(deflation);
        self.rounds += 1;

        let after = self.sacf.peek(winner.lag).unwrap_or_else(T::zero);
        if after >= before * (T::one() - T::from_f64(MIN_PEAK_DROP).unwrap()) {
            self.finish("deflation left the winning peak in place");
        }

        if self.reported.contains(&note.key) {
            debug!("round {}: {} was already reported", self.rounds - 1, note);
            return None;
        }
        self.leading_salience.get_or_insert(winner.salience);
        self.reported.push(note.key);
        Some(note)
    }
}

impl<T> Iterator for Iteration<T>
where
    T: Float,
{
    type Item = Note<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}

/// Polyphonic detector for frames of a fixed size.
pub struct IterativeDetector<T>
where
    T: Float,
{
    config: DetectorConfig,
    internals: DetectorInternals<T>,
}

impl<T> IterativeDetector<T>
where
    T: Float,
{
    pub fn new(size: usize, config: DetectorConfig) -> DetectionResult<Self> {
        if size == 0 {
            return Err(DetectionError::EmptyFrame);
        }
        config.validate()?;
        Ok(IterativeDetector {
            config,
            internals: DetectorInternals::new(size),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Frame length the detector accepts.
    pub fn size(&self) -> usize {
        self.internals.size
    }

    fn check_frame(&self, signal: &[T], sample_rate: usize) -> DetectionResult<()> {
        if signal.is_empty() {
            return Err(DetectionError::EmptyFrame);
        }
        if signal.len() != self.internals.size {
            return Err(DetectionError::FrameSizeMismatch {
                expected: self.internals.size,
                actual: signal.len(),
            });
        }
        if sample_rate == 0 {
            return Err(DetectionError::InvalidSampleRate(sample_rate));
        }
        Ok(())
    }

    /// Split `signal` into its two bands and sum their generalized
    /// autocorrelations.
    pub fn summary_autocorrelation(
        &mut self,
        signal: &[T],
        sample_rate: usize,
    ) -> DetectionResult<Sacf<T>> {
        self.check_frame(signal, sample_rate)?;

        let mut splitter = BandSplitter::new(&self.config, self.internals.size, sample_rate)?;
        let bands = splitter.split(signal);
        let gamma = T::from_f64(self.config.compression_gamma).unwrap();
        let summary = self
            .internals
            .summary_autocorrelation(&bands.low, &bands.high, gamma);

        Ok(Sacf::new(summary))
    }

    /// Start the detection rounds for `signal` without running any of them.
    pub fn iterate(&mut self, signal: &[T], sample_rate: usize) -> DetectionResult<Iteration<T>> {
        let sacf = self.summary_autocorrelation(signal, sample_rate)?;
        Ok(Iteration::new(sacf, sample_rate, &self.config))
    }
}

impl<T> PolyphonicDetector<T> for IterativeDetector<T>
where
    T: Float,
{
    fn get_pitches(&mut self, signal: &[T], sample_rate: usize) -> DetectionResult<Vec<Note<T>>> {
        Ok(self.iterate(signal, sample_rate)?.collect())
    }
}

/// Detect the pitches in `frame` with the default configuration and return
/// their note names, most salient first.
pub fn detect_pitches<T: Float>(frame: &[T], sample_rate: usize) -> DetectionResult<Vec<String>> {
    let mut detector = IterativeDetector::new(frame.len(), DetectorConfig::default())?;
    let notes = detector.get_pitches(frame, sample_rate)?;
    Ok(notes.iter().map(Note::name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Triangular bumps at every multiple of `period` on a zero background.
    fn comb(len: usize, period: usize) -> Vec<f64> {
        let mut sacf = vec![0.0; len];
        let mut lag = period;
        while lag + 1 < len {
            sacf[lag] = 1.0;
            sacf[lag - 1] = 0.5;
            sacf[lag + 1] = 0.5;
            lag += period;
        }
        sacf
    }

    #[test]
    fn flat_sacf_finishes_immediately() {
        let sacf = Sacf::new(vec![0.0f64; 2048]);
        let mut iteration = Iteration::new(sacf, 44100, &DetectorConfig::default());
        assert_eq!(iteration.state(), State::Running);
        assert!(iteration.next().is_none());
        assert_eq!(iteration.state(), State::Done);
        assert_eq!(iteration.rounds(), 0);
    }

    #[test]
    fn one_series_one_note() {
        let original = comb(2100, 200);
        let sacf = Sacf::new(original.clone());
        let mut iteration = Iteration::new(sacf, 44100, &DetectorConfig::default());
        assert!(iteration.last_deflation().is_none());

        let note = iteration.next().unwrap();
        assert_eq!(note.name(), "A3");
        assert_eq!(note.period, 200.0);
        assert_eq!(iteration.rounds(), 1);
        assert_eq!(iteration.state(), State::Running);
        let deflation = iteration.last_deflation().unwrap();
        assert_eq!(&deflation.lags[..3], &[200, 400, 600]);
        assert_eq!(iteration.sacf().peek(200), Some(0.0));
        for lag in [200, 400, 600].iter() {
            assert!(iteration.sacf().peek(*lag).unwrap() <= original[*lag]);
        }

        assert!(iteration.next().is_none());
        assert_eq!(iteration.state(), State::Done);
        assert_eq!(iteration.rounds(), 1);
    }

    #[test]
    fn peak_left_in_place_ends_the_rounds() {
        // With m_max below twice the lag the series is a single peak, which
        // leaves nothing to fit and nothing to remove.
        let mut sacf = vec![0.0; 1000];
        sacf[499] = 0.5;
        sacf[500] = 1.0;
        sacf[501] = 0.5;
        let config = DetectorConfig {
            m_max: 800,
            ..Default::default()
        };
        let mut iteration = Iteration::new(Sacf::new(sacf), 44100, &config);

        let note = iteration.next().unwrap();
        assert_eq!(note.name(), "F2");
        assert_eq!(iteration.sacf().peek(500), Some(1.0));
        assert_eq!(iteration.last_deflation().unwrap().lags, vec![500]);
        assert_eq!(iteration.state(), State::Done);
        assert!(iteration.next().is_none());
        assert_eq!(iteration.rounds(), 1);
    }

    #[test]
    fn rounds_are_bounded() {
        let config = DetectorConfig {
            max_iterations: 1,
            ..Default::default()
        };
        let mut iteration = Iteration::new(Sacf::new(comb(2100, 200)), 44100, &config);
        assert!(iteration.next().is_some());
        assert!(iteration.next().is_none());
        assert_eq!(iteration.state(), State::Done);
        assert_eq!(iteration.rounds(), 1);
        // Exhausted iterators stay exhausted.
        assert!(iteration.next().is_none());
    }

    #[test]
    fn silence_is_not_an_error() {
        let mut detector = IterativeDetector::<f64>::new(1024, DetectorConfig::default()).unwrap();
        let mut iteration = detector.iterate(&vec![0.0; 1024], 44100).unwrap();
        assert_eq!(iteration.sacf().len(), 1024);
        assert!(iteration.next().is_none());
        assert_eq!(iteration.rounds(), 0);
    }

    #[test]
    fn frame_checks() {
        assert_eq!(
            IterativeDetector::<f64>::new(0, DetectorConfig::default()).err(),
            Some(DetectionError::EmptyFrame)
        );

        let mut detector = IterativeDetector::<f64>::new(512, DetectorConfig::default()).unwrap();
        assert_eq!(detector.size(), 512);
        assert_eq!(detector.config(), &DetectorConfig::default());
        assert_eq!(
            detector.get_pitches(&[0.0; 256], 44100),
            Err(DetectionError::FrameSizeMismatch {
                expected: 512,
                actual: 256
            })
        );
        assert_eq!(
            detector.get_pitches(&[0.0; 512], 0),
            Err(DetectionError::InvalidSampleRate(0))
        );
        assert_eq!(detect_pitches::<f32>(&[], 44100), Err(DetectionError::EmptyFrame));
    }
}
