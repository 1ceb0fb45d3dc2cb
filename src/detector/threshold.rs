//! Adaptive, lag-local salience thresholds.
//!
//! The threshold at lag $m$ is
//! $$ \theta(m) = \max\left(s \cdot \operatorname{median}\{ r(j) : j \in W(m) \}, \theta_0\right) $$
//! where $W(m)$ is the window $[m - w/2, m + w/2]$ clipped to the fundamental
//! period search range and $\theta_0$ is a fixed floor. An empty window yields
//! the floor. The table has to be rebuilt whenever the SACF changes.

use crate::config::DetectorConfig;
use crate::float::Float;
use crate::utils::stats::median;

#[derive(Debug, Clone, Copy)]
pub struct AdaptiveThreshold<T>
where
    T: Float,
{
    m_lo: usize,
    m_hi: usize,
    window_size: usize,
    scale: T,
    floor: T,
}

impl<T> AdaptiveThreshold<T>
where
    T: Float,
{
    pub fn new(config: &DetectorConfig) -> Self {
        AdaptiveThreshold {
            m_lo: config.m_lo,
            m_hi: config.m_hi,
            window_size: config.sliding_window_size,
            scale: T::from_f64(config.scale_factor).unwrap(),
            floor: T::from_f64(config.threshold_floor).unwrap(),
        }
    }

    /// Threshold at `lag` for the current values of `sacf`.
    pub fn at(&self, sacf: &[T], lag: usize) -> T {
        let half = self.window_size / 2;
        let start = self.m_lo.max(lag.saturating_sub(half));
        let end = self.m_hi.min(lag + half).min(sacf.len().saturating_sub(1));
        if sacf.is_empty() || start > end {
            return self.floor;
        }

        let mut window = sacf[start..=end].to_vec();
        match median(&mut window) {
            Some(m) => (m * self.scale).max(self.floor),
            None => self.floor,
        }
    }

    /// Thresholds for every lag of `sacf`.
    pub fn table(&self, sacf: &[T]) -> ThresholdTable<T> {
        ThresholdTable {
            values: (0..sacf.len()).map(|lag| self.at(sacf, lag)).collect(),
            floor: self.floor,
        }
    }
}

/// Per-lag thresholds for one state of the SACF.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable<T>
where
    T: Float,
{
    values: Vec<T>,
    floor: T,
}

impl<T> ThresholdTable<T>
where
    T: Float,
{
    /// Threshold at `lag`; lags past the table get the floor.
    pub fn at(&self, lag: usize) -> T {
        self.values.get(lag).copied().unwrap_or(self.floor)
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}
