use crate::error::{Result, SiftError};
use crate::types::Coord;

/// How much two accepted hits on the same protein may share before they conflict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlapThreshold {
    /// Number of shared residues tolerated. Conflict when the intersection is longer.
    Positions(Coord),
    /// Percentage of the shorter interval tolerated. Conflict when the
    /// normalized overlap fraction times 100 is larger.
    Percent(f64),
}

impl OverlapThreshold {
    /// True when an intersection of `shared` residues between two intervals,
    /// the shorter of which spans `shorter` residues, is a conflict.
    ///
    /// A shorter interval lying entirely inside the other (identical
    /// coordinates included) always conflicts, whatever the tolerance.
    pub fn is_exceeded(&self, shared: Coord, shorter: Coord) -> bool {
        if shared == 0 || shorter == 0 {
            return false;
        }
        if shared >= shorter {
            return true;
        }
        match *self {
            OverlapThreshold::Positions(max) => shared > max,
            OverlapThreshold::Percent(max) => {
                (shared as f64 / shorter as f64) * 100.0 > max
            }
        }
    }
}

impl std::fmt::Display for OverlapThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlapThreshold::Positions(n) => write!(f, "{n} positions"),
            OverlapThreshold::Percent(p) => write!(f, "{p}% of shorter hit"),
        }
    }
}

/// Run-wide thresholds for admission and overlap resolution.
#[derive(Debug, Clone)]
pub struct SiftConfig {
    /// Hits with a larger significance value (e-value) are rejected.
    pub max_significance: f64,
    /// Hits covering less of their domain model than this fraction are rejected.
    pub min_domain_coverage: f64,
    pub overlap: OverlapThreshold,
    /// Worker threads for per-protein resolution.
    pub threads: usize,
}

impl SiftConfig {
    /// Thresholds used by the annotation workflow: e-value 1e-5, 40% model
    /// coverage, at most 50 shared residues between kept domains.
    pub fn positional() -> Self {
        Self {
            max_significance: 1e-5,
            min_domain_coverage: 0.4,
            overlap: OverlapThreshold::Positions(50),
            threads: 1,
        }
    }

    /// Same admission thresholds, but overlap measured as 50% of the shorter hit.
    pub fn percent_of_shorter() -> Self {
        Self {
            overlap: OverlapThreshold::Percent(50.0),
            ..Self::positional()
        }
    }

    /// Check every threshold before any input is touched.
    pub fn validate(&self) -> Result<()> {
        if !self.max_significance.is_finite() || self.max_significance < 0.0 {
            return Err(SiftError::Configuration(format!(
                "max_significance must be a finite value >= 0, got {}",
                self.max_significance
            )));
        }
        if !(0.0..=1.0).contains(&self.min_domain_coverage) {
            return Err(SiftError::Configuration(format!(
                "min_domain_coverage must be between 0 and 1, got {}",
                self.min_domain_coverage
            )));
        }
        match self.overlap {
            OverlapThreshold::Positions(0) => {
                return Err(SiftError::Configuration(
                    "min_overlap must be a positive number of positions".to_string(),
                ));
            }
            OverlapThreshold::Percent(p) if !(p > 0.0 && p <= 100.0) => {
                return Err(SiftError::Configuration(format!(
                    "min_overlap percent must be in (0, 100], got {p}"
                )));
            }
            _ => {}
        }
        if self.threads == 0 {
            return Err(SiftError::Configuration(
                "threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self::positional()
    }
}
