use crate::config::SiftConfig;
use crate::hit::HitRecord;

/// Why a hit never reached overlap resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Significance,
    Coverage,
    Both,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Significance => "significance",
            Rejection::Coverage => "coverage",
            Rejection::Both => "significance+coverage",
        }
    }
}

/// Admission test: `significance <= max` and `coverage >= min`.
pub fn admit(hit: &HitRecord, max_significance: f64, min_domain_coverage: f64) -> bool {
    check(hit, max_significance, min_domain_coverage).is_none()
}

/// Same test as [`admit`], naming the failed threshold(s).
pub fn check(hit: &HitRecord, max_significance: f64, min_domain_coverage: f64) -> Option<Rejection> {
    let sig_ok = hit.significance <= max_significance;
    let cov_ok = hit.domain_coverage >= min_domain_coverage;
    match (sig_ok, cov_ok) {
        (true, true) => None,
        (false, true) => Some(Rejection::Significance),
        (true, false) => Some(Rejection::Coverage),
        (false, false) => Some(Rejection::Both),
    }
}

/// Split one protein's hits into admitted hits and threshold rejections,
/// keeping input order on both sides.
pub fn partition(
    hits: Vec<HitRecord>,
    config: &SiftConfig,
) -> (Vec<HitRecord>, Vec<(HitRecord, Rejection)>) {
    let mut admitted = Vec::with_capacity(hits.len());
    let mut rejected = Vec::new();
    for hit in hits {
        match check(&hit, config.max_significance, config.min_domain_coverage) {
            None => admitted.push(hit),
            Some(reason) => rejected.push((hit, reason)),
        }
    }
    (admitted, rejected)
}
