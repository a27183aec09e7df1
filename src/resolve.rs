//! Per-protein overlap resolution.
//!
//! Hits are ranked by a total order (significance ascending, bit score
//! descending, start ascending, domain id ascending) and accepted greedily:
//! a hit is kept only when it does not conflict with any hit accepted before
//! it. Conflicting hits are dropped whole, never trimmed or merged.

use crate::config::OverlapThreshold;
use crate::hit::{HitRecord, MAX_COORD};
use crate::types::Coord;
use coitrees::{BasicCOITree, Interval, IntervalTree};
use std::cmp::Ordering;

/// A hit removed because a better-ranked hit already occupies its region.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapLoss {
    pub hit: HitRecord,
    /// The accepted hit it conflicted with (the best-ranked one if several).
    pub winner: HitRecord,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Mutually non-conflicting hits, best first.
    pub kept: Vec<HitRecord>,
    /// Rejected hits in rank order.
    pub lost: Vec<OverlapLoss>,
}

/// Number of residues shared by two closed intervals.
pub fn overlap_positions(a: &HitRecord, b: &HitRecord) -> Coord {
    let start = a.query_start.max(b.query_start);
    let end = a.query_end.min(b.query_end);
    if end < start {
        0
    } else {
        end - start + 1
    }
}

/// Shared residues divided by the length of the shorter hit, in [0, 1].
pub fn overlap_fraction(a: &HitRecord, b: &HitRecord) -> f64 {
    let shared = overlap_positions(a, b);
    if shared == 0 {
        return 0.0;
    }
    shared as f64 / a.length().min(b.length()) as f64
}

pub fn conflicts(a: &HitRecord, b: &HitRecord, threshold: &OverlapThreshold) -> bool {
    threshold.is_exceeded(overlap_positions(a, b), a.length().min(b.length()))
}

/// Resolution rank. `Less` means `a` is preferred over `b`.
pub fn priority(a: &HitRecord, b: &HitRecord) -> Ordering {
    a.significance
        .total_cmp(&b.significance)
        .then_with(|| b.bit_score.total_cmp(&a.bit_score))
        .then_with(|| a.query_start.cmp(&b.query_start))
        .then_with(|| a.domain_id.cmp(&b.domain_id))
        // Only reached for duplicated rows; keeps the order total.
        .then_with(|| a.query_end.cmp(&b.query_end))
        .then_with(|| a.domain_accession.cmp(&b.domain_accession))
        .then_with(|| a.domain_coverage.total_cmp(&b.domain_coverage))
}

/// Resolve one protein's admitted hits to a non-conflicting subset.
pub fn resolve(hits: Vec<HitRecord>, threshold: &OverlapThreshold) -> Vec<HitRecord> {
    resolve_detailed(hits, threshold).kept
}

/// Like [`resolve`], also reporting which accepted hit each rejection lost to.
pub fn resolve_detailed(mut hits: Vec<HitRecord>, threshold: &OverlapThreshold) -> Resolution {
    hits.sort_by(priority);
    if hits.len() < 2 {
        return Resolution { kept: hits, lost: Vec::new() };
    }

    let index = HitIndex::new(&hits);
    let mut accepted = vec![false; hits.len()];
    let mut blocked_by: Vec<Option<usize>> = vec![None; hits.len()];

    for idx in 0..hits.len() {
        match index.first_conflict(idx, &hits, &accepted, threshold) {
            None => accepted[idx] = true,
            Some(winner) => blocked_by[idx] = Some(winner),
        }
    }

    let winners: Vec<Option<HitRecord>> = blocked_by
        .iter()
        .map(|b| b.map(|w| hits[w].clone()))
        .collect();

    let mut resolution = Resolution::default();
    for (hit, winner) in hits.into_iter().zip(winners) {
        match winner {
            None => resolution.kept.push(hit),
            Some(winner) => resolution.lost.push(OverlapLoss { hit, winner }),
        }
    }
    resolution
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    rank: u32,
}

/// Static interval index over one protein's ranked hits.
struct HitIndex {
    tree: BasicCOITree<Slot, u32>,
}

impl HitIndex {
    fn new(ranked: &[HitRecord]) -> Self {
        // COITree intervals are end-inclusive, same as hit coordinates.
        debug_assert!(ranked.iter().all(|h| h.query_end <= MAX_COORD));
        let intervals: Vec<Interval<Slot>> = ranked
            .iter()
            .enumerate()
            .map(|(rank, h)| {
                Interval::new(
                    h.query_start as i32,
                    h.query_end as i32,
                    Slot { rank: rank as u32 },
                )
            })
            .collect();
        Self { tree: BasicCOITree::new(&intervals) }
    }

    /// Best-ranked accepted hit that conflicts with `ranked[idx]`, if any.
    fn first_conflict(
        &self,
        idx: usize,
        ranked: &[HitRecord],
        accepted: &[bool],
        threshold: &OverlapThreshold,
    ) -> Option<usize> {
        let hit = &ranked[idx];
        let mut found: Option<usize> = None;
        self.tree.query(hit.query_start as i32, hit.query_end as i32, |node| {
            let other = node.metadata.rank as usize;
            if other == idx || !accepted[other] {
                return;
            }
            if found.is_some_and(|f| f < other) {
                return;
            }
            if conflicts(hit, &ranked[other], threshold) {
                found = Some(other);
            }
        });
        found
    }
}
