//! Per-protein loss accounting and the run-level aggregate.

use std::iter::Sum;
use std::ops::Add;

/// Why a protein appears in the loss report with nothing to account for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossNote {
    /// Listed in the predicted-protein set but absent from the search table.
    NoHits,
}

impl LossNote {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossNote::NoHits => "no_hits",
        }
    }
}

/// Counts for one protein, fixed once the protein has been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossRecord {
    pub protein_id: String,
    pub raw_count: usize,
    pub admitted_count: usize,
    pub resolved_count: usize,
    pub fully_discarded: bool,
    pub note: Option<LossNote>,
}

impl LossRecord {
    pub fn new(
        protein_id: impl Into<String>,
        raw_count: usize,
        admitted_count: usize,
        resolved_count: usize,
    ) -> Self {
        debug_assert!(resolved_count <= admitted_count && admitted_count <= raw_count);
        Self {
            protein_id: protein_id.into(),
            raw_count,
            admitted_count,
            resolved_count,
            fully_discarded: raw_count > 0 && resolved_count == 0,
            note: None,
        }
    }

    /// Record for a known protein without any search hit.
    pub fn without_hits(protein_id: impl Into<String>) -> Self {
        Self {
            note: Some(LossNote::NoHits),
            ..Self::new(protein_id, 0, 0, 0)
        }
    }
}

/// Run-level totals, built by summing per-protein records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LossSummary {
    pub proteins: usize,
    pub fully_discarded: usize,
    pub raw_hits: usize,
    pub admitted_hits: usize,
    pub resolved_hits: usize,
    pub proteins_without_hits: usize,
}

impl LossSummary {
    pub fn of(record: &LossRecord) -> Self {
        Self {
            proteins: 1,
            fully_discarded: record.fully_discarded as usize,
            raw_hits: record.raw_count,
            admitted_hits: record.admitted_count,
            resolved_hits: record.resolved_count,
            proteins_without_hits: (record.raw_count == 0) as usize,
        }
    }

    /// Nothing at all came in: no hit rows were read.
    pub fn is_empty_input(&self) -> bool {
        self.raw_hits == 0
    }
}

impl Add for LossSummary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            proteins: self.proteins + rhs.proteins,
            fully_discarded: self.fully_discarded + rhs.fully_discarded,
            raw_hits: self.raw_hits + rhs.raw_hits,
            admitted_hits: self.admitted_hits + rhs.admitted_hits,
            resolved_hits: self.resolved_hits + rhs.resolved_hits,
            proteins_without_hits: self.proteins_without_hits + rhs.proteins_without_hits,
        }
    }
}

impl<'a> Sum<&'a LossRecord> for LossSummary {
    fn sum<I: Iterator<Item = &'a LossRecord>>(iter: I) -> Self {
        iter.map(LossSummary::of).fold(LossSummary::default(), Add::add)
    }
}
