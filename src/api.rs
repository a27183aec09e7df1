//! Public library API for sifting domain hits.
//!
//! # Example
//!
//! ```no_run
//! use domsift_rs::{SiftConfig, sift_hits};
//! use domsift_rs::hit::{HitReader, ParseOptions, TableFormat};
//!
//! # fn main() -> anyhow::Result<()> {
//! let reader = HitReader::open("proteins.domtblout", ParseOptions::new(TableFormat::Domtblout))?;
//! let hits = reader.collect::<Result<Vec<_>, _>>()?;
//! let output = sift_hits(hits, &[], &SiftConfig::default())?;
//! println!("{} of {} proteins lost every hit", output.summary.fully_discarded, output.summary.proteins);
//! # Ok(())
//! # }
//! ```

use crate::config::SiftConfig;
use crate::filter::{self, Rejection};
use crate::hit::HitRecord;
use crate::loss::{LossRecord, LossSummary};
use crate::pipeline;
use crate::resolve::{self, priority};
use anyhow::Result;

/// Why a hit is absent from the cleaned table.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    Threshold(Rejection),
    /// Lost to a better-ranked accepted hit on the same protein.
    Overlap { winner: HitRecord },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedHit {
    pub hit: HitRecord,
    pub reason: DropReason,
}

/// Everything produced for one protein.
#[derive(Debug, Clone)]
pub struct ProteinOutcome {
    pub loss: LossRecord,
    /// Non-conflicting hits, best first.
    pub resolved: Vec<HitRecord>,
    /// Filtered and overlap-rejected hits, in rank order.
    pub dropped: Vec<DroppedHit>,
}

/// Result of a whole run: one outcome per protein, sorted by protein id.
#[derive(Debug, Clone, Default)]
pub struct SiftOutput {
    pub outcomes: Vec<ProteinOutcome>,
    pub summary: LossSummary,
}

/// Filter and resolve the hits of a single protein.
///
/// All hits must share `protein_id`. An empty slice yields a `no_hits` loss
/// record rather than an error.
pub fn sift_protein(protein_id: &str, hits: Vec<HitRecord>, config: &SiftConfig) -> ProteinOutcome {
    if hits.is_empty() {
        return ProteinOutcome {
            loss: LossRecord::without_hits(protein_id),
            resolved: Vec::new(),
            dropped: Vec::new(),
        };
    }
    debug_assert!(hits.iter().all(|h| h.protein_id == protein_id));

    let raw_count = hits.len();
    let (admitted, rejected) = filter::partition(hits, config);
    let admitted_count = admitted.len();
    let resolution = resolve::resolve_detailed(admitted, &config.overlap);

    let mut dropped: Vec<DroppedHit> = rejected
        .into_iter()
        .map(|(hit, why)| DroppedHit { hit, reason: DropReason::Threshold(why) })
        .chain(resolution.lost.into_iter().map(|loss| DroppedHit {
            hit: loss.hit,
            reason: DropReason::Overlap { winner: loss.winner },
        }))
        .collect();
    dropped.sort_by(|a, b| priority(&a.hit, &b.hit));

    ProteinOutcome {
        loss: LossRecord::new(protein_id, raw_count, admitted_count, resolution.kept.len()),
        resolved: resolution.kept,
        dropped,
    }
}

/// Group `hits` by protein and sift every protein, in parallel when
/// `config.threads > 1`.
///
/// `known_proteins` lists proteins expected in the run (for example the ids
/// of the predicted-protein FASTA); those without any hit are reported with
/// a `no_hits` note. Output order does not depend on the thread count.
pub fn sift_hits(
    hits: Vec<HitRecord>,
    known_proteins: &[String],
    config: &SiftConfig,
) -> Result<SiftOutput> {
    config.validate()?;
    let groups = pipeline::group_by_protein(hits.into_iter().map(Ok), known_proteins)?;
    let outcomes = pipeline::sift_groups(groups, config)?;
    let summary = outcomes.iter().map(|o| &o.loss).sum();
    Ok(SiftOutput { outcomes, summary })
}
