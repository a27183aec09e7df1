//! Tab-separated output tables.
//!
//! A run writes three files next to each other and either all of them
//! appear or none does: each is written to a `.tmp` sibling first, the
//! temporaries are renamed into place only after every table succeeded, and
//! a failed rename takes back the tables already moved.

use crate::api::{DropReason, ProteinOutcome, SiftOutput};
use crate::error::Result;
use crate::hit::HitRecord;
use crate::loss::LossSummary;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

const HIT_COLUMNS: [&str; 14] = [
    "protein_id",
    "protein_length",
    "domain_id",
    "domain_name",
    "pfam_id_version",
    "pfam_id",
    "query_start",
    "query_end",
    "length",
    "model_length",
    "significance",
    "bit_score",
    "domain_coverage",
    "aa_coverage",
];

const LOSS_COLUMNS: [&str; 6] = [
    "protein_id",
    "raw_count",
    "admitted_count",
    "resolved_count",
    "fully_discarded",
    "note",
];

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub resolved: PathBuf,
    pub dropped: PathBuf,
    pub loss: PathBuf,
}

impl OutputPaths {
    /// `PREFIX.resolved_hits.tsv`, `PREFIX.dropped_hits.tsv`, `PREFIX.loss_report.tsv`.
    pub fn from_prefix(prefix: &Path) -> Self {
        let with_suffix = |suffix: &str| {
            let mut name = prefix.as_os_str().to_os_string();
            name.push(suffix);
            PathBuf::from(name)
        };
        Self {
            resolved: with_suffix(".resolved_hits.tsv"),
            dropped: with_suffix(".dropped_hits.tsv"),
            loss: with_suffix(".loss_report.tsv"),
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard(paths: &[&Path]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

pub fn write_outputs(paths: &OutputPaths, output: &SiftOutput) -> Result<()> {
    let targets = [&paths.resolved, &paths.dropped, &paths.loss];
    let staged: Vec<PathBuf> = targets.iter().map(|p| tmp_path(p)).collect();
    let staged_refs: Vec<&Path> = staged.iter().map(PathBuf::as_path).collect();

    let written = (|| -> Result<()> {
        write_file(&staged[0], |w| write_resolved(w, &output.outcomes))?;
        write_file(&staged[1], |w| write_dropped(w, &output.outcomes))?;
        write_file(&staged[2], |w| write_loss_report(w, &output.outcomes, &output.summary))?;
        Ok(())
    })();
    if let Err(e) = written {
        discard(&staged_refs);
        return Err(e);
    }

    let mut placed: Vec<&Path> = Vec::with_capacity(targets.len());
    for (tmp, target) in staged.iter().zip(targets) {
        if let Err(e) = fs::rename(tmp, target) {
            warn!(target = %target.display(), "rename failed, removing partial output set");
            discard(&placed);
            discard(&staged_refs);
            return Err(e.into());
        }
        placed.push(target.as_path());
    }
    Ok(())
}

fn write_file<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut csv::Writer<File>) -> Result<()>,
{
    // Loss report trailers are shorter than its header.
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    body(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn hit_fields(hit: &HitRecord) -> Vec<String> {
    vec![
        hit.protein_id.clone(),
        or_dash(hit.protein_length),
        hit.domain_id.clone(),
        or_dash(hit.domain_name.as_deref()),
        hit.domain_accession.clone(),
        hit.family_accession(),
        hit.query_start.to_string(),
        hit.query_end.to_string(),
        hit.length().to_string(),
        or_dash(hit.model_length),
        format!("{:e}", hit.significance),
        hit.bit_score.to_string(),
        hit.domain_coverage.to_string(),
        or_dash(hit.aa_coverage),
    ]
}

/// Cleaned table: one row per resolved hit.
pub fn write_resolved<W: Write>(w: &mut csv::Writer<W>, outcomes: &[ProteinOutcome]) -> Result<()> {
    w.write_record(HIT_COLUMNS)?;
    for hit in outcomes.iter().flat_map(|o| &o.resolved) {
        w.write_record(hit_fields(hit))?;
    }
    Ok(())
}

/// Drop ledger: every hit missing from the cleaned table, with the reason.
pub fn write_dropped<W: Write>(w: &mut csv::Writer<W>, outcomes: &[ProteinOutcome]) -> Result<()> {
    w.write_record(HIT_COLUMNS.iter().chain(&["reason", "lost_to"]))?;
    for dropped in outcomes.iter().flat_map(|o| &o.dropped) {
        let mut fields = hit_fields(&dropped.hit);
        match &dropped.reason {
            DropReason::Threshold(why) => {
                fields.push(why.as_str().to_string());
                fields.push("-".to_string());
            }
            DropReason::Overlap { winner } => {
                fields.push("overlap".to_string());
                fields.push(format!(
                    "{}:{}-{}",
                    winner.domain_id, winner.query_start, winner.query_end
                ));
            }
        }
        w.write_record(&fields)?;
    }
    Ok(())
}

/// Per-protein counts followed by `#`-prefixed run totals.
pub fn write_loss_report<W: Write>(
    w: &mut csv::Writer<W>,
    outcomes: &[ProteinOutcome],
    summary: &LossSummary,
) -> Result<()> {
    w.write_record(LOSS_COLUMNS)?;
    for loss in outcomes.iter().map(|o| &o.loss) {
        w.write_record([
            loss.protein_id.clone(),
            loss.raw_count.to_string(),
            loss.admitted_count.to_string(),
            loss.resolved_count.to_string(),
            loss.fully_discarded.to_string(),
            loss.note.map_or("-", |n| n.as_str()).to_string(),
        ])?;
    }

    let totals = [
        ("proteins_processed", summary.proteins),
        ("proteins_fully_discarded", summary.fully_discarded),
        ("proteins_without_hits", summary.proteins_without_hits),
        ("raw_hits", summary.raw_hits),
        ("admitted_hits", summary.admitted_hits),
        ("resolved_hits", summary.resolved_hits),
    ];
    for (name, value) in totals {
        w.write_record([format!("# {name}"), value.to_string()])?;
    }
    if summary.is_empty_input() {
        w.write_record(["# note", "empty input: no hit records were read"])?;
    }
    Ok(())
}
