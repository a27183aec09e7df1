use crate::api::{sift_protein, ProteinOutcome, SiftOutput};
use crate::config::SiftConfig;
use crate::error;
use crate::hit::{HitReader, HitRecord, ParseOptions};
use crate::loss::LossSummary;
use crate::proteins;
use crate::types::{GroupIdx, HashMap, HashMapExt};
use crate::writer::{self, OutputPaths};
use anyhow::{Context, Result};
use crossfire::mpmc;
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info, warn};

/// All hits of one protein, the unit of resolution.
#[derive(Debug, Clone)]
pub struct ProteinGroup {
    pub protein_id: String,
    pub hits: Vec<HitRecord>,
}

/// Inputs and thresholds of a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub parse: ParseOptions,
    /// Predicted-protein FASTA; proteins in it without hits are reported.
    pub proteins: Option<PathBuf>,
    pub output_prefix: PathBuf,
    pub config: SiftConfig,
}

pub fn run(options: &RunOptions) -> Result<LossSummary> {
    options.config.validate()?;
    info!(
        input = %options.input.display(),
        format = ?options.parse.format,
        max_significance = options.config.max_significance,
        min_domain_coverage = options.config.min_domain_coverage,
        overlap = %options.config.overlap,
        threads = options.config.threads,
        "sifting domain hits"
    );

    let known = match &options.proteins {
        Some(path) => proteins::load_protein_ids(path)?,
        None => Vec::new(),
    };

    let reader = HitReader::open(&options.input, options.parse)
        .with_context(|| format!("failed to open hit table {}", options.input.display()))?;
    let groups = group_by_protein(reader, &known)?;
    let outcomes = sift_groups(groups, &options.config)?;
    let summary: LossSummary = outcomes.iter().map(|o| &o.loss).sum();
    let output = SiftOutput { outcomes, summary };

    if summary.is_empty_input() {
        warn!(input = %options.input.display(), "no hit records in input");
    }
    report_missing(&output);

    let paths = OutputPaths::from_prefix(&options.output_prefix);
    writer::write_outputs(&paths, &output)
        .with_context(|| format!("failed to write outputs for {}", options.output_prefix.display()))?;
    info!(
        resolved = %paths.resolved.display(),
        dropped = %paths.dropped.display(),
        loss = %paths.loss.display(),
        "wrote outputs"
    );
    Ok(summary)
}

fn report_missing(output: &SiftOutput) {
    let missing: Vec<&str> = output
        .outcomes
        .iter()
        .filter(|o| o.loss.fully_discarded)
        .map(|o| o.loss.protein_id.as_str())
        .collect();
    if !missing.is_empty() {
        info!(count = missing.len(), "proteins lost every hit");
        debug!(proteins = ?missing, "fully discarded proteins");
    }
}

/// Collect hits into per-protein groups sorted by protein id.
///
/// The whole input is consumed before anything is returned, so a malformed
/// row aborts the run before any protein is processed. Hits of a protein do
/// not need to be contiguous in the input.
pub fn group_by_protein<I>(hits: I, known_proteins: &[String]) -> Result<Vec<ProteinGroup>>
where
    I: IntoIterator<Item = error::Result<HitRecord>>,
{
    let mut index: HashMap<String, GroupIdx> = HashMap::new();
    let mut groups: Vec<ProteinGroup> = Vec::new();

    for result in hits {
        let hit = result?;
        let idx = match index.get(&hit.protein_id) {
            Some(&idx) => idx,
            None => {
                let idx = groups.len();
                index.insert(hit.protein_id.clone(), idx);
                groups.push(ProteinGroup {
                    protein_id: hit.protein_id.clone(),
                    hits: Vec::new(),
                });
                idx
            }
        };
        groups[idx].hits.push(hit);
    }

    for protein_id in known_proteins {
        if !index.contains_key(protein_id) {
            index.insert(protein_id.clone(), groups.len());
            groups.push(ProteinGroup {
                protein_id: protein_id.clone(),
                hits: Vec::new(),
            });
        }
    }

    groups.sort_by(|a, b| a.protein_id.cmp(&b.protein_id));
    Ok(groups)
}

struct WorkItem {
    idx: GroupIdx,
    group: ProteinGroup,
}

struct ResultItem {
    idx: GroupIdx,
    outcome: ProteinOutcome,
}

/// Sift every group, returning outcomes in group order.
///
/// Groups share no state, so with more than one thread they are fanned out
/// to scoped workers and reassembled by index.
pub fn sift_groups(groups: Vec<ProteinGroup>, config: &SiftConfig) -> Result<Vec<ProteinOutcome>> {
    if config.threads <= 1 || groups.len() < 2 {
        return Ok(groups
            .into_iter()
            .map(|g| sift_protein(&g.protein_id, g.hits, config))
            .collect());
    }

    crossfire::detect_backoff_cfg();
    let worker_count = config.threads.min(groups.len());
    let cap = worker_count.saturating_mul(4).max(8);
    let (tx_work, rx_work) = mpmc::bounded_blocking::<WorkItem>(cap);
    let (tx_res, rx_res) = mpmc::unbounded_blocking::<ResultItem>();
    let total_groups = groups.len();

    thread::scope(|scope| -> Result<Vec<ProteinOutcome>> {
        for _ in 0..worker_count {
            let rx_work = rx_work.clone();
            let tx_res = tx_res.clone();
            scope.spawn(move || {
                while let Ok(item) = rx_work.recv() {
                    let outcome = sift_protein(&item.group.protein_id, item.group.hits, config);
                    let _ = tx_res.send(ResultItem { idx: item.idx, outcome });
                }
            });
        }
        drop(tx_res);
        drop(rx_work);

        for (idx, group) in groups.into_iter().enumerate() {
            tx_work
                .send(WorkItem { idx, group })
                .map_err(|_| anyhow::anyhow!("worker queue closed"))?;
        }
        drop(tx_work);

        let mut slots: Vec<Option<ProteinOutcome>> = Vec::with_capacity(total_groups);
        slots.resize_with(total_groups, || None);
        for _ in 0..total_groups {
            let res = rx_res
                .recv()
                .map_err(|_| anyhow::anyhow!("worker result channel closed"))?;
            slots[res.idx] = Some(res.outcome);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| slot.with_context(|| format!("no result for protein group {idx}")))
            .collect()
    })
}
