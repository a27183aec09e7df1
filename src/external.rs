//! External annotation and profile-search programs.
//!
//! Both programs are black boxes: each takes one input file and leaves one
//! output file behind. The traits let tests substitute canned outputs.

use crate::config::SiftConfig;
use crate::error::{Result, SiftError};
use crate::hit::{detect_format, CoordinateSystem, ParseOptions, SearchProgram};
use crate::loss::LossSummary;
use crate::pipeline::{self, RunOptions};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// Predicts proteins from an assembly; returns the protein FASTA path.
pub trait Annotator {
    fn annotate(&self, assembly: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// Searches predicted proteins against a domain-model database; returns the
/// raw search table path.
pub trait DomainSearcher {
    fn search(&self, proteins: &Path, out_dir: &Path) -> Result<PathBuf>;
}

fn sample_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sample")
        .to_string()
}

fn run_tool(tool: &str, command: &mut Command) -> Result<()> {
    info!(tool, command = ?command, "running external tool");
    let output = command.output()?;
    if !output.status.success() {
        return Err(SiftError::ExternalTool {
            tool: tool.to_string(),
            status: output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string()),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

fn expect_output(tool: &str, path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(SiftError::MissingOutput { tool: tool.to_string(), path })
    }
}

/// Bakta genome annotation; yields `OUT_DIR/NAME.faa`.
#[derive(Debug, Clone)]
pub struct BaktaAnnotator {
    pub program: PathBuf,
    pub db: PathBuf,
    pub threads: usize,
}

impl Annotator for BaktaAnnotator {
    fn annotate(&self, assembly: &Path, out_dir: &Path) -> Result<PathBuf> {
        let name = sample_name(assembly);
        run_tool(
            "bakta",
            Command::new(&self.program)
                .arg("--db")
                .arg(&self.db)
                .arg("--output")
                .arg(out_dir)
                .arg("--prefix")
                .arg(&name)
                .arg("--threads")
                .arg(self.threads.to_string())
                .arg("--force")
                .arg(assembly),
        )?;
        expect_output("bakta", out_dir.join(format!("{name}.faa")))
    }
}

/// HMMER `hmmsearch` with gathering cutoffs and a fixed database size, so
/// e-values are comparable across genomes; yields a per-domain table.
#[derive(Debug, Clone)]
pub struct HmmsearchSearcher {
    pub program: PathBuf,
    pub hmm_db: PathBuf,
    pub threads: usize,
}

const HMMSEARCH_DB_SIZE: &str = "1000000";

impl DomainSearcher for HmmsearchSearcher {
    fn search(&self, proteins: &Path, out_dir: &Path) -> Result<PathBuf> {
        let name = sample_name(proteins);
        let table = out_dir.join(format!("{name}.hmmsearch_domtblout.tsv"));
        run_tool(
            "hmmsearch",
            Command::new(&self.program)
                .arg("--cut_ga")
                .arg("-Z")
                .arg(HMMSEARCH_DB_SIZE)
                .arg("--cpu")
                .arg(self.threads.to_string())
                .arg("--noali")
                .arg("-o")
                .arg(out_dir.join(format!("{name}.hmmsearch.log")))
                .arg("--domtblout")
                .arg(&table)
                .arg(&self.hmm_db)
                .arg(proteins),
        )?;
        expect_output("hmmsearch", table)
    }
}

/// Annotate an assembly, search its proteins, and sift the hits into
/// `OUT_DIR/NAME.*.tsv`.
pub fn run_workflow(
    annotator: &dyn Annotator,
    searcher: &dyn DomainSearcher,
    assembly: &Path,
    out_dir: &Path,
    config: &SiftConfig,
    coordinates: CoordinateSystem,
) -> anyhow::Result<LossSummary> {
    config.validate()?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let proteins = annotator
        .annotate(assembly, out_dir)
        .with_context(|| format!("annotation of {} failed", assembly.display()))?;
    let table = searcher
        .search(&proteins, out_dir)
        .with_context(|| format!("domain search of {} failed", proteins.display()))?;

    let options = RunOptions {
        parse: ParseOptions {
            format: detect_format(&table),
            program: SearchProgram::Hmmsearch,
            coordinates,
        },
        input: table,
        proteins: Some(proteins),
        output_prefix: out_dir.join(sample_name(assembly)),
        config: config.clone(),
    };
    pipeline::run(&options)
}
