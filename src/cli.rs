use clap::{Args, Parser, Subcommand, ValueEnum};
use domsift_rs::hit::{CoordinateSystem, SearchProgram, TableFormat};
use domsift_rs::{OverlapThreshold, SiftConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "domsift-rs",
    about = "Resolve overlapping profile-HMM domain hits into a clean annotation table",
    version
)]
pub struct Cli {
    /// Set logging level to WARN
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Filter and resolve an existing search table
    Resolve(ResolveArgs),
    /// Run bakta and hmmsearch on an assembly, then resolve the hits
    Annotate(AnnotateArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Raw search table (domtblout or summary table)
    pub table: PathBuf,

    /// Output prefix; writes PREFIX.resolved_hits.tsv, PREFIX.dropped_hits.tsv, PREFIX.loss_report.tsv
    #[arg(short = 'o', long = "out", value_name = "PREFIX")]
    pub output_prefix: PathBuf,

    /// Table shape (default: inferred from the file name)
    #[arg(short = 'f', long)]
    pub format: Option<TableFormat>,

    /// Program that wrote a domtblout
    #[arg(long, default_value = "hmmsearch")]
    pub program: SearchProgram,

    /// Predicted-protein FASTA; proteins without hits are reported
    #[arg(long, value_name = "FASTA")]
    pub proteins: Option<PathBuf>,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Assembled genome (FASTA)
    pub assembly: PathBuf,

    /// Bakta database directory
    #[arg(long, value_name = "DIR")]
    pub bakta_db: PathBuf,

    /// Profile HMM database (e.g. Pfam-A.hmm)
    #[arg(long, value_name = "HMM")]
    pub hmm_db: PathBuf,

    /// Output directory
    #[arg(short = 'o', long = "out", value_name = "DIR")]
    pub out_dir: PathBuf,

    #[arg(long, default_value = "bakta", value_name = "PATH")]
    pub bakta: PathBuf,

    #[arg(long, default_value = "hmmsearch", value_name = "PATH")]
    pub hmmsearch: PathBuf,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OverlapUnit {
    /// Shared residues
    Positions,
    /// Percent of the shorter hit
    Percent,
}

#[derive(Args, Debug)]
pub struct ThresholdArgs {
    /// Maximum e-value of an admitted hit
    #[arg(long, default_value_t = 1e-5)]
    pub max_evalue: f64,

    /// Minimum fraction of the domain model covered [0-1]
    #[arg(long, default_value_t = 0.4)]
    pub min_domain_coverage: f64,

    /// Overlap tolerated between kept hits, in --overlap-unit
    #[arg(long, default_value_t = 50.0)]
    pub min_overlap: f64,

    #[arg(long, value_enum, default_value = "positions")]
    pub overlap_unit: OverlapUnit,

    /// Sequence coordinates taken from a domtblout
    #[arg(long, value_enum, default_value = "ali")]
    pub coords: CoordinateSystem,

    /// Number of threads (CPUs) to use
    #[arg(short = 'p', long = "threads", default_value_t = 1)]
    pub threads: usize,
}

impl ThresholdArgs {
    pub fn to_config(&self) -> SiftConfig {
        let overlap = match self.overlap_unit {
            OverlapUnit::Percent => OverlapThreshold::Percent(self.min_overlap),
            // Non-integral counts map to 0, which validation rejects.
            OverlapUnit::Positions => {
                if self.min_overlap.fract() == 0.0 && self.min_overlap >= 0.0 {
                    OverlapThreshold::Positions(self.min_overlap.min(u32::MAX as f64) as u32)
                } else {
                    OverlapThreshold::Positions(0)
                }
            }
        };
        SiftConfig {
            max_significance: self.max_evalue,
            min_domain_coverage: self.min_domain_coverage,
            overlap,
            threads: self.threads,
        }
    }
}
