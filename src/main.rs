mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use domsift_rs::external::{self, BaktaAnnotator, HmmsearchSearcher};
use domsift_rs::hit::{detect_format, ParseOptions};
use domsift_rs::pipeline::{self, RunOptions};
use domsift_rs::LossSummary;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            if args.quiet {
                EnvFilter::new("warn")
            } else {
                EnvFilter::new("info")
            }
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let stats = match &args.command {
        Command::Resolve(resolve) => {
            let options = RunOptions {
                parse: ParseOptions {
                    format: resolve.format.unwrap_or_else(|| detect_format(&resolve.table)),
                    program: resolve.program,
                    coordinates: resolve.thresholds.coords,
                },
                input: resolve.table.clone(),
                proteins: resolve.proteins.clone(),
                output_prefix: resolve.output_prefix.clone(),
                config: resolve.thresholds.to_config(),
            };
            pipeline::run(&options)?
        }
        Command::Annotate(annotate) => {
            let config = annotate.thresholds.to_config();
            let annotator = BaktaAnnotator {
                program: annotate.bakta.clone(),
                db: annotate.bakta_db.clone(),
                threads: config.threads,
            };
            let searcher = HmmsearchSearcher {
                program: annotate.hmmsearch.clone(),
                hmm_db: annotate.hmm_db.clone(),
                threads: config.threads,
            };
            external::run_workflow(
                &annotator,
                &searcher,
                &annotate.assembly,
                &annotate.out_dir,
                &config,
                annotate.thresholds.coords,
            )?
        }
    };

    log_summary(&stats);
    Ok(())
}

fn log_summary(stats: &LossSummary) {
    tracing::info!(
        proteins = stats.proteins,
        fully_discarded = stats.fully_discarded,
        without_hits = stats.proteins_without_hits,
        raw_hits = stats.raw_hits,
        admitted_hits = stats.admitted_hits,
        resolved_hits = stats.resolved_hits,
        "domsift-rs: processing complete"
    );
}
