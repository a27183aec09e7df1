//! Annotation workflow with canned collaborators in place of bakta/hmmsearch.
mod common;

use common::{domtbl_row, scratch_dir, DOMTBL_HEADER};
use domsift_rs::error::{Result as SiftResult, SiftError};
use domsift_rs::external::{run_workflow, Annotator, DomainSearcher, HmmsearchSearcher};
use domsift_rs::hit::CoordinateSystem;
use domsift_rs::SiftConfig;
use std::fs;
use std::path::{Path, PathBuf};

struct CannedAnnotator {
    faa: &'static str,
}

impl Annotator for CannedAnnotator {
    fn annotate(&self, assembly: &Path, out_dir: &Path) -> SiftResult<PathBuf> {
        assert!(assembly.is_file(), "assembly must be staged before annotation");
        let path = out_dir.join("genome.faa");
        fs::write(&path, self.faa)?;
        Ok(path)
    }
}

struct CannedSearcher {
    table: String,
}

impl DomainSearcher for CannedSearcher {
    fn search(&self, proteins: &Path, out_dir: &Path) -> SiftResult<PathBuf> {
        assert!(proteins.is_file());
        let path = out_dir.join("genome.hmmsearch_domtblout.tsv");
        fs::write(&path, &self.table)?;
        Ok(path)
    }
}

struct FailingAnnotator;

impl Annotator for FailingAnnotator {
    fn annotate(&self, _assembly: &Path, _out_dir: &Path) -> SiftResult<PathBuf> {
        Err(SiftError::ExternalTool {
            tool: "bakta".to_string(),
            status: "1".to_string(),
            stderr: "database not found".to_string(),
        })
    }
}

fn stage_assembly(dir: &Path) -> PathBuf {
    let assembly = dir.join("genome.fna");
    fs::write(&assembly, ">contig_1\nACGTACGTAC\n").unwrap();
    assembly
}

#[test]
fn workflow_chains_annotation_search_and_resolution() {
    let dir = scratch_dir("workflow");
    let assembly = stage_assembly(&dir);
    let out_dir = dir.join("out");

    let annotator = CannedAnnotator {
        faa: ">contig_1_00001 kinase\nMKV\n>contig_1_00002 hypothetical protein\nMST\n>contig_1_00003\nMAA\n",
    };
    let searcher = CannedSearcher {
        table: format!(
            "{DOMTBL_HEADER}\n{}\n{}\n{}\n",
            domtbl_row("contig_1_00001", "Pkinase", 264, 1e-40, 130.0, (1, 250), (5, 240)),
            domtbl_row("contig_1_00001", "Pkinase_Tyr", 259, 1e-30, 100.0, (1, 240), (8, 236)),
            domtbl_row("contig_1_00002", "DUF1", 100, 1e-1, 5.0, (1, 100), (1, 90)),
        ),
    };

    let summary = run_workflow(
        &annotator,
        &searcher,
        &assembly,
        &out_dir,
        &SiftConfig::default(),
        CoordinateSystem::Ali,
    )
    .unwrap();

    assert_eq!(summary.proteins, 3);
    assert_eq!(summary.raw_hits, 3);
    assert_eq!(summary.resolved_hits, 1);
    assert_eq!(summary.fully_discarded, 1);
    assert_eq!(summary.proteins_without_hits, 1);

    let resolved = fs::read_to_string(out_dir.join("genome.resolved_hits.tsv")).unwrap();
    let rows: Vec<&str> = resolved.lines().skip(1).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("contig_1_00001\t412\tPkinase\tPkinase\tPFPkinase.7\tpfamPkinase\t"));

    let loss = fs::read_to_string(out_dir.join("genome.loss_report.tsv")).unwrap();
    assert!(loss.contains("contig_1_00002\t1\t0\t0\ttrue\t-\n"));
    assert!(loss.contains("contig_1_00003\t0\t0\t0\tfalse\tno_hits\n"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn failing_annotator_aborts_without_outputs() {
    let dir = scratch_dir("workflow_fail");
    let assembly = stage_assembly(&dir);
    let out_dir = dir.join("out");
    let searcher = CannedSearcher { table: String::new() };

    let err = run_workflow(
        &FailingAnnotator,
        &searcher,
        &assembly,
        &out_dir,
        &SiftConfig::default(),
        CoordinateSystem::Ali,
    )
    .unwrap_err();

    let chain = format!("{err:#}");
    assert!(chain.contains("annotation of"), "{chain}");
    assert!(chain.contains("database not found"), "{chain}");
    assert!(!out_dir.join("genome.resolved_hits.tsv").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_search_program_is_reported() {
    let dir = scratch_dir("workflow_missing_tool");
    let proteins = dir.join("genome.faa");
    fs::write(&proteins, ">p1\nMKV\n").unwrap();

    let searcher = HmmsearchSearcher {
        program: dir.join("no-such-hmmsearch"),
        hmm_db: dir.join("Pfam-A.hmm"),
        threads: 1,
    };
    let err = searcher.search(&proteins, &dir).unwrap_err();
    assert!(matches!(err, SiftError::Io(_)), "{err:?}");

    let _ = fs::remove_dir_all(&dir);
}
