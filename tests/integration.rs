/// End-to-end tests running the domsift-rs binary on small search tables.
///
/// Each test writes its inputs into a scratch directory under the system temp
/// dir, runs `domsift-rs resolve`, and inspects the three output tables.
mod common;

use common::{domtbl_row, scratch_dir, DOMTBL_HEADER};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// ── helpers ──────────────────────────────────────────────────────────────────

fn domsift_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_domsift-rs"))
}

fn run_resolve(table: &Path, prefix: &Path, extra: &[&str]) -> Output {
    Command::new(domsift_bin())
        .arg("resolve")
        .arg(table)
        .arg("-o")
        .arg(prefix)
        .arg("-q")
        .args(extra)
        .output()
        .expect("failed to spawn domsift-rs")
}

fn outputs(prefix: &Path) -> [PathBuf; 3] {
    ["resolved_hits", "dropped_hits", "loss_report"].map(|name| {
        let mut p = prefix.as_os_str().to_os_string();
        p.push(format!(".{name}.tsv"));
        PathBuf::from(p)
    })
}

fn sample_table() -> String {
    let rows = [
        // P1: best hit plus a weaker hit overlapping it by 11 residues.
        domtbl_row("P1", "DomA", 100, 1e-8, 60.0, (1, 90), (10, 50)),
        domtbl_row("P1", "DomB", 100, 1e-6, 25.0, (1, 80), (40, 90)),
        // Q: only hit fails the e-value threshold.
        domtbl_row("Q", "DomC", 100, 1e-2, 9.0, (1, 100), (5, 80)),
        // R: two disjoint hits, worse one listed first.
        domtbl_row("R", "DomD", 50, 1e-6, 30.0, (1, 50), (1, 30)),
        domtbl_row("R", "DomE", 50, 1e-9, 45.0, (1, 40), (35, 60)),
        // S: hit covering too little of its model.
        domtbl_row("S", "DomF", 200, 1e-20, 80.0, (1, 40), (3, 50)),
    ];
    format!("{DOMTBL_HEADER}\n{}\n", rows.join("\n"))
}

fn column(tsv: &str, idx: usize) -> Vec<String> {
    tsv.lines()
        .skip(1)
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split('\t').nth(idx).unwrap_or("").to_string())
        .collect()
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[test]
fn resolves_sample_table() {
    let dir = scratch_dir("sample");
    let table = dir.join("sample.hmmsearch_domtblout.tsv");
    fs::write(&table, sample_table()).unwrap();
    let prefix = dir.join("sample");

    let out = run_resolve(&table, &prefix, &["--min-overlap", "10"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let [resolved, dropped, loss] = outputs(&prefix).map(|p| fs::read_to_string(p).unwrap());

    assert!(resolved.starts_with("protein_id\tprotein_length\tdomain_id\tdomain_name\tpfam_id_version\tpfam_id\t"));
    assert_eq!(column(&resolved, 0), ["P1", "R", "R"]);
    assert_eq!(column(&resolved, 1), ["412", "412", "412"]);
    assert_eq!(column(&resolved, 2), ["DomA", "DomE", "DomD"]);
    assert_eq!(column(&resolved, 4), ["PFDomA.7", "PFDomE.7", "PFDomD.7"]);
    assert_eq!(column(&resolved, 5), ["pfamDomA", "pfamDomE", "pfamDomD"]);
    assert_eq!(column(&resolved, 6), ["10", "35", "1"]);
    assert_eq!(column(&resolved, 9), ["100", "50", "50"]);

    assert_eq!(column(&dropped, 2), ["DomB", "DomC", "DomF"]);
    assert_eq!(column(&dropped, 14), ["overlap", "significance", "coverage"]);
    assert_eq!(column(&dropped, 15), ["DomA:10-50", "-", "-"]);

    let rows: Vec<&str> = loss.lines().collect();
    assert_eq!(rows[0], "protein_id\traw_count\tadmitted_count\tresolved_count\tfully_discarded\tnote");
    assert_eq!(rows[1], "P1\t2\t2\t1\tfalse\t-");
    assert_eq!(rows[2], "Q\t1\t0\t0\ttrue\t-");
    assert_eq!(rows[3], "R\t2\t2\t2\tfalse\t-");
    assert_eq!(rows[4], "S\t1\t0\t0\ttrue\t-");
    assert!(loss.contains("# proteins_processed\t4\n"));
    assert!(loss.contains("# proteins_fully_discarded\t2\n"));
    assert!(loss.contains("# raw_hits\t6\n"));
    assert!(loss.contains("# resolved_hits\t3\n"));
    assert!(!loss.contains("# note"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn output_is_byte_identical_across_runs_and_threads() {
    let dir = scratch_dir("determinism");
    let table = dir.join("det.domtblout");
    let mut rows = vec![DOMTBL_HEADER.to_string()];
    for p in 0..60u32 {
        for d in 0..6u32 {
            let start = 1 + d * 25;
            rows.push(domtbl_row(
                &format!("prot_{p:02}"),
                &format!("Dom{}", (p + d) % 7),
                80,
                10f64.powi(-(((p * 7 + d * 3) % 15) as i32) - 3),
                (d * 5 % 13) as f64 + 10.0,
                (1, 60),
                (start, start + 40 + (p % 5) * 4),
            ));
        }
    }
    fs::write(&table, rows.join("\n")).unwrap();

    let mut seen: Vec<Vec<String>> = Vec::new();
    for (run, threads) in ["1", "1", "4", "8"].into_iter().enumerate() {
        let prefix = dir.join(format!("run{run}"));
        let out = run_resolve(&table, &prefix, &["-p", threads]);
        assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
        seen.push(outputs(&prefix).iter().map(|p| fs::read_to_string(p).unwrap()).collect());
    }
    for other in &seen[1..] {
        assert_eq!(other, &seen[0]);
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_input_writes_nothing() {
    let dir = scratch_dir("malformed");
    let table = dir.join("bad.domtblout");
    let good = domtbl_row("P1", "DomA", 100, 1e-8, 60.0, (1, 90), (10, 50));
    let bad = domtbl_row("P2", "DomA", 100, 1e-8, 60.0, (1, 90), (50, 10));
    fs::write(&table, format!("{good}\n{bad}\n")).unwrap();
    let prefix = dir.join("bad");

    let out = run_resolve(&table, &prefix, &[]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("line 2"), "stderr: {stderr}");
    for path in outputs(&prefix) {
        assert!(!path.exists(), "{} should not exist", path.display());
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_threshold_fails_before_reading() {
    let dir = scratch_dir("badcfg");
    let prefix = dir.join("x");
    // The table does not exist; configuration must fail first.
    let out = run_resolve(&dir.join("missing.domtblout"), &prefix, &["--min-domain-coverage", "1.5"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("min_domain_coverage"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn empty_table_still_produces_reports() {
    let dir = scratch_dir("empty");
    let table = dir.join("empty.domtblout");
    fs::write(&table, format!("{DOMTBL_HEADER}\n")).unwrap();
    let fasta = dir.join("empty.faa");
    fs::write(&fasta, ">orphan_1 hypothetical protein\nMKV\n>orphan_2\nMST\n").unwrap();
    let prefix = dir.join("empty");

    let out = run_resolve(&table, &prefix, &["--proteins", fasta.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let [resolved, _dropped, loss] = outputs(&prefix).map(|p| fs::read_to_string(p).unwrap());
    assert_eq!(resolved.lines().count(), 1);
    assert!(loss.contains("orphan_1\t0\t0\t0\tfalse\tno_hits\n"));
    assert!(loss.contains("orphan_2\t0\t0\t0\tfalse\tno_hits\n"));
    assert!(loss.contains("# proteins_without_hits\t2\n"));
    assert!(loss.contains("# note\tempty input: no hit records were read\n"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn percent_overlap_unit() {
    let dir = scratch_dir("percent");
    let table = dir.join("pct.domtblout");
    fs::write(&table, sample_table()).unwrap();
    let prefix = dir.join("pct");

    // DomA/DomB share 11 of 41 residues (~27%): kept under a 50% tolerance.
    let out = run_resolve(&table, &prefix, &["--overlap-unit", "percent", "--min-overlap", "50"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let resolved = fs::read_to_string(&outputs(&prefix)[0]).unwrap();
    assert_eq!(column(&resolved, 2), ["DomA", "DomB", "DomE", "DomD"]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn blocked_output_path_leaves_no_partial_set() {
    let dir = scratch_dir("blocked");
    let table = dir.join("blocked.domtblout");
    fs::write(&table, sample_table()).unwrap();
    let prefix = dir.join("blocked");
    let [resolved, dropped, loss] = outputs(&prefix);
    // A directory where the loss report should go makes its rename fail.
    fs::create_dir_all(&loss).unwrap();

    let out = run_resolve(&table, &prefix, &[]);
    assert!(!out.status.success());
    assert!(!resolved.exists(), "resolved table should have been removed");
    assert!(!dropped.exists(), "dropped table should have been removed");
    assert!(loss.is_dir());
    let leftovers: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "stale temporaries: {leftovers:?}");

    let _ = fs::remove_dir_all(&dir);
}
