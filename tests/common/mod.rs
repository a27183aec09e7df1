#![allow(dead_code)]
use domsift_rs::HitRecord;
use std::path::PathBuf;

/// Hit with full model coverage.
pub fn hit(protein: &str, domain: &str, start: u32, end: u32, significance: f64, bit_score: f64) -> HitRecord {
    HitRecord {
        protein_id: protein.to_string(),
        protein_length: None,
        domain_id: domain.to_string(),
        domain_name: None,
        domain_accession: format!("{domain}.1"),
        model_length: None,
        query_start: start,
        query_end: end,
        significance,
        domain_coverage: 1.0,
        bit_score,
        aa_coverage: None,
    }
}

/// One hmmsearch `--domtblout` row. Envelope coordinates extend the
/// alignment by 2 residues on each side.
pub fn domtbl_row(
    protein: &str,
    domain: &str,
    model_len: u32,
    i_evalue: f64,
    score: f64,
    hmm: (u32, u32),
    ali: (u32, u32),
) -> String {
    format!(
        "{protein:<20} - 412 {domain:<12} PF{domain}.7 {model_len} 3.1e-30 110.2 0.4 1 2 2.2e-12 {i_evalue:e} {score} 0.1 {} {} {} {} {} {} 0.93 putative {domain} protein",
        hmm.0,
        hmm.1,
        ali.0,
        ali.1,
        ali.0.saturating_sub(2).max(1),
        ali.1 + 2,
    )
}

pub const DOMTBL_HEADER: &str = "\
#                                                                            --- full sequence --- -------------- this domain -------------   hmm coord   ali coord   env coord
# target name        accession   tlen query name           accession   qlen   E-value  score  bias   #  of  c-Evalue  i-Evalue  score  bias  from    to  from    to  from    to  acc description of target
#------------------- ---------- ----- -------------------- ---------- ----- --------- ------ ----- --- --- --------- --------- ------ ----- ----- ----- ----- ----- ----- ----- ---- ---------------------";

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("domsift_rs_test_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// 64-bit linear congruential generator (Knuth's MMIX constants).
pub struct Lcg(pub u64);

impl Lcg {
    pub fn next_u32(&mut self, bound: u32) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as u32) % bound
    }
}

/// `n` random hits spread over `proteins` proteins.
pub fn random_hits(seed: u64, n: usize, proteins: u32) -> Vec<HitRecord> {
    let mut rng = Lcg(seed);
    (0..n)
        .map(|_| {
            let protein = format!("prot_{:03}", rng.next_u32(proteins));
            let domain = format!("PF{:05}", rng.next_u32(40));
            let start = 1 + rng.next_u32(400);
            let end = start + 10 + rng.next_u32(150);
            let significance = 10f64.powi(-(rng.next_u32(30) as i32)) * (1 + rng.next_u32(9)) as f64;
            let mut h = hit(&protein, &domain, start, end, significance, rng.next_u32(300) as f64 / 2.0);
            h.domain_coverage = rng.next_u32(101) as f64 / 100.0;
            h
        })
        .collect()
}
