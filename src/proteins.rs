use crate::types::{HashSet, HashSetExt};
use anyhow::Result;
use needletail::parse_fastx_file;
use std::path::Path;

/// Record ids of a predicted-protein FASTA, in file order, without duplicates.
///
/// The id is the header up to the first whitespace, which is what the
/// search tables report as the sequence name.
pub fn load_protein_ids(path: &Path) -> Result<Vec<String>> {
    let mut reader = parse_fastx_file(path)
        .map_err(|e| anyhow::anyhow!("failed to open FASTA {}: {}", path.display(), e))?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut ids: Vec<String> = Vec::new();

    while let Some(result) = reader.next() {
        let record = result
            .map_err(|e| anyhow::anyhow!("failed to parse FASTA record: {}", e))?;
        let header = String::from_utf8_lossy(record.id());
        let id = header.split_whitespace().next().unwrap_or("").to_string();
        if !id.is_empty() && seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    Ok(ids)
}
