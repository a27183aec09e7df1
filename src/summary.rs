//! Header-driven per-protein hit tables.
//!
//! Column order is taken from the header row, accepting the aliases the
//! annotation workflow writes (`feature_id`, `pfam_id`, `stop`, ...).
//! Tab and comma separated tables are read with `csv`, so quoted cells may
//! hold the delimiter.

use crate::error::{Result, SiftError};
use crate::hit::{HitRecord, Row};
use crate::types::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delimiter {
    Tab,
    Comma,
    Whitespace,
}

impl Delimiter {
    fn sniff(header: &str) -> Self {
        if header.contains('\t') {
            Delimiter::Tab
        } else if header.contains(',') {
            Delimiter::Comma
        } else {
            Delimiter::Whitespace
        }
    }

    /// Separator byte for the csv reader; `None` for runs of whitespace.
    pub(crate) fn byte(self) -> Option<u8> {
        match self {
            Delimiter::Tab => Some(b'\t'),
            Delimiter::Comma => Some(b','),
            Delimiter::Whitespace => None,
        }
    }
}

fn split_header(line: &str, delimiter: Delimiter) -> Vec<String> {
    let Some(byte) = delimiter.byte() else {
        return line.split_whitespace().map(str::to_ascii_lowercase).collect();
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(byte)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(str::to_ascii_lowercase).collect(),
        _ => Vec::new(),
    }
}

/// Column positions of a summary table, resolved from its header row.
#[derive(Debug, Clone)]
pub(crate) struct SummaryColumns {
    delimiter: Delimiter,
    width: usize,
    protein: usize,
    domain: usize,
    start: usize,
    end: usize,
    significance: usize,
    score: usize,
    coverage: usize,
    accession: Option<usize>,
    name: Option<usize>,
    model_length: Option<usize>,
    protein_length: Option<usize>,
    aa_coverage: Option<usize>,
}

impl SummaryColumns {
    pub(crate) fn from_header(line: &str, line_no: usize) -> Result<Self> {
        let delimiter = Delimiter::sniff(line);
        let names = split_header(line, delimiter);
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        let require = |aliases: &[&str]| {
            find(aliases).ok_or_else(|| {
                SiftError::malformed(
                    line_no,
                    line,
                    format!("summary header lacks a {} column", aliases[0]),
                )
            })
        };

        Ok(Self {
            delimiter,
            width: names.len(),
            protein: require(&["feature_id", "protein_id"])?,
            domain: require(&["pfam_id", "domain_id"])?,
            start: require(&["start", "pfam_start", "query_start"])?,
            end: require(&["end", "stop", "pfam_end", "pfam_stop", "query_end"])?,
            significance: require(&["evalue", "significance"])?,
            score: require(&["score", "bit_score"])?,
            coverage: require(&["domain_cov", "domain_coverage"])?,
            accession: find(&["domain_accession", "accession"]),
            name: find(&["name", "domain_name"]),
            model_length: find(&["pfam_len", "model_length"]),
            protein_length: find(&["protein_length", "cds_len", "tlen"]),
            aa_coverage: find(&["aa_cov", "aa_coverage"]),
        })
    }

    pub(crate) fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    /// Row of a whitespace-aligned table.
    pub(crate) fn parse_line(&self, line: &str, line_no: usize) -> Result<HitRecord> {
        self.parse_row(Row { fields: line.split_whitespace().collect(), line, line_no })
    }

    /// Row already split by the csv reader.
    pub(crate) fn parse_record(&self, record: &csv::StringRecord, line_no: usize) -> Result<HitRecord> {
        let fields: Vec<&str> = record.iter().collect();
        let separator = if self.delimiter == Delimiter::Comma { "," } else { "\t" };
        let line = fields.join(separator);
        let row = Row { fields, line: &line, line_no };
        if row.fields.len() != self.width {
            return Err(row.malformed(format!(
                "expected {} columns, found {}",
                self.width,
                row.fields.len()
            )));
        }
        self.parse_row(row)
    }

    fn parse_row(&self, row: Row<'_>) -> Result<HitRecord> {
        let domain_coverage = row.fraction(row.float(self.coverage, "domain coverage")?, "domain coverage")?;
        let (query_start, query_end) = row.interval(self.start, self.end, "sequence")?;
        let protein_length = row.protein_length(
            row.optional_num::<Coord>(self.protein_length, "protein length")?,
            query_end,
        )?;
        let aa_coverage = match row.optional_num::<f64>(self.aa_coverage, "aa coverage")? {
            Some(value) => Some(row.fraction(value, "aa coverage")?),
            None => protein_length.map(|len| (query_end - query_start + 1) as f64 / len as f64),
        };

        let domain_id = row.text(self.domain, "domain id")?;
        // Without an accession column the domain id (`pfam_id`) is the accession.
        let domain_accession = row.optional(self.accession).unwrap_or(domain_id);

        Ok(HitRecord {
            protein_id: row.text(self.protein, "protein id")?.to_string(),
            protein_length,
            domain_id: domain_id.to_string(),
            domain_name: row.optional(self.name).map(str::to_string),
            domain_accession: domain_accession.to_string(),
            model_length: row.optional_num(self.model_length, "model length")?,
            query_start,
            query_end,
            significance: row.float(self.significance, "e-value")?,
            domain_coverage,
            bit_score: row.float(self.score, "score")?,
            aa_coverage,
        })
    }
}
