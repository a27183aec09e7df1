//! Domain-hit records and the readers for raw profile-search tables.
//!
//! Two table shapes are understood:
//!
//! - `domtblout`: HMMER's per-domain table. Whitespace-delimited, 22 fixed
//!   columns followed by a free-text description. One row per domain hit.
//! - `summary`: a per-protein hit table with a header row naming its columns
//!   (protein, domain, start, end, e-value, score, domain coverage), as
//!   written by the annotation workflow. Tab, comma or whitespace separated.
//!   HMMER's own `--tblout` carries no coordinates and is not accepted.
//!
//! Lines starting with `#` and blank lines are skipped. Coordinates are
//! 1-based inclusive throughout.

use crate::error::{Result, SiftError};
use crate::summary::SummaryColumns;
use crate::types::Coord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

pub(crate) const COMMENT_MARKER: char = '#';
const DOMTBL_FIXED_COLUMNS: usize = 22;
/// Largest accepted sequence coordinate; the interval index works on `i32`.
pub const MAX_COORD: Coord = i32::MAX as Coord;

/// One candidate domain match on one protein. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub protein_id: String,
    /// Residues in the protein, when the table reports it.
    pub protein_length: Option<Coord>,
    pub domain_id: String,
    /// Model name (`Pkinase`), when the table reports it.
    pub domain_name: Option<String>,
    /// Versioned model accession (`PF00069.27`), `-` when the table carries none.
    pub domain_accession: String,
    /// Length of the domain model.
    pub model_length: Option<Coord>,
    pub query_start: Coord,
    pub query_end: Coord,
    /// Smaller is better (e-value).
    pub significance: f64,
    /// Fraction of the domain model covered by the alignment, in [0, 1].
    pub domain_coverage: f64,
    /// Larger is better.
    pub bit_score: f64,
    /// Fraction of the protein covered by the hit, in [0, 1].
    pub aa_coverage: Option<f64>,
}

impl HitRecord {
    /// Number of residues spanned on the protein.
    pub fn length(&self) -> Coord {
        self.query_end - self.query_start + 1
    }

    /// Accession with its version dropped and the Pfam prefix in the
    /// lower-case form used by downstream tools: `PF00069.27` -> `pfam00069`.
    pub fn family_accession(&self) -> String {
        let base = self
            .domain_accession
            .split('.')
            .next()
            .unwrap_or(&self.domain_accession);
        match base.strip_prefix("PF") {
            Some(number) => format!("pfam{number}"),
            None => base.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TableFormat {
    /// HMMER per-domain hit table (--domtblout)
    Domtblout,
    /// Per-protein hit table with a header row (not HMMER --tblout)
    Summary,
}

/// Which program produced a `domtblout`; decides which columns name the protein.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SearchProgram {
    /// Profiles searched against proteins (protein is the target)
    #[default]
    Hmmsearch,
    /// Proteins searched against profiles (protein is the query)
    Hmmscan,
}

/// Which coordinate pair of a `domtblout` row becomes the hit interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CoordinateSystem {
    /// Alignment coordinates
    #[default]
    Ali,
    /// Envelope coordinates
    Env,
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub format: TableFormat,
    pub program: SearchProgram,
    pub coordinates: CoordinateSystem,
}

impl ParseOptions {
    pub fn new(format: TableFormat) -> Self {
        Self {
            format,
            program: SearchProgram::default(),
            coordinates: CoordinateSystem::default(),
        }
    }
}

/// Guess the table shape from the file name: anything mentioning `domtbl`
/// is a per-domain table, everything else a summary table.
pub fn detect_format(path: &Path) -> TableFormat {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if name.contains("domtbl") {
        TableFormat::Domtblout
    } else {
        TableFormat::Summary
    }
}

enum Source<R> {
    /// Line by line: domtblout rows, or a whitespace-aligned summary table.
    Lines {
        reader: R,
        line_buf: String,
        line_no: usize,
        columns: Option<SummaryColumns>,
    },
    /// Quoted tab/comma separated summary rows following the header.
    Delimited {
        records: csv::Reader<R>,
        record: csv::StringRecord,
        columns: SummaryColumns,
        header_line_no: usize,
    },
    Finished,
}

/// Lazily yields hit records in input order.
pub struct HitReader<R> {
    options: ParseOptions,
    source: Source<R>,
}

impl HitReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::with_capacity(1024 * 1024, file), options))
    }
}

impl<R: BufRead> HitReader<R> {
    pub fn new(reader: R, options: ParseOptions) -> Self {
        Self {
            options,
            source: Source::Lines {
                reader,
                line_buf: String::with_capacity(512),
                line_no: 0,
                columns: None,
            },
        }
    }

    /// Read the next record, skipping comments, blank lines and the summary header.
    ///
    /// - `Ok(Some(hit))` - a record
    /// - `Ok(None)` - end of input
    /// - `Err(e)` - I/O failure or a malformed row
    pub fn read_next(&mut self) -> Result<Option<HitRecord>> {
        loop {
            match &mut self.source {
                Source::Lines { reader, line_buf, line_no, columns } => {
                    line_buf.clear();
                    if reader.read_line(line_buf)? == 0 {
                        return Ok(None);
                    }
                    *line_no += 1;

                    let line = line_buf.trim_end_matches(['\n', '\r']);
                    if line.trim().is_empty() || line.starts_with(COMMENT_MARKER) {
                        continue;
                    }

                    match self.options.format {
                        TableFormat::Domtblout => {
                            return parse_domtbl_line(line, *line_no, &self.options).map(Some);
                        }
                        TableFormat::Summary => {
                            if let Some(columns) = columns {
                                return columns.parse_line(line, *line_no).map(Some);
                            }
                            // First data line of a summary table is its header.
                            let header = SummaryColumns::from_header(line, *line_no)?;
                            let header_line_no = *line_no;
                            match header.delimiter().byte() {
                                Some(delimiter) => {
                                    self.switch_to_delimited(header, delimiter, header_line_no)
                                }
                                None => *columns = Some(header),
                            }
                        }
                    }
                }
                Source::Delimited { records, record, columns, header_line_no } => {
                    let offset = *header_line_no;
                    return match records.read_record(record) {
                        Ok(true) => {
                            let line_no = offset + record.position().map_or(0, |p| p.line() as usize);
                            columns.parse_record(record, line_no).map(Some)
                        }
                        Ok(false) => Ok(None),
                        Err(e) => Err(csv_error(e, offset)),
                    };
                }
                Source::Finished => return Ok(None),
            }
        }
    }

    fn switch_to_delimited(&mut self, columns: SummaryColumns, delimiter: u8, header_line_no: usize) {
        if let Source::Lines { reader, .. } = std::mem::replace(&mut self.source, Source::Finished) {
            let records = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .has_headers(false)
                .flexible(false)
                .comment(Some(COMMENT_MARKER as u8))
                .trim(csv::Trim::All)
                .from_reader(reader);
            self.source = Source::Delimited {
                records,
                record: csv::StringRecord::new(),
                columns,
                header_line_no,
            };
        }
    }
}

impl<R: BufRead> Iterator for HitReader<R> {
    type Item = Result<HitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Map a csv reader failure to a malformed record at its absolute line.
fn csv_error(err: csv::Error, header_line_no: usize) -> SiftError {
    let line_no = header_line_no + err.position().map_or(0, |p| p.line() as usize);
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => SiftError::Io(e),
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => SiftError::malformed(
            line_no,
            "",
            format!("expected {expected_len} columns, found {len}"),
        ),
        _ => SiftError::malformed(line_no, "", reason),
    }
}

/// A split data line, with its position for error reporting.
pub(crate) struct Row<'a> {
    pub(crate) fields: Vec<&'a str>,
    pub(crate) line: &'a str,
    pub(crate) line_no: usize,
}

impl<'a> Row<'a> {
    pub(crate) fn malformed(&self, reason: impl Into<String>) -> SiftError {
        SiftError::malformed(self.line_no, self.line, reason)
    }

    pub(crate) fn text(&self, idx: usize, name: &str) -> Result<&'a str> {
        match self.fields.get(idx) {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(self.malformed(format!("missing {name}"))),
        }
    }

    /// Value of an optional column; empty and `-` cells count as absent.
    pub(crate) fn optional(&self, idx: Option<usize>) -> Option<&'a str> {
        idx.and_then(|i| self.fields.get(i))
            .copied()
            .filter(|s| !s.is_empty() && *s != "-")
    }

    pub(crate) fn num<T: FromStr>(&self, idx: usize, name: &str) -> Result<T> {
        let raw = self.text(idx, name)?;
        raw.parse()
            .map_err(|_| self.malformed(format!("invalid {name}: {raw:?}")))
    }

    pub(crate) fn optional_num<T: FromStr>(&self, idx: Option<usize>, name: &str) -> Result<Option<T>> {
        match self.optional(idx) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| self.malformed(format!("invalid {name}: {raw:?}"))),
            None => Ok(None),
        }
    }

    pub(crate) fn float(&self, idx: usize, name: &str) -> Result<f64> {
        let value: f64 = self.num(idx, name)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.malformed(format!("{name} is not finite")))
        }
    }

    /// A fraction in [0, 1].
    pub(crate) fn fraction(&self, value: f64, name: &str) -> Result<f64> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(self.malformed(format!("{name} {value} outside [0, 1]")))
        }
    }

    /// 1-based inclusive interval from two columns.
    pub(crate) fn interval(&self, from: usize, to: usize, name: &str) -> Result<(Coord, Coord)> {
        let start: Coord = self.num(from, name)?;
        let end: Coord = self.num(to, name)?;
        if start == 0 {
            return Err(self.malformed(format!("{name} coordinates are 1-based, found 0")));
        }
        if start > end {
            return Err(self.malformed(format!("{name} start {start} is after end {end}")));
        }
        if end > MAX_COORD {
            return Err(self.malformed(format!("{name} end {end} exceeds {MAX_COORD}")));
        }
        Ok((start, end))
    }

    /// Protein length, checked against the end of the hit.
    pub(crate) fn protein_length(&self, length: Option<Coord>, query_end: Coord) -> Result<Option<Coord>> {
        match length {
            Some(0) => Err(self.malformed("protein length is 0")),
            Some(len) if query_end > len => Err(self.malformed(format!(
                "sequence end {query_end} exceeds protein length {len}"
            ))),
            other => Ok(other),
        }
    }
}

fn parse_domtbl_line(line: &str, line_no: usize, options: &ParseOptions) -> Result<HitRecord> {
    let row = Row { fields: line.split_whitespace().collect(), line, line_no };
    if row.fields.len() < DOMTBL_FIXED_COLUMNS {
        return Err(row.malformed(format!(
            "expected at least {DOMTBL_FIXED_COLUMNS} columns, found {}",
            row.fields.len()
        )));
    }

    // (protein name, protein length, model name, model accession, model length)
    let (protein_col, protein_len_col, domain_col, acc_col, model_len_col) = match options.program {
        SearchProgram::Hmmsearch => (0, 2, 3, 4, 5),
        SearchProgram::Hmmscan => (3, 5, 0, 1, 2),
    };

    let model_len: Coord = row.num(model_len_col, "model length")?;
    if model_len == 0 {
        return Err(row.malformed("model length is 0"));
    }
    let (hmm_from, hmm_to) = row.interval(15, 16, "hmm")?;
    if hmm_to > model_len {
        return Err(row.malformed(format!(
            "hmm end {hmm_to} exceeds model length {model_len}"
        )));
    }

    let (from_col, to_col) = match options.coordinates {
        CoordinateSystem::Ali => (17, 18),
        CoordinateSystem::Env => (19, 20),
    };
    let (query_start, query_end) = row.interval(from_col, to_col, "sequence")?;
    let protein_length = row.protein_length(Some(row.num(protein_len_col, "protein length")?), query_end)?;
    let domain_id = row.text(domain_col, "model name")?;

    Ok(HitRecord {
        protein_id: row.text(protein_col, "protein name")?.to_string(),
        protein_length,
        domain_id: domain_id.to_string(),
        domain_name: Some(domain_id.to_string()),
        domain_accession: row.text(acc_col, "model accession")?.to_string(),
        model_length: Some(model_len),
        query_start,
        query_end,
        significance: row.float(12, "i-Evalue")?,
        domain_coverage: (hmm_to - hmm_from + 1) as f64 / model_len as f64,
        bit_score: row.float(13, "domain score")?,
        aa_coverage: protein_length.map(|len| (query_end - query_start + 1) as f64 / len as f64),
    })
}
