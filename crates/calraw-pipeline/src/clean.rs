//! Clean collaborator: normalize one raw TSV into a loadable CSV.
//!
//! The raw files ship as tab-delimited text with assorted defects: NUL
//! bytes, stray carriage returns inside fields, and rows whose field count
//! disagrees with the header. Normalization re-delimits to CSV, strips the
//! junk, and forces every row to the header's width (short rows padded,
//! long rows truncated) so the loader's strict CSV parse never trips on
//! shape. Content is otherwise untouched.

use crate::error::Result;
use std::io::{BufRead, Write};
use std::path::Path;

/// Counters from one normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Data rows written
    pub rows: u64,
    /// Rows padded up to the header width
    pub short_rows: u64,
    /// Rows truncated down to the header width
    pub long_rows: u64,
}

/// Normalize tab-delimited `input` into CSV on `output`.
///
/// The first line is the header and fixes the field count for the whole
/// file. Returns the counters; an input without any lines produces an
/// empty output and a zero report.
pub fn normalize<R: BufRead, W: Write>(input: R, output: W) -> Result<NormalizeReport> {
    let mut writer = csv::Writer::from_writer(output);
    let mut report = NormalizeReport::default();
    let mut width: Option<usize> = None;

    let mut lines = RawLines::new(input);
    while let Some(line) = lines.next_line()? {
        if width.is_some() && line.is_empty() {
            continue;
        }
        let fields: Vec<String> = line.split('\t').map(str::to_string).collect();

        match width {
            None => {
                width = Some(fields.len());
                writer.write_record(&fields)?;
            }
            Some(expected) => {
                let mut fields = fields;
                if fields.len() < expected {
                    report.short_rows += 1;
                    fields.resize(expected, String::new());
                } else if fields.len() > expected {
                    report.long_rows += 1;
                    fields.truncate(expected);
                }
                writer.write_record(&fields)?;
                report.rows += 1;
            }
        }
    }

    writer.flush()?;
    Ok(report)
}

/// Normalize the file at `src` into `dst`.
pub fn normalize_file(src: &Path, dst: &Path) -> Result<NormalizeReport> {
    let input = std::io::BufReader::new(std::fs::File::open(src)?);
    let output = std::io::BufWriter::new(std::fs::File::create(dst)?);
    let report = normalize(input, output)?;

    tracing::info!(
        src = %src.display(),
        dst = %dst.display(),
        rows = report.rows,
        short_rows = report.short_rows,
        long_rows = report.long_rows,
        "Cleaned file"
    );

    Ok(report)
}

/// Line iterator over possibly non-UTF-8 input: decodes lossily, strips NUL
/// bytes and the trailing CR of CRLF endings.
struct RawLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> RawLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }

        self.buf.retain(|&b| b != 0);
        let mut line = String::from_utf8_lossy(&self.buf).into_owned();
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// Derive the cleaned CSV file name for a raw TSV file name.
pub fn csv_name_for(tsv_name: &str) -> String {
    let stem = tsv_name
        .strip_suffix(".TSV")
        .or_else(|| tsv_name.strip_suffix(".tsv"))
        .unwrap_or(tsv_name);
    format!("{}.csv", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &[u8]) -> (String, NormalizeReport) {
        let mut out = Vec::new();
        let report = normalize(std::io::BufReader::new(input), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), report)
    }

    #[test]
    fn tabs_become_commas_with_quoting_as_needed() {
        let (out, report) = run(b"A\tB\n1\thello, world\n");
        assert_eq!(out, "A,B\n1,\"hello, world\"\n");
        assert_eq!(report.rows, 1);
    }

    #[test]
    fn crlf_endings_and_nul_bytes_are_stripped() {
        let (out, report) = run(b"A\tB\r\n1\x00\t2\r\n");
        assert_eq!(out, "A,B\n1,2\n");
        assert_eq!(report.rows, 1);
    }

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let (out, report) = run(b"A\tB\tC\n1\t2\n");
        assert_eq!(out, "A,B,C\n1,2,\n");
        assert_eq!(report.short_rows, 1);
    }

    #[test]
    fn long_rows_are_truncated_to_header_width() {
        let (out, report) = run(b"A\tB\n1\t2\t3\t4\n");
        assert_eq!(out, "A,B\n1,2\n");
        assert_eq!(report.long_rows, 1);
    }

    #[test]
    fn blank_lines_after_the_header_are_dropped() {
        let (out, report) = run(b"A\tB\n1\t2\n\n3\t4\n");
        assert_eq!(out, "A,B\n1,2\n3,4\n");
        assert_eq!(report.rows, 2);
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let (out, report) = run(b"");
        assert_eq!(out, "");
        assert_eq!(report, NormalizeReport::default());
    }

    #[test]
    fn embedded_quotes_survive_the_round_trip() {
        let (out, _) = run(b"A\tB\n1\tsay \"hi\"\n");
        assert_eq!(out, "A,B\n1,\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn csv_name_replaces_tsv_extension() {
        assert_eq!(csv_name_for("CVR_SO_CD.TSV"), "CVR_SO_CD.csv");
        assert_eq!(csv_name_for("lower.tsv"), "lower.csv");
        assert_eq!(csv_name_for("noext"), "noext.csv");
    }

    #[test]
    fn normalize_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("SMRY_CD.TSV");
        let dst = dir.path().join("SMRY_CD.csv");
        std::fs::write(&src, b"FILING_ID\tELEC_DT\r\n1\t3/4/2014\r\n2\t12/31/1999\r\n").unwrap();

        let report = normalize_file(&src, &dst).unwrap();
        assert_eq!(report.rows, 2);

        let cleaned = std::fs::read_to_string(&dst).unwrap();
        assert_eq!(cleaned, "FILING_ID,ELEC_DT\n1,3/4/2014\n2,12/31/1999\n");
    }
}
