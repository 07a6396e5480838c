use super::{split_alt, VariantRecord};
use crate::utils::Result;
use crossbeam_channel::Sender;
use std::{collections::HashSet, fmt, io, io::BufRead};

const FIXED_COLUMNS: [&str; 5] = ["CHROM", "POS", "ID", "REF", "ALT"];
const MISSING_CALL: &str = "./.";

/// Failure of a record source. Retryable failures may succeed when the same
/// read is attempted again; fatal failures end the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Retryable(String),
    Fatal(String),
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Retryable(_))
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Retryable(msg) | SourceError::Fatal(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<io::Error> for SourceError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                SourceError::Retryable(e.to_string())
            }
            _ => SourceError::Fatal(e.to_string()),
        }
    }
}

/// A stream of matrix rows sharing one sample header.
pub trait RecordSource {
    fn samples(&self) -> &[String];
    fn next_record(&mut self) -> Option<std::result::Result<VariantRecord, SourceError>>;
}

/// Reads the tab-separated `CHROM POS ID REF ALT <samples...>` matrix.
pub struct MatrixReader<R: BufRead> {
    reader: R,
    samples: Vec<String>,
    line_number: usize,
    /// Bytes of the line being read. Kept across a failed read so a retry
    /// completes the same line.
    line: Vec<u8>,
}

impl<R: BufRead> MatrixReader<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let mut header = String::new();
        let read = reader
            .read_line(&mut header)
            .map_err(|e| format!("Error reading matrix header: {}", e))?;
        if read == 0 {
            return Err("Matrix is empty".to_string());
        }
        let samples = parse_header(header.trim_end_matches(['\n', '\r']))?;
        Ok(MatrixReader {
            reader,
            samples,
            line_number: 1,
            line: Vec::new(),
        })
    }

    fn parse_line(&self, line: &str) -> std::result::Result<Option<VariantRecord>, SourceError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < FIXED_COLUMNS.len() {
            log::warn!(
                "Skipping matrix line {}: expected at least {} fields, found {}",
                self.line_number,
                FIXED_COLUMNS.len(),
                fields.len()
            );
            return Ok(None);
        }

        let id = fields[2].trim();
        if id.is_empty() || id == "." {
            log::debug!("Skipping matrix line {}: no variant ID", self.line_number);
            return Ok(None);
        }

        let pos = fields[1].trim().parse::<u64>().map_err(|_| {
            SourceError::Fatal(format!(
                "Invalid POS '{}' at matrix line {}",
                fields[1], self.line_number
            ))
        })?;

        let gt_fields = &fields[FIXED_COLUMNS.len()..];
        if gt_fields.len() > self.samples.len() {
            return Err(SourceError::Fatal(format!(
                "Matrix line {} has {} genotype columns but the header lists {} samples",
                self.line_number,
                gt_fields.len(),
                self.samples.len()
            )));
        }
        let mut calls: Vec<String> = gt_fields.iter().map(|gt| gt.trim().to_string()).collect();
        if calls.len() < self.samples.len() {
            log::debug!(
                "Matrix line {}: padding {} absent genotype columns as missing",
                self.line_number,
                self.samples.len() - calls.len()
            );
            calls.resize(self.samples.len(), MISSING_CALL.to_string());
        }

        Ok(Some(VariantRecord {
            chrom: fields[0].trim().to_string(),
            pos,
            id: id.to_string(),
            ref_allele: fields[3].trim().to_ascii_uppercase(),
            alt_alleles: split_alt(fields[4]),
            calls,
        }))
    }
}

impl<R: BufRead> RecordSource for MatrixReader<R> {
    fn samples(&self) -> &[String] {
        &self.samples
    }

    fn next_record(&mut self) -> Option<std::result::Result<VariantRecord, SourceError>> {
        loop {
            let read = match self.reader.read_until(b'\n', &mut self.line) {
                Ok(read) => read,
                Err(e) => {
                    let error: SourceError = e.into();
                    return Some(Err(match error {
                        SourceError::Retryable(msg) => SourceError::Retryable(format!(
                            "Error reading matrix after line {}: {}",
                            self.line_number, msg
                        )),
                        SourceError::Fatal(msg) => SourceError::Fatal(format!(
                            "Error reading matrix after line {}: {}",
                            self.line_number, msg
                        )),
                    }));
                }
            };
            if read == 0 && self.line.is_empty() {
                return None;
            }
            self.line_number += 1;

            let mut line = std::mem::take(&mut self.line);
            let parsed = match std::str::from_utf8(&line) {
                Ok(text) if text.trim().is_empty() => Ok(None),
                Ok(text) => self.parse_line(text),
                Err(_) => Err(SourceError::Fatal(format!(
                    "Matrix line {} is not valid UTF-8",
                    self.line_number
                ))),
            };
            line.clear();
            self.line = line;

            match parsed {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Parses the header row and returns the sample identifiers. Column names
/// written by `bcftools query -H` (`#[1]CHROM`, `[6]HG00096:GT`) are accepted.
fn parse_header(line: &str) -> Result<Vec<String>> {
    let columns: Vec<String> = line.split('\t').map(normalize_column_name).collect();

    let leading_ok = columns.len() >= FIXED_COLUMNS.len()
        && columns
            .iter()
            .zip(FIXED_COLUMNS.iter())
            .all(|(found, expected)| found.eq_ignore_ascii_case(expected));
    if !leading_ok {
        return Err(format!(
            "Matrix header must start with {}, found: {}",
            FIXED_COLUMNS.join(", "),
            line
        ));
    }

    let samples = columns[FIXED_COLUMNS.len()..].to_vec();
    if samples.is_empty() {
        return Err("Matrix header lists no samples".to_string());
    }

    let mut observed = HashSet::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        if sample.is_empty() {
            return Err(format!(
                "Matrix header has an empty sample name in column {}",
                i + FIXED_COLUMNS.len() + 1
            ));
        }
        if !observed.insert(sample.as_str()) {
            return Err(format!("Duplicate sample ID found: {}", sample));
        }
    }

    Ok(samples)
}

fn normalize_column_name(name: &str) -> String {
    let name = name.trim().trim_start_matches('#');
    let name = match name.strip_prefix('[') {
        Some(rest) => rest
            .split_once(']')
            .map_or(name, |(index, rest)| {
                if index.chars().all(|c| c.is_ascii_digit()) {
                    rest
                } else {
                    name
                }
            }),
        None => name,
    };
    name.strip_suffix(":GT").unwrap_or(name).to_string()
}

/// Drains a record source into a channel, retrying retryable failures up to
/// `max_retries` consecutive times. The first fatal failure is sent and ends
/// the stream.
pub fn stream_records_into_channel<S: RecordSource>(
    mut source: S,
    max_retries: usize,
    sender: Sender<Result<VariantRecord>>,
) {
    let mut attempts = 0;
    while let Some(result) = source.next_record() {
        let message = match result {
            Ok(record) => {
                attempts = 0;
                if sender.send(Ok(record)).is_err() {
                    log::debug!("Record receiver closed, stopping matrix stream");
                    return;
                }
                continue;
            }
            Err(e) if e.is_retryable() && attempts < max_retries => {
                attempts += 1;
                log::warn!(
                    "Retrying matrix read ({}/{}): {}",
                    attempts,
                    max_retries,
                    e
                );
                continue;
            }
            Err(e) => e.to_string(),
        };
        if sender.send(Err(message)).is_err() {
            log::debug!("Record receiver closed, stopping matrix stream");
        }
        return;
    }
}
