use super::{PanelEntry, SiteType};
use crate::utils::{open_text_reader, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{collections::HashMap, io::Read, path::Path};

const ID_COLUMNS: [&str; 4] = ["SNP", "rsID", "ID", "variant_id"];
const ALLELE_COLUMNS: [&str; 2] = ["Allele", "target_allele"];
const STRAND_COLUMNS: [&str; 2] = ["strand_sensitive", "strand"];
const SITE_TYPE_COLUMNS: [&str; 2] = ["site_type", "type"];

/// Panel sites in column order, indexed by variant identifier.
#[derive(Debug, Default)]
pub struct Panel {
    entries: Vec<PanelEntry>,
    index: HashMap<String, usize>,
}

impl Panel {
    /// Builds a panel from entries in file order. A repeated identifier
    /// replaces the earlier entry but keeps its column position.
    pub fn from_entries(entries: impl IntoIterator<Item = PanelEntry>) -> Self {
        let mut panel = Panel::default();
        for entry in entries {
            match panel.index.get(&entry.variant_id) {
                Some(&position) => {
                    log::warn!(
                        "Duplicate panel entry for {}: replacing allele {} with {}",
                        entry.variant_id,
                        panel.entries[position].token,
                        entry.token
                    );
                    panel.entries[position] = entry;
                }
                None => {
                    panel
                        .index
                        .insert(entry.variant_id.clone(), panel.entries.len());
                    panel.entries.push(entry);
                }
            }
        }
        panel
    }

    pub fn entries(&self) -> &[PanelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, variant_id: &str) -> Option<usize> {
        self.index.get(variant_id).copied()
    }

    pub fn get(&self, variant_id: &str) -> Option<&PanelEntry> {
        self.position(variant_id).map(|i| &self.entries[i])
    }
}

pub fn load_panel(path: &Path) -> Result<Panel> {
    let delimiter = match path
        .to_string_lossy()
        .to_lowercase()
        .trim_end_matches(".gz")
        .rsplit('.')
        .next()
    {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    };
    let reader = open_text_reader(path)?;
    let panel = read_panel(reader, delimiter)
        .map_err(|e| format!("Panel {}: {}", path.display(), e))?;
    if panel.is_empty() {
        return Err(format!("Panel has no valid entries: {}", path.display()));
    }
    Ok(panel)
}

pub fn read_panel<R: Read>(reader: R, delimiter: u8) -> Result<Panel> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| format!("Error reading header: {}", e))?
        .clone();
    let id_col = find_column(&headers, &ID_COLUMNS).ok_or_else(|| {
        format!(
            "Header must contain one of the identifier columns {:?}",
            ID_COLUMNS
        )
    })?;
    let allele_col = find_column(&headers, &ALLELE_COLUMNS).ok_or_else(|| {
        format!(
            "Header must contain one of the allele columns {:?}",
            ALLELE_COLUMNS
        )
    })?;
    let strand_col = find_column(&headers, &STRAND_COLUMNS);
    let site_type_col = find_column(&headers, &SITE_TYPE_COLUMNS);

    let mut entries = Vec::new();
    for (row_number, result) in csv_reader.records().enumerate() {
        // Header occupies line 1
        let line_number = row_number + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => {
                return Err(format!("Error at panel line {}: {}", line_number, e))
            }
            Err(e) => {
                log::warn!("Skipping panel line {}: {}", line_number, e);
                continue;
            }
        };
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        match parse_entry(&record, id_col, allele_col, strand_col, site_type_col) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::warn!("Skipping panel line {}: {}", line_number, e),
        }
    }

    Ok(Panel::from_entries(entries))
}

fn parse_entry(
    record: &StringRecord,
    id_col: usize,
    allele_col: usize,
    strand_col: Option<usize>,
    site_type_col: Option<usize>,
) -> Result<PanelEntry> {
    let variant_id = record.get(id_col).unwrap_or("");
    let token = record.get(allele_col).unwrap_or("");
    if token.is_empty() {
        return Err(format!("Missing target allele for '{}'", variant_id));
    }

    // Unrecognised annotations fall back to their defaults; only the
    // identifier and allele can drop a row.
    let strand_sensitive = match strand_col.and_then(|i| record.get(i)) {
        Some(value) if !value.is_empty() => parse_strand_sensitive(value).unwrap_or_else(|e| {
            log::warn!("{} for '{}', allowing either strand", e, variant_id);
            false
        }),
        _ => false,
    };
    let site_type = match site_type_col.and_then(|i| record.get(i)) {
        Some(value) if !value.is_empty() => match value.parse::<SiteType>() {
            Ok(site_type) => Some(site_type),
            Err(e) => {
                log::warn!("{} for '{}', inferring from the allele", e, variant_id);
                None
            }
        },
        _ => None,
    };

    PanelEntry::new(variant_id, token, strand_sensitive, site_type)
}

fn parse_strand_sensitive(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "+" | "fwd" | "forward" => Ok(true),
        // A reverse-strand allele only matches through its complement
        "false" | "no" | "n" | "0" | "either" | "any" | "-" | "rev" | "reverse" => Ok(false),
        _ => Err(format!("Invalid strand annotation '{}'", value)),
    }
}

fn find_column(headers: &StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(candidate))
    })
}
