use arrayvec::ArrayVec;

/// Allele indices of a called genotype: one slot for haploid calls, two for diploid.
pub type AlleleSlots = ArrayVec<usize, 2>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenotypeCall {
    Missing,
    Unreadable,
    Called(AlleleSlots),
}

impl GenotypeCall {
    /// Parses a raw `GT` string. Phased and unphased separators are treated
    /// alike; any missing slot makes the whole call missing.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "." {
            return GenotypeCall::Missing;
        }

        let parts: Vec<&str> = raw.split(['/', '|']).collect();
        if parts.len() > 2 {
            return GenotypeCall::Unreadable;
        }
        if parts.iter().any(|part| *part == ".") {
            return GenotypeCall::Missing;
        }

        parts
            .iter()
            .map(|part| match part.parse::<usize>() {
                Ok(index) if !part.starts_with('+') => Some(index),
                // Too large for any allele list, so out of range rather than unreadable
                Err(_) if part.bytes().all(|b| b.is_ascii_digit()) && !part.is_empty() => {
                    Some(usize::MAX)
                }
                _ => None,
            })
            .collect::<Option<AlleleSlots>>()
            .map_or(GenotypeCall::Unreadable, GenotypeCall::Called)
    }
}

/// One row of the merged genotype matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt_alleles: Vec<String>,
    /// Raw genotype strings in sample header order.
    pub calls: Vec<String>,
}

impl VariantRecord {
    /// Number of alleles addressable by a genotype index (REF plus ALTs).
    pub fn allele_count(&self) -> usize {
        1 + self.alt_alleles.len()
    }
}

/// Splits an ALT column into alleles. Comma-joined multi-allelic values are
/// split again even though the extractor normally normalizes them.
pub fn split_alt(alt: &str) -> Vec<String> {
    alt.split(',')
        .map(|a| a.trim())
        .filter(|a| !a.is_empty() && *a != ".")
        .map(|a| a.to_ascii_uppercase())
        .collect()
}
