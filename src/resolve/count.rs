use super::{match_target, Diagnostic, DiagnosticReason, TargetMatch};
use crate::matrix::{GenotypeCall, VariantRecord};
use crate::panel::PanelEntry;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedCount {
    Count(u8),
    Na,
}

impl ResolvedCount {
    pub fn is_na(&self) -> bool {
        matches!(self, ResolvedCount::Na)
    }
}

impl fmt::Display for ResolvedCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedCount::Count(n) => write!(f, "{}", n),
            ResolvedCount::Na => write!(f, "NA"),
        }
    }
}

/// Counts target copies in one raw genotype call.
///
/// A haploid call counts 1 when its single slot carries the target and 0
/// otherwise.
pub fn resolve_call(
    raw: &str,
    target: Option<&TargetMatch>,
    allele_count: usize,
) -> Result<u8, DiagnosticReason> {
    let slots = match GenotypeCall::parse(raw) {
        GenotypeCall::Missing => return Err(DiagnosticReason::MissingCall),
        GenotypeCall::Unreadable => return Err(DiagnosticReason::UnreadableCall),
        GenotypeCall::Called(slots) => slots,
    };
    let target = target.ok_or(DiagnosticReason::UnmatchedAllele)?;
    if slots.iter().any(|&index| index >= allele_count) {
        return Err(DiagnosticReason::AlleleIndexOutOfRange);
    }
    Ok(slots
        .iter()
        .filter(|&&index| index == target.allele_index)
        .count() as u8)
}

/// Counts and diagnostics of one matrix row against its panel entry.
#[derive(Debug, Clone)]
pub struct RowResolution {
    pub row_index: usize,
    pub panel_index: usize,
    pub target: Option<TargetMatch>,
    /// One count per sample, in header order.
    pub counts: Vec<ResolvedCount>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RowResolution {
    pub fn na_count(&self) -> usize {
        self.counts.iter().filter(|c| c.is_na()).count()
    }
}

pub fn resolve_row(
    row_index: usize,
    panel_index: usize,
    entry: &PanelEntry,
    record: &VariantRecord,
    samples: &[String],
) -> RowResolution {
    let target = match_target(entry, &record.ref_allele, &record.alt_alleles);
    match &target {
        Some(m) if m.ambiguous => log::warn!(
            "{}: target allele {} matches several alleles of {}:{} ({} rule), using index {}",
            entry.variant_id,
            entry.token,
            record.chrom,
            record.pos,
            m.rule,
            m.allele_index
        ),
        Some(m) => log::debug!(
            "{}: target allele {} is allele index {} ({} rule)",
            entry.variant_id,
            entry.token,
            m.allele_index,
            m.rule
        ),
        None => log::debug!(
            "{}: target allele {} not found among REF={} ALT={}",
            entry.variant_id,
            entry.token,
            record.ref_allele,
            record.alt_alleles.join(",")
        ),
    }

    let allele_count = record.allele_count();
    let mut counts = Vec::with_capacity(samples.len());
    let mut diagnostics = Vec::new();
    let mut diagnose = |sample_id: &str, reason: DiagnosticReason| {
        diagnostics.push(Diagnostic {
            sample_id: sample_id.to_string(),
            variant_id: entry.variant_id.clone(),
            reason,
        })
    };

    for (sample_id, raw) in samples.iter().zip(record.calls.iter()) {
        match resolve_call(raw, target.as_ref(), allele_count) {
            Ok(n) => {
                if target.is_some_and(|m| m.ambiguous) {
                    diagnose(sample_id, DiagnosticReason::AmbiguousTarget);
                }
                counts.push(ResolvedCount::Count(n));
            }
            Err(reason) => {
                diagnose(sample_id, reason);
                counts.push(ResolvedCount::Na);
            }
        }
    }

    RowResolution {
        row_index,
        panel_index,
        target,
        counts,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::MatchRule;

    fn target(allele_index: usize) -> TargetMatch {
        TargetMatch {
            allele_index,
            rule: MatchRule::Exact,
            ambiguous: false,
        }
    }

    fn record(ref_allele: &str, alt: &[&str], calls: &[&str]) -> VariantRecord {
        VariantRecord {
            chrom: "16".to_string(),
            pos: 89986117,
            id: "rs1805007".to_string(),
            ref_allele: ref_allele.to_string(),
            alt_alleles: alt.iter().map(|a| a.to_string()).collect(),
            calls: calls.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn samples(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("S{}", i)).collect()
    }

    #[test]
    fn test_resolve_call_counts_slots() {
        let alt = target(1);
        assert_eq!(resolve_call("1/1", Some(&alt), 2), Ok(2));
        assert_eq!(resolve_call("0|1", Some(&alt), 2), Ok(1));
        assert_eq!(resolve_call("1|0", Some(&alt), 2), Ok(1));
        assert_eq!(resolve_call("0/0", Some(&alt), 2), Ok(0));

        let reference = target(0);
        assert_eq!(resolve_call("0/0", Some(&reference), 2), Ok(2));
        assert_eq!(resolve_call("1/1", Some(&reference), 2), Ok(0));
    }

    #[test]
    fn test_resolve_call_haploid() {
        assert_eq!(resolve_call("1", Some(&target(1)), 2), Ok(1));
        assert_eq!(resolve_call("0", Some(&target(1)), 2), Ok(0));
        assert_eq!(resolve_call("0", Some(&target(0)), 2), Ok(1));
    }

    #[test]
    fn test_resolve_call_failures() {
        assert_eq!(
            resolve_call("./.", Some(&target(1)), 2),
            Err(DiagnosticReason::MissingCall)
        );
        assert_eq!(
            resolve_call("x/1", Some(&target(1)), 2),
            Err(DiagnosticReason::UnreadableCall)
        );
        assert_eq!(
            resolve_call("0/1", None, 2),
            Err(DiagnosticReason::UnmatchedAllele)
        );
        assert_eq!(
            resolve_call("0/2", Some(&target(1)), 2),
            Err(DiagnosticReason::AlleleIndexOutOfRange)
        );
        assert_eq!(
            resolve_call("0/99999999999999999999", Some(&target(1)), 2),
            Err(DiagnosticReason::AlleleIndexOutOfRange)
        );
    }

    #[test]
    fn test_missing_call_precedes_unmatched() {
        assert_eq!(
            resolve_call(".", None, 2),
            Err(DiagnosticReason::MissingCall)
        );
    }

    #[test]
    fn test_resolve_row_scenarios() {
        let entry = PanelEntry::new("rs1805007", "T", false, None).unwrap();
        let record = record("C", &["T"], &["1/1", "0/1", "./."]);
        let resolution = resolve_row(0, 0, &entry, &record, &samples(3));
        assert_eq!(
            resolution.counts,
            vec![
                ResolvedCount::Count(2),
                ResolvedCount::Count(1),
                ResolvedCount::Na
            ]
        );
        assert_eq!(
            resolution.diagnostics,
            vec![Diagnostic {
                sample_id: "S3".to_string(),
                variant_id: "rs1805007".to_string(),
                reason: DiagnosticReason::MissingCall,
            }]
        );
        assert_eq!(resolution.na_count(), 1);
    }

    #[test]
    fn test_resolve_row_complement_counts_ref_slots() {
        let entry = PanelEntry::new("rs1", "T", false, None).unwrap();
        let record = record("A", &["G"], &["1/1", "0/1", "0/0"]);
        let resolution = resolve_row(0, 0, &entry, &record, &samples(3));
        assert_eq!(resolution.target.unwrap().allele_index, 0);
        assert_eq!(
            resolution.counts,
            vec![
                ResolvedCount::Count(0),
                ResolvedCount::Count(1),
                ResolvedCount::Count(2)
            ]
        );
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn test_resolve_row_unmatched() {
        let entry = PanelEntry::new("rs1", "G", true, None).unwrap();
        let record = record("C", &["T"], &["0/1", "./."]);
        let resolution = resolve_row(0, 0, &entry, &record, &samples(2));
        assert_eq!(resolution.counts, vec![ResolvedCount::Na, ResolvedCount::Na]);
        let reasons: Vec<_> = resolution.diagnostics.iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            vec![DiagnosticReason::UnmatchedAllele, DiagnosticReason::MissingCall]
        );
    }

    #[test]
    fn test_resolve_row_ambiguous_is_diagnosed() {
        let entry = PanelEntry::new("rs1", "T", false, None).unwrap();
        let record = record("C", &["T", "T"], &["1/2", "./."]);
        let resolution = resolve_row(0, 0, &entry, &record, &samples(2));
        assert_eq!(
            resolution.counts,
            vec![ResolvedCount::Count(1), ResolvedCount::Na]
        );
        let reasons: Vec<_> = resolution.diagnostics.iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            vec![DiagnosticReason::AmbiguousTarget, DiagnosticReason::MissingCall]
        );
    }

    #[test]
    fn test_resolve_row_is_deterministic() {
        let entry = PanelEntry::new("rs1", "A", false, None).unwrap();
        let record = record("C", &["T"], &["0/1", "1|1", "2/0", "."]);
        let first = resolve_row(3, 1, &entry, &record, &samples(4));
        let second = resolve_row(3, 1, &entry, &record, &samples(4));
        assert_eq!(first.counts, second.counts);
        assert_eq!(first.diagnostics, second.diagnostics);
        assert_eq!(first.target, second.target);
    }

    #[test]
    fn test_display() {
        assert_eq!(ResolvedCount::Count(2).to_string(), "2");
        assert_eq!(ResolvedCount::Na.to_string(), "NA");
    }
}
