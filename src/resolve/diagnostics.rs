use itertools::Itertools;
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticReason {
    MissingCall,
    UnreadableCall,
    UnmatchedAllele,
    AlleleIndexOutOfRange,
    /// Recorded next to a resolved count; the cell itself is not NA.
    AmbiguousTarget,
}

impl DiagnosticReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticReason::MissingCall => "missing_call",
            DiagnosticReason::UnreadableCall => "unreadable_call",
            DiagnosticReason::UnmatchedAllele => "unmatched_allele",
            DiagnosticReason::AlleleIndexOutOfRange => "allele_index_out_of_range",
            DiagnosticReason::AmbiguousTarget => "ambiguous_target",
        }
    }
}

impl fmt::Display for DiagnosticReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub sample_id: String,
    pub variant_id: String,
    pub reason: DiagnosticReason,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiagnosticSummary {
    by_reason: BTreeMap<DiagnosticReason, usize>,
}

impl DiagnosticSummary {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut by_reason = BTreeMap::new();
        for diagnostic in diagnostics {
            *by_reason.entry(diagnostic.reason).or_insert(0) += 1;
        }
        DiagnosticSummary { by_reason }
    }

    pub fn count(&self, reason: DiagnosticReason) -> usize {
        self.by_reason.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.by_reason.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_reason.is_empty()
    }

    pub fn describe(&self) -> String {
        self.by_reason
            .iter()
            .map(|(reason, count)| format!("{}={}", reason, count))
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(reason: DiagnosticReason) -> Diagnostic {
        Diagnostic {
            sample_id: "HG00096".to_string(),
            variant_id: "rs1805007".to_string(),
            reason,
        }
    }

    #[test]
    fn test_summary_counts() {
        let diagnostics = vec![
            diagnostic(DiagnosticReason::MissingCall),
            diagnostic(DiagnosticReason::UnmatchedAllele),
            diagnostic(DiagnosticReason::MissingCall),
        ];
        let summary = DiagnosticSummary::from_diagnostics(&diagnostics);
        assert_eq!(summary.count(DiagnosticReason::MissingCall), 2);
        assert_eq!(summary.count(DiagnosticReason::UnmatchedAllele), 1);
        assert_eq!(summary.count(DiagnosticReason::AmbiguousTarget), 0);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.describe(), "missing_call=2, unmatched_allele=1");
    }

    #[test]
    fn test_summary_empty() {
        let summary = DiagnosticSummary::from_diagnostics(&[]);
        assert!(summary.is_empty());
        assert_eq!(summary.describe(), "");
    }
}
