mod allele;
mod count;
mod diagnostics;

pub use allele::{complement_base, match_target, MatchRule, TargetMatch};
pub use count::{resolve_call, resolve_row, ResolvedCount, RowResolution};
pub use diagnostics::{Diagnostic, DiagnosticReason, DiagnosticSummary};
