use crate::panel::{PanelEntry, SiteType, TargetAllele};
use std::fmt;

/// Rules for locating the target allele in a record, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchRule {
    Exact,
    Complement,
    IndelClass,
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Exact => write!(f, "exact"),
            MatchRule::Complement => write!(f, "complement"),
            MatchRule::IndelClass => write!(f, "indel"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetMatch {
    /// 0 for REF, k for the k-th ALT.
    pub allele_index: usize,
    pub rule: MatchRule,
    /// More than one allele satisfied the winning rule.
    pub ambiguous: bool,
}

pub fn complement_base(base: char) -> Option<char> {
    match base.to_ascii_uppercase() {
        'A' => Some('T'),
        'T' => Some('A'),
        'C' => Some('G'),
        'G' => Some('C'),
        _ => None,
    }
}

/// Finds which allele of a record carries the panel's target allele.
/// Returns `None` when no rule applies.
pub fn match_target(
    entry: &PanelEntry,
    ref_allele: &str,
    alt_alleles: &[String],
) -> Option<TargetMatch> {
    let alleles: Vec<&str> = std::iter::once(ref_allele)
        .chain(alt_alleles.iter().map(String::as_str))
        .collect();

    if let TargetAllele::Sequence(target) = &entry.target {
        let exact = positions(&alleles, |allele| allele.eq_ignore_ascii_case(target));
        if let Some(m) = pick(MatchRule::Exact, exact) {
            return Some(m);
        }

        if !entry.strand_sensitive {
            if let Some(flipped) = single_base(target).and_then(complement_base) {
                let complement = positions(&alleles, |allele| {
                    single_base(allele).is_some_and(|b| b.eq_ignore_ascii_case(&flipped))
                });
                if let Some(m) = pick(MatchRule::Complement, complement) {
                    return Some(m);
                }
            }
        }
    }

    if entry.site_type == SiteType::Indel {
        return pick(
            MatchRule::IndelClass,
            indel_positions(&entry.target, ref_allele, alt_alleles),
        );
    }

    None
}

fn single_base(allele: &str) -> Option<char> {
    let mut chars = allele.chars();
    match (chars.next(), chars.next()) {
        (Some(base), None) => Some(base),
        _ => None,
    }
}

fn positions(alleles: &[&str], predicate: impl Fn(&str) -> bool) -> Vec<usize> {
    alleles
        .iter()
        .enumerate()
        .filter(|&(_, allele)| predicate(*allele))
        .map(|(i, _)| i)
        .collect()
}

fn pick(rule: MatchRule, indices: Vec<usize>) -> Option<TargetMatch> {
    let allele_index = *indices.iter().min()?;
    Some(TargetMatch {
        allele_index,
        rule,
        ambiguous: indices.len() > 1,
    })
}

fn indel_positions(target: &TargetAllele, ref_allele: &str, alt_alleles: &[String]) -> Vec<usize> {
    let mut indices = Vec::new();
    for (i, alt) in alt_alleles.iter().enumerate() {
        let alt_index = i + 1;
        match target {
            // Shorthand: the target names the base that one allele carries in
            // addition to the other.
            TargetAllele::Sequence(bases) => {
                if extra_tail(alt, ref_allele).is_some_and(|tail| tail.eq_ignore_ascii_case(bases)) {
                    indices.push(alt_index);
                } else if extra_tail(ref_allele, alt)
                    .is_some_and(|tail| tail.eq_ignore_ascii_case(bases))
                {
                    indices.push(0);
                }
            }
            TargetAllele::Insertion(bases) => {
                if let Some(inserted) = extra_tail(alt, ref_allele) {
                    if tail_matches(inserted, bases.as_deref()) {
                        indices.push(alt_index);
                    }
                }
            }
            TargetAllele::Deletion(bases) => {
                if let Some(deleted) = extra_tail(ref_allele, alt) {
                    if tail_matches(deleted, bases.as_deref()) {
                        indices.push(alt_index);
                    }
                }
            }
        }
    }
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Bases `longer` carries after sharing all of `shorter` as a prefix.
fn extra_tail<'a>(longer: &'a str, shorter: &str) -> Option<&'a str> {
    if longer.len() > shorter.len()
        && longer.is_char_boundary(shorter.len())
        && longer[..shorter.len()].eq_ignore_ascii_case(shorter)
    {
        Some(&longer[shorter.len()..])
    } else {
        None
    }
}

fn tail_matches(tail: &str, bases: Option<&str>) -> bool {
    bases.map_or(true, |bases| tail.eq_ignore_ascii_case(bases))
}
