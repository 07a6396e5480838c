use crate::utils::Result;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteType {
    Snp,
    Indel,
}

impl FromStr for SiteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SNP" | "SNV" => Ok(SiteType::Snp),
            "INDEL" | "INS" | "DEL" => Ok(SiteType::Indel),
            _ => Err(format!("Invalid site type '{}': must be SNP or INDEL", s)),
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteType::Snp => write!(f, "SNP"),
            SiteType::Indel => write!(f, "INDEL"),
        }
    }
}

/// The allele a panel site counts.
///
/// A `Sequence` is a literal nucleotide string compared against REF/ALT. The
/// indel descriptors match by allele class (an ALT longer or shorter than
/// REF), optionally constrained to the inserted or deleted bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAllele {
    Sequence(String),
    Insertion(Option<String>),
    Deletion(Option<String>),
}

impl TargetAllele {
    pub fn is_indel_descriptor(&self) -> bool {
        !matches!(self, TargetAllele::Sequence(_))
    }
}

impl FromStr for TargetAllele {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim().to_ascii_uppercase();
        match token.as_str() {
            "" => Err("Empty allele token".to_string()),
            "INS" | "I" | "+" => Ok(TargetAllele::Insertion(None)),
            "DEL" | "D" | "-" => Ok(TargetAllele::Deletion(None)),
            _ => {
                if let Some(bases) = token.strip_prefix('+') {
                    Ok(TargetAllele::Insertion(Some(check_nucleotides(bases, s)?)))
                } else if let Some(bases) = token.strip_prefix('-') {
                    Ok(TargetAllele::Deletion(Some(check_nucleotides(bases, s)?)))
                } else {
                    Ok(TargetAllele::Sequence(check_nucleotides(&token, s)?))
                }
            }
        }
    }
}

fn check_nucleotides(bases: &str, token: &str) -> Result<String> {
    if !bases.is_empty() && bases.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T' | b'N')) {
        Ok(bases.to_string())
    } else {
        Err(format!("Invalid allele token '{}'", token))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub variant_id: String,
    /// Allele token as written in the panel, used for the output column name.
    pub token: String,
    pub target: TargetAllele,
    pub strand_sensitive: bool,
    pub site_type: SiteType,
}

impl PanelEntry {
    pub fn new(
        variant_id: &str,
        token: &str,
        strand_sensitive: bool,
        site_type: Option<SiteType>,
    ) -> Result<Self> {
        let variant_id = variant_id.trim();
        if variant_id.is_empty() {
            return Err("Missing variant identifier".to_string());
        }
        let target: TargetAllele = token.parse()?;
        let site_type = match site_type {
            Some(SiteType::Snp) if target.is_indel_descriptor() => {
                return Err(format!(
                    "Allele '{}' is an indel descriptor but the site is marked SNP",
                    token.trim()
                ))
            }
            Some(site_type) => site_type,
            None if target.is_indel_descriptor() => SiteType::Indel,
            None => SiteType::Snp,
        };
        Ok(PanelEntry {
            variant_id: variant_id.to_string(),
            token: token.trim().to_ascii_uppercase(),
            target,
            strand_sensitive,
            site_type,
        })
    }

    pub fn column_name(&self) -> String {
        format!("{}_{}", self.variant_id, self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_sequence() {
        assert_eq!(
            "t".parse::<TargetAllele>().unwrap(),
            TargetAllele::Sequence("T".to_string())
        );
        assert_eq!(
            " AG ".parse::<TargetAllele>().unwrap(),
            TargetAllele::Sequence("AG".to_string())
        );
    }

    #[test]
    fn test_parse_target_indel_descriptors() {
        assert_eq!(
            "INS".parse::<TargetAllele>().unwrap(),
            TargetAllele::Insertion(None)
        );
        assert_eq!(
            "-".parse::<TargetAllele>().unwrap(),
            TargetAllele::Deletion(None)
        );
        assert_eq!(
            "+a".parse::<TargetAllele>().unwrap(),
            TargetAllele::Insertion(Some("A".to_string()))
        );
        assert_eq!(
            "-CT".parse::<TargetAllele>().unwrap(),
            TargetAllele::Deletion(Some("CT".to_string()))
        );
    }

    #[test]
    fn test_parse_target_invalid() {
        assert!("".parse::<TargetAllele>().is_err());
        assert!("X".parse::<TargetAllele>().is_err());
        assert!("+Q".parse::<TargetAllele>().is_err());
    }

    #[test]
    fn test_site_type_inferred_from_target() {
        let snp = PanelEntry::new("rs1805007", "T", false, None).unwrap();
        assert_eq!(snp.site_type, SiteType::Snp);
        let indel = PanelEntry::new("rs312262906", "INS", false, None).unwrap();
        assert_eq!(indel.site_type, SiteType::Indel);
        let shorthand = PanelEntry::new("rs312262906", "A", false, Some(SiteType::Indel)).unwrap();
        assert_eq!(shorthand.site_type, SiteType::Indel);
        assert_eq!(shorthand.target, TargetAllele::Sequence("A".to_string()));
    }

    #[test]
    fn test_descriptor_on_snp_site_err() {
        assert!(PanelEntry::new("rs1", "DEL", false, Some(SiteType::Snp)).is_err());
    }

    #[test]
    fn test_missing_identifier_err() {
        assert_eq!(
            PanelEntry::new("  ", "T", false, None),
            Err("Missing variant identifier".to_string())
        );
    }

    #[test]
    fn test_column_name() {
        let entry = PanelEntry::new("rs12913832", "t", false, None).unwrap();
        assert_eq!(entry.column_name(), "rs12913832_T");
    }
}
