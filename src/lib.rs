//! Per-sample target allele counts for a fixed variant panel.
//!
//! The input is a genotype matrix (`CHROM POS ID REF ALT <samples...>`)
//! extracted from reference VCFs, plus a panel naming, for each variant, the
//! allele to count. For every sample and panel site the output holds the
//! number of target allele copies (0, 1 or 2) or `NA`, resolving strand
//! flips and simple indel notation along the way.

pub mod cli;
pub mod commands;
pub mod matrix;
pub mod panel;
pub mod resolve;
pub mod utils;
pub mod workflows;
pub mod writers;
