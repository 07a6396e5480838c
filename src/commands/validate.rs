use crate::cli::ValidateArgs;
use crate::matrix::MatrixReader;
use crate::panel::load_panel;
use crate::utils::{open_text_reader, Result};
use crate::workflows::{run_panel, Params, SiteStatus};

pub fn validate(args: ValidateArgs) -> Result<()> {
    let panel = load_panel(&args.panel_path)?;
    let source = MatrixReader::new(open_text_reader(&args.matrix_path)?)
        .map_err(|e| format!("Matrix {}: {}", args.matrix_path.display(), e))?;

    let run = run_panel(
        source,
        &panel,
        &Params {
            num_threads: args.num_threads,
            max_retries: 0,
        },
    )?;

    let mut absent_count = 0;
    let mut unmatched_count = 0;
    let mut ambiguous_count = 0;
    let mut success_count = 0;
    for site in &run.sites {
        match site.status {
            SiteStatus::Absent => {
                log::error!("{}: not found in matrix", site.column);
                absent_count += 1;
            }
            SiteStatus::Unmatched => {
                log::error!("{}: target allele not found at site", site.column);
                unmatched_count += 1;
            }
            SiteStatus::Matched(m) => {
                if m.ambiguous {
                    log::warn!(
                        "{}: ambiguous target, using allele index {} ({} rule)",
                        site.column,
                        m.allele_index,
                        m.rule
                    );
                    ambiguous_count += 1;
                } else {
                    log::info!(
                        "{}: allele index {} ({} rule)",
                        site.column,
                        m.allele_index,
                        m.rule
                    );
                }
                success_count += 1;
            }
        }
    }

    let total = run.sites.len();
    let error_count = absent_count + unmatched_count;
    let success_percentage = (success_count as f64 / total as f64) * 100.0;
    let error_percentage = (error_count as f64 / total as f64) * 100.0;

    match error_count {
        0 => log::info!(
            "Validation successful. Sites pass={} (ambiguous={})",
            success_count,
            ambiguous_count
        ),
        _ => log::info!(
            "Validation failed. Sites pass={} ({:.2}%), fail={} ({:.2}%: absent={}, unmatched={})",
            success_count,
            success_percentage,
            error_count,
            error_percentage,
            absent_count,
            unmatched_count
        ),
    }

    Ok(())
}
