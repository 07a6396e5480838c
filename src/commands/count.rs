use crate::cli::CountArgs;
use crate::matrix::{MatrixReader, RecordSource};
use crate::panel::load_panel;
use crate::resolve::DiagnosticSummary;
use crate::utils::{format_number_with_commas, open_text_reader, Result};
use crate::workflows::{run_panel, Params, PanelRun, SiteStatus};
use crate::writers::stage_diagnostics;
use std::time;

pub fn count(args: CountArgs) -> Result<()> {
    let start_timer = time::Instant::now();

    let panel = load_panel(&args.panel_path)?;
    log::info!(
        "Loaded {} panel sites from {}",
        panel.len(),
        args.panel_path.display()
    );

    let source = MatrixReader::new(open_text_reader(&args.matrix_path)?)
        .map_err(|e| format!("Matrix {}: {}", args.matrix_path.display(), e))?;
    log::info!(
        "Matrix lists {} samples",
        format_number_with_commas(source.samples().len())
    );

    let run = run_panel(
        source,
        &panel,
        &Params {
            num_threads: args.num_threads,
            max_retries: args.max_retries,
        },
    )?;

    // Both outputs are fully written before either is moved into place
    let staged_table = run.table.stage_csv(&args.output_path)?;
    let staged_diagnostics = match &args.diagnostics_path {
        Some(path) => Some(stage_diagnostics(path, &run.diagnostics)?),
        None => None,
    };
    if let Some(staged) = staged_diagnostics {
        let path = staged.path().to_path_buf();
        staged.commit()?;
        log::info!(
            "Wrote {} diagnostics to {}",
            format_number_with_commas(run.diagnostics.len()),
            path.display()
        );
    }
    staged_table.commit()?;
    log::info!(
        "Wrote {} samples x {} sites to {}",
        format_number_with_commas(run.table.samples().len()),
        run.table.columns().len(),
        args.output_path.display()
    );

    log_summary(&run, args.na_warn_frac);
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}

fn log_summary(run: &PanelRun, na_warn_frac: f64) {
    let num_samples = run.table.samples().len();
    let mut all_na = 0;
    for site in &run.sites {
        let na_frac = site.na_count as f64 / num_samples as f64;
        match site.status {
            SiteStatus::Absent => {
                log::warn!("{}: site absent from matrix, all values NA", site.column)
            }
            SiteStatus::Unmatched => log::warn!(
                "{}: target allele matches neither REF nor ALT, all values NA",
                site.column
            ),
            SiteStatus::Matched(_) if site.na_count == num_samples => {
                log::warn!("{}: all values NA", site.column)
            }
            SiteStatus::Matched(_) if na_frac > na_warn_frac => log::warn!(
                "{}: {:.1}% of values NA",
                site.column,
                100.0 * na_frac
            ),
            SiteStatus::Matched(_) => {}
        }
        if site.na_count == num_samples {
            all_na += 1;
        }
    }
    if all_na == 0 {
        log::info!("No site is entirely NA");
    }

    let summary = DiagnosticSummary::from_diagnostics(&run.diagnostics);
    if summary.is_empty() {
        log::info!("No per-cell diagnostics");
    } else {
        log::info!(
            "{} per-cell diagnostics: {}",
            format_number_with_commas(summary.total()),
            summary.describe()
        );
    }
}
