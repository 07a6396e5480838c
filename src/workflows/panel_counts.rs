use crate::matrix::{stream_records_into_channel, RecordSource};
use crate::panel::Panel;
use crate::resolve::{
    resolve_row, Diagnostic, MatchRule, ResolvedCount, RowResolution, TargetMatch,
};
use crate::utils::Result;
use crate::writers::CountTable;
use crossbeam_channel::bounded;
use rayon::{
    iter::{ParallelBridge, ParallelIterator},
    ThreadPoolBuilder,
};
use std::thread;

const CHANNEL_BUFFER_SIZE: usize = 256;

pub struct Params {
    pub num_threads: usize,
    pub max_retries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStatus {
    /// No matrix row carries the variant identifier.
    Absent,
    Unmatched,
    Matched(TargetMatch),
}

#[derive(Debug, Clone)]
pub struct SiteReport {
    pub column: String,
    pub status: SiteStatus,
    pub na_count: usize,
}

pub struct PanelRun {
    pub table: CountTable,
    /// Ordered by panel column, then sample.
    pub diagnostics: Vec<Diagnostic>,
    pub sites: Vec<SiteReport>,
}

/// Resolves every (sample, panel site) pair of the matrix.
///
/// Rows are streamed from `source` on a separate thread and resolved in
/// parallel. Rows whose identifier is not in the panel are ignored. When
/// several rows share an identifier, the one whose target match used the
/// strongest rule wins, the earliest row breaking ties. A fatal source error
/// aborts the run.
pub fn run_panel<S>(source: S, panel: &Panel, params: &Params) -> Result<PanelRun>
where
    S: RecordSource + Send + 'static,
{
    let samples = source.samples().to_vec();

    let (sender_record, receiver_record) = bounded(CHANNEL_BUFFER_SIZE);
    let max_retries = params.max_retries;
    let record_stream_thread = thread::spawn(move || {
        stream_records_into_channel(source, max_retries, sender_record)
    });

    log::debug!(
        "Initializing thread pool with {} threads...",
        params.num_threads
    );
    let pool = initialize_thread_pool(params.num_threads)?;
    let results: Vec<Result<Option<RowResolution>>> = pool.install(|| {
        receiver_record
            .into_iter()
            .enumerate()
            .par_bridge()
            .map(|(row_index, record)| -> Result<Option<RowResolution>> {
                let record = record?;
                Ok(panel.position(&record.id).map(|panel_index| {
                    resolve_row(
                        row_index,
                        panel_index,
                        &panel.entries()[panel_index],
                        &record,
                        &samples,
                    )
                }))
            })
            .collect()
    });

    record_stream_thread
        .join()
        .map_err(|_| "Matrix stream thread panicked".to_string())?;
    log::trace!("Matrix stream thread finished");

    let mut resolutions = Vec::new();
    for result in results {
        if let Some(resolution) = result? {
            resolutions.push(resolution);
        }
    }
    resolutions.sort_unstable_by_key(|r| r.row_index);

    let chosen = select_rows(panel, resolutions);
    assemble(panel, samples, chosen)
}

fn select_rows(panel: &Panel, resolutions: Vec<RowResolution>) -> Vec<Option<RowResolution>> {
    fn rank(resolution: &RowResolution) -> (bool, Option<MatchRule>) {
        (
            resolution.target.is_none(),
            resolution.target.map(|m| m.rule),
        )
    }

    let mut chosen: Vec<Option<RowResolution>> = vec![None; panel.len()];
    for resolution in resolutions {
        let panel_index = resolution.panel_index;
        let replace = match &chosen[panel_index] {
            Some(current) => {
                let variant_id = &panel.entries()[panel_index].variant_id;
                let better = rank(&resolution) < rank(current);
                log::debug!(
                    "{}: record #{} {} record #{}",
                    variant_id,
                    resolution.row_index + 1,
                    if better { "supersedes" } else { "is a duplicate of" },
                    current.row_index + 1
                );
                better
            }
            None => true,
        };
        if replace {
            chosen[panel_index] = Some(resolution);
        }
    }
    chosen
}

fn assemble(
    panel: &Panel,
    samples: Vec<String>,
    chosen: Vec<Option<RowResolution>>,
) -> Result<PanelRun> {
    let columns = panel.entries().iter().map(|e| e.column_name()).collect();
    let num_samples = samples.len();
    let mut table = CountTable::new(samples, columns);
    let mut diagnostics = Vec::new();
    let mut sites = Vec::with_capacity(panel.len());

    for (column, (entry, resolution)) in panel.entries().iter().zip(chosen).enumerate() {
        let report = match resolution {
            Some(resolution) => {
                let na_count = resolution.na_count();
                let status = match resolution.target {
                    Some(m) => SiteStatus::Matched(m),
                    None => SiteStatus::Unmatched,
                };
                table.set_column(column, resolution.counts)?;
                diagnostics.extend(resolution.diagnostics);
                SiteReport {
                    column: entry.column_name(),
                    status,
                    na_count,
                }
            }
            None => {
                table.set_column(column, vec![ResolvedCount::Na; num_samples])?;
                SiteReport {
                    column: entry.column_name(),
                    status: SiteStatus::Absent,
                    na_count: num_samples,
                }
            }
        };
        sites.push(report);
    }

    Ok(PanelRun {
        table,
        diagnostics,
        sites,
    })
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("panelcount-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}
