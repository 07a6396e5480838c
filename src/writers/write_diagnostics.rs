use super::{stage_file, StagedFile};
use crate::resolve::Diagnostic;
use crate::utils::Result;
use csv::WriterBuilder;
use std::path::Path;

pub fn write_diagnostics(path: &Path, diagnostics: &[Diagnostic]) -> Result<()> {
    stage_diagnostics(path, diagnostics)?.commit()
}

/// Writes the diagnostics TSV to a temporary file to be committed later.
pub fn stage_diagnostics(path: &Path, diagnostics: &[Diagnostic]) -> Result<StagedFile> {
    stage_file(path, |writer| {
        let mut tsv_writer = WriterBuilder::new().delimiter(b'\t').from_writer(writer);
        tsv_writer
            .write_record(["sample_id", "variant_id", "reason"])
            .map_err(|e| e.to_string())?;
        for diagnostic in diagnostics {
            tsv_writer
                .write_record([
                    diagnostic.sample_id.as_str(),
                    diagnostic.variant_id.as_str(),
                    diagnostic.reason.as_str(),
                ])
                .map_err(|e| e.to_string())?;
        }
        tsv_writer.flush().map_err(|e| e.to_string())
    })
    .map_err(|e| format!("Writing {}: {}", path.display(), e))
}
