use super::{stage_file, StagedFile};
use crate::resolve::ResolvedCount;
use crate::utils::Result;
use csv::WriterBuilder;
use std::{io::Write, path::Path};

const SAMPLE_COLUMN: &str = "sampleid";

/// Sample-by-site table of resolved counts. Every column is filled exactly
/// once before the table can be written.
#[derive(Debug)]
pub struct CountTable {
    samples: Vec<String>,
    columns: Vec<String>,
    cells: Vec<Option<Vec<ResolvedCount>>>,
}

impl CountTable {
    pub fn new(samples: Vec<String>, columns: Vec<String>) -> Self {
        let cells = vec![None; columns.len()];
        CountTable {
            samples,
            columns,
            cells,
        }
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn set_column(&mut self, column: usize, counts: Vec<ResolvedCount>) -> Result<()> {
        let name = self
            .columns
            .get(column)
            .ok_or_else(|| format!("Column index {} out of range", column))?;
        if counts.len() != self.samples.len() {
            return Err(format!(
                "Column {} has {} values for {} samples",
                name,
                counts.len(),
                self.samples.len()
            ));
        }
        match &mut self.cells[column] {
            Some(_) => Err(format!("Column {} was already filled", name)),
            slot => {
                *slot = Some(counts);
                Ok(())
            }
        }
    }

    pub fn column(&self, column: usize) -> Option<&[ResolvedCount]> {
        self.cells.get(column)?.as_deref()
    }

    pub fn get(&self, sample: usize, column: usize) -> Option<ResolvedCount> {
        self.column(column)?.get(sample).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        if let Some(column) = self.cells.iter().position(Option::is_none) {
            return Err(format!(
                "Column {} has no values",
                self.columns[column]
            ));
        }

        let mut csv_writer = WriterBuilder::new().from_writer(writer);
        let header = std::iter::once(SAMPLE_COLUMN).chain(self.columns.iter().map(String::as_str));
        csv_writer
            .write_record(header)
            .map_err(|e| format!("Failed to write table header: {}", e))?;

        let mut row = Vec::with_capacity(self.columns.len() + 1);
        for (sample_index, sample) in self.samples.iter().enumerate() {
            row.clear();
            row.push(sample.clone());
            for column in self.cells.iter().flatten() {
                row.push(column[sample_index].to_string());
            }
            csv_writer
                .write_record(&row)
                .map_err(|e| format!("Failed to write row for {}: {}", sample, e))?;
        }
        csv_writer
            .flush()
            .map_err(|e| format!("Failed to flush table: {}", e))
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        self.stage_csv(path)?.commit()
    }

    /// Writes the CSV to a temporary file to be committed later.
    pub fn stage_csv(&self, path: &Path) -> Result<StagedFile> {
        stage_file(path, |writer| self.write_to(writer))
            .map_err(|e| format!("Writing {}: {}", path.display(), e))
    }
}
