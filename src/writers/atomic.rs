use crate::utils::Result;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

/// A fully written sibling temporary file waiting to be renamed over its
/// destination. Dropping it without `commit` removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    tmp_path: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp_path, &self.path).map_err(|e| {
            format!(
                "Failed to move {} to {}: {}",
                self.tmp_path.display(),
                self.path.display(),
                e
            )
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

/// Writes `path`'s content to a sibling temporary file. Nothing appears at
/// `path` until the returned file is committed.
pub fn stage_file<F>(path: &Path, f: F) -> Result<StagedFile>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp_path = temporary_path(path)?;
    let file = File::create(&tmp_path)
        .map_err(|e| format!("Failed to create {}: {}", tmp_path.display(), e))?;
    let staged = StagedFile {
        tmp_path,
        path: path.to_path_buf(),
        committed: false,
    };

    let mut writer = BufWriter::new(file);
    f(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| format!("Failed to flush {}: {}", staged.tmp_path.display(), e))?
        .sync_all()
        .map_err(|e| format!("Failed to sync {}: {}", staged.tmp_path.display(), e))?;
    Ok(staged)
}

fn temporary_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("Output path has no file name: {}", path.display()))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    Ok(path.with_file_name(tmp_name))
}
