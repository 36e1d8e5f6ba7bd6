use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use logscope_types::LogLine;

use crate::ExportError;

/// File name used when no file is loaded
pub const FALLBACK_EXPORT_NAME: &str = "logs.txt";

/// Name of the exported file for the given active file
///
/// The first `.log` becomes `_filtered.log`; names without `.log` get a
/// `_filtered` suffix.
pub fn export_file_name(active_file: Option<&str>) -> String {
    match active_file {
        Some(name) if name.contains(".log") => name.replacen(".log", "_filtered.log", 1),
        Some(name) if !name.is_empty() => format!("{}_filtered", name),
        _ => FALLBACK_EXPORT_NAME.to_string(),
    }
}

/// A serialized snapshot of the displayed view
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub contents: String,
    pub line_count: usize,
}

impl Export {
    /// Serialize projected lines, newline separated
    pub fn from_view(active_file: Option<&str>, view: &[&LogLine]) -> Result<Self, ExportError> {
        if view.is_empty() {
            return Err(ExportError::Empty);
        }
        let contents = view.iter().map(|l| l.raw()).collect::<Vec<_>>().join("\n");
        Ok(Self {
            file_name: export_file_name(active_file),
            contents,
            line_count: view.len(),
        })
    }

    /// Write the export into a directory, returning the written path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&path)?;
            file.write_all(self.contents.as_bytes())?;
            file.flush()
        };
        write().map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), lines = self.line_count, "exported view");
        Ok(path)
    }
}
