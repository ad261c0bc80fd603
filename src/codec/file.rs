//! Mapping file persistence
//!
//! Saving and loading are single blocking operations. A load only touches
//! the store once the whole document has been decoded.

use super::xml::{deserialize_with, serialize_with, LoadPolicy, SerializeOptions};
use crate::error::{EditorError, ParseError};
use crate::mapping::{Layer, MappingStore};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a successful load
#[derive(Debug)]
pub struct LoadReport {
    pub path: PathBuf,
    /// Number of assignments now in the store
    pub loaded: usize,
    /// Layers that received at least one assignment
    pub layers: Vec<Layer>,
    /// Entries dropped under [`LoadPolicy::SkipInvalid`]
    pub skipped: Vec<ParseError>,
}

/// Write `text` next to `path` and move it into place, so a failed write
/// never leaves a truncated mapping file behind
fn write_replacing(path: &Path, text: &str) -> Result<(), EditorError> {
    let file_name = path.file_name().ok_or_else(|| {
        EditorError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path does not name a file"),
        )
    })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, text).map_err(|e| EditorError::io(&tmp_path, e))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            warn!(
                "Failed to remove temporary file {}: {}",
                tmp_path.display(),
                cleanup
            );
        }
        return Err(EditorError::io(path, e));
    }
    Ok(())
}

impl MappingStore {
    /// Save all assignments to an XML file. Returns the number written.
    pub fn save_to_file(
        &self,
        path: impl AsRef<Path>,
        options: &SerializeOptions,
    ) -> Result<usize, EditorError> {
        let path = path.as_ref();
        let count = self.len();
        let text = serialize_with(self, options)?;
        debug!("{}", text);

        write_replacing(path, &text)?;

        info!("Saved {} mappings to \"{}\"", count, path.display());
        Ok(count)
    }

    /// Load assignments from an XML file, replacing the whole store.
    ///
    /// On any error the store keeps its previous contents.
    pub fn load_from_file(
        &self,
        path: impl AsRef<Path>,
        policy: LoadPolicy,
    ) -> Result<LoadReport, EditorError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EditorError::io(path, e))?;
        info!("Found mapping file {}; parsing...", path.display());

        let doc = deserialize_with(&text, policy)?;
        self.replace_all(doc.entries);

        let report = LoadReport {
            path: path.to_path_buf(),
            loaded: self.len(),
            layers: self.populated_layers(),
            skipped: doc.skipped,
        };

        if report.skipped.is_empty() {
            info!(
                "... loaded {} mappings on {} layers OK",
                report.loaded,
                report.layers.len()
            );
        } else {
            warn!(
                "... loaded {} mappings, skipped {} invalid entries",
                report.loaded,
                report.skipped.len()
            );
        }
        Ok(report)
    }
}
