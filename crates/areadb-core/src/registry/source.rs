// crates/areadb-core/src/registry/source.rs
use super::BoundaryRegistry;
use crate::error::{AreaError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One source document: file name plus its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub file_name: String,
    pub content: String,
}

impl SourceDocument {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        SourceDocument {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// Documents sharing one description label (one source subdirectory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    pub description: String,
    pub documents: Vec<SourceDocument>,
}

/// Reads a source tree: each top-level subdirectory is a group named after
/// the directory, each regular file inside it a document.
///
/// Directories and files are visited in name order so the resulting
/// registry is the same on every platform. Loose files in `root` and
/// deeper subdirectories are ignored.
pub fn scan_dir(root: impl AsRef<Path>) -> Result<Vec<SourceGroup>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(AreaError::NotFound(format!(
            "source directory not found: {}",
            root.display()
        )));
    }

    let mut groups = Vec::new();
    for dir in sorted_entries(root)? {
        if !dir.is_dir() {
            debug!(path = %dir.display(), "skipping loose file in source root");
            continue;
        }
        let description = file_name_of(&dir)?;

        let mut documents = Vec::new();
        for file in sorted_entries(&dir)? {
            if !file.is_file() {
                warn!(path = %file.display(), "skipping nested directory");
                continue;
            }
            let name = file_name_of(&file)?;
            let content = fs::read_to_string(&file)
                .map_err(|e| AreaError::malformed(name.as_str(), format!("unreadable: {e}")))?;
            documents.push(SourceDocument::new(name, content));
        }
        groups.push(SourceGroup {
            description,
            documents,
        });
    }
    Ok(groups)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AreaError::InvalidData(format!("path has no file name: {}", path.display())))
}

impl BoundaryRegistry {
    /// Scans `root` with [`scan_dir`] and builds the registry from it.
    pub fn build_from_dir(root: impl AsRef<Path>) -> Result<Self> {
        Self::build(scan_dir(root)?)
    }
}
