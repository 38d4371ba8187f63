//! Discovery and loading of the configuration files to lint

use std::fs;
use std::path::{Path, PathBuf};

use azsec_core::Document;

use super::error::LinterError;

pub const TERRAFORM_EXTENSION: &str = "tf";

/// `.tf` files directly inside `directory`, sorted by file name
pub fn discover_files(directory: &Path) -> Result<Vec<PathBuf>, LinterError> {
    if !directory.is_dir() {
        return Err(LinterError::MissingDirectory(directory.to_path_buf()));
    }
    let entries = fs::read_dir(directory)
        .map_err(|source| LinterError::Read { path: directory.to_path_buf(), source })?;

    let mut files = vec![];
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == TERRAFORM_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse `files` into one document. Files are named by their path relative
/// to `directory` so that reported locations stay short.
pub fn load_document(directory: &Path, files: &[PathBuf]) -> Result<Document, LinterError> {
    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let source =
            fs::read_to_string(path).map_err(|source| LinterError::Read { path: path.clone(), source })?;
        let name = path.strip_prefix(directory).unwrap_or(path).display().to_string();
        sources.push((name, source));
    }
    Ok(Document::parse(sources)?)
}
