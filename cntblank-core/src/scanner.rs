use cntblank_common::{CntblankError, CollectConfig, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::Xxh3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub size: u64,
    pub filename: String,
    pub extension: String, // lowercase, with leading dot; empty when absent
}

impl SourceFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size: meta.len(),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: extension_of(path),
        })
    }

    /// XXH3-64 of the file contents as 16 hex digits, read in chunks
    pub fn checksum(&self) -> Result<String> {
        let mut file = File::open(&self.path)?;
        let mut hasher = Xxh3::new();
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(format!("{:016x}", hasher.digest()))
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| {
            let e = e.trim().to_ascii_lowercase();
            if e.starts_with('.') {
                e
            } else {
                format!(".{e}")
            }
        })
        .collect()
}

struct Filter {
    extensions: Vec<String>,
}

impl Filter {
    fn accepts(&self, path: &Path) -> bool {
        !is_hidden(path) && self.extensions.contains(&extension_of(path))
    }
}

/// tabular files under `base`, sorted by path; hidden entries are skipped
pub fn scan_directory(base: &Path, config: &CollectConfig) -> Result<Vec<SourceFile>> {
    let filter = Filter {
        extensions: normalize_extensions(&config.extensions),
    };
    let mut results = Vec::new();
    scan_recursive(base, config.recursive, &filter, &mut results)?;
    Ok(results)
}

fn scan_recursive(dir: &Path, recursive: bool, filter: &Filter, out: &mut Vec<SourceFile>) -> Result<()> {
    let mut paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();
    for path in paths {
        if path.is_dir() {
            if recursive && !is_hidden(&path) {
                scan_recursive(&path, recursive, filter, out)?;
            }
        } else if filter.accepts(&path) {
            out.push(SourceFile::from_path(&path)?);
        }
    }
    Ok(())
}

/// resolve one argument: a file (taken as given), a directory, or a glob pattern
pub fn resolve_paths(input: &str, config: &CollectConfig) -> Result<Vec<SourceFile>> {
    let path = Path::new(input);
    if path.is_file() {
        return Ok(vec![SourceFile::from_path(path)?]);
    }
    if path.is_dir() {
        return scan_directory(path, config);
    }
    let filter = Filter {
        extensions: normalize_extensions(&config.extensions),
    };
    let entries = glob::glob(input).map_err(|e| CntblankError::Other(format!("bad pattern {input}: {e}")))?;
    let mut results = Vec::new();
    for entry in entries.flatten() {
        if entry.is_file() && filter.accepts(&entry) {
            results.push(SourceFile::from_path(&entry)?);
        }
    }
    if results.is_empty() {
        return Err(CntblankError::Open {
            path: input.to_string(),
            reason: "no such file or directory".into(),
        });
    }
    Ok(results)
}

/// Resolve every argument in order. Unresolvable ones are logged and skipped.
pub fn collect_files(inputs: &[String], config: &CollectConfig) -> Vec<SourceFile> {
    let mut files = Vec::new();
    for input in inputs {
        match resolve_paths(input, config) {
            Ok(found) => {
                tracing::debug!(input = %input, count = found.len(), "collected files");
                files.extend(found);
            }
            Err(e) => tracing::error!(input = %input, error = %e, "cannot collect input"),
        }
    }
    files
}
