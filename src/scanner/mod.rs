//! Resume file discovery.
//!
//! Expands the paths given on the command line into the list of resume
//! documents to upload. Directories are walked recursively and filtered
//! by extension and size.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for resume discovery.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Extensions accepted by the matching API (without the dot).
    pub extensions: Vec<String>,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Maximum number of files to collect.
    pub max_files: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf", "docx", "doc", "txt"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_files: None,
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            max_file_size: config.max_file_size,
            max_files: Some(config.max_files),
        }
    }
}

/// A resume selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub path: PathBuf,
    /// File name sent in the multipart form.
    pub filename: String,
    pub size: u64,
}

/// Collects resumes from files and directories.
pub struct ResumeScanner {
    config: ScanConfig,
}

impl ResumeScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Collect resumes from the given inputs, in input order.
    ///
    /// Explicit file paths must exist; unsupported files inside directories
    /// are skipped quietly.
    pub fn collect(&self, inputs: &[PathBuf]) -> Result<Vec<ResumeFile>> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                self.walk_dir(input, &mut files);
            } else if input.is_file() {
                if !self.has_supported_extension(input) {
                    bail!("Unsupported resume format: {}", input.display());
                }
                if let Some(file) = self.resume_file(input) {
                    files.push(file);
                }
            } else {
                bail!("Resume path does not exist: {}", input.display());
            }

            if self.limit_reached(&files) {
                break;
            }
        }

        if let Some(max) = self.config.max_files {
            files.truncate(max);
        }

        debug!("Collected {} resume files", files.len());
        Ok(files)
    }

    fn walk_dir(&self, dir: &Path, files: &mut Vec<ResumeFile>) {
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !is_hidden(e.file_name().to_str().unwrap_or(""))
            });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Cannot read entry under {}: {}", dir.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.has_supported_extension(entry.path()) {
                continue;
            }

            if let Some(file) = self.resume_file(entry.path()) {
                files.push(file);
            }

            if self.limit_reached(files) {
                break;
            }
        }
    }

    fn resume_file(&self, path: &Path) -> Option<ResumeFile> {
        let size = match std::fs::metadata(path) {
            Ok(m) => m.len(),
            Err(e) => {
                warn!("Cannot stat {}: {}", path.display(), e);
                return None;
            }
        };

        if size > self.config.max_file_size {
            warn!(
                "Skipping {} ({} bytes exceeds limit of {})",
                path.display(),
                size,
                self.config.max_file_size
            );
            return None;
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Some(ResumeFile {
            path: path.to_path_buf(),
            filename,
            size,
        })
    }

    fn has_supported_extension(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        self.config.extensions.iter().any(|allowed| *allowed == ext)
    }

    fn limit_reached(&self, files: &[ResumeFile]) -> bool {
        self.config.max_files.is_some_and(|max| files.len() >= max)
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, vec![b'x'; bytes]).unwrap();
        path
    }

    #[test]
    fn test_collect_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.pdf", 10);
        touch(dir.path(), "a.DOCX", 10);
        touch(dir.path(), "notes.md", 10);
        touch(dir.path(), "nested/c.txt", 10);
        touch(dir.path(), ".cache/d.pdf", 10);

        let scanner = ResumeScanner::new(ScanConfig::default());
        let files = scanner.collect(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();

        assert_eq!(names, vec!["a.DOCX", "b.pdf", "c.txt"]);
    }

    #[test]
    fn test_collect_explicit_files_in_order() {
        let dir = TempDir::new().unwrap();
        let second = touch(dir.path(), "z.pdf", 5);
        let first = touch(dir.path(), "y.pdf", 5);

        let scanner = ResumeScanner::new(ScanConfig::default());
        let files = scanner.collect(&[second, first]).unwrap();

        assert_eq!(files[0].filename, "z.pdf");
        assert_eq!(files[1].filename, "y.pdf");
        assert_eq!(files[0].size, 5);
    }

    #[test]
    fn test_rejects_missing_and_unsupported() {
        let dir = TempDir::new().unwrap();
        let scanner = ResumeScanner::new(ScanConfig::default());

        let missing = scanner.collect(&[dir.path().join("ghost.pdf")]);
        assert!(missing.is_err());

        let image = touch(dir.path(), "photo.png", 5);
        let unsupported = scanner.collect(&[image]);
        assert!(unsupported.is_err());
    }

    #[test]
    fn test_size_and_count_limits() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "big.pdf", 200);
        touch(dir.path(), "c1.pdf", 10);
        touch(dir.path(), "c2.pdf", 10);
        touch(dir.path(), "c3.pdf", 10);

        let scanner = ResumeScanner::new(ScanConfig {
            max_file_size: 100,
            max_files: Some(2),
            ..ScanConfig::default()
        });
        let files = scanner.collect(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();

        assert_eq!(names, vec!["c1.pdf", "c2.pdf"]);
    }

    #[test]
    fn test_scan_config_from_settings() {
        let settings = crate::config::ScannerConfig::default();
        let config = ScanConfig::from(&settings);
        assert_eq!(config.extensions, settings.extensions);
        assert_eq!(config.max_files, Some(200));
    }
}
