//! File discovery for finding images in the input directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::VeilError;

/// Discovers image files under a directory.
pub struct FileDiscovery {
    supported_formats: Vec<String>,
}

impl FileDiscovery {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            supported_formats: config.supported_formats.clone(),
        }
    }

    /// Enumerate supported image files under `dir`, optionally recursing
    /// into subdirectories, sorted lexicographically by path for a
    /// reproducible processing order.
    ///
    /// A missing, non-directory, or unreadable input path is fatal and
    /// surfaces before any file is processed. Entries deeper in the tree
    /// that drop out mid-walk (races, dangling symlinks, stripped
    /// permissions) are skipped with a warning instead.
    pub fn scan(&self, dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, VeilError> {
        // Probe the root up front; WalkDir reports its errors per entry and
        // an unreadable root must not degrade into an empty "success".
        std::fs::read_dir(dir).map_err(|e| {
            VeilError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot read input directory {}: {e}", dir.display()),
            ))
        })?;

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).max_depth(max_depth).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && self.is_supported(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Check if a file has a supported extension (case-insensitive).
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery() -> FileDiscovery {
        FileDiscovery::new(&ProcessingConfig::default())
    }

    #[test]
    fn test_is_supported() {
        let d = discovery();
        assert!(d.is_supported(Path::new("test.jpg")));
        assert!(d.is_supported(Path::new("test.JPG")));
        assert!(d.is_supported(Path::new("test.jpeg")));
        assert!(d.is_supported(Path::new("test.png")));
        assert!(d.is_supported(Path::new("test.bmp")));
        assert!(d.is_supported(Path::new("test.webp")));
        assert!(!d.is_supported(Path::new("test.txt")));
        assert!(!d.is_supported(Path::new("test")));
    }

    #[test]
    fn test_scan_missing_dir_is_fatal() {
        let err = discovery()
            .scan(Path::new("/nonexistent/photos"), false)
            .unwrap_err();
        assert!(matches!(err, VeilError::Io(_)));
    }

    #[test]
    fn test_scan_unreadable_root_is_fatal_not_empty() {
        // The readability probe must turn a root that cannot be listed into
        // an error, never into Ok(vec![]). A regular file trips the same
        // read_dir probe as a permission-denied directory.
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        std::fs::write(&file, b"x").unwrap();

        let err = discovery().scan(&file, false).unwrap_err();
        match err {
            VeilError::Io(e) => assert!(e.to_string().contains("cannot read input directory")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.png", "c.txt", "d.JPEG"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let files = discovery().scan(dir.path(), false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.png", "b.jpg", "d.JPEG"]);
    }

    #[test]
    fn test_scan_recursion_flag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top.jpg"), b"x").unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("nested.jpg"), b"x").unwrap();

        let flat = discovery().scan(dir.path(), false).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = discovery().scan(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 2);
    }
}
