//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei PNG e le letture di dimensione.
//!
//! ## Responsabilità:
//! - Discovery NON ricorsiva dei file PNG in una directory
//! - Determinazione formato file tramite estensione (case-insensitive)
//! - Lettura dimensione file prima e dopo la riscrittura in-place
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_png_files(Path::new("/path/to/cards"));
//! for file in files {
//!     let size = FileManager::file_size(&file)?;
//! }
//! ```

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension handled by the batch optimizer
pub const TARGET_EXTENSION: &str = "png";

/// Manages file discovery and size queries
pub struct FileManager;

impl FileManager {
    /// Size of a file in bytes
    pub fn file_size(path: &Path) -> std::io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    /// Find all PNG files directly under `dir` (one level, no recursion).
    ///
    /// A missing or unreadable directory yields an empty list; the caller
    /// reports that as "no files found".
    pub fn find_png_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| Self::is_png(path))
            .collect();

        files.sort();
        files
    }

    /// Check if a file is a PNG
    pub fn is_png(path: &Path) -> bool {
        path.extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case(TARGET_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_png() {
        assert!(FileManager::is_png(Path::new("card.png")));
        assert!(FileManager::is_png(Path::new("CARD.PNG")));
        assert!(!FileManager::is_png(Path::new("card.jpg")));
        assert!(!FileManager::is_png(Path::new("png")));
    }

    #[test]
    fn test_find_png_files_is_not_recursive() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.png"), b"a").unwrap();
        std::fs::write(temp_dir.path().join("b.PNG"), b"b").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"c").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        std::fs::write(temp_dir.path().join("nested").join("c.png"), b"d").unwrap();
        std::fs::create_dir(temp_dir.path().join("dir.png")).unwrap();

        let files = FileManager::find_png_files(temp_dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.png", "b.PNG"]);
    }

    #[test]
    fn test_find_png_files_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let files = FileManager::find_png_files(&temp_dir.path().join("missing"));
        assert!(files.is_empty());
    }

    #[test]
    fn test_file_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x.png");
        std::fs::write(&path, vec![0u8; 1234]).unwrap();
        assert_eq!(FileManager::file_size(&path).unwrap(), 1234);
        assert!(FileManager::file_size(&temp_dir.path().join("nope.png")).is_err());
    }
}
