//! # Task Optimizer Module
//!
//! Worker per l'ottimizzazione di singoli file.
//! Traduce la configurazione in parametri del codec, esegue UNA chiamata
//! in-place per file e classifica il risultato.

use crate::{
    codec::{Codec, CodecParams},
    config::Settings,
    error::OptimizeError,
    file_manager::FileManager,
    progress::JobOutcome,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Worker per elaborazione singoli file, condiviso tra i job
#[derive(Clone)]
pub struct TaskOptimizer {
    codec: Arc<dyn Codec>,
    params: Arc<CodecParams>,
    verbose: bool,
}

impl TaskOptimizer {
    pub fn new(codec: Arc<dyn Codec>, params: CodecParams, verbose: bool) -> Self {
        Self {
            codec,
            params: Arc::new(params),
            verbose,
        }
    }

    /// Risolve i parametri del codec una sola volta dalla configurazione
    pub fn from_settings(codec: Arc<dyn Codec>, settings: &Settings) -> Self {
        Self::new(
            codec,
            CodecParams::from_settings(settings),
            settings.logging.verbose_logging,
        )
    }

    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    /// Ottimizza un singolo file in-place.
    ///
    /// Codec failures and an unreadable size after the rewrite become a
    /// failed `JobOutcome`. Only a file whose original size cannot be read,
    /// or a codec error that is not tied to this file, is returned as `Err`.
    pub fn optimize_file(&self, path: &Path) -> Result<JobOutcome, OptimizeError> {
        let original_size = FileManager::file_size(path)?;
        let name = display_name(path);

        match self.codec.optimize_in_place(path, &self.params) {
            Ok(()) => {}
            Err(e) if e.is_per_file() => {
                warn!("❌ Failed for {}: {}", name, e);
                return Ok(JobOutcome::failed(path.to_path_buf(), original_size));
            }
            Err(e) => return Err(e),
        }

        let new_size = match FileManager::file_size(path) {
            Ok(size) => size,
            Err(e) => {
                warn!("❌ Could not read optimized size of {}: {}", name, e);
                return Ok(JobOutcome::failed(path.to_path_buf(), original_size));
            }
        };

        let bytes_saved = original_size as i64 - new_size as i64;
        if self.verbose {
            log_result(&name, original_size, bytes_saved);
        }

        Ok(JobOutcome {
            path: path.to_path_buf(),
            original_size,
            success: bytes_saved >= 0,
            bytes_saved,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}

fn log_result(name: &str, original_size: u64, bytes_saved: i64) {
    let percent = if original_size > 0 {
        (bytes_saved as f64 / original_size as f64) * 100.0
    } else {
        0.0
    };

    match bytes_saved.cmp(&0) {
        std::cmp::Ordering::Greater => {
            info!("✅ {} - reduced by {:.1}% ({} bytes)", name, percent, bytes_saved)
        }
        std::cmp::Ordering::Equal => info!("➖ {} - no size change", name),
        std::cmp::Ordering::Less => {
            warn!("📈 {} - increased by {:.1}% ({} bytes)", name, -percent, -bytes_saved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StripPolicy;
    use crate::progress::Classification;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Rewrites the file to `new_len` bytes, or fails with the given error
    struct ScriptedCodec {
        new_len: Option<usize>,
        error: Option<fn() -> OptimizeError>,
        seen: Mutex<Vec<CodecParams>>,
    }

    impl ScriptedCodec {
        fn resize(new_len: usize) -> Self {
            Self { new_len: Some(new_len), error: None, seen: Mutex::new(Vec::new()) }
        }

        fn failing(error: fn() -> OptimizeError) -> Self {
            Self { new_len: None, error: Some(error), seen: Mutex::new(Vec::new()) }
        }
    }

    impl Codec for ScriptedCodec {
        fn name(&self) -> &str {
            "scripted"
        }

        fn optimize_in_place(&self, path: &Path, params: &CodecParams) -> Result<(), OptimizeError> {
            self.seen.lock().unwrap().push(params.clone());
            if let Some(error) = self.error {
                return Err(error());
            }
            if let Some(len) = self.new_len {
                std::fs::write(path, vec![7u8; len])?;
            }
            Ok(())
        }
    }

    fn png(dir: &TempDir, name: &str, len: usize) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![1u8; len]).unwrap();
        path
    }

    fn optimizer(codec: ScriptedCodec) -> (Arc<ScriptedCodec>, TaskOptimizer) {
        let codec = Arc::new(codec);
        let task = TaskOptimizer::from_settings(codec.clone(), &Settings::default());
        (codec, task)
    }

    #[test]
    fn test_reduced_file_is_successful() {
        let dir = TempDir::new().unwrap();
        let path = png(&dir, "a.png", 1000);
        let (codec, task) = optimizer(ScriptedCodec::resize(900));

        let outcome = task.optimize_file(&path).unwrap();
        assert_eq!(outcome.original_size, 1000);
        assert_eq!(outcome.bytes_saved, 100);
        assert!(outcome.success);
        assert_eq!(outcome.classify(), Classification::Successful);

        let seen = codec.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].fix_errors);
        assert!(!seen[0].force);
        assert_eq!(seen[0].strip, StripPolicy::Safe);
    }

    #[test]
    fn test_untouched_file_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = png(&dir, "a.png", 1000);
        let (_, task) = optimizer(ScriptedCodec { new_len: None, error: None, seen: Mutex::new(Vec::new()) });

        let outcome = task.optimize_file(&path).unwrap();
        assert_eq!(outcome.bytes_saved, 0);
        assert_eq!(outcome.classify(), Classification::Unchanged);
    }

    #[test]
    fn test_grown_file_is_reported_as_failure() {
        let dir = TempDir::new().unwrap();
        let path = png(&dir, "a.png", 1000);
        let (_, task) = optimizer(ScriptedCodec::resize(1100));

        let outcome = task.optimize_file(&path).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.bytes_saved, -100);
        assert_eq!(outcome.classify(), Classification::Increased);
    }

    #[test]
    fn test_codec_error_is_normalized() {
        let dir = TempDir::new().unwrap();
        let path = png(&dir, "a.png", 1000);
        let (_, task) = optimizer(ScriptedCodec::failing(|| OptimizeError::Codec("bad crc".to_string())));

        let outcome = task.optimize_file(&path).unwrap();
        assert_eq!(outcome, JobOutcome::failed(path.clone(), 1000));

        let (_, task) = optimizer(ScriptedCodec::failing(|| {
            OptimizeError::InvalidParameter("level 42".to_string())
        }));
        assert!(!task.optimize_file(&path).unwrap().success);
    }

    #[test]
    fn test_non_file_errors_escape() {
        let dir = TempDir::new().unwrap();
        let path = png(&dir, "a.png", 1000);
        let (_, task) = optimizer(ScriptedCodec::failing(|| OptimizeError::Worker("pool gone".to_string())));

        assert!(matches!(task.optimize_file(&path), Err(OptimizeError::Worker(_))));
    }

    #[test]
    fn test_missing_file_escapes_as_io_error() {
        let dir = TempDir::new().unwrap();
        let (codec, task) = optimizer(ScriptedCodec::resize(10));

        let result = task.optimize_file(&dir.path().join("missing.png"));
        assert!(matches!(result, Err(OptimizeError::Io(_))));
        assert!(codec.seen.lock().unwrap().is_empty());
    }
}
