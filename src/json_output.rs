//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per uso programmatico.
//!
//! ## Responsabilità:
//! - Emette un oggetto JSON per riga su stdout quando `logging.json_output` è attivo
//! - `JsonSink`: destinazione condivisa delle righe (stdout, o un buffer nei test).
//!   I log di `tracing` vanno su stderr, quindi stdout contiene solo JSON
//! - Riutilizza `JobOutcome` e `RunAggregate` senza duplicare i contatori
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch (directory, numero file, worker)
//! - `file_complete`: Fine elaborazione di un file
//! - `progress`: Contatori correnti dopo ogni file
//! - `complete`: Statistiche finali del run
//! - `error`: Errore che impedisce il batch (codec non disponibile)

use crate::progress::{Classification, JobOutcome, RunAggregate, RunStatus};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum JsonMessage {
    #[serde(rename = "start")]
    Start {
        input_dir: PathBuf,
        total_files: usize,
        workers: usize,
    },

    #[serde(rename = "file_complete")]
    FileComplete {
        path: PathBuf,
        original_size: u64,
        bytes_saved: i64,
        outcome: String,
        error: Option<String>,
    },

    #[serde(rename = "progress")]
    Progress {
        current: usize,
        total: usize,
        percentage: f64,
        successful: usize,
        unchanged: usize,
        increased: usize,
        failed: usize,
        bytes_saved: i64,
    },

    #[serde(rename = "complete")]
    Complete {
        status: String,
        files_processed: usize,
        successful: usize,
        unchanged: usize,
        increased: usize,
        failed: usize,
        total_bytes_saved: i64,
        total_original_size: u64,
        savings_percent: f64,
        duration_seconds: f64,
        files_per_second: f64,
    },

    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

fn status_name(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Running => "running",
        RunStatus::Completed => "completed",
        RunStatus::NoFiles => "no_files",
        RunStatus::CodecUnavailable => "codec_unavailable",
        RunStatus::Interrupted => "interrupted",
    }
}

impl JsonMessage {
    /// Scrive il messaggio come una singola riga JSON
    pub fn write_line<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        writeln!(out)?;
        out.flush()
    }

    pub fn start(input_dir: &Path, total_files: usize, workers: usize) -> Self {
        Self::Start {
            input_dir: input_dir.to_path_buf(),
            total_files,
            workers,
        }
    }

    /// Completamento di un file processato dall'adapter
    pub fn file_complete(outcome: &JobOutcome) -> Self {
        Self::FileComplete {
            path: outcome.path.clone(),
            original_size: outcome.original_size,
            bytes_saved: outcome.bytes_saved,
            outcome: outcome.classify().as_str().to_string(),
            error: None,
        }
    }

    /// Job fallito fuori dall'adapter
    pub fn file_failed(path: &Path, original_size: u64, error: String) -> Self {
        Self::FileComplete {
            path: path.to_path_buf(),
            original_size,
            bytes_saved: 0,
            outcome: Classification::Failed.as_str().to_string(),
            error: Some(error),
        }
    }

    pub fn progress(stats: &RunAggregate) -> Self {
        let current = stats.completed();
        let percentage = if stats.total_files > 0 {
            (current as f64 / stats.total_files as f64) * 100.0
        } else {
            0.0
        };

        Self::Progress {
            current,
            total: stats.total_files,
            percentage,
            successful: stats.successful,
            unchanged: stats.unchanged,
            increased: stats.increased,
            failed: stats.failed,
            bytes_saved: stats.total_saved,
        }
    }

    pub fn complete(stats: &RunAggregate) -> Self {
        Self::Complete {
            status: status_name(stats.status).to_string(),
            files_processed: stats.total_files,
            successful: stats.successful,
            unchanged: stats.unchanged,
            increased: stats.increased,
            failed: stats.failed,
            total_bytes_saved: stats.total_saved,
            total_original_size: stats.total_original_size,
            savings_percent: stats.savings_percent(),
            duration_seconds: stats.elapsed().as_secs_f64(),
            files_per_second: stats.files_per_second(),
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

/// Destinazione delle righe JSON, condivisa tra tracker e dispatcher
#[derive(Clone)]
pub struct JsonSink {
    out: Arc<Mutex<dyn Write + Send>>,
}

impl JsonSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Emette un messaggio; un errore di scrittura viene solo loggato
    pub fn send(&self, message: &JsonMessage) {
        let result = match self.out.lock() {
            Ok(mut out) => message.write_line(&mut *out),
            Err(_) => return,
        };
        if let Err(e) = result {
            warn!("Could not write JSON event: {}", e);
        }
    }
}

impl Default for JsonSink {
    fn default() -> Self {
        Self::stdout()
    }
}
