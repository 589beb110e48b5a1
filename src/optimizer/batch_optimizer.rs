//! # Batch Optimizer Main Orchestrator
//!
//! Questo è il modulo che orchestra tutto il processo di ottimizzazione.
//!
//! ## Flusso di esecuzione:
//! 1. **File discovery**: Trova i PNG nella directory (un solo livello)
//! 2. **Dependency check**: Verifica che il codec sia disponibile
//! 3. **Worker count**: "auto" = CPU logiche, altrimenti min(config, numero file)
//! 4. **Submit**: Un job per file, tutti sottomessi subito
//! 5. **Drain**: Risultati raccolti in ordine di completamento
//! 6. **Reporting**: Contatori live e report finale
//!
//! ## Gestione concorrenza:
//! - Un `Semaphore` con un permesso per worker limita i job attivi
//! - Il codec gira su `spawn_blocking` (CPU-bound)
//! - `RunAggregate` è modificato SOLO dal loop che drena il `JoinSet`:
//!   nessun lock sui contatori
//! - Un segnale di shutdown interrompe il drain e stampa comunque il report

use crate::{
    codec::Codec,
    config::{logical_cpus, Settings},
    error::OptimizeError,
    file_manager::FileManager,
    json_output::{JsonMessage, JsonSink},
    optimizer::{progress_tracker::ProgressTracker, task_optimizer::TaskOptimizer},
    progress::{JobOutcome, RunAggregate, RunStatus},
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// File, size measured at discovery, adapter result
type JobResult = (PathBuf, u64, Result<JobOutcome, OptimizeError>);

/// Orchestratore principale del batch
pub struct BatchOptimizer {
    settings: Arc<Settings>,
    codec: Arc<dyn Codec>,
    cpus: usize,
    json_sink: JsonSink,
}

impl BatchOptimizer {
    /// Crea nuova istanza dell'ottimizzatore
    pub fn new(settings: Settings, codec: Arc<dyn Codec>) -> Self {
        Self {
            settings: Arc::new(settings),
            codec,
            cpus: logical_cpus(),
            json_sink: JsonSink::stdout(),
        }
    }

    /// Send JSON events somewhere other than stdout
    pub fn with_json_sink(mut self, sink: JsonSink) -> Self {
        self.json_sink = sink;
        self
    }

    /// Override the logical CPU count used for `max_workers = "auto"`
    pub fn with_cpus(mut self, cpus: usize) -> Self {
        self.cpus = cpus.max(1);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Numero di worker per `file_count` file
    pub fn resolve_workers(&self, file_count: usize) -> usize {
        self.settings.compression.workers.resolve(file_count, self.cpus)
    }

    /// Righe del riepilogo di configurazione, con i worker risolti per `media_dir`
    pub fn configuration_lines(&self, config_path: &Path, media_dir: &Path) -> Vec<String> {
        let compression = &self.settings.compression;
        let emoji = self.settings.logging.emoji_style;
        let file_count = FileManager::find_png_files(media_dir).len();

        vec![
            format!("{}Current configuration:", if emoji { "⚙️  " } else { "" }),
            format!("   • Compression level: {}", compression.level),
            format!(
                "   • Workers: {} (configured {}, {} logical CPUs)",
                self.resolve_workers(file_count),
                compression.workers,
                self.cpus
            ),
            format!("   • Strip metadata: {}", compression.strip_metadata),
            format!("   • Deflate method: {}", self.settings.advanced.deflate_method),
            format!("   • Show progress: {}", self.settings.logging.show_progress),
            format!(
                "{}Edit {} to customize settings",
                if emoji { "💡 " } else { "" },
                config_path.display()
            ),
        ]
    }

    /// Logga la configurazione corrente
    pub fn log_configuration(&self, config_path: &Path, media_dir: &Path) {
        for line in self.configuration_lines(config_path, media_dir) {
            info!("{}", line);
        }
    }

    /// Esegue il batch fino al completamento
    pub async fn run(&self, media_dir: &Path) -> RunAggregate {
        self.run_until(media_dir, std::future::pending()).await
    }

    /// Esegue il batch; se `shutdown` completa prima, il run viene interrotto
    /// e il report contiene solo i job già completati.
    pub async fn run_until<F>(&self, media_dir: &Path, shutdown: F) -> RunAggregate
    where
        F: Future<Output = ()>,
    {
        let files = FileManager::find_png_files(media_dir);

        if files.is_empty() {
            return self.handle_empty_directory(media_dir);
        }

        if let Err(e) = self.codec.check_available() {
            return self.handle_codec_unavailable(e);
        }

        let workers = self.resolve_workers(files.len());
        info!("🔍 Found {} PNG files", files.len());
        info!("Starting optimization with {} workers ({})", workers, self.codec.name());

        let tracker = ProgressTracker::new(
            files.len(),
            &self.settings.logging,
            self.json_sink.clone(),
        );
        tracker.started(media_dir, workers);

        let mut stats = RunAggregate::start(files.len(), workers);
        let status = self
            .process_files_concurrently(files, workers, &tracker, &mut stats, shutdown)
            .await;
        stats.finish(status);

        tracker.finish(&stats);
        self.print_final_stats(&stats);
        stats
    }

    /// Gestisce directory vuota o inesistente
    fn handle_empty_directory(&self, media_dir: &Path) -> RunAggregate {
        warn!("⚠️ No PNG files found in {}", media_dir.display());

        let mut stats = RunAggregate::start(0, 0);
        stats.finish(RunStatus::NoFiles);
        if self.settings.logging.json_output {
            self.json_sink.send(&JsonMessage::complete(&stats));
        }
        stats
    }

    /// Codec non disponibile: nessun job viene sottomesso
    fn handle_codec_unavailable(&self, e: OptimizeError) -> RunAggregate {
        error!("❌ CRITICAL: {}. Cannot proceed with optimization.", e);

        let mut stats = RunAggregate::start(0, 0);
        stats.finish(RunStatus::CodecUnavailable);
        if self.settings.logging.json_output {
            self.json_sink.send(&JsonMessage::error(
                "codec unavailable".to_string(),
                Some(e.to_string()),
            ));
        }
        stats
    }

    /// Sottomette un job per file e drena i risultati in ordine di completamento
    async fn process_files_concurrently<F>(
        &self,
        files: Vec<PathBuf>,
        workers: usize,
        tracker: &ProgressTracker,
        stats: &mut RunAggregate,
        shutdown: F,
    ) -> RunStatus
    where
        F: Future<Output = ()>,
    {
        let semaphore = Arc::new(Semaphore::new(workers));
        let task_optimizer = TaskOptimizer::from_settings(self.codec.clone(), &self.settings);
        let mut tasks: JoinSet<JobResult> = JoinSet::new();

        for file_path in files {
            let semaphore = semaphore.clone();
            let task_optimizer = task_optimizer.clone();
            // Counted as original size if the job dies before measuring it
            let discovered_size = FileManager::file_size(&file_path).unwrap_or(0);

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let path = file_path.clone();
                        tokio::task::spawn_blocking(move || {
                            let _permit = permit;
                            task_optimizer.optimize_file(&path)
                        })
                        .await
                        .unwrap_or_else(|e| Err(OptimizeError::Worker(describe_join_error(&e))))
                    }
                    Err(e) => Err(OptimizeError::Worker(e.to_string())),
                };
                (file_path, discovered_size, result)
            });
        }

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    warn!(
                        "Interrupted: {} of {} files completed, remaining jobs cancelled",
                        stats.completed(),
                        stats.total_files
                    );
                    tasks.abort_all();
                    return RunStatus::Interrupted;
                }

                joined = tasks.join_next() => {
                    let Some(joined) = joined else {
                        break;
                    };
                    self.handle_job_result(joined, tracker, stats);
                }
            }
        }

        RunStatus::Completed
    }

    /// Ripiega il risultato di un job nell'aggregate e aggiorna il progresso
    fn handle_job_result(
        &self,
        joined: Result<JobResult, JoinError>,
        tracker: &ProgressTracker,
        stats: &mut RunAggregate,
    ) {
        match joined {
            Ok((path, _, Ok(outcome))) => {
                let classification = stats.record(&outcome);
                debug!("{} -> {}", path.display(), classification.as_str());
                let message = tracker.file_message(|| JsonMessage::file_complete(&outcome));
                tracker.job_completed(stats, message);
            }
            Ok((path, discovered_size, Err(e))) => {
                error!("Failed to process {}: {}", path.display(), e);
                stats.record_failure(discovered_size);
                let message = tracker.file_message(|| {
                    JsonMessage::file_failed(&path, discovered_size, e.to_string())
                });
                tracker.job_completed(stats, message);
            }
            Err(e) => {
                // Only reachable through cancellation; the file is unknown
                error!("Worker task failed: {}", describe_join_error(&e));
                stats.record_failure(0);
                tracker.job_completed(stats, None);
            }
        }
    }

    /// Stampa statistiche finali
    fn print_final_stats(&self, stats: &RunAggregate) {
        if self.settings.logging.json_output {
            self.json_sink.send(&JsonMessage::complete(stats));
        } else if self.settings.logging.show_summary {
            for line in stats.summary_lines(&self.settings.logging) {
                info!("{}", line);
            }
        }
    }
}

fn describe_join_error(e: &JoinError) -> String {
    if e.is_panic() {
        "job panicked".to_string()
    } else if e.is_cancelled() {
        "job cancelled".to_string()
    } else {
        e.to_string()
    }
}
