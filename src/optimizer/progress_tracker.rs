//! # Progress Tracking Module
//!
//! Unifica progress bar e output JSON per i risultati live del batch.
//! Non possiede contatori propri: legge il `RunAggregate` del dispatcher
//! dopo ogni job completato.

use crate::{
    config::LoggingSettings,
    json_output::{JsonMessage, JsonSink},
    progress::{ProgressManager, RunAggregate},
};
use std::path::Path;

/// Tracker progress per un singolo run
#[derive(Clone)]
pub struct ProgressTracker {
    pub total_files: usize,
    progress_manager: ProgressManager,
    emoji: bool,
    json_output: bool,
    sink: JsonSink,
}

impl ProgressTracker {
    /// Crea un nuovo tracker; la barra è nascosta in modalità JSON
    pub fn new(total_files: usize, logging: &LoggingSettings, sink: JsonSink) -> Self {
        let visible = logging.show_progress && !logging.json_output;

        Self {
            total_files,
            progress_manager: ProgressManager::new(total_files as u64, visible),
            emoji: logging.emoji_style,
            json_output: logging.json_output,
            sink,
        }
    }

    /// Aggiorna i contatori live dopo un job già registrato nell'aggregate
    pub fn job_completed(&self, stats: &RunAggregate, message: Option<JsonMessage>) {
        if self.json_output {
            if let Some(message) = message {
                self.sink.send(&message);
            }
            self.sink.send(&JsonMessage::progress(stats));
        }

        self.progress_manager.update(&stats.counters_text(self.emoji));
    }

    /// Messaggio JSON per un file completato, se serve
    pub fn file_message(&self, build: impl FnOnce() -> JsonMessage) -> Option<JsonMessage> {
        self.json_output.then(build)
    }

    /// Emette l'inizio del batch in modalità JSON
    pub fn started(&self, input_dir: &Path, workers: usize) {
        if self.json_output {
            self.sink
                .send(&JsonMessage::start(input_dir, self.total_files, workers));
        }
    }

    /// Finalizza progress bar
    pub fn finish(&self, stats: &RunAggregate) {
        let done = if self.emoji { "✅ Optimization complete!" } else { "Optimization complete" };
        self.progress_manager
            .finish(&format!("{} {}", done, stats.counters_text(self.emoji)));
    }

    /// Files reported so far
    pub fn reported(&self) -> u64 {
        self.progress_manager.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::progress::{JobOutcome, RunStatus};
    use std::path::PathBuf;

    #[test]
    fn test_tracker_follows_aggregate() {
        let mut logging = Settings::default().logging;
        logging.show_progress = false;
        let tracker = ProgressTracker::new(2, &logging, JsonSink::default());
        let mut stats = RunAggregate::start(2, 1);

        for size in [100, 200] {
            let outcome = JobOutcome {
                path: PathBuf::from("a.png"),
                original_size: size,
                success: true,
                bytes_saved: 10,
            };
            stats.record(&outcome);
            let message = tracker.file_message(|| JsonMessage::file_complete(&outcome));
            assert!(message.is_none());
            tracker.job_completed(&stats, message);
        }

        stats.finish(RunStatus::Completed);
        tracker.finish(&stats);
        assert_eq!(tracker.reported(), 2);
    }

    #[test]
    fn test_json_mode_builds_file_messages() {
        let mut logging = Settings::default().logging;
        logging.json_output = true;
        let tracker = ProgressTracker::new(1, &logging, JsonSink::default());

        let message =
            tracker.file_message(|| JsonMessage::file_failed(Path::new("a.png"), 10, "x".into()));
        assert!(matches!(message, Some(JsonMessage::FileComplete { .. })));
    }
}
