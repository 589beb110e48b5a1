//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce la progress bar e le statistiche aggregate del batch.
//!
//! ## Componenti principali:
//! - `ProgressManager`: wrapper della progress bar `indicatif`
//! - `JobOutcome`: risultato di un singolo job (file, dimensione, savings)
//! - `RunAggregate`: contatori cumulativi di tutto il run
//!
//! ## Classificazione dei job:
//! - **successful**: codec ok e `bytes_saved > 0`
//! - **unchanged**: codec ok e `bytes_saved == 0`
//! - **increased**: codec fallito oppure file cresciuto (stesso bucket)
//! - **failed**: il job stesso è fallito fuori dall'adapter (panic, I/O)
//!
//! ## Ownership:
//! `RunAggregate` è posseduto solo dal dispatcher che drena i risultati;
//! i worker restituiscono `JobOutcome` e non toccano mai i contatori.
//!
//! ## Visual feedback:
//! ```text
//! 🖼️ Compressing PNGs [████████████████████▒▒▒▒] 42/60 | 📊 40✅ 1➖ 1📈 0❌ | 💾 3.12MB saved
//! ```

use crate::config::LoggingSettings;
use crate::utils::{bytes_to_mb, files_per_second, format_size, format_time, savings_percent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Manages the progress bar of a batch run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a progress bar for `total_files`; hidden when `visible` is false
    pub fn new(total_files: u64, visible: bool) -> Self {
        if !visible {
            return Self { bar: ProgressBar::hidden() };
        }

        let bar = ProgressBar::new(total_files);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("🖼️ Compressing PNGs [{bar:40.cyan/blue}] {pos}/{len} | {msg}")
            .map(|s| s.progress_chars("██▒"))
        {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one file and replace the message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Files counted so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Result of one file's compression attempt
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub path: PathBuf,
    /// Size read before the codec ran
    pub original_size: u64,
    pub success: bool,
    /// `original_size - new_size`; negative when the file grew
    pub bytes_saved: i64,
}

impl JobOutcome {
    /// Codec failed; the file is assumed untouched
    pub fn failed(path: PathBuf, original_size: u64) -> Self {
        Self {
            path,
            original_size,
            success: false,
            bytes_saved: 0,
        }
    }

    pub fn classify(&self) -> Classification {
        if !self.success {
            Classification::Increased
        } else if self.bytes_saved > 0 {
            Classification::Successful
        } else {
            Classification::Unchanged
        }
    }
}

/// Bucket a completed job falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Successful,
    Unchanged,
    /// Codec failure or a file that grew
    Increased,
    /// The job itself failed outside the adapter
    Failed,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Unchanged => "unchanged",
            Self::Increased => "increased",
            Self::Failed => "failed",
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    NoFiles,
    CodecUnavailable,
    Interrupted,
}

struct Glyphs {
    successful: &'static str,
    unchanged: &'static str,
    increased: &'static str,
    failed: &'static str,
}

const EMOJI: Glyphs = Glyphs {
    successful: "✅",
    unchanged: "➖",
    increased: "📈",
    failed: "❌",
};

const PLAIN: Glyphs = Glyphs {
    successful: " ok",
    unchanged: " same",
    increased: " up",
    failed: " err",
};

/// Cumulative statistics over every completed job of a run
#[derive(Debug, Clone)]
pub struct RunAggregate {
    pub status: RunStatus,
    pub total_files: usize,
    pub workers: usize,
    pub successful: usize,
    pub unchanged: usize,
    pub increased: usize,
    pub failed: usize,
    pub total_saved: i64,
    pub total_original_size: u64,
    started: Instant,
    elapsed: Duration,
}

impl RunAggregate {
    /// Start a new aggregate; the clock starts now
    pub fn start(total_files: usize, workers: usize) -> Self {
        Self {
            status: RunStatus::Running,
            total_files,
            workers,
            successful: 0,
            unchanged: 0,
            increased: 0,
            failed: 0,
            total_saved: 0,
            total_original_size: 0,
            started: Instant::now(),
            elapsed: Duration::ZERO,
        }
    }

    /// Fold a job result into the counters
    pub fn record(&mut self, outcome: &JobOutcome) -> Classification {
        let classification = outcome.classify();
        match classification {
            Classification::Successful => self.successful += 1,
            Classification::Unchanged => self.unchanged += 1,
            Classification::Increased => self.increased += 1,
            Classification::Failed => self.failed += 1,
        }
        self.total_saved += outcome.bytes_saved;
        self.total_original_size += outcome.original_size;
        classification
    }

    /// Count a job that failed outside the adapter.
    ///
    /// The file is assumed untouched, so its size still counts towards the
    /// original total with nothing saved.
    pub fn record_failure(&mut self, original_size: u64) -> Classification {
        self.failed += 1;
        self.total_original_size += original_size;
        Classification::Failed
    }

    /// Stop the clock and set the final status
    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.elapsed = self.started.elapsed();
    }

    pub fn completed(&self) -> usize {
        self.successful + self.unchanged + self.increased + self.failed
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn total_new_size(&self) -> u64 {
        (self.total_original_size as i64 - self.total_saved).max(0) as u64
    }

    pub fn savings_percent(&self) -> f64 {
        savings_percent(self.total_saved, self.total_original_size)
    }

    pub fn files_per_second(&self) -> f64 {
        files_per_second(self.total_files, self.elapsed)
    }

    /// The four outcome counters, e.g. `3✅ 1➖ 0📈 0❌`
    pub fn results_text(&self, emoji: bool) -> String {
        let g = if emoji { &EMOJI } else { &PLAIN };
        format!(
            "{}{} {}{} {}{} {}{}",
            self.successful, g.successful,
            self.unchanged, g.unchanged,
            self.increased, g.increased,
            self.failed, g.failed,
        )
    }

    /// Live counter line shown next to the progress bar
    pub fn counters_text(&self, emoji: bool) -> String {
        let (lead, disk) = if emoji { ("📊 ", "💾 ") } else { ("", "") };
        format!(
            "{}{} | {}{:.2}MB saved",
            lead,
            self.results_text(emoji),
            disk,
            bytes_to_mb(self.total_saved)
        )
    }

    /// Lines of the final report
    pub fn summary_lines(&self, logging: &LoggingSettings) -> Vec<String> {
        let emoji = logging.emoji_style;
        let icon = |glyph: &str| if emoji { format!("{} ", glyph) } else { String::new() };
        let rule = "=".repeat(60);

        let mut lines = vec![
            rule.clone(),
            format!(
                "{}OPTIMIZATION COMPLETED in {}",
                icon("🎉"),
                format_time(self.elapsed.as_secs_f64())
            ),
            format!("{}Files processed: {}", icon("📊"), self.total_files),
            format!("{}Results: {}", icon("📈"), self.results_text(emoji)),
            format!(
                "{}Total savings: {:.1}% ({:.2} MB)",
                icon("💾"),
                self.savings_percent(),
                bytes_to_mb(self.total_saved)
            ),
        ];

        if self.status == RunStatus::Interrupted {
            lines.push(format!(
                "{}Run interrupted: {} of {} files completed",
                icon("⚠️"),
                self.completed(),
                self.total_files
            ));
        }

        if logging.show_file_sizes {
            lines.push(format!(
                "{}Final size: {} (was {})",
                icon("📦"),
                format_size(self.total_new_size()),
                format_size(self.total_original_size)
            ));
            lines.push(format!(
                "{}Size change: {:.2} MB → {:.2} MB",
                icon("📐"),
                bytes_to_mb(self.total_original_size as i64),
                bytes_to_mb(self.total_new_size() as i64)
            ));
        }

        lines.push(format!(
            "{}Processing speed: {:.1} files/sec",
            icon("⚡"),
            self.files_per_second()
        ));
        lines.push(rule);
        lines
    }
}
