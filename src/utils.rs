//! # Utility Functions Module
//!
//! Pure helpers for byte counts, elapsed time and the derived
//! statistics shown in the run summary.

use std::time::Duration;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Converts a byte count to megabytes.
///
/// Takes a signed value because a batch can end up with negative savings
/// when files grow.
pub fn bytes_to_mb(bytes: i64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Formats a byte count with B/KB/MB/GB/TB scaling, one decimal place.
///
/// # Example
/// ```rust
/// use png_batch_optimizer::utils::format_size;
///
/// assert_eq!(format_size(512), "512.0 B");
/// assert_eq!(format_size(1536), "1.5 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;

    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }

    format!("{:.1} TB", size)
}

/// Formats elapsed seconds as `s` below a minute, `m` below an hour, else `h`.
pub fn format_time(seconds: f64) -> String {
    const MINUTE: f64 = 60.0;
    const HOUR: f64 = 3600.0;

    if seconds < MINUTE {
        format!("{:.1}s", seconds)
    } else if seconds < HOUR {
        format!("{:.1}m", seconds / MINUTE)
    } else {
        format!("{:.1}h", seconds / HOUR)
    }
}

/// Percentage of `original` that was saved; 0 when nothing was measured.
pub fn savings_percent(saved: i64, original: u64) -> f64 {
    if original == 0 {
        0.0
    } else {
        (saved as f64 / original as f64) * 100.0
    }
}

/// Files per second over `elapsed`; a zero-length run reports 0.
pub fn files_per_second(files: usize, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        files as f64 / seconds
    } else {
        0.0
    }
}
