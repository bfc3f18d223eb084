//! Progress logging for the command line.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use streamvod_transfer::SpeedCalculator;
use streamvod_upload::UploadProgress;

/// Turns per-part progress into throughput and ETA log lines.
#[derive(Default)]
pub struct ProgressReporter {
    speed: SpeedCalculator,
    last_bytes: AtomicU64,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, progress: UploadProgress) {
        let previous = self
            .last_bytes
            .swap(progress.bytes_uploaded, Ordering::Relaxed);
        self.speed
            .add_sample(progress.bytes_uploaded.saturating_sub(previous));

        let remaining = progress.total_bytes.saturating_sub(progress.bytes_uploaded);
        let eta = self.speed.eta(remaining);

        tracing::info!(
            parts = %format!("{}/{}", progress.completed_parts, progress.total_parts),
            percent = %format!("{:.1}", percent(progress.bytes_uploaded, progress.total_bytes)),
            rate = %format_rate(self.speed.bytes_per_second()),
            eta = %eta.map(format_eta).unwrap_or_else(|| "-".into()),
            "uploading"
        );
    }
}

fn percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    done as f64 * 100.0 / total as f64
}

/// Formats bytes/second with a binary unit.
pub fn format_rate(bytes_per_second: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KiB/s", "MiB/s", "GiB/s"];
    let mut value = bytes_per_second;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_units() {
        assert_eq!(format_rate(0.0), "0.0 B/s");
        assert_eq!(format_rate(512.0), "512.0 B/s");
        assert_eq!(format_rate(1536.0), "1.5 KiB/s");
        assert_eq!(format_rate(10.0 * 1024.0 * 1024.0), "10.0 MiB/s");
    }

    #[test]
    fn eta_format() {
        assert_eq!(format_eta(Duration::from_secs(42)), "42s");
        assert_eq!(format_eta(Duration::from_secs(125)), "2m05s");
        assert_eq!(format_eta(Duration::from_secs(3720)), "1h02m");
    }

    #[test]
    fn percent_of_empty_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(25, 100), 25.0);
    }

    #[test]
    fn report_tracks_deltas() {
        let reporter = ProgressReporter::new();
        reporter.report(UploadProgress {
            completed_parts: 1,
            total_parts: 2,
            bytes_uploaded: 10,
            total_bytes: 20,
        });
        reporter.report(UploadProgress {
            completed_parts: 2,
            total_parts: 2,
            bytes_uploaded: 20,
            total_bytes: 20,
        });
        assert_eq!(reporter.last_bytes.load(Ordering::Relaxed), 20);
    }
}
