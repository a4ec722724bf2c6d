//! Records flowing through a run: listed resources, per-image outcomes and
//! the final summary.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One remote image, projected from a listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Remote `public_id`; may contain `/` folder separators.
    pub identifier: String,
    /// File extension (`jpg`, `png`, ...).
    pub format: String,
    /// Expected transfer size reported by the listing.
    pub size_bytes: u64,
    /// Fully-qualified fetch URL (`secure_url`).
    pub source_url: String,
    /// Position in the final accumulated sequence; set once by
    /// [`assign_sequence`] after listing completes. Logging only.
    pub sequence_index: usize,
}

impl ResourceRecord {
    /// `<identifier>.<format>`, the name used on disk before sanitizing.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.identifier, self.format)
    }
}

/// Number records 0..n in their current order.
pub fn assign_sequence(records: &mut [ResourceRecord]) {
    for (i, r) in records.iter_mut().enumerate() {
        r.sequence_index = i;
    }
}

/// Sum of expected sizes; the progress tracker's fixed total.
pub fn total_bytes(records: &[ResourceRecord]) -> u64 {
    records.iter().map(|r| r.size_bytes).sum()
}

/// Result of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success {
        source_url: String,
        path: PathBuf,
        bytes: u64,
        sequence_index: usize,
    },
    Failure {
        source_url: String,
        error: String,
        sequence_index: usize,
    },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    pub fn source_url(&self) -> &str {
        match self {
            DownloadOutcome::Success { source_url, .. } => source_url,
            DownloadOutcome::Failure { source_url, .. } => source_url,
        }
    }

    pub fn sequence_index(&self) -> usize {
        match self {
            DownloadOutcome::Success { sequence_index, .. } => *sequence_index,
            DownloadOutcome::Failure { sequence_index, .. } => *sequence_index,
        }
    }
}

/// Aggregate of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Outcomes collected (equals the number of listed records).
    pub attempted: usize,
    pub succeeded: usize,
    /// Expected bytes across every listed record.
    pub total_bytes: u64,
    /// Expected bytes of the records that downloaded successfully.
    pub bytes_done: u64,
    pub elapsed: Duration,
    pub output_dir: PathBuf,
    /// Source URLs of failed downloads, in completion order.
    pub failed_urls: Vec<String>,
}

impl RunSummary {
    pub fn from_outcomes(
        outcomes: &[DownloadOutcome],
        total_bytes: u64,
        bytes_done: u64,
        elapsed: Duration,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            attempted: outcomes.len(),
            succeeded: outcomes.iter().filter(|o| o.is_success()).count(),
            total_bytes,
            bytes_done,
            elapsed,
            output_dir,
            failed_urls: outcomes
                .iter()
                .filter(|o| !o.is_success())
                .map(|o| o.source_url().to_string())
                .collect(),
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} images: {} downloaded, {} failed -> {}",
            self.attempted,
            self.succeeded,
            self.failed(),
            self.output_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, size: u64) -> ResourceRecord {
        ResourceRecord {
            identifier: id.to_string(),
            format: "png".to_string(),
            size_bytes: size,
            source_url: format!("https://cdn.example/{id}.png"),
            sequence_index: 0,
        }
    }

    #[test]
    fn assign_sequence_numbers_in_order() {
        let mut records = vec![record("a", 1), record("b", 2), record("c", 3)];
        assign_sequence(&mut records);
        let idx: Vec<usize> = records.iter().map(|r| r.sequence_index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
        assert_eq!(records[2].identifier, "c");
    }

    #[test]
    fn total_bytes_sums_sizes() {
        let records = vec![record("a", 100), record("b", 200), record("c", 300)];
        assert_eq!(total_bytes(&records), 600);
        assert_eq!(total_bytes(&[]), 0);
    }

    #[test]
    fn summary_counts_failures() {
        let outcomes = vec![
            DownloadOutcome::Success {
                source_url: "u1".into(),
                path: PathBuf::from("/out/a.png"),
                bytes: 100,
                sequence_index: 0,
            },
            DownloadOutcome::Failure {
                source_url: "u2".into(),
                error: "HTTP 404".into(),
                sequence_index: 1,
            },
        ];
        let s = RunSummary::from_outcomes(
            &outcomes,
            300,
            100,
            Duration::from_secs(1),
            PathBuf::from("/out"),
        );
        assert_eq!(s.attempted, 2);
        assert_eq!(s.succeeded, 1);
        assert_eq!(s.failed(), 1);
        assert_eq!(s.failed_urls, vec!["u2".to_string()]);
        assert_eq!(
            s.to_string(),
            "Processed 2 images: 1 downloaded, 1 failed -> /out"
        );
    }
}
