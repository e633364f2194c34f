use std::fmt;
use std::time::Duration;

/// Snapshot of an import in progress.
///
/// `total` is what has been discovered so far, so it keeps growing while the
/// spool walk runs; percentages and estimates firm up once it completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub migrated: u64,
    pub total: u64,
    pub elapsed: Duration,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.migrated as f64 * 100.0 / self.total as f64
    }

    /// Items per hour, over at least one second.
    pub fn per_hour(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64().max(1.0);
        self.migrated as f64 * 3600.0 / secs
    }

    /// Projected time to send what remains, at the rate so far.
    pub fn eta(&self) -> Option<Duration> {
        let remaining = self.total.saturating_sub(self.migrated);
        if remaining == 0 {
            return Some(Duration::ZERO);
        }
        let rate = self.per_hour();
        (rate > 0.0).then(|| Duration::from_secs_f64(remaining as f64 * 3600.0 / rate))
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}s Migrated {}/{} {:.1}% {:.0}p/h ETA: ",
            self.elapsed.as_secs(),
            self.migrated,
            self.total,
            self.percent(),
            self.per_hour(),
        )?;
        match self.eta() {
            Some(eta) => write!(f, "{:.2}h", eta.as_secs_f64() / 3600.0),
            None => f.write_str("unknown"),
        }
    }
}
