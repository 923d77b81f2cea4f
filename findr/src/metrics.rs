use tracing::{debug, info};

/// Counters collected while walking a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub files_visited: u64,
    pub directories_visited: u64,
    /// Files the reporter was called for
    pub matches_reported: u64,
    /// Entries dropped because reading them failed
    pub entries_skipped: u64,
}

impl TraversalStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file(&mut self) {
        self.files_visited += 1;
    }

    pub fn record_directory(&mut self) {
        self.directories_visited += 1;
    }

    pub fn record_match(&mut self) {
        self.matches_reported += 1;
    }

    pub fn record_skip(&mut self) {
        self.entries_skipped += 1;
    }

    /// Logs the counters
    pub fn log_stats(&self) {
        info!(
            "Visited {} files in {} directories, {} matches",
            self.files_visited, self.directories_visited, self.matches_reported
        );
        debug!("Skipped {} unreadable entries", self.entries_skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = TraversalStats::new();
        stats.record_file();
        stats.record_file();
        stats.record_directory();
        stats.record_match();
        stats.record_skip();

        assert_eq!(stats.files_visited, 2);
        assert_eq!(stats.directories_visited, 1);
        assert_eq!(stats.matches_reported, 1);
        assert_eq!(stats.entries_skipped, 1);
        assert_ne!(stats, TraversalStats::default());
    }
}
