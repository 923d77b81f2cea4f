use colored::Colorize;
use std::io::{self, Write};
use tracing::debug;

use crate::config::SearchMode;
use crate::results::{MatchBuffer, Report};

/// Receives every match the traversal finds.
///
/// Called exactly once per matching file, with the display path (relative to
/// the starting directory when possible) and the matcher's buffer. Never
/// called for files without a match.
pub trait Reporter {
    fn report(&mut self, display_name: &str, buffer: &MatchBuffer);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, display_name: &str, buffer: &MatchBuffer) {
        (**self).report(display_name, buffer)
    }
}

/// Renders a buffer with terminal colours
pub fn render_buffer(buffer: &MatchBuffer) -> String {
    match buffer {
        MatchBuffer::Lines(hits) => hits
            .iter()
            .map(|hit| {
                format!(
                    "{} {}\n",
                    hit.location().blue(),
                    hit.fragment.render_with(|s| s.green().to_string())
                )
            })
            .collect(),
        MatchBuffer::Name(name) => name.render_with(|s| s.green().to_string()),
    }
}

/// Prints matches as they arrive
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
    mode: SearchMode,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(mode: SearchMode) -> Self {
        Self::new(io::stdout(), mode)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, mode: SearchMode) -> Self {
        Self { out, mode }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&self, display_name: &str, buffer: &MatchBuffer) -> String {
        match self.mode {
            // Path header, the matching lines, then a blank separator line
            SearchMode::Contents => {
                format!("{}\n{}\n", display_name.yellow(), render_buffer(buffer))
            }
            SearchMode::Filenames => format!("{}\n", render_buffer(buffer)),
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, display_name: &str, buffer: &MatchBuffer) {
        let text = self.render(display_name, buffer);
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
        {
            debug!("Failed to write report for {}: {}", display_name, e);
        }
    }
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Vec<Report>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<Report> {
        self.reports
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, display_name: &str, buffer: &MatchBuffer) {
        self.reports.push(Report {
            display_name: display_name.to_string(),
            buffer: buffer.clone(),
        });
    }
}
