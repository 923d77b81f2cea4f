use ignore::WalkBuilder;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, trace};

use super::matcher::{MatchStrategy, Matcher};
use crate::config::{SearchConfig, SearchRequest};
use crate::errors::{SearchError, SearchResult};
use crate::metrics::TraversalStats;
use crate::report::{CollectingReporter, Reporter};
use crate::results::{MatchBuffer, SearchOutput};

/// Outcome of matching a single file.
///
/// Errors stop here: the walker logs a `Skipped` entry and moves on, so a
/// failure on one file never reaches the caller.
#[derive(Debug)]
pub enum Visit {
    Found(MatchBuffer),
    NotFound,
    Skipped(SearchError),
}

impl From<SearchResult<Option<MatchBuffer>>> for Visit {
    fn from(result: SearchResult<Option<MatchBuffer>>) -> Self {
        match result {
            Ok(Some(buffer)) if !buffer.is_empty() => Visit::Found(buffer),
            Ok(_) => Visit::NotFound,
            Err(e) => Visit::Skipped(e),
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Levels below a starting entry that a budget of `max_depth` still reaches
fn levels_below(max_depth: i64) -> usize {
    usize::try_from(max_depth.saturating_sub(1).max(0)).unwrap_or(usize::MAX)
}

/// Depth-first walker driving one matcher and one reporter
pub struct Walker<'a, M: ?Sized, R: ?Sized> {
    key: &'a str,
    matcher: &'a M,
    reporter: &'a mut R,
    skip_hidden: bool,
    base: Option<PathBuf>,
    stats: TraversalStats,
}

impl<'a, M, R> Walker<'a, M, R>
where
    M: Matcher + ?Sized,
    R: Reporter + ?Sized,
{
    /// Creates a walker whose display paths are relative to the current
    /// working directory
    pub fn new(key: &'a str, matcher: &'a M, reporter: &'a mut R, skip_hidden: bool) -> Self {
        Self {
            key,
            matcher,
            reporter,
            skip_hidden,
            base: std::env::current_dir().ok(),
            stats: TraversalStats::new(),
        }
    }

    /// Makes display paths relative to `base` instead
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn stats(&self) -> TraversalStats {
        self.stats
    }

    /// Path shown to the reporter: relative to the base when `path` lies
    /// under it, otherwise unchanged
    pub fn display_path(&self, path: &Path) -> String {
        self.base
            .as_deref()
            .and_then(|base| path.strip_prefix(base).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Visits `path` with `max_depth` levels of budget left.
    ///
    /// A budget of zero or less visits nothing. Hidden entries are pruned
    /// with their whole subtree when `skip_hidden` is set. Regular files go
    /// through the matcher; directories are descended into with one level
    /// less. Symlinks are matched only when they point at a regular file,
    /// linked directories are not followed. Anything else is ignored.
    pub fn traverse(&mut self, path: &Path, max_depth: i64) {
        if max_depth <= 0 {
            return;
        }
        // The walk never filters its own starting entry
        if self.skip_hidden && is_hidden(path) {
            trace!("Pruning hidden entry {}", path.display());
            return;
        }
        self.walk(path, levels_below(max_depth), true);
    }

    /// Visits everything below `dir`, giving each of its entries the full
    /// `max_depth` budget
    pub fn traverse_children(&mut self, dir: &Path, max_depth: i64) {
        if max_depth <= 0 {
            return;
        }
        self.walk(dir, levels_below(max_depth).saturating_add(1), false);
    }

    fn walk(&mut self, start: &Path, levels: usize, include_start: bool) {
        let mut builder = WalkBuilder::new(start);
        builder
            .standard_filters(false)
            .hidden(self.skip_hidden)
            .follow_links(false)
            .max_depth(Some(levels));

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    self.stats.record_skip();
                    continue;
                }
            };
            if entry.depth() == 0 && !include_start {
                continue;
            }

            let path = entry.path();
            match entry.file_type() {
                Some(ft) if ft.is_file() => self.visit_file(path),
                Some(ft) if ft.is_dir() => self.stats.record_directory(),
                Some(ft) if ft.is_symlink() => self.visit_link(path),
                _ => trace!("Ignoring special entry {}", path.display()),
            }
        }
    }

    fn visit_link(&mut self, path: &Path) {
        match fs::metadata(path) {
            Ok(target) if target.is_file() => self.visit_file(path),
            Ok(_) => trace!("Not following link {}", path.display()),
            Err(e) => {
                debug!("Skipping broken link {}: {}", path.display(), e);
                self.stats.record_skip();
            }
        }
    }

    fn visit_file(&mut self, path: &Path) {
        trace!("Visiting {}", path.display());
        self.stats.record_file();

        match Visit::from(self.matcher.find(path, self.key)) {
            Visit::Found(buffer) => {
                let display = self.display_path(path);
                self.stats.record_match();
                self.reporter.report(&display, &buffer);
            }
            Visit::NotFound => {}
            Visit::Skipped(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                self.stats.record_skip();
            }
        }
    }
}

/// Walks a single entry: the plain function form of [`Walker::traverse`]
pub fn traverse<M, R>(
    path: &Path,
    key: &str,
    max_depth: i64,
    matcher: &M,
    reporter: &mut R,
    skip_hidden: bool,
) -> TraversalStats
where
    M: Matcher + ?Sized,
    R: Reporter + ?Sized,
{
    let mut walker = Walker::new(key, matcher, reporter, skip_hidden);
    walker.traverse(path, max_depth);
    walker.stats()
}

/// Resolves `root` against `cwd`, folding `.` and `..` components
fn resolve_root(cwd: &Path, root: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in cwd.join(root).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}

/// Searches every entry of the request's root directory.
///
/// Each top-level entry is traversed with the full depth budget, so a depth
/// of 1 looks at the root's own files only. Failing to open the root is the
/// one error returned; everything below it is contained per entry.
pub fn run<M, R>(
    request: &SearchRequest,
    matcher: &M,
    reporter: &mut R,
) -> SearchResult<TraversalStats>
where
    M: Matcher + ?Sized,
    R: Reporter + ?Sized,
{
    let cwd = std::env::current_dir()?;
    let root = resolve_root(&cwd, request.root());
    info!(
        "Searching {} for {:?} (max depth {}, skip hidden: {})",
        root.display(),
        request.key(),
        request.max_depth(),
        request.skip_hidden()
    );

    let mut walker = Walker::new(request.key(), matcher, reporter, request.skip_hidden())
        .with_base(cwd);

    if root.is_file() {
        walker.traverse(&root, request.max_depth());
    } else {
        root.read_dir().map_err(|e| SearchError::from_io(&root, e))?;
        walker.traverse_children(&root, request.max_depth());
    }

    let stats = walker.stats();
    stats.log_stats();
    Ok(stats)
}

/// Runs the search described by `config`, sending matches to `reporter`
pub fn search<R>(config: &SearchConfig, reporter: &mut R) -> SearchResult<TraversalStats>
where
    R: Reporter + ?Sized,
{
    let request = config.request()?;
    let strategy = MatchStrategy::new(config.mode, config.encoding_mode);
    run(&request, &strategy, reporter)
}

/// Runs the search described by `config` and keeps every report
pub fn collect(config: &SearchConfig) -> SearchResult<SearchOutput> {
    let mut reporter = CollectingReporter::new();
    let stats = search(config, &mut reporter)?;
    Ok(SearchOutput {
        reports: reporter.into_reports(),
        stats,
    })
}
