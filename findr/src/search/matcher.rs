use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{trace, warn};

use crate::config::{EncodingMode, SearchMode};
use crate::errors::{SearchError, SearchResult};
use crate::results::{Highlighted, LineHit, MatchBuffer};

const BUFFER_CAPACITY: usize = 65536;

/// Characters kept in front of the match when a line is windowed
pub const CONTEXT_LOOKBACK: usize = 20;

/// Hard cap on the visible length of a content fragment
pub const HIGHLIGHT_MAX_LEN: usize = 40;

/// Decides whether a file matches a key and describes what matched.
///
/// `Ok(None)` means the file was read and nothing matched. Errors are left to
/// the caller; the traversal engine turns them into skipped entries.
pub trait Matcher {
    fn find(&self, path: &Path, key: &str) -> SearchResult<Option<MatchBuffer>>;
}

/// Byte offset of the `n`th character of `s`, or `s.len()` past the end
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

/// Number of characters in `s` before byte offset `byte`
fn char_offset(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

/// Scans a file's lines for the key
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentMatcher {
    encoding_mode: EncodingMode,
}

impl ContentMatcher {
    pub fn new(encoding_mode: EncodingMode) -> Self {
        Self { encoding_mode }
    }

    /// Builds the hit for one line, or `None` if the key is absent.
    ///
    /// The column is measured on the raw line. The fragment is taken from the
    /// trimmed line: only the first occurrence is emphasised, a line whose
    /// occurrence starts past [`CONTEXT_LOOKBACK`] characters is cut to start
    /// that many characters before it, and the result is capped at
    /// [`HIGHLIGHT_MAX_LEN`] characters.
    pub fn match_line(line: &str, line_number: usize, key: &str) -> Option<LineHit> {
        if key.is_empty() {
            return None;
        }
        let raw_pos = line.find(key)?;

        Some(LineHit {
            line_number,
            column: char_offset(line, raw_pos) + 1,
            fragment: Self::fragment(line.trim(), key),
        })
    }

    fn fragment(stripped: &str, key: &str) -> Highlighted {
        // A key with surrounding whitespace may vanish from the trimmed line
        let occurrence = stripped.find(key).map(|start| start..start + key.len());

        let window_start = match &occurrence {
            Some(r) => {
                let pos = char_offset(stripped, r.start);
                if pos > CONTEXT_LOOKBACK {
                    byte_offset(stripped, pos - CONTEXT_LOOKBACK)
                } else {
                    0
                }
            }
            None => 0,
        };

        let windowed = &stripped[window_start..];
        let window_end = byte_offset(windowed, HIGHLIGHT_MAX_LEN);

        let emphasis = occurrence.and_then(|r| {
            let start = r.start - window_start;
            let end = (r.end - window_start).min(window_end);
            (start < end).then_some(start..end)
        });

        Highlighted::new(&windowed[..window_end], emphasis)
    }

    /// Scans every line from `reader`, in order
    pub fn match_reader<R: BufRead>(
        &self,
        mut reader: R,
        path: &Path,
        key: &str,
    ) -> SearchResult<Vec<LineHit>> {
        let mut hits = Vec::new();
        let mut bytes = Vec::with_capacity(256);
        let mut line_number = 0;
        let mut replaced = false;

        loop {
            bytes.clear();
            let read = reader
                .read_until(b'\n', &mut bytes)
                .map_err(|e| SearchError::from_io(path, e))?;
            if read == 0 {
                break;
            }

            if bytes.last() == Some(&b'\n') {
                bytes.pop();
            }
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }

            // A lone carriage return ends a line as well
            for piece in bytes.split(|&b| b == b'\r') {
                line_number += 1;

                let line = match self.encoding_mode {
                    EncodingMode::FailFast => Cow::Borrowed(
                        std::str::from_utf8(piece)
                            .map_err(|_| SearchError::encoding_error(path, line_number))?,
                    ),
                    EncodingMode::Lossy => {
                        let cow = String::from_utf8_lossy(piece);
                        // Owned means at least one sequence was replaced
                        replaced |= matches!(cow, Cow::Owned(_));
                        cow
                    }
                };

                if let Some(hit) = Self::match_line(&line, line_number, key) {
                    hits.push(hit);
                }
            }
        }

        if replaced {
            warn!("Invalid UTF-8 replaced in file: {}", path.display());
        }

        Ok(hits)
    }
}

impl Matcher for ContentMatcher {
    fn find(&self, path: &Path, key: &str) -> SearchResult<Option<MatchBuffer>> {
        trace!("Scanning contents of {}", path.display());
        let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
        let reader = BufReader::with_capacity(BUFFER_CAPACITY, file);

        let hits = self.match_reader(reader, path, key)?;
        Ok((!hits.is_empty()).then_some(MatchBuffer::Lines(hits)))
    }
}

/// Looks for the key in a path's final segment
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatcher;

impl NameMatcher {
    /// Highlights the first occurrence of `key` in `name`. No windowing or
    /// length cap is applied.
    pub fn match_name(name: &str, key: &str) -> Option<Highlighted> {
        if key.is_empty() {
            return None;
        }
        let start = name.find(key)?;
        Some(Highlighted::new(name, Some(start..start + key.len())))
    }
}

impl Matcher for NameMatcher {
    fn find(&self, path: &Path, key: &str) -> SearchResult<Option<MatchBuffer>> {
        let Some(name) = path.file_name() else {
            return Ok(None);
        };
        Ok(Self::match_name(&name.to_string_lossy(), key).map(MatchBuffer::Name))
    }
}

/// The matcher selected for a run
#[derive(Debug, Clone, Copy)]
pub enum MatchStrategy {
    Contents(ContentMatcher),
    Filenames(NameMatcher),
}

impl MatchStrategy {
    pub fn new(mode: SearchMode, encoding_mode: EncodingMode) -> Self {
        match mode {
            SearchMode::Contents => MatchStrategy::Contents(ContentMatcher::new(encoding_mode)),
            SearchMode::Filenames => MatchStrategy::Filenames(NameMatcher),
        }
    }
}

impl Matcher for MatchStrategy {
    fn find(&self, path: &Path, key: &str) -> SearchResult<Option<MatchBuffer>> {
        match self {
            MatchStrategy::Contents(m) => m.find(path, key),
            MatchStrategy::Filenames(m) => m.find(path, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn scan(content: &[u8], key: &str) -> SearchResult<Vec<LineHit>> {
        ContentMatcher::default().match_reader(Cursor::new(content), Path::new("mem.txt"), key)
    }

    #[test]
    fn test_match_line_basic() {
        let hit = ContentMatcher::match_line("hello world", 1, "world").unwrap();
        assert_eq!(hit.line_number, 1);
        assert_eq!(hit.column, 7);
        assert_eq!(hit.fragment.text, "hello world");
        assert_eq!(hit.fragment.emphasised(), Some("world"));
        assert_eq!(hit.to_string(), "Line 1, Column 7: hello world\n");

        assert!(ContentMatcher::match_line("hello world", 1, "moon").is_none());
    }

    #[test]
    fn test_column_counts_leading_whitespace() {
        let hit = ContentMatcher::match_line("    let key = 1;", 3, "key").unwrap();
        assert_eq!(hit.column, 9);
        // The fragment is built from the trimmed line
        assert_eq!(hit.fragment.text, "let key = 1;");
        assert_eq!(hit.fragment.emphasis, Some(4..7));
    }

    #[test]
    fn test_column_is_in_characters() {
        let hit = ContentMatcher::match_line("héllo wörld", 1, "wörld").unwrap();
        assert_eq!(hit.column, 7);
        assert_eq!(hit.fragment.emphasised(), Some("wörld"));
    }

    #[test]
    fn test_only_first_occurrence_is_emphasised() {
        let hit = ContentMatcher::match_line("aaaa", 1, "aa").unwrap();
        assert_eq!(hit.fragment.emphasis, Some(0..2));

        let hit = ContentMatcher::match_line("foo bar foo", 1, "foo").unwrap();
        assert_eq!(hit.fragment.parts(), ("", "foo", " bar foo"));
    }

    #[test]
    fn test_window_keeps_lookback() {
        let line = format!("{}needle tail", "x".repeat(30));
        let hit = ContentMatcher::match_line(&line, 1, "needle").unwrap();
        assert_eq!(hit.column, 31);

        let (before, key, _) = hit.fragment.parts();
        assert_eq!(before.chars().count(), CONTEXT_LOOKBACK);
        assert_eq!(key, "needle");
    }

    #[test]
    fn test_window_not_applied_at_lookback_boundary() {
        let line = format!("{}needle", "y".repeat(CONTEXT_LOOKBACK));
        let hit = ContentMatcher::match_line(&line, 1, "needle").unwrap();
        assert_eq!(hit.fragment.text, line);
        assert_eq!(hit.fragment.emphasis, Some(20..26));
    }

    #[test]
    fn test_fragment_capped_at_max_len() {
        let line = format!("needle {}", "z".repeat(100));
        let hit = ContentMatcher::match_line(&line, 1, "needle").unwrap();
        assert_eq!(hit.fragment.text.chars().count(), HIGHLIGHT_MAX_LEN);
        assert!(hit.fragment.text.starts_with("needle"));
    }

    #[test]
    fn test_cap_clips_long_emphasis() {
        let key = "k".repeat(30);
        let line = format!("{}{}", "p".repeat(25), key);
        let hit = ContentMatcher::match_line(&line, 1, &key).unwrap();

        assert_eq!(hit.fragment.text.chars().count(), HIGHLIGHT_MAX_LEN);
        let (before, emphasised, after) = hit.fragment.parts();
        assert_eq!(before.len(), CONTEXT_LOOKBACK);
        assert_eq!(emphasised.len(), HIGHLIGHT_MAX_LEN - CONTEXT_LOOKBACK);
        assert!(after.is_empty());
    }

    #[test]
    fn test_fragment_never_exceeds_cap() {
        for prefix in 0..60 {
            for suffix in [0, 10, 50] {
                let line = format!("{}KEY{}", "a".repeat(prefix), "b".repeat(suffix));
                let hit = ContentMatcher::match_line(&line, 1, "KEY").unwrap();
                assert!(hit.fragment.text.chars().count() <= HIGHLIGHT_MAX_LEN);
                assert_eq!(hit.fragment.emphasised(), Some("KEY"));
            }
        }
    }

    #[test]
    fn test_key_with_whitespace_outside_trimmed_line() {
        let hit = ContentMatcher::match_line("value ", 1, "e ").unwrap();
        assert_eq!(hit.column, 5);
        assert_eq!(hit.fragment.text, "value");
        assert_eq!(hit.fragment.emphasis, None);
    }

    #[test]
    fn test_match_reader_line_order() {
        let hits = scan(b"one key\ntwo\r\nthree key\n\nkey", "key").unwrap();
        let lines: Vec<usize> = hits.iter().map(|h| h.line_number).collect();
        assert_eq!(lines, vec![1, 3, 5]);
        assert_eq!(hits[2].column, 1);
    }

    #[test]
    fn test_match_reader_splits_on_lone_carriage_return() {
        let hits = scan(b"key\rnone\rkey here\r\nlast key\r", "key").unwrap();
        let lines: Vec<usize> = hits.iter().map(|h| h.line_number).collect();
        assert_eq!(lines, vec![1, 3, 4]);
        assert_eq!(hits[1].fragment.text, "key here");
        assert_eq!(hits[2].column, 6);

        // "\r\r\n" is a lone CR followed by a CRLF: two line endings
        let hits = scan(b"a\r\r\nkey\n", "key").unwrap();
        assert_eq!(hits[0].line_number, 3);
    }

    #[test]
    fn test_match_reader_rejects_invalid_utf8() {
        let result = scan(b"fine key\n\xff\xfe key\n", "key");
        assert!(matches!(
            result,
            Err(SearchError::EncodingError { line: 2, .. })
        ));
    }

    #[test]
    fn test_match_reader_lossy() {
        let matcher = ContentMatcher::new(EncodingMode::Lossy);
        let hits = matcher
            .match_reader(
                Cursor::new(&b"fine key\n\xff key\n"[..]),
                Path::new("mem.txt"),
                "key",
            )
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].fragment.text, "\u{FFFD} key");
    }

    #[test]
    fn test_content_find_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello world\nnothing\nworld again\n").unwrap();

        let buffer = ContentMatcher::default().find(&path, "world").unwrap().unwrap();
        assert_eq!(
            buffer.to_string(),
            "Line 1, Column 7: hello world\nLine 3, Column 1: world again\n"
        );

        assert!(ContentMatcher::default().find(&path, "moon").unwrap().is_none());
    }

    #[test]
    fn test_content_find_missing_file() {
        let result = ContentMatcher::default().find(Path::new("/no/such/file.txt"), "x");
        assert!(matches!(result, Err(SearchError::FileNotFound(_))));
    }

    #[test]
    fn test_match_name() {
        let h = NameMatcher::match_name("foobar.txt", "bar").unwrap();
        assert_eq!(h.parts(), ("foo", "bar", ".txt"));
        assert!(NameMatcher::match_name("foobar.txt", "baz").is_none());

        let long = format!("{}match.txt", "n".repeat(80));
        let h = NameMatcher::match_name(&long, "match").unwrap();
        assert_eq!(h.text, long);
    }

    #[test]
    fn test_name_find_uses_base_name_only() {
        let path = Path::new("foo/dir/readme.md");
        assert!(NameMatcher.find(path, "foo").unwrap().is_none());

        let buffer = NameMatcher.find(path, "read").unwrap().unwrap();
        assert_eq!(buffer.to_string(), "readme.md");
    }

    #[test]
    fn test_strategy_dispatch() {
        let strategy = MatchStrategy::new(SearchMode::Filenames, EncodingMode::FailFast);
        assert!(matches!(strategy, MatchStrategy::Filenames(_)));
        // Name matching never touches the file
        assert!(strategy
            .find(Path::new("missing/key.txt"), "key")
            .unwrap()
            .is_some());

        let strategy = MatchStrategy::new(SearchMode::Contents, EncodingMode::FailFast);
        assert!(matches!(strategy, MatchStrategy::Contents(_)));
        assert!(strategy.find(Path::new("missing/key.txt"), "key").is_err());
    }
}
