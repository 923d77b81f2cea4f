//! Result types produced by the matchers.
//!
//! Highlighting is kept out of band: a [`Highlighted`] value stores the visible
//! text together with the byte range that should be emphasised. Truncation and
//! context windows therefore operate on what the user actually sees, and the
//! colouring is applied only by a [`crate::report::Reporter`] at print time.
//!
//! ```rust,ignore
//! let hit = LineHit { line_number: 1, column: 7, fragment: Highlighted::new("hello world", Some(6..11)) };
//! assert_eq!(hit.to_string(), "Line 1, Column 7: hello world\n");
//! ```

use std::fmt;
use std::ops::Range;

use crate::metrics::TraversalStats;

/// Text with an optional emphasised span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    /// The visible text
    pub text: String,
    /// Byte range of `text` to emphasise
    pub emphasis: Option<Range<usize>>,
}

impl Highlighted {
    pub fn new(text: impl Into<String>, emphasis: Option<Range<usize>>) -> Self {
        Self {
            text: text.into(),
            emphasis,
        }
    }

    /// Text with no emphasis at all
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, None)
    }

    /// The emphasised slice, if any
    pub fn emphasised(&self) -> Option<&str> {
        self.emphasis.clone().map(|r| &self.text[r])
    }

    /// Splits the text into `(before, emphasised, after)`
    pub fn parts(&self) -> (&str, &str, &str) {
        match &self.emphasis {
            Some(r) => (
                &self.text[..r.start],
                &self.text[r.clone()],
                &self.text[r.end..],
            ),
            None => (self.text.as_str(), "", ""),
        }
    }

    /// Renders the text, passing the emphasised span through `emphasise`
    pub fn render_with(&self, emphasise: impl Fn(&str) -> String) -> String {
        let (before, key, after) = self.parts();
        if key.is_empty() {
            return self.text.clone();
        }
        format!("{}{}{}", before, emphasise(key), after)
    }
}

impl fmt::Display for Highlighted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A single matching line inside a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineHit {
    /// 1-indexed line number
    pub line_number: usize,
    /// 1-indexed character column of the first occurrence in the raw line
    pub column: usize,
    /// Display fragment of the line, already windowed and capped
    pub fragment: Highlighted,
}

impl LineHit {
    /// The `Line <n>, Column <c>:` tag
    pub fn location(&self) -> String {
        format!("Line {}, Column {}:", self.line_number, self.column)
    }
}

impl fmt::Display for LineHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.location(), self.fragment)
    }
}

/// What a matcher found in one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchBuffer {
    /// Matching lines of a file, in ascending line order
    Lines(Vec<LineHit>),
    /// The highlighted base name of a file
    Name(Highlighted),
}

impl MatchBuffer {
    pub fn is_empty(&self) -> bool {
        match self {
            MatchBuffer::Lines(hits) => hits.is_empty(),
            MatchBuffer::Name(name) => name.text.is_empty(),
        }
    }

    /// Number of matched lines, or 1 for a name match
    pub fn match_count(&self) -> usize {
        match self {
            MatchBuffer::Lines(hits) => hits.len(),
            MatchBuffer::Name(_) => 1,
        }
    }
}

impl fmt::Display for MatchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchBuffer::Lines(hits) => hits.iter().try_for_each(|hit| write!(f, "{}", hit)),
            MatchBuffer::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A reported match: where it was found and what was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub display_name: String,
    pub buffer: MatchBuffer,
}

/// Everything a collected search produced
#[derive(Debug, Clone, Default)]
pub struct SearchOutput {
    /// Reports in traversal order
    pub reports: Vec<Report>,
    pub stats: TraversalStats,
}
