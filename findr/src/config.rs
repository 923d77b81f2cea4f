use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{SearchError, SearchResult};

/// Depth used when nothing else is configured. Deep enough to be unbounded in
/// practice while still capping recursion.
pub const DEFAULT_MAX_DEPTH: i64 = 999;

/// What the search key is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Look for the key inside each file's lines
    #[default]
    Contents,
    /// Look for the key in each file's base name
    Filenames,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Contents => "contents",
            SearchMode::Filenames => "filenames",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contents" => Ok(SearchMode::Contents),
            "filenames" => Ok(SearchMode::Filenames),
            other => Err(SearchError::config_error(format!(
                "Unknown mode '{}', expected 'contents' or 'filenames'",
                other
            ))),
        }
    }
}

/// How to treat file contents that are not valid UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Invalid UTF-8 is an error and the file is skipped
    #[default]
    FailFast,
    /// Invalid sequences are replaced with U+FFFD
    Lossy,
}

impl FromStr for EncodingMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "failfast" => Ok(EncodingMode::FailFast),
            "lossy" => Ok(EncodingMode::Lossy),
            other => Err(SearchError::config_error(format!(
                "Unknown encoding mode '{}', expected 'failfast' or 'lossy'",
                other
            ))),
        }
    }
}

/// Configuration for a findr run.
///
/// # Configuration Locations
///
/// Values are read from these files, later ones overriding earlier ones:
/// 1. Global `$HOME/.config/findr/config.yaml`
/// 2. Local `.findr.yaml` in the current directory
/// 3. Custom config file given with `--config`
///
/// Command-line values are applied last through [`SearchConfig::merge_with_cli`].
/// The search key is never read from a file; it only comes from the command
/// line.
///
/// # Configuration Format
///
/// ```yaml
/// # contents | filenames
/// mode: "filenames"
///
/// # Directory levels to descend into
/// max_depth: 8
///
/// # Prune entries whose name starts with '.'
/// skip_dotfiles: true
///
/// # failfast | lossy
/// encoding_mode: "lossy"
///
/// # trace, debug, info, warn, error
/// log_level: "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Literal text to look for
    #[serde(skip)]
    pub key: String,

    #[serde(default)]
    pub mode: SearchMode,

    /// Number of directory levels the traversal may visit. Zero or less
    /// visits nothing.
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,

    /// Skip entries whose base name starts with a dot, including everything
    /// below hidden directories
    #[serde(default)]
    pub skip_dotfiles: bool,

    /// Directory whose entries are searched
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_depth() -> i64 {
    DEFAULT_MAX_DEPTH
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            mode: SearchMode::default(),
            max_depth: default_max_depth(),
            skip_dotfiles: false,
            root_path: default_root_path(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations plus an optional
    /// explicit file, which must exist
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("findr/config.yaml")),
            Some(PathBuf::from(".findr.yaml")),
        ];

        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Applies every value given on the command line over the file values
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if let Some(key) = cli.key {
            self.key = key;
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if let Some(max_depth) = cli.max_depth {
            self.max_depth = max_depth;
        }
        if cli.skip_dotfiles {
            self.skip_dotfiles = true;
        }
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if let Some(encoding_mode) = cli.encoding_mode {
            self.encoding_mode = encoding_mode;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// Validates the configuration into an immutable request
    pub fn request(&self) -> SearchResult<SearchRequest> {
        SearchRequest::new(
            self.root_path.clone(),
            self.key.clone(),
            self.max_depth,
            self.skip_dotfiles,
        )
    }
}

/// Values given explicitly on the command line. `None` leaves the file value
/// (or the default) in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub key: Option<String>,
    pub mode: Option<SearchMode>,
    pub max_depth: Option<i64>,
    /// A flag can only switch pruning on
    pub skip_dotfiles: bool,
    pub root_path: Option<PathBuf>,
    pub encoding_mode: Option<EncodingMode>,
    pub log_level: Option<String>,
}

/// The validated, read-only input of a single traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    root: PathBuf,
    key: String,
    max_depth: i64,
    skip_hidden: bool,
}

impl SearchRequest {
    pub fn new(
        root: impl Into<PathBuf>,
        key: impl Into<String>,
        max_depth: i64,
        skip_hidden: bool,
    ) -> SearchResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(SearchError::config_error("Search key must not be empty"));
        }
        Ok(Self {
            root: root.into(),
            key,
            max_depth,
            skip_hidden,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn max_depth(&self) -> i64 {
        self.max_depth
    }

    pub fn skip_hidden(&self) -> bool {
        self.skip_hidden
    }
}
