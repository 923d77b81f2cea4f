use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use findr::{ConfigOverrides, ConsoleReporter, EncodingMode, SearchConfig, SearchMode};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Exit status when the search is interrupted
const EXIT_CANCELLED: i32 = 1;

/// Exit status when a configuration file cannot be loaded
const EXIT_CONFIG: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "findr",
    author,
    version,
    about = "Recursively search file contents or file names for a string",
    long_about = None,
    after_help = "Options not given on the command line are read from \
        $CONFIG_DIR/findr/config.yaml, then ./.findr.yaml, then --config. \
        The search key is only taken from the command line."
)]
struct Cli {
    /// The string to search for
    key: Option<String>,

    /// The search mode (contents|filenames) [default: contents]
    #[arg(long)]
    mode: Option<String>,

    /// Maximum depth for recursive search [default: 999]
    #[arg(long, allow_negative_numbers = true)]
    max_depth: Option<i64>,

    /// Skip files and directories whose name starts with a dot
    #[arg(long)]
    skip_dotfiles: bool,

    /// Directory whose entries are searched [default: .]
    #[arg(long)]
    root: Option<PathBuf>,

    /// Configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// How to handle invalid UTF-8 in file contents (failfast|lossy) [default: failfast]
    #[arg(long)]
    encoding: Option<String>,

    /// Show log messages on screen
    #[arg(short, long)]
    verbose: bool,

    /// Activate debug logs
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    /// Values given on the command line, or `None` when the input only
    /// warrants the usage text
    fn overrides(&self) -> Option<ConfigOverrides> {
        let mode = match &self.mode {
            Some(mode) => Some(mode.parse::<SearchMode>().ok()?),
            None => None,
        };
        let encoding_mode = match &self.encoding {
            Some(encoding) => Some(encoding.parse::<EncodingMode>().ok()?),
            None => None,
        };

        Some(ConfigOverrides {
            key: self.key.clone(),
            mode,
            max_depth: self.max_depth,
            skip_dotfiles: self.skip_dotfiles,
            root_path: self.root.clone(),
            encoding_mode,
            log_level: None,
        })
    }

    fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            configured
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_usage() -> Result<()> {
    Cli::command().print_help()?;
    Ok(())
}

fn banner(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Contents => "Searching contents...",
        SearchMode::Filenames => "Searching filenames...",
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red(), e);
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let Some(overrides) = cli.overrides() else {
        print_usage()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config = SearchConfig::load_from(cli.config.as_deref())?.merge_with_cli(overrides);
    if config.key.is_empty() {
        print_usage()?;
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(cli.log_level(&config.log_level));
    debug!("Resolved configuration: {:?}", config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(search(config))
}

/// Resolves on Ctrl-C. The handler is in place once this returns, so an
/// interrupt arriving before the first poll is not lost.
#[cfg(unix)]
fn interrupt() -> io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    Ok(async move {
        sigint.recv().await;
    })
}

#[cfg(not(unix))]
fn interrupt() -> io::Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
}

/// Runs the traversal on a blocking worker while waiting for Ctrl-C
async fn search(config: SearchConfig) -> Result<ExitCode> {
    let mode = config.mode;
    let interrupted = interrupt()?;
    println!("\n{}", banner(mode).green());
    println!();

    let start = Instant::now();
    let task = tokio::task::spawn_blocking(move || {
        let mut reporter = ConsoleReporter::stdout(config.mode);
        findr::search(&config, &mut reporter)
    });

    tokio::select! {
        joined = task => {
            let stats = joined??;
            debug!("Traversal finished: {:?}", stats);

            let elapsed = start.elapsed().as_secs_f64();
            println!(
                "\n{}",
                format!("Search completed in {:.5} seconds", elapsed).green()
            );
            if mode == SearchMode::Filenames {
                println!();
            }
            Ok(ExitCode::SUCCESS)
        }
        () = interrupted => {
            warn!("Search interrupted");
            println!("\n{}\n", "Cancelled".red());
            // The blocking worker cannot be stopped, so leave without waiting for it
            std::process::exit(EXIT_CANCELLED);
        }
    }
}
