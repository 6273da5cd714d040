use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the sitepdf binary.
#[derive(Debug, Parser)]
#[command(
    name = "sitepdf",
    version,
    about = "Export the pages of a built static site to PDF"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "SITEPDF_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render the selected pages of the built site to PDF files.
    Export(Box<ExportArgs>),
}

impl Default for Command {
    fn default() -> Self {
        Self::Export(Box::default())
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub overrides: ExportOverrides,

    /// Print the planned jobs without starting a server or browser.
    #[arg(long = "dry-run", action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ExportOverrides {
    /// Export every known page instead of the configured paths.
    #[arg(
        long = "all-pages",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub all_pages: Option<bool>,

    /// Page path to export; repeat for several pages. Replaces configured paths.
    #[arg(long = "path", value_name = "PAGE")]
    pub paths: Vec<String>,

    /// Prefix prepended to every PDF file name.
    #[arg(long = "file-prefix", value_name = "PREFIX")]
    pub file_prefix: Option<String>,

    /// Directory receiving the PDFs, relative to the base directory.
    #[arg(long = "output-path", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub output_path: Option<PathBuf>,

    /// Maximum number of browsers running at once.
    #[arg(long = "concurrency", value_name = "COUNT")]
    pub concurrency: Option<u64>,

    /// Delay between consecutive job starts, in milliseconds.
    #[arg(long = "stagger-ms", value_name = "MILLIS")]
    pub stagger_ms: Option<u64>,

    /// Create missing parent directories of the output path.
    #[arg(
        long = "create-parent-dirs",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub create_parent_dirs: Option<bool>,

    /// Base directory every relative path is resolved against.
    #[arg(long = "site-base-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub site_base_dir: Option<PathBuf>,

    /// Built site directory served to the browser.
    #[arg(long = "site-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub site_directory: Option<PathBuf>,

    /// JSON manifest listing the known page paths.
    #[arg(long = "pages-manifest", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub pages_manifest: Option<PathBuf>,

    /// Chromium executable to launch.
    #[arg(long = "browser-executable", value_name = "PATH", value_hint = ValueHint::ExecutablePath)]
    pub browser_executable: Option<PathBuf>,

    /// Extra Chromium command-line argument; repeat for several.
    #[arg(long = "browser-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub browser_args: Vec<String>,

    /// Navigation timeout per page, in seconds.
    #[arg(long = "navigation-timeout-seconds", value_name = "SECONDS")]
    pub navigation_timeout_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}
