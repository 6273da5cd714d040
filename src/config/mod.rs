//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    env, io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::{
    application::export::{Pacing, PageSelection},
    domain::{
        export::{ExportTemplate, StyleInjection},
        pdf::{PdfLayout, PdfOptions},
    },
    infra::browser::DEFAULT_USER_AGENT,
};

pub use cli::{CliArgs, Command, ExportArgs, ExportOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "sitepdf";
const ENV_PREFIX: &str = "SITEPDF";
const DEFAULT_SITE_DIRECTORY: &str = "public";
const DEFAULT_OUTPUT_PATH: &str = "public/exports";
const DEFAULT_CONCURRENCY: u64 = 4;
const DEFAULT_STAGGER_MS: u64 = 1000;
const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NETWORK_IDLE_MS: u64 = 500;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub site: SiteSettings,
    pub export: ExportSettings,
    pub browser: BrowserSettings,
    pub logging: LoggingSettings,
}

/// Locations of the built site; every path is absolute.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub base_dir: PathBuf,
    pub directory: PathBuf,
    pub pages_manifest: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub selection: PageSelection,
    pub file_prefix: Option<String>,
    pub output_dir: PathBuf,
    pub pdf: PdfLayout,
    pub style: Option<StyleInjection>,
    pub concurrency: NonZeroUsize,
    pub stagger: Duration,
    pub create_parent_dirs: bool,
}

impl ExportSettings {
    pub fn template(&self) -> ExportTemplate {
        ExportTemplate {
            output_dir: self.output_dir.clone(),
            file_prefix: self.file_prefix.clone(),
            create_parent_dirs: self.create_parent_dirs,
            pdf: Arc::new(self.pdf.clone()),
            style: self.style.clone().map(Arc::new),
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            stagger: self.stagger,
            concurrency: self.concurrency,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    pub user_agent: String,
    pub navigation_timeout: Duration,
    pub network_idle: Duration,
    pub network_idle_max_inflight: usize,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("failed to read the working directory")]
    WorkingDir(#[source] io::Error),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("export.paths")
            .with_list_parse_key("browser.args"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Export(args)) => raw.apply_export_overrides(&args.overrides),
        None => raw.apply_export_overrides(&ExportOverrides::default()),
    }

    let cwd = env::current_dir().map_err(LoadError::WorkingDir)?;
    Settings::from_raw(raw, &cwd)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    site: RawSiteSettings,
    export: RawExportSettings,
    browser: RawBrowserSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_export_overrides(&mut self, overrides: &ExportOverrides) {
        if let Some(all_pages) = overrides.all_pages {
            self.export.all_pages = Some(all_pages);
        }
        if !overrides.paths.is_empty() {
            self.export.paths = Some(overrides.paths.clone());
        }
        if let Some(prefix) = overrides.file_prefix.as_ref() {
            self.export.file_prefix = Some(prefix.clone());
        }
        if let Some(path) = overrides.output_path.as_ref() {
            self.export.output_path = Some(path.clone());
        }
        if let Some(concurrency) = overrides.concurrency {
            self.export.concurrency = Some(concurrency);
        }
        if let Some(stagger) = overrides.stagger_ms {
            self.export.stagger_ms = Some(stagger);
        }
        if let Some(create) = overrides.create_parent_dirs {
            self.export.create_parent_dirs = Some(create);
        }
        if let Some(dir) = overrides.site_base_dir.as_ref() {
            self.site.base_dir = Some(dir.clone());
        }
        if let Some(dir) = overrides.site_directory.as_ref() {
            self.site.directory = Some(dir.clone());
        }
        if let Some(manifest) = overrides.pages_manifest.as_ref() {
            self.site.pages_manifest = Some(manifest.clone());
        }
        if let Some(executable) = overrides.browser_executable.as_ref() {
            self.browser.executable = Some(executable.clone());
        }
        if !overrides.browser_args.is_empty() {
            self.browser.args = Some(overrides.browser_args.clone());
        }
        if let Some(seconds) = overrides.navigation_timeout_seconds {
            self.browser.navigation_timeout_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    /// Validate raw settings, resolving relative paths against `cwd`.
    fn from_raw(raw: RawSettings, cwd: &Path) -> Result<Self, LoadError> {
        let RawSettings {
            site,
            export,
            browser,
            logging,
        } = raw;

        let site = build_site_settings(site, cwd)?;
        let export = build_export_settings(export, &site.base_dir)?;
        let browser = build_browser_settings(browser)?;
        let logging = build_logging_settings(logging)?;

        Ok(Self {
            site,
            export,
            browser,
            logging,
        })
    }
}

fn build_site_settings(site: RawSiteSettings, cwd: &Path) -> Result<SiteSettings, LoadError> {
    let base_dir = match site.base_dir {
        Some(dir) => resolve_path(cwd, dir),
        None => cwd.to_path_buf(),
    };
    let directory = resolve_path(
        &base_dir,
        site.directory
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SITE_DIRECTORY)),
    );
    let pages_manifest = site
        .pages_manifest
        .filter(|path| !path.as_os_str().is_empty())
        .map(|path| resolve_path(&base_dir, path))
        .ok_or_else(|| {
            LoadError::invalid(
                "site.pages_manifest",
                "path to the page manifest must be set",
            )
        })?;

    Ok(SiteSettings {
        base_dir,
        directory,
        pages_manifest,
    })
}

fn build_export_settings(
    export: RawExportSettings,
    base_dir: &Path,
) -> Result<ExportSettings, LoadError> {
    let selection = if export.all_pages.unwrap_or(false) {
        PageSelection::AllPages
    } else {
        match export.paths {
            Some(paths) if paths.is_empty() => {
                return Err(LoadError::invalid(
                    "export.paths",
                    "must list at least one page path",
                ));
            }
            Some(paths) => PageSelection::Explicit(paths),
            None => PageSelection::Explicit(Vec::new()),
        }
    };

    let file_prefix = match export.file_prefix {
        Some(prefix) if prefix.is_empty() => {
            return Err(LoadError::invalid("export.file_prefix", "must not be empty"));
        }
        Some(prefix) if prefix.contains(['/', '\\']) => {
            return Err(LoadError::invalid(
                "export.file_prefix",
                "must not contain path separators",
            ));
        }
        other => other,
    };

    let output_dir = resolve_path(
        base_dir,
        export
            .output_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
    );

    let pdf = export
        .pdf
        .unwrap_or_default()
        .resolve()
        .map_err(|err| LoadError::invalid("export.pdf", err.to_string()))?;

    let style = export
        .style_tag
        .map(|style| build_style_injection(style, base_dir))
        .transpose()?;

    let concurrency = non_zero_usize(
        export.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
        "export.concurrency",
    )?;
    let stagger = Duration::from_millis(export.stagger_ms.unwrap_or(DEFAULT_STAGGER_MS));

    Ok(ExportSettings {
        selection,
        file_prefix,
        output_dir,
        pdf,
        style,
        concurrency,
        stagger,
        create_parent_dirs: export.create_parent_dirs.unwrap_or(false),
    })
}

fn build_style_injection(
    style: RawStyleTagSettings,
    base_dir: &Path,
) -> Result<StyleInjection, LoadError> {
    const KEY: &str = "export.style_tag";

    match (style.url, style.path, style.content) {
        (Some(url), None, None) => Ok(StyleInjection::Url(url)),
        (None, Some(path), None) => Ok(StyleInjection::Path(resolve_path(base_dir, path))),
        (None, None, Some(content)) => Ok(StyleInjection::Content(content)),
        (None, None, None) => Err(LoadError::invalid(
            KEY,
            "set one of `url`, `path` or `content`",
        )),
        _ => Err(LoadError::invalid(
            KEY,
            "only one of `url`, `path` or `content` may be set",
        )),
    }
}

fn build_browser_settings(browser: RawBrowserSettings) -> Result<BrowserSettings, LoadError> {
    let navigation_secs = browser
        .navigation_timeout_seconds
        .unwrap_or(DEFAULT_NAVIGATION_TIMEOUT_SECS);
    if navigation_secs == 0 {
        return Err(LoadError::invalid(
            "browser.navigation_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let user_agent = match browser.user_agent {
        Some(agent) if agent.trim().is_empty() => {
            return Err(LoadError::invalid("browser.user_agent", "must not be empty"));
        }
        Some(agent) => agent,
        None => DEFAULT_USER_AGENT.to_string(),
    };

    let max_inflight = browser.network_idle_max_inflight.unwrap_or(0);
    let network_idle_max_inflight = usize::try_from(max_inflight).map_err(|_| {
        LoadError::invalid(
            "browser.network_idle_max_inflight",
            "value exceeds supported range",
        )
    })?;

    Ok(BrowserSettings {
        executable: browser.executable,
        args: browser.args.unwrap_or_default(),
        user_agent,
        navigation_timeout: Duration::from_secs(navigation_secs),
        network_idle: Duration::from_millis(
            browser.network_idle_ms.unwrap_or(DEFAULT_NETWORK_IDLE_MS),
        ),
        network_idle_max_inflight,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    base_dir: Option<PathBuf>,
    directory: Option<PathBuf>,
    pages_manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawExportSettings {
    all_pages: Option<bool>,
    paths: Option<Vec<String>>,
    file_prefix: Option<String>,
    output_path: Option<PathBuf>,
    pdf: Option<PdfOptions>,
    style_tag: Option<RawStyleTagSettings>,
    concurrency: Option<u64>,
    stagger_ms: Option<u64>,
    create_parent_dirs: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStyleTagSettings {
    url: Option<String>,
    path: Option<PathBuf>,
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBrowserSettings {
    executable: Option<PathBuf>,
    args: Option<Vec<String>>,
    user_agent: Option<String>,
    navigation_timeout_seconds: Option<u64>,
    network_idle_ms: Option<u64>,
    network_idle_max_inflight: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

/// `path` as is when absolute, otherwise joined onto `base`.
fn resolve_path(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
