//! Headless Chromium renderer.

mod idle;
mod print;
mod session;
mod style;

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

pub use idle::IdlePolicy;

use crate::{
    application::render::{PdfRenderer, RenderError, page_url},
    config::BrowserSettings,
    domain::export::ExportJob,
};

use session::BrowserSession;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36";

pub(crate) const VIEWPORT_WIDTH: u32 = 1920;
pub(crate) const VIEWPORT_HEIGHT: u32 = 1080;

pub(crate) const LAUNCH_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--allow-file-access-from-files",
    "--enable-local-file-accesses",
    "--start-maximized",
];

#[derive(Debug, Clone)]
pub struct ChromeConfig {
    pub executable: Option<PathBuf>,
    pub extra_args: Vec<String>,
    pub user_agent: String,
    pub navigation_timeout: Duration,
    pub idle: IdlePolicy,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            executable: None,
            extra_args: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout: Duration::from_secs(30),
            idle: IdlePolicy::default(),
        }
    }
}

impl From<&BrowserSettings> for ChromeConfig {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            executable: settings.executable.clone(),
            extra_args: settings.args.clone(),
            user_agent: settings.user_agent.clone(),
            navigation_timeout: settings.navigation_timeout,
            idle: IdlePolicy {
                quiet_period: settings.network_idle,
                max_inflight: settings.network_idle_max_inflight,
            },
        }
    }
}

/// Launches a fresh browser for every job and closes it before returning.
#[derive(Debug, Clone, Default)]
pub struct ChromeRenderer {
    config: ChromeConfig,
}

impl ChromeRenderer {
    pub fn new(config: ChromeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PdfRenderer for ChromeRenderer {
    async fn render_to_pdf(&self, base_url: &Url, job: &ExportJob) -> Result<(), RenderError> {
        let url =
            page_url(base_url, &job.page).map_err(|err| RenderError::navigation(base_url, err))?;

        let mut session = BrowserSession::launch(&self.config).await?;
        debug!(
            target = "sitepdf::infra::browser",
            page = %job.page,
            url = %url,
            "browser launched"
        );

        let captured = session.capture(&url, job, &self.config).await;
        let closed = session.close().await;

        match (captured, closed) {
            (Err(err), Err(close_err)) => {
                warn!(
                    target = "sitepdf::infra::browser",
                    page = %job.page,
                    error = %close_err,
                    "browser did not close cleanly after a failed capture"
                );
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), closed) => closed,
        }
    }
}
