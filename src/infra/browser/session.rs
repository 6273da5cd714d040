//! One headless Chromium process, scoped to a single export job.

use chromiumoxide::{
    Browser, BrowserConfig, Page,
    cdp::browser_protocol::{
        emulation::{SetDeviceMetricsOverrideParams, SetEmulatedMediaParams},
        network::{
            EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
            SetUserAgentOverrideParams,
        },
    },
};
use futures::{StreamExt, stream};
use tempfile::TempDir;
use tokio::{fs, task::JoinHandle, time::timeout};
use tracing::debug;
use url::Url;

use crate::{application::render::RenderError, domain::export::ExportJob};

use super::{
    ChromeConfig, LAUNCH_ARGS, VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
    idle::{IdleOutcome, NetworkActivity, wait_for_network_idle},
    print::print_params,
    style::inject_style,
};

pub(crate) struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    _profile: TempDir,
}

impl BrowserSession {
    pub(crate) async fn launch(config: &ChromeConfig) -> Result<Self, RenderError> {
        let profile = TempDir::new().map_err(RenderError::launch)?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .user_data_dir(profile.path())
            .args(LAUNCH_ARGS.iter().copied())
            .args(config.extra_args.iter().cloned());
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        let browser_config = builder.build().map_err(RenderError::launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(RenderError::launch)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(
                        target = "sitepdf::infra::browser",
                        error = %err,
                        "browser handler reported an error"
                    );
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            _profile: profile,
        })
    }

    /// Load `url`, apply the job's styling and write its PDF.
    pub(crate) async fn capture(
        &self,
        url: &Url,
        job: &ExportJob,
        config: &ChromeConfig,
    ) -> Result<(), RenderError> {
        let page = self.prepare_page(config).await?;

        let activity = network_activity(&page).await?;
        let loaded = timeout(config.navigation_timeout, async {
            page.goto(url.as_str())
                .await
                .map_err(|err| RenderError::navigation(url, err))?;
            Ok::<_, RenderError>(wait_for_network_idle(activity, config.idle).await)
        })
        .await
        .map_err(|_| RenderError::NavigationTimeout {
            url: url.to_string(),
            timeout: config.navigation_timeout,
        })??;
        if loaded == IdleOutcome::Closed {
            debug!(
                target = "sitepdf::infra::browser",
                url = %url,
                "network events ended before idle"
            );
        }

        if let Some(style) = job.style.as_deref() {
            inject_style(&page, style).await?;
        }

        let pdf = page
            .pdf(print_params(&job.pdf))
            .await
            .map_err(RenderError::capture)?;
        let path = job.artifact_path();
        fs::write(&path, pdf)
            .await
            .map_err(|source| RenderError::Write { path, source })?;
        Ok(())
    }

    /// Shut the browser process down and stop its event handler.
    pub(crate) async fn close(&mut self) -> Result<(), RenderError> {
        let closed = self.browser.close().await.map_err(RenderError::close);
        if closed.is_ok() {
            self.browser.wait().await.map_err(RenderError::close)?;
        }
        self.handler.abort();
        closed.map(|_| ())
    }

    async fn prepare_page(&self, config: &ChromeConfig) -> Result<Page, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(RenderError::page_setup)?;
        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(VIEWPORT_WIDTH),
            i64::from(VIEWPORT_HEIGHT),
            1.0,
            false,
        ))
        .await
        .map_err(RenderError::page_setup)?;
        page.execute(SetUserAgentOverrideParams::new(config.user_agent.clone()))
            .await
            .map_err(RenderError::page_setup)?;
        page.execute(SetEmulatedMediaParams {
            media: Some("screen".to_string()),
            ..Default::default()
        })
        .await
        .map_err(RenderError::page_setup)?;
        Ok(page)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

async fn network_activity(
    page: &Page,
) -> Result<impl futures::Stream<Item = NetworkActivity> + use<>, RenderError> {
    let started = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(RenderError::page_setup)?
        .map(|event| NetworkActivity::Started(event.request_id.inner().clone()));
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .map_err(RenderError::page_setup)?
        .map(|event| NetworkActivity::Finished(event.request_id.inner().clone()));
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .map_err(RenderError::page_setup)?
        .map(|event| NetworkActivity::Finished(event.request_id.inner().clone()));

    Ok(stream::select(started, stream::select(finished, failed)))
}
