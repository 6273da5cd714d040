//! Runs a batch of export jobs against one static server.

use std::{
    io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use metrics::{counter, gauge, histogram};
use tokio::{
    fs,
    sync::Semaphore,
    time::{Instant, sleep},
};
use tracing::{debug, error, info};
use url::Url;

use crate::{
    application::render::{PdfRenderer, RenderError},
    domain::export::ExportJob,
    infra::server::with_server,
};

use super::{BatchReport, ExportError, ExportPlan, JobOutcome};

const DEFAULT_STAGGER: Duration = Duration::from_millis(1000);
const DEFAULT_CONCURRENCY: usize = 4;

/// How job starts are spread out over a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Job `i` waits `i * stagger` after the batch starts.
    pub stagger: Duration,
    /// Maximum number of jobs holding a browser at once.
    pub concurrency: NonZeroUsize,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            stagger: DEFAULT_STAGGER,
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Delay before the job with `ordinal` may start.
pub fn stagger_delay(unit: Duration, ordinal: usize) -> Duration {
    unit.saturating_mul(u32::try_from(ordinal).unwrap_or(u32::MAX))
}

/// Schedules export jobs onto a renderer, one server per batch.
pub struct ExportScheduler<R> {
    renderer: Arc<R>,
    pacing: Pacing,
}

impl<R> ExportScheduler<R>
where
    R: PdfRenderer + 'static,
{
    pub fn new(renderer: Arc<R>, pacing: Pacing) -> Self {
        Self { renderer, pacing }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Run a planned batch. An empty plan completes without starting a server.
    pub async fn run_plan(
        &self,
        site_dir: &Path,
        plan: ExportPlan,
    ) -> Result<BatchReport, ExportError> {
        let ExportPlan { jobs, skipped } = plan;
        if jobs.is_empty() {
            info!(
                target = "sitepdf::export",
                op = "export::batch",
                skipped = skipped.len(),
                "No pages selected for export"
            );
            return Ok(BatchReport::new(Vec::new(), skipped));
        }

        let report = self.run_batch(site_dir, jobs).await?;
        Ok(BatchReport::new(report.outcomes, skipped))
    }

    /// Serve `site_dir` and render every job, waiting for all of them to settle.
    pub async fn run_batch(
        &self,
        site_dir: &Path,
        jobs: Vec<ExportJob>,
    ) -> Result<BatchReport, ExportError> {
        with_server(site_dir, |base_url| self.run_jobs(base_url, jobs)).await
    }

    async fn run_jobs(
        &self,
        base_url: Url,
        jobs: Vec<ExportJob>,
    ) -> Result<BatchReport, ExportError> {
        let batch_start = Instant::now();
        let permits = Arc::new(Semaphore::new(self.pacing.concurrency.get()));
        let total = jobs.len();

        info!(
            target = "sitepdf::export",
            op = "export::batch",
            jobs = total,
            base_url = %base_url,
            concurrency = self.pacing.concurrency.get(),
            stagger_ms = self.pacing.stagger.as_millis() as u64,
            "Starting PDF export"
        );

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let page = job.page.clone();
                let ordinal = job.ordinal;
                let delay = stagger_delay(self.pacing.stagger, ordinal);
                let handle = tokio::spawn(run_job(
                    Arc::clone(&self.renderer),
                    base_url.clone(),
                    Arc::clone(&permits),
                    batch_start + delay,
                    job,
                ));
                (page, ordinal, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(total);
        for (page, ordinal, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(
                        target = "sitepdf::export",
                        op = "export::job",
                        page = %page,
                        error = %err,
                        "Export job task did not complete"
                    );
                    counter!("sitepdf_export_jobs_total", "result" => "failure").increment(1);
                    JobOutcome {
                        page,
                        ordinal,
                        result: Err(RenderError::aborted(err.to_string())),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = BatchReport::new(outcomes, Vec::new());
        info!(
            target = "sitepdf::export",
            op = "export::batch",
            total = report.total(),
            failed = report.failed_count(),
            elapsed_ms = batch_start.elapsed().as_millis() as u64,
            "PDF export finished"
        );
        Ok(report)
    }
}

async fn run_job<R>(
    renderer: Arc<R>,
    base_url: Url,
    permits: Arc<Semaphore>,
    not_before: Instant,
    job: ExportJob,
) -> JobOutcome
where
    R: PdfRenderer + ?Sized,
{
    sleep(not_before.saturating_duration_since(Instant::now())).await;

    let result = match permits.acquire_owned().await {
        Ok(_permit) => {
            gauge!("sitepdf_export_inflight_jobs").increment(1.0);
            let started = Instant::now();
            debug!(
                target = "sitepdf::export",
                op = "export::job",
                page = %job.page,
                ordinal = job.ordinal,
                "Export job started"
            );

            let result = render_job(renderer.as_ref(), &base_url, &job).await;

            gauge!("sitepdf_export_inflight_jobs").decrement(1.0);
            histogram!("sitepdf_export_render_ms")
                .record(started.elapsed().as_secs_f64() * 1000.0);
            result
        }
        Err(err) => Err(RenderError::aborted(err.to_string())),
    };

    match &result {
        Ok(path) => {
            counter!("sitepdf_export_jobs_total", "result" => "success").increment(1);
            info!(
                target = "sitepdf::export",
                op = "export::job",
                result = "success",
                page = %job.page,
                artifact = %path.display(),
                "Exported page to PDF"
            );
        }
        Err(err) => {
            counter!("sitepdf_export_jobs_total", "result" => "failure").increment(1);
            error!(
                target = "sitepdf::export",
                op = "export::job",
                result = "failure",
                page = %job.page,
                error = %err,
                "Failed to export page to PDF"
            );
        }
    }

    JobOutcome {
        page: job.page,
        ordinal: job.ordinal,
        result,
    }
}

async fn render_job<R>(
    renderer: &R,
    base_url: &Url,
    job: &ExportJob,
) -> Result<PathBuf, RenderError>
where
    R: PdfRenderer + ?Sized,
{
    ensure_output_dir(job.output_dir(), job.create_parent_dirs).await?;
    renderer.render_to_pdf(base_url, job).await?;
    Ok(job.artifact_path())
}

/// Create the output directory; only its last component unless `recursive`.
async fn ensure_output_dir(dir: &Path, recursive: bool) -> Result<(), RenderError> {
    let created = if recursive {
        fs::create_dir_all(dir).await
    } else {
        fs::create_dir(dir).await
    };

    match created {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && is_dir(dir).await => Ok(()),
        Err(source) => Err(RenderError::OutputDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}
