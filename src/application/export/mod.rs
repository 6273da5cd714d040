//! Batch export of site pages to PDF.

mod report;
mod scheduler;
mod selection;

use thiserror::Error;

use crate::{
    domain::{
        export::{ExportJob, ExportTemplate},
        pages::PagePath,
    },
    infra::server::ServerError,
};

pub use report::{BatchReport, JobOutcome};
pub use scheduler::{ExportScheduler, Pacing, stagger_delay};
pub use selection::{PageSelection, SelectedPages, select_pages};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("{failed} of {total} export jobs failed")]
    JobsFailed { failed: usize, total: usize },
}

/// Jobs to run for one batch, plus the requested paths that were dropped.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub jobs: Vec<ExportJob>,
    pub skipped: Vec<String>,
}

impl ExportPlan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Select pages and number the resulting jobs.
pub fn plan_export(
    selection: &PageSelection,
    known: &[PagePath],
    template: &ExportTemplate,
) -> ExportPlan {
    let SelectedPages { pages, unknown } = select_pages(selection, known);
    ExportPlan {
        jobs: template.jobs(pages),
        skipped: unknown,
    }
}
