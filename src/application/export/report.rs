use std::path::PathBuf;

use crate::{
    application::{error::ErrorReport, render::RenderError},
    domain::pages::PagePath,
};

use super::ExportError;

/// Settled result of one export job.
#[derive(Debug)]
pub struct JobOutcome {
    pub page: PagePath,
    pub ordinal: usize,
    pub result: Result<PathBuf, RenderError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn artifact(&self) -> Option<&PathBuf> {
        self.result.as_ref().ok()
    }

    pub fn error_report(&self) -> Option<ErrorReport> {
        self.result
            .as_ref()
            .err()
            .map(|err| ErrorReport::from_error("application::export::job", err))
    }
}

/// Per-job outcomes of a batch, in job order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
    /// Explicit paths skipped because they are not known pages.
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn new(mut outcomes: Vec<JobOutcome>, skipped: Vec<String>) -> Self {
        outcomes.sort_by_key(|outcome| outcome.ordinal);
        Self { outcomes, skipped }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn artifacts(&self) -> Vec<&PathBuf> {
        self.outcomes.iter().filter_map(JobOutcome::artifact).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Fail the batch as a whole when any job failed.
    pub fn into_result(self) -> Result<Self, ExportError> {
        let failed = self.failed_count();
        if failed == 0 {
            Ok(self)
        } else {
            Err(ExportError::JobsFailed {
                failed,
                total: self.total(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(page: &str, ordinal: usize, ok: bool) -> JobOutcome {
        let result = if ok {
            Ok(PathBuf::from(format!("/out/{ordinal}.pdf")))
        } else {
            Err(RenderError::aborted("boom"))
        };
        JobOutcome {
            page: PagePath::from(page),
            ordinal,
            result,
        }
    }

    #[test]
    fn outcomes_are_kept_in_job_order() {
        let report = BatchReport::new(
            vec![outcome("/b/", 1, true), outcome("/", 0, true)],
            Vec::new(),
        );
        let ordinals: Vec<_> = report.outcomes.iter().map(|o| o.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
        assert!(report.is_success());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn any_failure_fails_the_batch() {
        let report = BatchReport::new(
            vec![outcome("/", 0, true), outcome("/b/", 1, false)],
            Vec::new(),
        );
        assert_eq!(report.artifacts().len(), 1);
        let exported: Vec<_> = report.succeeded().map(|o| o.page.as_str()).collect();
        assert_eq!(exported, vec!["/"]);
        let failure = report.failed().next().and_then(JobOutcome::error_report);
        assert_eq!(
            failure.map(|report| report.to_string()),
            Some("job stopped before rendering: boom".to_string())
        );
        assert!(matches!(
            report.into_result(),
            Err(ExportError::JobsFailed { failed: 1, total: 2 })
        ));
    }
}
