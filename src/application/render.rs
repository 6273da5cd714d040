//! The rendering seam between the scheduler and a headless browser.

use std::{error::Error as StdError, io, path::PathBuf, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::domain::{export::ExportJob, pages::PagePath};

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Failure of a single export job.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch browser")]
    Launch {
        #[source]
        source: BoxError,
    },
    #[error("failed to prepare browser page")]
    PageSetup {
        #[source]
        source: BoxError,
    },
    #[error("navigation to `{url}` failed")]
    Navigation {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("navigation to `{url}` did not settle within {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },
    #[error("failed to inject stylesheet")]
    StyleInjection {
        #[source]
        source: BoxError,
    },
    #[error("failed to capture pdf")]
    Capture {
        #[source]
        source: BoxError,
    },
    #[error("failed to create output directory `{}`", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to close browser")]
    Close {
        #[source]
        source: BoxError,
    },
    #[error("job stopped before rendering: {reason}")]
    Aborted { reason: String },
}

impl RenderError {
    pub fn launch(source: impl Into<BoxError>) -> Self {
        Self::Launch {
            source: source.into(),
        }
    }

    pub fn page_setup(source: impl Into<BoxError>) -> Self {
        Self::PageSetup {
            source: source.into(),
        }
    }

    pub fn navigation(url: &Url, source: impl Into<BoxError>) -> Self {
        Self::Navigation {
            url: url.to_string(),
            source: source.into(),
        }
    }

    pub fn style_injection(source: impl Into<BoxError>) -> Self {
        Self::StyleInjection {
            source: source.into(),
        }
    }

    pub fn capture(source: impl Into<BoxError>) -> Self {
        Self::Capture {
            source: source.into(),
        }
    }

    pub fn close(source: impl Into<BoxError>) -> Self {
        Self::Close {
            source: source.into(),
        }
    }

    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }
}

/// Renders one page of the served site into the job's artifact path.
///
/// Implementations own whatever browser resources they start and must release
/// them before returning, on success and on failure.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_to_pdf(&self, base_url: &Url, job: &ExportJob) -> Result<(), RenderError>;
}

/// Absolute URL of `page` on the server at `base_url`.
///
/// The path is appended to the server origin as text, so a page path can
/// never name another host.
pub fn page_url(base_url: &Url, page: &PagePath) -> Result<Url, url::ParseError> {
    let origin = base_url.origin().ascii_serialization();
    let path = page.as_str();
    if path.starts_with('/') {
        Url::parse(&format!("{origin}{path}"))
    } else {
        Url::parse(&format!("{origin}/{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_is_rooted_at_the_server() {
        let base = Url::parse("http://localhost:4000").expect("base url");
        assert_eq!(
            page_url(&base, &PagePath::from("/about/")).unwrap().as_str(),
            "http://localhost:4000/about/"
        );
        assert_eq!(
            page_url(&base, &PagePath::from("docs/intro")).unwrap().as_str(),
            "http://localhost:4000/docs/intro"
        );
        assert_eq!(
            page_url(&base, &PagePath::from("")).unwrap().as_str(),
            "http://localhost:4000/"
        );
    }

    #[test]
    fn scheme_relative_page_paths_stay_on_the_server() {
        let base = Url::parse("http://localhost:4000").expect("base url");
        for page in ["//x//", "//evil.example/a", "///b"] {
            let url = page_url(&base, &PagePath::from(page)).expect("page url");
            assert_eq!(url.host_str(), Some("localhost"), "{page}");
            assert_eq!(url.port(), Some(4000), "{page}");
        }
        assert_eq!(
            page_url(&base, &PagePath::from("//x//")).unwrap().path(),
            "//x//"
        );
    }
}
