//! Export jobs: one page, one PDF.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use super::{
    pages::{PagePath, artifact_file_name},
    pdf::PdfLayout,
};

/// A single extra stylesheet applied to the page before capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleInjection {
    /// Linked via `<link rel="stylesheet">`.
    Url(String),
    /// Read from disk and inlined; the path is absolute.
    Path(PathBuf),
    /// Inlined verbatim.
    Content(String),
}

/// Options shared by every job of a batch.
#[derive(Debug, Clone)]
pub struct ExportTemplate {
    pub output_dir: PathBuf,
    pub file_prefix: Option<String>,
    pub create_parent_dirs: bool,
    pub pdf: Arc<PdfLayout>,
    pub style: Option<Arc<StyleInjection>>,
}

/// Conversion of one page into one PDF file.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub page: PagePath,
    pub ordinal: usize,
    pub output_dir: PathBuf,
    pub file_prefix: Option<String>,
    pub create_parent_dirs: bool,
    pub pdf: Arc<PdfLayout>,
    pub style: Option<Arc<StyleInjection>>,
}

impl ExportTemplate {
    pub fn job(&self, page: PagePath, ordinal: usize) -> ExportJob {
        ExportJob {
            page,
            ordinal,
            output_dir: self.output_dir.clone(),
            file_prefix: self.file_prefix.clone(),
            create_parent_dirs: self.create_parent_dirs,
            pdf: Arc::clone(&self.pdf),
            style: self.style.clone(),
        }
    }

    /// Jobs for `pages`, numbered in the given order.
    pub fn jobs(&self, pages: impl IntoIterator<Item = PagePath>) -> Vec<ExportJob> {
        pages
            .into_iter()
            .enumerate()
            .map(|(ordinal, page)| self.job(page, ordinal))
            .collect()
    }
}

impl ExportJob {
    pub fn file_name(&self) -> String {
        artifact_file_name(self.file_prefix.as_deref(), &self.page)
    }

    /// Where the rendered PDF is written.
    pub fn artifact_path(&self) -> PathBuf {
        self.output_dir.join(self.file_name())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
