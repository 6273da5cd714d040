//! Page paths and the filenames derived from them.
//!
//! A page path is the site-relative route of one built page (`/`, `/about/`,
//! `/docs/getting-started`). Every exported PDF is named after its page path,
//! so the mapping must be deterministic and free of path separators.

use std::fmt;

/// Name used for the site root.
pub const ROOT_PAGE_NAME: &str = "index";

/// Development-only 404 page emitted by some static site generators.
pub const DEV_404_PAGE: &str = "/dev-404-page/";

const PDF_EXTENSION: &str = "pdf";

/// Site-relative route identifying one built page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PagePath(String);

impl PagePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base filename for this page, see [`normalize_page_name`].
    pub fn file_stem(&self) -> String {
        normalize_page_name(&self.0)
    }

    /// Whether the page should be offered for export at all.
    ///
    /// Raw `.html`/`.htm` file routes and the development 404 page are build
    /// artefacts rather than pages.
    pub fn is_exportable(&self) -> bool {
        let lowered = self.0.to_ascii_lowercase();
        self.0 != DEV_404_PAGE && !lowered.ends_with(".html") && !lowered.ends_with(".htm")
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PagePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PagePath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Map a page path to a filesystem-safe base filename.
///
/// One leading and one trailing `/` are dropped, the empty remainder becomes
/// [`ROOT_PAGE_NAME`] and every other `/` turns into `-`.
pub fn normalize_page_name(page_path: &str) -> String {
    let trimmed = page_path.strip_prefix('/').unwrap_or(page_path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    if trimmed.is_empty() {
        ROOT_PAGE_NAME.to_string()
    } else {
        trimmed.replace('/', "-")
    }
}

/// Filename of the PDF exported for `page`, including the optional prefix.
pub fn artifact_file_name(prefix: Option<&str>, page: &PagePath) -> String {
    format!(
        "{}{}.{PDF_EXTENSION}",
        prefix.unwrap_or_default(),
        page.file_stem()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_forms_map_to_index() {
        assert_eq!(normalize_page_name("/"), "index");
        assert_eq!(normalize_page_name(""), "index");
        assert_eq!(normalize_page_name("//"), "index");
    }

    #[test]
    fn strips_single_leading_and_trailing_slash() {
        assert_eq!(normalize_page_name("/about/"), "about");
        assert_eq!(normalize_page_name("about"), "about");
        assert_eq!(normalize_page_name("/a/b/c"), "a-b-c");
        assert_eq!(normalize_page_name("/docs/intro/"), "docs-intro");
    }

    #[test]
    fn only_one_slash_is_stripped_on_each_side() {
        assert_eq!(normalize_page_name("//about//"), "-about-");
    }

    #[test]
    fn normalization_is_idempotent_on_its_output() {
        for input in ["/", "", "/about/", "/a/b/c", "/blog/2024/hello-world/", "//x//"] {
            let once = normalize_page_name(input);
            assert_eq!(normalize_page_name(&once), once, "input `{input}`");
        }
    }

    #[test]
    fn artifact_name_applies_prefix() {
        let page = PagePath::from("/about/");
        assert_eq!(artifact_file_name(None, &page), "about.pdf");
        assert_eq!(artifact_file_name(Some("site-"), &page), "site-about.pdf");
        assert_eq!(artifact_file_name(Some("site-"), &PagePath::from("/")), "site-index.pdf");
    }

    #[test]
    fn build_artefacts_are_not_exportable() {
        assert!(PagePath::from("/").is_exportable());
        assert!(PagePath::from("/html-guide/").is_exportable());
        assert!(!PagePath::from(DEV_404_PAGE).is_exportable());
        assert!(!PagePath::from("/404.html").is_exportable());
        assert!(!PagePath::from("/legacy/page.HTM").is_exportable());
    }
}
