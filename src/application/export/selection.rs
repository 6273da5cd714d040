//! Which known pages become export jobs.

use std::collections::HashSet;

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::pages::PagePath;

/// How pages are chosen for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    /// Every known page, in the order supplied.
    AllPages,
    /// Only the listed paths that are also known pages.
    Explicit(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedPages {
    pub pages: Vec<PagePath>,
    /// Explicitly requested paths that are not known pages.
    pub unknown: Vec<String>,
}

/// Resolve `selection` against the known pages.
///
/// Unknown explicit paths are reported and skipped; repeated explicit paths
/// are exported once, at their first position.
pub fn select_pages(selection: &PageSelection, known: &[PagePath]) -> SelectedPages {
    match selection {
        PageSelection::AllPages => SelectedPages {
            pages: known.to_vec(),
            unknown: Vec::new(),
        },
        PageSelection::Explicit(paths) => {
            let known: HashSet<&str> = known.iter().map(PagePath::as_str).collect();
            let mut seen = HashSet::new();
            let mut selected = SelectedPages::default();

            for path in paths {
                if !known.contains(path.as_str()) {
                    warn!(
                        target = "sitepdf::export::selection",
                        page = %path,
                        "Page path requested for PDF export does not exist; check the export paths configuration"
                    );
                    counter!("sitepdf_export_skipped_paths_total").increment(1);
                    selected.unknown.push(path.clone());
                    continue;
                }
                if !seen.insert(path.as_str()) {
                    debug!(
                        target = "sitepdf::export::selection",
                        page = %path,
                        "Ignoring repeated export path"
                    );
                    continue;
                }
                selected.pages.push(PagePath::new(path.clone()));
            }

            selected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(paths: &[&str]) -> Vec<PagePath> {
        paths.iter().copied().map(PagePath::from).collect()
    }

    #[test]
    fn all_pages_keeps_supplied_order() {
        let selected = select_pages(&PageSelection::AllPages, &known(&["/b/", "/", "/a/"]));
        assert_eq!(selected.pages, known(&["/b/", "/", "/a/"]));
        assert!(selected.unknown.is_empty());
    }

    #[test]
    fn explicit_paths_must_be_known() {
        let selection = PageSelection::Explicit(vec!["/missing".into(), "/about/".into()]);
        let selected = select_pages(&selection, &known(&["/", "/about/"]));
        assert_eq!(selected.pages, known(&["/about/"]));
        assert_eq!(selected.unknown, vec!["/missing".to_string()]);
    }

    #[test]
    fn explicit_paths_follow_request_order_without_duplicates() {
        let selection = PageSelection::Explicit(vec![
            "/about/".into(),
            "/".into(),
            "/about/".into(),
        ]);
        let selected = select_pages(&selection, &known(&["/", "/about/"]));
        assert_eq!(selected.pages, known(&["/about/", "/"]));
    }

    #[test]
    fn explicit_match_is_exact() {
        let selection = PageSelection::Explicit(vec!["/about".into()]);
        let selected = select_pages(&selection, &known(&["/about/"]));
        assert!(selected.pages.is_empty());
        assert_eq!(selected.unknown, vec!["/about".to_string()]);
    }
}
