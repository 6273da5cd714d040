//! Known-page manifest written by the site build.
//!
//! The manifest is a JSON array of page paths, either as plain strings or as
//! node objects carrying a `path` field. It may also be wrapped in an object
//! under a `pages` key.

use std::{collections::HashSet, io, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::domain::pages::PagePath;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read page manifest `{path}`")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("page manifest `{path}` is not valid")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestEntry {
    Path(String),
    Node { path: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Manifest {
    List(Vec<ManifestEntry>),
    Wrapped { pages: Vec<ManifestEntry> },
}

/// Load the exportable pages listed in the manifest at `path`.
pub async fn load_known_pages(path: &Path) -> Result<Vec<PagePath>, ManifestError> {
    let shown = path.display().to_string();
    let raw = fs::read_to_string(path)
        .await
        .map_err(|source| ManifestError::Read {
            path: shown.clone(),
            source,
        })?;
    let pages = parse_known_pages(&raw).map_err(|source| ManifestError::Parse {
        path: shown.clone(),
        source,
    })?;

    debug!(
        target = "sitepdf::manifest",
        manifest = %path.display(),
        pages = pages.len(),
        "Loaded page manifest"
    );
    Ok(pages)
}

/// Parse manifest JSON, keeping exportable pages in their listed order.
pub fn parse_known_pages(raw: &str) -> Result<Vec<PagePath>, serde_json::Error> {
    let entries = match serde_json::from_str::<Manifest>(raw)? {
        Manifest::List(entries) | Manifest::Wrapped { pages: entries } => entries,
    };

    let mut seen = HashSet::new();
    let pages = entries
        .into_iter()
        .filter_map(|entry| match entry {
            ManifestEntry::Path(path) => Some(path),
            ManifestEntry::Node { path } => path,
        })
        .map(PagePath::new)
        .filter(PagePath::is_exportable)
        .filter(|page| seen.insert(page.clone()))
        .collect();

    Ok(pages)
}
