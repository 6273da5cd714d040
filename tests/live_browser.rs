//! Live rendering through a real headless Chromium.
//!
//! - Needs a Chromium or Chrome binary that chromiumoxide can find, or
//!   `SITEPDF_TEST_CHROME` pointing at one.
//! - Marked `#[ignore]` so it only runs manually: `cargo test -- --ignored`.

use std::{env, fs, path::PathBuf, sync::Arc};

use sitepdf::{
    application::export::{ExportScheduler, Pacing, PageSelection, plan_export},
    domain::{
        export::{ExportTemplate, StyleInjection},
        pages::PagePath,
        pdf::PdfOptions,
    },
    infra::browser::{ChromeConfig, ChromeRenderer},
};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::test]
#[ignore]
async fn live_chromium_exports_styled_pages() -> TestResult<()> {
    let dir = tempfile::tempdir()?;
    let site = dir.path().join("public");
    fs::create_dir_all(site.join("about"))?;
    fs::write(
        site.join("index.html"),
        r#"<html><head><link rel="stylesheet" href="/site.css"></head><body><h1>Home</h1></body></html>"#,
    )?;
    fs::write(site.join("site.css"), "h1 { color: navy; }")?;
    fs::write(
        site.join("about/index.html"),
        "<html><body><h1>About</h1></body></html>",
    )?;

    let config = ChromeConfig {
        executable: env::var_os("SITEPDF_TEST_CHROME").map(PathBuf::from),
        ..ChromeConfig::default()
    };
    let layout = serde_json::from_str::<PdfOptions>(
        r#"{"format": "A4", "printBackground": true, "margin": {"top": "1cm"}}"#,
    )?
    .resolve()?;
    let template = ExportTemplate {
        output_dir: dir.path().join("exports"),
        file_prefix: Some("live-".to_string()),
        create_parent_dirs: false,
        pdf: Arc::new(layout),
        style: Some(Arc::new(StyleInjection::Content(
            "body { background: #eee; }".to_string(),
        ))),
    };
    let known: Vec<PagePath> = ["/", "/about/"].into_iter().map(PagePath::from).collect();
    let plan = plan_export(&PageSelection::AllPages, &known, &template);

    let scheduler = ExportScheduler::new(
        Arc::new(ChromeRenderer::new(config)),
        Pacing::default(),
    );
    let report = scheduler.run_plan(&site, plan).await?.into_result()?;

    assert_eq!(report.total(), 2);
    for artifact in report.artifacts() {
        let bytes = fs::read(artifact)?;
        assert!(bytes.starts_with(b"%PDF"), "{} is not a PDF", artifact.display());
    }
    Ok(())
}
