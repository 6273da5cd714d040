//! Stylesheet injection into a loaded page.

use std::path::Path;

use chromiumoxide::{Page, cdp::js_protocol::runtime::EvaluateParams};
use tokio::fs;

use crate::{application::render::RenderError, domain::export::StyleInjection};

/// Add the configured stylesheet to `page`, waiting for linked sheets to load.
pub(crate) async fn inject_style(page: &Page, style: &StyleInjection) -> Result<(), RenderError> {
    let script = match style {
        StyleInjection::Url(url) => link_tag_script(url),
        StyleInjection::Content(css) => style_tag_script(css),
        StyleInjection::Path(path) => {
            let css = fs::read_to_string(path)
                .await
                .map_err(RenderError::style_injection)?;
            style_tag_script(&with_source_url(&css, path))
        }
    }
    .map_err(RenderError::style_injection)?;

    let params = EvaluateParams::builder()
        .expression(script)
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(RenderError::style_injection)?;
    page.evaluate_expression(params)
        .await
        .map_err(RenderError::style_injection)?;
    Ok(())
}

fn link_tag_script(url: &str) -> Result<String, serde_json::Error> {
    let url = serde_json::to_string(url)?;
    Ok(format!(
        r#"new Promise((resolve, reject) => {{
  const link = document.createElement('link');
  link.rel = 'stylesheet';
  link.href = {url};
  link.onload = () => resolve(true);
  link.onerror = () => reject(new Error('Loading CSS from ' + {url} + ' failed'));
  document.head.appendChild(link);
}})"#
    ))
}

fn style_tag_script(css: &str) -> Result<String, serde_json::Error> {
    let css = serde_json::to_string(css)?;
    Ok(format!(
        r#"(() => {{
  const style = document.createElement('style');
  style.type = 'text/css';
  style.appendChild(document.createTextNode({css}));
  document.head.appendChild(style);
  return true;
}})()"#
    ))
}

/// Tag inlined file content with its origin for devtools.
fn with_source_url(css: &str, path: &Path) -> String {
    let origin = path.display().to_string().replace('\n', "");
    format!("{css}\n/*# sourceURL={origin}*/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_css_is_embedded_as_a_js_string() {
        let script = style_tag_script("body { content: \"</style>\"; }\n").expect("script builds");
        assert!(script.contains(r#""body { content: \"</style>\"; }\n""#));
        assert!(script.contains("createElement('style')"));
    }

    #[test]
    fn link_script_waits_for_load() {
        let script = link_tag_script("https://cdn.example.com/print.css").expect("script builds");
        assert!(script.starts_with("new Promise"));
        assert!(script.contains(r#"link.href = "https://cdn.example.com/print.css";"#));
    }

    #[test]
    fn file_content_carries_source_marker() {
        let css = with_source_url("h1 { color: red; }", Path::new("/site/print\n.css"));
        assert_eq!(css, "h1 { color: red; }\n/*# sourceURL=/site/print.css*/");
    }
}
