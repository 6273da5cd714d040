use std::{
    fs, io,
    net::{SocketAddr, TcpListener},
};

use reqwest::{Client, StatusCode, header, redirect::Policy};
use sitepdf::infra::server::{ServerError, StaticServer, with_server};
use tempfile::TempDir;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

fn built_site() -> TestResult<TempDir> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    fs::write(root.join("index.html"), "<h1>home</h1>")?;
    fs::create_dir_all(root.join("about"))?;
    fs::write(root.join("about/index.html"), "<h1>about</h1>")?;
    fs::create_dir_all(root.join("static"))?;
    fs::write(root.join("static/site.css"), "body { color: #111; }")?;
    fs::write(root.join("static/app v2.js"), "console.log('v2');")?;
    Ok(dir)
}

fn client() -> TestResult<Client> {
    Ok(Client::builder().redirect(Policy::none()).build()?)
}

#[derive(Debug, thiserror::Error)]
enum BodyError {
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("body failed")]
    Failed,
}

#[tokio::test]
async fn serves_files_verbatim_with_content_type() -> TestResult<()> {
    let site = built_site()?;
    let server = StaticServer::start(site.path()).await?;
    let client = client()?;

    let response = client
        .get(server.base_url().join("/static/site.css")?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/css")
    );
    assert_eq!(response.text().await?, "body { color: #111; }");

    let response = client
        .get(server.base_url().join("/static/app%20v2.js")?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "console.log('v2');");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn directories_serve_their_index() -> TestResult<()> {
    let site = built_site()?;
    let server = StaticServer::start(site.path()).await?;
    let client = client()?;

    let root = client.get(server.base_url().clone()).send().await?;
    assert_eq!(root.status(), StatusCode::OK);
    assert_eq!(root.text().await?, "<h1>home</h1>");

    let about = client
        .get(server.base_url().join("/about/")?)
        .send()
        .await?;
    assert_eq!(about.status(), StatusCode::OK);
    assert!(
        about
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/html"))
    );
    assert_eq!(about.text().await?, "<h1>about</h1>");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn slashless_directory_requests_redirect() -> TestResult<()> {
    let site = built_site()?;
    let server = StaticServer::start(site.path()).await?;

    let response = client()?
        .get(server.base_url().join("/about?lang=en")?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/about/?lang=en")
    );

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn missing_files_are_not_found() -> TestResult<()> {
    let site = built_site()?;
    let server = StaticServer::start(site.path()).await?;
    let client = client()?;

    for path in ["/nope.html", "/static/missing.css", "/blog/"] {
        let response = client.get(server.base_url().join(path)?).send().await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn base_url_uses_localhost_and_bound_port() -> TestResult<()> {
    let site = built_site()?;
    let server = StaticServer::start(site.path()).await?;

    assert_eq!(server.base_url().host_str(), Some("localhost"));
    assert_eq!(server.base_url().port(), Some(server.local_addr().port()));
    assert!(server.local_addr().ip().is_loopback());

    server.shutdown().await?;
    Ok(())
}

fn port_is_free(addr: SocketAddr) -> io::Result<()> {
    TcpListener::bind(addr).map(drop)
}

#[tokio::test]
async fn port_is_released_after_body_succeeds() -> TestResult<()> {
    let site = built_site()?;
    let addr = with_server(site.path(), |base_url| async move {
        let response = client()?.get(base_url.clone()).send().await?;
        assert_eq!(response.status(), StatusCode::OK);
        let port = base_url.port().ok_or("base url has a port")?;
        Ok::<_, Box<dyn std::error::Error>>(SocketAddr::from(([127, 0, 0, 1], port)))
    })
    .await?;

    port_is_free(addr)?;
    Ok(())
}

#[tokio::test]
async fn port_is_released_after_body_fails() -> TestResult<()> {
    let site = built_site()?;
    let mut bound = None;

    let outcome: Result<(), BodyError> = with_server(site.path(), |base_url| {
        bound = base_url.port();
        async { Err(BodyError::Failed) }
    })
    .await;

    assert!(matches!(outcome, Err(BodyError::Failed)));
    let port = bound.ok_or("body saw the server url")?;
    port_is_free(SocketAddr::from(([127, 0, 0, 1], port)))?;
    Ok(())
}

#[tokio::test]
async fn missing_site_directory_still_serves_not_found() -> TestResult<()> {
    let site = tempfile::tempdir()?;
    let server = StaticServer::start(&site.path().join("absent")).await?;

    let response = client()?.get(server.base_url().clone()).send().await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.shutdown().await?;
    assert!(!site.path().join("absent").exists());
    Ok(())
}
