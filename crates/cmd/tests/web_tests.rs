// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, anyhow};
use bytes::Bytes;
use cmd::web::{AppState, SESSION_COOKIE, routes};
use std::sync::Arc;
use warp::http::StatusCode;

use backend::{HOSTNAME, InMemoryWorkspace};

const BOUNDARY: &str = "volupload-test-boundary";
const CSV: &str = "id,name\n1,a\n2,b\n";

/// One browser: remembers the session cookie between requests
struct Browser {
    cookie: Option<String>,
}

impl Browser {
    fn new() -> Self {
        Self { cookie: None }
    }

    fn request(&self, method: &str, path: &str) -> warp::test::RequestBuilder {
        let request = warp::test::request().method(method).path(path);
        match &self.cookie {
            Some(id) => request.header("cookie", format!("{SESSION_COOKIE}={id}")),
            None => request,
        }
    }

    fn remember(&mut self, response: &warp::http::Response<Bytes>) -> Result<()> {
        let header = response
            .headers()
            .get("set-cookie")
            .ok_or_else(|| anyhow!("no session cookie set"))?
            .to_str()?;
        let id = header
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix(&format!("{SESSION_COOKIE}=")))
            .ok_or_else(|| anyhow!("unexpected cookie {header}"))?;
        self.cookie = Some(id.to_string());
        Ok(())
    }
}

fn body(response: &warp::http::Response<Bytes>) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

fn multipart(file_name: &str, contents: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         {contents}\r\n\
         --{BOUNDARY}--\r\n"
    )
}

async fn post_form(
    browser: &mut Browser,
    state: &Arc<AppState>,
    path: &str,
    form: &str,
) -> Result<warp::http::Response<Bytes>> {
    let response = browser
        .request("POST", path)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(form.to_string())
        .reply(&routes(state.clone()))
        .await;
    browser.remember(&response)?;
    Ok(response)
}

#[tokio::test]
async fn test_index_renders_form_without_session() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(1024);
    let filter = routes(state.clone());
    let browser = Browser::new();

    let response = browser.request("GET", "/").reply(&filter).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("set-cookie").is_none());
    assert!(state.sessions().is_empty());

    let html = body(&response);
    assert!(html.contains("<h1>Volumes</h1>"));
    assert!(html.contains("Check Volume and permissions"));
    assert!(!html.contains(r#"action="/upload""#));
    Ok(())
}

#[tokio::test]
async fn test_index_keeps_existing_session() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(1024);
    let filter = routes(state.clone());
    let mut browser = Browser::new();

    post_form(&mut browser, &state, "/check", "volume=main.marketing.raw_files").await?;
    let cookie = browser.cookie.clone();
    let response = browser.request("GET", "/").reply(&filter).await;
    browser.remember(&response)?;

    assert_eq!(browser.cookie, cookie);
    assert!(body(&response).contains("Volume and permissions validated"));
    assert_eq!(state.sessions().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_reload_after_abandoned_upload_offers_upload_again() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(1024);
    let filter = routes(state.clone());
    let mut browser = Browser::new();

    post_form(&mut browser, &state, "/check", "volume=main.marketing.raw_files").await?;
    let (_, session) = state
        .sessions()
        .get(browser.cookie.as_deref())
        .ok_or_else(|| anyhow!("session missing"))?;
    // Upload request dropped after it started
    session.lock().await.begin_upload()?;

    let response = browser.request("GET", "/").reply(&filter).await;
    let html = body(&response);
    assert!(html.contains(r#"action="/upload""#));
    assert!(!html.contains(r#"action="/table""#));
    Ok(())
}

#[tokio::test]
async fn test_reload_after_abandoned_table_offers_both_forms() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(1024);
    let filter = routes(state.clone());
    let mut browser = Browser::new();

    post_form(&mut browser, &state, "/check", "volume=main.marketing.raw_files").await?;
    let response = browser
        .request("POST", "/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart("data.csv", CSV))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, session) = state
        .sessions()
        .get(browser.cookie.as_deref())
        .ok_or_else(|| anyhow!("session missing"))?;
    // Table request dropped while COPY INTO was running
    session.lock().await.begin_create()?;

    let response = browser.request("GET", "/").reply(&filter).await;
    let html = body(&response);
    assert!(html.contains(r#"action="/upload""#));
    assert!(html.contains(r#"action="/table""#));
    assert!(html.contains("File 'data.csv' uploaded to"));
    Ok(())
}

#[tokio::test]
async fn test_full_flow_through_forms() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(1024);
    let filter = routes(state.clone());
    let mut browser = Browser::new();

    let response = post_form(&mut browser, &state, "/check", "volume=main.marketing.raw_files").await?;
    let html = body(&response);
    assert!(html.contains("Volume and permissions validated"));
    assert!(html.contains("Upload file to main.marketing.raw_files"));

    let response = browser
        .request("POST", "/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart("data.csv", CSV))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(&response);
    assert!(html.contains("File 'data.csv' uploaded to"));
    assert!(html.contains(&format!(
        "https://{HOSTNAME}/explore/data/volumes/main/marketing/raw_files"
    )));
    assert_eq!(
        workspace.file("/Volumes/main/marketing/raw_files/data.csv"),
        Some(Bytes::from_static(CSV.as_bytes()))
    );

    let response = post_form(&mut browser, &state, "/table", "table_name=+sales+").await?;
    let html = body(&response);
    assert!(html.contains("Table `sales` created successfully! 2 rows inserted."));

    let statements = workspace.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].contains("`main`.`marketing`.`sales`"));
    Ok(())
}

#[tokio::test]
async fn test_denied_volume_offers_no_upload() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(1024);
    let filter = routes(state.clone());
    let mut browser = Browser::new();

    let response = post_form(&mut browser, &state, "/check", "volume=main.marketing.reports").await?;
    let html = body(&response);
    assert!(html.contains("Insufficient permissions: Required privileges not found."));
    assert!(!html.contains(r#"action="/upload""#));

    // Posting the upload anyway is refused without touching the store
    let response = browser
        .request("POST", "/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart("data.csv", CSV))
        .reply(&filter)
        .await;
    assert!(body(&response).contains("Cannot upload a file while denied"));
    assert!(workspace.file("/Volumes/main/marketing/reports/data.csv").is_none());
    Ok(())
}

#[tokio::test]
async fn test_table_before_upload_is_refused() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(1024);
    let mut browser = Browser::new();

    post_form(&mut browser, &state, "/check", "volume=main.marketing.raw_files").await?;
    let response = post_form(&mut browser, &state, "/table", "table_name=sales").await?;

    assert!(body(&response).contains("Cannot create a table while validated"));
    assert!(workspace.statements().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sessions_are_separate() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(1024);
    let filter = routes(state.clone());
    let mut first = Browser::new();
    let mut second = Browser::new();

    post_form(&mut first, &state, "/check", "volume=main.marketing.raw_files").await?;
    let response = second.request("GET", "/").reply(&filter).await;
    assert!(!body(&response).contains("Volume and permissions validated"));

    let response = post_form(&mut second, &state, "/check", "volume=main.marketing.reports").await?;
    assert_ne!(first.cookie, second.cookie);
    assert!(body(&response).contains("Insufficient permissions"));

    let response = first.request("GET", "/").reply(&filter).await;
    assert!(body(&response).contains("Volume and permissions validated"));
    Ok(())
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(64);
    let filter = routes(state.clone());
    let mut browser = Browser::new();

    post_form(&mut browser, &state, "/check", "volume=main.marketing.raw_files").await?;
    let response = browser
        .request("POST", "/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart("big.csv", &"x".repeat(256)))
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(workspace.file("/Volumes/main/marketing/raw_files/big.csv").is_none());
    Ok(())
}

#[tokio::test]
async fn test_unknown_path_is_not_found() -> Result<()> {
    let workspace = InMemoryWorkspace::new();
    let state = workspace.state(1024);
    let filter = routes(state.clone());

    let response = warp::test::request()
        .method("GET")
        .path("/nowhere")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
