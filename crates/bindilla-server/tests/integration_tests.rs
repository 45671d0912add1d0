//! Integration tests for the bindilla HTTP server.
//!
//! These start the real binary against a mock Binder and exercise the
//! host API the way a Stencila client would: read the manifest, launch an
//! environ, then talk to it through the proxy.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::Value;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;

struct BindillaHandle {
    child: tokio::process::Child,
    port: u16,
    stdout_drain: Option<tokio::task::JoinHandle<()>>,
}

impl BindillaHandle {
    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    async fn stop(mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for BindillaHandle {
    fn drop(&mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.start_kill();
    }
}

/// Start the binary pointed at `binder` and wait for `/health`.
async fn start_bindilla(binder: &ServerGuard, extra_args: &[&str]) -> Result<BindillaHandle, String> {
    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_bindilla"))
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg("0")
        .arg("--binder-url")
        .arg(binder.url())
        .arg("--hub-url")
        .arg(binder.url())
        .args(extra_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("failed to spawn bindilla: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture stdout".to_string())?;
    let mut lines = tokio::io::BufReader::new(stdout).lines();

    let mut discovered_port: Option<u16> = None;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(value) = line.strip_prefix("BINDILLA_PORT=") {
                    let parsed = value
                        .trim()
                        .parse::<u16>()
                        .map_err(|e| format!("invalid BINDILLA_PORT value '{value}': {e}"))?;
                    discovered_port = Some(parsed);
                    break;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(format!("failed to read bindilla stdout: {err}")),
            Err(_) => continue,
        }
    }

    let port = discovered_port.ok_or_else(|| "BINDILLA_PORT line not emitted".to_string())?;
    let stdout_drain =
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });
    let handle = BindillaHandle {
        child,
        port,
        stdout_drain: Some(stdout_drain),
    };

    if !wait_for_health(&handle, 15).await {
        return Err(format!("bindilla failed health check on port {port}"));
    }
    Ok(handle)
}

async fn wait_for_health(handle: &BindillaHandle, timeout_secs: u64) -> bool {
    let client = reqwest::Client::new();
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(timeout_secs) {
        if let Ok(response) = client.get(handle.url("/health")).send().await {
            if response.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

#[tokio::test]
async fn test_manifest_launch_and_proxy() {
    let mut binder = Server::new_async().await;
    let ready_url = format!("{}/user/stencila-images-x1/", binder.url());
    let launch = binder
        .mock("GET", "/build/gh/stencila/images/core")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(format!(
            "data: {{\"phase\": \"building\", \"message\": \"Step 1/2\"}}\n\n\
             data: {{\"phase\": \"ready\", \"url\": \"{}\", \"token\": \"t0k\"}}\n\n",
            ready_url
        ))
        .create_async()
        .await;
    let kernels = binder
        .mock("GET", "/user/stencila-images-x1/api/kernels")
        .match_query(Matcher::UrlEncoded("limit".into(), "1".into()))
        .match_header("authorization", "token t0k")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":"k1"}]"#)
        .create_async()
        .await;

    let bindilla = start_bindilla(&binder, &[]).await.expect("bindilla starts");
    let client = reqwest::Client::new();

    let manifest: Value = client
        .get(bindilla.url("/v1/manifest"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(manifest["stencila"]["package"], "bindilla");
    assert!(manifest["environs"]
        .as_array()
        .unwrap()
        .iter()
        .any(|environ| environ["id"] == "stencila/core"));

    let launched: Value = client
        .post(bindilla.url("/v1/environs/stencila/core"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(launched["id"], "stencila-images-x1@t0k");
    assert_eq!(launched["environ"], "stencila/core");
    launch.assert_async().await;

    let proxied = client
        .get(bindilla.url(&format!(
            "/v1/proxy/{}/api/kernels?limit=1",
            launched["id"].as_str().unwrap()
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(proxied.status(), 200);
    assert_eq!(proxied.headers()["content-type"], "application/json");
    assert_eq!(proxied.text().await.unwrap(), r#"[{"id":"k1"}]"#);
    kernels.assert_async().await;

    bindilla.stop().await;
}

#[tokio::test]
async fn test_proxy_passes_upstream_errors_through() {
    let mut binder = Server::new_async().await;
    binder
        .mock("PUT", "/user/gone/api/contents/x")
        .with_status(403)
        .create_async()
        .await;

    let bindilla = start_bindilla(&binder, &[]).await.expect("bindilla starts");
    let response = reqwest::Client::new()
        .put(bindilla.url("/v0/proxy/gone@t0k/api/contents/x"))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "HTTP 403: Forbidden");

    bindilla.stop().await;
}

#[tokio::test]
async fn test_failed_build_is_bad_gateway() {
    let mut binder = Server::new_async().await;
    binder
        .mock("GET", "/build/gh/stencila/images/r")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("data: {\"phase\": \"failed\", \"message\": \"No space left\"}\n\n")
        .create_async()
        .await;

    let bindilla = start_bindilla(&binder, &[]).await.expect("bindilla starts");
    let response = reqwest::Client::new()
        .post(bindilla.url("/v0/environ/stencila/r"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("No space left"));

    bindilla.stop().await;
}

#[tokio::test]
async fn test_custom_environ_catalog() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"id": "org/custom", "name": "Custom", "binder": "gh/org/custom/HEAD"}}]"#
    )
    .unwrap();

    let binder = Server::new_async().await;
    let path = file.path().to_str().unwrap().to_string();
    let bindilla = start_bindilla(&binder, &["--environs", &path])
        .await
        .expect("bindilla starts");

    let manifest: Value = reqwest::get(bindilla.url("/v1/manifest"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let environs = manifest["environs"].as_array().unwrap();
    assert_eq!(environs.len(), 1);
    assert_eq!(environs[0]["id"], "org/custom");

    bindilla.stop().await;
}
