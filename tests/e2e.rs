//! End-to-end tests: real TCP listener, real child processes.

#![cfg(unix)]

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tokio::task::JoinHandle;

use common::{entries, test_config, MINIMAL_PDF};
use pdf2zh_server::config::{Config, TranslatorConfig};
use pdf2zh_server::{routes, AppState};

struct TestServer {
    address: SocketAddr,
    handle: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(config: Config) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let address = listener.local_addr().expect("Failed to get address");
        let app = routes::router(AppState::new(config));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            address,
            handle,
            client: reqwest::Client::new(),
        }
    }

    async fn translate(&self, form: Form) -> reqwest::Response {
        self.client
            .post(format!("http://{}/translate", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Request failed")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Translator config running `sh -c <script>` with `$1` = path, `$2` = params
fn shell(script: &str) -> TranslatorConfig {
    TranslatorConfig {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string(), "pdf2zh".to_string()],
        working_dir: None,
        timeout: Duration::from_secs(10),
    }
}

fn pdf(bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name("input.pdf")
        .mime_str("application/pdf")
        .expect("valid mime")
}

#[tokio::test]
async fn copy_translator_round_trips_upload() {
    let (mut config, staging) = test_config();
    config.translator = shell(r#"cat "$1""#);
    let server = TestServer::start(config).await;

    let form = Form::new()
        .part("file", pdf(MINIMAL_PDF))
        .text("target_language", "zh");
    let response = server.translate(form).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(response.bytes().await.unwrap().as_ref(), MINIMAL_PDF);
    assert_eq!(entries(staging.path()), 0);
}

#[tokio::test]
async fn translator_receives_serialized_parameters() {
    let (mut config, _staging) = test_config();
    config.translator = shell(r#"printf '%s' "$2""#);
    let server = TestServer::start(config).await;

    let form = Form::new()
        .part("file", pdf(MINIMAL_PDF))
        .text("lang_in", "en")
        .text("lang_out", "zh");
    let response = server.translate(form).await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"lang_in":"en","lang_out":"zh"}"#
    );
}

#[tokio::test]
async fn missing_file_never_launches_translator() {
    let (mut config, staging) = test_config();
    let marker = staging.path().join("launched");
    config.translator = shell(&format!("touch '{}'", marker.display()));
    let server = TestServer::start(config).await;

    let form = Form::new().text("target_language", "zh");
    let response = server.translate(form).await;

    assert_eq!(response.status(), 400);
    assert!(response.text().await.unwrap().contains("Missing 'file' field"));
    assert!(!marker.exists());
}

#[tokio::test]
async fn failing_translator_returns_server_error_without_output() {
    let (mut config, staging) = test_config();
    config.translator = shell("printf 'half a pdf'; echo 'Traceback' >&2; exit 1");
    let server = TestServer::start(config).await;

    let response = server.translate(Form::new().part("file", pdf(MINIMAL_PDF))).await;

    assert_eq!(response.status(), 500);
    let body = response.text().await.unwrap();
    assert!(!body.contains("half a pdf"));
    assert!(!body.contains("Traceback"));
    assert_eq!(entries(staging.path()), 0);
}

#[tokio::test]
async fn slow_translator_is_cut_off() {
    let (mut config, staging) = test_config();
    config.translator = shell("sleep 5; cat \"$1\"");
    config.translator.timeout = Duration::from_millis(300);
    let server = TestServer::start(config).await;

    let started = std::time::Instant::now();
    let response = server.translate(Form::new().part("file", pdf(MINIMAL_PDF))).await;

    assert_eq!(response.status(), 500);
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(entries(staging.path()), 0);
}

#[tokio::test]
async fn concurrent_uploads_are_isolated() {
    let (mut config, staging) = test_config();
    config.translator = shell(r#"sleep 0.2; cat "$1""#);
    let server = TestServer::start(config).await;

    let uploads: Vec<Vec<u8>> = (0..6)
        .map(|i| format!("%PDF-1.4 upload {i}").into_bytes())
        .collect();

    let responses = futures::future::join_all(
        uploads
            .iter()
            .map(|bytes| server.translate(Form::new().part("file", pdf(bytes)))),
    )
    .await;

    for (bytes, response) in uploads.iter().zip(responses) {
        assert_eq!(response.status(), 200);
        assert_eq!(response.bytes().await.unwrap().as_ref(), bytes.as_slice());
    }
    assert_eq!(entries(staging.path()), 0);
}
