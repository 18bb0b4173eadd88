//! Command-line tests for the `docpair` binary.
//!
//! The binary is pointed at a local `wiremock` server that also hosts the
//! input URLs, so any download or collaborator call shows up as a request.
//!
//! Run with:
//!   cargo test --test cli -- --nocapture

#![cfg(feature = "cli")]

use std::process::Output;
use tokio::process::Command;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run_docpair(server: &MockServer, inputs: &[String]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docpair"))
        .args(inputs)
        .arg("--ocr-url")
        .arg(format!("{}/upload-pdf/", server.uri()))
        .arg("--analysis-url")
        .arg(format!("{}/webhook/compare", server.uri()))
        .arg("--no-progress")
        .env_remove("DOCPAIR_EMAIL_TO")
        .output()
        .await
        .expect("docpair runs")
}

async fn silent_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .expect(0)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn single_url_is_rejected_without_downloading() {
    let server = silent_server().await;
    let output = run_docpair(&server, &[format!("{}/x.pdf", server.uri())]).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("got 1 of 2"), "stderr: {stderr}");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn three_urls_are_rejected_without_downloading() {
    let server = silent_server().await;
    let inputs: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|n| format!("{}/{n}.pdf", server.uri()))
        .collect();
    let output = run_docpair(&server, &inputs).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("got 3"), "stderr: {stderr}");
    assert!(server.received_requests().await.unwrap().is_empty());
}
