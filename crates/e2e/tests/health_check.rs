//! `checkApiHealth` against a live HTTP server
//!
//! An axum app on an ephemeral port stands in for the application under
//! test and counts the requests it receives.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;

use e2e_commands::commands::HealthCheckCommand;
use e2e_commands::driver::RecordingDriver;
use e2e_commands::http::ReqwestClient;
use e2e_commands::server::wait_until_ready;
use e2e_commands::{CommandContext, CommandSet, E2eConfig, E2eError, FailureKind};

#[derive(Clone)]
struct App {
    status: StatusCode,
    body: Value,
    hits: Arc<AtomicUsize>,
}

async fn health(State(app): State<App>) -> (StatusCode, Json<Value>) {
    app.hits.fetch_add(1, Ordering::SeqCst);
    (app.status, Json(app.body))
}

/// Serve `/api/health` with a fixed response; returns base URL and hit counter
async fn serve(status: u16, body: Value) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = App {
        status: StatusCode::from_u16(status).unwrap(),
        body,
        hits: hits.clone(),
    };
    let router = Router::new().route("/api/health", get(health)).with_state(app);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

fn client(base_url: &str) -> ReqwestClient {
    ReqwestClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn healthy_api_passes() {
    let (base_url, hits) = serve(200, json!({ "status": "healthy", "version": "1.2.3" })).await;

    let body = HealthCheckCommand::default().check(&client(&base_url)).await.unwrap();

    assert_eq!(body.status, "healthy");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test_case(500, json!({}), FailureKind::ContractViolation ; "server error")]
#[test_case(200, json!({ "status": "degraded" }), FailureKind::ContractViolation ; "degraded")]
#[test_case(200, json!({ "ok": true }), FailureKind::ContractViolation ; "missing status")]
#[tokio::test]
async fn unhealthy_api_fails_once(status: u16, body: Value, kind: FailureKind) {
    let (base_url, hits) = serve(status, body).await;

    let err = HealthCheckCommand::default().check(&client(&base_url)).await.unwrap_err();

    assert_eq!(err.kind(), kind);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn status_is_checked_before_body() {
    let (base_url, _) = serve(503, json!({ "status": "healthy" })).await;

    let err = HealthCheckCommand::default().check(&client(&base_url)).await.unwrap_err();

    assert!(matches!(err, E2eError::StatusMismatch { expected: 200, actual: 503 }));
}

#[tokio::test]
async fn repeated_invocations_are_independent_requests() {
    let (base_url, hits) = serve(200, json!({ "status": "healthy" })).await;
    let http = client(&base_url);
    let commands = CommandSet::with_defaults(&E2eConfig::default());
    let mut driver = RecordingDriver::new();

    for _ in 0..2 {
        let mut ctx = CommandContext::new(&mut driver, &http);
        commands.invoke("checkApiHealth", &mut ctx, &[]).await.unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreachable_api_is_contract_violation() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = HealthCheckCommand::default()
        .check(&client(&format!("http://127.0.0.1:{}", port)))
        .await
        .unwrap_err();

    assert!(matches!(err, E2eError::Http(_)));
    assert_eq!(err.kind(), FailureKind::ContractViolation);
}

#[tokio::test]
async fn readiness_wait_accepts_running_server() {
    let (base_url, hits) = serve(200, json!({ "status": "healthy" })).await;

    wait_until_ready(&base_url, "/api/health", Duration::from_secs(5)).await.unwrap();

    assert!(hits.load(Ordering::SeqCst) >= 1);
}
