//! End-to-end tests against a local mock of the health backend

use axum::extract::{Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vitalboard::{
    AuthenticatedRequester, Dashboard, DashboardOptions, FetchError, FetcherConfig, MetricKind,
    MetricPanel, PaginatedFetcher, PanelView, RefreshOutcome, RequesterConfig, Selection, Status,
};

const TOKEN: &str = "test-token";

#[derive(Clone)]
struct Backend {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn heart_rate(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "unauthorized"}))).into_response();
    }

    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let body = match page {
        1 => json!({
            "count": 3,
            // Absolute http link, as Django REST framework emits behind a proxy
            "next": format!("http://{}/api/HeartRate_Data/?user_id=u1&range=24h&page=2", backend.addr),
            "results": [
                {"date": "2026-01-01T06:00:00Z", "once_heart_value": 64, "user_id": "u1"},
                {"date": "2026-01-01T07:00:00Z", "once_heart_value": 70, "user_id": "u1"}
            ]
        }),
        _ => json!({
            "count": 3,
            "next": null,
            "results": [
                {"date": "2026-01-01T08:00:00Z", "once_heart_value": 72, "user_id": "u1"}
            ]
        }),
    };
    Json(body).into_response()
}

async fn steps(State(backend): State<Backend>) -> Json<Value> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        {"date": "2026-01-01", "steps": 6000},
        {"date": "2026-01-01T18:00:00", "steps": "5500"}
    ]))
}

async fn stress(State(backend): State<Backend>) -> StatusCode {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_backend() -> Backend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = Backend {
        addr: listener.local_addr().unwrap(),
        hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/api/HeartRate_Data/", get(heart_rate))
        .route("/api/Steps/", get(steps))
        .route("/api/Stress_Data/", get(stress))
        .with_state(backend.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    backend
}

fn fetcher(backend: &Backend, token: Option<&str>) -> Arc<PaginatedFetcher> {
    let requester = AuthenticatedRequester::new(RequesterConfig {
        base_url: format!("http://{}", backend.addr),
        token: token.map(str::to_string),
        request_timeout_ms: 5_000,
    })
    .unwrap();
    let config = FetcherConfig {
        // The mock speaks plain http
        force_https_next: false,
        ..FetcherConfig::default()
    };
    Arc::new(PaginatedFetcher::new(Arc::new(requester), config))
}

#[tokio::test]
async fn test_panel_follows_every_page() {
    let backend = spawn_backend().await;
    let panel = MetricPanel::new(MetricKind::HeartRate, fetcher(&backend, Some(TOKEN)));
    let selection = Selection::default().user("u1");

    let outcome = panel.refresh(&selection).await;

    assert_eq!(outcome, RefreshOutcome::Fetched { samples: 3 });
    assert_eq!(backend.hits.load(Ordering::SeqCst), 2);

    let view = panel.view();
    let card = view.card().expect("ready card");
    assert_eq!(card.headline, "72 BPM");
    assert_eq!(card.status, Status::Normal);
    assert_eq!(card.stats.count, 3);
    assert_eq!(card.stats.primary.min, 64.0);
    assert_eq!(card.stats.primary.max, 72.0);
}

#[tokio::test]
async fn test_second_refresh_served_from_cache() {
    let backend = spawn_backend().await;
    let panel = MetricPanel::new(MetricKind::HeartRate, fetcher(&backend, Some(TOKEN)));
    let selection = Selection::default().user("u1");

    panel.refresh(&selection).await;
    let outcome = panel.refresh(&selection).await;

    assert_eq!(outcome, RefreshOutcome::CacheHit);
    assert_eq!(backend.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_server_error_surfaces_as_panel_error() {
    let backend = spawn_backend().await;
    let panel = MetricPanel::new(MetricKind::Stress, fetcher(&backend, Some(TOKEN)));

    let outcome = panel.refresh(&Selection::default().user("u1")).await;

    match outcome {
        RefreshOutcome::Failed(FetchError::Status { status, url }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/api/Stress_Data/?user_id=u1&range=24h"), "{}", url);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(matches!(panel.view(), PanelView::Error { retryable: true, .. }));
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let backend = spawn_backend().await;
    let panel = MetricPanel::new(MetricKind::HeartRate, fetcher(&backend, None));

    let outcome = panel.refresh(&Selection::default().user("u1")).await;

    assert!(matches!(outcome, RefreshOutcome::Failed(ref e) if e.status() == Some(401)));
}

#[tokio::test]
async fn test_dashboard_summary_end_to_end() {
    let backend = spawn_backend().await;
    let dashboard = Dashboard::with_metrics(
        fetcher(&backend, Some(TOKEN)),
        &[MetricKind::HeartRate, MetricKind::Steps, MetricKind::Stress],
        DashboardOptions::default(),
    );

    let outcomes = dashboard.set_selection(Selection::default().user("u1")).await;
    assert_eq!(outcomes.len(), 3);

    let summary = dashboard.summary();
    assert_eq!(summary.metrics.len(), 2);
    assert_eq!(summary.metrics[&MetricKind::Steps].headline, "11500 steps");
    assert_eq!(summary.metrics[&MetricKind::Steps].status, Status::High);
    assert_eq!(summary.metrics[&MetricKind::HeartRate].status, Status::Normal);

    dashboard.unmount();
    let outcomes = dashboard.refresh_all().await;
    assert!(outcomes.iter().all(|(_, o)| *o == RefreshOutcome::Closed));
}
