use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Url;
use sdtd_client::{ClaimFetch, ClaimFetcher, ClaimsError, DashboardConfig, HttpClaimSource};
use serde_json::{Value, json};

async fn spawn_test_server(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });
    (addr, handle)
}

/// Same naive matching as the game server: `type` anywhere in the label.
async fn adv_claims(
    State(claims): State<Arc<Vec<Value>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let requested = params.get("type").cloned().unwrap_or_default();
    let matched = claims
        .iter()
        .filter(|claim| {
            claim
                .get("Type")
                .and_then(Value::as_str)
                .is_some_and(|kind| kind.contains(&requested))
        })
        .cloned()
        .collect();
    Json(matched)
}

async fn reset_regions() -> Json<Value> {
    Json(json!([
        {"Name": "spawn", "Type": "notifyreset"},
        {"Name": "trader"}
    ]))
}

fn backend(claims: Vec<Value>) -> Router {
    Router::new()
        .route("/api/getadvclaims", get(adv_claims))
        .route("/api/getresetregions", get(reset_regions))
        .with_state(Arc::new(claims))
}

fn fetcher_for(addr: SocketAddr) -> ClaimFetcher<HttpClaimSource> {
    let base = Url::parse(&format!("http://{addr}")).expect("base url");
    ClaimFetcher::new(HttpClaimSource::new(reqwest::Client::new(), base))
}

#[tokio::test]
async fn refines_backend_substring_matches_over_http() {
    let (addr, server) = spawn_test_server(backend(vec![
        json!({"Type": "notifyreset", "Owner": "a", "x": 10}),
        json!({"Type": "resetzone", "Owner": "b", "x": 20}),
        json!({"Type": "reset", "Owner": "c", "x": 30}),
        json!({"Type": "timed", "Owner": "d", "x": 40}),
    ]))
    .await;

    let fetcher = fetcher_for(addr);
    let claims = fetcher
        .fetch_typed("reset")
        .await
        .expect("reset claims over http");

    let owners: Vec<&str> = claims
        .iter()
        .filter_map(|claim| claim.attributes.get("Owner").and_then(Value::as_str))
        .collect();
    assert_eq!(owners, vec!["b", "c"]);
    assert_eq!(claims[0].attributes.get("x"), Some(&json!(20)));

    server.abort();
}

#[tokio::test]
async fn normal_request_over_http_only_sees_what_backend_returns() {
    let (addr, server) = spawn_test_server(backend(vec![
        json!({"Type": "", "Owner": "plain"}),
        json!({"Type": "normal", "Owner": "tagged"}),
        json!({"Type": "abnormal", "Owner": "lookalike"}),
    ]))
    .await;

    let config = DashboardConfig::new(&format!("http://{addr}")).expect("config");
    let source = HttpClaimSource::from_config(&config).expect("http source");
    let fetcher = ClaimFetcher::new(source);

    // The untyped claim never matches the backend's substring query.
    let claims = fetcher.fetch_typed("normal").await.expect("normal claims");
    let kinds: Vec<&str> = claims.iter().map(|claim| claim.kind.as_str()).collect();
    assert_eq!(kinds, vec!["normal"]);

    server.abort();
}

#[tokio::test]
async fn reset_regions_are_passed_through() {
    let (addr, server) = spawn_test_server(backend(Vec::new())).await;

    let fetched = fetcher_for(addr)
        .fetch_claims("resetregion")
        .await
        .expect("reset regions");
    assert_eq!(
        fetched,
        ClaimFetch::ResetRegions(vec![
            json!({"Name": "spawn", "Type": "notifyreset"}),
            json!({"Name": "trader"}),
        ])
    );

    server.abort();
}

#[tokio::test]
async fn empty_body_falls_back_to_no_claims() {
    let app = Router::new().route("/api/getadvclaims", get(|| async { "" }));
    let (addr, server) = spawn_test_server(app).await;

    let fetched = fetcher_for(addr)
        .fetch_claims("portal")
        .await
        .expect("empty body is not an error");
    assert_eq!(fetched, ClaimFetch::Claims(Vec::new()));

    server.abort();
}

#[tokio::test]
async fn error_status_is_surfaced_with_preview() {
    let app = Router::new().route(
        "/api/getadvclaims",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "server restarting") }),
    );
    let (addr, server) = spawn_test_server(app).await;

    let err = fetcher_for(addr)
        .fetch_claims("timed")
        .await
        .expect_err("503 must propagate");
    match err {
        ClaimsError::Status {
            endpoint,
            status,
            preview,
        } => {
            assert_eq!(endpoint, "/api/getadvclaims?type=timed");
            assert_eq!(status.as_u16(), 503);
            assert_eq!(preview, "server restarting");
        }
        other => panic!("unexpected error: {other}"),
    }

    server.abort();
}

#[tokio::test]
async fn json_body_of_failed_status_is_still_refined() {
    let app = Router::new().route(
        "/api/getadvclaims",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                r#"[{"Type":"timed"},{"Type":"xtimed"}]"#,
            )
        }),
    );
    let (addr, server) = spawn_test_server(app).await;

    let fetched = fetcher_for(addr)
        .fetch_claims("timed")
        .await
        .expect("JSON body is used despite the status");
    assert_eq!(
        fetched,
        ClaimFetch::Claims(vec![sdtd_shared::Claim::new("timed")])
    );

    server.abort();
}

#[tokio::test]
async fn empty_body_of_failed_status_is_an_error() {
    let app = Router::new().route(
        "/api/getresetregions",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let (addr, server) = spawn_test_server(app).await;

    let err = fetcher_for(addr)
        .fetch_claims("resetregion")
        .await
        .expect_err("500 without a body must propagate");
    assert!(matches!(err, ClaimsError::Status { .. }));

    server.abort();
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind closed-port listener");
    let addr = listener.local_addr().expect("closed-port address");
    drop(listener);

    let err = fetcher_for(addr)
        .fetch_claims("timed")
        .await
        .expect_err("closed port must fail");
    assert!(matches!(err, ClaimsError::Transport { .. }));
}

#[tokio::test]
async fn fetch_all_over_http_returns_every_type() {
    let (addr, server) = spawn_test_server(backend(vec![
        json!({"Type": "portal"}),
        json!({"Type": "timedportal"}),
        json!({"Type": "timed"}),
    ]))
    .await;

    let results = fetcher_for(addr)
        .fetch_all(["portal", "timed", "resetregion"], 3)
        .await;
    let counts: Vec<(String, usize)> = results
        .into_iter()
        .map(|(kind, result)| (kind, result.expect("fetch succeeds").len()))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("portal".to_string(), 1),
            ("timed".to_string(), 2),
            ("resetregion".to_string(), 2),
        ]
    );

    server.abort();
}
