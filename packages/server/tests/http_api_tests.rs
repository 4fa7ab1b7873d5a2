//! HTTP-level tests: routing, bearer auth and error bodies.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{fixtures, TestHarness};
use kin_core::common::GlobalRole;
use serde_json::{json, Value};
use test_context::test_context;
use tower::ServiceExt;

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn health_reports_database(ctx: &TestHarness) {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(ctx.app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "ok");
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn admin_routes_require_a_bearer_token(ctx: &TestHarness) {
    let request = Request::get("/api/campaigns").body(Body::empty()).unwrap();
    let (status, body) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let request = Request::get("/api/campaigns")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let request = Request::get("/api/me")
        .header(header::AUTHORIZATION, ctx.bearer(admin.id, &admin.email))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], admin.email.as_str());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn campaigns_are_created_and_claimed_over_http(ctx: &TestHarness) {
    let admin = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let bearer = ctx.bearer(admin.id, &admin.email);
    let slug = fixtures::unique("kin-http");

    let mut request = json_request(
        Method::POST,
        "/api/campaigns",
        json!({ "slug": slug, "is_active": true, "title": "Kin over HTTP" }),
    );
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, bearer.parse().unwrap());
    let (status, campaign) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(campaign["slug"], slug.as_str());

    let request = Request::get(format!("/api/public/campaigns/{}", slug))
        .body(Body::empty())
        .unwrap();
    let (status, public) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["title"], "Kin over HTTP");

    // Missing address fields come back as field errors
    let request = json_request(
        Method::POST,
        &format!("/api/public/campaigns/{}/claims", slug),
        json!({ "name": "Ada", "email": fixtures::unique_email() }),
    );
    let (status, body) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert!(fields.contains(&"address_line1"));

    let request = json_request(
        Method::POST,
        &format!("/api/public/campaigns/{}/claims", slug),
        json!({
            "name": "Ada Lovelace",
            "email": fixtures::unique_email(),
            "address_line1": "1 Analytical Way",
            "city": "Portland",
            "region": "OR",
            "postal_code": "97201"
        }),
    );
    let (status, body) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");

    let campaign_id = campaign["id"].as_str().unwrap();
    let request = Request::get(format!("/api/campaigns/{}/export", campaign_id))
        .header(header::AUTHORIZATION, bearer)
        .body(Body::empty())
        .unwrap();
    let response = ctx.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&slug));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn unknown_public_slugs_are_not_found(ctx: &TestHarness) {
    let request = Request::get(format!(
        "/api/public/campaigns/{}",
        fixtures::unique("missing")
    ))
    .body(Body::empty())
    .unwrap();
    let (status, body) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn removing_the_last_owner_is_a_conflict(ctx: &TestHarness) {
    let owner = fixtures::create_admin(&ctx.db_pool, GlobalRole::Admin).await;
    let campaign = fixtures::create_campaign(&ctx.deps, &owner, |_| {}).await;

    let request = Request::delete(format!(
        "/api/campaigns/{}/members/{}",
        campaign.id, owner.id
    ))
    .header(header::AUTHORIZATION, ctx.bearer(owner.id, &owner.email))
    .body(Body::empty())
    .unwrap();
    let (status, body) = send(ctx.app(), request).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "last_owner");
}
