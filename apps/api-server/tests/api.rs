//! End-to-end API tests against the in-memory state.

use std::sync::Arc;
use std::time::Duration;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use api_server::handlers::{MiddlewareDeps, configure_routes};
use api_server::middleware::headers::security_headers;
use api_server::state::AppState;
use quill_core::domain::Role;
use quill_core::ports::{RateLimiter, TokenService};
use quill_infra::rate_limit::{InMemoryRateLimiter, RateLimitConfig};
use quill_infra::{JwtConfig, JwtTokenService};

const WINDOW: Duration = Duration::from_secs(900);

fn limiter(max_requests: u32) -> Arc<dyn RateLimiter> {
    Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        max_requests,
        window: WINDOW,
    }))
}

fn deps(state: &AppState, auth_max: u32, max_payload: usize) -> MiddlewareDeps {
    MiddlewareDeps {
        global_limiter: limiter(1000),
        auth_limiter: limiter(auth_max),
        cache: state.cache.clone(),
        cache_ttl: Duration::from_secs(60),
        max_payload,
    }
}

macro_rules! test_app {
    ($state:expr, $deps:expr) => {{
        let state = $state.clone();
        let deps = $deps;
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(|cfg| configure_routes(cfg, &deps)),
        )
        .await
    }};
}

async fn send<S, B>(
    app: &S,
    method: test::TestRequest,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut req = method.uri(uri);
    if let Some(token) = token {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {token}")));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    test::call_service(app, req.to_request()).await
}

async fn register<S, B>(app: &S, username: &str, email: &str) -> (String, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = send(
        app,
        test::TestRequest::post(),
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": email,
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_str().unwrap().to_string();
    (token, user_id)
}

async fn create_blog<S, B>(app: &S, token: &str, title: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = send(
        app,
        test::TestRequest::post(),
        "/api/blogs",
        Some(token),
        Some(json!({
            "title": title,
            "content": "Some long enough content for a post.",
            "tags": ["rust"],
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    test::read_body_json(resp).await
}

#[actix_web::test]
async fn register_never_leaks_the_password_hash() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let resp = send(
        &app,
        test::TestRequest::post(),
        "/api/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let raw = test::read_body(resp).await;
    let text = std::str::from_utf8(&raw).unwrap();
    assert!(!text.contains("password"));
    assert!(!text.contains("$2b$"));

    let body: Value = serde_json::from_str(text).unwrap();
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["username"], "alice");
}

#[actix_web::test]
async fn duplicate_registration_conflicts() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    register(&app, "alice", "alice@example.com").await;

    let resp = send(
        &app,
        test::TestRequest::post(),
        "/api/auth/register",
        None,
        Some(json!({
            "username": "alice2",
            "email": "Alice@Example.com",
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Email already in use");
}

#[actix_web::test]
async fn login_failures_are_indistinguishable() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    register(&app, "alice", "alice@example.com").await;

    let wrong_password = send(
        &app,
        test::TestRequest::post(),
        "/api/auth/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password: Value = test::read_body_json(wrong_password).await;

    let unknown_email = send(
        &app,
        test::TestRequest::post(),
        "/api/auth/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let unknown_email: Value = test::read_body_json(unknown_email).await;

    assert_eq!(wrong_password, unknown_email);
}

#[actix_web::test]
async fn login_token_verifies_to_the_same_user() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (_token, user_id) = register(&app, "alice", "alice@example.com").await;

    let resp = send(
        &app,
        test::TestRequest::post(),
        "/api/auth/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["user"]["lastLogin"].is_string());

    let claims = state
        .tokens
        .verify(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.user_id.to_string(), user_id);
}

#[actix_web::test]
async fn expired_token_is_rejected_with_the_expiry_message() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (_token, user_id) = register(&app, "alice", "alice@example.com").await;

    // Same secret as the in-memory state, but already expired.
    let expired_issuer = JwtTokenService::new(JwtConfig {
        secret: "in-memory-secret".to_string(),
        expiration_days: -1,
    });
    let expired = expired_issuer
        .issue(user_id.parse().unwrap(), Role::User)
        .unwrap();

    let resp = send(
        &app,
        test::TestRequest::get(),
        "/api/auth/me",
        Some(&expired),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Token expired");
}

#[actix_web::test]
async fn missing_token_is_rejected() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let resp = send(&app, test::TestRequest::get(), "/api/auth/me", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "No token, authorization denied");
}

#[actix_web::test]
async fn like_toggle_round_trips() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (author_token, _) = register(&app, "alice", "alice@example.com").await;
    let (liker_token, liker_id) = register(&app, "bob", "bob@example.com").await;

    let blog = create_blog(&app, &author_token, "A Likeable Post").await;
    let blog_id = blog["id"].as_str().unwrap();
    let like_uri = format!("/api/blogs/{blog_id}/like");

    let resp = send(
        &app,
        test::TestRequest::post(),
        &like_uri,
        Some(&liker_token),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let likes = body["likes"].as_array().unwrap();
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0], liker_id.as_str());
    assert_eq!(body["likeCount"], 1);

    let resp = send(
        &app,
        test::TestRequest::post(),
        &like_uri,
        Some(&liker_token),
        None,
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert!(body["likes"].as_array().unwrap().is_empty());
    assert_eq!(body["likeCount"], 0);
}

#[actix_web::test]
async fn comment_deletion_respects_the_policy() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (author_token, _) = register(&app, "alice", "alice@example.com").await;
    let (commenter_token, _) = register(&app, "bob", "bob@example.com").await;
    let (stranger_token, _) = register(&app, "carol", "carol@example.com").await;

    let blog = create_blog(&app, &author_token, "Comment Policy").await;
    let blog_id = blog["id"].as_str().unwrap().to_string();

    let mut comment_ids = Vec::new();
    for text in ["first", "second"] {
        let resp = send(
            &app,
            test::TestRequest::post(),
            &format!("/api/blogs/{blog_id}/comments"),
            Some(&commenter_token),
            Some(json!({"text": text})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let comments = body["comments"].as_array().unwrap();
        comment_ids.push(
            comments.last().unwrap()["id"]
                .as_str()
                .unwrap()
                .to_string(),
        );
    }

    // A stranger may not remove someone else's comment.
    let resp = send(
        &app,
        test::TestRequest::delete(),
        &format!("/api/blogs/{blog_id}/comments/{}", comment_ids[0]),
        Some(&stranger_token),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The comment author may remove their own.
    let resp = send(
        &app,
        test::TestRequest::delete(),
        &format!("/api/blogs/{blog_id}/comments/{}", comment_ids[0]),
        Some(&commenter_token),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);

    // The blog author moderates any comment.
    let resp = send(
        &app,
        test::TestRequest::delete(),
        &format!("/api/blogs/{blog_id}/comments/{}", comment_ids[1]),
        Some(&author_token),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["comments"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn updating_someone_elses_post_is_forbidden_and_harmless() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (author_token, _) = register(&app, "alice", "alice@example.com").await;
    let (other_token, _) = register(&app, "bob", "bob@example.com").await;

    let blog = create_blog(&app, &author_token, "Original Title").await;
    let blog_id = blog["id"].as_str().unwrap();

    let resp = send(
        &app,
        test::TestRequest::put(),
        &format!("/api/blogs/{blog_id}"),
        Some(&other_token),
        Some(json!({"title": "Hijacked"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
        &app,
        test::TestRequest::get(),
        &format!("/api/blogs/{blog_id}"),
        Some(&author_token),
        None,
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Original Title");
}

#[actix_web::test]
async fn title_update_regenerates_a_suffixed_slug() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (token, _) = register(&app, "alice", "alice@example.com").await;
    let blog = create_blog(&app, &token, "First Title").await;
    assert_eq!(blog["slug"], "first-title");
    let blog_id = blog["id"].as_str().unwrap();

    let resp = send(
        &app,
        test::TestRequest::put(),
        &format!("/api/blogs/{blog_id}"),
        Some(&token),
        Some(json!({"title": "Second Title"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    let slug = body["slug"].as_str().unwrap();
    assert!(slug.starts_with("second-title-"));
    let suffix = slug.rsplit('-').next().unwrap();
    assert_eq!(suffix.len(), 4);
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
}

#[actix_web::test]
async fn blogs_are_fetchable_by_slug() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (token, _) = register(&app, "alice", "alice@example.com").await;
    create_blog(&app, &token, "Slugworthy Post").await;

    let resp = send(
        &app,
        test::TestRequest::get(),
        "/api/blogs/slugworthy-post",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Slugworthy Post");
    assert_eq!(body["author"]["username"], "alice");
}

#[actix_web::test]
async fn my_blogs_lists_only_the_callers_posts() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (alice_token, _) = register(&app, "alice", "alice@example.com").await;
    let (bob_token, _) = register(&app, "bob", "bob@example.com").await;

    create_blog(&app, &alice_token, "Alice One").await;
    create_blog(&app, &alice_token, "Alice Two").await;
    create_blog(&app, &bob_token, "Bob One").await;

    let resp = send(
        &app,
        test::TestRequest::get(),
        "/api/blogs/my-blogs",
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.iter().all(|t| t.starts_with("Alice")));
}

#[actix_web::test]
async fn anonymous_blog_reads_are_served_from_cache() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (token, _) = register(&app, "alice", "alice@example.com").await;
    create_blog(&app, &token, "Cached Post").await;

    let resp = send(&app, test::TestRequest::get(), "/api/blogs", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let first: Value = test::read_body_json(resp).await;

    // The store happens on a spawned task after the body finishes.
    actix_web::rt::time::sleep(Duration::from_millis(50)).await;

    // Mutate behind the cache's back.
    let blog_id = first[0]["id"].as_str().unwrap();
    let resp = send(
        &app,
        test::TestRequest::put(),
        &format!("/api/blogs/{blog_id}"),
        Some(&token),
        Some(json!({"title": "Renamed Post"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    test::read_body(resp).await;

    let resp = send(&app, test::TestRequest::get(), "/api/blogs", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("X-Cache").map(|v| v.to_str().unwrap()),
        Some("HIT")
    );
    let second: Value = test::read_body_json(resp).await;
    assert_eq!(first, second);

    // Authenticated reads bypass the cache and see the update.
    let resp = send(
        &app,
        test::TestRequest::get(),
        "/api/blogs",
        Some(&token),
        None,
    )
    .await;
    let fresh: Value = test::read_body_json(resp).await;
    assert_eq!(fresh[0]["title"], "Renamed Post");
}

#[actix_web::test]
async fn string_fields_are_html_escaped() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (token, _) = register(&app, "alice", "alice@example.com").await;

    let resp = send(
        &app,
        test::TestRequest::post(),
        "/api/blogs",
        Some(&token),
        Some(json!({
            "title": "Safe Title",
            "content": "<script>alert('xss')</script>",
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;

    let content = body["content"].as_str().unwrap();
    assert!(!content.contains('<'));
    assert!(content.contains("&lt;script&gt;"));
}

#[actix_web::test]
async fn security_headers_are_attached_to_responses() {
    let state = AppState::in_memory();
    let deps = deps(&state, 10, 1 << 20);
    let app = test::init_service(
        App::new()
            .wrap(security_headers(false))
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| configure_routes(cfg, &deps)),
    )
    .await;

    let resp = send(&app, test::TestRequest::get(), "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let headers = resp.headers();
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
    assert!(headers.contains_key("Content-Security-Policy"));
    // HSTS only ships in production mode
    assert!(!headers.contains_key("Strict-Transport-Security"));
}

#[actix_web::test]
async fn auth_endpoints_rate_limit_before_the_global_cap() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 3, 1 << 20));

    register(&app, "alice", "alice@example.com").await;

    let mut last_status = StatusCode::OK;
    for _ in 0..4 {
        let resp = send(
            &app,
            test::TestRequest::post(),
            "/api/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong"})),
        )
        .await;
        last_status = resp.status();
    }
    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
}

#[actix_web::test]
async fn oversized_payloads_are_rejected_with_413() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 256));

    let resp = send(
        &app,
        test::TestRequest::post(),
        "/api/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "x".repeat(600),
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Request payload is too large");
}

#[actix_web::test]
async fn change_password_requires_the_current_one() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (token, _) = register(&app, "alice", "alice@example.com").await;

    let resp = send(
        &app,
        test::TestRequest::put(),
        "/api/auth/change-password",
        Some(&token),
        Some(json!({"currentPassword": "nope", "newPassword": "fresh-secret"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Current password is incorrect");

    let resp = send(
        &app,
        test::TestRequest::put(),
        "/api/auth/change-password",
        Some(&token),
        Some(json!({"currentPassword": "secret1", "newPassword": "fresh-secret"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Password updated successfully");

    // Old credentials no longer work, new ones do.
    let resp = send(
        &app,
        test::TestRequest::post(),
        "/api/auth/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(
        &app,
        test::TestRequest::post(),
        "/api/auth/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "fresh-secret"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn profile_and_settings_updates_round_trip() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (token, _) = register(&app, "alice", "alice@example.com").await;

    let resp = send(
        &app,
        test::TestRequest::put(),
        "/api/auth/update-profile",
        Some(&token),
        Some(json!({"avatarUrl": "avatar3.png", "phoneNumber": "+1 555 123 4567"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["avatarUrl"], "avatar3.png");

    let resp = send(
        &app,
        test::TestRequest::put(),
        "/api/auth/update-settings",
        Some(&token),
        Some(json!({"darkMode": true, "language": "ja"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["preferences"]["darkMode"], true);
    assert_eq!(body["user"]["preferences"]["language"], "ja");
    // Untouched settings keep their defaults.
    assert_eq!(body["user"]["preferences"]["emailNotifications"], true);
}

#[actix_web::test]
async fn deleting_a_post_removes_it() {
    let state = AppState::in_memory();
    let app = test_app!(state, deps(&state, 10, 1 << 20));

    let (token, _) = register(&app, "alice", "alice@example.com").await;
    let blog = create_blog(&app, &token, "Short Lived").await;
    let blog_id = blog["id"].as_str().unwrap();

    let resp = send(
        &app,
        test::TestRequest::delete(),
        &format!("/api/blogs/{blog_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
        &app,
        test::TestRequest::get(),
        &format!("/api/blogs/{blog_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Blog not found");
}
