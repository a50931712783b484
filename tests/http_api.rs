mod support;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use std::time::Duration;

use pressroom::{
    application::auth::{Principal, TokenSigner},
    domain::types::{UserRole, UserStatus},
    infra::{http::build_router, security::JwtTokenSigner},
};
use serde_json::{Value, json};
use support::{JWT_SECRET, TestApp, test_app};
use tower::ServiceExt;

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is json")
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request builds")
}

async fn register(router: &Router, username: &str, role: Option<&str>) -> (i64, String) {
    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "username": username, "password": "secret-pass", "role": role }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register body: {body}");
    let token = body["token"].as_str().expect("token").to_string();
    let id = body["user"]["id"].as_i64().expect("user id");
    (id, token)
}

fn router_for(app: &TestApp) -> Router {
    build_router(app.state.clone())
}

#[tokio::test]
async fn register_returns_bearer_token_and_profile() {
    let app = test_app();
    let router = router_for(&app);

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "username": "ada", "password": "secret-pass" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert!(!body["token"].as_str().expect("token").is_empty());
    assert_eq!(body["user"]["username"], "ada");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = test_app();
    let router = router_for(&app);
    register(&router, "ada", None).await;

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "username": "ada", "password": "another-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "duplicate");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app();
    let router = router_for(&app);
    register(&router, "ada", None).await;

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "ada", "password": "not-the-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "nobody", "password": "secret-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn disabled_account_cannot_log_in() {
    let app = test_app();
    let router = router_for(&app);
    let (id, _) = register(&router, "ada", None).await;
    app.users.set_status(id, UserStatus::Disabled);

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "ada", "password": "secret-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");
}

#[tokio::test]
async fn creating_articles_requires_a_token() {
    let app = test_app();
    let router = router_for(&app);
    let article = json!({ "title": "Hello", "content": "World", "preview": "Hi" });

    let (status, body) = send(
        &router,
        json_request("POST", "/api/articles", None, article.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = send(
        &router,
        json_request("POST", "/api/articles", Some("not.a.jwt"), article.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, token) = register(&router, "writer", None).await;
    let (status, body) = send(
        &router,
        json_request("POST", "/api/articles", Some(&token), article),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Hello");

    let (status, body) = send(&router, get_request("/api/articles", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn blank_article_fields_are_rejected() {
    let app = test_app();
    let router = router_for(&app);
    let (_, token) = register(&router, "writer", None).await;

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/articles",
            Some(&token),
            json!({ "title": "  ", "content": "x", "preview": "x" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(app.articles.row_count(), 0);
}

#[tokio::test]
async fn batch_delete_is_admin_only() {
    let app = test_app();
    let router = router_for(&app);
    let (_, user_token) = register(&router, "reader", None).await;
    let (_, admin_token) = register(&router, "root", Some("admin")).await;

    for title in ["one", "two"] {
        let (status, _) = send(
            &router,
            json_request(
                "POST",
                "/api/articles",
                Some(&user_token),
                json!({ "title": title, "content": "body", "preview": "p" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/articles/batch-delete",
            Some(&user_token),
            json!({ "ids": [1, 2] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/articles/batch-delete",
            Some(&admin_token),
            json!({ "ids": [1, 2, 3] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
    assert_eq!(app.articles.live_count(), 2);

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/articles/batch-delete",
            Some(&admin_token),
            json!({ "ids": [1, 2], "hard": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
    assert_eq!(body["mode"], "hard");
    assert_eq!(app.articles.row_count(), 0);
}

#[tokio::test]
async fn unparseable_page_parameters_fall_back_to_defaults() {
    let app = test_app();
    let router = router_for(&app);
    let (_, token) = register(&router, "writer", None).await;
    for n in 1..=3 {
        send(
            &router,
            json_request(
                "POST",
                "/api/articles",
                Some(&token),
                json!({ "title": format!("t{n}"), "content": "c", "preview": "p" }),
            ),
        )
        .await;
    }

    let (status, body) = send(
        &router,
        get_request("/api/articles/page?page=abc&pageSize=2", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["page_size"], 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["has_next"], true);
    assert_eq!(body["articles"].as_array().map(Vec::len), Some(2));
    assert!(body.get("is_search").is_none());
}

#[tokio::test]
async fn unknown_sort_order_is_a_bad_request() {
    let app = test_app();
    let router = router_for(&app);

    let (status, body) = send(
        &router,
        get_request("/api/articles/page?order=password", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn keyword_search_over_http_marks_results() {
    let app = test_app();
    let router = router_for(&app);
    let (_, token) = register(&router, "writer", None).await;
    send(
        &router,
        json_request(
            "POST",
            "/api/articles",
            Some(&token),
            json!({ "title": "My cat story", "content": "purr", "preview": "p" }),
        ),
    )
    .await;

    let (status, body) = send(&router, get_request("/api/articles/page?keyword=cat", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_search"], true);
    assert_eq!(body["keyword"], "cat");
    assert_eq!(body["articles"][0]["title"], "My **cat** story");
}

#[tokio::test]
async fn health_reports_database_up() {
    let app = test_app();
    let router = router_for(&app);

    let response = router
        .clone()
        .oneshot(get_request("/health", None))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let (_, body) = send(&router, get_request("/health", None)).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn likes_accumulate_per_article() {
    let app = test_app();
    let router = router_for(&app);
    let (_, token) = register(&router, "fan", None).await;

    let (status, body) = send(&router, get_request("/api/articles/7/likes", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 0);

    let (status, _) = send(
        &router,
        json_request("POST", "/api/articles/7/like", None, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for expected in 1..=2 {
        let (status, body) = send(
            &router,
            json_request("POST", "/api/articles/7/like", Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["likes"], expected);
        assert_eq!(body["article_id"], 7);
    }

    let (_, body) = send(&router, get_request("/api/articles/7/likes", None)).await;
    assert_eq!(body["likes"], 2);
}

#[tokio::test]
async fn users_only_read_their_own_profile() {
    let app = test_app();
    let router = router_for(&app);
    let (ada, ada_token) = register(&router, "ada", None).await;
    let (bob, _) = register(&router, "bob", None).await;
    let (_, admin_token) = register(&router, "root", Some("admin")).await;

    let (status, body) = send(&router, get_request(&format!("/api/users/{ada}"), Some(&ada_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");

    let (status, body) = send(&router, get_request(&format!("/api/users/{bob}"), Some(&ada_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");

    let (status, body) = send(&router, get_request(&format!("/api/users/{bob}"), Some(&admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");

    let (status, _) = send(&router, get_request("/api/users", Some(&ada_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&router, get_request("/api/users", Some(&admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn profile_updates_validate_and_persist() {
    let app = test_app();
    let router = router_for(&app);
    let (_, token) = register(&router, "ada", None).await;

    let (status, _) = send(
        &router,
        json_request("PUT", "/api/users/me", Some(&token), json!({ "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        json_request(
            "PUT",
            "/api/users/me",
            Some(&token),
            json!({ "email": "ada@example.com", "nickname": "Ada" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["nickname"], "Ada");

    let (_, body) = send(&router, get_request("/api/users/me", Some(&token))).await;
    assert_eq!(body["email"], "ada@example.com");
}

#[tokio::test]
async fn password_change_requires_current_password() {
    let app = test_app();
    let router = router_for(&app);
    let (_, token) = register(&router, "ada", None).await;

    let (status, _) = send(
        &router,
        json_request(
            "PUT",
            "/api/users/me/password",
            Some(&token),
            json!({ "old_password": "wrong-pass", "new_password": "fresh-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        json_request(
            "PUT",
            "/api/users/me/password",
            Some(&token),
            json!({ "old_password": "secret-pass", "new_password": "fresh-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "ada", "password": "fresh-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn disabled_user_loses_self_service_access() {
    let app = test_app();
    let router = router_for(&app);
    let (id, token) = register(&router, "ada", None).await;
    let (_, admin_token) = register(&router, "root", Some("admin")).await;

    let (status, body) = send(
        &router,
        json_request(
            "PUT",
            &format!("/api/users/{id}"),
            Some(&admin_token),
            json!({ "status": "disabled" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "disabled");

    let (status, _) = send(&router, get_request("/api/users/me", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn exchange_rates_round_trip_with_wire_names() {
    let app = test_app();
    let router = router_for(&app);
    let (_, token) = register(&router, "trader", None).await;

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/exchange-rates",
            Some(&token),
            json!({ "fromCurrency": "usd", "toCurrency": "eur", "rate": 0.92 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["fromCurrency"], "USD");
    assert_eq!(body["toCurrency"], "EUR");
    assert!(body["_id"].is_i64());

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/exchange-rates",
            Some(&token),
            json!({ "fromCurrency": "USD", "toCurrency": "EUR", "rate": -1.0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&router, get_request("/api/exchange-rates", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn unknown_article_is_not_found() {
    let app = test_app();
    let router = router_for(&app);

    let (status, body) = send(&router, get_request("/api/articles/99", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn user_listing_trusts_the_admin_claim() {
    let app = test_app();
    let router = router_for(&app);
    let (_, user_token) = register(&router, "ada", None).await;

    // Signed for an account the store has never seen.
    let signer = JwtTokenSigner::new(JWT_SECRET, Duration::from_secs(60));
    let claim_only = signer
        .issue(&Principal {
            user_id: 999,
            username: "ghost".to_string(),
            role: UserRole::Admin,
        })
        .expect("token issues")
        .token;

    let (status, body) = send(&router, get_request("/api/users", Some(&claim_only))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, body) = send(&router, get_request("/api/users", Some(&user_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");

    let (status, _) = send(
        &router,
        json_request(
            "PUT",
            "/api/users/1",
            Some(&claim_only),
            json!({ "status": "disabled" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
