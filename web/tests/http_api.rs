//! End-to-end HTTP tests: the full router over an in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use pharmacy_auth::token::token_digest;
use pharmacy_auth::AuthConfig;
use pharmacy_core::environment::Clock;
use pharmacy_core::repository::{Session, SessionRepository};
use pharmacy_core::user::{NewUser, Role};
use pharmacy_testing::mocks::{test_clock, FixedClock};
use pharmacy_testing::{fixtures, InMemoryStore};
use pharmacy_web::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState<InMemoryStore>,
    store: InMemoryStore,
    clock: FixedClock,
}

impl TestApp {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let clock = test_clock();
        let state = AppState::new(store.clone(), Arc::new(clock.clone()), AuthConfig::default());
        Self {
            router: build_router(state.clone()),
            state,
            store,
            clock,
        }
    }

    /// Seed an account and a live session for it; returns the bearer token.
    async fn session_for(&self, role: Role) -> String {
        let email = format!("{}@pharmacy.test", uuid::Uuid::new_v4());
        let user = self
            .store
            .seed_user(fixtures::user_record("Staff", &email, role))
            .unwrap();

        let token = format!("token-{}", user.id);
        let now = self.clock.now();
        self.store
            .create_session(&Session {
                token_hash: token_digest(&token),
                user_id: user.id,
                created_at: now,
                expires_at: now + Duration::hours(1),
            })
            .await
            .unwrap();
        token
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_drug(&self, admin: &str, name: &str, price: &str, quantity: i64) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/drugs",
                Some(admin),
                Some(json!({"name": name, "price": price, "quantity": quantity})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_and_readiness_are_public() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_requests_without_a_session_are_rejected() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/api/drugs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .send(Method::GET, "/api/sales", Some("not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/quick-stats")
        .header(header::ACCEPT, "text/html")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?callbackUrl=%2Fapi%2Fquick-stats"
    );
}

#[tokio::test]
async fn test_expired_session_is_rejected_and_removed() {
    let app = TestApp::new();
    let token = app.session_for(Role::Sales).await;

    app.clock.advance(Duration::hours(2));
    let (status, _) = app.send(Method::GET, "/api/drugs", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.session_count().unwrap(), 0);
}

#[tokio::test]
async fn test_sales_role_is_kept_out_of_admin_routes() {
    let app = TestApp::new();
    let clerk = app.session_for(Role::Sales).await;

    for (method, uri, body) in [
        (Method::POST, "/api/drugs", Some(json!({"name": "A", "price": "1.00", "quantity": 1}))),
        (Method::DELETE, "/api/drugs/00000000-0000-0000-0000-000000000001", None),
        (Method::GET, "/api/analytics", None),
        (Method::GET, "/api/users", None),
        (Method::PUT, "/api/users", Some(json!({"userId": "00000000-0000-0000-0000-000000000001", "role": "ADMIN"}))),
    ] {
        let (status, response) = app.send(method.clone(), uri, Some(&clerk), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(response["code"], "FORBIDDEN");
    }

    for uri in ["/api/drugs", "/api/sales", "/api/quick-stats", "/api/auth/session"] {
        let (status, _) = app.send(Method::GET, uri, Some(&clerk), None).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}");
    }
}

#[tokio::test]
async fn test_sale_worked_example_over_http() {
    let app = TestApp::new();
    let admin = app.session_for(Role::Admin).await;
    let clerk = app.session_for(Role::Sales).await;

    let a = app.create_drug(&admin, "A", "10.00", 5).await;
    let b = app.create_drug(&admin, "B", "4.50", 2).await;

    let (status, sale) = app
        .send(
            Method::POST,
            "/api/sales",
            Some(&clerk),
            Some(json!({"items": [{"drugId": a, "quantity": 3}, {"drugId": b, "quantity": 2}]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sale}");
    assert_eq!(sale["total"], "39.00");
    assert_eq!(sale["items"][0]["subtotal"], "30.00");
    assert_eq!(sale["items"][1]["subtotal"], "9.00");
    assert_eq!(sale["items"][1]["drugName"], "B");

    let (_, drug_a) = app.send(Method::GET, &format!("/api/drugs/{a}"), Some(&clerk), None).await;
    let (_, drug_b) = app.send(Method::GET, &format!("/api/drugs/{b}"), Some(&clerk), None).await;
    assert_eq!(drug_a["quantity"], 2);
    assert_eq!(drug_b["quantity"], 0);

    let (status, sales) = app.send(Method::GET, "/api/sales", Some(&clerk), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sale_failures_map_to_statuses() {
    let app = TestApp::new();
    let admin = app.session_for(Role::Admin).await;
    let clerk = app.session_for(Role::Sales).await;
    let a = app.create_drug(&admin, "Paracetamol", "2.00", 1).await;

    let cases = [
        (json!({"items": []}), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        (
            json!({"items": [{"drugId": "00000000-0000-0000-0000-000000000009", "quantity": 1}]}),
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
        ),
        (
            json!({"items": [{"drugId": a, "quantity": 2}]}),
            StatusCode::BAD_REQUEST,
            "INSUFFICIENT_STOCK",
        ),
        (
            json!({"items": [{"drugId": a, "quantity": 0}]}),
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
        ),
        (
            json!({"items": [{"drugId": a, "quantity": 1.5}]}),
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
        ),
        (
            json!({"items": [{"drugId": a, "quantity": 1, "price": "0.01"}]}),
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
        ),
    ];

    for (body, expected_status, expected_code) in cases {
        let (status, response) = app
            .send(Method::POST, "/api/sales", Some(&clerk), Some(body.clone()))
            .await;
        assert_eq!(status, expected_status, "{body}");
        assert_eq!(response["code"], expected_code, "{body}");
    }

    assert_eq!(
        app.store
            .stock_of(a.parse().map(pharmacy_core::drug::DrugId).unwrap())
            .unwrap(),
        Some(1)
    );
    let (_, sales) = app.send(Method::GET, "/api/sales", Some(&clerk), None).await;
    assert!(sales.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_drug_update_and_delete() {
    let app = TestApp::new();
    let admin = app.session_for(Role::Admin).await;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/drugs",
            Some(&admin),
            Some(json!({
                "name": "Loratadine",
                "category": "Antihistamine",
                "price": "6.40",
                "quantity": 20,
                "expiryDate": "2027-01-31"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["price"], "6.40");
    assert_eq!(created["expiryDate"], "2027-01-31");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/api/drugs/{id}"),
            Some(&admin),
            Some(json!({"quantity": 35, "category": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["quantity"], 35);
    assert_eq!(updated["category"], Value::Null);
    assert_eq!(updated["name"], "Loratadine");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/drugs/{id}"),
            Some(&admin),
            Some(json!({"price": "-1.00"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/drugs/{id}"),
            Some(&admin),
            Some(json!({"price": "100000000000"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/drugs",
            Some(&admin),
            Some(json!({"name": "Gold", "price": "100000000000", "quantity": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    for method in [Method::GET, Method::DELETE] {
        let (status, body) = app
            .send(method, "/api/drugs/not-a-uuid", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
    let (status, body) = app
        .send(
            Method::PUT,
            "/api/drugs/not-a-uuid",
            Some(&admin),
            Some(json!({"quantity": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    app.send(
        Method::POST,
        "/api/sales",
        Some(&admin),
        Some(json!({"items": [{"drugId": id, "quantity": 5}]})),
    )
    .await;

    let (status, deleted) = app
        .send(Method::DELETE, &format!("/api/drugs/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);
    assert_eq!(deleted["deletedSaleItems"], 1);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/drugs/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, sales) = app.send(Method::GET, "/api/sales", Some(&admin), None).await;
    assert_eq!(sales[0]["total"], "32.00");
    assert!(sales[0]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_analytics_and_quick_stats() {
    let app = TestApp::new();
    let admin = app.session_for(Role::Admin).await;
    let clerk = app.session_for(Role::Sales).await;

    let (status, empty) = app.send(Method::GET, "/api/analytics", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["totalRevenue"], "0.00");
    assert_eq!(empty["salesCount"], 0);
    assert_eq!(empty["topSellingDrugs"], json!([]));
    assert_eq!(empty["period"], "24h");

    let a = app.create_drug(&admin, "A", "3.00", 10).await;
    app.send(
        Method::POST,
        "/api/sales",
        Some(&clerk),
        Some(json!({"items": [{"drugId": a, "quantity": 4}]})),
    )
    .await;

    let (status, report) = app
        .send(Method::GET, "/api/analytics?period=7d", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["totalRevenue"], "12.00");
    assert_eq!(report["totalDrugsSold"], 4);
    assert_eq!(report["topSellingDrugs"][0]["name"], "A");
    assert_eq!(report["period"], "7d");

    let (status, _) = app
        .send(
            Method::GET,
            "/api/analytics?period=custom&startDate=2026-03-10&endDate=2026-03-01",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::GET,
            "/api/analytics?period=custom&startDate=2026-01-01&endDate=%2B262142-12-31",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, stats) = app.send(Method::GET, "/api/quick-stats", Some(&clerk), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalDrugs"], 1);
    assert_eq!(stats["salesToday"], 1);
    assert_eq!(stats["revenueToday"], "12.00");
}

#[tokio::test]
async fn test_user_administration() {
    let app = TestApp::new();
    let admin = app.session_for(Role::Admin).await;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({"name": "Sam", "email": "Sam@Pharmacy.test", "password": "counter-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["role"], "SALES");
    assert_eq!(created["email"], "sam@pharmacy.test");
    assert!(created.get("passwordHash").is_none());

    let (status, conflict) = app
        .send(
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({"name": "Sam 2", "email": "sam@pharmacy.test", "password": "counter-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["code"], "CONFLICT");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({"name": "Kim", "email": "kim@pharmacy.test", "password": "short"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, promoted) = app
        .send(
            Method::PUT,
            "/api/users",
            Some(&admin),
            Some(json!({"userId": created["id"], "role": "ADMIN"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"], "ADMIN");

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/users",
            Some(&admin),
            Some(json!({"userId": "00000000-0000-0000-0000-000000000042", "role": "SALES"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/users",
            Some(&admin),
            Some(json!({"userId": created["id"], "role": "OWNER"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, users) = app.send(Method::GET, "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(users
        .as_array()
        .unwrap()
        .iter()
        .all(|user| user.get("passwordHash").is_none()));
}

#[tokio::test]
async fn test_sign_in_session_and_sign_out() {
    let app = TestApp::new();
    app.state
        .auth
        .register(NewUser {
            name: "Robin".to_string(),
            email: "robin@pharmacy.test".to_string(),
            password: "correct horse".to_string(),
            role: None,
        })
        .await
        .unwrap();

    let (status, failed) = app
        .send(
            Method::POST,
            "/api/auth/sign-in",
            None,
            Some(json!({"email": "robin@pharmacy.test", "password": "wrong horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(failed["message"], "Invalid credentials");

    let (status, signed_in) = app
        .send(
            Method::POST,
            "/api/auth/sign-in",
            None,
            Some(json!({"email": "ROBIN@pharmacy.test", "password": "correct horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{signed_in}");
    assert_eq!(signed_in["user"]["role"], "SALES");
    let token = signed_in["token"].as_str().unwrap().to_string();

    let (status, session) = app
        .send(Method::GET, "/api/auth/session", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["email"], "robin@pharmacy.test");

    let (status, _) = app
        .send(Method::POST, "/api/auth/sign-out", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::GET, "/api/auth/session", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
