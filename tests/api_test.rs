use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use transport_backend::{
    database::memory::{MemoryShipmentStore, MemoryUserStore},
    routes,
    services::token_service::TokenService,
    utils::crypto::CredentialVerifier,
    AppState,
};

const SECRET: &str = "router-test-secret-that-is-long-enough";

fn app_with_rps(auth_rps: u32) -> Router {
    let tokens = TokenService::new(SECRET, Duration::hours(1)).expect("token service");
    let state = AppState::from_parts(
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryShipmentStore::new()),
        tokens,
        CredentialVerifier::low_cost(),
    );
    routes::router(state, auth_rps)
}

fn app() -> Router {
    app_with_rps(1000)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let value = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn register(app: &Router, email: &str, role: Option<&str>) -> (String, JsonValue) {
    let mut body = json!({
        "email": email,
        "password": "secret1",
        "firstName": "Test",
        "lastName": "Person"
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    let (status, resp) = send(app, Method::POST, "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", resp);
    (resp["token"].as_str().unwrap().to_string(), resp["user"].clone())
}

fn shipment_body() -> JsonValue {
    json!({
        "shipperName": "Acme Corp",
        "shipperPhone": "555-0100",
        "shipperAddress": "1 Main St",
        "shipperCity": "Dallas",
        "shipperState": "TX",
        "shipperZip": "75001",
        "consigneeName": "Globex",
        "consigneePhone": "555-0199",
        "consigneeAddress": "9 Elm St",
        "consigneeCity": "Austin",
        "consigneeState": "TX",
        "consigneeZip": "73301",
        "cargoDescription": "Pallets",
        "weight": 10.5,
        "vehicleType": "TRUCK",
        "estimatedRate": 100.0,
        "pickupDate": "2026-10-20",
        "estimatedDelivery": "2026-10-22"
    })
}

#[tokio::test]
async fn health_answers_ok() {
    let (status, body) = send(&app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn register_then_me() {
    let app = app();
    let (token, user) = register(&app, "a@x.com", None).await;
    assert!(!token.is_empty());
    assert_eq!(user["email"], "a@x.com");
    assert_eq!(user["role"], "CUSTOMER");
    assert_eq!(user["fullName"], "Test Person");
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());

    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user["id"]);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    register(&app, "a@x.com", None).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "a@x.com",
            "password": "secret2",
            "firstName": "Again",
            "lastName": "Person"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn invalid_registration_payload_is_rejected() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "nope",
            "password": "1",
            "firstName": "A",
            "lastName": "B"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILURE");
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let app = app();
    register(&app, "a@x.com", None).await;

    let (wrong_status, wrong) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "wrong" })),
    )
    .await;
    let (unknown_status, unknown) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ghost@x.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong["code"], "INVALID_CREDENTIALS");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/shipments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_MALFORMED");

    let foreign = TokenService::new("some-other-secret-of-adequate-length!", Duration::hours(1))
        .unwrap();
    let (_, user) = register(&app, "a@x.com", None).await;
    let user: transport_backend::models::user::User = serde_json::from_value(user).unwrap();
    let forged = foreign.issue(&user).unwrap();
    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_SIGNATURE_INVALID");
}

#[tokio::test]
async fn shipment_lifecycle() {
    let app = app();
    let (customer, customer_user) = register(&app, "c@x.com", None).await;
    let (dispatcher, _) = register(&app, "d@x.com", Some("DISPATCHER")).await;
    let (_, driver_user) = register(&app, "drv@x.com", Some("DRIVER")).await;

    let mut body = shipment_body();
    body["status"] = json!("DELIVERED");
    let (status, created) =
        send(&app, Method::POST, "/api/shipments", Some(&customer), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["weight"], 10.5);
    assert_eq!(created["currency"], "USD");
    assert_eq!(created["createdById"], customer_user["id"]);
    let id = created["id"].as_str().unwrap().to_string();
    let tracking = created["trackingNumber"].as_str().unwrap().to_string();
    assert!(tracking.starts_with("TRK"));

    let (status, tracked) =
        send(&app, Method::GET, &format!("/api/track/{}", tracking), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracked["id"], created["id"]);

    let assign = json!({ "driverId": driver_user["id"] });
    let uri = format!("/api/shipments/{}/assign-driver", id);
    let (status, _) = send(&app, Method::POST, &uri, Some(&customer), Some(assign.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let not_a_driver = json!({ "driverId": customer_user["id"] });
    let (status, body) =
        send(&app, Method::POST, &uri, Some(&dispatcher), Some(not_a_driver)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_DRIVER");

    let (status, assigned) = send(&app, Method::POST, &uri, Some(&dispatcher), Some(assign)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["status"], "ASSIGNED");
    assert_eq!(assigned["driverId"], driver_user["id"]);

    let (status, flagged) = send(
        &app,
        Method::POST,
        &format!("/api/shipments/{}/flag", id),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flagged["status"], "ASSIGNED");
    assert!(flagged["notes"]
        .as_str()
        .unwrap()
        .starts_with("[FLAGGED FOR REVIEW - "));

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/api/shipments/{}", id),
        Some(&customer),
        Some(json!({ "status": "IN_TRANSIT" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "IN_TRANSIT");
    assert_eq!(updated["trackingNumber"], tracking.as_str());

    let shipment_uri = format!("/api/shipments/{}", id);
    let (status, _) = send(&app, Method::DELETE, &shipment_uri, Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, deleted) = send(&app, Method::DELETE, &shipment_uri, Some(&dispatcher), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], created["id"]);
    let (status, body) = send(&app, Method::GET, &shipment_uri, Some(&dispatcher), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_tracking_number_is_404() {
    let (status, body) = send(&app(), Method::GET, "/api/track/TRKMISSING", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn user_listing_is_staff_only_and_paginated() {
    let app = app();
    let (admin, _) = register(&app, "admin@x.com", Some("ADMIN")).await;
    let (customer, _) = register(&app, "c1@x.com", None).await;
    register(&app, "c2@x.com", None).await;
    register(&app, "d1@x.com", Some("DRIVER")).await;
    register(&app, "d2@x.com", Some("DRIVER")).await;

    let (status, body) = send(&app, Method::GET, "/api/users", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, page) = send(
        &app,
        Method::GET,
        "/api/users?role=DRIVER&page=1&limit=10",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["meta"]["total"], 2);
    assert_eq!(page["meta"]["totalPages"], 1);
    assert_eq!(page["meta"]["hasNextPage"], false);
    assert_eq!(page["meta"]["hasPreviousPage"], false);

    let (status, body) = send(&app, Method::GET, "/api/users?limit=500", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PAGINATION");

    let (status, drivers) = send(&app, Method::GET, "/api/users/drivers", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(drivers.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn users_manage_only_their_own_profile() {
    let app = app();
    let (token, me) = register(&app, "self@x.com", None).await;
    let (_, other) = register(&app, "other@x.com", None).await;
    let me_uri = format!("/api/users/{}", me["id"].as_str().unwrap());
    let other_uri = format!("/api/users/{}", other["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::GET, &other_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &me_uri,
        Some(&token),
        Some(json!({ "role": "ADMIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &me_uri,
        Some(&token),
        Some(json!({ "phone": "555-0142" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "555-0142");
    assert_eq!(updated["role"], "CUSTOMER");
}

#[tokio::test]
async fn admin_creates_and_deletes_users() {
    let app = app();
    let (admin, _) = register(&app, "admin@x.com", Some("ADMIN")).await;
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(&admin),
        Some(json!({
            "email": "new.driver@x.com",
            "password": "secret1",
            "firstName": "New",
            "lastName": "Driver",
            "role": "DRIVER"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["isActive"], true);
    assert!(created.get("password").is_none());

    let uri = format!("/api/users/{}", created["id"].as_str().unwrap());
    let (status, deleted) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["email"], "new.driver@x.com");
    let (status, _) = send(&app, Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn auth_routes_are_rate_limited() {
    let app = app_with_rps(2);
    let login = || json!({ "email": "ghost@x.com", "password": "whatever" });
    for _ in 0..2 {
        let (status, _) = send(&app, Method::POST, "/api/auth/login", None, Some(login())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = send(&app, Method::POST, "/api/auth/login", None, Some(login())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn account_changes_apply_to_tokens_already_issued() {
    let app = app();
    let (root, _) = register(&app, "root@x.com", Some("ADMIN")).await;
    let (demoted, demoted_user) = register(&app, "second@x.com", Some("ADMIN")).await;
    let (disabled, disabled_user) = register(&app, "off@x.com", None).await;
    let (removed, removed_user) = register(&app, "gone@x.com", None).await;
    let uri = |user: &JsonValue| format!("/api/users/{}", user["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::GET, "/api/users", Some(&demoted), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri(&demoted_user),
        Some(&root),
        Some(json!({ "role": "CUSTOMER" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::GET, "/api/users", Some(&demoted), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri(&disabled_user),
        Some(&root),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&disabled), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCOUNT_INACTIVE");

    let (status, _) = send(&app, Method::DELETE, &uri(&removed_user), Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::GET, "/api/shipments", Some(&removed), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn me_follows_an_email_change() {
    let app = app();
    let (token, user) = register(&app, "before@x.com", None).await;
    let uri = format!("/api/users/{}", user["id"].as_str().unwrap());
    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "email": "after@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "after@x.com");
}

#[tokio::test]
async fn overlong_fields_are_validation_failures() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "long@x.com",
            "password": "secret1",
            "firstName": "F".repeat(101),
            "lastName": "Person"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILURE");

    let (token, _) = register(&app, "c@x.com", None).await;
    let mut shipment = shipment_body();
    shipment["dimensions"] = json!("x".repeat(101));
    let (status, body) =
        send(&app, Method::POST, "/api/shipments", Some(&token), Some(shipment)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILURE");
}
