//! HTTP API tests over in-memory stores.

mod common;

use axum::http::{Method, StatusCode};
use common::{create_point, dummy_token, in_memory_router, send};
use serde_json::json;

#[tokio::test]
async fn dummy_login_issues_token_for_each_role() {
    let app = in_memory_router();

    for role in ["employee", "moderator"] {
        let token = dummy_token(&app, role).await;
        assert!(!token.is_empty());
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/dummyLogin",
        None,
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = in_memory_router();

    let (status, _) = send(&app, Method::GET, "/pvz", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/pvz", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_are_enforced() {
    let app = in_memory_router();
    let employee = dummy_token(&app, "employee").await;
    let moderator = dummy_token(&app, "moderator").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/pvz",
        Some(&employee),
        Some(json!({ "city": "Москва" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "access denied: insufficient permissions");

    let pvz_id = create_point(&app, "Казань").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/receptions",
        Some(&moderator),
        Some(json!({ "pvzId": pvz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nothing was opened by the rejected call.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/pvz/{}/close_last_reception", pvz_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_pvz_rejects_unknown_city() {
    let app = in_memory_router();
    let moderator = dummy_token(&app, "moderator").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/pvz",
        Some(&moderator),
        Some(json!({ "city": "Новосибирск" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_pvz_keeps_supplied_id_and_date_at_microsecond_precision() {
    let app = in_memory_router();
    let moderator = dummy_token(&app, "moderator").await;
    let id = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    let (status, pvz) = send(
        &app,
        Method::POST,
        "/pvz",
        Some(&moderator),
        Some(json!({
            "id": id,
            "registrationDate": "2025-03-01T12:30:00.123456789Z",
            "city": "Казань",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(pvz["id"], id);
    assert_eq!(pvz["registrationDate"], "2025-03-01T12:30:00.123456Z");

    let (_, listing) = send(&app, Method::GET, "/pvz", Some(&moderator), None).await;
    assert_eq!(listing[0]["pvz"], pvz);
}

#[tokio::test]
async fn reception_lifecycle_end_to_end() {
    let app = in_memory_router();
    let employee = dummy_token(&app, "employee").await;
    let pvz_id = create_point(&app, "Москва").await;

    let (status, reception) = send(
        &app,
        Method::POST,
        "/receptions",
        Some(&employee),
        Some(json!({ "pvzId": pvz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reception["status"], "in_progress");
    assert_eq!(reception["pvzId"], pvz_id.as_str());

    let (status, body) = send(
        &app,
        Method::POST,
        "/receptions",
        Some(&employee),
        Some(json!({ "pvzId": pvz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "reception already open");

    let mut product_ids = Vec::new();
    for product_type in ["электроника", "одежда", "обувь"] {
        let (status, product) = send(
            &app,
            Method::POST,
            "/products",
            Some(&employee),
            Some(json!({ "type": product_type, "pvzId": pvz_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product["type"], product_type);
        assert_eq!(product["receptionId"], reception["id"]);
        product_ids.push(product["id"].clone());
    }

    let (status, removed) = send(
        &app,
        Method::POST,
        &format!("/pvz/{}/delete_last_product", pvz_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["id"], product_ids[2]);

    let (status, closed) = send(
        &app,
        Method::POST,
        &format!("/pvz/{}/close_last_reception", pvz_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["id"], reception["id"]);
    assert_eq!(closed["status"], "close");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/pvz/{}/close_last_reception", pvz_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "reception already closed");

    let (status, body) = send(
        &app,
        Method::POST,
        "/products",
        Some(&employee),
        Some(json!({ "type": "обувь", "pvzId": pvz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "reception is closed, unable to interact");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/pvz/{}/delete_last_product", pvz_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The listing shows the closed reception with its two remaining products, oldest first.
    let (status, listing) = send(&app, Method::GET, "/pvz", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = listing.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["pvz"]["id"], pvz_id.as_str());
    let receptions = entries[0]["receptions"].as_array().unwrap();
    assert_eq!(receptions.len(), 1);
    let products = receptions[0]["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["id"], product_ids[0]);
    assert_eq!(products[1]["id"], product_ids[1]);
}

#[tokio::test]
async fn product_for_point_without_reception_is_not_found() {
    let app = in_memory_router();
    let employee = dummy_token(&app, "employee").await;
    let pvz_id = create_point(&app, "Санкт-Петербург").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/products",
        Some(&employee),
        Some(json!({ "type": "обувь", "pvzId": pvz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_from_empty_reception_is_not_found() {
    let app = in_memory_router();
    let employee = dummy_token(&app, "employee").await;
    let pvz_id = create_point(&app, "Москва").await;

    send(
        &app,
        Method::POST,
        "/receptions",
        Some(&employee),
        Some(json!({ "pvzId": pvz_id })),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/pvz/{}/delete_last_product", pvz_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_pvz_paginates_and_filters() {
    let app = in_memory_router();
    let moderator = dummy_token(&app, "moderator").await;

    for day in 1..=5 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/pvz",
            Some(&moderator),
            Some(json!({
                "city": "Москва",
                "registrationDate": format!("2025-01-0{}T10:00:00Z", day),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = send(
        &app,
        Method::GET,
        "/pvz?page=2&limit=2",
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["pvz"]["registrationDate"], "2025-01-03T10:00:00Z");
    assert_eq!(page[1]["pvz"]["registrationDate"], "2025-01-02T10:00:00Z");

    let (status, window) = send(
        &app,
        Method::GET,
        "/pvz?startDate=2025-01-02T10:00:00Z&endDate=2025-01-04T10:00:00Z",
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(window.as_array().unwrap().len(), 3);

    for query in ["limit=0", "limit=31", "page=0", "page=abc", "startDate=yesterday"] {
        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/pvz?{}", query),
            Some(&moderator),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {}", query);
    }
}

#[tokio::test]
async fn register_then_login() {
    let app = in_memory_router();
    let credentials = json!({
        "email": "worker@mail.ru",
        "password": "s3cret",
        "role": "employee",
    });

    let (status, user) = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(credentials.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "worker@mail.ru");
    assert_eq!(user["role"], "employee");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password_hash").is_none());

    let (status, _) = send(&app, Method::POST, "/register", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "worker@mail.ru", "password": "s3cret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, _) = send(&app, Method::GET, "/pvz", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "worker@mail.ru", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_malformed_email() {
    let app = in_memory_router();
    let (status, _) = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "x", "role": "moderator" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
