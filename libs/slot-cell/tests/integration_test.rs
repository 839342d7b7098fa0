use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};
use slot_cell::models::{CreateSlotRequest, UpdateSlotRequest};
use slot_cell::router::slot_routes;

async fn create_test_app(config: AppConfig) -> Router {
    slot_routes(Arc::new(config))
}

fn mock_config(mock_server: &MockServer) -> AppConfig {
    TestConfig::with_supabase_url(&mock_server.uri()).to_app_config()
}

fn tomorrow() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(1)
}

fn time(s: &str) -> NaiveTime {
    s.parse().unwrap()
}

/// The account gate re-reads the caller's row on every request.
async fn mock_active_account(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("select", "is_blocked,is_active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::account_flags_row(false, true)
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_create_slot_success() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    // No existing slots on that date, so the overlap check passes.
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let slot_id = Uuid::new_v4();
    let date = tomorrow().format("%Y-%m-%d").to_string();
    Mock::given(method("POST"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                slot_id,
                &specialist.id,
                &date,
                "13:00:00",
                "13:30:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    let request_body = CreateSlotRequest {
        date: tomorrow(),
        start_time: time("13:00:00"),
        end_time: time("13:30:00"),
        context: Some("First consultation".to_string()),
    };

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&request_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["success"], true);
    assert_eq!(json_response["slot"]["id"], slot_id.to_string());
    assert_eq!(json_response["slot"]["is_available"], true);
}

#[tokio::test]
async fn test_create_slot_rejects_overlap() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let date = tomorrow().format("%Y-%m-%d").to_string();
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                Uuid::new_v4(),
                &specialist.id,
                &date,
                "13:00:00",
                "13:30:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    let request_body = CreateSlotRequest {
        date: tomorrow(),
        start_time: time("13:15:00"),
        end_time: time("13:45:00"),
        context: None,
    };

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&request_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(
        json_response["error"],
        "Slot overlaps another slot of this specialist"
    );
}

#[tokio::test]
async fn test_create_slot_touching_endpoints_allowed() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let date = tomorrow().format("%Y-%m-%d").to_string();

    // An existing 13:00-13:30 slot does not collide with 13:30-14:00.
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                Uuid::new_v4(),
                &specialist.id,
                &date,
                "13:00:00",
                "13:30:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                Uuid::new_v4(),
                &specialist.id,
                &date,
                "13:30:00",
                "14:00:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    let request_body = CreateSlotRequest {
        date: tomorrow(),
        start_time: time("13:30:00"),
        end_time: time("14:00:00"),
        context: None,
    };

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&request_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_slot_rejects_end_before_start() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let request_body = CreateSlotRequest {
        date: tomorrow(),
        start_time: time("14:00:00"),
        end_time: time("14:00:00"),
        context: None,
    };

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&request_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["error"], "End time must be later than start time");
}

#[tokio::test]
async fn test_create_slot_rejects_yesterday() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let request_body = CreateSlotRequest {
        date: Utc::now().date_naive() - Duration::days(1),
        start_time: time("13:00:00"),
        end_time: time("13:30:00"),
        context: None,
    };

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&request_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["error"], "Date cannot be earlier than today");
}

#[tokio::test]
async fn test_create_slot_denied_for_client_role() {
    let mock_server = MockServer::start().await;
    let client = TestUser::client("ivan");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&client, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let request_body = CreateSlotRequest {
        date: tomorrow(),
        start_time: time("13:00:00"),
        end_time: time("13:30:00"),
        context: None,
    };

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&request_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_slot_endpoints_require_token() {
    let config = TestConfig::default().to_app_config();

    let slot_uri = format!("/{}", Uuid::new_v4());
    let protected_endpoints = vec![
        ("POST", "/"),
        ("GET", "/"),
        ("GET", "/open"),
        ("PUT", slot_uri.as_str()),
        ("DELETE", slot_uri.as_str()),
    ];

    for (http_method, uri) in protected_endpoints {
        let app = create_test_app(config.clone()).await;

        let request = Request::builder()
            .method(http_method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "Failed for {} {}",
            http_method,
            uri
        );
    }
}

#[tokio::test]
async fn test_update_slot_success() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let slot_id = Uuid::new_v4();
    let date = tomorrow().format("%Y-%m-%d").to_string();

    // Ownership-scoped lookup of the slot under edit.
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                slot_id,
                &specialist.id,
                &date,
                "13:00:00",
                "13:30:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    // Overlap query excludes the slot being updated.
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("neq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                slot_id,
                &specialist.id,
                &date,
                "15:00:00",
                "15:30:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    let update_body = UpdateSlotRequest {
        date: None,
        start_time: Some(time("15:00:00")),
        end_time: Some(time("15:30:00")),
        context: None,
        specialist_username: None,
    };

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}", slot_id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&update_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["slot"]["start_time"], "15:00:00");
}

#[tokio::test]
async fn test_update_foreign_slot_reads_as_not_found() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    // The lookup is scoped by specialist_id, so another specialist's slot
    // comes back empty.
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let update_body = UpdateSlotRequest {
        date: None,
        start_time: Some(time("15:00:00")),
        end_time: Some(time("15:30:00")),
        context: None,
        specialist_username: None,
    };

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&update_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["error"], "You have no slot with this id");
}

#[tokio::test]
async fn test_update_slot_unknown_specialist_reassignment() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let slot_id = Uuid::new_v4();
    let date = tomorrow().format("%Y-%m-%d").to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                slot_id,
                &specialist.id,
                &date,
                "13:00:00",
                "13:30:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("username", "eq.ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let update_body = UpdateSlotRequest {
        date: None,
        start_time: None,
        end_time: None,
        context: None,
        specialist_username: Some("ghost".to_string()),
    };

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}", slot_id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&update_body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(
        json_response["error"],
        "Specialist with this username does not exist"
    );
}

#[tokio::test]
async fn test_delete_slot_success() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let slot_id = Uuid::new_v4();
    let date = tomorrow().format("%Y-%m-%d").to_string();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                slot_id,
                &specialist.id,
                &date,
                "13:00:00",
                "13:30:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("DELETE")
        .uri(&format!("/{}", slot_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_foreign_slot_reads_as_not_found() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("DELETE")
        .uri(&format!("/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_open_slots_project_specialist_username() {
    let mock_server = MockServer::start().await;
    let client = TestUser::client("ivan");
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&client, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let slot_id = Uuid::new_v4();
    let date = tomorrow().format("%Y-%m-%d").to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .and(query_param("is_available", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                slot_id,
                &specialist.id,
                &date,
                "13:00:00",
                "13:30:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("select", "id,username"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": specialist.id, "username": specialist.username }
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/open")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["slots"][0]["id"], slot_id.to_string());
    assert_eq!(json_response["slots"][0]["specialist_username"], "maria");
}

#[tokio::test]
async fn test_open_slots_denied_for_specialist_role() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let request = Request::builder()
        .method("GET")
        .uri("/open")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_my_slots_include_taken_ones() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    mock_active_account(&mock_server).await;

    let date = tomorrow().format("%Y-%m-%d").to_string();
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .and(query_param("specialist_id", format!("eq.{}", specialist.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_row(
                Uuid::new_v4(),
                &specialist.id,
                &date,
                "13:00:00",
                "13:30:00",
                true
            ),
            MockSupabaseResponses::slot_row(
                Uuid::new_v4(),
                &specialist.id,
                &date,
                "14:00:00",
                "14:30:00",
                false
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let slots = json_response["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[1]["is_available"], false);
}

#[tokio::test]
async fn test_blocked_account_is_rejected() {
    let mock_server = MockServer::start().await;
    let specialist = TestUser::specialist("maria");
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;
    let token = JwtTestUtils::create_test_token(&specialist, &config.jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("select", "is_blocked,is_active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::account_flags_row(true, true)
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["error"], "Your account is blocked");
}
