//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt;

use common::{HangerId, SectionId, SectionRef, UserId, VenueId, WardrobeId};
use doc_store::{DocumentStore, InMemoryDocStore};
use domain::{Hanger, HangerStore};
use lifecycle::{ReclaimerConfig, SectionDoc, UserDoc, VenueDoc, WardrobeDoc};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::InMemoryPaymentGateway;

use api::routes::reservations::AppState;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    gateway: InMemoryPaymentGateway,
    section: SectionRef,
    user: UserId,
}

async fn setup(hanger_count: usize) -> TestApp {
    let (state, _reclaimer, gateway) = api::create_default_state(ReclaimerConfig::default());
    let app = api::create_app(state.clone(), get_metrics_handle());

    let section = SectionRef::new(VenueId::new(), WardrobeId::new(), SectionId::new());
    let user = UserId::new();
    seed_catalog(&state, &section, user, hanger_count).await;

    TestApp {
        app,
        gateway,
        section,
        user,
    }
}

async fn seed_catalog(
    state: &Arc<AppState<InMemoryDocStore, InMemoryPaymentGateway>>,
    section: &SectionRef,
    user: UserId,
    hanger_count: usize,
) {
    state
        .store
        .create(
            &section.venue_path(),
            serde_json::to_value(VenueDoc {
                name: "Paradiso".to_string(),
            })
            .unwrap(),
        )
        .await
        .unwrap();
    state
        .store
        .create(
            &section.wardrobe_path(),
            serde_json::to_value(WardrobeDoc {
                name: "Main hall".to_string(),
            })
            .unwrap(),
        )
        .await
        .unwrap();
    state
        .store
        .create(
            &section.doc_path(),
            serde_json::to_value(SectionDoc {
                name: "Section A".to_string(),
                deposit_cents: 1500,
                currency: "eur".to_string(),
            })
            .unwrap(),
        )
        .await
        .unwrap();
    state
        .store
        .create(
            &UserDoc::path(user),
            serde_json::to_value(UserDoc {
                name: "Robin".to_string(),
                gateway_customer: "cus_0001".to_string(),
            })
            .unwrap(),
        )
        .await
        .unwrap();

    let hangers = HangerStore::new(state.store.clone());
    for _ in 0..hanger_count {
        hangers
            .create(&section.hanger(HangerId::new()), &Hanger::available(Utc::now()))
            .await
            .unwrap();
    }
}

fn check_in_body(test: &TestApp, payment_method: Option<&str>) -> Body {
    Body::from(
        serde_json::to_string(&serde_json::json!({
            "venue_id": test.section.venue.to_string(),
            "wardrobe_id": test.section.wardrobe.to_string(),
            "section_id": test.section.section.to_string(),
            "user_id": test.user.to_string(),
            "payment_method": payment_method,
        }))
        .unwrap(),
    )
}

async fn post_json(app: axum::Router, uri: &str, body: Body) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let test = setup(0).await;
    let (status, json) = get_json(test.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_check_in_creates_reservation() {
    let test = setup(1).await;

    let (status, json) = post_json(
        test.app.clone(),
        "/reservations/check-in",
        check_in_body(&test, None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["payment_intent"]["status"], "requires_confirmation");
    assert!(json["payment_intent"]["client_secret"].is_string());

    let id = json["reservation_id"].as_str().unwrap();
    let (status, json) = get_json(test.app, &format!("/reservations/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "checking_in");
    assert_eq!(json["payment_status"], "initial");
    assert_eq!(json["visible_in_app"], true);
    assert_eq!(json["visible_in_admin"], false);
}

#[tokio::test]
async fn test_full_reservation_flow() {
    let test = setup(1).await;

    let (_, json) = post_json(
        test.app.clone(),
        "/reservations/check-in",
        check_in_body(&test, None),
    )
    .await;
    let id = json["reservation_id"].as_str().unwrap().to_string();
    let intent_id = json["payment_intent"]["id"].as_str().unwrap().to_string();

    let (status, json) = post_json(
        test.app.clone(),
        "/payments/confirm",
        Body::from(
            serde_json::to_string(&serde_json::json!({
                "payment_intent_id": intent_id,
                "payment_method": "pm_card",
            }))
            .unwrap(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["payment_status"], "reserved");
    assert_eq!(json["intent_status"], "requires_capture");

    let (status, json) = post_json(
        test.app.clone(),
        &format!("/reservations/{id}/confirm-check-in"),
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["updated_at"].is_string());

    let (_, json) = get_json(test.app.clone(), &format!("/reservations/{id}")).await;
    assert_eq!(json["state"], "checked_in");
    assert_eq!(json["visible_in_admin"], true);

    let (status, json) = post_json(
        test.app.clone(),
        &format!("/reservations/{id}/check-out"),
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["updated_at"].is_string());

    let (status, json) = post_json(
        test.app.clone(),
        &format!("/reservations/{id}/confirm-check-out"),
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["hanger_updated"].is_string());

    let (_, json) = get_json(test.app, &format!("/reservations/{id}")).await;
    assert_eq!(json["state"], "checked_out");
    assert_eq!(json["visible_in_app"], false);
}

#[tokio::test]
async fn test_capacity_exhausted_conflict() {
    let test = setup(1).await;

    let (status, _) = post_json(
        test.app.clone(),
        "/reservations/check-in",
        check_in_body(&test, None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let body = check_in_body(&test, None);
    let (status, json) = post_json(test.app, "/reservations/check-in", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "capacity_exhausted");
}

#[tokio::test]
async fn test_declined_payment_returns_402() {
    let test = setup(1).await;
    test.gateway.set_decline_on_confirm(true);

    let body = check_in_body(&test, Some("pm_card"));
    let (status, json) = post_json(test.app, "/reservations/check-in", body).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["code"], "payment_rejected");
}

#[tokio::test]
async fn test_unknown_reservation_404() {
    let test = setup(0).await;
    let (status, json) = get_json(
        test.app,
        &format!("/reservations/{}", uuid::Uuid::new_v4()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn test_premature_check_out_conflict() {
    let test = setup(1).await;

    let (_, json) = post_json(
        test.app.clone(),
        "/reservations/check-in",
        check_in_body(&test, None),
    )
    .await;
    let id = json["reservation_id"].as_str().unwrap().to_string();

    let (status, json) = post_json(
        test.app,
        &format!("/reservations/{id}/confirm-check-out"),
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "conflict");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test = setup(0).await;
    let response = test
        .app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
