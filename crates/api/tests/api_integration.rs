//! Integration tests for the gateway HTTP surface.

use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, Utc};
use common::{BookUid, LibraryUid, ReservationUid, USER_NAME_HEADER, Username};
use domain::{Book, BookCondition, Library, Reservation, ReservationStatus};
use message_bus::{InMemoryMessageBus, MessageBus};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    InMemoryInventoryService, InMemoryRatingService, InMemoryReservationService,
    RETURN_BOOK_RETRY_TOPIC,
};
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

const USER: &str = "Test Max";

struct TestApp {
    app: axum::Router,
    inventory: InMemoryInventoryService,
    reservations: InMemoryReservationService,
    rating: InMemoryRatingService,
    bus: InMemoryMessageBus,
    library_uid: LibraryUid,
    book_uid: BookUid,
}

impl TestApp {
    /// One library in Moscow stocking one book, plus an empty one elsewhere.
    fn new() -> Self {
        let inventory = InMemoryInventoryService::new();
        let reservations = InMemoryReservationService::new();
        let rating = InMemoryRatingService::new();
        let bus = InMemoryMessageBus::new();

        let library_uid = LibraryUid::new();
        let book_uid = BookUid::new();
        inventory.add_library(Library {
            library_uid,
            name: "Библиотека имени 7 Непьющих".to_string(),
            city: "Москва".to_string(),
            address: "2-я Бауманская ул., д.5, стр.1".to_string(),
        });
        inventory.add_library(Library {
            library_uid: LibraryUid::new(),
            name: "Городская библиотека".to_string(),
            city: "Казань".to_string(),
            address: "ул. Баумана, 1".to_string(),
        });
        inventory.add_book(
            library_uid,
            Book {
                book_uid,
                name: "Краткий курс C++ в 7 томах".to_string(),
                author: "Бьерн Страуструп".to_string(),
                genre: "Научная фантастика".to_string(),
                condition: BookCondition::Excellent,
            },
            1,
        );

        let state = api::create_state(
            inventory.clone(),
            reservations.clone(),
            rating.clone(),
            bus.clone(),
        );
        let app = api::create_app(state, get_metrics_handle(), Duration::from_secs(30));

        Self {
            app,
            inventory,
            reservations,
            rating,
            bus,
            library_uid,
            book_uid,
        }
    }

    fn user(&self) -> Username {
        Username::from(USER)
    }

    fn rented(&self, till_date: NaiveDate) -> ReservationUid {
        let reservation = Reservation::open(
            self.book_uid,
            self.library_uid,
            till_date - chrono::Duration::days(14),
            till_date,
        );
        let uid = reservation.reservation_uid;
        self.reservations.insert(&self.user(), reservation);
        uid
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header(USER_NAME_HEADER, USER)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(USER_NAME_HEADER, USER)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    fn checkout_body(&self, till_date: &str) -> Value {
        json!({
            "bookUid": self.book_uid.to_string(),
            "libraryUid": self.library_uid.to_string(),
            "tillDate": till_date,
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, json) = app
        .send(
            Request::builder()
                .uri("/manage/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new();
    let response = app
        .app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_user_routes_require_user_header() {
    let app = TestApp::new();
    for uri in ["/rating", "/reservations"] {
        let (status, json) = app
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(json["message"].as_str().unwrap().contains(USER_NAME_HEADER));
    }
}

#[tokio::test]
async fn test_blank_user_header_is_unauthorized() {
    let app = TestApp::new();
    let (status, _) = app
        .send(
            Request::builder()
                .uri("/rating")
                .header(USER_NAME_HEADER, "   ")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_libraries_are_public_and_filtered_by_city() {
    let app = TestApp::new();
    let (status, json) = app
        .send(
            Request::builder()
                .uri("/libraries?city=%D0%9C%D0%BE%D1%81%D0%BA%D0%B2%D0%B0&page=1&size=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalElements"], 1);
    assert_eq!(json["pageSize"], 10);
    assert_eq!(json["items"][0]["libraryUid"], app.library_uid.to_string());
}

#[tokio::test]
async fn test_library_books_hide_unavailable_unless_asked() {
    let app = TestApp::new();
    app.inventory
        .add_book(
            app.library_uid,
            Book {
                book_uid: BookUid::new(),
                name: "Война и мир".to_string(),
                author: "Лев Толстой".to_string(),
                genre: "Роман".to_string(),
                condition: BookCondition::Good,
            },
            0,
        );

    let uri = format!("/libraries/{}/books", app.library_uid);
    let (status, json) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalElements"], 1);
    assert_eq!(json["items"][0]["availableCount"], 1);
    assert_eq!(json["items"][0]["condition"], "EXCELLENT");

    let (_, json) = app.get(&format!("{uri}?showAll=true")).await;
    assert_eq!(json["totalElements"], 2);
}

#[tokio::test]
async fn test_bad_library_uid_is_bad_request() {
    let app = TestApp::new();
    let (status, json) = app.get("/libraries/not-a-uuid/books").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("not-a-uuid"));
}

#[tokio::test]
async fn test_rating_defaults_to_minimum() {
    let app = TestApp::new();
    let (status, json) = app.get("/rating").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stars"], 1);
}

#[tokio::test]
async fn test_checkout_returns_receipt() {
    let app = TestApp::new();
    app.rating.set_stars(&app.user(), 75);
    let till_date = (today() + chrono::Duration::days(7))
        .format("%Y-%m-%d")
        .to_string();

    let (status, json) = app
        .post("/reservations", app.checkout_body(&till_date))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "RENTED");
    assert_eq!(json["tillDate"], till_date);
    assert_eq!(json["book"]["name"], "Краткий курс C++ в 7 томах");
    assert_eq!(json["library"]["city"], "Москва");
    assert_eq!(json["rating"]["stars"], 75);
    assert_eq!(
        app.inventory.available_count(app.library_uid, app.book_uid),
        Some(0)
    );
}

#[tokio::test]
async fn test_checkout_over_trust_score_is_rejected() {
    let app = TestApp::new();
    app.rating.set_stars(&app.user(), 1);
    app.rented(today() + chrono::Duration::days(3));
    app.rented(today() + chrono::Duration::days(5));

    let (status, json) = app
        .post("/reservations", app.checkout_body("2030-01-01"))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], saga::TOO_MANY_TAKEN_BOOKS);
    assert_eq!(app.reservations.reservation_count(), 2);
}

#[tokio::test]
async fn test_checkout_with_invalid_till_date_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app
        .post("/reservations", app.checkout_body("next tuesday"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_with_ledger_down_is_internal_error() {
    let app = TestApp::new();
    app.reservations.set_unavailable(true);
    let (status, json) = app
        .post("/reservations", app.checkout_body("2030-01-01"))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["message"].as_str().unwrap().starts_with("list_reservations"));
}

#[tokio::test]
async fn test_list_reservations_enriches_details() {
    let app = TestApp::new();
    app.rented(today() + chrono::Duration::days(3));

    let (status, json) = app.get("/reservations").await;
    assert_eq!(status, StatusCode::OK);
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["book"]["author"], "Бьерн Страуструп");
    assert_eq!(items[0]["library"]["name"], "Библиотека имени 7 Непьющих");
}

#[tokio::test]
async fn test_list_reservations_falls_back_to_bare_uids() {
    let app = TestApp::new();
    app.rented(today() + chrono::Duration::days(3));
    app.inventory.set_fail_on_lookup(true);

    let (status, json) = app.get("/reservations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["book"]["bookUid"], app.book_uid.to_string());
    assert!(json[0]["book"].get("name").is_none());
}

#[tokio::test]
async fn test_return_on_time_is_no_content() {
    let app = TestApp::new();
    app.rating.set_stars(&app.user(), 50);
    let till_date = today() + chrono::Duration::days(3);
    let reservation_uid = app.rented(till_date);

    let (status, json) = app
        .post(
            &format!("/reservations/{reservation_uid}/return"),
            json!({ "condition": "EXCELLENT", "date": today().to_string() }),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(json, Value::Null);
    let reservation = app.reservations.find(reservation_uid).unwrap();
    assert_eq!(reservation.status, ReservationStatus::Returned);
    assert_eq!(app.rating.stars(&app.user()).unwrap().value(), 51);
}

#[tokio::test]
async fn test_late_damaged_return_costs_two_violations() {
    let app = TestApp::new();
    app.rating.set_stars(&app.user(), 50);
    let till_date = today() - chrono::Duration::days(1);
    let reservation_uid = app.rented(till_date);

    let (status, _) = app
        .post(
            &format!("/reservations/{reservation_uid}/return"),
            json!({ "condition": "BAD", "date": today().to_string() }),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.reservations.find(reservation_uid).unwrap().status,
        ReservationStatus::Expired
    );
    assert_eq!(app.rating.stars(&app.user()).unwrap().value(), 30);
}

#[tokio::test]
async fn test_return_unknown_reservation_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            &format!("/reservations/{}/return", ReservationUid::new()),
            json!({ "condition": "GOOD", "date": "2030-01-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_return_with_bad_uid_is_bad_request() {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            "/reservations/42/return",
            json!({ "condition": "GOOD", "date": "2030-01-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deferred_return_is_still_no_content() {
    let app = TestApp::new();
    let mut retries = app.bus.subscribe(RETURN_BOOK_RETRY_TOPIC).await.unwrap();
    let reservation_uid = app.rented(today() + chrono::Duration::days(3));
    app.inventory.fail_next_returns(1);

    let (status, _) = app
        .post(
            &format!("/reservations/{reservation_uid}/return"),
            json!({ "condition": "EXCELLENT", "date": today().to_string() }),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    let envelope = futures_util::StreamExt::next(&mut retries).await.unwrap();
    assert_eq!(envelope.topic, RETURN_BOOK_RETRY_TOPIC);
}

#[tokio::test]
async fn test_unparseable_bodies_answer_with_message() {
    let app = TestApp::new();
    let reservation_uid = app.rented(today() + chrono::Duration::days(3));

    let cases = [
        (
            format!("/reservations/{reservation_uid}/return"),
            json!({ "condition": "SHREDDED", "date": "2030-01-01" }),
        ),
        (
            format!("/reservations/{reservation_uid}/return"),
            json!({ "condition": "GOOD", "date": "01/01/2030" }),
        ),
        (
            "/reservations".to_string(),
            json!({ "bookUid": "42", "libraryUid": app.library_uid.to_string(), "tillDate": "2030-01-01" }),
        ),
    ];
    for (uri, body) in cases {
        let (status, json) = app.post(&uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["message"].is_string(), "{uri}: {json}");
    }
    assert_eq!(
        app.reservations.find(reservation_uid).unwrap().status,
        ReservationStatus::Rented
    );
}

#[tokio::test]
async fn test_downstream_detail_stays_out_of_500_body() {
    let app = TestApp::new();
    app.rating.set_unavailable(true);

    let (status, json) = app.get("/rating").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "get_rating: downstream service failure");
}

#[tokio::test]
async fn test_cancel_reservation_is_no_content() {
    let app = TestApp::new();
    let reservation_uid = app.rented(today() + chrono::Duration::days(3));

    let (status, _) = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/reservations/{reservation_uid}"))
                .header(USER_NAME_HEADER, USER)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.reservations.find(reservation_uid).is_none());
}
