//! End-to-end tests for the HTTP surface with stubbed external services

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use trip_planner::{
    AppState, ItineraryEmail, ItineraryGenerator, Mailer, PlanSigner, Prompt, TripPlanner,
    TripPlannerError, TripRequest, web,
};

const SIGNING_KEY: &[u8] = b"integration-signing-key-0123456789";

const PLAN_TEXT: &str = "## Day 1: Arrival\n- Check in near the Louvre\n\n## Day 2: Departure";

#[derive(Default)]
struct StubGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl ItineraryGenerator for StubGenerator {
    async fn generate(&self, _prompt: &Prompt) -> trip_planner::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PLAN_TEXT.to_string())
    }
}

struct StubMailer {
    fail: bool,
    sent: AtomicUsize,
}

#[async_trait]
impl Mailer for StubMailer {
    async fn send(&self, email: &ItineraryEmail) -> trip_planner::Result<()> {
        if self.fail {
            return Err(TripPlannerError::email("SMTP authentication failed"));
        }
        assert!(email.attachment.starts_with(b"%PDF"));
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    app: Router,
    generator: Arc<StubGenerator>,
    mailer: Arc<StubMailer>,
}

fn harness(mail_fails: bool) -> Harness {
    let generator = Arc::new(StubGenerator::default());
    let mailer = Arc::new(StubMailer {
        fail: mail_fails,
        sent: AtomicUsize::new(0),
    });
    let planner = TripPlanner::new(generator.clone(), mailer.clone(), None)
        .with_signer(PlanSigner::new(SIGNING_KEY));
    let app = web::router(AppState::new(planner), "static", Duration::from_secs(30));
    Harness {
        app,
        generator,
        mailer,
    }
}

fn trip_json() -> Value {
    json!({
        "name": "Asha Rao",
        "email": "asha@example.com",
        "mobile": "+91 9876543210",
        "departure_city": "Mumbai",
        "destination": "Paris",
        "departure_date": "2099-05-01",
        "return_date": "2099-05-02",
        "num_travelers": 2,
        "trip_type": "Couple",
        "total_budget": 50000,
        "transport_modes": ["Flight"],
        "interests": ["Culture"]
    })
}

const TRIP_FORM: &str = "name=Asha+Rao&email=asha%40example.com&mobile=9876543210\
&departure_city=Mumbai&destination=Paris&departure_date=2099-05-01&return_date=2099-05-02\
&num_travelers=2&trip_type=Couple&total_budget=50000&budget_category=Mid-Range\
&transport_flight=on&travel_pace=Moderate&interests=Culture&dietary_preference=No+Preference";

/// Signature `/plan` would have issued for `trip` and `itinerary`
fn signature_for(trip: &Value, itinerary: &str) -> String {
    let request: TripRequest = serde_json::from_value(trip.clone()).unwrap();
    PlanSigner::new(SIGNING_KEY).sign(&request, itinerary).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let h = harness(false);
    let request = Request::get("/api/health").body(Body::empty()).unwrap();
    let response = h.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], trip_planner::VERSION);
}

#[tokio::test]
async fn test_api_itinerary_is_generator_text() {
    let h = harness(false);
    let response = h
        .app
        .oneshot(post_json("/api/itinerary", &trip_json()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["itinerary"], PLAN_TEXT);
    assert_eq!(body["destination"], "Paris");
    assert_eq!(body["days"], 2);
    assert_eq!(body["budget"]["total"], 50000);
    assert_eq!(body["signature"], signature_for(&trip_json(), PLAN_TEXT));
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_api_itinerary_with_huge_budget() {
    let h = harness(false);
    let mut trip = trip_json();
    trip["total_budget"] = json!(u64::MAX);

    let response = h
        .app
        .oneshot(post_json("/api/itinerary", &trip))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["budget"]["total"], u64::MAX);
    let allocated: u128 = body["budget"]["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| u128::from(line["amount"].as_u64().unwrap()))
        .sum();
    assert_eq!(allocated, u128::from(u64::MAX));
}

#[tokio::test]
async fn test_api_missing_fields_rejected_without_generation() {
    let h = harness(false);
    let mut trip = trip_json();
    trip["destination"] = json!("");
    trip["mobile"] = json!("  ");

    let response = h
        .app
        .oneshot(post_json("/api/itinerary", &trip))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Mobile"));
    assert!(error.contains("Destination"));
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_api_email_success() {
    let h = harness(false);
    let payload = json!({
        "request": trip_json(),
        "itinerary": PLAN_TEXT,
        "signature": signature_for(&trip_json(), PLAN_TEXT)
    });
    let response = h
        .app
        .oneshot(post_json("/api/email", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["sent"], true);
    assert_eq!(body["recipient"], "asha@example.com");
    assert_eq!(h.mailer.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_api_email_failure_is_reported() {
    let h = harness(true);
    let payload = json!({
        "request": trip_json(),
        "itinerary": PLAN_TEXT,
        "signature": signature_for(&trip_json(), PLAN_TEXT),
        "recipient": "friend@example.com"
    });
    let response = h
        .app
        .oneshot(post_json("/api/email", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        body["error"],
        "Failed to send email: SMTP authentication failed"
    );
}

#[tokio::test]
async fn test_api_email_refuses_unsigned_content() {
    let h = harness(false);
    let payload = json!({
        "request": trip_json(),
        "itinerary": "Your account is locked, log in at https://evil.example",
        "recipient": "victim@example.com"
    });
    let response = h
        .app
        .oneshot(post_json("/api/email", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.mailer.sent.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_api_email_refuses_edited_request() {
    let h = harness(false);
    let mut edited = trip_json();
    edited["destination"] = json!("Somewhere Else");
    let payload = json!({
        "request": edited,
        "itinerary": PLAN_TEXT,
        "signature": signature_for(&trip_json(), PLAN_TEXT)
    });
    let response = h
        .app
        .oneshot(post_json("/api/email", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.mailer.sent.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_index_page_serves_form() {
    let h = harness(false);
    let response = h
        .app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("action=\"/plan\""));
    assert!(html.contains("Generate My Trip Plan"));
}

#[tokio::test]
async fn test_form_plan_renders_itinerary() {
    let h = harness(false);
    let response = h
        .app
        .oneshot(post_form("/plan", TRIP_FORM.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<h2>Day 1: Arrival</h2>"));
    assert!(html.contains("Rs. 50,000"));
    assert!(html.contains("action=\"/email\""));
}

#[tokio::test]
async fn test_form_missing_fields_shows_error() {
    let h = harness(false);
    let response = h
        .app
        .oneshot(post_form("/plan", "name=Asha".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Please fill in required fields"));
    assert!(html.contains("value=\"Asha\""));
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
}

fn email_form_with(itinerary: &str, signature: &str, recipient: &str) -> String {
    let request_json = serde_json::to_string(&trip_json()).unwrap();
    format!(
        "request_json={}&itinerary={}&signature={}&recipient={}",
        urlencoding::encode(&request_json),
        urlencoding::encode(itinerary),
        urlencoding::encode(signature),
        urlencoding::encode(recipient)
    )
}

fn email_form(recipient: &str) -> String {
    email_form_with(
        PLAN_TEXT,
        &signature_for(&trip_json(), PLAN_TEXT),
        recipient,
    )
}

#[tokio::test]
async fn test_form_email_success_notice() {
    let h = harness(false);
    let response = h
        .app
        .oneshot(post_form("/email", email_form("friend@example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Trip plan sent to friend@example.com!"));
    assert!(!html.contains("notice error"));
    assert_eq!(h.mailer.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_form_email_failure_shows_only_error() {
    let h = harness(true);
    let response = h
        .app
        .oneshot(post_form("/email", email_form("")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_text(response).await;
    assert!(html.contains("Failed to send email: SMTP authentication failed"));
    assert!(!html.contains("notice success"));
    assert!(!html.contains("Trip plan sent"));
}

#[tokio::test]
async fn test_form_email_with_lost_request() {
    let h = harness(false);
    let response = h
        .app
        .oneshot(post_form("/email", "request_json=garbage".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Your trip details were lost"));
}

#[tokio::test]
async fn test_api_plan_then_email_round_trip() {
    let h = harness(false);
    let response = h
        .app
        .clone()
        .oneshot(post_json("/api/itinerary", &trip_json()))
        .await
        .unwrap();
    let plan: Value = serde_json::from_str(&body_text(response).await).unwrap();

    let payload = json!({
        "request": trip_json(),
        "itinerary": plan["itinerary"],
        "signature": plan["signature"]
    });
    let response = h
        .app
        .oneshot(post_json("/api/email", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.mailer.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_form_plan_page_carries_signature() {
    let h = harness(false);
    let response = h
        .app
        .oneshot(post_form("/plan", TRIP_FORM.to_string()))
        .await
        .unwrap();
    let html = body_text(response).await;

    let marker = "name=\"signature\" value=\"";
    let start = html.find(marker).unwrap() + marker.len();
    let signature = &html[start..start + 64];
    assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_form_email_refuses_tampered_itinerary() {
    let h = harness(false);
    let signature = signature_for(&trip_json(), PLAN_TEXT);
    let body = email_form_with(
        "Your bank needs you to confirm your password at https://evil.example",
        &signature,
        "victim@example.com",
    );
    let response = h.app.oneshot(post_form("/email", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let html = body_text(response).await;
    assert!(html.contains("could not be verified"));
    assert!(!html.contains("Trip plan sent"));
    assert_eq!(h.mailer.sent.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_form_email_refuses_missing_signature() {
    let h = harness(false);
    let response = h
        .app
        .oneshot(post_form(
            "/email",
            email_form_with(PLAN_TEXT, "", "victim@example.com"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.mailer.sent.load(Ordering::SeqCst), 0);
}

struct SlowGenerator;

#[async_trait]
impl ItineraryGenerator for SlowGenerator {
    async fn generate(&self, _prompt: &Prompt) -> trip_planner::Result<String> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(PLAN_TEXT.to_string())
    }
}

#[tokio::test]
async fn test_slow_generation_times_out_with_408() {
    let mailer = Arc::new(StubMailer {
        fail: false,
        sent: AtomicUsize::new(0),
    });
    let planner = TripPlanner::new(Arc::new(SlowGenerator), mailer, None);
    let app = web::router(
        AppState::new(planner),
        "static",
        Duration::from_millis(50),
    );

    let response = app
        .oneshot(post_json("/api/itinerary", &trip_json()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
