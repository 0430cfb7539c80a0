//! JSON API mirroring the browser workflow

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BudgetBreakdown, Itinerary, TripRequest};
use crate::web::AppState;
use crate::{Result, VERSION};

#[derive(Debug, Serialize)]
pub struct ItineraryResponse {
    pub destination: String,
    pub days: i64,
    /// Exactly the text produced by the language model
    pub itinerary: String,
    pub generated_at: DateTime<Utc>,
    pub budget: BudgetBreakdown,
    /// Pass back unchanged to `/api/email`
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub request: TripRequest,
    pub itinerary: String,
    #[serde(default)]
    pub signature: String,
    /// Defaults to the traveller's own address
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmailResponse {
    pub sent: bool,
    pub recipient: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/itinerary", post(create_itinerary))
        .route("/email", post(email_itinerary))
        .route("/health", get(health))
}

async fn create_itinerary(
    State(state): State<AppState>,
    Json(request): Json<TripRequest>,
) -> Result<Json<ItineraryResponse>> {
    let today = chrono::Local::now().date_naive();
    let itinerary = state.planner.plan(&request, today).await?;

    Ok(Json(ItineraryResponse {
        budget: BudgetBreakdown::new(request.total_budget, &request.allocation),
        destination: itinerary.destination,
        days: itinerary.days,
        itinerary: itinerary.text,
        generated_at: itinerary.generated_at,
        signature: itinerary.signature,
    }))
}

async fn email_itinerary(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<EmailResponse>> {
    let EmailRequest {
        request,
        itinerary,
        signature,
        recipient,
    } = payload;

    let recipient = recipient
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| request.email.trim().to_string());
    let itinerary = Itinerary::new(
        request.destination.trim().to_string(),
        request.trip_days(),
        itinerary,
    )
    .with_signature(signature);

    state.planner.email(&request, &itinerary, &recipient).await?;

    Ok(Json(EmailResponse {
        sent: true,
        message: format!("Trip plan sent to {recipient}! Check your inbox for the PDF itinerary."),
        recipient,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
    })
}
