//! Browser-facing pages, router assembly and the HTTP server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use askama::Template;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::ServerConfig;
use crate::form::TripForm;
use crate::models::{
    BudgetBreakdown, BudgetCategory, Choice, DietaryPreference, Itinerary, TransportMode,
    TravelPace, TripRequest, TripType, format_rupees,
};
use crate::planner::TripPlanner;
use crate::render::markdown_to_html;
use crate::{Result, TripPlannerError};

/// Form posts carry the itinerary back, so allow generous bodies
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Shared, immutable handler state
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<TripPlanner>,
}

impl AppState {
    pub fn new(planner: TripPlanner) -> Self {
        Self {
            planner: Arc::new(planner),
        }
    }
}

struct SelectOption {
    label: &'static str,
    selected: bool,
}

fn select_options<T: Choice>(current: &str) -> Vec<SelectOption> {
    T::ALL
        .iter()
        .map(|option| SelectOption {
            label: option.label(),
            selected: option.label().eq_ignore_ascii_case(current.trim()),
        })
        .collect()
}

struct CheckOption {
    name: &'static str,
    label: &'static str,
    checked: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage {
    form: TripForm,
    error: Option<String>,
    today: String,
    trip_types: Vec<SelectOption>,
    budget_categories: Vec<SelectOption>,
    paces: Vec<SelectOption>,
    diets: Vec<SelectOption>,
    transports: Vec<CheckOption>,
}

impl IndexPage {
    fn new(form: TripForm, error: Option<String>) -> Self {
        let transports = [
            (TransportMode::Flight, "transport_flight"),
            (TransportMode::Train, "transport_train"),
            (TransportMode::Bus, "transport_bus"),
            (TransportMode::CarRental, "transport_car_rental"),
        ]
        .into_iter()
        .map(|(mode, name)| CheckOption {
            name,
            label: mode.label(),
            checked: form.has_transport(mode),
        })
        .collect();

        Self {
            trip_types: select_options::<TripType>(&form.trip_type),
            budget_categories: select_options::<BudgetCategory>(&form.budget_category),
            paces: select_options::<TravelPace>(&form.travel_pace),
            diets: select_options::<DietaryPreference>(&form.dietary_preference),
            transports,
            today: today().to_string(),
            form,
            error,
        }
    }
}

struct Notice {
    success: bool,
    message: String,
}

struct BudgetRow {
    category: &'static str,
    amount: String,
}

#[derive(Template)]
#[template(path = "result.html")]
struct ResultPage {
    destination: String,
    days: i64,
    traveller: String,
    budget_rows: Vec<BudgetRow>,
    budget_total: String,
    itinerary_html: String,
    itinerary_text: String,
    request_json: String,
    signature: String,
    recipient: String,
    notice: Option<Notice>,
}

impl ResultPage {
    fn new(
        request: &TripRequest,
        itinerary: &Itinerary,
        recipient: String,
        notice: Option<Notice>,
    ) -> Result<Self> {
        let breakdown = BudgetBreakdown::new(request.total_budget, &request.allocation);
        let request_json = serde_json::to_string(request)
            .map_err(|e| TripPlannerError::render(format!("could not encode request: {e}")))?;

        Ok(Self {
            destination: itinerary.destination.clone(),
            days: itinerary.days,
            traveller: request.name.clone(),
            budget_rows: breakdown
                .lines
                .iter()
                .map(|line| BudgetRow {
                    category: line.category,
                    amount: format_rupees(line.amount),
                })
                .collect(),
            budget_total: format_rupees(breakdown.total),
            itinerary_html: markdown_to_html(&itinerary.text),
            itinerary_text: itinerary.text.clone(),
            request_json,
            signature: itinerary.signature.clone(),
            recipient,
            notice,
        })
    }
}

/// Render `template` with `status`, falling back to a JSON error
fn page<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(err) => TripPlannerError::from(err).into_response(),
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn index() -> Response {
    page(StatusCode::OK, &IndexPage::new(TripForm::default(), None))
}

async fn plan(State(state): State<AppState>, Form(form): Form<TripForm>) -> Response {
    let outcome = match form.to_request() {
        Ok(request) => state
            .planner
            .plan(&request, today())
            .await
            .map(|itinerary| (request, itinerary)),
        Err(err) => Err(err),
    };

    match outcome.and_then(|(request, itinerary)| {
        let recipient = request.email.clone();
        ResultPage::new(&request, &itinerary, recipient, None)
    }) {
        Ok(result) => page(StatusCode::OK, &result),
        Err(err) => {
            tracing::info!(error = %err, "trip plan not generated");
            let status = err.status_code();
            page(status, &IndexPage::new(form, Some(err.user_message())))
        }
    }
}

/// Email form posted from the result page
#[derive(Debug, Deserialize)]
pub struct EmailForm {
    #[serde(default)]
    pub request_json: String,
    #[serde(default)]
    pub itinerary: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub recipient: String,
}

async fn email(State(state): State<AppState>, Form(form): Form<EmailForm>) -> Response {
    let Ok(request) = serde_json::from_str::<TripRequest>(&form.request_json) else {
        let message = "Your trip details were lost. Please plan your trip again.".to_string();
        return page(
            StatusCode::UNPROCESSABLE_ENTITY,
            &IndexPage::new(TripForm::default(), Some(message)),
        );
    };

    let itinerary = Itinerary::new(
        request.destination.trim().to_string(),
        request.trip_days(),
        form.itinerary,
    )
    .with_signature(form.signature);
    let recipient = match form.recipient.trim() {
        "" => request.email.trim().to_string(),
        address => address.to_string(),
    };

    let (status, notice) = match state.planner.email(&request, &itinerary, &recipient).await {
        Ok(()) => (
            StatusCode::OK,
            Notice {
                success: true,
                message: format!(
                    "Trip plan sent to {recipient}! Check your inbox for the PDF itinerary."
                ),
            },
        ),
        Err(err) => (
            err.status_code(),
            Notice {
                success: false,
                message: err.user_message(),
            },
        ),
    };

    match ResultPage::new(&request, &itinerary, recipient, Some(notice)) {
        Ok(result) => page(status, &result),
        Err(err) => err.into_response(),
    }
}

/// Full application router
pub fn router(state: AppState, static_dir: &str, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/plan", post(plan))
        .route("/email", post(email))
        .nest("/api", api::router().layer(cors))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Serve until interrupted; HTTPS when a certificate is configured
pub async fn run(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = router(
        state,
        &config.static_dir,
        Duration::from_secs(u64::from(config.request_timeout_seconds)),
    );
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    if let (Some(cert), Some(key)) = (&config.tls_cert_path, &config.tls_key_path) {
        return serve_tls(addr, app, cert, key).await;
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")
}

#[cfg(feature = "tls")]
async fn serve_tls(addr: SocketAddr, app: Router, cert: &str, key: &str) -> anyhow::Result<()> {
    // another component may already have installed a provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| format!("Failed to load TLS certificate {cert} and key {key}"))?;

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    tracing::info!("Web server running at https://{addr}");
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("Web server failed")
}

#[cfg(not(feature = "tls"))]
async fn serve_tls(_addr: SocketAddr, _app: Router, _cert: &str, _key: &str) -> anyhow::Result<()> {
    anyhow::bail!("TLS certificate configured but trip-planner was built without the `tls` feature")
}
