//! AI trip planner
//!
//! Collects travel preferences through an HTML form or a JSON API, researches
//! the destination, asks a language model for a day-by-day itinerary and
//! emails the result with a PDF report attached.

pub mod api;
pub mod config;
pub mod email;
pub mod error;
pub mod form;
pub mod llm;
pub mod models;
pub mod planner;
pub mod prompt;
pub mod render;
pub mod report;
pub mod research;
pub mod signing;
pub mod telemetry;
pub mod web;

pub use config::TripPlannerConfig;
pub use email::{ItineraryEmail, Mailer, SmtpMailer};
pub use error::TripPlannerError;
pub use llm::{ChatCompletionClient, ItineraryGenerator};
pub use models::{Itinerary, TripRequest};
pub use planner::TripPlanner;
pub use prompt::Prompt;
pub use research::{TravelResearcher, WebResearcher};
pub use signing::PlanSigner;
pub use web::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripPlannerError>;
