//! Generated itinerary

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A generated trip plan; `text` is exactly what the LLM returned
#[derive(Debug, Clone, Serialize)]
pub struct Itinerary {
    pub destination: String,
    pub days: i64,
    pub text: String,
    pub generated_at: DateTime<Utc>,
    /// HMAC over the request and `text`; empty until signed
    pub signature: String,
}

impl Itinerary {
    #[must_use]
    pub fn new(destination: String, days: i64, text: String) -> Self {
        Self {
            destination,
            days,
            text,
            generated_at: Utc::now(),
            signature: String::new(),
        }
    }

    #[must_use]
    pub fn with_signature(mut self, signature: String) -> Self {
        self.signature = signature;
        self
    }
}
