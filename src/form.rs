//! HTML form submissions and their conversion into [`TripRequest`]s
//!
//! Every field arrives as text so a rejected submission can be shown back to
//! the user exactly as typed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::preferences::{missing_fields_error, parse_list};
use crate::models::{BudgetAllocation, TransportMode, TripRequest};
use crate::{Result, TripPlannerError};

/// Raw trip preferences form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripForm {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub emergency_contact: String,
    pub departure_city: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: String,
    pub num_travelers: String,
    pub trip_type: String,
    pub total_budget: String,
    pub budget_category: String,
    pub accommodation_pct: String,
    pub transport_pct: String,
    pub food_pct: String,
    pub activities_pct: String,
    /// Checkbox values are only present when ticked
    #[serde(default)]
    pub transport_flight: Option<String>,
    #[serde(default)]
    pub transport_train: Option<String>,
    #[serde(default)]
    pub transport_bus: Option<String>,
    #[serde(default)]
    pub transport_car_rental: Option<String>,
    pub travel_pace: String,
    /// Comma-separated
    pub interests: String,
    pub dietary_preference: String,
    pub food_allergies: String,
    pub accessibility_needs: String,
}

impl Default for TripForm {
    fn default() -> Self {
        let allocation = BudgetAllocation::default();
        Self {
            name: String::new(),
            email: String::new(),
            mobile: String::new(),
            emergency_contact: String::new(),
            departure_city: String::new(),
            destination: String::new(),
            departure_date: String::new(),
            return_date: String::new(),
            num_travelers: "1".to_string(),
            trip_type: "Friends".to_string(),
            total_budget: String::new(),
            budget_category: "Mid-Range".to_string(),
            accommodation_pct: allocation.accommodation_pct.to_string(),
            transport_pct: allocation.transport_pct.to_string(),
            food_pct: allocation.food_pct.to_string(),
            activities_pct: allocation.activities_pct.to_string(),
            transport_flight: Some("on".to_string()),
            transport_train: None,
            transport_bus: None,
            transport_car_rental: None,
            travel_pace: "Moderate".to_string(),
            interests: String::new(),
            dietary_preference: "No Preference".to_string(),
            food_allergies: String::new(),
            accessibility_needs: String::new(),
        }
    }
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_number<T: std::str::FromStr + Default>(value: &str, message: &str) -> Result<T> {
    let cleaned = value.trim().replace(',', "");
    if cleaned.is_empty() {
        return Ok(T::default());
    }
    cleaned
        .parse()
        .map_err(|_| TripPlannerError::validation(message))
}

fn parse_pct(value: &str, default: u8, label: &str) -> Result<u8> {
    if value.trim().is_empty() {
        return Ok(default);
    }
    value.trim().parse().map_err(|_| {
        TripPlannerError::validation(format!("{label} share must be a whole percentage."))
    })
}

impl TripForm {
    /// Whether the checkbox for `mode` is ticked
    #[must_use]
    pub fn has_transport(&self, mode: TransportMode) -> bool {
        match mode {
            TransportMode::Flight => self.transport_flight.is_some(),
            TransportMode::Train => self.transport_train.is_some(),
            TransportMode::Bus => self.transport_bus.is_some(),
            TransportMode::CarRental => self.transport_car_rental.is_some(),
        }
    }

    /// Build a request, reporting the first problem in the same order as
    /// [`TripRequest::validate`]
    pub fn to_request(&self) -> Result<TripRequest> {
        let defaults = BudgetAllocation::default();
        let departure_date = parse_date(&self.departure_date);
        let return_date = parse_date(&self.return_date);

        let travelers: u32 = if self.num_travelers.trim().is_empty() {
            1
        } else {
            parse_number(&self.num_travelers, "Number of travelers must be a whole number.")?
        };

        let request = TripRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            emergency_contact: optional_text(&self.emergency_contact),
            departure_city: self.departure_city.trim().to_string(),
            destination: self.destination.trim().to_string(),
            departure_date: departure_date.unwrap_or_default(),
            return_date: return_date.unwrap_or_default(),
            num_travelers: travelers,
            trip_type: self.trip_type.parse()?,
            total_budget: parse_number(
                &self.total_budget,
                "Total budget must be a whole number of rupees.",
            )?,
            budget_category: self.budget_category.parse()?,
            allocation: BudgetAllocation {
                accommodation_pct: parse_pct(
                    &self.accommodation_pct,
                    defaults.accommodation_pct,
                    "Accommodation",
                )?,
                transport_pct: parse_pct(&self.transport_pct, defaults.transport_pct, "Transport")?,
                food_pct: parse_pct(&self.food_pct, defaults.food_pct, "Food")?,
                activities_pct: parse_pct(
                    &self.activities_pct,
                    defaults.activities_pct,
                    "Activities",
                )?,
            },
            transport_modes: [
                TransportMode::Flight,
                TransportMode::Train,
                TransportMode::Bus,
                TransportMode::CarRental,
            ]
            .into_iter()
            .filter(|mode| self.has_transport(*mode))
            .collect(),
            travel_pace: self.travel_pace.parse()?,
            interests: parse_list(&self.interests),
            dietary_preference: self.dietary_preference.parse()?,
            food_allergies: optional_text(&self.food_allergies),
            accessibility_needs: optional_text(&self.accessibility_needs),
        };

        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(missing_fields_error(&missing));
        }
        if departure_date.is_none() || return_date.is_none() {
            return Err(TripPlannerError::validation(
                "Please choose your departure and return dates.",
            ));
        }
        Ok(request)
    }
}
