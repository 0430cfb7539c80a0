//! Trip preferences submitted by the traveller

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::budget::BudgetAllocation;
use crate::{Result, TripPlannerError};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// A fixed set of labelled options offered by the form
pub trait Choice: Copy + PartialEq + 'static {
    /// Every option, in display order
    const ALL: &'static [Self];

    /// Human-readable label, also used on the wire
    fn label(self) -> &'static str;
}

/// Parse a label (case-insensitive) into one of the options of `T`
pub fn parse_choice<T: Choice>(input: &str, what: &str) -> Result<T> {
    let wanted = input.trim();
    T::ALL
        .iter()
        .copied()
        .find(|option| option.label().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            let options: Vec<&str> = T::ALL.iter().map(|o| o.label()).collect();
            TripPlannerError::validation(format!(
                "Unknown {what} '{wanted}'. Must be one of: {}",
                options.join(", ")
            ))
        })
}

/// Split a comma-separated field into trimmed, non-empty items
#[must_use]
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Check the `local@domain.tld` shape of an email address
#[must_use]
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_PATTERN.is_match(address.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TripType {
    Family,
    Couple,
    Solo,
    #[default]
    Friends,
    Business,
}

impl Choice for TripType {
    const ALL: &'static [Self] = &[
        Self::Family,
        Self::Couple,
        Self::Solo,
        Self::Friends,
        Self::Business,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Family => "Family",
            Self::Couple => "Couple",
            Self::Solo => "Solo",
            Self::Friends => "Friends",
            Self::Business => "Business",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BudgetCategory {
    #[serde(rename = "Budget")]
    Budget,
    #[default]
    #[serde(rename = "Mid-Range")]
    MidRange,
    #[serde(rename = "Luxury")]
    Luxury,
}

impl Choice for BudgetCategory {
    const ALL: &'static [Self] = &[Self::Budget, Self::MidRange, Self::Luxury];

    fn label(self) -> &'static str {
        match self {
            Self::Budget => "Budget",
            Self::MidRange => "Mid-Range",
            Self::Luxury => "Luxury",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportMode {
    Flight,
    Train,
    Bus,
    #[serde(rename = "Car Rental")]
    CarRental,
}

impl Choice for TransportMode {
    const ALL: &'static [Self] = &[Self::Flight, Self::Train, Self::Bus, Self::CarRental];

    fn label(self) -> &'static str {
        match self {
            Self::Flight => "Flight",
            Self::Train => "Train",
            Self::Bus => "Bus",
            Self::CarRental => "Car Rental",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TravelPace {
    Relaxed,
    #[default]
    Moderate,
    #[serde(rename = "Fast-paced")]
    FastPaced,
}

impl Choice for TravelPace {
    const ALL: &'static [Self] = &[Self::Relaxed, Self::Moderate, Self::FastPaced];

    fn label(self) -> &'static str {
        match self {
            Self::Relaxed => "Relaxed",
            Self::Moderate => "Moderate",
            Self::FastPaced => "Fast-paced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DietaryPreference {
    Vegetarian,
    #[serde(rename = "Non-Vegetarian")]
    NonVegetarian,
    Vegan,
    #[default]
    #[serde(rename = "No Preference")]
    NoPreference,
}

impl Choice for DietaryPreference {
    const ALL: &'static [Self] = &[
        Self::Vegetarian,
        Self::NonVegetarian,
        Self::Vegan,
        Self::NoPreference,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Vegetarian => "Vegetarian",
            Self::NonVegetarian => "Non-Vegetarian",
            Self::Vegan => "Vegan",
            Self::NoPreference => "No Preference",
        }
    }
}

macro_rules! choice_traits {
    ($($ty:ty => $what:literal),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }

            impl FromStr for $ty {
                type Err = TripPlannerError;

                fn from_str(s: &str) -> Result<Self> {
                    parse_choice(s, $what)
                }
            }
        )*
    };
}

choice_traits!(
    TripType => "trip type",
    BudgetCategory => "budget category",
    TransportMode => "transport mode",
    TravelPace => "travel pace",
    DietaryPreference => "dietary preference",
);

/// One message naming every empty required field
#[must_use]
pub fn missing_fields_error(missing: &[&str]) -> TripPlannerError {
    TripPlannerError::validation(format!(
        "Please fill in required fields: {}",
        missing.join(", ")
    ))
}

fn default_travelers() -> u32 {
    1
}

/// Trip preferences for a single planning request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    /// Traveller's full name
    #[serde(default)]
    pub name: String,
    /// Address the plan is emailed to
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub departure_city: String,
    #[serde(default)]
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    #[serde(default = "default_travelers")]
    pub num_travelers: u32,
    #[serde(default)]
    pub trip_type: TripType,
    /// Total budget in whole rupees
    #[serde(default)]
    pub total_budget: u64,
    #[serde(default)]
    pub budget_category: BudgetCategory,
    #[serde(default)]
    pub allocation: BudgetAllocation,
    #[serde(default)]
    pub transport_modes: Vec<TransportMode>,
    #[serde(default)]
    pub travel_pace: TravelPace,
    /// Free-form interests such as "Culture" or "street food"
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub dietary_preference: DietaryPreference,
    #[serde(default)]
    pub food_allergies: Option<String>,
    #[serde(default)]
    pub accessibility_needs: Option<String>,
}

impl TripRequest {
    /// Number of calendar days covered, counting both travel days
    #[must_use]
    pub fn trip_days(&self) -> i64 {
        (self.return_date - self.departure_date).num_days() + 1
    }

    /// Interests joined for display, or `fallback` when none were given
    #[must_use]
    pub fn interests_text(&self, fallback: &str) -> String {
        if self.interests.is_empty() {
            fallback.to_string()
        } else {
            self.interests.join(", ")
        }
    }

    /// Transport modes joined for display
    #[must_use]
    pub fn transport_text(&self) -> String {
        self.transport_modes
            .iter()
            .map(|mode| mode.label())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether any interest matches `name`, ignoring case
    #[must_use]
    pub fn has_interest(&self, name: &str) -> bool {
        self.interests
            .iter()
            .any(|interest| interest.trim().eq_ignore_ascii_case(name))
    }

    /// Labels of the required fields that were left empty
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("Name");
        }
        if self.email.trim().is_empty() {
            missing.push("Email");
        }
        if self.mobile.trim().is_empty() {
            missing.push("Mobile");
        }
        if self.departure_city.trim().is_empty() {
            missing.push("Departure City");
        }
        if self.destination.trim().is_empty() {
            missing.push("Destination");
        }
        if self.total_budget == 0 {
            missing.push("Total Budget");
        }
        missing
    }

    /// Reject the request before any external service is contacted
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(missing_fields_error(&missing));
        }

        if self.return_date < self.departure_date {
            return Err(TripPlannerError::validation(
                "Return date must be after departure date.",
            ));
        }

        if self.departure_date < today {
            return Err(TripPlannerError::validation(
                "Departure date cannot be in the past.",
            ));
        }

        if self.num_travelers == 0 {
            return Err(TripPlannerError::validation(
                "Number of travelers must be at least 1.",
            ));
        }

        if self.transport_modes.is_empty() {
            return Err(TripPlannerError::validation(
                "Please select your preferred transportation.",
            ));
        }

        if !is_valid_email(&self.email) {
            return Err(TripPlannerError::validation(
                "Please enter a valid email address.",
            ));
        }

        self.allocation.validate()
    }
}
