//! Data models for the trip planner
//!
//! - Preferences: the traveller's request and its validation
//! - Budget: allocation percentages and the derived breakdown
//! - Itinerary: the generated plan

pub mod budget;
pub mod itinerary;
pub mod preferences;

pub use budget::{BudgetAllocation, BudgetBreakdown, BudgetLine, CURRENCY, format_rupees};
pub use itinerary::Itinerary;
pub use preferences::{
    BudgetCategory, Choice, DietaryPreference, TransportMode, TravelPace, TripRequest, TripType,
};
