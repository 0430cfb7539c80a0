//! Prompt construction for itinerary generation

use serde::Serialize;

use crate::models::{CURRENCY, TripRequest};
use crate::research::TravelContext;

const SYSTEM_PROMPT: &str = "You are an expert travel planner creating detailed, personalized trip plans. \
Provide specific, actionable recommendations with current pricing using 'Rs.' for currency. \
Focus on creating memorable experiences matching traveler interests and budget.";

/// Longest destination extract copied into the prompt, in characters
const EXTRACT_LIMIT: usize = 400;

/// A chat prompt: system instructions plus the user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn research_blocks(out: &mut String, context: &TravelContext) {
    if let Some(summary) = &context.destination {
        out.push_str(&format!(
            "DESTINATION OVERVIEW:\n{}...\nLocation: {}\n",
            truncate_chars(&summary.extract, EXTRACT_LIMIT),
            summary.title
        ));
        if let Some(location) = &context.location {
            out.push_str(&format!(
                "Coordinates: {:.4}, {:.4} ({})\n",
                location.latitude, location.longitude, location.display_name
            ));
        }
        out.push('\n');
    }

    if let Some(hotels) = &context.accommodation {
        out.push_str(&format!(
            "CURRENT ACCOMMODATION INFORMATION:\nPrice Range: {}\nMarket Details: {}\n\n",
            hotels.price_range(),
            hotels.summary
        ));
    }

    if let Some(transport) = &context.transportation {
        out.push_str(&format!(
            "CURRENT TRANSPORTATION INFORMATION:\nPrice Range: {}\nRoute Details: {}\n\n",
            transport.price_range(),
            transport.summary
        ));
    }
}

fn traveller_details(out: &mut String, request: &TripRequest) {
    let allocation = &request.allocation;

    out.push_str(&format!(
        "**TRAVELER DETAILS:**
- Name: {name}
- Group: {travellers} travelers ({trip_type} trip)
- Route: {from} to {to} for {days} days
- Dates: {departure} to {return_date}
- Budget: {CURRENCY} {budget} ({category})
- Budget Allocation: Accommodation {stay}%, Transportation {transport}%, Food {food}%, Activities {activities}%
- Primary Interests: {interests}
- Travel Pace: {pace}
- Preferred Transport: {modes}
- Dietary Preference: {diet}
",
        name = request.name.trim(),
        travellers = request.num_travelers,
        trip_type = request.trip_type,
        from = request.departure_city.trim(),
        to = request.destination.trim(),
        days = request.trip_days(),
        departure = request.departure_date,
        return_date = request.return_date,
        budget = request.total_budget,
        category = request.budget_category,
        stay = allocation.accommodation_pct,
        transport = allocation.transport_pct,
        food = allocation.food_pct,
        activities = allocation.activities_pct,
        interests = request.interests_text("General"),
        pace = request.travel_pace,
        modes = request.transport_text(),
        diet = request.dietary_preference,
    ));
    if let Some(allergies) = non_blank(request.food_allergies.as_deref()) {
        out.push_str(&format!("- Food Allergies: {allergies}\n"));
    }
    if let Some(needs) = non_blank(request.accessibility_needs.as_deref()) {
        out.push_str(&format!("- Accessibility Needs: {needs}\n"));
    }
    out.push('\n');
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn itinerary_outline(out: &mut String, request: &TripRequest) {
    let days = request.trip_days();
    let destination = request.destination.trim();
    let trip_type = request.trip_type.to_string().to_lowercase();
    let interests = request.interests_text("sightseeing");
    let pace = request.travel_pace.to_string().to_lowercase();
    let diet = request.dietary_preference;

    out.push_str(&format!(
        "**CREATE A DETAILED ITINERARY WITH:**

# {destination} Trip Plan

## Destination Overview
Provide an engaging overview of {destination} including what makes it special for {trip_type} trips, \
weather conditions, and cultural highlights for travelers interested in {lower_interests}.

## Day-by-Day Itinerary
Create a detailed {days}-day itinerary with:

**Day 1 - {departure} - Arrival Day**
- Arrival and check-in activities
- Light exploration and orientation
- Welcome dinner recommendations
- Estimated daily cost for group: {CURRENCY} [amount]

",
        lower_interests = interests.to_lowercase(),
        departure = request.departure_date,
    ));

    if days > 2 {
        out.push_str(&format!(
            "**Days 2-{last} - Main Exploration**
For each day include:
- Morning, afternoon, and evening activities
- Mix of {interests} experiences
- Specific timing and travel between locations
- Meal recommendations for {diet} preferences
- Rest periods for {pace}-paced travel
- Daily cost estimates

",
            last = days - 1,
        ));
    }

    if days > 1 {
        out.push_str(&format!(
            "**Day {days} - {return_date} - Departure Day**
- Final activities and check-out
- Last-minute shopping or relaxation
- Departure arrangements

",
            return_date = request.return_date,
        ));
    }

    out.push_str(&format!(
        "## Accommodation Recommendations
**Budget Options ({CURRENCY} 1,500-3,000/night):** 2-3 specific budget hotels with amenities and location advantages
**Mid-range Options ({CURRENCY} 3,000-6,000/night):** 2-3 mid-range hotels suited to {trip_type} groups
**Premium Options ({CURRENCY} 6,000+/night):** 2-3 luxury options with full amenities

## Transportation Guide
- Best options from {from} to {destination} by {modes}, with current pricing and booking strategies
- Efficient and cost-effective local transport to the attractions

## Budget Breakdown
Create a table with Category, Allocated Budget, Estimated Cost, and Recommendations columns.

## Food & Dining Guide
Curated for {diet} preferences with must-try local specialties and restaurant recommendations across budget ranges.

## Activities & Experiences
Tailored to interests in {interests} with top attractions, unique experiences, and {pace} activity scheduling.

## Practical Information
Include packing essentials, local tips, cultural customs, safety guidelines, and emergency contacts.

**IMPORTANT:** Use ONLY '{CURRENCY}' for currency (never the rupee symbol). Make all recommendations specific and actionable.
",
        from = request.departure_city.trim(),
        modes = request.transport_text(),
    ));
}

/// Build the generation prompt; the same inputs always give the same prompt
#[must_use]
pub fn build_prompt(request: &TripRequest, context: &TravelContext) -> Prompt {
    let mut user = String::with_capacity(4096);
    user.push_str(
        "Create a comprehensive, personalized trip itinerary using current travel information.\n\n",
    );
    research_blocks(&mut user, context);
    traveller_details(&mut user, request);
    itinerary_outline(&mut user, request);

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::preferences::tests::sample_request;
    use crate::models::{BudgetCategory, DietaryPreference, TransportMode, TravelPace, TripType};
    use crate::research::{DestinationSummary, PriceInsight};
    use rstest::rstest;

    #[test]
    fn test_prompt_contains_every_supplied_value() {
        let request = sample_request();
        let prompt = build_prompt(&request, &TravelContext::default());

        for expected in [
            "Asha Rao",
            "Paris",
            "Mumbai",
            "3 days",
            "Rs. 1000",
            "art, food",
            "2099-05-01",
            "2099-05-03",
            "2 travelers (Couple trip)",
            "Mid-Range",
            "Relaxed",
            "Flight, Train",
            "Vegetarian",
        ] {
            assert!(prompt.user.contains(expected), "prompt is missing '{expected}'");
        }
        assert!(prompt.system.contains("expert travel planner"));
    }

    #[rstest]
    #[case::multi_word_destination(
        "New Delhi",
        &[],
        None,
        None,
        &["# New Delhi Trip Plan", "Mumbai to New Delhi for 3 days", "- Primary Interests: General"]
    )]
    #[case::interests_and_allergies(
        "Goa",
        &["beaches", "street food"],
        Some("shellfish"),
        None,
        &["- Primary Interests: beaches, street food", "- Food Allergies: shellfish"]
    )]
    #[case::accessibility_needs(
        "Leh Ladakh",
        &["Adventure"],
        None,
        Some("step-free rooms"),
        &["Mumbai to Leh Ladakh", "- Accessibility Needs: step-free rooms"]
    )]
    #[case::blank_optional_text("Jaipur", &["Culture"], Some("   "), Some(""), &["Jaipur"])]
    fn test_prompt_carries_supplied_fields(
        #[case] destination: &str,
        #[case] interests: &[&str],
        #[case] allergies: Option<&str>,
        #[case] accessibility: Option<&str>,
        #[case] expected: &[&str],
    ) {
        let mut request = sample_request();
        request.destination = destination.to_string();
        request.interests = interests.iter().map(ToString::to_string).collect();
        request.food_allergies = allergies.map(ToString::to_string);
        request.accessibility_needs = accessibility.map(ToString::to_string);

        let prompt = build_prompt(&request, &TravelContext::default());

        for text in expected.iter().chain(interests) {
            assert!(prompt.user.contains(text), "prompt is missing '{text}'");
        }
        for value in [request.name.as_str(), request.departure_city.as_str()] {
            assert!(prompt.user.contains(value));
        }
        match allergies.map(str::trim).filter(|a| !a.is_empty()) {
            Some(allergies) => assert!(prompt.user.contains(allergies)),
            None => assert!(!prompt.user.contains("Food Allergies")),
        }
        match accessibility.map(str::trim).filter(|a| !a.is_empty()) {
            Some(needs) => assert!(prompt.user.contains(needs)),
            None => assert!(!prompt.user.contains("Accessibility Needs")),
        }
    }

    #[rstest]
    #[case(TripType::Solo, BudgetCategory::Budget, TravelPace::FastPaced, DietaryPreference::Vegan)]
    #[case(TripType::Family, BudgetCategory::Luxury, TravelPace::Moderate, DietaryPreference::NonVegetarian)]
    #[case(TripType::Business, BudgetCategory::MidRange, TravelPace::Relaxed, DietaryPreference::NoPreference)]
    fn test_prompt_carries_choices(
        #[case] trip_type: TripType,
        #[case] category: BudgetCategory,
        #[case] pace: TravelPace,
        #[case] diet: DietaryPreference,
    ) {
        let mut request = sample_request();
        request.trip_type = trip_type;
        request.budget_category = category;
        request.travel_pace = pace;
        request.dietary_preference = diet;
        request.transport_modes = vec![TransportMode::Bus, TransportMode::CarRental];
        request.num_travelers = 5;
        request.total_budget = 250_000;

        let prompt = build_prompt(&request, &TravelContext::default());

        for expected in [
            format!("- Group: 5 travelers ({trip_type} trip)"),
            format!("- Budget: Rs. 250000 ({category})"),
            format!("- Travel Pace: {pace}"),
            format!("- Dietary Preference: {diet}"),
            "- Preferred Transport: Bus, Car Rental".to_string(),
        ] {
            assert!(prompt.user.contains(&expected), "prompt is missing '{expected}'");
        }
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let request = sample_request();
        let context = TravelContext::default();
        assert_eq!(build_prompt(&request, &context), build_prompt(&request, &context));
    }

    #[test]
    fn test_optional_needs_only_when_present() {
        let mut request = sample_request();
        let prompt = build_prompt(&request, &TravelContext::default());
        assert!(!prompt.user.contains("Food Allergies"));

        request.food_allergies = Some("peanuts".to_string());
        request.accessibility_needs = Some("wheelchair access".to_string());
        let prompt = build_prompt(&request, &TravelContext::default());
        assert!(prompt.user.contains("- Food Allergies: peanuts"));
        assert!(prompt.user.contains("- Accessibility Needs: wheelchair access"));
    }

    #[test]
    fn test_day_outline_follows_trip_length() {
        let mut request = sample_request();
        let prompt = build_prompt(&request, &TravelContext::default());
        assert!(prompt.user.contains("**Days 2-2 - Main Exploration**"));
        assert!(prompt.user.contains("**Day 3 - 2099-05-03 - Departure Day**"));

        request.return_date = request.departure_date;
        let prompt = build_prompt(&request, &TravelContext::default());
        assert!(prompt.user.contains("1-day itinerary"));
        assert!(!prompt.user.contains("Departure Day"));
    }

    #[test]
    fn test_research_blocks_prepended() {
        let context = TravelContext {
            destination: Some(DestinationSummary {
                title: "Paris".to_string(),
                extract: "é".repeat(500),
                page_url: String::new(),
            }),
            location: None,
            accommodation: Some(PriceInsight {
                summary: "Hotels from Rs. 2,500".to_string(),
                topics: vec![],
                prices: vec![2500, 9000],
            }),
            transportation: None,
        };
        let prompt = build_prompt(&sample_request(), &context);

        let overview = prompt.user.find("DESTINATION OVERVIEW:").unwrap();
        let details = prompt.user.find("**TRAVELER DETAILS:**").unwrap();
        assert!(overview < details);
        assert!(prompt.user.contains(&format!("{}...", "é".repeat(400))));
        assert!(!prompt.user.contains(&"é".repeat(401)));
        assert!(prompt.user.contains("Price Range: Rs. 2,500 - Rs. 9,000"));
        assert!(!prompt.user.contains("CURRENT TRANSPORTATION INFORMATION"));
    }
}
