//! Best-effort destination research from public APIs
//!
//! Wikipedia supplies a destination summary, Nominatim a place lookup and
//! DuckDuckGo instant answers the text that rupee prices are mined from.
//! Every lookup is optional: failures are logged and the field stays empty.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tracing::instrument;

use crate::config::ResearchConfig;
use crate::models::{TripRequest, format_rupees};

/// Plausible travel prices in rupees; anything outside is noise
const PRICE_RANGE: std::ops::RangeInclusive<u64> = 300..=500_000;

const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)";
const WHOLE_AMOUNT: &str = r"(\d{1,3}(?:,\d{3})*)";

static PRICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)₹\s*{AMOUNT}"),
        format!(r"(?i)rs\.?\s*{AMOUNT}"),
        format!(r"(?i)inr\s*{AMOUNT}"),
        format!(r"(?i){AMOUNT}\s*rupees?"),
        format!(r"(?i)price[:\s]*₹?\s*{WHOLE_AMOUNT}"),
        format!(r"(?i)cost[:\s]*₹?\s*{WHOLE_AMOUNT}"),
        format!(r"(?i)from\s*₹?\s*{WHOLE_AMOUNT}"),
        format!(r"(?i)starting\s*₹?\s*{WHOLE_AMOUNT}"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid price regex"))
    .collect()
});

/// Pull rupee amounts out of free text, sorted and de-duplicated
#[must_use]
pub fn extract_prices(text: &str) -> Vec<u64> {
    let mut prices: Vec<u64> = PRICE_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .filter_map(|captures| captures.get(1))
        .filter_map(|amount| {
            let whole = amount.as_str().split('.').next().unwrap_or_default();
            whole.replace(',', "").parse::<u64>().ok()
        })
        .filter(|price| PRICE_RANGE.contains(price))
        .collect();
    prices.sort_unstable();
    prices.dedup();
    prices
}

/// Wikipedia page summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationSummary {
    pub title: String,
    pub extract: String,
    pub page_url: String,
}

/// Nominatim place match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoLocation {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Instant-answer text for a query plus the prices found in it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceInsight {
    pub summary: String,
    pub topics: Vec<String>,
    pub prices: Vec<u64>,
}

impl PriceInsight {
    fn from_answer(answer: wire::InstantAnswer) -> Self {
        let summary = [answer.abstract_text.trim(), answer.answer_text().trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let topics: Vec<String> = answer
            .related_topics
            .into_iter()
            .filter_map(|topic| topic.text)
            .take(3)
            .collect();
        let prices = extract_prices(&format!("{summary} {}", topics.join(" ")));
        Self {
            summary,
            topics,
            prices,
        }
    }

    /// `Rs. <min> - Rs. <max>`, or a neutral phrase when no price was found
    #[must_use]
    pub fn price_range(&self) -> String {
        match (self.prices.first(), self.prices.last()) {
            (Some(min), Some(max)) => format!("{} - {}", format_rupees(*min), format_rupees(*max)),
            _ => "Current pricing available".to_string(),
        }
    }
}

/// Everything research found; all fields may be empty
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TravelContext {
    pub destination: Option<DestinationSummary>,
    pub location: Option<GeoLocation>,
    pub accommodation: Option<PriceInsight>,
    pub transportation: Option<PriceInsight>,
}

impl TravelContext {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.location.is_none()
            && self.accommodation.is_none()
            && self.transportation.is_none()
    }
}

/// Source of travel context for a trip
#[async_trait]
pub trait TravelResearcher: Send + Sync {
    /// Never fails; missing information is simply absent
    async fn gather(&self, request: &TripRequest) -> TravelContext;
}

/// Researcher backed by the Wikipedia, Nominatim and DuckDuckGo APIs
pub struct WebResearcher {
    client: reqwest::Client,
    wikipedia_url: String,
    nominatim_url: String,
    duckduckgo_url: String,
    region_hint: Option<String>,
}

impl WebResearcher {
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build research HTTP client")?;

        Ok(Self {
            client,
            wikipedia_url: config.wikipedia_url.trim_end_matches('/').to_string(),
            nominatim_url: config.nominatim_url.clone(),
            duckduckgo_url: config.duckduckgo_url.clone(),
            region_hint: config.region_hint.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {url}"))
    }

    #[instrument(skip(self))]
    pub async fn wikipedia_summary(&self, destination: &str) -> Result<DestinationSummary> {
        let url = format!(
            "{}/{}",
            self.wikipedia_url,
            urlencoding::encode(&destination.trim().replace(' ', "_"))
        );
        let page: wire::WikipediaSummary = self.get_json(&url).await?;
        Ok(DestinationSummary {
            title: page.title,
            extract: page.extract,
            page_url: page
                .content_urls
                .and_then(|urls| urls.desktop)
                .map(|desktop| desktop.page)
                .unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    pub async fn locate(&self, place: &str) -> Result<Option<GeoLocation>> {
        let query = match &self.region_hint {
            Some(region) => format!("{place}, {region}"),
            None => place.to_string(),
        };
        let url = format!(
            "{}?q={}&format=json&limit=1&addressdetails=1",
            self.nominatim_url,
            urlencoding::encode(&query)
        );
        let places: Vec<wire::NominatimPlace> = self.get_json(&url).await?;
        Ok(places.into_iter().next().map(|place| GeoLocation {
            display_name: place.display_name,
            latitude: place.lat.parse().unwrap_or_default(),
            longitude: place.lon.parse().unwrap_or_default(),
        }))
    }

    #[instrument(skip(self))]
    pub async fn price_insight(&self, query: &str) -> Result<PriceInsight> {
        let url = format!(
            "{}?q={}&format=json&no_redirect=1&no_html=1&skip_disambig=1",
            self.duckduckgo_url,
            urlencoding::encode(&format!("{query} travel price cost"))
        );
        let answer: wire::InstantAnswer = self.get_json(&url).await?;
        Ok(PriceInsight::from_answer(answer))
    }
}

fn best_effort<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(lookup = what, error = %err, "research lookup skipped");
            None
        }
    }
}

#[async_trait]
impl TravelResearcher for WebResearcher {
    async fn gather(&self, request: &TripRequest) -> TravelContext {
        let destination = request.destination.trim();
        let hotels_query = format!("{destination} hotels accommodation price");
        let transport_query = format!(
            "{} to {destination} flight train bus price",
            request.departure_city.trim()
        );

        let (summary, location, accommodation, transportation) = tokio::join!(
            self.wikipedia_summary(destination),
            self.locate(destination),
            self.price_insight(&hotels_query),
            self.price_insight(&transport_query),
        );

        let context = TravelContext {
            destination: best_effort("wikipedia", summary),
            location: best_effort("nominatim", location).flatten(),
            accommodation: best_effort("accommodation prices", accommodation),
            transportation: best_effort("transport prices", transportation),
        };
        tracing::debug!(
            destination,
            has_summary = context.destination.is_some(),
            has_location = context.location.is_some(),
            "research finished"
        );
        context
    }
}

/// Response structures of the public APIs
mod wire {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct WikipediaSummary {
        #[serde(default)]
        pub title: String,
        #[serde(default)]
        pub extract: String,
        pub content_urls: Option<ContentUrls>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ContentUrls {
        pub desktop: Option<PageUrl>,
    }

    #[derive(Debug, Deserialize)]
    pub struct PageUrl {
        #[serde(default)]
        pub page: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct NominatimPlace {
        #[serde(default)]
        pub display_name: String,
        #[serde(default)]
        pub lat: String,
        #[serde(default)]
        pub lon: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct InstantAnswer {
        #[serde(rename = "AbstractText", default)]
        pub abstract_text: String,
        // Usually a string, occasionally a structured object
        #[serde(rename = "Answer", default)]
        pub answer: serde_json::Value,
        #[serde(rename = "RelatedTopics", default)]
        pub related_topics: Vec<RelatedTopic>,
    }

    impl InstantAnswer {
        pub fn answer_text(&self) -> &str {
            self.answer.as_str().unwrap_or_default()
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct RelatedTopic {
        #[serde(rename = "Text")]
        pub text: Option<String>,
    }
}
