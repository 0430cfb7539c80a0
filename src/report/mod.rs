//! PDF trip report attached to itinerary emails
//!
//! [`TripReport::build`] turns a request and its itinerary into a list of
//! layout blocks; [`pdf::render_pdf`] typesets those blocks.

pub mod pdf;

use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;

use crate::Result;
use crate::models::{BudgetBreakdown, Itinerary, TripRequest, format_rupees};

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));

const TRANSLITERATIONS: &[(char, &str)] = &[
    ('₹', "Rs."),
    ('•', "-"),
    ('\u{2011}', "-"),
    ('–', "-"),
    ('—', "-"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('…', "..."),
    ('°', " degrees"),
    ('×', "x"),
    ('÷', "/"),
    ('é', "e"),
    ('è', "e"),
    ('ê', "e"),
    ('ë', "e"),
    ('à', "a"),
    ('á', "a"),
    ('â', "a"),
    ('ä', "a"),
    ('ç', "c"),
    ('ñ', "n"),
    ('\t', " "),
];

/// Strip markdown emphasis and reduce text to the ASCII the base fonts can show
#[must_use]
pub fn to_pdf_text(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");

    let mut clean = String::with_capacity(text.len());
    for ch in text.chars() {
        if let Some((_, replacement)) = TRANSLITERATIONS.iter().find(|(from, _)| *from == ch) {
            clean.push_str(replacement);
        } else if ch.is_ascii() && !ch.is_ascii_control() {
            clean.push(ch);
        }
    }
    clean
}

/// One unit of report layout
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Centered title with subtitle lines
    Title { heading: String, lines: Vec<String> },
    /// Underlined section heading
    Section(String),
    Subheading(String),
    Paragraph(String),
    Bullet(String),
    /// Bordered table; `widths` are fractions of the text width
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        total: Vec<String>,
        widths: Vec<f32>,
    },
    /// Italic closing remark
    Closing(String),
}

/// Everything that goes into the PDF, already cleaned for the base fonts
#[derive(Debug, Clone, PartialEq)]
pub struct TripReport {
    pub title: String,
    pub blocks: Vec<Block>,
}

struct ReportBuilder {
    blocks: Vec<Block>,
}

impl ReportBuilder {
    fn section(&mut self, title: &str) {
        self.blocks.push(Block::Section(to_pdf_text(title)));
    }

    fn subheading(&mut self, text: &str) {
        self.blocks.push(Block::Subheading(to_pdf_text(text)));
    }

    fn paragraph(&mut self, text: &str) {
        let clean = to_pdf_text(text);
        if !clean.trim().is_empty() {
            self.blocks.push(Block::Paragraph(clean.trim().to_string()));
        }
    }

    fn bullets<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            let clean = to_pdf_text(item.as_ref());
            if !clean.trim().is_empty() {
                self.blocks.push(Block::Bullet(clean.trim().to_string()));
            }
        }
    }
}

fn is_table_rule(line: &str) -> bool {
    line.starts_with('|') && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// Lay the generated markdown out as headings, bullets and paragraphs
fn itinerary_blocks(builder: &mut ReportBuilder, text: &str) {
    fn flush(builder: &mut ReportBuilder, paragraph: &mut Vec<&str>) {
        if !paragraph.is_empty() {
            builder.paragraph(&paragraph.join(" "));
            paragraph.clear();
        }
    }

    let mut paragraph: Vec<&str> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || is_table_rule(line) || line.chars().all(|c| c == '-' || c == '*') {
            flush(builder, &mut paragraph);
        } else if line.starts_with('#') {
            flush(builder, &mut paragraph);
            let heading = to_pdf_text(line.trim_start_matches('#'));
            if !heading.trim().is_empty() {
                builder.blocks.push(Block::Subheading(heading.trim().to_string()));
            }
        } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            flush(builder, &mut paragraph);
            builder.bullets([item]);
        } else if line.starts_with('|') {
            flush(builder, &mut paragraph);
            let cells: Vec<&str> = line
                .trim_matches('|')
                .split('|')
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .collect();
            builder.bullets([cells.join(" | ")]);
        } else {
            paragraph.push(line);
        }
    }
    flush(builder, &mut paragraph);
}

fn budget_table(request: &TripRequest) -> Block {
    let breakdown = BudgetBreakdown::new(request.total_budget, &request.allocation);
    let nights = (request.trip_days() - 1).max(1);
    let details = |category: &str| match category {
        "Transportation" => format!("{} + local transport", request.transport_text()),
        "Accommodation" => format!("Hotels for {nights} nights"),
        "Food & Dining" => format!("{} cuisine preferences", request.dietary_preference),
        "Activities" => "Sightseeing and experiences".to_string(),
        _ => "Shopping and emergency fund".to_string(),
    };

    Block::Table {
        headers: vec![
            "Category".to_string(),
            "Allocated Budget".to_string(),
            "Details".to_string(),
        ],
        rows: breakdown
            .lines
            .iter()
            .map(|line| {
                vec![
                    line.category.to_string(),
                    format_rupees(line.amount),
                    to_pdf_text(&details(line.category)),
                ]
            })
            .collect(),
        total: vec![
            "TOTAL BUDGET".to_string(),
            format_rupees(breakdown.total),
            "Complete trip allocation".to_string(),
        ],
        widths: vec![0.28, 0.22, 0.5],
    }
}

fn interest_extras(request: &TripRequest) -> Vec<&'static str> {
    let catalogue: [(&str, &[&str]); 6] = [
        (
            "Adventure",
            &[
                "Trekking shoes and hiking socks",
                "Quick-dry adventure clothing and cargo pants",
                "Waterproof backpack and dry bags",
                "Water bottles and energy bars",
            ],
        ),
        (
            "Culture",
            &[
                "Modest clothing for religious sites (covered shoulders/legs)",
                "Comfortable shoes for walking in museums",
                "Notebook for cultural observations",
            ],
        ),
        (
            "Food",
            &[
                "Digestive tablets and probiotics",
                "Reusable water bottle for food tours",
            ],
        ),
        (
            "Shopping",
            &[
                "Extra luggage space or foldable duffel bag",
                "Calculator for currency conversion",
            ],
        ),
        (
            "Nature",
            &[
                "Binoculars for bird watching",
                "Field notebook for nature observations",
            ],
        ),
        (
            "Photography",
            &[
                "Camera with multiple lenses and spare batteries",
                "Compact travel tripod",
                "Lens cleaning kit",
            ],
        ),
    ];

    catalogue
        .iter()
        .filter(|(interest, _)| request.has_interest(interest))
        .flat_map(|(_, items)| items.iter().copied())
        .collect()
}

/// Packing advice for the travel month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Season {
    name: &'static str,
    clothing: &'static str,
    gear: &'static str,
}

impl Season {
    fn for_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self {
                name: "Winter",
                clothing: "warm layers, sweaters, jacket, long pants, warm socks",
                gear: "light jacket, scarf, and gloves for evening",
            },
            3..=5 => Self {
                name: "Hot Season",
                clothing: "light cotton clothing, breathable fabrics, shorts, t-shirts",
                gear: "wide-brimmed hat, sunglasses, and light scarf",
            },
            6..=9 => Self {
                name: "Monsoon Season",
                clothing: "quick-dry clothes, light rain jacket, waterproof shoes",
                gear: "umbrella, waterproof bag covers, and rain poncho",
            },
            _ => Self {
                name: "Pleasant Weather",
                clothing: "comfortable cotton clothes, light layers for evening",
                gear: "light sweater for evening and early morning",
            },
        }
    }
}

fn packing_checklist(builder: &mut ReportBuilder, request: &TripRequest) {
    builder.section("Packing Essentials");

    builder.subheading("Documents & Money");
    builder.bullets([
        "Valid photo ID (passport, national ID or driving licence), originals and copies",
        "Tickets and hotel booking confirmations, digital and printed",
        "Travel insurance documents and emergency contact details",
        "Medical prescriptions and health certificates if required",
        "Cash in small denominations plus ATM/credit cards",
    ]);

    let season = Season::for_month(request.departure_date.month());
    builder.subheading(&format!(
        "Clothing for {} ({})",
        request.destination.trim(),
        season.name
    ));
    builder.bullets([
        "Comfortable walking shoes (2 pairs)".to_string(),
        format!("Weather-appropriate clothing: {}", season.clothing),
        format!("Undergarments for {} days", request.trip_days() + 2),
        "Sleepwear and one smarter outfit for dining or cultural events".to_string(),
        format!("Weather gear: {}", season.gear),
    ]);

    builder.subheading("Electronics");
    builder.bullets([
        "Smartphone with offline maps downloaded",
        "Power bank and charging cables",
        "Universal power adapter",
        "Earphones for the journey",
    ]);

    builder.subheading("Health & Personal Care");
    builder.bullets([
        "Basic first-aid kit and personal medications with extra supply",
        "Hand sanitizer and wet wipes",
        "Sunscreen (SPF 30+) and insect repellent",
        "Oral rehydration salts and digestive aids",
    ]);

    let extras = interest_extras(request);
    if !extras.is_empty() {
        builder.subheading("Special Items for Your Interests");
        builder.bullets(extras);
    }
}

fn interest_tips(request: &TripRequest) -> Vec<&'static str> {
    let catalogue: [(&str, &[&str]); 5] = [
        (
            "Photography",
            &[
                "Ask permission before photographing people, especially in rural areas",
                "Golden hour photography is best - early morning and late afternoon",
                "Protect camera equipment from dust and humidity",
            ],
        ),
        (
            "Food",
            &[
                "Visit local markets in the morning for fresh ingredients",
                "Ask hotel staff for authentic local restaurant recommendations",
                "Try regional breakfast dishes, often the most authentic meals",
            ],
        ),
        (
            "Shopping",
            &[
                "Government emporiums have fixed prices and authentic products",
                "Best bargains are found in local markets, not tourist areas",
                "Check airline weight limits before buying heavy items",
            ],
        ),
        (
            "Adventure",
            &[
                "Book adventure activities through reputable tour operators",
                "Check weather conditions before outdoor activities",
                "Tell hotel staff about your plans and expected return time",
            ],
        ),
        (
            "Culture",
            &[
                "Visit cultural sites early in the morning to avoid crowds",
                "Hire local guides for deeper cultural insights",
                "Attend local festivals or cultural events if the timing aligns",
            ],
        ),
    ];

    catalogue
        .iter()
        .filter(|(interest, _)| request.has_interest(interest))
        .flat_map(|(_, tips)| tips.iter().copied())
        .collect()
}

fn local_tips(builder: &mut ReportBuilder, request: &TripRequest) {
    let destination = request.destination.trim();
    builder.section("Local Tips & Cultural Guidelines");

    builder.subheading("Cultural Etiquette & Customs");
    builder.bullets([
        format!("Read up on {destination} customs and local etiquette before arrival"),
        "Dress modestly at religious sites, covering shoulders and legs".to_string(),
        "Learn basic local greetings and common phrases".to_string(),
        "Respect religious and cultural practices, especially during festivals".to_string(),
        "Check for photography restrictions at cultural and government sites".to_string(),
        "Follow local dining etiquette and customs".to_string(),
    ]);

    builder.subheading("Money Matters & Bargaining");
    builder.bullets([
        "Carry small denominations (Rs. 10, 20, 50, 100) for street vendors and auto-rickshaws",
        "Bargaining is expected at local markets; start at 30-40% of the quoted price",
        "Fixed-price shops and malls do not bargain",
        "Keep money in more than one place: wallet, bag and a hidden pocket",
        "Prefer bank ATMs for better security",
        "UPI payments (Google Pay, PhonePe, Paytm) are widely accepted",
        "Tipping: 10% at restaurants, Rs. 20-50 for hotel staff, Rs. 10-20 for taxi drivers",
    ]);

    builder.subheading("Getting Around Like a Local");
    builder.bullets([
        format!("Look up {destination} public transport options before arrival"),
        "Use ride-sharing apps for safe and convenient travel".to_string(),
        "Insist on the meter or agree on taxi and auto fares in advance".to_string(),
        "Download offline maps and local transport apps".to_string(),
        "Allow extra time for travel during peak hours".to_string(),
    ]);

    builder.subheading("Food & Water Safety");
    builder.bullets([
        "Drink bottled or properly boiled water, not tap water",
        "Eat at busy restaurants with high turnover",
        "Avoid raw salads and unpeeled fruit from street vendors",
        "Street food is generally safe at popular, crowded stalls",
        "Wash hands or use sanitizer before eating",
        "Start with milder spices and work up to spicier food",
    ]);

    builder.subheading("Safety & Security Guidelines");
    builder.bullets([
        "Keep copies of important documents separate from the originals",
        "Avoid displaying expensive jewellery, cameras or large amounts of cash",
        "Be cautious of overly friendly strangers offering help or deals",
        "Keep the hotel address written down in the local language",
        "Use hotel safes for valuables and documents",
        "Trust your instincts and leave situations that feel wrong",
    ]);

    builder.subheading("Communication & Language");
    builder.bullets([
        "English is widely spoken in tourist areas and hotels",
        "Download a translation app with offline language packs",
        "Carry the hotel's business card with its address in the local language",
        "Locals are generally helpful; do not hesitate to ask for directions",
    ]);

    let tips = interest_tips(request);
    if !tips.is_empty() {
        builder.subheading("Tips for Your Specific Interests");
        builder.bullets(tips);
    }
}

fn emergency_contacts(builder: &mut ReportBuilder, request: &TripRequest) {
    builder.section("Emergency Contacts & Important Information");

    builder.subheading("Personal Emergency Contacts");
    let emergency = request
        .emergency_contact
        .as_deref()
        .map(str::trim)
        .filter(|contact| !contact.is_empty())
        .unwrap_or("Not provided");
    builder.bullets([
        format!(
            "Primary Traveler: {} - {}",
            request.name.trim(),
            request.mobile.trim()
        ),
        format!("Emergency Contact: {emergency}"),
    ]);

    builder.subheading("Official Emergency Numbers (India)");
    builder.bullets([
        "Universal Emergency: 112 (Police, Fire, Medical)",
        "Police: 100",
        "Fire Brigade: 101",
        "Ambulance: 108",
        "Tourist Helpline: 1363 (24x7 multilingual support)",
        "Women's Safety: 1091",
        "Railway Enquiry: 139",
        "Road Accident Emergency: 1073",
    ]);
}

impl TripReport {
    #[must_use]
    pub fn build(request: &TripRequest, itinerary: &Itinerary) -> Self {
        let destination = request.destination.trim();
        let days = request.trip_days();
        let mut builder = ReportBuilder { blocks: Vec::new() };

        builder.blocks.push(Block::Title {
            heading: to_pdf_text(&format!("Trip Plan to {destination}")),
            lines: vec![
                to_pdf_text(&format!("For: {}", request.name.trim())),
                format!(
                    "Dates: {} to {}",
                    request.departure_date, request.return_date
                ),
                "Personalized AI-Generated Itinerary".to_string(),
            ],
        });

        builder.section("Trip Overview");
        builder.paragraph(&format!(
            "This {days}-day {} trip to {destination} is designed for {} travelers with a total budget of {}.",
            request.trip_type.to_string().to_lowercase(),
            request.num_travelers,
            format_rupees(request.total_budget)
        ));
        builder.paragraph(&format!(
            "The itinerary focuses on {} with a {}-paced schedule, featuring {} dining options and {} transportation.",
            request.interests_text("sightseeing").to_lowercase(),
            request.travel_pace.to_string().to_lowercase(),
            request.dietary_preference,
            request.transport_text()
        ));

        builder.section("Your Itinerary");
        itinerary_blocks(&mut builder, &itinerary.text);

        builder.section("Budget Breakdown");
        builder.blocks.push(budget_table(request));

        packing_checklist(&mut builder, request);
        local_tips(&mut builder, request);
        emergency_contacts(&mut builder, request);

        builder.blocks.push(Block::Closing(to_pdf_text(&format!(
            "Enjoy your {days}-day adventure in {destination}! Have a wonderful and safe trip!"
        ))));

        Self {
            title: to_pdf_text(&format!("Trip Plan to {destination}")),
            blocks: builder.blocks,
        }
    }

    /// Typeset the report as a PDF document
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        pdf::render_pdf(self)
    }
}
