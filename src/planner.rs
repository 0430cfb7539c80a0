//! Trip planning workflow: validate, research, prompt, generate, deliver

use std::sync::Arc;

use chrono::NaiveDate;

use crate::email::{ItineraryEmail, Mailer};
use crate::llm::ItineraryGenerator;
use crate::models::preferences::is_valid_email;
use crate::models::{Itinerary, TripRequest};
use crate::prompt::build_prompt;
use crate::report::TripReport;
use crate::research::{TravelContext, TravelResearcher};
use crate::signing::PlanSigner;
use crate::{Result, TripPlannerError};

/// Stateless orchestrator shared by all request handlers
pub struct TripPlanner {
    generator: Arc<dyn ItineraryGenerator>,
    mailer: Arc<dyn Mailer>,
    researcher: Option<Arc<dyn TravelResearcher>>,
    signer: PlanSigner,
}

impl TripPlanner {
    pub fn new(
        generator: Arc<dyn ItineraryGenerator>,
        mailer: Arc<dyn Mailer>,
        researcher: Option<Arc<dyn TravelResearcher>>,
    ) -> Self {
        Self {
            generator,
            mailer,
            researcher,
            signer: PlanSigner::random(),
        }
    }

    #[must_use]
    pub fn with_signer(mut self, signer: PlanSigner) -> Self {
        self.signer = signer;
        self
    }

    pub fn signer(&self) -> &PlanSigner {
        &self.signer
    }

    /// Generate an itinerary; invalid requests never reach an external service
    #[tracing::instrument(skip_all, fields(destination = %request.destination))]
    pub async fn plan(&self, request: &TripRequest, today: NaiveDate) -> Result<Itinerary> {
        request.validate(today)?;

        let context = match &self.researcher {
            Some(researcher) => researcher.gather(request).await,
            None => TravelContext::default(),
        };

        let prompt = build_prompt(request, &context);
        let text = self.generator.generate(&prompt).await?;

        tracing::info!(
            days = request.trip_days(),
            researched = !context.is_empty(),
            chars = text.len(),
            "itinerary generated"
        );
        let signature = self.signer.sign(request, &text)?;
        Ok(Itinerary::new(
            request.destination.trim().to_string(),
            request.trip_days(),
            text,
        )
        .with_signature(signature))
    }

    /// Email an itinerary this service generated, with its PDF report
    #[tracing::instrument(skip_all, fields(destination = %request.destination))]
    pub async fn email(
        &self,
        request: &TripRequest,
        itinerary: &Itinerary,
        recipient: &str,
    ) -> Result<()> {
        self.signer
            .verify(request, &itinerary.text, &itinerary.signature)?;

        if !is_valid_email(recipient) {
            return Err(TripPlannerError::validation(
                "Please enter a valid email address.",
            ));
        }
        if itinerary.text.trim().is_empty() {
            return Err(TripPlannerError::validation(
                "Please generate a trip plan before emailing it.",
            ));
        }

        let pdf = TripReport::build(request, itinerary).to_pdf()?;
        let email = ItineraryEmail::compose(request, itinerary, recipient, pdf)?;
        self.mailer.send(&email).await
    }
}
