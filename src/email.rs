//! Itinerary email composition and SMTP delivery

use askama::Template;
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Attachment, Mailbox, MultiPart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::EmailConfig;
use crate::models::{Itinerary, TripRequest, format_rupees};
use crate::render::markdown_to_html;
use crate::{Result, TripPlannerError};

#[derive(Template)]
#[template(path = "email.html")]
struct EmailBody<'a> {
    name: &'a str,
    destination: &'a str,
    days: i64,
    budget: String,
    transport: String,
    interests: String,
    travel_style: String,
    attachment_name: &'a str,
    itinerary_html: String,
}

/// A fully composed itinerary email, ready for any [`Mailer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

/// `Trip_Plan_<destination>.pdf` with spaces turned into underscores
#[must_use]
pub fn attachment_name(destination: &str) -> String {
    format!("Trip_Plan_{}.pdf", destination.trim().replace(' ', "_"))
}

impl ItineraryEmail {
    pub fn compose(
        request: &TripRequest,
        itinerary: &Itinerary,
        recipient: &str,
        pdf: Vec<u8>,
    ) -> Result<Self> {
        let destination = request.destination.trim();
        let attachment_name = attachment_name(destination);

        let html_body = EmailBody {
            name: request.name.trim(),
            destination,
            days: request.trip_days(),
            budget: format_rupees(request.total_budget),
            transport: request.transport_text(),
            interests: request.interests_text("General"),
            travel_style: format!(
                "{} trip with {} pace",
                request.trip_type,
                request.travel_pace.to_string().to_lowercase()
            ),
            attachment_name: &attachment_name,
            itinerary_html: markdown_to_html(&itinerary.text),
        }
        .render()?;

        let text_body = format!(
            "Dear {},\n\nYour personalized trip plan for {destination} is ready. \
The full report is attached as {attachment_name}.\n\n{}\n\nHave an amazing trip!\nAI Trip Planner Team\n",
            request.name.trim(),
            itinerary.text
        );

        Ok(Self {
            recipient: recipient.trim().to_string(),
            subject: format!("Your Personalized Trip Plan for {destination}"),
            html_body,
            text_body,
            attachment_name,
            attachment: pdf,
        })
    }
}

/// Delivers composed emails
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Resolves only once the server has accepted the message
    async fn send(&self, email: &ItineraryEmail) -> Result<()>;
}

/// STARTTLS SMTP delivery with sender credentials
pub struct SmtpMailer {
    transport: Option<SmtpTransport>,
    sender: Option<Mailbox>,
}

impl SmtpMailer {
    /// Missing credentials are not an error here; sending reports them
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let (Some(address), Some(password)) = (&config.sender_address, &config.sender_password)
        else {
            tracing::warn!("sender credentials missing, email delivery disabled");
            return Ok(Self {
                transport: None,
                sender: None,
            });
        };

        let sender: Mailbox = format!("{} <{}>", config.sender_name, address.trim())
            .parse()
            .map_err(|e| TripPlannerError::config(format!("invalid sender address: {e}")))?;

        let transport = SmtpTransport::starttls_relay(&config.smtp_host)
            .map_err(|e| TripPlannerError::config(format!("invalid SMTP relay: {e}")))?
            .port(config.smtp_port)
            .credentials(Credentials::new(address.trim().to_string(), password.clone()))
            .build();

        Ok(Self {
            transport: Some(transport),
            sender: Some(sender),
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    fn build_message(sender: &Mailbox, email: &ItineraryEmail) -> Result<Message> {
        let recipient: Mailbox = email
            .recipient
            .parse()
            .map_err(|e| TripPlannerError::email(format!("invalid recipient address: {e}")))?;
        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| TripPlannerError::general(format!("bad content type: {e}")))?;

        Message::builder()
            .from(sender.clone())
            .to(recipient)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .multipart(MultiPart::alternative_plain_html(
                        email.text_body.clone(),
                        email.html_body.clone(),
                    ))
                    .singlepart(
                        Attachment::new(email.attachment_name.clone())
                            .body(email.attachment.clone(), pdf_type),
                    ),
            )
            .map_err(|e| TripPlannerError::email(format!("could not build message: {e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(skip_all, fields(subject = %email.subject))]
    async fn send(&self, email: &ItineraryEmail) -> Result<()> {
        let (Some(transport), Some(sender)) = (&self.transport, &self.sender) else {
            return Err(TripPlannerError::config("Email service"));
        };

        let message = Self::build_message(sender, email)?;
        let transport = transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| TripPlannerError::general(format!("email task failed: {e}")))?
            .map_err(|e| {
                tracing::error!(error = %e, "SMTP delivery failed");
                TripPlannerError::email(e.to_string())
            })?;

        tracing::info!(recipient = %email.recipient, "sent itinerary email");
        Ok(())
    }
}
