//! Signatures for plans that travel through the client between `/plan` and `/email`
//!
//! The service keeps no session, so the request and generated text come back
//! from the browser (or API client). A plan is only emailed when its HMAC
//! matches, which keeps `/email` from sending arbitrary content.

use hmac::{Hmac, Mac};
use rand::RngExt;
use sha2::Sha256;

use crate::config::ServerConfig;
use crate::models::TripRequest;
use crate::{Result, TripPlannerError};

type HmacSha256 = Hmac<Sha256>;

const UNVERIFIED_PLAN: &str = "This trip plan could not be verified. Please plan your trip again.";

#[derive(Clone)]
pub struct PlanSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for PlanSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanSigner").finish_non_exhaustive()
    }
}

impl PlanSigner {
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    /// Signer with a fresh key; plans do not survive a restart
    #[must_use]
    pub fn random() -> Self {
        let key: [u8; 32] = rand::rng().random();
        Self::new(&key)
    }

    /// Configured key, or a random one when none is set
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        match config.signing_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Self::new(key.as_bytes()),
            _ => Self::random(),
        }
    }

    fn mac(&self, request: &TripRequest, itinerary: &str) -> Result<HmacSha256> {
        let request_json = serde_json::to_string(request)
            .map_err(|e| TripPlannerError::render(format!("could not encode request: {e}")))?;
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| TripPlannerError::config(format!("invalid signing key: {e}")))?;

        // length prefix keeps the request/itinerary boundary unambiguous
        mac.update(&(request_json.len() as u64).to_be_bytes());
        mac.update(request_json.as_bytes());
        mac.update(itinerary.as_bytes());
        Ok(mac)
    }

    /// Hex HMAC-SHA256 over the request and the itinerary text
    pub fn sign(&self, request: &TripRequest, itinerary: &str) -> Result<String> {
        Ok(hex::encode(self.mac(request, itinerary)?.finalize().into_bytes()))
    }

    pub fn verify(&self, request: &TripRequest, itinerary: &str, signature: &str) -> Result<()> {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return Err(TripPlannerError::forbidden(UNVERIFIED_PLAN));
        };
        self.mac(request, itinerary)?
            .verify_slice(&expected)
            .map_err(|_| TripPlannerError::forbidden(UNVERIFIED_PLAN))
    }
}
