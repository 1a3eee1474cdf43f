//! Charge issuing.
//!
//! A charge wraps one payload with what the rest of the system needs to hand
//! it out: an opaque id to track it by, a render handle for the image and an
//! expiry. The id is random and never enters the payload.

use pix_codec::{Payload, PayloadError, PaymentRequest, PixAmount, assemble_and_checksum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::render::{QrRenderer, QrServerRenderer};
use crate::timestamp::UnixTimestamp;

/// Who gets paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub pix_key: String,
    pub name: String,
    pub city: String,
}

/// A charge to be paid via PIX.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub id: String,
    pub amount: PixAmount,
    /// Shown to the payer as the reference label; cut to 25 characters.
    pub description: String,
}

/// An issued charge, ready to be stored and shown to the payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PixCharge {
    /// Random 128-bit id, lower-hex.
    pub pix_code: String,
    /// Render handle for the scannable image.
    pub qr_code: String,
    /// The payload itself, for copy-and-paste payments.
    pub qr_code_text: Payload,
    pub expires_at: UnixTimestamp,
}

impl PixCharge {
    pub fn is_expired(&self, now: UnixTimestamp) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChargeError {
    #[error("Failed to build PIX payload for charge {charge_id}: {source}")]
    Payload {
        charge_id: String,
        #[source]
        source: PayloadError,
    },
}

/// Issues charges for a single merchant.
pub struct ChargeIssuer<R = QrServerRenderer> {
    merchant: Merchant,
    expiration: Duration,
    renderer: R,
}

impl ChargeIssuer<QrServerRenderer> {
    pub fn from_config(config: &Config) -> Self {
        ChargeIssuer::new(
            config.merchant(),
            config.expiration(),
            QrServerRenderer::new(config.qr_renderer_url().clone()),
        )
    }
}

impl<R: QrRenderer> ChargeIssuer<R> {
    pub fn new(merchant: Merchant, expiration: Duration, renderer: R) -> Self {
        Self {
            merchant,
            expiration,
            renderer,
        }
    }

    /// Issues a charge that expires `expiration` from now.
    pub fn issue(&self, request: &ChargeRequest) -> Result<PixCharge, ChargeError> {
        self.issue_at(request, UnixTimestamp::now())
    }

    /// Issues a charge as of `now`.
    pub fn issue_at(
        &self,
        request: &ChargeRequest,
        now: UnixTimestamp,
    ) -> Result<PixCharge, ChargeError> {
        let payment = PaymentRequest::new(
            self.merchant.pix_key.as_str(),
            self.merchant.name.as_str(),
            self.merchant.city.as_str(),
        )
        .with_amount(request.amount)
        .with_reference_label(request.description.as_str());

        let payload = assemble_and_checksum(&payment)
            .inspect_err(|e| tracing::error!(charge_id = %request.id, error = %e, "Error generating PIX code"))
            .map_err(|source| ChargeError::Payload {
                charge_id: request.id.clone(),
                source,
            })?;

        let pix_code = new_pix_code();
        let qr_code = self.renderer.render(payload.as_str());
        tracing::info!(
            charge_id = %request.id,
            amount = %request.amount,
            pix_code = %pix_code,
            "PIX code generated"
        );

        Ok(PixCharge {
            pix_code,
            qr_code,
            qr_code_text: payload,
            expires_at: now + self.expiration,
        })
    }
}

fn new_pix_code() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}
