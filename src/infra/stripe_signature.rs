//! Stripe webhook signature scheme.
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac-sha256>[,v1=...]`, where the
//! MAC covers `"{t}.{raw body}"` keyed with the endpoint's signing secret.

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::webhook_verifier::WebhookVerifier,
};

type HmacSha256 = Hmac<Sha256>;

pub struct StripeSignatureVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl StripeSignatureVerifier {
    pub fn new(secret: SecretString, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    fn verify_at(&self, raw_body: &str, signature_header: &str, now: i64) -> AppResult<()> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = Some(value),
                "v1" => signatures.push(value),
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| AppError::InvalidSignature("Missing timestamp".into()))?;
        if signatures.is_empty() {
            return Err(AppError::InvalidSignature("Missing v1 signature".into()));
        }
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| AppError::InvalidSignature("Invalid timestamp".into()))?;

        let expected = compute_signature(self.secret.expose_secret(), timestamp, raw_body)?;
        let matched = signatures
            .iter()
            .any(|sig| bool::from(sig.as_bytes().ct_eq(expected.as_bytes())));
        if !matched {
            return Err(AppError::InvalidSignature("Signature mismatch".into()));
        }

        if (now - ts).abs() > self.tolerance_secs {
            return Err(AppError::InvalidSignature(
                "Timestamp outside tolerance".into(),
            ));
        }

        Ok(())
    }
}

impl WebhookVerifier for StripeSignatureVerifier {
    fn verify(&self, raw_body: &str, signature_header: &str) -> AppResult<()> {
        self.verify_at(raw_body, signature_header, Utc::now().timestamp())
            .inspect_err(|e| tracing::warn!(error = %e, "Webhook signature rejected"))
    }
}

fn compute_signature(secret: &str, timestamp: &str, body: &str) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("HMAC error".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a signature header the way the provider does.
#[cfg(test)]
pub fn sign_payload(secret: &str, timestamp: i64, body: &str) -> String {
    let timestamp = timestamp.to_string();
    let signature =
        compute_signature(secret, &timestamp, body).expect("HMAC accepts any key length");
    format!("t={},v1={}", timestamp, signature)
}
