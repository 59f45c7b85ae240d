//! Card recharge through the hosted checkout page.
//!
//! We never see card data: the app builds a signed set of hidden form fields
//! and hands the user over to the payment gateway.

use serde::Serialize;
use sha2::{Digest, Sha256};
use ulid::Ulid;

use crate::{config::CheckoutConfig, error::TuyoError};

pub const CURRENCY: &str = "COP";

/// Whole pesos to the gateway's cent amount. Rejects amounts that do not fit.
pub fn pesos_to_cents(pesos: u64) -> Result<u64, TuyoError> {
    pesos
        .checked_mul(100)
        .ok_or_else(|| TuyoError::Other(format!("recharge amount too large: {pesos}")))
}

/// Fields posted to the checkout page, in the gateway's naming.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutForm {
    #[serde(rename = "public-key")]
    pub public_key: String,
    pub currency: String,
    #[serde(rename = "amount-in-cents")]
    pub amount_in_cents: u64,
    pub reference: String,
    #[serde(rename = "signature:integrity")]
    pub signature: String,
    #[serde(rename = "redirect-url", skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip)]
    pub action: String,
}

impl CheckoutForm {
    /// Build a form for recharging `tarjeta_id` with `amount_in_cents`.
    /// The reference is unique per attempt.
    pub fn new(
        config: &CheckoutConfig,
        tarjeta_id: i64,
        amount_in_cents: u64,
    ) -> Result<Self, TuyoError> {
        let reference = format!("TUYO-{tarjeta_id}-{}", Ulid::new());
        Self::with_reference(config, reference, amount_in_cents)
    }

    pub fn with_reference(
        config: &CheckoutConfig,
        reference: String,
        amount_in_cents: u64,
    ) -> Result<Self, TuyoError> {
        if amount_in_cents == 0 {
            return Err(TuyoError::Other("recharge amount must be positive".into()));
        }
        let signature = integrity_signature(
            &reference,
            amount_in_cents,
            CURRENCY,
            &config.integrity_secret,
        );
        Ok(Self {
            public_key: config.public_key.clone(),
            currency: CURRENCY.to_string(),
            amount_in_cents,
            reference,
            signature,
            redirect_url: config.redirect_url.clone(),
            action: config.checkout_url.clone(),
        })
    }

    /// `name=value` pairs for the hidden inputs.
    pub fn hidden_fields(&self) -> Result<Vec<(String, String)>, TuyoError> {
        let query = self.query_string()?;
        serde_urlencoded::from_str(&query).map_err(|e| TuyoError::Other(e.to_string()))
    }

    pub fn query_string(&self) -> Result<String, TuyoError> {
        serde_urlencoded::to_string(self).map_err(|e| TuyoError::Other(e.to_string()))
    }

    /// Checkout URL with the form encoded as a query string.
    pub fn redirect_url(&self) -> Result<String, TuyoError> {
        Ok(format!("{}?{}", self.action, self.query_string()?))
    }
}

/// `hex(sha256(reference ‖ amount ‖ currency ‖ secret))`.
pub fn integrity_signature(
    reference: &str,
    amount_in_cents: u64,
    currency: &str,
    secret: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(amount_in_cents.to_string().as_bytes());
    hasher.update(currency.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CheckoutConfig {
        CheckoutConfig {
            public_key: "pub_test_123".into(),
            integrity_secret: "test_integrity_secret".into(),
            checkout_url: "https://checkout.example/p/".into(),
            redirect_url: None,
        }
    }

    #[test]
    fn signature_matches_concatenation_hash() {
        let expected = hex::encode(Sha256::digest(b"REF-12500000COPtest_integrity_secret"));
        assert_eq!(
            integrity_signature("REF-1", 2_500_000, "COP", "test_integrity_secret"),
            expected
        );
    }

    #[test]
    fn pesos_convert_without_overflow() {
        assert_eq!(pesos_to_cents(25_000).unwrap(), 2_500_000);
        assert!(pesos_to_cents(200_000_000_000_000_000).is_err());
        assert!(pesos_to_cents(u64::MAX / 100).is_ok());
    }

    #[test]
    fn references_are_unique() {
        let a = CheckoutForm::new(&config(), 9, 1_000_000).unwrap();
        let b = CheckoutForm::new(&config(), 9, 1_000_000).unwrap();
        assert_ne!(a.reference, b.reference);
        assert_ne!(a.signature, b.signature);
        assert!(a.reference.starts_with("TUYO-9-"));
    }

    #[test]
    fn zero_amount_is_rejected() {
        assert!(CheckoutForm::with_reference(&config(), "R".into(), 0).is_err());
    }

    #[test]
    fn hidden_fields_use_gateway_names() {
        let form = CheckoutForm::with_reference(&config(), "R-1".into(), 500_000).unwrap();
        let fields = form.hidden_fields().unwrap();
        assert!(fields.contains(&("amount-in-cents".to_string(), "500000".to_string())));
        assert!(fields.contains(&("signature:integrity".to_string(), form.signature.clone())));
        assert!(form
            .redirect_url()
            .unwrap()
            .starts_with("https://checkout.example/p/?public-key=pub_test_123"));
    }
}
