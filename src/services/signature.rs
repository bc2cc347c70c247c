//! Authenticity check for provider notifications.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;

use crate::domain::{MalformedEvent, ProviderEvent};

type HmacSha512 = Hmac<Sha512>;

/// Carries no detail on purpose; callers only learn that verification failed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid signature")]
pub struct InvalidSignature;

/// A request body whose signature has been checked. Only verified bytes can be
/// parsed into a [`ProviderEvent`].
#[derive(Debug)]
pub struct VerifiedPayload<'a> {
    body: &'a [u8],
}

impl<'a> VerifiedPayload<'a> {
    pub fn parse(&self) -> Result<ProviderEvent, MalformedEvent> {
        ProviderEvent::from_slice(self.body)
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.body
    }
}

pub trait SignatureVerifier: Send + Sync {
    fn verify<'a>(
        &self,
        signature: &str,
        raw_body: &'a [u8],
    ) -> Result<VerifiedPayload<'a>, InvalidSignature>;
}

/// Paystack signs the exact request bytes with HMAC-SHA512 keyed by the secret key
/// and sends the lowercase hex digest in `x-paystack-signature`.
#[derive(Clone)]
pub struct HmacSha512Verifier {
    secret: Vec<u8>,
}

impl HmacSha512Verifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> Result<HmacSha512, InvalidSignature> {
        HmacSha512::new_from_slice(&self.secret).map_err(|_| InvalidSignature)
    }

    /// Hex signature for `body`, as the provider would compute it.
    pub fn sign(&self, body: &[u8]) -> String {
        match self.mac() {
            Ok(mut mac) => {
                mac.update(body);
                hex::encode(mac.finalize().into_bytes())
            }
            Err(_) => String::new(),
        }
    }
}

impl SignatureVerifier for HmacSha512Verifier {
    fn verify<'a>(
        &self,
        signature: &str,
        raw_body: &'a [u8],
    ) -> Result<VerifiedPayload<'a>, InvalidSignature> {
        let expected = hex::decode(signature.trim()).map_err(|_| InvalidSignature)?;

        let mut mac = self.mac()?;
        mac.update(raw_body);
        // verify_slice compares in constant time and rejects length mismatches.
        mac.verify_slice(&expected).map_err(|_| InvalidSignature)?;

        Ok(VerifiedPayload { body: raw_body })
    }
}
