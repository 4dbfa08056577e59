//! Card-number crypto collaborator
//!
//! Encryption of card numbers is an external concern; the core consumes it
//! through the [`CardCrypto`] trait and treats the encrypted handle as an
//! opaque string. The only number-shaped logic that lives here is masking,
//! which produces the display form embedded in synthesized transaction
//! descriptions and card views.
//!
//! The core never stores or logs a plaintext number.

use crate::types::LedgerError;

/// External crypto service for card numbers
pub trait CardCrypto: Send + Sync {
    /// Encrypt a plaintext card number into an opaque handle
    fn encrypt(&self, number: &str) -> Result<String, LedgerError>;

    /// Decrypt an opaque handle back into the plaintext number
    fn decrypt(&self, handle: &str) -> Result<String, LedgerError>;

    /// Decrypt a handle and return only the masked display form
    fn mask_decrypted(&self, handle: &str) -> Result<String, LedgerError> {
        Ok(mask_card_number(&self.decrypt(handle)?))
    }
}

/// Mask a plaintext card number for display
///
/// Keeps the last four characters: `"**** **** **** 1234"`. Numbers
/// shorter than four characters mask to `"****"`.
pub fn mask_card_number(number: &str) -> String {
    if number.len() < 4 {
        return "****".to_string();
    }
    let last4 = &number[number.len() - 4..];
    format!("**** **** **** {}", last4)
}

/// Development stand-in for the external crypto service
///
/// Tags the plaintext instead of encrypting it, so replayed scenarios and
/// tests are deterministic without key material. Not for production use;
/// deployments supply their own [`CardCrypto`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCrypto;

impl PassthroughCrypto {
    const PREFIX: &'static str = "enc:";
}

impl CardCrypto for PassthroughCrypto {
    fn encrypt(&self, number: &str) -> Result<String, LedgerError> {
        Ok(format!("{}{}", Self::PREFIX, number))
    }

    fn decrypt(&self, handle: &str) -> Result<String, LedgerError> {
        handle
            .strip_prefix(Self::PREFIX)
            .map(str::to_string)
            .ok_or_else(|| LedgerError::crypto("unrecognized card number handle"))
    }
}
