//! Admin gate.
//!
//! Stateless shared-secret check, re-run on every mutating request. Uses
//! constant-time comparison to mitigate timing attacks.

use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Compares submitted credentials against the configured admin secret.
#[derive(Debug, Clone)]
pub struct AdminGate {
    secret: String,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// True only on an exact match with the configured secret.
    pub fn authenticate(&self, submitted: &str) -> bool {
        constant_time_compare(submitted, &self.secret)
    }

    /// Check an optional submitted secret, mapping a mismatch to `Unauthorized`.
    pub fn require(&self, submitted: Option<&str>) -> Result<(), AppError> {
        match submitted {
            Some(provided) if self.authenticate(provided) => Ok(()),
            _ => Err(AppError::Unauthorized("Unauthorized".to_string())),
        }
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
