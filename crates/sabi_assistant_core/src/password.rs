//! crates/sabi_assistant_core/src/password.rs
//!
//! The minimum-strength policy applied to passwords at registration.
//! Hashing lives in the api service next to its argon2 dependency; the
//! policy itself is pure and configurable.

/// Registration password requirements.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_mixed_case: bool,
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_mixed_case: true,
            require_digit: true,
        }
    }
}

/// The first policy requirement a candidate password fails to meet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordWeakness {
    #[error("password must be at least {0} characters long")]
    TooShort(usize),
    #[error("password must mix upper and lower case letters")]
    NoMixedCase,
    #[error("password must contain at least one digit")]
    NoDigit,
}

impl PasswordPolicy {
    pub fn validate(&self, password: &str) -> Result<(), PasswordWeakness> {
        if password.chars().count() < self.min_length {
            return Err(PasswordWeakness::TooShort(self.min_length));
        }
        if self.require_mixed_case {
            let has_upper = password.chars().any(|c| c.is_uppercase());
            let has_lower = password.chars().any(|c| c.is_lowercase());
            if !has_upper || !has_lower {
                return Err(PasswordWeakness::NoMixedCase);
            }
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordWeakness::NoDigit);
        }
        Ok(())
    }
}
