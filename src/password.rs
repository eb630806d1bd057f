//! Password strength validation and hashing for staff sign-in.

use std::fmt::Display;

use crate::Error;

/// A password that has been checked against the strength estimator.
///
/// Holding this type is proof that the password cleared the minimum score, so
/// [PasswordHash::new] cannot be called with a guessable password by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Validate a raw password string.
    ///
    /// # Errors
    /// Returns [Error::TooWeak] if the password scores below 3 out of 4 on
    /// the zxcvbn strength estimator.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let entropy = zxcvbn::zxcvbn(raw_password, &[]);

        if entropy.score() < zxcvbn::Score::Three {
            let feedback = entropy
                .feedback()
                .and_then(|feedback| feedback.warning())
                .map(|warning| warning.to_string())
                .unwrap_or_else(|| "try a longer password with more variety".to_owned());

            return Err(Error::TooWeak(feedback));
        }

        Ok(Self(raw_password.to_owned()))
    }

    /// Skip validation. Only for tests and trusted callers.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

/// A bcrypt hash of a staff member's password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The default bcrypt cost.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash a validated password.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if the underlying library fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash string read from the database.
    pub fn new_unchecked(hash: String) -> Self {
        Self(hash)
    }

    /// Check a raw password attempt against this hash.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if the stored hash cannot be parsed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        bcrypt::verify(raw_password, &self.0)
            .map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod password_tests {
    use crate::Error;

    use super::{PasswordHash, ValidatedPassword};

    // Use the minimum cost in tests to keep them fast.
    const TEST_COST: u32 = 4;

    #[test]
    fn weak_password_is_rejected() {
        let result = ValidatedPassword::new("password");

        assert!(matches!(result, Err(Error::TooWeak(_))));
    }

    #[test]
    fn strong_password_is_accepted() {
        let result = ValidatedPassword::new("crocodile-stapler-41-umbrella");

        assert!(result.is_ok());
    }

    #[test]
    fn hash_verifies_the_original_password() {
        let hash =
            PasswordHash::new(ValidatedPassword::new_unchecked("hunter2"), TEST_COST).unwrap();

        assert_eq!(hash.verify("hunter2"), Ok(true));
        assert_eq!(hash.verify("hunter3"), Ok(false));
    }
}
