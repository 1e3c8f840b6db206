//! A trait for validating values and members of over-the-wire messages.

use thiserror::Error;

#[derive(PartialEq, Debug, Error, Eq, Clone)]
pub enum SanitizeError {
    #[error("required signatures exceed the number of account keys")]
    TooManyRequiredSignatures,
    #[error("readonly signed accounts exceed required signatures")]
    TooManyReadonlySignedAccounts,
    #[error("readonly unsigned accounts exceed non-signing account keys")]
    TooManyReadonlyUnsignedAccounts,
    #[error("index out of bounds")]
    IndexOutOfBounds,
    #[error("account keys contain a duplicate entry")]
    DuplicateAccountKey,
    #[error("value out of bounds")]
    ValueOutOfBounds,
    #[error("invalid value")]
    InvalidValue,
}

/// A trait for sanitizing values and members of over-the-wire messages.
///
/// Implementations should recursively descend through the data structure and
/// sanitize all struct members and enum clauses. Sanitize excludes
/// signature-verification checks, those are handled by another pass. Sanitize
/// checks should include but are not limited to:
///
/// - All index values are in range.
/// - All values are within their static max/min bounds.
///
/// Sanitization stops at the first violated invariant; callers get exactly
/// one error kind per failure, never an aggregate.
pub trait Sanitize {
    fn sanitize(&self) -> Result<(), SanitizeError> {
        Ok(())
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&self) -> Result<(), SanitizeError> {
        for x in self.iter() {
            x.sanitize()?;
        }
        Ok(())
    }
}
