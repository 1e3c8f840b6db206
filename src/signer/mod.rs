//! Abstractions and implementations for transaction signers.

use {
    crate::{address::Address, sanitize::SanitizeError, signature::Signature},
    thiserror::Error,
};

pub mod keypair;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SignerError {
    #[error("not enough signers")]
    NotEnoughSigners,
    #[error("signing key does not match any required signer of the message")]
    KeypairAddressMismatch,
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}

/// The `Signer` trait declares operations that all digital signature
/// providers must support. It is the interface by which a `Transaction`
/// collects the signatures it needs, whether the key material lives in
/// memory, in a wallet, or behind a remote service.
pub trait Signer {
    /// The address of the account backed by this signer's key.
    fn address(&self) -> Address {
        self.try_address().unwrap_or_default()
    }

    /// Fallibly gets the implementor's address.
    fn try_address(&self) -> Result<Address, SignerError>;

    /// Sign `message` with this signer's key.
    fn sign_message(&self, message: &[u8]) -> Signature {
        self.try_sign_message(message).unwrap_or_default()
    }

    /// Fallibly produce an Ed25519 signature over `message`.
    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SignerError>;

    /// Whether the implementation requires user interaction to sign.
    fn is_interactive(&self) -> bool;
}

impl<T> From<T> for Box<dyn Signer>
where
    T: Signer + 'static,
{
    fn from(signer: T) -> Self {
        Box::new(signer)
    }
}
