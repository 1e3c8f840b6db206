//! A vanilla Ed25519 key pair.

use {
    crate::{
        address::Address,
        signature::Signature,
        signer::{Signer, SignerError},
    },
    ed25519_dalek::Signer as DalekSigner,
    rand::{rngs::OsRng, CryptoRng, RngCore},
};

/// A vanilla Ed25519 key pair.
#[derive(Debug)]
pub struct Keypair(ed25519_dalek::SigningKey);

impl Keypair {
    /// Constructs a new, random `Keypair` using a caller-provided RNG.
    pub fn generate<R>(csprng: &mut R) -> Self
    where
        R: CryptoRng + RngCore,
    {
        Self(ed25519_dalek::SigningKey::generate(csprng))
    }

    /// Constructs a new, random `Keypair` using `OsRng`.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let mut rng = OsRng;
        Self::generate(&mut rng)
    }

    /// Recovers a `Keypair` from a byte array.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ed25519_dalek::SignatureError> {
        let bytes: &[u8; ed25519_dalek::KEYPAIR_LENGTH] = bytes.try_into().map_err(|_| {
            ed25519_dalek::SignatureError::from_source("candidate keypair byte array is the wrong size")
        })?;
        ed25519_dalek::SigningKey::from_keypair_bytes(bytes).map(Self)
    }

    /// Constructs a `Keypair` from caller-provided secret key bytes.
    pub fn new_from_array(secret_key: [u8; ed25519_dalek::SECRET_KEY_LENGTH]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&secret_key))
    }

    /// Returns this `Keypair` as a byte array: secret key first, public key
    /// second.
    pub fn to_bytes(&self) -> [u8; ed25519_dalek::KEYPAIR_LENGTH] {
        self.0.to_keypair_bytes()
    }

    /// Recovers a `Keypair` from a base58-encoded string.
    pub fn from_base58_string(s: &str) -> Self {
        Self::from_bytes(&bs58::decode(s).into_vec().unwrap()).unwrap()
    }

    /// Returns this `Keypair` as a base58-encoded string.
    pub fn to_base58_string(&self) -> String {
        bs58::encode(&self.to_bytes()).into_string()
    }

    /// Gets this `Keypair`'s secret key bytes.
    pub fn secret_bytes(&self) -> [u8; ed25519_dalek::SECRET_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Allows Keypair cloning.
    ///
    /// Note that the `Clone` trait is intentionally unimplemented because
    /// making a second copy of sensitive secret keys in memory is usually a
    /// bad idea.
    ///
    /// Only use this in tests or when strictly required. Consider using
    /// `Arc<Keypair>` instead.
    pub fn insecure_clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl Signer for Keypair {
    fn try_address(&self) -> Result<Address, SignerError> {
        Ok(Address::from(self.0.verifying_key().to_bytes()))
    }

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        Ok(Signature::from(self.0.sign(message).to_bytes()))
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

impl<T> PartialEq<T> for Keypair
where
    T: Signer,
{
    fn eq(&self, other: &T) -> bool {
        self.address() == other.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_bytes_round_trip() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes();
        let restored = Keypair::from_bytes(&bytes).unwrap();
        assert_eq!(restored.address(), keypair.address());

        assert!(Keypair::from_bytes(&bytes[..63]).is_err());
    }

    #[test]
    fn test_keypair_from_bytes_rejects_mismatched_public_key() {
        let keypair = Keypair::new();
        let other = Keypair::new();
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&keypair.secret_bytes());
        bytes[32..].copy_from_slice(other.address().as_ref());
        assert!(Keypair::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_keypair_base58_round_trip() {
        let keypair = Keypair::new();
        let restored = Keypair::from_base58_string(&keypair.to_base58_string());
        assert_eq!(restored.address(), keypair.address());
    }

    #[test]
    fn test_new_from_array_is_deterministic() {
        let seed = [42u8; 32];
        assert_eq!(
            Keypair::new_from_array(seed).address(),
            Keypair::new_from_array(seed).address()
        );
    }

    #[test]
    fn test_insecure_clone_signs_identically() {
        let keypair = Keypair::new();
        let clone = keypair.insecure_clone();
        assert_eq!(
            keypair.sign_message(b"payload"),
            clone.sign_message(b"payload")
        );
    }
}
