//! 64-byte Ed25519 signatures over serialized message bytes.

use {
    serde::{Deserialize, Serialize},
    serde_big_array::BigArray,
    std::{fmt, str::FromStr},
    thiserror::Error,
};

/// Number of bytes in a signature.
pub const SIGNATURE_BYTES: usize = 64;
/// Maximum string length of a base58 encoded signature.
const MAX_BASE58_SIGNATURE_LEN: usize = 88;

#[repr(transparent)]
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Signature(#[serde(with = "BigArray")] [u8; SIGNATURE_BYTES]);

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl crate::sanitize::Sanitize for Signature {}

impl Signature {
    /// Unique signature for tests and benchmarks.
    pub fn new_unique() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static I: AtomicU64 = AtomicU64::new(1);

        let mut b = [0u8; SIGNATURE_BYTES];
        let i = I.fetch_add(1, Ordering::Relaxed);
        b[0..8].copy_from_slice(&i.to_le_bytes());
        Self(b)
    }

    #[cfg(not(target_os = "solana"))]
    fn verify_verbose(
        &self,
        address_bytes: &[u8],
        message_bytes: &[u8],
    ) -> Result<(), ed25519_dalek::SignatureError> {
        let verifying_key = ed25519_dalek::VerifyingKey::try_from(address_bytes)?;
        let signature = ed25519_dalek::Signature::from_bytes(&self.0);
        verifying_key.verify_strict(message_bytes, &signature)
    }

    /// Verify the signature over `message_bytes` against the Ed25519 public
    /// key behind `address_bytes`.
    #[cfg(not(target_os = "solana"))]
    pub fn verify(&self, address_bytes: &[u8], message_bytes: &[u8]) -> bool {
        self.verify_verbose(address_bytes, message_bytes).is_ok()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl From<Signature> for [u8; SIGNATURE_BYTES] {
    fn from(signature: Signature) -> Self {
        signature.0
    }
}

impl From<[u8; SIGNATURE_BYTES]> for Signature {
    fn from(signature: [u8; SIGNATURE_BYTES]) -> Self {
        Self(signature)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = std::array::TryFromSliceError;

    fn try_from(signature: &[u8]) -> Result<Self, Self::Error> {
        <[u8; SIGNATURE_BYTES]>::try_from(signature).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSignatureError {
    #[error("string decoded to wrong size for signature")]
    WrongSize,
    #[error("failed to decode string to signature")]
    Invalid,
}

impl FromStr for Signature {
    type Err = ParseSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_SIGNATURE_LEN {
            return Err(ParseSignatureError::WrongSize);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseSignatureError::Invalid)?;
        Signature::try_from(bytes.as_slice()).map_err(|_| ParseSignatureError::WrongSize)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::signer::{keypair::Keypair, Signer}};

    #[test]
    fn test_off_curve_address_cannot_verify() {
        let keypair = Keypair::new();
        let message = b"hello";
        let signature = keypair.sign_message(message);

        // A program-derived address is not a valid public key, so nothing
        // verifies against it.
        let (pda, _bump) = crate::address::Address::find_program_address(
            &[b"seed"],
            &crate::address::Address::new_unique(),
        );
        assert!(!signature.verify(pda.as_ref(), message));
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let keypair = Keypair::new();
        let message = b"attack at dawn";
        let signature = keypair.sign_message(message);
        assert!(signature.verify(keypair.address().as_ref(), message));
        assert!(!signature.verify(keypair.address().as_ref(), b"attack at dusk"));
        assert!(!Signature::default().verify(keypair.address().as_ref(), message));
    }

    #[test]
    fn test_signature_fromstr() {
        let signature = Signature::new_unique();
        let signature_base58_str = bs58::encode(signature.as_ref()).into_string();
        assert_eq!(signature_base58_str.parse::<Signature>(), Ok(signature));

        let mut too_long = bs58::encode(&[255u8; SIGNATURE_BYTES]).into_string();
        too_long.push('1');
        assert_eq!(
            too_long.parse::<Signature>(),
            Err(ParseSignatureError::WrongSize)
        );

        assert_eq!(
            "IIIIII".parse::<Signature>(),
            Err(ParseSignatureError::Invalid)
        );
    }

    #[test]
    fn test_serde_fixed_width() {
        let signature = Signature::new_unique();
        let bytes = bincode::serialize(&signature).unwrap();
        assert_eq!(bytes.len(), SIGNATURE_BYTES);
        let restored: Signature = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, signature);
    }
}
