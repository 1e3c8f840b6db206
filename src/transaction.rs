//! An atomically-committed sequence of instructions, bundled with the
//! signatures that authorize it.
//!
//! A [`Transaction`] is a [`Message`] plus one 64-byte Ed25519 signature per
//! required signer, index-aligned with the first
//! `num_required_signatures` account keys of the message. It is created
//! unsigned and mutated only by filling signature slots; the message itself
//! is never reordered after construction.

use {
    crate::{
        hash::Hash,
        message::Message,
        sanitize::{Sanitize, SanitizeError},
        short_vec,
        signature::Signature,
        signer::{Signer, SignerError},
    },
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TransactionError {
    /// The transaction carries fewer signatures than the message requires.
    #[error("transaction has not been fully signed")]
    NotEnoughSigners,
    /// A required signature did not verify against its account key and the
    /// message bytes.
    #[error("transaction signature verification failure")]
    SignatureFailure,
    /// The embedded message violates a structural invariant.
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}

/// An atomic transaction: signatures first, message second, exactly as it
/// travels over the wire.
#[derive(Debug, PartialEq, Default, Eq, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// A set of signatures of a serialized [`Message`], signed by the first
    /// `num_required_signatures` of the message's account keys.
    #[serde(with = "short_vec")]
    pub signatures: Vec<Signature>,

    /// The message to sign.
    pub message: Message,
}

impl Sanitize for Transaction {
    fn sanitize(&self) -> Result<(), SanitizeError> {
        if usize::from(self.message.header.num_required_signatures) > self.signatures.len() {
            return Err(SanitizeError::IndexOutOfBounds);
        }
        if self.signatures.len() > self.message.account_keys.len() {
            return Err(SanitizeError::IndexOutOfBounds);
        }
        self.message.sanitize()
    }
}

impl Transaction {
    /// Wrap a message in an unsigned transaction, with every required
    /// signature slot holding the all-zero placeholder.
    pub fn new_unsigned(message: Message) -> Self {
        Self {
            signatures: vec![
                Signature::default();
                usize::from(message.header.num_required_signatures)
            ],
            message,
        }
    }

    /// Create a fully-signed transaction from a message.
    ///
    /// # Panics
    ///
    /// Panics when signing fails; see [`Transaction::try_sign`] for the
    /// fallible variant.
    pub fn new<T: Signer>(
        from_keypairs: &[&T],
        message: Message,
        recent_blockhash: Hash,
    ) -> Transaction {
        let mut tx = Self::new_unsigned(message);
        tx.sign(from_keypairs, recent_blockhash);
        tx
    }

    fn key_index(&self, instruction_index: usize, accounts_index: usize) -> Option<usize> {
        self.message
            .instructions
            .get(instruction_index)
            .and_then(|instruction| instruction.accounts.get(accounts_index))
            .map(|&account_keys_index| usize::from(account_keys_index))
    }

    /// The account key referenced by the given instruction and account
    /// position.
    pub fn key(
        &self,
        instruction_index: usize,
        accounts_index: usize,
    ) -> Option<&crate::address::Address> {
        self.key_index(instruction_index, accounts_index)
            .and_then(|account_keys_index| self.message.account_keys.get(account_keys_index))
    }

    /// Like [`Transaction::key`], but `None` unless the referenced account
    /// is a required signer.
    pub fn signer_key(
        &self,
        instruction_index: usize,
        accounts_index: usize,
    ) -> Option<&crate::address::Address> {
        match self.key_index(instruction_index, accounts_index) {
            None => None,
            Some(signature_index) => {
                if signature_index >= usize::from(self.message.header.num_required_signatures) {
                    return None;
                }
                self.message.account_keys.get(signature_index)
            }
        }
    }

    /// Position of `address` within the signing prefix of the account keys.
    fn signer_position(&self, address: &crate::address::Address) -> Option<usize> {
        let required = usize::from(self.message.header.num_required_signatures);
        let signed_keys = self
            .message
            .account_keys
            .get(..required.min(self.message.account_keys.len()))?;
        signed_keys.iter().position(|key| key == address)
    }

    /// The serialized message bytes that signers sign.
    ///
    /// Sanitization runs first, so an invalid message never produces bytes
    /// to sign.
    pub fn message_data(&self) -> Result<Vec<u8>, SanitizeError> {
        self.message.serialize()
    }

    /// Sign the transaction with all the message's required signers.
    ///
    /// # Panics
    ///
    /// Panics if any keypair is not a required signer of the message, or if
    /// the message is invalid.
    pub fn sign<T: Signer>(&mut self, keypairs: &[&T], recent_blockhash: Hash) {
        if let Err(e) = self.try_sign(keypairs, recent_blockhash) {
            panic!("Transaction::sign failed with error {e:?}");
        }
    }

    /// Sign the transaction with a subset of the required signers.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Transaction::sign`].
    pub fn partial_sign<T: Signer>(&mut self, keypairs: &[&T], recent_blockhash: Hash) {
        if let Err(e) = self.try_partial_sign(keypairs, recent_blockhash) {
            panic!("Transaction::partial_sign failed with error {e:?}");
        }
    }

    /// Sign the transaction, failing if all required signatures are not
    /// provided by `keypairs`.
    pub fn try_sign<T: Signer>(
        &mut self,
        keypairs: &[&T],
        recent_blockhash: Hash,
    ) -> Result<(), SignerError> {
        self.try_partial_sign(keypairs, recent_blockhash)?;

        if !self.is_signed() {
            Err(SignerError::NotEnoughSigners)
        } else {
            Ok(())
        }
    }

    /// Sign the transaction with the provided subset of required signers.
    ///
    /// The serialized message is computed once; each keypair's signature is
    /// written into the slot matching the keypair's position among the
    /// signing account keys. Missing slots are allocated and
    /// default-initialized first.
    pub fn try_partial_sign<T: Signer>(
        &mut self,
        keypairs: &[&T],
        recent_blockhash: Hash,
    ) -> Result<(), SignerError> {
        if recent_blockhash != self.message.recent_blockhash {
            self.message.recent_blockhash = recent_blockhash;
            // reset signatures if blockhash has changed
            self.signatures
                .iter_mut()
                .for_each(|signature| *signature = Signature::default());
        }

        let required = usize::from(self.message.header.num_required_signatures);
        if self.signatures.len() < required {
            self.signatures.resize(required, Signature::default());
        }

        let positions = keypairs
            .iter()
            .map(|keypair| {
                self.signer_position(&keypair.try_address()?)
                    .ok_or(SignerError::KeypairAddressMismatch)
            })
            .collect::<Result<Vec<usize>, SignerError>>()?;

        let message_data = self.message_data()?;
        for (position, keypair) in positions.iter().zip(keypairs.iter()) {
            self.signatures[*position] = keypair.try_sign_message(&message_data)?;
        }

        Ok(())
    }

    /// Verify every required signature against the corresponding account key
    /// and the serialized message bytes.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let required = usize::from(self.message.header.num_required_signatures);
        if self.signatures.len() < required {
            return Err(TransactionError::NotEnoughSigners);
        }
        let message_bytes = self.message_data()?;
        for (signature, address) in self.signatures[..required]
            .iter()
            .zip(self.message.account_keys.iter())
        {
            if !signature.verify(address.as_ref(), &message_bytes) {
                return Err(TransactionError::SignatureFailure);
            }
        }
        Ok(())
    }

    /// True only if every required signature slot is filled with something
    /// other than the all-zero placeholder.
    pub fn is_signed(&self) -> bool {
        let required = usize::from(self.message.header.num_required_signatures);
        self.signatures.len() >= required
            && self.signatures[..required]
                .iter()
                .all(|signature| *signature != Signature::default())
    }

    /// The canonical wire encoding: compact-length prefixed signature array
    /// followed by the serialized message.
    ///
    /// Sanitization runs first and its error is surfaced unchanged.
    pub fn serialize(&self) -> Result<Vec<u8>, SanitizeError> {
        self.sanitize()?;
        Ok(bincode::serialize(self).unwrap())
    }
}
