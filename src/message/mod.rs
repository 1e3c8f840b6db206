//! The compact wire encoding of a transaction, as transmitted across the
//! network and operated on by the runtime.
//!
//! A [`Message`] contains a flat array of all accounts accessed by all of
//! its instructions, a [`MessageHeader`] that describes the permission
//! layout of that array, a recent blockhash, and the instructions in
//! compiled form. Clients usually build [`Instruction`]s and let the
//! [`Message`] constructors compile them.
//!
//! To ensure reliable network delivery, serialized messages must fit into
//! the IPv6 MTU size, conservatively assumed to be 1280 bytes
//! ([`crate::PACKET_DATA_SIZE`]). Thus constrained, care must be taken in
//! the amount of data consumed by instructions and the number of accounts
//! they require.
//!
//! [`Instruction`]: crate::instruction::Instruction

mod compiled_keys;

use {
    crate::{
        address::Address,
        hash::Hash,
        instruction::{CompiledInstruction, Instruction},
        sanitize::{Sanitize, SanitizeError},
        short_vec,
    },
    serde::{Deserialize, Serialize},
};

pub use compiled_keys::CompileError;
use compiled_keys::CompiledKeys;

/// The length of a message header in bytes.
pub const MESSAGE_HEADER_LENGTH: usize = 3;

/// Describes the organization of a `Message`'s account keys.
///
/// The shared account list of a message is ordered by the permissions
/// required of the accounts:
///
/// - accounts that are writable and signers
/// - accounts that are read-only and signers
/// - accounts that are writable and not signers
/// - accounts that are read-only and not signers
///
/// Given this ordering, the three counts below fully describe which accounts
/// hold which permissions; no per-account flags are stored or transmitted.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    /// The number of signatures required for this message to be considered
    /// valid. The signers of those signatures must match the first
    /// `num_required_signatures` of [`Message::account_keys`].
    pub num_required_signatures: u8,

    /// The last `num_readonly_signed_accounts` of the signed keys are
    /// read-only accounts.
    pub num_readonly_signed_accounts: u8,

    /// The last `num_readonly_unsigned_accounts` of the unsigned keys are
    /// read-only accounts.
    pub num_readonly_unsigned_accounts: u8,
}

/// A compiled transaction message: header, account keys, recent blockhash,
/// and instructions.
///
/// Built by a client, validated once with [`Message::sanitize`], then left
/// untouched while it is signed and serialized.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// The message header, identifying signed and read-only `account_keys`.
    pub header: MessageHeader,

    /// All the account keys used by this transaction, duplicate-free,
    /// ordered as the header describes.
    #[serde(with = "short_vec")]
    pub account_keys: Vec<Address>,

    /// The id of a recent ledger entry.
    pub recent_blockhash: Hash,

    /// Programs that will be executed in sequence and committed in one
    /// atomic transaction if all succeed.
    #[serde(with = "short_vec")]
    pub instructions: Vec<CompiledInstruction>,
}

impl Sanitize for Message {
    fn sanitize(&self) -> Result<(), SanitizeError> {
        let num_account_keys = self.account_keys.len();

        if usize::from(self.header.num_required_signatures) > num_account_keys {
            return Err(SanitizeError::TooManyRequiredSignatures);
        }

        if self.header.num_readonly_signed_accounts > self.header.num_required_signatures {
            return Err(SanitizeError::TooManyReadonlySignedAccounts);
        }

        if usize::from(self.header.num_readonly_unsigned_accounts)
            > num_account_keys.saturating_sub(usize::from(self.header.num_required_signatures))
        {
            return Err(SanitizeError::TooManyReadonlyUnsignedAccounts);
        }

        for ci in &self.instructions {
            if usize::from(ci.program_id_index) >= num_account_keys {
                return Err(SanitizeError::IndexOutOfBounds);
            }
            for ai in &ci.accounts {
                if usize::from(*ai) >= num_account_keys {
                    return Err(SanitizeError::IndexOutOfBounds);
                }
            }
        }

        for (i, key) in self.account_keys.iter().enumerate() {
            if self.account_keys[..i].contains(key) {
                return Err(SanitizeError::DuplicateAccountKey);
            }
        }

        if num_account_keys > usize::from(u16::MAX)
            || self.instructions.len() > usize::from(u16::MAX)
        {
            return Err(SanitizeError::ValueOutOfBounds);
        }

        Ok(())
    }
}

fn position(keys: &[Address], key: &Address) -> Result<u8, CompileError> {
    keys.iter()
        .position(|k| k == key)
        .map(|k| k as u8)
        .ok_or(CompileError::UnknownInstructionKey(*key))
}

fn try_compile_instruction(
    ix: &Instruction,
    keys: &[Address],
) -> Result<CompiledInstruction, CompileError> {
    let accounts = ix
        .accounts
        .iter()
        .map(|account_meta| position(keys, &account_meta.address))
        .collect::<Result<Vec<_>, CompileError>>()?;

    Ok(CompiledInstruction {
        program_id_index: position(keys, &ix.program_id)?,
        accounts,
        data: ix.data.clone(),
    })
}

fn try_compile_instructions(
    ixs: &[Instruction],
    keys: &[Address],
) -> Result<Vec<CompiledInstruction>, CompileError> {
    ixs.iter()
        .map(|ix| try_compile_instruction(ix, keys))
        .collect()
}

impl Message {
    /// Build a message from instructions, compiling their account metas into
    /// the shared key array.
    ///
    /// The blockhash is left defaulted; transaction signing overwrites it.
    ///
    /// # Panics
    ///
    /// Panics if the instructions reference more than 256 distinct account
    /// keys.
    pub fn new(instructions: &[Instruction], payer: Option<&Address>) -> Self {
        Self::new_with_blockhash(instructions, payer, &Hash::default())
    }

    /// Build a message from instructions with a known recent blockhash.
    ///
    /// # Panics
    ///
    /// Panics if the instructions reference more than 256 distinct account
    /// keys.
    pub fn new_with_blockhash(
        instructions: &[Instruction],
        payer: Option<&Address>,
        blockhash: &Hash,
    ) -> Self {
        let compiled_keys = CompiledKeys::compile(instructions, payer.cloned());
        let (header, account_keys) = compiled_keys
            .try_into_message_components()
            .expect("overflow when compiling message keys");
        let instructions = try_compile_instructions(instructions, &account_keys)
            .expect("message instructions reference a key that was not compiled");
        Self::new_with_compiled_instructions(
            header.num_required_signatures,
            header.num_readonly_signed_accounts,
            header.num_readonly_unsigned_accounts,
            account_keys,
            *blockhash,
            instructions,
        )
    }

    pub fn new_with_compiled_instructions(
        num_required_signatures: u8,
        num_readonly_signed_accounts: u8,
        num_readonly_unsigned_accounts: u8,
        account_keys: Vec<Address>,
        recent_blockhash: Hash,
        instructions: Vec<CompiledInstruction>,
    ) -> Self {
        Self {
            header: MessageHeader {
                num_required_signatures,
                num_readonly_signed_accounts,
                num_readonly_unsigned_accounts,
            },
            account_keys,
            recent_blockhash,
            instructions,
        }
    }

    /// The canonical wire encoding: 3 header bytes, the compact-length
    /// prefixed key array, the blockhash, and the compact-length prefixed
    /// instruction array.
    ///
    /// Sanitization runs first; an invalid message never produces bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, SanitizeError> {
        self.sanitize()?;
        Ok(bincode::serialize(self).unwrap())
    }

    /// Compute the digest that signers of this message actually sign.
    pub fn hash(&self) -> Result<Hash, SanitizeError> {
        Ok(Self::hash_raw_message(&self.serialize()?))
    }

    /// Compute the hash of previously serialized message bytes.
    pub fn hash_raw_message(message_bytes: &[u8]) -> Hash {
        crate::hash::hash(message_bytes)
    }

    pub fn program_ids(&self) -> Vec<&Address> {
        self.instructions
            .iter()
            .map(|ix| &self.account_keys[ix.program_id_index as usize])
            .collect()
    }

    /// True if the account at `i` must sign the transaction.
    pub fn is_signer(&self, i: usize) -> bool {
        i < usize::from(self.header.num_required_signatures)
    }

    /// True if the account at `i` may be written to.
    ///
    /// Derived entirely from the header counts and the key-array position:
    /// writable signers come first, then readonly signers, then writable
    /// non-signers, then readonly non-signers.
    pub fn is_writable(&self, i: usize) -> bool {
        i < usize::from(self.header.num_required_signatures)
            .saturating_sub(usize::from(self.header.num_readonly_signed_accounts))
            || (i >= usize::from(self.header.num_required_signatures)
                && i < self
                    .account_keys
                    .len()
                    .saturating_sub(usize::from(self.header.num_readonly_unsigned_accounts)))
    }

    pub fn signer_keys(&self) -> Vec<&Address> {
        let last_key = self
            .account_keys
            .len()
            .min(usize::from(self.header.num_required_signatures));
        self.account_keys[..last_key].iter().collect()
    }
}
