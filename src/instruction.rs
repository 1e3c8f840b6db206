//! A single invocation of an on-chain program, and the accounts it touches.
//!
//! Clients describe an invocation with [`Instruction`]: the program to run,
//! the accounts it may read or write, and an opaque data payload. When a
//! [`Message`] is built, instructions are converted to
//! [`CompiledInstruction`]s, which reference their program and accounts by
//! index into the message's shared account-key array.
//!
//! [`Message`]: crate::message::Message

use {
    crate::{address::Address, short_vec},
    serde::{Deserialize, Serialize},
};

/// Describes a single account an instruction touches, and the permissions
/// the instruction needs on it.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct AccountMeta {
    /// The address of the account.
    pub address: Address,
    /// True if the account must sign the transaction.
    pub is_signer: bool,
    /// True if the instruction may mutate the account.
    pub is_writable: bool,
}

impl AccountMeta {
    /// Construct metadata for a writable account.
    pub fn new(address: Address, is_signer: bool) -> Self {
        Self {
            address,
            is_signer,
            is_writable: true,
        }
    }

    /// Construct metadata for a read-only account.
    pub fn new_readonly(address: Address, is_signer: bool) -> Self {
        Self {
            address,
            is_signer,
            is_writable: false,
        }
    }
}

/// A directive for a single invocation of an on-chain program.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Instruction {
    /// Address of the program that executes this instruction.
    pub program_id: Address,
    /// Metadata describing the accounts that should be passed to the program.
    pub accounts: Vec<AccountMeta>,
    /// Opaque data passed to the program for its own interpretation.
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new_with_bytes(program_id: Address, data: &[u8], accounts: Vec<AccountMeta>) -> Self {
        Self {
            program_id,
            accounts,
            data: data.to_vec(),
        }
    }

    /// Create a new instruction, bincode-encoding `data` as the payload.
    pub fn new_with_bincode<T: Serialize>(
        program_id: Address,
        data: &T,
        accounts: Vec<AccountMeta>,
    ) -> Self {
        let data = bincode::serialize(data).unwrap();
        Self {
            program_id,
            accounts,
            data,
        }
    }
}

/// A compact encoding of an instruction.
///
/// All account and program references are single-byte indexes into the
/// containing message's account-key array, so every index must be smaller
/// than the key count; `Message::sanitize` enforces this.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledInstruction {
    /// Index into the message's account keys, of the program executing this
    /// instruction.
    pub program_id_index: u8,
    /// Ordered indices into the message's account keys, of the accounts to
    /// pass to the program.
    #[serde(with = "short_vec")]
    pub accounts: Vec<u8>,
    /// The program input data.
    #[serde(with = "short_vec")]
    pub data: Vec<u8>,
}

impl CompiledInstruction {
    pub fn new_from_raw_parts(program_id_index: u8, accounts: Vec<u8>, data: Vec<u8>) -> Self {
        Self {
            program_id_index,
            accounts,
            data,
        }
    }

    pub fn program_id<'a>(&self, program_ids: &'a [Address]) -> &'a Address {
        &program_ids[self.program_id_index as usize]
    }
}
