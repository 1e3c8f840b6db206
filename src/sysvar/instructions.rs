//! The serialized instructions of the currently-executing transaction.
//!
//! The runtime serializes every instruction of a transaction into one
//! account before execution begins, allowing programs to introspect their
//! siblings. Instruction introspection is required for interoperating with
//! signature verification precompiles, among other things.
//!
//! The buffer is anchored at its *end*, since the body length varies:
//!
//! ```text
//! [record 0][record 1] .. [record N-1]   concatenated instruction records
//! [offset 0][offset 1] .. [offset N-1]   u16 offset of each record's start
//! [N: u16][current index: u16]        fixed 4-byte trailer
//! ```
//!
//! Each record holds a `u16` account count; per account a 32-byte key, a
//! signer-flag byte and a writable-flag byte; the 32-byte program address; a
//! `u16` data length; and the data bytes. Readers start at the trailer,
//! index backward into the offset table, then follow the offset forward into
//! the body. One record is parsed per lookup, and everything but the
//! account-meta list is returned as a borrowed view into the buffer.

use crate::{
    address::Address,
    instruction::Instruction,
    sanitize::SanitizeError,
    serialize_utils::{
        append_slice, append_u16, append_u8, read_address, read_slice, read_u16, read_u8,
    },
};

/// Borrowed version of [`crate::instruction::AccountMeta`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BorrowedAccountMeta<'a> {
    pub address: &'a Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Borrowed version of [`Instruction`]: a read-only view into a serialized
/// instructions buffer (or, via [`From`], into an owned instruction).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BorrowedInstruction<'a> {
    pub program_id: &'a Address,
    pub accounts: Vec<BorrowedAccountMeta<'a>>,
    pub data: &'a [u8],
}

impl<'a> From<&'a Instruction> for BorrowedInstruction<'a> {
    fn from(instruction: &'a Instruction) -> Self {
        Self {
            program_id: &instruction.program_id,
            accounts: instruction
                .accounts
                .iter()
                .map(|meta| BorrowedAccountMeta {
                    address: &meta.address,
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
                .collect(),
            data: &instruction.data,
        }
    }
}

/// Serialize instruction records, the offset table, and the instruction
/// count. The current-index slot is *not* included; see
/// [`construct_instructions_data`].
fn serialize_instructions(instructions: &[BorrowedInstruction]) -> Vec<u8> {
    // 64 bytes is a reasonable guess, calculating exactly is slower in
    // benchmarks
    let mut data = Vec::with_capacity(instructions.len().saturating_mul(32 * 2));
    let mut offsets = Vec::with_capacity(instructions.len());

    for instruction in instructions {
        offsets.push(data.len() as u16);

        append_u16(&mut data, instruction.accounts.len() as u16);
        for account_meta in &instruction.accounts {
            append_slice(&mut data, account_meta.address.as_ref());
            append_u8(&mut data, account_meta.is_signer as u8);
            append_u8(&mut data, account_meta.is_writable as u8);
        }

        append_slice(&mut data, instruction.program_id.as_ref());
        append_u16(&mut data, instruction.data.len() as u16);
        append_slice(&mut data, instruction.data);
    }

    for offset in offsets {
        append_u16(&mut data, offset);
    }
    append_u16(&mut data, instructions.len() as u16);

    data
}

/// Construct the account data for an instructions sysvar account.
///
/// This function is used by the runtime; programs only ever read the
/// result. The trailing current-instruction-index slot starts at zero and is
/// rewritten with [`store_current_index`] before each instruction executes.
pub fn construct_instructions_data(instructions: &[BorrowedInstruction]) -> Vec<u8> {
    let mut data = serialize_instructions(instructions);
    // add room for current instruction index.
    data.resize(data.len() + 2, 0);

    data
}

/// Store the current instruction's index in the instructions sysvar data.
///
/// # Panics
///
/// Panics if `data` is shorter than the 2-byte index slot.
pub fn store_current_index(data: &mut [u8], instruction_index: u16) {
    let last_index = data.len() - 2;
    data[last_index..last_index + 2].copy_from_slice(&instruction_index.to_le_bytes());
}

/// Load the index of the currently-executing instruction from the trailer.
///
/// `data` is the instructions sysvar account data.
pub fn load_current_index(data: &[u8]) -> Result<u16, SanitizeError> {
    let mut current = data
        .len()
        .checked_sub(2)
        .ok_or(SanitizeError::InvalidValue)?;
    read_u16(&mut current, data)
}

fn load_num_instructions(data: &[u8]) -> Result<usize, SanitizeError> {
    let mut current = data
        .len()
        .checked_sub(4)
        .ok_or(SanitizeError::InvalidValue)?;
    Ok(usize::from(read_u16(&mut current, data)?))
}

/// Load the instruction at `index` from the instructions sysvar data.
///
/// Fails with [`SanitizeError::IndexOutOfBounds`] if `index` is not smaller
/// than the serialized instruction count, and with
/// [`SanitizeError::InvalidValue`] if the buffer is too short to be
/// well-formed.
pub fn load_instruction_at(
    index: usize,
    data: &[u8],
) -> Result<BorrowedInstruction<'_>, SanitizeError> {
    let num_instructions = load_num_instructions(data)?;
    if index >= num_instructions {
        return Err(SanitizeError::IndexOutOfBounds);
    }

    // walk back over the trailer and the offset table, then forward to this
    // instruction's entry
    let offset_table_start = data
        .len()
        .checked_sub(4)
        .and_then(|trailer| trailer.checked_sub(num_instructions.saturating_mul(2)))
        .ok_or(SanitizeError::InvalidValue)?;
    let mut current = offset_table_start.saturating_add(index.saturating_mul(2));
    let start = read_u16(&mut current, data)?;

    current = usize::from(start);
    let num_accounts = read_u16(&mut current, data)?;
    let mut accounts = Vec::with_capacity(usize::from(num_accounts));
    for _ in 0..num_accounts {
        let address = read_address(&mut current, data)?;
        let is_signer = read_u8(&mut current, data)? != 0;
        let is_writable = read_u8(&mut current, data)? != 0;
        accounts.push(BorrowedAccountMeta {
            address,
            is_signer,
            is_writable,
        });
    }
    let program_id = read_address(&mut current, data)?;
    let data_len = read_u16(&mut current, data)?;
    let data = read_slice(&mut current, data, usize::from(data_len))?;

    Ok(BorrowedInstruction {
        program_id,
        accounts,
        data,
    })
}

/// Load the instruction at the given offset relative to the
/// currently-executing one: `-1` is the previous instruction, `0` the
/// current, `1` the next.
pub fn get_instruction_relative(
    index_relative_to_current: i64,
    data: &[u8],
) -> Result<BorrowedInstruction<'_>, SanitizeError> {
    let current_index = i64::from(load_current_index(data)?);
    let index = current_index.saturating_add(index_relative_to_current);
    if index < 0 {
        return Err(SanitizeError::IndexOutOfBounds);
    }
    load_instruction_at(index as usize, data)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{address::Address, instruction::AccountMeta},
    };

    fn example_instructions() -> Vec<Instruction> {
        let program_id0 = Address::new_unique();
        let program_id1 = Address::new_unique();
        let id0 = Address::new_unique();
        let id1 = Address::new_unique();
        let id2 = Address::new_unique();
        let id3 = Address::new_unique();
        vec![
            Instruction::new_with_bincode(program_id0, &0, vec![AccountMeta::new(id0, false)]),
            Instruction::new_with_bincode(program_id0, &1, vec![AccountMeta::new(id1, true)]),
            Instruction::new_with_bincode(
                program_id1,
                &2,
                vec![AccountMeta::new_readonly(id2, false)],
            ),
            Instruction::new_with_bincode(
                program_id1,
                &3,
                vec![AccountMeta::new_readonly(id3, true)],
            ),
        ]
    }

    fn borrow_instructions(instructions: &[Instruction]) -> Vec<BorrowedInstruction<'_>> {
        instructions.iter().map(BorrowedInstruction::from).collect()
    }

    #[test]
    fn test_load_store_instruction() {
        let mut data = [4u8; 10];
        store_current_index(&mut data, 3);
        assert_eq!(load_current_index(&data), Ok(3));
        assert_eq!([4u8; 8], data[0..8]);
    }

    #[test]
    fn test_round_trip() {
        let instructions = example_instructions();
        let mut data = construct_instructions_data(&borrow_instructions(&instructions));
        store_current_index(&mut data, 1);

        for (index, instruction) in instructions.iter().enumerate() {
            let loaded = load_instruction_at(index, &data).unwrap();
            assert_eq!(loaded, BorrowedInstruction::from(instruction));
            assert_eq!(loaded.program_id, &instruction.program_id);
            assert_eq!(loaded.data, &instruction.data[..]);
            for (loaded_meta, meta) in loaded.accounts.iter().zip(instruction.accounts.iter()) {
                assert_eq!(loaded_meta.address, &meta.address);
                assert_eq!(loaded_meta.is_signer, meta.is_signer);
                assert_eq!(loaded_meta.is_writable, meta.is_writable);
            }
        }

        assert_eq!(
            load_instruction_at(instructions.len(), &data).unwrap_err(),
            SanitizeError::IndexOutOfBounds,
        );
    }

    #[test]
    fn test_trailer_layout() {
        let instructions = example_instructions();
        let mut data = construct_instructions_data(&borrow_instructions(&instructions));
        store_current_index(&mut data, 2);

        let len = data.len();
        assert_eq!(
            u16::from_le_bytes([data[len - 4], data[len - 3]]),
            instructions.len() as u16,
        );
        assert_eq!(u16::from_le_bytes([data[len - 2], data[len - 1]]), 2);
    }

    #[test]
    fn test_get_instruction_relative() {
        let instructions = example_instructions();
        let mut data = construct_instructions_data(&borrow_instructions(&instructions));
        store_current_index(&mut data, 1);

        assert_eq!(
            get_instruction_relative(-2, &data).unwrap_err(),
            SanitizeError::IndexOutOfBounds
        );
        assert_eq!(
            get_instruction_relative(-1, &data).unwrap(),
            BorrowedInstruction::from(&instructions[0])
        );
        assert_eq!(
            get_instruction_relative(0, &data).unwrap(),
            BorrowedInstruction::from(&instructions[1])
        );
        assert_eq!(
            get_instruction_relative(1, &data).unwrap(),
            BorrowedInstruction::from(&instructions[2])
        );
        assert_eq!(
            get_instruction_relative(3, &data).unwrap_err(),
            SanitizeError::IndexOutOfBounds
        );

        store_current_index(&mut data, 0);
        assert_eq!(
            get_instruction_relative(-1, &data).unwrap_err(),
            SanitizeError::IndexOutOfBounds
        );
        assert_eq!(
            get_instruction_relative(0, &data).unwrap(),
            BorrowedInstruction::from(&instructions[0])
        );
        assert_eq!(
            get_instruction_relative(3, &data).unwrap(),
            BorrowedInstruction::from(&instructions[3])
        );
        assert_eq!(
            get_instruction_relative(4, &data).unwrap_err(),
            SanitizeError::IndexOutOfBounds
        );
    }

    #[test]
    fn test_malformed_buffers() {
        assert_eq!(
            load_current_index(&[]).unwrap_err(),
            SanitizeError::InvalidValue
        );
        assert_eq!(
            load_instruction_at(0, &[0u8; 3]).unwrap_err(),
            SanitizeError::InvalidValue
        );
        // trailer claims one instruction but there is no offset table
        let data = [1u8, 0, 0, 0];
        assert_eq!(
            load_instruction_at(0, &data).unwrap_err(),
            SanitizeError::InvalidValue
        );
    }

    #[test]
    fn test_serialize_empty_instruction_list() {
        let data = construct_instructions_data(&[]);
        assert_eq!(data.len(), 4);
        assert_eq!(load_current_index(&data), Ok(0));
        assert_eq!(
            load_instruction_at(0, &data).unwrap_err(),
            SanitizeError::IndexOutOfBounds
        );
    }
}
