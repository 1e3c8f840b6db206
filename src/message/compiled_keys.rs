use {
    crate::{address::Address, instruction::Instruction, message::MessageHeader},
    std::collections::BTreeMap,
    thiserror::Error,
};

#[derive(PartialEq, Debug, Error, Eq, Clone)]
pub enum CompileError {
    #[error("account index overflowed during compilation")]
    AccountIndexOverflow,
    #[error("encountered unknown account key `{0}` during instruction compilation")]
    UnknownInstructionKey(Address),
}

/// A helper struct to collect account keys referenced by a set of
/// instructions, with the permissions required of each key.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledKeys {
    payer: Option<Address>,
    key_meta_map: BTreeMap<Address, CompiledKeyMeta>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct CompiledKeyMeta {
    is_signer: bool,
    is_writable: bool,
    is_invoked: bool,
}

impl CompiledKeys {
    /// Compile the account keys and metadata of a list of instructions,
    /// merging permissions wherever a key is referenced more than once.
    pub(crate) fn compile(instructions: &[Instruction], payer: Option<Address>) -> Self {
        let mut key_meta_map = BTreeMap::<Address, CompiledKeyMeta>::new();
        for ix in instructions {
            let meta = key_meta_map.entry(ix.program_id).or_default();
            meta.is_invoked = true;
            for account_meta in &ix.accounts {
                let meta = key_meta_map.entry(account_meta.address).or_default();
                meta.is_signer |= account_meta.is_signer;
                meta.is_writable |= account_meta.is_writable;
            }
        }
        if let Some(payer) = &payer {
            let meta = key_meta_map.entry(*payer).or_default();
            meta.is_signer = true;
            meta.is_writable = true;
        }
        Self {
            payer,
            key_meta_map,
        }
    }

    /// Order the collected keys into the canonical message layout (payer
    /// first, then the remaining writable signers, readonly signers,
    /// writable non-signers and readonly non-signers) and derive the
    /// matching header counts.
    pub(crate) fn try_into_message_components(
        self,
    ) -> Result<(MessageHeader, Vec<Address>), CompileError> {
        let try_into_u8 = |num: usize| -> Result<u8, CompileError> {
            u8::try_from(num).map_err(|_| CompileError::AccountIndexOverflow)
        };

        let Self {
            payer,
            mut key_meta_map,
        } = self;

        if let Some(payer) = &payer {
            key_meta_map.remove_entry(payer);
        }

        let writable_signer_keys: Vec<Address> = payer
            .into_iter()
            .chain(
                key_meta_map
                    .iter()
                    .filter_map(|(key, meta)| (meta.is_signer && meta.is_writable).then_some(*key)),
            )
            .collect();
        let readonly_signer_keys: Vec<Address> = key_meta_map
            .iter()
            .filter_map(|(key, meta)| (meta.is_signer && !meta.is_writable).then_some(*key))
            .collect();
        let writable_non_signer_keys: Vec<Address> = key_meta_map
            .iter()
            .filter_map(|(key, meta)| (!meta.is_signer && meta.is_writable).then_some(*key))
            .collect();
        let readonly_non_signer_keys: Vec<Address> = key_meta_map
            .iter()
            .filter_map(|(key, meta)| (!meta.is_signer && !meta.is_writable).then_some(*key))
            .collect();

        let signers_len = writable_signer_keys
            .len()
            .saturating_add(readonly_signer_keys.len());

        let header = MessageHeader {
            num_required_signatures: try_into_u8(signers_len)?,
            num_readonly_signed_accounts: try_into_u8(readonly_signer_keys.len())?,
            num_readonly_unsigned_accounts: try_into_u8(readonly_non_signer_keys.len())?,
        };

        let static_account_keys = [
            writable_signer_keys,
            readonly_signer_keys,
            writable_non_signer_keys,
            readonly_non_signer_keys,
        ]
        .concat();

        Ok((header, static_account_keys))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::instruction::AccountMeta};

    #[test]
    fn test_compile_with_dups() {
        let program_id0 = Address::new_unique();
        let program_id1 = Address::new_unique();
        let id0 = Address::new_unique();
        let keys = CompiledKeys::compile(
            &[
                Instruction::new_with_bincode(
                    program_id0,
                    &0,
                    vec![AccountMeta::new_readonly(id0, false)],
                ),
                Instruction::new_with_bincode(program_id0, &0, vec![AccountMeta::new(id0, true)]),
                Instruction::new_with_bincode(
                    program_id1,
                    &0,
                    vec![AccountMeta::new_readonly(id0, false)],
                ),
            ],
            None,
        );

        // Permissions are unioned across references.
        let meta = keys.key_meta_map.get(&id0).unwrap();
        assert!(meta.is_signer);
        assert!(meta.is_writable);
        assert!(!meta.is_invoked);
        assert!(keys.key_meta_map.get(&program_id0).unwrap().is_invoked);
    }

    #[test]
    fn test_payer_is_first_writable_signer() {
        let payer = Address::new_unique();
        let program_id = Address::new_unique();
        let signer = Address::new_unique();

        let keys = CompiledKeys::compile(
            &[Instruction::new_with_bincode(
                program_id,
                &0,
                vec![AccountMeta::new(signer, true)],
            )],
            Some(payer),
        );
        let (header, account_keys) = keys.try_into_message_components().unwrap();

        assert_eq!(account_keys[0], payer);
        assert_eq!(header.num_required_signatures, 2);
        assert_eq!(header.num_readonly_signed_accounts, 0);
        assert_eq!(header.num_readonly_unsigned_accounts, 1);
        assert_eq!(account_keys.len(), 3);
    }

    #[test]
    fn test_ordering_of_groups() {
        let payer = Address::new_unique();
        let program_id = Address::new_unique();
        let ro_signer = Address::new_unique();
        let rw_unsigned = Address::new_unique();
        let ro_unsigned = Address::new_unique();

        let keys = CompiledKeys::compile(
            &[Instruction::new_with_bincode(
                program_id,
                &0,
                vec![
                    AccountMeta::new_readonly(ro_unsigned, false),
                    AccountMeta::new(rw_unsigned, false),
                    AccountMeta::new_readonly(ro_signer, true),
                ],
            )],
            Some(payer),
        );
        let (header, account_keys) = keys.try_into_message_components().unwrap();

        assert_eq!(header.num_required_signatures, 2);
        assert_eq!(header.num_readonly_signed_accounts, 1);
        assert_eq!(header.num_readonly_unsigned_accounts, 2);
        assert_eq!(account_keys[0], payer);
        assert_eq!(account_keys[1], ro_signer);
        assert_eq!(account_keys[2], rw_unsigned);
        // the program id and the readonly unsigned account make up the tail
        assert!(account_keys[3..].contains(&program_id));
        assert!(account_keys[3..].contains(&ro_unsigned));
    }

    #[test]
    fn test_account_index_overflow() {
        let program_id = Address::new_unique();
        let accounts: Vec<_> = (0..=u8::MAX as usize)
            .map(|_| AccountMeta::new(Address::new_unique(), true))
            .collect();
        let keys = CompiledKeys::compile(
            &[Instruction::new_with_bincode(program_id, &0, accounts)],
            None,
        );
        assert_eq!(
            keys.try_into_message_components(),
            Err(CompileError::AccountIndexOverflow)
        );
    }
}
