use {
    crate::{
        address::Address,
        address_lookup_table::error::LookupTableError,
        slot_hashes::{SlotHashes, MAX_ENTRIES},
        Slot,
    },
    serde::{Deserialize, Serialize},
    std::borrow::Cow,
};

/// The maximum number of addresses that a lookup table can hold.
pub const LOOKUP_TABLE_MAX_ADDRESSES: usize = 256;

/// The serialized size of lookup table metadata: a 4-byte state
/// discriminator followed by 52 bytes of (zero-padded) meta fields. The
/// address array starts immediately after.
pub const LOOKUP_TABLE_META_SIZE: usize = 56;

/// Activity status of a lookup table, derived from its metadata and the
/// recent slot-hash window. Never stored.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LookupTableStatus {
    Activated,
    Deactivating { remaining_blocks: usize },
    Deactivated,
}

/// Address lookup table metadata.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct LookupTableMeta {
    /// Lookup tables cannot be closed until the deactivation slot is no
    /// longer "recent" (not accessible in the `SlotHashes` sysvar).
    pub deactivation_slot: Slot,
    /// The slot that the table was last extended. Address tables may only be
    /// used to lookup addresses that were extended before the current bank's
    /// slot.
    pub last_extended_slot: Slot,
    /// The start index where the table was last extended from during the
    /// `last_extended_slot`.
    pub last_extended_slot_start_index: u8,
    /// Authority address which must sign for each modification.
    pub authority: Option<Address>,
    // Raw list of addresses follows this serialized structure in the account
    // data, starting from `LOOKUP_TABLE_META_SIZE`.
    pub _padding: u16,
}

impl Default for LookupTableMeta {
    fn default() -> Self {
        Self {
            deactivation_slot: Slot::MAX,
            last_extended_slot: 0,
            last_extended_slot_start_index: 0,
            authority: None,
            _padding: 0,
        }
    }
}

impl LookupTableMeta {
    pub fn new(authority: Address) -> Self {
        LookupTableMeta {
            authority: Some(authority),
            ..LookupTableMeta::default()
        }
    }

    /// Returns whether the table is considered active for address lookups.
    pub fn is_active(&self, current_slot: Slot, slot_hashes: &SlotHashes) -> bool {
        match self.status(current_slot, slot_hashes) {
            LookupTableStatus::Activated => true,
            LookupTableStatus::Deactivating { .. } => true,
            LookupTableStatus::Deactivated => false,
        }
    }

    /// Return the current status of the lookup table.
    ///
    /// A table stays `Deactivating` while its deactivation slot can still be
    /// found in the recent slot-hash window; once the slot ages out the
    /// table is terminally `Deactivated`. Deactivation in the current slot
    /// leaves the full window plus the in-progress block remaining.
    pub fn status(&self, current_slot: Slot, slot_hashes: &SlotHashes) -> LookupTableStatus {
        if self.deactivation_slot == Slot::MAX {
            LookupTableStatus::Activated
        } else if self.deactivation_slot == current_slot {
            LookupTableStatus::Deactivating {
                remaining_blocks: MAX_ENTRIES.saturating_add(1),
            }
        } else if let Some(slot_hash_position) = slot_hashes.position(&self.deactivation_slot) {
            // Deactivation requires a cool-down period to give in-flight
            // transactions enough time to land and to remove indeterminism
            // caused by transactions loading addresses in the same slot when
            // a table is closed. The cool-down period is equivalent to the
            // amount of time it takes for a slot to be removed from the slot
            // hash list.
            LookupTableStatus::Deactivating {
                remaining_blocks: MAX_ENTRIES.saturating_sub(slot_hash_position),
            }
        } else {
            LookupTableStatus::Deactivated
        }
    }
}

/// Program account states.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum ProgramState {
    /// Account is not initialized.
    Uninitialized,
    /// Initialized `LookupTable` account.
    LookupTable(LookupTableMeta),
}

/// A read-only view of an initialized lookup table account: metadata plus
/// the flat address array, borrowed from the account buffer.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AddressLookupTable<'a> {
    pub meta: LookupTableMeta,
    pub addresses: Cow<'a, [Address]>,
}

impl<'a> AddressLookupTable<'a> {
    /// Serialize a new lookup table metadata into `data`, zero-filling the
    /// unused remainder of the metadata region.
    pub fn overwrite_meta_data(
        data: &mut [u8],
        lookup_table_meta: LookupTableMeta,
    ) -> Result<(), LookupTableError> {
        let meta_data = data
            .get_mut(0..LOOKUP_TABLE_META_SIZE)
            .ok_or(LookupTableError::InvalidAccountData)?;
        meta_data.fill(0);
        bincode::serialize_into(meta_data, &ProgramState::LookupTable(lookup_table_meta))
            .map_err(|_| LookupTableError::InvalidAccountData)?;
        Ok(())
    }

    /// How many of the table's addresses a transaction in `current_slot` may
    /// reference.
    ///
    /// Addresses appended in the current slot are not yet usable: until the
    /// slot advances past `last_extended_slot`, only the prefix that existed
    /// before the last extension is active. A table never extended (or last
    /// extended in an earlier slot) exposes every address.
    pub fn get_active_addresses_len(&self, current_slot: Slot) -> usize {
        if current_slot > self.meta.last_extended_slot {
            self.addresses.len()
        } else {
            usize::from(self.meta.last_extended_slot_start_index)
        }
    }

    /// Lookup addresses for the provided table indexes.
    ///
    /// Fails if the table is no longer active, or if any index is outside
    /// the active address range for `current_slot`.
    pub fn lookup(
        &self,
        current_slot: Slot,
        indexes: &[u8],
        slot_hashes: &SlotHashes,
    ) -> Result<Vec<Address>, LookupTableError> {
        if !self.meta.is_active(current_slot, slot_hashes) {
            return Err(LookupTableError::LookupTableNotActive);
        }

        let active_addresses_len = self.get_active_addresses_len(current_slot);
        let active_addresses = &self.addresses[0..active_addresses_len];
        indexes
            .iter()
            .map(|idx| {
                active_addresses
                    .get(usize::from(*idx))
                    .copied()
                    .ok_or(LookupTableError::InvalidLookupIndex)
            })
            .collect()
    }

    /// Serialize a lookup table into account-data bytes.
    pub fn serialize_for_tests(self) -> Result<Vec<u8>, LookupTableError> {
        let mut data = vec![0; LOOKUP_TABLE_META_SIZE];
        Self::overwrite_meta_data(&mut data, self.meta)?;
        self.addresses.iter().for_each(|address| {
            data.extend_from_slice(address.as_ref());
        });
        Ok(data)
    }

    /// Efficiently deserialize an address table without allocating for the
    /// address array, which stays borrowed from `data`.
    pub fn deserialize(data: &'a [u8]) -> Result<AddressLookupTable<'a>, LookupTableError> {
        let program_state: ProgramState =
            bincode::deserialize(data).map_err(|_| LookupTableError::InvalidAccountData)?;

        let meta = match program_state {
            ProgramState::LookupTable(meta) => Ok(meta),
            ProgramState::Uninitialized => Err(LookupTableError::UninitializedAccount),
        }?;

        let raw_addresses_data = data
            .get(LOOKUP_TABLE_META_SIZE..)
            .ok_or(LookupTableError::InvalidAccountData)?;
        let addresses: &[Address] = bytemuck::try_cast_slice(raw_addresses_data)
            .map_err(|_| LookupTableError::InvalidAccountData)?;

        if addresses.len() > LOOKUP_TABLE_MAX_ADDRESSES {
            return Err(LookupTableError::InvalidAccountData);
        }
        // Equality is valid: it means every address was added in the most
        // recent extension.
        if usize::from(meta.last_extended_slot_start_index) > addresses.len() {
            return Err(LookupTableError::InvalidAccountData);
        }

        Ok(Self {
            meta,
            addresses: Cow::Borrowed(addresses),
        })
    }
}
