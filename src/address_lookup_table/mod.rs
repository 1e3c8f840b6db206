//! The on-chain address lookup table account format.
//!
//! Lookup tables let transactions reference accounts by a one-byte index
//! into a table stored on chain, rather than carrying full 32-byte
//! addresses. Tables are created, extended, frozen and closed by an external
//! program; this module only defines the binary account layout and the
//! time-windowed deactivation state machine, which every client and the
//! runtime must agree on byte-for-byte.

pub mod error;
pub mod state;

pub use {
    error::LookupTableError,
    state::{
        AddressLookupTable, LookupTableMeta, LookupTableStatus, ProgramState,
        LOOKUP_TABLE_MAX_ADDRESSES, LOOKUP_TABLE_META_SIZE,
    },
};
