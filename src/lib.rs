//! The Meridian SDK: binary wire formats, deterministic account addressing,
//! and reward partitioning for the Meridian network.
//!
//! This crate defines the byte layouts that clients, programs, and the
//! runtime must agree on: the compact-u16 length codec ([`short_vec`]), the
//! transaction [`message`] format and its sanitization invariants, the
//! [`transaction`] envelope, program-derived [`address`] computation, the
//! [`address_lookup_table`] account format, the
//! [`epoch_rewards_hasher`] partition assignment, and the instruction
//! introspection codec in [`sysvar::instructions`].
//!
//! All of it is pure computation over caller-owned buffers. The only
//! environment-sensitive pieces are the hash and curve primitives, which are
//! host-runtime syscalls when compiled for the SVM target and in-process
//! routines everywhere else; the selection happens once, at build time, in
//! [`hash`] and [`address`].

pub mod address;
pub mod address_lookup_table;
pub mod epoch_rewards_hasher;
pub mod hash;
pub mod instruction;
pub mod log;
pub mod message;
pub mod sanitize;
pub mod serialize_utils;
pub mod short_vec;
pub mod signature;
#[cfg(not(target_os = "solana"))]
pub mod signer;
pub mod slot_hashes;
pub mod syscalls;
pub mod sysvar;
#[cfg(not(target_os = "solana"))]
pub mod transaction;

/// A unit of network time: the ordinal of a block-production opportunity.
/// Slots increase monotonically and are never reused.
pub type Slot = u64;

/// Maximum over-the-wire size of a transaction, in bytes.
///
/// 1280 is the IPv6 minimum MTU; 40 bytes is the size of the IPv6 header and
/// 8 bytes is the size of the fragment header.
pub const PACKET_DATA_SIZE: usize = 1280 - 40 - 8;
