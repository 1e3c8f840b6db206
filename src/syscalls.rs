//! Declarations of the host-runtime traps available to on-chain programs.
//!
//! Off the SVM target, none of these exist; the in-process equivalents live
//! next to their call sites behind `cfg` selection.

/// Return value of a syscall that completed without error.
pub const SUCCESS: u64 = 0;

#[cfg(target_os = "solana")]
extern "C" {
    pub fn sol_sha256(vals: *const u8, val_len: u64, hash_result: *mut u8) -> u64;
    pub fn sol_create_program_address(
        seeds_addr: *const u8,
        seeds_len: u64,
        program_id_addr: *const u8,
        address_bytes_addr: *mut u8,
    ) -> u64;
    pub fn sol_try_find_program_address(
        seeds_addr: *const u8,
        seeds_len: u64,
        program_id_addr: *const u8,
        address_bytes_addr: *mut u8,
        bump_seed_addr: *mut u8,
    ) -> u64;
    pub fn sol_log_(message: *const u8, len: u64);
    pub fn sol_log_pubkey(pubkey_addr: *const u8);
}
