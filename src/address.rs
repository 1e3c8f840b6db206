//! Meridian account addresses, and the derivation of program-owned ones.
//!
//! An [`Address`] is 32 opaque bytes naming an account or program. Most
//! addresses are Ed25519 public keys; *program-derived addresses* (PDAs) are
//! deliberately constructed to lie off the Ed25519 curve so that no private
//! key can ever sign for them, leaving the deriving program as their only
//! authority.

use {
    crate::hash::hashv,
    bytemuck::{Pod, Zeroable},
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
    thiserror::Error,
};

/// Number of bytes in an address.
pub const ADDRESS_BYTES: usize = 32;
/// Maximum length of a derivation seed.
pub const MAX_SEED_LEN: usize = 32;
/// Maximum number of seeds.
pub const MAX_SEEDS: usize = 16;
/// Maximum string length of a base58 encoded address.
const MAX_BASE58_LEN: usize = 44;

/// The domain-separation tag appended when deriving program addresses.
const PDA_MARKER: &[u8; 21] = b"ProgramDerivedAddress";

#[derive(Error, Debug, Serialize, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Length of the seed is too long for address generation.
    #[error("length of the seed is too long for address generation")]
    MaxSeedLengthExceeded,
    #[error("provided seeds do not result in a valid address")]
    InvalidSeeds,
    #[error("provided owner is not allowed")]
    IllegalOwner,
    #[error("unable to find a viable program address bump seed")]
    NoViableBumpSeed,
}

impl From<u64> for AddressError {
    fn from(error: u64) -> Self {
        match error {
            0 => AddressError::MaxSeedLengthExceeded,
            1 => AddressError::InvalidSeeds,
            2 => AddressError::IllegalOwner,
            _ => panic!("Unsupported AddressError"),
        }
    }
}

#[repr(transparent)]
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Pod,
    Zeroable,
)]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshSerialize, borsh::BorshDeserialize)
)]
pub struct Address([u8; ADDRESS_BYTES]);

impl crate::sanitize::Sanitize for Address {}

#[derive(Error, Debug, Serialize, Clone, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("string is the wrong size")]
    WrongSize,
    #[error("invalid base58 string")]
    Invalid,
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(ParseAddressError::WrongSize);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseAddressError::Invalid)?;
        Address::try_from(bytes.as_slice()).map_err(|_| ParseAddressError::WrongSize)
    }
}

impl TryFrom<&str> for Address {
    type Error = ParseAddressError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Address::from_str(s)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = std::array::TryFromSliceError;

    fn try_from(address: &[u8]) -> Result<Self, Self::Error> {
        <[u8; ADDRESS_BYTES]>::try_from(address).map(Self)
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(from: [u8; ADDRESS_BYTES]) -> Self {
        Self(from)
    }
}

/// True if the bytes decompress to a point on the Ed25519 curve.
///
/// A derived address must *fail* this predicate: an off-curve address is
/// guaranteed to have no corresponding private key.
pub fn bytes_are_curve_point<T: AsRef<[u8]>>(_bytes: T) -> bool {
    #[cfg(not(target_os = "solana"))]
    {
        let Ok(compressed_edwards_y) =
            curve25519_dalek::edwards::CompressedEdwardsY::from_slice(_bytes.as_ref())
        else {
            return false;
        };
        compressed_edwards_y.decompress().is_some()
    }
    #[cfg(target_os = "solana")]
    unimplemented!();
}

impl Address {
    pub const fn new_from_array(address_array: [u8; ADDRESS_BYTES]) -> Self {
        Self(address_array)
    }

    pub fn to_bytes(self) -> [u8; ADDRESS_BYTES] {
        self.0
    }

    /// Unique address for tests and benchmarks.
    pub fn new_unique() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static I: AtomicU64 = AtomicU64::new(1);

        let mut b = [0u8; ADDRESS_BYTES];
        let i = I.fetch_add(1, Ordering::Relaxed);
        b[0..8].copy_from_slice(&i.to_le_bytes());
        Self::new_from_array(b)
    }

    /// Derive an address from a base address, a utf-8 seed string, and an
    /// owning program.
    ///
    /// Owners whose trailing bytes spell the program-derivation marker are
    /// rejected, otherwise a crafted seed could collide with a PDA.
    pub fn create_with_seed(
        base: &Address,
        seed: &str,
        owner: &Address,
    ) -> Result<Address, AddressError> {
        if seed.len() > MAX_SEED_LEN {
            return Err(AddressError::MaxSeedLengthExceeded);
        }

        let owner = owner.as_ref();
        if owner.len() >= PDA_MARKER.len() {
            let slice = &owner[owner.len() - PDA_MARKER.len()..];
            if slice == PDA_MARKER {
                return Err(AddressError::IllegalOwner);
            }
        }

        let hash = hashv(&[base.as_ref(), seed.as_ref(), owner]);
        Ok(Address::new_from_array(hash.to_bytes()))
    }

    /// Derive a program address from seeds and a program id.
    ///
    /// Program addresses are account keys that only the deriving program has
    /// the authority to sign for. The address has the same form as any other
    /// address, except it is ensured to not be on the Ed25519 curve and thus
    /// has no associated private key.
    ///
    /// Because a program address cannot lie on the curve, there may be seed
    /// and program id combinations that are invalid. For those, an extra
    /// *bump* seed that pushes the result off the curve can be found with
    /// [`Address::find_program_address`].
    ///
    /// Seeds are hashed sequentially, so seed sets `{"abcdef"}`,
    /// `{"abc", "def"}` and `{"ab", "cd", "ef"}` derive the same address for
    /// the same program id. Programs must choose seed schemes that cannot
    /// collide with themselves.
    pub fn create_program_address(
        seeds: &[&[u8]],
        program_id: &Address,
    ) -> Result<Address, AddressError> {
        if seeds.len() > MAX_SEEDS {
            return Err(AddressError::MaxSeedLengthExceeded);
        }
        for seed in seeds.iter() {
            if seed.len() > MAX_SEED_LEN {
                return Err(AddressError::MaxSeedLengthExceeded);
            }
        }

        // Perform the calculation inline, calling this from within a program
        // is not supported.
        #[cfg(not(target_os = "solana"))]
        {
            let mut hasher = crate::hash::Hasher::default();
            for seed in seeds.iter() {
                hasher.hash(seed);
            }
            hasher.hashv(&[program_id.as_ref(), PDA_MARKER]);
            let hash = hasher.result();

            if bytes_are_curve_point(hash) {
                return Err(AddressError::InvalidSeeds);
            }

            Ok(Address::new_from_array(hash.to_bytes()))
        }
        // Call via a system call to perform the calculation.
        #[cfg(target_os = "solana")]
        {
            let mut bytes = [0; ADDRESS_BYTES];
            let result = unsafe {
                crate::syscalls::sol_create_program_address(
                    seeds as *const _ as *const u8,
                    seeds.len() as u64,
                    program_id as *const _ as *const u8,
                    &mut bytes as *mut _ as *mut u8,
                )
            };
            match result {
                crate::syscalls::SUCCESS => Ok(Address::new_from_array(bytes)),
                _ => Err(result.into()),
            }
        }
    }

    /// Find a valid program address and its corresponding bump seed, which
    /// must be passed as an additional seed when the program later signs.
    ///
    /// Panics in the very unlikely event that no viable bump seed exists;
    /// use [`Address::try_find_program_address`] to handle that case as an
    /// error instead.
    pub fn find_program_address(seeds: &[&[u8]], program_id: &Address) -> (Address, u8) {
        Self::try_find_program_address(seeds, program_id)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Find a valid program address and its corresponding bump seed.
    ///
    /// The search appends a single bump-seed byte to the given seeds,
    /// starting at 255 and decrementing to 0, and returns the first candidate
    /// that lands off the curve. The search is deterministic: the same seeds
    /// and program id always resolve to the same address and bump. It fails
    /// with [`AddressError::NoViableBumpSeed`] only if all 256 candidates are
    /// on-curve, which is not expected to occur in practice.
    pub fn try_find_program_address(
        seeds: &[&[u8]],
        program_id: &Address,
    ) -> Result<(Address, u8), AddressError> {
        // Perform the calculation inline, calling this from within a program
        // is not supported.
        #[cfg(not(target_os = "solana"))]
        {
            let mut bump_seed = [u8::MAX];
            loop {
                {
                    let mut seeds_with_bump = seeds.to_vec();
                    seeds_with_bump.push(&bump_seed);
                    match Self::create_program_address(&seeds_with_bump, program_id) {
                        Ok(address) => return Ok((address, bump_seed[0])),
                        Err(AddressError::InvalidSeeds) => (),
                        Err(err) => return Err(err),
                    }
                }
                if bump_seed[0] == 0 {
                    break;
                }
                bump_seed[0] -= 1;
            }
            Err(AddressError::NoViableBumpSeed)
        }
        // Call via a system call to perform the calculation.
        #[cfg(target_os = "solana")]
        {
            let mut bytes = [0; ADDRESS_BYTES];
            let mut bump_seed = u8::MAX;
            let result = unsafe {
                crate::syscalls::sol_try_find_program_address(
                    seeds as *const _ as *const u8,
                    seeds.len() as u64,
                    program_id as *const _ as *const u8,
                    &mut bytes as *mut _ as *mut u8,
                    &mut bump_seed as *mut _ as *mut u8,
                )
            };
            match result {
                crate::syscalls::SUCCESS => Ok((Address::new_from_array(bytes), bump_seed)),
                _ => Err(AddressError::NoViableBumpSeed),
            }
        }
    }

    pub fn is_on_curve(&self) -> bool {
        bytes_are_curve_point(self)
    }

    /// Log the address from a program.
    pub fn log(&self) {
        #[cfg(target_os = "solana")]
        unsafe {
            crate::syscalls::sol_log_pubkey(self.as_ref() as *const _ as *const u8)
        };

        #[cfg(not(target_os = "solana"))]
        crate::log::sol_log(&self.to_string());
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl AsMut<[u8]> for Address {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0[..]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}
