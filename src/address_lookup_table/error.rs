use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LookupTableError {
    /// The account data does not hold a well-formed lookup table.
    #[error("lookup table account data is malformed")]
    InvalidAccountData,
    /// The account exists but has not been initialized as a lookup table.
    #[error("lookup table account is uninitialized")]
    UninitializedAccount,
    /// The table has fully deactivated and may no longer serve lookups.
    #[error("lookup table is no longer active")]
    LookupTableNotActive,
    /// A requested index falls outside the table's active addresses.
    #[error("lookup index is outside the table's active range")]
    InvalidLookupIndex,
}
