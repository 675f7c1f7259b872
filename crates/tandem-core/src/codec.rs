//! Record codec
//!
//! The only place accounts are turned into bytes and back. The cache stores
//! whatever this module produces and never looks inside.

use crate::error::{Error, Result};
use tandem_types::Account;

/// Serialize a valid account to its JSON wire form
pub fn encode(account: &Account) -> Result<Vec<u8>> {
    account.validate()?;
    serde_json::to_vec(account).map_err(|e| Error::EncodeError(e.to_string()))
}

/// Parse cached bytes back into an account.
///
/// Bytes that parse but describe an invalid account are rejected as well, so a
/// caller can treat any `Err` as "nothing usable was cached".
pub fn decode(bytes: &[u8]) -> Result<Account> {
    let account: Account =
        serde_json::from_slice(bytes).map_err(|e| Error::DecodeError(e.to_string()))?;
    account
        .validate()
        .map_err(|e| Error::DecodeError(e.to_string()))?;
    Ok(account)
}
