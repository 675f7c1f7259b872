//! Account types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest name the store column accepts (`varchar(50)`).
pub const MAX_NAME_LEN: usize = 50;

/// An account record, keyed by `name` in both the cache and the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Store-assigned surrogate key. Never used for lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub balance: f64,
}

/// Reasons an account is rejected before it reaches either backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("account name must not be empty")]
    EmptyName,

    #[error("account name is {0} characters, limit is {MAX_NAME_LEN}")]
    NameTooLong(usize),

    #[error("account balance must be a finite number")]
    NonFiniteBalance,
}

impl Account {
    pub fn new(name: impl Into<String>, balance: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            balance,
        }
    }

    /// Attach the surrogate id handed out by the store
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn validate(&self) -> Result<(), AccountError> {
        if self.name.is_empty() {
            return Err(AccountError::EmptyName);
        }
        let len = self.name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(AccountError::NameTooLong(len));
        }
        if !self.balance.is_finite() {
            return Err(AccountError::NonFiniteBalance);
        }
        Ok(())
    }
}

/// Public shape of an account on the HTTP surface.
///
/// The zero value (`""`, `0.0`) is what a read returns when neither backend
/// knows the name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    pub name: String,
    pub balance: f64,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            name: account.name,
            balance: account.balance,
        }
    }
}

impl From<AccountView> for Account {
    fn from(view: AccountView) -> Self {
        Account::new(view.name, view.balance)
    }
}
