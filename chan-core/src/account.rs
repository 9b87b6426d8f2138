//! Accounts, roles and the profile handed back on sign-in.
//!
//! | Field        | Type             | Description                                |
//! | ------------ | ---------------- | ------------------------------------------ |
//! | `account_id` | `AccountId`      | Stable opaque identifier.                  |
//! | `email`      | `String`         | Sign-in identifier.                        |
//! | `first_name` | `Option<String>` | Given name.                                |
//! | `last_name`  | `Option<String>` | Family name.                               |
//! | `phone`      | `Option<String>` | Contact phone number.                      |
//! | `role`       | `Option<Role>`   | Administrator, collaborator or custom role. |
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{generate_prefixed_id, validate_prefixed_id};

/// A unique, stable identifier for an account.
/// Treat the value as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        AccountId(id.to_string())
    }

    pub fn new_random() -> Self {
        AccountId(generate_prefixed_id("acct"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "acct")
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role attached to an account.
///
/// Roles live in their own table and are matched by name. The two built-in
/// names are recognized in English and Spanish; anything else is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Collaborator,
    Other(String),
}

impl Role {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "admin" | "administrator" | "administrador" => Role::Administrator,
            "collaborator" | "colaborador" => Role::Collaborator,
            _ => Role::Other(name.trim().to_string()),
        }
    }

    /// Canonical name stored in the roles table.
    pub fn name(&self) -> &str {
        match self {
            Role::Administrator => "admin",
            Role::Collaborator => "collaborator",
            Role::Other(name) => name,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Administrator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Account attributes returned by a successful verification. The guard passes
/// it through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub account_id: AccountId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

impl Profile {
    pub fn new(account_id: AccountId, email: impl Into<String>) -> Self {
        Self {
            account_id,
            email: email.into(),
            first_name: None,
            last_name: None,
            phone: None,
            role: None,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: Option<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = last_name;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// First and last name joined, falling back to the email.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_ref().is_some_and(Role::is_admin)
    }
}

/// A stored account: profile plus password hash.
#[derive(Debug, Clone)]
pub struct Account {
    pub profile: Profile,
    pub password_hash: String,
}

/// Input for registering an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

impl NewAccount {
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            first_name: None,
            last_name: None,
            phone: None,
            role,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: Option<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = last_name;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}
