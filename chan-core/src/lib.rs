//! Core functionality for CHAN Tiendas sign-in
//!
//! This crate holds the login attempt guard and everything it needs:
//! the attempt record and lockout policy types, the repository and verifier
//! traits the guard is written against, and the error taxonomy.
//!
//! Storage backends implement the traits in [`repositories`]; the `chan`
//! crate wires a backend, a verifier and a policy together.
//!
//! See [`LoginGuardService`] for the guard, [`AttemptRecord`] for the stored
//! state and [`LockoutPolicy`] for configuration.
pub mod account;
pub mod attempt;
pub mod clock;
pub mod error;
pub mod id;
pub mod policy;
pub mod repositories;
pub mod services;
pub mod validation;
pub mod verifier;

pub use account::{Account, AccountId, NewAccount, Profile, Role};
pub use attempt::{AttemptRecord, LockoutState, LockoutStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use policy::LockoutPolicy;
pub use repositories::RepositoryProvider;
pub use services::{LoginGuardService, LoginOutcome, RejectReason};
pub use verifier::{CredentialVerifier, Verification};
