//! Service layer for business logic
//!
//! Concrete services encapsulating sign-in throttling and account management.

pub mod account;
pub mod login_guard;
pub mod password;

pub use account::AccountService;
pub use login_guard::{LoginGuardService, LoginOutcome, RejectReason};
pub use password::PasswordVerifier;
