//! Authentication: credential verification and persisted sign-in state.
//!
//! This module provides:
//! - `password`: Argon2id hashing with a legacy plaintext fallback
//! - `AuthSession`: the durable signed-in-user snapshot
//! - `CredentialStore`: remember-me storage in the OS keychain

pub mod credentials;
pub mod password;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{AuthSession, AuthSnapshot};
