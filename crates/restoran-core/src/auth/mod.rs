//! Authentication state for the client.
//!
//! This module provides:
//! - `SessionStore`: the current bearer token, shared by every caller and
//!   persisted through a `SessionStorage` backend
//! - `CredentialStore`: optional remembered passwords via the OS keyring
//!
//! Tokens are never inspected or expired locally. A stale token is only
//! noticed when the backend rejects a protected call.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{FileStorage, MemoryStorage, SessionData, SessionError, SessionStorage, SessionStore};
