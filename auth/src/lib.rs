//! # Pharmacy Authentication & Authorization
//!
//! Staff sign-in, opaque sessions and role-based route access for the
//! pharmacy point-of-sale.
//!
//! ## Features
//!
//! - **Password credentials**: argon2id hashes, generic failure on mismatch
//! - **Opaque sessions**: random bearer tokens, only their digest is stored
//! - **Live roles**: the role is re-read on every request
//! - **Static access table**: [`access::required_access`] classifies routes
//!
//! ## Flow
//!
//! ```text
//! sign_in(email, password) → token
//! request + Bearer token → resolve_session → Principal → service call
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod access;
pub mod config;
pub mod password;
pub mod service;
pub mod token;
pub mod utils;

// Re-export main types for convenience
pub use access::{required_access, Access};
pub use config::AuthConfig;
pub use service::{AuthService, ResolvedSession, SignedIn};
