//! cf_identity — Casefile Trust client signing identity
//!
//! Each client holds one long-term ECDSA P-256 signing keypair, created
//! lazily on first use and persisted under a single schema-versioned slot
//! in a durable local store. The private half never leaves this crate:
//! callers get an opaque [`KeyHandle`] with capability methods only
//! (sign, export the public half as SPKI).
//!
//! # Module layout
//! - `identity` — the store-backed identity operations (ensure / sign /
//!   export / validate-against-server)
//! - `handle`   — opaque non-exportable keypair handle
//! - `store`    — durable-store interface + memory and sqlite backends
//! - `error`    — unified error type
//!
//! Read paths report failures explicitly (`Result<Option<_>, _>`) so a
//! caller can tell "definitely no key" from "store unavailable". Only
//! `sign` treats a missing key as fatal, because callers depend on it to
//! prove authorship.

pub mod error;
pub mod handle;
pub mod identity;
pub mod store;

pub use error::IdentityError;
pub use handle::KeyHandle;
pub use identity::LocalIdentityStore;
pub use store::{KeyRecord, KeyStore, MemoryKeyStore, SqliteKeyStore, IDENTITY_SLOT};
