//! cf_trust — Casefile Trust server-side key trust and reconciliation
//!
//! Two halves:
//! - `resolver`  — the one point-in-time query this subsystem makes
//!   against the surrounding schema: which public keys are valid for a
//!   user at a given instant (time-windowed, multi-device trust set).
//! - `reconcile` — the workflow that compares the client's local signing
//!   key against that trust set and repairs drift: no-op, upload, or
//!   regenerate-and-upload. Runs as background maintenance, so it
//!   converts every failure into a structured result instead of
//!   propagating it.
//!
//! Throttling lives in `clock::ValidationTracker`, an explicitly
//! constructed process-scoped object (no ambient global); the due
//! interval is two hours.

pub mod clock;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod resolver;

pub use clock::{ValidationTracker, REVALIDATION_INTERVAL};
pub use error::TrustError;
pub use models::{
    KeyAction, KeySyncResult, KeyValidationResult, SessionContext, TrustedKeyRow, WorkflowResult,
};
pub use reconcile::{KeyReconciler, TrustDirectory};
pub use resolver::{active_user_public_keys, ActiveKeyQuery};
