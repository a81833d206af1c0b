//! Row and outcome types for trust resolution and reconciliation.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row of the server's trusted-key table. Rows are immutable once
/// written; rotation inserts a new row (optionally closing an old one by
/// setting its expiration).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrustedKeyRow {
    pub user_id: i64,
    /// Base64 SPKI, the exact form clients export.
    pub public_key: String,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: Option<DateTime<Utc>>,
}

impl TrustedKeyRow {
    /// Active at `instant` iff effective_date <= instant and the row is
    /// unexpired (no expiration, or expiration strictly after).
    pub fn is_active_at(&self, instant: DateTime<Utc>) -> bool {
        self.effective_date <= instant
            && self.expiration_date.map_or(true, |exp| exp > instant)
    }
}

/// What reconciliation decided to do about the local key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    None,
    UploadKey,
    GenerateKey,
    Retry,
}

/// Outcome of the pure validation decision.
#[derive(Debug, Clone, Serialize)]
pub struct KeyValidationResult {
    pub is_valid: bool,
    pub has_local_key: bool,
    pub matches_server_key: bool,
    pub action: KeyAction,
    pub error: Option<String>,
}

impl KeyValidationResult {
    pub fn retry(error: String) -> Self {
        Self {
            is_valid: false,
            has_local_key: false,
            matches_server_key: false,
            action: KeyAction::Retry,
            error: Some(error),
        }
    }
}

/// Outcome of regenerate-and-upload.
#[derive(Debug, Clone, Serialize)]
pub struct KeySyncResult {
    pub success: bool,
    pub new_public_key: Option<String>,
    pub error: Option<String>,
}

/// Outcome of the full workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub validated: bool,
    pub synchronized: bool,
    pub error: Option<String>,
}

/// The caller's authenticated session, as far as this crate needs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionContext {
    pub user_id: Option<i64>,
}

impl SessionContext {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }
}
