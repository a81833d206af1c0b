//! Key reconciliation workflow
//!
//! Compares the client's local signing key against the server trust set
//! and repairs drift. The decision is a pure function of (local key
//! present) x (server-set membership); execution is upload, regenerate,
//! or nothing. This runs as background maintenance: every failure is
//! captured into the result objects, and no call here retries
//! internally. The transport collaborator owns timeouts and retries.
//!
//! Upload success is eventually consistent: the workflow does not
//! re-read the server set afterwards; the next due validation does.
//! Overlapping runs converge on the last successful upload.

use async_trait::async_trait;
use cf_identity::{KeyStore, LocalIdentityStore};
use tracing::{info, warn};

use crate::clock::ValidationTracker;
use crate::error::TrustError;
use crate::models::{KeyAction, KeySyncResult, KeyValidationResult, WorkflowResult};

/// Transport-agnostic server collaborator: list the trusted keys for the
/// authenticated user, register a new one.
#[async_trait]
pub trait TrustDirectory: Send + Sync {
    async fn list_trusted_keys(&self) -> Result<Vec<String>, TrustError>;
    async fn upload_public_key(&self, public_key: &str) -> Result<(), TrustError>;
}

pub struct KeyReconciler<S, D> {
    identity: LocalIdentityStore<S>,
    directory: D,
    tracker: ValidationTracker,
}

impl<S: KeyStore, D: TrustDirectory> KeyReconciler<S, D> {
    pub fn new(identity: LocalIdentityStore<S>, directory: D, tracker: ValidationTracker) -> Self {
        Self {
            identity,
            directory,
            tracker,
        }
    }

    pub fn tracker(&self) -> &ValidationTracker {
        &self.tracker
    }

    pub async fn is_validation_due(&self) -> bool {
        self.tracker.is_due().await
    }

    /// The pure decision: what, if anything, needs to happen. Errors
    /// while fetching or comparing become `KeyAction::Retry` with the
    /// error recorded; nothing is thrown past this point.
    pub async fn validate_user_keys(&self) -> KeyValidationResult {
        match self.classify().await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "key validation could not complete");
                KeyValidationResult::retry(e.to_string())
            }
        }
    }

    async fn classify(&self) -> Result<KeyValidationResult, TrustError> {
        let trusted = self.directory.list_trusted_keys().await?;

        if !self.identity.has_valid_keys().await? {
            return Ok(KeyValidationResult {
                is_valid: false,
                has_local_key: false,
                matches_server_key: false,
                action: KeyAction::GenerateKey,
                error: None,
            });
        }

        let matches = self
            .identity
            .validate_against_server_keys(&trusted)
            .await?;
        Ok(KeyValidationResult {
            is_valid: matches,
            has_local_key: true,
            matches_server_key: matches,
            action: if matches {
                KeyAction::None
            } else {
                KeyAction::UploadKey
            },
            error: None,
        })
    }

    /// Regenerate the keypair (discarding the old one), export, upload.
    /// The validation timestamp advances only after a successful upload.
    pub async fn synchronize_keys(&self) -> KeySyncResult {
        match self.regenerate_and_upload().await {
            Ok(public_key) => KeySyncResult {
                success: true,
                new_public_key: Some(public_key),
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "key synchronisation failed");
                KeySyncResult {
                    success: false,
                    new_public_key: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn regenerate_and_upload(&self) -> Result<String, TrustError> {
        let handle = self.identity.generate_key_pair().await?;
        let exported = handle.export_public_spki().map_err(TrustError::Identity)?;
        self.directory.upload_public_key(&exported).await?;
        self.tracker.mark_validated().await;
        info!("registered regenerated signing key with server");
        Ok(exported)
    }

    /// Full maintenance pass: decide, then execute. Retry decisions are
    /// propagated in the result for the caller to reschedule; there is
    /// no internal retry.
    pub async fn perform_key_validation_workflow(&self) -> WorkflowResult {
        let validation = self.validate_user_keys().await;

        match validation.action {
            KeyAction::None => {
                self.tracker.mark_validated().await;
                WorkflowResult {
                    validated: true,
                    synchronized: false,
                    error: None,
                }
            }
            KeyAction::UploadKey => match self.upload_current_key().await {
                Ok(()) => WorkflowResult {
                    validated: true,
                    synchronized: true,
                    error: None,
                },
                Err(e) => {
                    warn!(error = %e, "upload of existing key failed");
                    WorkflowResult {
                        validated: false,
                        synchronized: false,
                        error: Some(e.to_string()),
                    }
                }
            },
            KeyAction::GenerateKey => {
                let sync = self.synchronize_keys().await;
                WorkflowResult {
                    validated: sync.success,
                    synchronized: sync.success,
                    error: sync.error,
                }
            }
            KeyAction::Retry => WorkflowResult {
                validated: false,
                synchronized: false,
                error: validation.error,
            },
        }
    }

    /// Throttled entry point: runs the workflow only when due.
    pub async fn run_if_due(&self) -> Option<WorkflowResult> {
        if !self.tracker.is_due().await {
            return None;
        }
        Some(self.perform_key_validation_workflow().await)
    }

    async fn upload_current_key(&self) -> Result<(), TrustError> {
        // Fail fast when the export is unavailable; do not touch the server.
        let exported = self
            .identity
            .export_public_key_for_server()
            .await?
            .ok_or_else(|| TrustError::Upload("no exportable local public key".into()))?;
        self.directory.upload_public_key(&exported).await?;
        self.tracker.mark_validated().await;
        Ok(())
    }
}
