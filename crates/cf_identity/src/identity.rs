//! Store-backed identity operations
//!
//! Lifecycle: the keypair is absent until first ensured, then persists
//! for the life of the durable store. `ensure_key_pair` is idempotent;
//! `generate_key_pair` force-rotates, discarding the old pair (used by
//! reconciliation when the server trusts no local key).

use tracing::{debug, info, warn};

use crate::error::IdentityError;
use crate::handle::{fingerprint_b64_spki, KeyHandle};
use crate::store::KeyStore;

/// Client-side identity store. Cheap to clone when the backend is.
#[derive(Clone)]
pub struct LocalIdentityStore<S> {
    store: S,
}

impl<S: KeyStore> LocalIdentityStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Idempotent: returns the existing keypair, generating and
    /// persisting one only if none is stored yet.
    pub async fn ensure_key_pair(&self) -> Result<KeyHandle, IdentityError> {
        if let Some(record) = self.store.load().await? {
            return KeyHandle::from_record(&record);
        }
        self.generate_key_pair().await
    }

    /// Force-generates a fresh keypair, overwriting any stored one.
    pub async fn generate_key_pair(&self) -> Result<KeyHandle, IdentityError> {
        let handle = KeyHandle::generate();
        let record = handle.to_record()?;
        self.store.store(&record).await?;
        info!(key = %handle.fingerprint(), "generated signing keypair");
        Ok(handle)
    }

    /// Sign the UTF-8 bytes of `data` with ECDSA/SHA-256, returning the
    /// base64 signature. The one mandatory-success operation: any store
    /// or key failure is an error, since callers depend on this to prove
    /// authorship.
    pub async fn sign(&self, data: &str) -> Result<String, IdentityError> {
        let handle = self.ensure_key_pair().await?;
        Ok(handle.sign(data.as_bytes()))
    }

    /// The stored keypair, if any. `Ok(None)` means definitely absent;
    /// `Err` means the store could not answer.
    pub async fn key_pair(&self) -> Result<Option<KeyHandle>, IdentityError> {
        match self.store.load().await? {
            Some(record) => Ok(Some(KeyHandle::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// Stored public half as base64 SPKI, the exact form the server
    /// stores and compares.
    pub async fn export_public_key_for_server(&self) -> Result<Option<String>, IdentityError> {
        Ok(self.store.load().await?.map(|record| record.public_spki))
    }

    /// Membership check against a server trust set (multi-device: any
    /// match counts). A mismatch is logged with the candidate list.
    pub async fn validate_against_server_keys(
        &self,
        server_keys: &[String],
    ) -> Result<bool, IdentityError> {
        let Some(exported) = self.export_public_key_for_server().await? else {
            debug!("no local signing key to validate");
            return Ok(false);
        };

        let matched = server_keys.iter().any(|key| key == &exported);
        if !matched {
            let candidates: Vec<String> =
                server_keys.iter().map(|k| fingerprint_b64_spki(k)).collect();
            warn!(
                local = %fingerprint_b64_spki(&exported),
                ?candidates,
                "local signing key is not in the server trust set"
            );
        }
        Ok(matched)
    }

    /// True iff a complete keypair (both halves) is stored.
    pub async fn has_valid_keys(&self) -> Result<bool, IdentityError> {
        Ok(self.store.load().await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKeyStore;
    use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::Signature;

    fn identity() -> LocalIdentityStore<MemoryKeyStore> {
        LocalIdentityStore::new(MemoryKeyStore::new())
    }

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let identity = identity();
        assert!(!identity.has_valid_keys().await.unwrap());

        let first = identity.ensure_key_pair().await.expect("first ensure");
        let second = identity.ensure_key_pair().await.expect("second ensure");
        assert_eq!(
            first.export_public_spki().unwrap(),
            second.export_public_spki().unwrap()
        );
        assert!(identity.has_valid_keys().await.unwrap());
    }

    #[tokio::test]
    async fn generate_rotates_the_key() {
        let identity = identity();
        let old = identity.ensure_key_pair().await.expect("ensure");
        let new = identity.generate_key_pair().await.expect("rotate");
        assert_ne!(
            old.export_public_spki().unwrap(),
            new.export_public_spki().unwrap()
        );

        let exported = identity
            .export_public_key_for_server()
            .await
            .expect("export")
            .expect("present");
        assert_eq!(exported, new.export_public_spki().unwrap());
    }

    #[tokio::test]
    async fn sign_creates_key_on_demand_and_verifies() {
        let identity = identity();
        let sig_b64 = identity.sign("case-7 attachment digest").await.expect("sign");

        let handle = identity.key_pair().await.unwrap().expect("key exists now");
        let sig_bytes = B64.decode(sig_b64).expect("b64");
        let signature = Signature::from_slice(&sig_bytes).expect("sig");
        assert!(handle
            .verifying_key()
            .verify(b"case-7 attachment digest", &signature)
            .is_ok());
    }

    #[tokio::test]
    async fn validate_checks_membership() {
        let identity = identity();

        // No local key yet: definitely-absent, not an error.
        assert!(!identity
            .validate_against_server_keys(&["anything".into()])
            .await
            .unwrap());

        let exported = {
            identity.ensure_key_pair().await.expect("ensure");
            identity
                .export_public_key_for_server()
                .await
                .unwrap()
                .unwrap()
        };

        let trusted = vec!["other-device-key".to_string(), exported.clone()];
        assert!(identity
            .validate_against_server_keys(&trusted)
            .await
            .unwrap());
        assert!(!identity
            .validate_against_server_keys(&["other-device-key".into()])
            .await
            .unwrap());
    }
}
