//! Opaque signing-key handle
//!
//! A [`KeyHandle`] wraps the P-256 signing key and exposes capability
//! methods only: sign bytes, export the public half. There is no secret
//! accessor on the public API; persistence goes through `store::KeyRecord`,
//! which stays crate-private on the secret side.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use chrono::{DateTime, Utc};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::EncodePublicKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::IdentityError;
use crate::store::KeyRecord;

/// Non-exportable client signing keypair (ECDSA P-256, SHA-256).
pub struct KeyHandle {
    signing: SigningKey,
    created: DateTime<Utc>,
}

impl KeyHandle {
    pub(crate) fn generate() -> Self {
        Self {
            signing: SigningKey::random(&mut OsRng),
            created: Utc::now(),
        }
    }

    pub(crate) fn from_record(record: &KeyRecord) -> Result<Self, IdentityError> {
        let signing = SigningKey::from_slice(record.secret())
            .map_err(|e| IdentityError::InvalidKey(format!("stored scalar: {e}")))?;
        Ok(Self {
            signing,
            created: record.created,
        })
    }

    pub(crate) fn to_record(&self) -> Result<KeyRecord, IdentityError> {
        Ok(KeyRecord::new(
            self.export_public_spki()?,
            Zeroizing::new(self.signing.to_bytes().to_vec()),
            self.created,
        ))
    }

    /// ECDSA/SHA-256 signature over `data`, base64 of the fixed 64-byte
    /// r||s form.
    pub fn sign(&self, data: &[u8]) -> String {
        let signature: Signature = self.signing.sign(data);
        B64.encode(signature.to_bytes())
    }

    /// Public half as base64 SPKI, the form servers store and compare.
    pub fn export_public_spki(&self) -> Result<String, IdentityError> {
        export_spki_b64(self.signing.verifying_key())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        *self.signing.verifying_key()
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Short hex fingerprint of the public half, for log lines. Never
    /// log full key material.
    pub fn fingerprint(&self) -> String {
        match self.export_public_spki() {
            Ok(spki) => fingerprint_b64_spki(&spki),
            Err(_) => "<unencodable>".into(),
        }
    }
}

/// Export any P-256 verifying key as base64 SPKI.
pub fn export_spki_b64(key: &VerifyingKey) -> Result<String, IdentityError> {
    let public: p256::PublicKey = (*key).into();
    let der = public
        .to_public_key_der()
        .map_err(|e| IdentityError::InvalidKey(format!("SPKI encode: {e}")))?;
    Ok(B64.encode(der.as_bytes()))
}

/// SHA-256 of the base64 SPKI, truncated to 8 bytes of hex.
pub fn fingerprint_b64_spki(spki: &str) -> String {
    let digest = Sha256::digest(spki.as_bytes());
    hex::encode(&digest[..8])
}
