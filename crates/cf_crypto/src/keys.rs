//! Key-material loading
//!
//! All recipient/decryption keys arrive as PEM: SPKI ("PUBLIC KEY") for
//! public halves, PKCS#8 ("PRIVATE KEY") for private halves.
//!
//! Configuration stores may hold the PEM once-base64-wrapped so it fits a
//! single-line value. Wrapped material is detected by the fixed prefix
//! `LS0tLS` (base64 of "-----") and unwrapped transparently.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::CryptoError;

/// base64("-----"), the start of any PEM armour line.
const B64_PEM_PREFIX: &str = "LS0tLS";

/// Return usable PEM, unwrapping one layer of base64 if present.
pub fn normalize_pem(material: &str) -> Result<String, CryptoError> {
    let trimmed = material.trim();
    if !trimmed.starts_with(B64_PEM_PREFIX) {
        return Ok(trimmed.to_string());
    }
    let decoded = B64.decode(trimmed)?;
    String::from_utf8(decoded)
        .map_err(|_| CryptoError::InvalidKey("base64-wrapped PEM is not UTF-8".into()))
}

pub fn rsa_public_from_pem(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| CryptoError::InvalidKey(format!("RSA public key: {e}")))
}

pub fn rsa_private_from_pem(pem: &str) -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .map_err(|e| CryptoError::InvalidKey(format!("RSA private key: {e}")))
}

pub fn ec_public_from_pem(pem: &str) -> Result<p521::PublicKey, CryptoError> {
    p521::PublicKey::from_public_key_pem(pem)
        .map_err(|e| CryptoError::InvalidKey(format!("P-521 public key: {e}")))
}

pub fn ec_private_from_pem(pem: &str) -> Result<p521::SecretKey, CryptoError> {
    p521::SecretKey::from_pkcs8_pem(pem)
        .map_err(|e| CryptoError::InvalidKey(format!("P-521 private key: {e}")))
}
