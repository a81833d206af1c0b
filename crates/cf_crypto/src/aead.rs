//! Authenticated Encryption with Associated Data
//!
//! AES-256-GCM throughout.
//! Key size: 32 bytes.  IV: 12 bytes (random).  Tag: 16 bytes.
//!
//! Two forms:
//! - detached: (ciphertext, tag) kept as separate envelope fields
//! - sealed:   [ iv (12 bytes) | ciphertext + tag ] in one buffer, used
//!   for at-rest column sealing in `cf_identity`

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CryptoError;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Fresh random 32-byte content-encryption key.
pub fn random_key() -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    rand::rngs::OsRng.fill_bytes(key.as_mut());
    key
}

/// Fresh random 96-bit IV. Never reused; every encryption draws its own.
pub fn random_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypt `plaintext`, returning the ciphertext and the detached 16-byte tag.
pub fn encrypt_detached(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN]), CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AeadEncrypt)?;
    let nonce = Nonce::from_slice(iv);

    let mut ct = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::AeadEncrypt)?;

    // aes-gcm appends the tag; split it off into its own field.
    let split = ct.len() - TAG_LEN;
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&ct[split..]);
    ct.truncate(split);
    Ok((ct, tag))
}

/// Decrypt a detached (ciphertext, tag) pair.
pub fn decrypt_detached(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AeadDecrypt)?;
    let nonce = Nonce::from_slice(iv);

    let mut joined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    joined.extend_from_slice(ciphertext);
    joined.extend_from_slice(tag);

    let plaintext = cipher
        .decrypt(nonce, joined.as_slice())
        .map_err(|_| CryptoError::AeadDecrypt)?;

    Ok(Zeroizing::new(plaintext))
}

/// Seal `plaintext` into one buffer, prepending a random IV.
/// `aad` — additional associated data (authenticated but not encrypted).
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AeadEncrypt)?;
    let iv = random_iv();
    let nonce = Nonce::from_slice(&iv);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::AeadEncrypt)?;

    let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open sealed bytes (iv || ciphertext+tag).
pub fn open(key: &[u8; KEY_LEN], data: &[u8], aad: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if data.len() < IV_LEN + TAG_LEN {
        return Err(CryptoError::AeadDecrypt);
    }
    let (iv, ct) = data.split_at(IV_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AeadDecrypt)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), Payload { msg: ct, aad })
        .map_err(|_| CryptoError::AeadDecrypt)?;

    Ok(Zeroizing::new(plaintext))
}
