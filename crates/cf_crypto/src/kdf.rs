//! Content-key derivation for the ECIES path
//!
//! HKDF-SHA256 over the raw ECDH shared secret, with a fresh 16-byte salt
//! per envelope and the fixed context label "ECIES-P521".

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::aead::KEY_LEN;
use crate::error::CryptoError;

pub const SALT_LEN: usize = 16;

/// Context label bound into every EC-path key derivation.
pub const ECIES_INFO: &[u8] = b"ECIES-P521";

/// Fresh random 128-bit salt (one per envelope; stored in the envelope).
pub fn generate_salt() -> [u8; SALT_LEN] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the 32-byte AES content key from an ECDH shared secret.
pub fn derive_content_key(
    shared_secret: &[u8],
    salt: &[u8],
) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), shared_secret);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    hk.expand(ECIES_INFO, key.as_mut())
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_key() {
        let a = derive_content_key(b"shared", &[7u8; SALT_LEN]).expect("derive");
        let b = derive_content_key(b"shared", &[7u8; SALT_LEN]).expect("derive");
        assert_eq!(a.as_ref(), b.as_ref());
    }

    #[test]
    fn salt_changes_key() {
        let a = derive_content_key(b"shared", &[7u8; SALT_LEN]).expect("derive");
        let b = derive_content_key(b"shared", &[8u8; SALT_LEN]).expect("derive");
        assert_ne!(a.as_ref(), b.as_ref());
    }
}
