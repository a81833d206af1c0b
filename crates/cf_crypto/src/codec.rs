//! Algorithm-agile envelope codec
//!
//! `encrypt` protects an opaque payload under server-held recipient keys,
//! producing a self-describing envelope (see `envelope`). The algorithm is
//! a configuration switch (default RSA) read per call; `decrypt` never
//! consults it and dispatches purely on the envelope's `alg` tag.
//!
//! RSA path: random 256-bit CEK + 96-bit IV, AES-256-GCM, CEK wrapped
//! with RSA-OAEP(SHA-256) under the recipient RSA public key.
//!
//! EC path: ephemeral P-521 keypair, ECDH against the static recipient
//! key, HKDF-SHA256(salt, "ECIES-P521") to a 256-bit AES key, AES-256-GCM.
//!
//! Key-material problems are reported before any cryptographic work.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use p521::ecdh::EphemeralSecret;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::aead::{self, IV_LEN, KEY_LEN, TAG_LEN};
use crate::envelope::{Envelope, ENVELOPE_VERSION};
use crate::error::CryptoError;
use crate::kdf::{self, SALT_LEN};
use crate::keys;

/// Which suite `encrypt` uses. Decryption ignores this entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeAlgorithm {
    #[default]
    Rsa,
    Ec,
}

/// Codec configuration: the algorithm selector plus four key-material
/// settings. Each PEM value may be once-base64-wrapped (single-line
/// configuration stores); see `keys::normalize_pem`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub algorithm: EnvelopeAlgorithm,
    pub rsa_public_key_pem: Option<String>,
    pub rsa_private_key_pem: Option<String>,
    pub ec_public_key_pem: Option<String>,
    pub ec_private_key_pem: Option<String>,
}

/// Stateless envelope codec. Holds configuration only; every call draws
/// fresh randomness, so concurrent encryptions under one key never share
/// an IV or salt.
pub struct EnvelopeCodec {
    config: CodecConfig,
}

impl EnvelopeCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Encrypt `plaintext` under the configured algorithm, returning the
    /// base64 wire form of the envelope.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let envelope = match self.config.algorithm {
            EnvelopeAlgorithm::Rsa => self.encrypt_rsa(plaintext)?,
            EnvelopeAlgorithm::Ec => self.encrypt_ec(plaintext)?,
        };
        envelope.to_wire()
    }

    /// Decrypt a wire envelope. Dispatches on the envelope's own `alg`
    /// tag; fails on an unknown suite, a failed authentication tag, or a
    /// missing/unusable private key.
    pub fn decrypt(&self, wire: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        match Envelope::from_wire(wire)? {
            Envelope::Rsa { cek, iv, tag, ct, .. } => self.decrypt_rsa(&cek, &iv, &tag, &ct),
            Envelope::Ec { epk, salt, iv, tag, ct, .. } => {
                self.decrypt_ec(&epk, &salt, &iv, &tag, &ct)
            }
        }
    }

    // ── RSA-OAEP-256 + AES-256-GCM ───────────────────────────────────────────

    fn encrypt_rsa(&self, plaintext: &[u8]) -> Result<Envelope, CryptoError> {
        let pem = self.require_pem(&self.config.rsa_public_key_pem, "rsa_public_key_pem")?;
        let recipient = keys::rsa_public_from_pem(&pem)?;

        let cek = aead::random_key();
        let iv = aead::random_iv();
        let (ct, tag) = aead::encrypt_detached(&cek, &iv, plaintext)?;

        let wrapped = recipient
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &cek[..])
            .map_err(|e| CryptoError::KeyGeneration(format!("CEK wrap: {e}")))?;

        Ok(Envelope::Rsa {
            v: ENVELOPE_VERSION,
            cek: B64.encode(wrapped),
            iv: B64.encode(iv),
            tag: B64.encode(tag),
            ct: B64.encode(ct),
        })
    }

    fn decrypt_rsa(
        &self,
        cek: &str,
        iv: &str,
        tag: &str,
        ct: &str,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let pem = self.require_pem(&self.config.rsa_private_key_pem, "rsa_private_key_pem")?;
        let private = keys::rsa_private_from_pem(&pem)?;

        let wrapped = B64.decode(cek)?;
        let cek_bytes = Zeroizing::new(
            private
                .decrypt(Oaep::new::<Sha256>(), &wrapped)
                .map_err(|_| CryptoError::KeyUnwrap)?,
        );
        if cek_bytes.len() != KEY_LEN {
            return Err(CryptoError::KeyUnwrap);
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(&cek_bytes);

        let iv = decode_fixed::<IV_LEN>(iv, "iv")?;
        let tag = decode_fixed::<TAG_LEN>(tag, "tag")?;
        let ct = B64.decode(ct)?;

        aead::decrypt_detached(&key, &iv, &ct, &tag)
    }

    // ── ECIES-P521 + AES-256-GCM ─────────────────────────────────────────────

    fn encrypt_ec(&self, plaintext: &[u8]) -> Result<Envelope, CryptoError> {
        let pem = self.require_pem(&self.config.ec_public_key_pem, "ec_public_key_pem")?;
        let recipient = keys::ec_public_from_pem(&pem)?;

        let ephemeral = EphemeralSecret::random(&mut OsRng);
        let epk_pem = ephemeral
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyGeneration(format!("ephemeral key: {e}")))?;

        let shared = ephemeral.diffie_hellman(&recipient);
        let salt = kdf::generate_salt();
        let key = kdf::derive_content_key(shared.raw_secret_bytes().as_slice(), &salt)?;

        let iv = aead::random_iv();
        let (ct, tag) = aead::encrypt_detached(&key, &iv, plaintext)?;

        Ok(Envelope::Ec {
            v: ENVELOPE_VERSION,
            epk: B64.encode(epk_pem.as_bytes()),
            salt: B64.encode(salt),
            iv: B64.encode(iv),
            tag: B64.encode(tag),
            ct: B64.encode(ct),
        })
    }

    fn decrypt_ec(
        &self,
        epk: &str,
        salt: &str,
        iv: &str,
        tag: &str,
        ct: &str,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let pem = self.require_pem(&self.config.ec_private_key_pem, "ec_private_key_pem")?;
        let private = keys::ec_private_from_pem(&pem)?;

        let epk_pem = String::from_utf8(B64.decode(epk)?)
            .map_err(|_| CryptoError::Envelope("ephemeral key is not PEM".into()))?;
        let ephemeral_public = keys::ec_public_from_pem(&epk_pem)?;

        let shared = p521::ecdh::diffie_hellman(
            private.to_nonzero_scalar(),
            ephemeral_public.as_affine(),
        );

        let salt = decode_fixed::<SALT_LEN>(salt, "salt")?;
        let key = kdf::derive_content_key(shared.raw_secret_bytes().as_slice(), &salt)?;

        let iv = decode_fixed::<IV_LEN>(iv, "iv")?;
        let tag = decode_fixed::<TAG_LEN>(tag, "tag")?;
        let ct = B64.decode(ct)?;

        aead::decrypt_detached(&key, &iv, &ct, &tag)
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn require_pem(
        &self,
        value: &Option<String>,
        name: &'static str,
    ) -> Result<String, CryptoError> {
        let material = value.as_deref().ok_or(CryptoError::MissingKey(name))?;
        keys::normalize_pem(material)
    }
}

fn decode_fixed<const N: usize>(b64: &str, field: &'static str) -> Result<[u8; N], CryptoError> {
    let bytes = B64.decode(b64)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Envelope(format!("{field} must be {N} bytes")))
}
