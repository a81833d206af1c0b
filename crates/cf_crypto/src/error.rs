use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Missing key material: {0} is not configured")]
    MissingKey(&'static str),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Unknown envelope algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Malformed envelope: {0}")]
    Envelope(String),

    #[error("AEAD encryption failed")]
    AeadEncrypt,

    #[error("AEAD decryption failed (authentication tag mismatch — possible tampering)")]
    AeadDecrypt,

    #[error("Content key unwrap failed")]
    KeyUnwrap,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
