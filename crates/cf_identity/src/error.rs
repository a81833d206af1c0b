use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("No private key available for signing")]
    NoPrivateKey,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Durable store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Sealed record error: {0}")]
    Seal(#[from] cf_crypto::CryptoError),

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
