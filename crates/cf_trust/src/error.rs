use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("Not authorised: no resolvable user id")]
    Unauthorized,

    #[error("Invalid effective date: {0}")]
    InvalidDate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Identity error: {0}")]
    Identity(#[from] cf_identity::IdentityError),

    #[error("Key upload failed: {0}")]
    Upload(String),

    #[error("Trusted key listing failed: {0}")]
    Listing(String),
}
