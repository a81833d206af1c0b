//! cf_crypto — Casefile Trust envelope encryption codec
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize secret material (content keys, decrypted payloads) on drop.
//! - Envelopes are self-describing: the `alg` tag inside the envelope is
//!   the sole dispatch key for decryption. No out-of-band context.
//!
//! # Module layout
//! - `codec`    — algorithm-agile encrypt/decrypt (RSA-hybrid / ECIES-P521)
//! - `envelope` — versioned, algorithm-tagged wire format
//! - `aead`     — AES-256-GCM helpers (detached-tag and sealed forms)
//! - `kdf`      — HKDF-SHA256 content-key derivation for the EC path
//! - `keys`     — PEM key-material loading, incl. base64-wrapped PEM
//! - `error`    — unified error type

pub mod aead;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod keys;

pub use codec::{CodecConfig, EnvelopeAlgorithm, EnvelopeCodec};
pub use envelope::Envelope;
pub use error::CryptoError;
