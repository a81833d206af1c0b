//! Envelope wire format
//!
//! An envelope is base64(JSON) and fully self-describing: the `alg` field
//! names the algorithm suite, and every parameter needed for decryption
//! (given the right private key) travels inside it.
//!
//! Fields per variant (all binary values base64):
//!   RSA: { v, alg, cek (wrapped), iv, tag, ct }
//!   EC:  { v, alg, epk (ephemeral public key, SPKI PEM), salt, iv, tag, ct }
//!
//! An unrecognised `alg` is a distinct error, never a default branch:
//! nothing downstream may guess at an algorithm.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

pub const ENVELOPE_VERSION: u8 = 1;

pub const RSA_ALG: &str = "RSA-OAEP-256+AES-256-GCM";
pub const EC_ALG: &str = "ECIES-P521+AES-256-GCM";

/// Self-describing encrypted blob. The `alg` tag is the sole dispatch key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "alg")]
pub enum Envelope {
    #[serde(rename = "RSA-OAEP-256+AES-256-GCM")]
    Rsa {
        v: u8,
        /// RSA-OAEP(SHA-256)-wrapped content-encryption key.
        cek: String,
        iv: String,
        tag: String,
        ct: String,
    },
    #[serde(rename = "ECIES-P521+AES-256-GCM")]
    Ec {
        v: u8,
        /// Ephemeral P-521 public key, base64 of its SPKI PEM.
        epk: String,
        salt: String,
        iv: String,
        tag: String,
        ct: String,
    },
}

impl Envelope {
    pub fn alg(&self) -> &'static str {
        match self {
            Envelope::Rsa { .. } => RSA_ALG,
            Envelope::Ec { .. } => EC_ALG,
        }
    }

    /// Serialise to the persisted/transmitted form: base64(JSON).
    pub fn to_wire(&self) -> Result<String, CryptoError> {
        let json = serde_json::to_vec(self)?;
        Ok(B64.encode(json))
    }

    /// Parse the wire form. The `alg` field is checked before the variant
    /// is deserialised so an unknown suite surfaces as
    /// [`CryptoError::UnknownAlgorithm`] rather than a generic parse error.
    pub fn from_wire(wire: &str) -> Result<Self, CryptoError> {
        let json = B64.decode(wire.trim())?;
        let value: serde_json::Value = serde_json::from_slice(&json)?;

        let alg = value
            .get("alg")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CryptoError::Envelope("missing alg field".into()))?;
        if alg != RSA_ALG && alg != EC_ALG {
            return Err(CryptoError::UnknownAlgorithm(alg.to_string()));
        }

        Ok(serde_json::from_value(value)?)
    }
}
