//! Reversible public identifiers
//!
//! Stored listings are exposed under a token instead of their marketplace id.
//! The token is the id encrypted with AES-256-GCM under a process-wide key:
//!
//! ```text
//! base64url( version (1 byte) || nonce (12 bytes) || ciphertext + tag )
//! ```
//!
//! Decoding authenticates the token, so truncated, edited, or foreign-key
//! tokens are rejected rather than decoded to garbage. Unless a key is
//! configured, a new one is generated at boot and tokens issued by an earlier
//! process stop decoding.

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

const TOKEN_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Binds tokens to this use so ciphertexts made with the same key elsewhere
/// do not decode
const ASSOCIATED_DATA: &[u8] = b"gig-crawler/listing-id";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot decode identifier: {0}")]
    Decode(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Identifier codec already installed")]
    AlreadyInstalled,
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Encrypts and decrypts marketplace ids under one key
#[derive(Clone)]
pub struct IdCodec {
    cipher: Aes256Gcm,
}

impl IdCodec {
    /// Creates a codec from raw key bytes
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Creates a codec with a fresh random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self::new(&key)
    }

    /// Creates a codec from a 64-character hex key
    pub fn from_hex(key: &str) -> CodecResult<Self> {
        let bytes = hex::decode(key.trim()).map_err(|e| CodecError::InvalidKey(e.to_string()))?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CodecError::InvalidKey(format!("expected {} bytes, got {}", KEY_LEN, b.len()))
        })?;
        Ok(Self::new(&key))
    }

    /// Encrypts a marketplace id into a public token
    ///
    /// Two calls with the same id yield different tokens; both decode back to
    /// the id.
    pub fn encode(&self, source_id: &str) -> CodecResult<String> {
        if source_id.is_empty() {
            return Err(CodecError::InvalidInput(
                "source id must not be empty".to_string(),
            ));
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                nonce,
                Payload {
                    msg: source_id.as_bytes(),
                    aad: ASSOCIATED_DATA,
                },
            )
            .map_err(|e| CodecError::InvalidInput(format!("encryption failed: {}", e)))?;

        let mut token = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        token.push(TOKEN_VERSION);
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    /// Recovers the marketplace id from a public token
    pub fn decode(&self, public_id: &str) -> CodecResult<String> {
        let bytes = URL_SAFE_NO_PAD
            .decode(public_id.trim())
            .map_err(|e| CodecError::Decode(format!("not a token: {}", e)))?;

        if bytes.len() < 1 + NONCE_LEN + TAG_LEN {
            return Err(CodecError::Decode("token too short".to_string()));
        }
        if bytes[0] != TOKEN_VERSION {
            return Err(CodecError::Decode(format!(
                "unsupported token version {}",
                bytes[0]
            )));
        }

        let (nonce_bytes, ciphertext) = bytes[1..].split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: ASSOCIATED_DATA,
                },
            )
            .map_err(|_| CodecError::Decode("authentication failed".to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

impl fmt::Debug for IdCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdCodec").finish_non_exhaustive()
    }
}

static GLOBAL: OnceLock<IdCodec> = OnceLock::new();

/// Installs the process-wide codec
///
/// Must run before the first call to [`global`]; fails if a codec is already
/// in place.
pub fn install(codec: IdCodec) -> CodecResult<()> {
    GLOBAL.set(codec).map_err(|_| CodecError::AlreadyInstalled)
}

/// Returns the process-wide codec, generating a random key on first use
pub fn global() -> &'static IdCodec {
    GLOBAL.get_or_init(IdCodec::generate)
}
