//! At-rest encryption of the serialized user file
//!
//! AES in OFB mode with a random IV per call. The blob is
//! `base32(iv || ciphertext)` using the padded RFC 4648 alphabet.
//! OFB carries no authentication tag: decrypting with the wrong key
//! yields garbage, not an error.

use aes::{Aes128, Aes192, Aes256};
use data_encoding::BASE32;
use ofb::cipher::{InvalidLength, KeyIvInit, StreamCipher};
use ofb::Ofb;
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::core::error::{Result, UserError};

/// AES block size, also the IV length
pub const BLOCK_SIZE: usize = 16;

/// Reject keys that do not select AES-128, AES-192 or AES-256
pub fn check_key(key: &[u8]) -> Result<()> {
    match key.len() {
        16 | 24 | 32 => Ok(()),
        len => Err(UserError::InvalidKey(len)),
    }
}

fn apply_keystream(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<()> {
    let invalid = |_: InvalidLength| UserError::InvalidKey(key.len());
    match key.len() {
        16 => Ofb::<Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .apply_keystream(buf),
        24 => Ofb::<Aes192>::new_from_slices(key, iv)
            .map_err(invalid)?
            .apply_keystream(buf),
        32 => Ofb::<Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .apply_keystream(buf),
        len => return Err(UserError::InvalidKey(len)),
    }
    Ok(())
}

/// Encrypt `plaintext` with `key` and encode the result as a base32 blob
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<String> {
    check_key(key)?;

    let mut blob = vec![0u8; BLOCK_SIZE + plaintext.len()];
    let (iv, body) = blob.split_at_mut(BLOCK_SIZE);
    OsRng
        .try_fill_bytes(iv)
        .map_err(std::io::Error::other)?;

    body.copy_from_slice(plaintext);
    apply_keystream(key, iv, body)?;

    Ok(BASE32.encode(&blob))
}

/// Decode a base32 blob and decrypt it with `key`
pub fn decrypt(blob: &str, key: &[u8]) -> Result<Vec<u8>> {
    check_key(key)?;

    let raw = BASE32
        .decode(blob.trim_end().as_bytes())
        .map_err(|e| UserError::Encoding(format!("invalid base32 blob: {}", e)))?;

    if raw.len() < BLOCK_SIZE {
        return Err(UserError::InvalidVector {
            len: raw.len(),
            block: BLOCK_SIZE,
        });
    }

    let (iv, body) = raw.split_at(BLOCK_SIZE);
    let mut plain = body.to_vec();
    apply_keystream(key, iv, &mut plain)?;

    Ok(plain)
}
