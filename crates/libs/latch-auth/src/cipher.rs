//! Symmetric encryption of short strings.
//!
//! [`SymmetricCipher`] runs AES in CFB mode with a fresh random IV per call.
//! The envelope is `IV || ciphertext`, encoded as URL-safe base64 so it can
//! go straight into a query string or header.
//!
//! # Not authenticated
//!
//! CFB carries no integrity check. Decrypting a tampered envelope does not
//! fail, it yields garbage. Pair the envelope with a MAC (for example a
//! signed URL from [`crate::url_signer`]) when tampering must be detected.
//!
//! # Examples
//!
//! ```rust
//! use latch_auth::{cipher::SymmetricCipher, config::CipherKey};
//!
//! let key = CipherKey::new(*b"0123456789abcdef0123456789abcdef").unwrap();
//! let cipher = SymmetricCipher::new(key);
//!
//! let envelope = cipher.encrypt("jane@example.com").unwrap();
//! assert_eq!(cipher.decrypt(&envelope).unwrap(), "jane@example.com");
//! ```

use aes::{Aes128, Aes192, Aes256};
use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use cfb_mode::{
    Decryptor, Encryptor,
    cipher::{AsyncStreamCipher, BlockCipher, BlockEncryptMut, KeyInit, KeyIvInit},
};
use rand::{RngCore, rngs::OsRng};

use crate::{config::CipherKey, prelude::*};

/// AES block size, which is also the IV length.
pub const IV_LEN: usize = 16;

/// URL-safe alphabet, no padding on encode, padding accepted on decode.
const ENVELOPE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// AES-CFB cipher bound to one key.
#[derive(Debug, Clone)]
pub struct SymmetricCipher {
    key: CipherKey,
}

impl SymmetricCipher {
    pub fn new(key: CipherKey) -> Self {
        Self { key }
    }

    /// Encrypts `plaintext` into a URL-safe envelope.
    ///
    /// Two calls with the same input never return the same envelope.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut buffer = vec![0u8; IV_LEN + plaintext.len()];
        let (iv, body) = buffer.split_at_mut(IV_LEN);
        OsRng
            .try_fill_bytes(iv)
            .map_err(|_| Error::CryptoUnavailable)?;
        body.copy_from_slice(plaintext.as_bytes());

        self.apply(Direction::Encrypt, iv, body)?;

        Ok(ENVELOPE.encode(&buffer))
    }

    /// Decrypts an envelope produced by [`SymmetricCipher::encrypt`].
    ///
    /// Fails on undecodable input or a payload shorter than one IV. Bytes
    /// that are not valid UTF-8 after decryption are replaced rather than
    /// rejected, so tampered input comes back as garbage.
    pub fn decrypt(&self, envelope: &str) -> Result<String> {
        let mut buffer = ENVELOPE
            .decode(envelope)
            .map_err(|_| Error::MalformedCiphertext)?;
        if buffer.len() < IV_LEN {
            return Err(Error::MalformedCiphertext);
        }
        let (iv, body) = buffer.split_at_mut(IV_LEN);

        self.apply(Direction::Decrypt, iv, body)?;

        Ok(String::from_utf8_lossy(body).into_owned())
    }

    fn apply(&self, direction: Direction, iv: &[u8], body: &mut [u8]) -> Result<()> {
        let key = self.key.as_bytes();
        match key.len() {
            16 => run::<Aes128>(direction, key, iv, body),
            24 => run::<Aes192>(direction, key, iv, body),
            32 => run::<Aes256>(direction, key, iv, body),
            other => Err(Error::InvalidKeyLength(other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn run<C>(direction: Direction, key: &[u8], iv: &[u8], body: &mut [u8]) -> Result<()>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    match direction {
        Direction::Encrypt => Encryptor::<C>::new_from_slices(key, iv)
            .map_err(|_| Error::InvalidKeyLength(key.len()))?
            .encrypt(body),
        Direction::Decrypt => Decryptor::<C>::new_from_slices(key, iv)
            .map_err(|_| Error::InvalidKeyLength(key.len()))?
            .decrypt(body),
    }
    Ok(())
}
