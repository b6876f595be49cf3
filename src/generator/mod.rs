//! # Secure Random Generator
//!
//! Produces the secret value written into the target Secret.
//!
//! Two encodings are supported:
//!
//! - **URL-safe** - `length` random bytes, encoded as padded URL-safe base64
//!   (31 bytes become 44 characters)
//! - **Alphanumeric** - `length` characters drawn uniformly from
//!   `0-9A-Za-z-` (63 symbols) using rejection sampling
//!
//! The generator keeps no state between calls other than the randomness source
//! itself, which defaults to the operating system CSPRNG.

mod error;

pub use error::EntropyUnavailable;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use clap::ValueEnum;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

/// Symbols used in alphanumeric mode
pub const ALPHANUMERIC_ALPHABET: &[u8; 63] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-";

/// Bytes at or above this value are discarded.
/// 252 is the largest multiple of 63 that fits in a byte, so `byte % 63` stays uniform.
const ACCEPT_BELOW: u8 = 252;

/// Encoding of the generated value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SecretEncoding {
    /// Random bytes encoded as padded URL-safe base64
    #[default]
    UrlSafe,
    /// Characters drawn from [`ALPHANUMERIC_ALPHABET`]
    Alphanumeric,
}

/// A freshly generated secret value
///
/// The backing string is zeroed on drop and never shows up in `Debug` output.
pub struct GeneratedSecret(Zeroizing<String>);

impl GeneratedSecret {
    /// Borrow the plaintext value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for GeneratedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GeneratedSecret(<redacted>)")
    }
}

/// Secret value generator backed by a randomness source
#[derive(Debug, Clone)]
pub struct SecretGenerator<R = OsRng> {
    rng: R,
}

impl SecretGenerator<OsRng> {
    /// Generator backed by the operating system CSPRNG
    #[must_use]
    pub fn os() -> Self {
        Self { rng: OsRng }
    }
}

impl Default for SecretGenerator<OsRng> {
    fn default() -> Self {
        Self::os()
    }
}

impl<R: RngCore> SecretGenerator<R> {
    /// Generator backed by a caller-provided randomness source
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a value of `length` units in the given encoding
    ///
    /// For [`SecretEncoding::UrlSafe`] `length` counts random bytes before encoding;
    /// for [`SecretEncoding::Alphanumeric`] it counts output characters.
    ///
    /// # Errors
    ///
    /// Returns [`EntropyUnavailable`] if the randomness source fails.
    pub fn generate(
        &mut self,
        length: usize,
        encoding: SecretEncoding,
    ) -> Result<GeneratedSecret, EntropyUnavailable> {
        let value = match encoding {
            SecretEncoding::UrlSafe => self.url_safe(length)?,
            SecretEncoding::Alphanumeric => self.alphanumeric(length)?,
        };
        Ok(GeneratedSecret(value))
    }

    fn url_safe(&mut self, length: usize) -> Result<Zeroizing<String>, EntropyUnavailable> {
        let mut bytes = Zeroizing::new(vec![0u8; length]);
        self.rng.try_fill_bytes(&mut bytes)?;
        Ok(Zeroizing::new(URL_SAFE.encode(bytes.as_slice())))
    }

    fn alphanumeric(&mut self, length: usize) -> Result<Zeroizing<String>, EntropyUnavailable> {
        let mut out = Zeroizing::new(String::with_capacity(length));
        if length == 0 {
            return Ok(out);
        }

        let mut buf = Zeroizing::new(vec![0u8; length]);
        while out.len() < length {
            self.rng.try_fill_bytes(&mut buf)?;
            for &byte in buf.iter() {
                if byte >= ACCEPT_BELOW {
                    continue;
                }
                let index = usize::from(byte) % ALPHANUMERIC_ALPHABET.len();
                out.push(char::from(ALPHANUMERIC_ALPHABET[index]));
                if out.len() == length {
                    break;
                }
            }
        }
        Ok(out)
    }
}

/// Read a single byte from `rng` to prove it can supply entropy
///
/// # Errors
///
/// Returns [`EntropyUnavailable`] if the read fails.
pub fn check_entropy<R: RngCore>(rng: &mut R) -> Result<(), EntropyUnavailable> {
    let mut probe = [0u8; 1];
    rng.try_fill_bytes(&mut probe)?;
    Ok(())
}

/// Startup liveness check of the operating system CSPRNG
///
/// # Errors
///
/// Returns [`EntropyUnavailable`] if the OS source cannot be read.
pub fn assert_entropy_available() -> Result<(), EntropyUnavailable> {
    check_entropy(&mut OsRng)
}
