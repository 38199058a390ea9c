//! Short code generation.
//!
//! Codes are drawn from a 62-symbol alphanumeric alphabet using the operating
//! system's CSPRNG, so they cannot be predicted from previously issued codes.

use crate::error::AppError;

/// Symbols a generated code is made of: `a-z`, `A-Z`, `0-9`.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of 62 that fits in a byte. Bytes at or above it are
/// rejected so every symbol is equally likely.
const ACCEPT_BELOW: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Source of candidate short codes.
///
/// Implementations only produce candidates; uniqueness is enforced by the store.
pub trait CodeGenerator: Send + Sync {
    /// Produces a code of exactly `length` characters.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the random source fails.
    fn generate(&self, length: usize) -> Result<String, AppError>;
}

/// [`CodeGenerator`] backed by the OS random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, length: usize) -> Result<String, AppError> {
        generate_code(length)
    }
}

/// Generates a random alphanumeric code of `length` characters.
///
/// Random bytes are consumed with reject-and-resample, avoiding the modulo
/// bias a plain `byte % 62` would introduce.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code(9)?;
/// assert_eq!(code.len(), 9);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code(length: usize) -> Result<String, AppError> {
    let mut code = String::with_capacity(length);
    let mut buffer = [0u8; 32];

    while code.len() < length {
        getrandom::fill(&mut buffer)
            .map_err(|e| AppError::internal_with_source("Random source failed", e))?;

        for &byte in &buffer {
            if byte >= ACCEPT_BELOW {
                continue;
            }
            code.push(ALPHABET[usize::from(byte) % ALPHABET.len()] as char);
            if code.len() == length {
                break;
            }
        }
    }

    Ok(code)
}
