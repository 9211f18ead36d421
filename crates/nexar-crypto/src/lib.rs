//! Cipher primitives for the Nexon container formats.
//!
//! Both ciphers here are format-specific and implemented from scratch:
//!
//! - [`IceKey`] - the ICE (Information Concealment Engine) 64-bit Feistel
//!   block cipher with a level-parameterized round count
//! - [`Snow2`] - the SNOW 2.0 word-oriented stream cipher, used by the PAK
//!   container for header, entry-table and payload encryption
//!
//! Shared precomputed tables are compile-time constants; nothing is rebuilt
//! per cipher instance.

mod error;
mod ice;
mod snow;

pub use error::{Error, Result};
pub use ice::{CipherMode, IceKey, Padding};
pub use snow::Snow2;
