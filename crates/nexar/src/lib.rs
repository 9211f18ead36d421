//! nexar - Counter-Strike Online archive reading library.
//!
//! This crate provides a unified interface to the nexar library ecosystem
//! for working with the Nexon game archive formats.
//!
//! # Crates
//!
//! - [`nexar_common`] - Common utilities (binary reading, CRC-32)
//! - [`nexar_crypto`] - ICE block cipher and SNOW 2.0 stream cipher
//! - [`nexar_nar`] - NAR archive reading (tail directory + XOR + LZ)
//! - [`nexar_pak`] - PAK container reading (name-keyed SNOW layers)
//!
//! # Example
//!
//! ```no_run
//! use nexar::prelude::*;
//!
//! let archive = NarArchive::open("cstrike.nar")?;
//! if let Some(entry) = archive.find("models/player.mdl") {
//!     let data = archive.extract(entry)?;
//!     println!("{} bytes", data.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use nexar_common as common;
pub use nexar_crypto as crypto;
pub use nexar_nar as nar;
pub use nexar_pak as pak;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use nexar_common::{crc, BinaryReader};
    pub use nexar_crypto::{IceKey, Snow2};
    pub use nexar_nar::{NarArchive, NarEntry, StoredType};
    pub use nexar_pak::{PakArchive, PakEntry, PakEntryKind};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
