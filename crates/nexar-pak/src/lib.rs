//! PAK container reader.
//!
//! The CSO PAK format has no fixed signature: the header and entry-table
//! offsets are derived arithmetically from the archive's file name, and
//! every encrypted region runs through the SNOW 2.0 stream cipher keyed
//! with name- and path-derived 128-byte keys:
//!
//! - a fixed-size header (entry count, checksum) at a name-derived offset
//! - an entry table (UTF-16 paths, sizes, per-entry base keys)
//! - payload data in 1024-byte blocks past an aligned data origin
//!
//! # Example
//!
//! ```no_run
//! use nexar_pak::PakArchive;
//!
//! let archive = PakArchive::open("cstrike.pak")?;
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.path, entry.original_size);
//! }
//! # Ok::<(), nexar_pak::Error>(())
//! ```

mod archive;
mod entry;
mod error;
mod view;

pub mod keys;

pub use archive::{PakArchive, PakHeader, BLOCK_SIZE, PAK_VERSION, TOP_ENCRYPTED_SIZE};
pub use entry::{PakEntry, PakEntryKind, MAX_PATH_UNITS};
pub use error::{Error, Result};
pub use view::PakView;
