//! NAR (Nexon Archive) reader.
//!
//! NAR is the archive container of Counter-Strike Online. The directory is
//! stored at the tail of the file, XOR-masked and BZip2-compressed; entry
//! payloads are optionally run through a positional XOR encoding and an
//! LZ-style compressor with an 8 KiB sliding dictionary.
//!
//! # Example
//!
//! ```no_run
//! use nexar_nar::NarArchive;
//!
//! let archive = NarArchive::open("cstrike.nar")?;
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.path(), entry.extracted_size());
//! }
//! # Ok::<(), nexar_nar::Error>(())
//! ```

mod archive;
mod decode;
mod decompress;
mod dictionary;
mod entry;
mod error;
mod stream;

pub use archive::{NarArchive, HEADER_XOR, NAR_MAGIC, NAR_VERSION};
pub use decode::XorDecoder;
pub use decompress::LzDecompressor;
pub use dictionary::{CircularDictionary, DICTIONARY_SIZE};
pub use entry::{NarEntry, StoredType};
pub use error::{Error, Result};
pub use stream::BoundedStream;
