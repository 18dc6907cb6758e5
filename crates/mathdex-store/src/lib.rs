//! mathdex-store
//!
//! In-process reference implementations of the collaborator contracts in
//! `mathdex_core::traits`: term index, math index, offset log, blob file,
//! gzip codec, and the TeX subpath parser.

pub mod blob;
pub mod codec;
pub mod math;
pub mod offsets;
pub mod term;
pub mod texparse;

pub use blob::BlobFile;
pub use codec::GzCodec;
pub use math::MemMathIndex;
pub use offsets::OffsetLog;
pub use term::MemTermIndex;
pub use texparse::SubpathParser;
