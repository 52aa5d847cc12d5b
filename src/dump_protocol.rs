//! `macdump` serial dump receiver protocol.
//!
//! The sniffer firmware streams the content of its storage as text lines:
//!
//! ```text
//! MAC_SNIFF_DUMP_BEGIN
//! NUM_FILES:<decimal int>
//! FILE_BEGIN:<sender-side path>
//! FILE_SIZE:<decimal int>
//! CHUNK:<hex-encoded bytes>
//! ...
//! FILE_END
//! ...
//! MAC_SNIFF_DUMP_END
//! ```
//!
//! There is no checksum, no length prefix and no chunk sequence number in the
//! protocol. Integrity relies entirely on the transport delivering every line.
//!
//! **Example** - Feeding lines to the receiver:
//! ```
//! use macdump::{DumpReceiver, Emission};
//!
//! let mut receiver = DumpReceiver::new();
//! let mut files = vec![];
//! for line in &[
//!     "MAC_SNIFF_DUMP_BEGIN",
//!     "FILE_BEGIN:/spiffs/macs.bin",
//!     "CHUNK:0a1b",
//!     "FILE_END",
//!     "MAC_SNIFF_DUMP_END",
//! ] {
//!     if let Some(Emission::File(artifact)) = receiver.consume(line) {
//!         files.push(artifact);
//!     }
//! }
//! assert_eq!(files.len(), 1);
//! assert_eq!(files[0].name, "macs.bin");
//! assert_eq!(files[0].bytes, vec![0x0a, 0x1b]);
//! ```

mod artifacts;
mod chunk;
mod directive;
mod events;
mod state_machine;
mod states;

pub use artifacts::{Emission, FileArtifact, Phase, SessionReport, Validation};
pub use chunk::{decode_pairs, decode_pairs_into};
pub use state_machine::DumpReceiver;
