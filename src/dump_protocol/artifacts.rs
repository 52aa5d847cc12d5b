//! Values handed back by the dump receiver.

use std::fmt;

/// A file fully reconstructed from a `FILE_BEGIN` ... `FILE_END` transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArtifact {
    /// Destination file name: the final segment of `relative_path`. Directory
    /// components supplied by the sender are never honoured.
    pub name: String,
    /// The path as announced by the sender.
    pub relative_path: String,
    /// The advisory size from `FILE_SIZE`, if one was received.
    pub declared_size: Option<u64>,
    pub bytes: Vec<u8>,
}
impl FileArtifact {
    /// `true` when a size was declared and the received bytes disagree with it.
    pub fn size_mismatch(&self) -> bool {
        match self.declared_size {
            Some(size) => size != self.bytes.len() as u64,
            None => false,
        }
    }
}

/// Bookkeeping of a completed session, emitted on `MAC_SNIFF_DUMP_END`.
///
/// The announced values are informational and never enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// From `NUM_FILES`.
    pub expected_files: Option<u64>,
    /// From the `TOTAL_BYTES` field of the END directive.
    pub total_bytes_reported: Option<u64>,
    pub files_emitted: u64,
    pub bytes_emitted: u64,
    /// Files dropped by strict validation.
    pub files_rejected: u64,
}
impl SessionReport {
    /// Whether what was received agrees with what the sender announced. Values
    /// that were not announced are not checked.
    pub fn is_consistent(&self) -> bool {
        let files_ok = self
            .expected_files
            .map_or(true, |expected| expected == self.files_emitted);
        let bytes_ok = self
            .total_bytes_reported
            .map_or(true, |reported| reported == self.bytes_emitted);
        files_ok && bytes_ok && self.files_rejected == 0
    }
}
impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file(s), {} byte(s)", self.files_emitted, self.bytes_emitted)?;
        if let Some(expected) = self.expected_files {
            write!(f, ", {} file(s) announced", expected)?;
        }
        if let Some(reported) = self.total_bytes_reported {
            write!(f, ", {} byte(s) reported", reported)?;
        }
        if self.files_rejected > 0 {
            write!(f, ", {} rejected", self.files_rejected)?;
        }
        Ok(())
    }
}

/// Output of [`DumpReceiver::consume`](super::DumpReceiver::consume).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// A file was completed by `FILE_END`.
    File(FileArtifact),
    /// The session was closed by `MAC_SNIFF_DUMP_END`.
    SessionEnd(SessionReport),
}

/// How declared sizes are treated when a file completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Declared sizes are advisory; a mismatch is only logged.
    Lenient,
    /// A file whose length differs from its declared size is rejected.
    Strict,
}
impl Default for Validation {
    fn default() -> Self {
        Validation::Lenient
    }
}

/// Observable position of the receiver in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for `MAC_SNIFF_DUMP_BEGIN`.
    Idle,
    /// A session is active with no file open.
    InSession,
    /// A session is active and a file transfer is open.
    FileOpen,
}
