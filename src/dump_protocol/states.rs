//! States for the `macdump` dump receiver state machine.
//!
//! This modules is private and restricted to the
//! [`dump_protocol`](crate::dump_protocol) scope. The public interface of the
//! receiver is provided by [`dump_protocol`](crate::dump_protocol).
//!
//! ```ignore
//! use super::states::*;
//! ```
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::{fmt, mem};

use log::{debug, error, info, trace, warn};

use super::artifacts::{FileArtifact, SessionReport, Validation};
use super::chunk::decode_pairs_into;
use super::directive::Directive;
use super::events::*;

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Trait adding the ability for a state to react to one protocol line.
pub(crate) trait Consume {
    /// A state implements this method to process one [`Directive`].
    ///
    /// Directives that only update the state's own data return `None` and the
    /// state machine stays where it is. When a transition is needed, the
    /// state moves its data into the returned `event`, which is then consumed
    /// to create the `new state` using the corresponding [`From`] trait
    /// implementation.
    fn consume(&mut self, directive: Directive<'_>, validation: Validation) -> Option<Event>;
}

/// Data of the active session, moved from state to state until the session
/// ends.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub expected_files: Option<u64>,
    pub files_emitted: u64,
    pub bytes_emitted: u64,
    pub files_rejected: u64,
}

/// The file currently being received.
#[derive(Default)]
pub(crate) struct FileTransfer {
    pub relative_path: String,
    pub declared_size: Option<u64>,
    pub buffer: Vec<u8>,
}
impl fmt::Debug for FileTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTransfer")
            .field("relative_path", &self.relative_path)
            .field("declared_size", &self.declared_size)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

// Idle State ==================================================================

/// The initial state of the receiver, also reached after every
/// `MAC_SNIFF_DUMP_END`.
///
/// Everything except `MAC_SNIFF_DUMP_BEGIN` is ignored here, which filters
/// out the firmware's console output printed before a dump starts.
///
///  * **[`BeginSessionEvent`] => [`InSessionState`]** upon reception of
///    `MAC_SNIFF_DUMP_BEGIN`.
#[derive(Debug)]
pub(crate) struct IdleState {}
impl Consume for IdleState {
    fn consume(&mut self, directive: Directive<'_>, _validation: Validation) -> Option<Event> {
        match directive {
            Directive::DumpBegin => {
                info!("=> Dump session started");
                Some(Event::BeginSession(BeginSessionEvent {}))
            }
            Directive::Empty => None,
            _ => {
                trace!("outside of a session, ignoring {:?}", directive);
                None
            }
        }
    }
}

// InSession State =============================================================

/// A session is active and no file is open.
///
///  * **[`OpenFileEvent`] => [`FileOpenState`]** upon reception of
///    `FILE_BEGIN`,
///  * **[`EndSessionEvent`] => [`IdleState`]** upon reception of
///    `MAC_SNIFF_DUMP_END`.
#[derive(Debug)]
pub(crate) struct InSessionState {
    pub session: Session,
}
impl Consume for InSessionState {
    fn consume(&mut self, directive: Directive<'_>, _validation: Validation) -> Option<Event> {
        match directive {
            Directive::Empty => None,
            Directive::DumpBegin => {
                debug!("session already active, ignoring BEGIN");
                None
            }
            Directive::DumpEnd { total_bytes } => Some(Event::EndSession(EndSessionEvent {
                report: mem::take(&mut self.session).end(total_bytes),
            })),
            Directive::NumFiles(count) => {
                self.session.announce_files(count);
                None
            }
            Directive::FileBegin(path) => {
                info!("=> Receiving `{}`", path);
                Some(Event::OpenFile(OpenFileEvent {
                    session: mem::take(&mut self.session),
                    relative_path: path.to_owned(),
                }))
            }
            Directive::FileEnd => {
                debug!("no open file, ignoring FILE_END");
                None
            }
            _ => {
                trace!("no open file, ignoring {:?}", directive);
                None
            }
        }
    }
}

// FileOpen State ==============================================================

/// A session is active and a file transfer is open, accumulating the decoded
/// `CHUNK` payloads.
///
///  * **[`CloseFileEvent`] => [`InSessionState`]** upon reception of
///    `FILE_END` with at least one byte received,
///  * **[`OpenFileEvent`] => [`FileOpenState`]** upon reception of another
///    `FILE_BEGIN`, discarding the unsaved buffer of the open file,
///  * **[`EndSessionEvent`] => [`IdleState`]** upon reception of
///    `MAC_SNIFF_DUMP_END`, also discarding the open file.
#[derive(Debug)]
pub(crate) struct FileOpenState {
    pub session: Session,
    pub transfer: FileTransfer,
}
impl Consume for FileOpenState {
    fn consume(&mut self, directive: Directive<'_>, validation: Validation) -> Option<Event> {
        match directive {
            Directive::Empty => None,
            Directive::DumpBegin => {
                debug!("session already active, ignoring BEGIN");
                None
            }
            Directive::DumpEnd { total_bytes } => {
                warn!(
                    "session ended before FILE_END of `{}`, {} byte(s) discarded",
                    self.transfer.relative_path,
                    self.transfer.buffer.len()
                );
                Some(Event::EndSession(EndSessionEvent {
                    report: mem::take(&mut self.session).end(total_bytes),
                }))
            }
            Directive::NumFiles(count) => {
                self.session.announce_files(count);
                None
            }
            Directive::FileBegin(path) => {
                if !self.transfer.buffer.is_empty() {
                    warn!(
                        "`{}` superseded by `{}` before FILE_END, {} byte(s) discarded",
                        self.transfer.relative_path,
                        path,
                        self.transfer.buffer.len()
                    );
                }
                info!("=> Receiving `{}`", path);
                Some(Event::OpenFile(OpenFileEvent {
                    session: mem::take(&mut self.session),
                    relative_path: path.to_owned(),
                }))
            }
            Directive::FileSize(size) => {
                if size.is_some() {
                    debug!("`{}` declared size: {:?}", self.transfer.relative_path, size);
                    self.transfer.declared_size = size;
                }
                None
            }
            Directive::Chunk(payload) => {
                let appended = decode_pairs_into(payload, &mut self.transfer.buffer);
                trace!(
                    "chunk of {} byte(s), {} buffered",
                    appended,
                    self.transfer.buffer.len()
                );
                None
            }
            Directive::FileEnd => {
                if self.transfer.buffer.is_empty() {
                    debug!(
                        "nothing received for `{}`, ignoring FILE_END",
                        self.transfer.relative_path
                    );
                    return None;
                }
                let transfer = mem::take(&mut self.transfer);
                let artifact = self.session.complete(transfer, validation);
                Some(Event::CloseFile(CloseFileEvent {
                    session: mem::take(&mut self.session),
                    artifact,
                }))
            }
            Directive::Unknown(_) => {
                trace!("ignoring {:?}", directive);
                None
            }
        }
    }
}

// =============================================================================
// Private stuff
// =============================================================================

impl Session {
    fn announce_files(&mut self, count: Option<u64>) {
        if let Some(count) = count {
            info!("Expecting {} file(s)", count);
            self.expected_files = Some(count);
        }
    }

    /// Turn a finished transfer into an artifact and account for it.
    fn complete(&mut self, transfer: FileTransfer, validation: Validation) -> Option<FileArtifact> {
        let name = match file_name(&transfer.relative_path) {
            Some(name) => name.to_owned(),
            None => {
                warn!(
                    "`{}` has no usable file name, {} byte(s) discarded",
                    transfer.relative_path,
                    transfer.buffer.len()
                );
                return None;
            }
        };

        let artifact = FileArtifact {
            name,
            relative_path: transfer.relative_path,
            declared_size: transfer.declared_size,
            bytes: transfer.buffer,
        };

        if artifact.size_mismatch() {
            match validation {
                Validation::Strict => {
                    error!(
                        "`{}` rejected: {} byte(s) received, {:?} declared",
                        artifact.relative_path,
                        artifact.bytes.len(),
                        artifact.declared_size
                    );
                    self.files_rejected += 1;
                    return None;
                }
                Validation::Lenient => warn!(
                    "`{}`: {} byte(s) received, {:?} declared",
                    artifact.relative_path,
                    artifact.bytes.len(),
                    artifact.declared_size
                ),
            }
        }

        self.files_emitted += 1;
        self.bytes_emitted += artifact.bytes.len() as u64;
        info!(
            "=> Completed `{}` ({} bytes)",
            artifact.name,
            artifact.bytes.len()
        );
        Some(artifact)
    }

    fn end(self, total_bytes: Option<u64>) -> SessionReport {
        let report = SessionReport {
            expected_files: self.expected_files,
            total_bytes_reported: total_bytes,
            files_emitted: self.files_emitted,
            bytes_emitted: self.bytes_emitted,
            files_rejected: self.files_rejected,
        };
        if report.is_consistent() {
            info!("=> Dump session completed: {}", report);
        } else {
            warn!("=> Dump session completed with discrepancies: {}", report);
        }
        report
    }
}

/// The final segment of a sender-supplied path, if it can name a file.
fn file_name(path: &str) -> Option<&str> {
    match path.rsplit(&['/', '\\'][..]).next() {
        Some("") | Some(".") | Some("..") | None => None,
        Some(name) => Some(name),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/spiffs/macs.bin", Some("macs.bin"))]
    #[case("macs.bin", Some("macs.bin"))]
    #[case("../../etc/passwd", Some("passwd"))]
    #[case("C:\\dump\\macs.bin", Some("macs.bin"))]
    #[case("/spiffs/", None)]
    #[case("/spiffs/..", None)]
    #[case(".", None)]
    #[case("", None)]
    fn file_name_is_last_segment(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(file_name(path), expected);
    }

    fn transfer(path: &str, declared_size: Option<u64>, buffer: Vec<u8>) -> FileTransfer {
        FileTransfer {
            relative_path: path.into(),
            declared_size,
            buffer,
        }
    }

    #[test]
    fn complete_accounts_for_emitted_files() {
        let mut session = Session::default();
        let artifact = session
            .complete(transfer("/x/a.bin", Some(2), vec![1, 2]), Validation::Lenient)
            .unwrap();
        assert_eq!(artifact.name, "a.bin");
        assert_eq!(session.files_emitted, 1);
        assert_eq!(session.bytes_emitted, 2);
    }

    #[test]
    fn lenient_keeps_size_mismatch() {
        let mut session = Session::default();
        let artifact = session.complete(transfer("a.bin", Some(10), vec![1]), Validation::Lenient);
        assert!(artifact.unwrap().size_mismatch());
        assert_eq!(session.files_rejected, 0);
    }

    #[test]
    fn strict_rejects_size_mismatch() {
        let mut session = Session::default();
        let artifact = session.complete(transfer("a.bin", Some(10), vec![1]), Validation::Strict);
        assert_eq!(artifact, None);
        assert_eq!(session.files_rejected, 1);
        assert_eq!(session.files_emitted, 0);
    }

    #[test]
    fn strict_accepts_undeclared_size() {
        let mut session = Session::default();
        let artifact = session.complete(transfer("a.bin", None, vec![1]), Validation::Strict);
        assert!(artifact.is_some());
    }

    #[test]
    fn malformed_count_keeps_previous_value() {
        let mut session = Session::default();
        session.announce_files(Some(3));
        session.announce_files(None);
        assert_eq!(session.expected_files, Some(3));
    }
}
