//! Events for the `macdump` dump receiver state machine.
//!
//! This modules is private and restricted to the
//! [`dump_protocol`](crate::dump_protocol) scope. The public interface of the
//! receiver is provided by [`dump_protocol`](crate::dump_protocol).
//!
//! ```ignore
//! use super::events::*;
//! ```
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use super::artifacts::{FileArtifact, SessionReport};
use super::states::Session;

// =============================================================================
// Crate-Public Interface
// =============================================================================

// BeginSessionEvent ===========================================================

/// Event fired to trigger a transition to [`InSessionState`].
///
/// Only fired while at the [`IdleState`] upon reception of
/// `MAC_SNIFF_DUMP_BEGIN`. A BEGIN received while a session is already active
/// does not restart it.
///
/// [`InSessionState`]: super::states::InSessionState
/// [`IdleState`]: super::states::IdleState
#[derive(Debug)]
pub(crate) struct BeginSessionEvent {}

// OpenFileEvent ===============================================================

/// Event fired to trigger a transition to [`FileOpenState`].
///
/// This event can happen under one of the following circumstances:
///
///  1. While at the [`InSessionState`] upon reception of `FILE_BEGIN`.
///  2. While at the [`FileOpenState`] upon reception of another `FILE_BEGIN`
///     before the `FILE_END` of the open file. The open file is discarded
///     unsaved and the new one replaces it.
///
/// [`InSessionState`]: super::states::InSessionState
/// [`FileOpenState`]: super::states::FileOpenState
#[derive(Debug)]
pub(crate) struct OpenFileEvent {
    /// The session, moved to the next state.
    pub session: Session,
    /// The path announced by the sender.
    pub relative_path: String,
}

// CloseFileEvent ==============================================================

/// Event fired while at the [`FileOpenState`] upon reception of `FILE_END`,
/// triggering a transition back to [`InSessionState`].
///
/// [`InSessionState`]: super::states::InSessionState
/// [`FileOpenState`]: super::states::FileOpenState
#[derive(Debug)]
pub(crate) struct CloseFileEvent {
    pub session: Session,
    /// The completed file, absent when nothing was received, the name was not
    /// usable or strict validation rejected it.
    pub artifact: Option<FileArtifact>,
}

// EndSessionEvent =============================================================

/// Event fired upon reception of `MAC_SNIFF_DUMP_END` while a session is
/// active. It triggers a transition back to [`IdleState`], after which a new
/// session can begin.
///
/// [`IdleState`]: super::states::IdleState
#[derive(Debug)]
pub(crate) struct EndSessionEvent {
    pub report: SessionReport,
}

// Events enum ==================================================================

/// Events that can be triggered within the dump receiver state machine.
///
/// Each possible value holds an `event`, which in turn holds the data moved by
/// the origin state into the target state.
#[derive(Debug)]
pub(crate) enum Event {
    BeginSession(BeginSessionEvent),
    OpenFile(OpenFileEvent),
    CloseFile(CloseFileEvent),
    EndSession(EndSessionEvent),
}
