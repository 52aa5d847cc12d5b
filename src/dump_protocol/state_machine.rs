//! `macdump` dump receiver state machine.
//!
//! The receiver consumes one line at a time and never blocks, never fails and
//! never looks ahead. All of its effects are a deterministic function of the
//! order of the lines it is given.
//!
//! The following state diagram summarizes the different states and transitions
//! the receiver goes through:
//!
//! ```text
//!                      START
//!                        |
//!                        v
//!                   .---------.
//!    .------------->|  Idle   |<-------- other lines
//!    |              '---------'
//!    |                   |
//!    |          MAC_SNIFF_DUMP_BEGIN
//!    |                   v
//!    |  END        .-----------.  NUM_FILES, stray CHUNK/FILE_SIZE/FILE_END
//!    |<------------| InSession |<-------.
//!    |             '-----------'--------'
//!    |               |       ^
//!    |      FILE_BEGIN       FILE_END (non-empty buffer)
//!    |               v       |
//!    |  END        .-----------.  FILE_SIZE, CHUNK, FILE_END (empty buffer)
//!    '-------------| FileOpen  |<-------.
//!                  '-----------'--------'
//!                    |       ^
//!                    '-------'
//!                   FILE_BEGIN (open buffer discarded)
//! ```

use std::mem;

use super::artifacts::{Emission, Phase, Validation};
use super::directive::Directive;
use super::events::*;
use super::states::*;

// =============================================================================
// Public Interface
// =============================================================================

/// Reconstructs the files of a dump from the lines of the serial stream.
///
/// The receiver owns its whole state: there is no global, and two receivers
/// never interfere. Dropping it discards any partially received file.
#[derive(Debug)]
pub struct DumpReceiver {
    sm: ReceiverStates,
    validation: Validation,
}
impl DumpReceiver {
    /// A receiver in the `Idle` state, treating declared sizes as advisory.
    pub fn new() -> Self {
        Self::with_validation(Validation::Lenient)
    }

    pub fn with_validation(validation: Validation) -> Self {
        DumpReceiver {
            // The receiver naturally starts in the `Idle` state.
            sm: ReceiverStates::Idle(ReceiverSM::new()),
            validation,
        }
    }

    /// Feed one line, without its line terminator, to the receiver.
    ///
    /// Returns the completed file when the line was a `FILE_END` closing a
    /// non-empty transfer, and the session bookkeeping when the line was a
    /// `MAC_SNIFF_DUMP_END`. Every other line returns `None`.
    pub fn consume(&mut self, line: &str) -> Option<Emission> {
        let directive = Directive::parse(line);
        let current = mem::replace(&mut self.sm, ReceiverStates::Idle(ReceiverSM::new()));
        let (next, emission) = current.step(directive, self.validation);
        self.sm = next;
        emission
    }

    pub fn phase(&self) -> Phase {
        match &self.sm {
            ReceiverStates::Idle(_) => Phase::Idle,
            ReceiverStates::InSession(_) => Phase::InSession,
            ReceiverStates::FileOpen(_) => Phase::FileOpen,
        }
    }

    /// Whether a `MAC_SNIFF_DUMP_BEGIN` was seen and its END not yet.
    pub fn in_session(&self) -> bool {
        self.phase() != Phase::Idle
    }

    /// Bytes accumulated so far for the open file, `0` when none is open.
    pub fn buffered_bytes(&self) -> usize {
        match &self.sm {
            ReceiverStates::FileOpen(sm) => sm.state.transfer.buffer.len(),
            _ => 0,
        }
    }

    /// Abandon the current session, if any, and go back to `Idle`.
    pub fn reset(&mut self) {
        self.sm = ReceiverStates::Idle(ReceiverSM::new());
    }
}
impl Default for DumpReceiver {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// The raw state machine holding the current state.
///
/// Kept generic over the state so that data shared by all states could live
/// next to it, and so that the machine and its current state show up together
/// when debugging.
#[derive(Debug)]
struct ReceiverSM<S: Consume> {
    state: S,
}
impl<S: Consume> ReceiverSM<S> {
    fn consume(&mut self, directive: Directive<'_>, validation: Validation) -> Option<Event> {
        self.state.consume(directive, validation)
    }
}

/// The receiver starts in the `IdleState`.
impl ReceiverSM<IdleState> {
    fn new() -> Self {
        ReceiverSM {
            state: IdleState {},
        }
    }
}

/// Wraps the state machine and its various states into a simple enum, which can
/// also be used for pattern matching during state transitions.
#[derive(Debug)]
enum ReceiverStates {
    Idle(ReceiverSM<IdleState>),
    InSession(ReceiverSM<InSessionState>),
    FileOpen(ReceiverSM<FileOpenState>),
}
impl ReceiverStates {
    /// The unit of work of the receiver. The current state is consumed along
    /// with the directive, and the next state is returned together with
    /// whatever the transition produced for the caller. State transitions from
    /// events are implemented using the rust `From`/`Into` pattern.
    fn step(self, directive: Directive<'_>, validation: Validation) -> (Self, Option<Emission>) {
        match self {
            ReceiverStates::Idle(mut sm) => match sm.consume(directive, validation) {
                None => (ReceiverStates::Idle(sm), None),
                Some(Event::BeginSession(ev)) => (ReceiverStates::InSession(ev.into()), None),
                Some(event) => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
            },
            ReceiverStates::InSession(mut sm) => match sm.consume(directive, validation) {
                None => (ReceiverStates::InSession(sm), None),
                Some(Event::OpenFile(ev)) => (ReceiverStates::FileOpen(ev.into()), None),
                Some(Event::EndSession(ev)) => {
                    let report = ev.report;
                    (
                        ReceiverStates::Idle(ev.into()),
                        Some(Emission::SessionEnd(report)),
                    )
                }
                Some(event) => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
            },
            ReceiverStates::FileOpen(mut sm) => match sm.consume(directive, validation) {
                None => (ReceiverStates::FileOpen(sm), None),
                Some(Event::OpenFile(ev)) => (ReceiverStates::FileOpen(ev.into()), None),
                Some(Event::CloseFile(mut ev)) => {
                    let artifact = ev.artifact.take();
                    (
                        ReceiverStates::InSession(ev.into()),
                        artifact.map(Emission::File),
                    )
                }
                Some(Event::EndSession(ev)) => {
                    let report = ev.report;
                    (
                        ReceiverStates::Idle(ev.into()),
                        Some(Emission::SessionEnd(report)),
                    )
                }
                Some(event) => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
            },
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<BeginSessionEvent> for ReceiverSM<InSessionState> {
    fn from(_event: BeginSessionEvent) -> ReceiverSM<InSessionState> {
        // A new session never inherits the bookkeeping of a previous one.
        ReceiverSM {
            state: InSessionState {
                session: Session::default(),
            },
        }
    }
}

impl From<OpenFileEvent> for ReceiverSM<FileOpenState> {
    fn from(event: OpenFileEvent) -> ReceiverSM<FileOpenState> {
        ReceiverSM {
            state: FileOpenState {
                session: event.session,
                transfer: FileTransfer {
                    relative_path: event.relative_path,
                    declared_size: None,
                    buffer: Vec::new(),
                },
            },
        }
    }
}

impl From<CloseFileEvent> for ReceiverSM<InSessionState> {
    fn from(event: CloseFileEvent) -> ReceiverSM<InSessionState> {
        ReceiverSM {
            state: InSessionState {
                session: event.session,
            },
        }
    }
}

impl From<EndSessionEvent> for ReceiverSM<IdleState> {
    fn from(_event: EndSessionEvent) -> ReceiverSM<IdleState> {
        ReceiverSM::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
