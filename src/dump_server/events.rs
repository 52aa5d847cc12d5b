//! Events for the `macdump` dump server state machine.
//!
//! This modules is private and restricted to the
//! [`dump_server`](crate::dump_server) scope. The public interface of the state
//! machine is provided by [`dump_server`](crate::dump_server).
//!
//! ```ignore
//! use super::events::*;
//! ```
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use crate::settings::Settings;
use crate::summary::Summary;

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Data shared by all states of the dump server and carried along every
/// transition.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub settings: Settings,
    /// Files and sessions received so far, across reconnections.
    pub summary: Summary,
}

// WaitForPortEvent ============================================================

/// Event fired to trigger a transition to the `WaitForPort` state.
///
/// This event can happen under one of the following circumstances:
///
///  1. While at the `Init` state and a port name was provided. In such case,
///     port selection is skipped and we just hold on until the port is created
///     (meaning the sniffer is plugged).
#[derive(Debug)]
pub(crate) struct WaitForPortEvent {
    pub context: Context,
}

// SelectPortEvent =============================================================

/// Event fired to trigger the transition to the `SelectPort` state.
///
/// This event can happen under one of the following circumstances:
///
///  1. If the program is started with no specific device path provided.
///  2. If the program is waiting for a specific device and the user cancels
///     the wait by pressing the `ESC` key.
///  3. If the program is in the port selection state and the user does not
///     select any device, to refresh the list of connected devices.
#[derive(Debug)]
pub(crate) struct SelectPortEvent {
    pub context: Context,
}

// PortReadyEvent ==============================================================

/// Event fired when the port we were waiting on has come up or a port was
/// selected from the list of detected ports. Triggers a transition to the
/// `Service` state.
#[derive(Debug)]
pub(crate) struct PortReadyEvent {
    pub context: Context,
}

// PortErrorEvent ==============================================================

/// Event fired from the `Service` state when the port fails or stops
/// delivering data, usually because the sniffer was unplugged. Triggers a
/// transition into the `WaitForPort` state. A file being received at that
/// moment is lost.
#[derive(Debug)]
pub(crate) struct PortErrorEvent {
    pub context: Context,
}

// DoneEvent ===================================================================

/// Event fired from the `Service` state when a dump session completed, or
/// when a stalled session or a storage failure makes going on pointless. It
/// triggers a transition to the `Done` state.
#[derive(Debug)]
pub(crate) struct DoneEvent {
    pub context: Context,
    pub with_errors: bool,
}

// ExitEvent ===================================================================

/// The last event that can be triggered in `macdump` and will result in the
/// event loop terminating with an `exit status`, handing back the control to
/// the original caller that started the event loop.
#[derive(Debug)]
pub(crate) struct ExitEvent {
    pub context: Context,
    pub with_error: bool,
}

// Events enum ==================================================================

/// Events that can be triggered within the dump server state machine.
///
/// Each possible value holds an `event`, which in turn holds the data passed
/// by the origin state for use by the target state.
#[derive(Debug)]
pub(crate) enum Event {
    WaitForPort(WaitForPortEvent),
    SelectPort(SelectPortEvent),
    PortReady(PortReadyEvent),
    PortError(PortErrorEvent),
    Done(DoneEvent),
    Exit(ExitEvent),
}
