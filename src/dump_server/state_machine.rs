//! Serial device selection and dump server state management.
//!
//! `macdump` listens on a serial port which can be specified at the command
//! line or selected out of the list of available ports on the system. The
//! sniffer is usually powered over the same USB cable, so it comes and goes
//! with the port: we need to wait for the device when it is not there yet, and
//! to go back to waiting when it is unplugged in the middle of a dump.
//!
//! The following state diagram summarizes the different states and transitions
//! `macdump` goes through:
//!
//! ```text
//!                            START
//!                              |
//!                              v
//!                          .-------.
//!                          | Init  |
//!                          '-------'
//!                              |
//!                              v
//!                    no  .----------.  yes
//!                  .----( port_name? )----.
//!      .-----.     |     '----------'     |
//!      |     |     v                      v
//!      |    .------------.   ESC   .-------------.
//!      '--->| SelectPort |<--------| WaitForPort |<---.
//!           '------------'         '-------------'    |
//!              |                          |           |
//!             port                      port          |
//!             ready                     ready         |
//!              |       ******************   |        port
//!              '------>*    Service     *<--'        error
//!                      * Dump Receiver  *-------------'
//!                      ******************
//!                               |
//!                        session complete
//!                               v
//!                          .--------.
//!                          |  Done  |--> END
//!                          '--------'
//! ```

use super::events::*;
use super::states::*;
use crate::settings::Settings;
use crate::summary::Summary;

// =============================================================================
// Public Interface
// =============================================================================

pub trait DeviceManager {
    fn run(&mut self) -> i8;
}

/// Encapsulate the state machine creation and event loop to provide a concise
/// and simple public interface to the module users. Get one by calling the
/// `factory()` function.
pub struct DumpServer {
    sm: DumpServerStates,
}
impl DeviceManager for DumpServer {
    /// The dump server event loop runs until the `Done` state is reached and
    /// its `should_exit` flag is set. At such point, the event loop terminates
    /// and returns an exit code indicating no errors when equal to **`0`**;
    /// otherwise a termination with error.
    ///
    /// The returned status code could be used as an exit code from `macdump`.
    fn run(&mut self) -> i8 {
        loop {
            self.sm = self.sm.step();
            if let DumpServerStates::Done(sm) = &self.sm {
                if sm.state.should_exit {
                    return if sm.state.with_error { 1 } else { 0 };
                }
            }
        }
    }
}

/// Factory function for the dump server state machine. Use it to get an
/// instance of the state machine, which you can run by invoking its `run()`
/// method.
pub fn factory(settings: Settings) -> DumpServer {
    DumpServer {
        sm: DumpServerStates::Init(DumpServerStateMachine::new(settings)),
    }
}

// =============================================================================
// Private stuff
// =============================================================================

// -----------------------------------------------------------------------------
// The State Machine
// -----------------------------------------------------------------------------

/// The state machine implementing `macdump`'s management of the serial device
/// lifecycle.
///
/// The generic type holding the current state sits next to the data shared by
/// all states (settings and the totals of the run). It's also nicer when
/// debugging to see the state machine and the current state it is holding at
/// any time.
#[derive(Debug)]
struct DumpServerStateMachine<S: Runnable> {
    context: Context,
    state: S,
}
impl<S: Runnable> DumpServerStateMachine<S> {
    fn run(&mut self) -> Event {
        self.state.run(&self.context)
    }
}

/// The dump server state machine starts in the `InitState`.
impl DumpServerStateMachine<InitState> {
    fn new(settings: Settings) -> Self {
        DumpServerStateMachine {
            context: Context {
                settings,
                summary: Summary::default(),
            },
            state: InitState {},
        }
    }
}

/// Wraps the state machine and its various states into a simple enum, which can
/// also be used for pattern matching during state transitions.
enum DumpServerStates {
    Init(DumpServerStateMachine<InitState>),
    WaitForPort(DumpServerStateMachine<WaitForPortState>),
    SelectPort(DumpServerStateMachine<SelectPortState>),
    Service(DumpServerStateMachine<ServiceState>),
    Done(DumpServerStateMachine<DoneState>),
}
impl DumpServerStates {
    fn step(&mut self) -> Self {
        match self {
            DumpServerStates::Init(sm) => {
                let event = sm.run();
                match event {
                    Event::WaitForPort(ev) => DumpServerStates::WaitForPort(ev.into()),
                    Event::SelectPort(ev) => DumpServerStates::SelectPort(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            DumpServerStates::WaitForPort(sm) => {
                let event = sm.run();
                match event {
                    Event::PortReady(ev) => DumpServerStates::Service(ev.into()),
                    Event::SelectPort(ev) => DumpServerStates::SelectPort(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            DumpServerStates::SelectPort(sm) => {
                let event = sm.run();
                match event {
                    Event::SelectPort(ev) => DumpServerStates::SelectPort(ev.into()),
                    Event::PortReady(ev) => DumpServerStates::Service(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            DumpServerStates::Service(sm) => {
                let event = sm.run();
                match event {
                    Event::Done(ev) => DumpServerStates::Done(ev.into()),
                    Event::PortError(ev) => DumpServerStates::WaitForPort(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            DumpServerStates::Done(sm) => {
                let event = sm.run();
                match event {
                    Event::Exit(ev) => DumpServerStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<WaitForPortEvent> for DumpServerStateMachine<WaitForPortState> {
    fn from(event: WaitForPortEvent) -> DumpServerStateMachine<WaitForPortState> {
        DumpServerStateMachine {
            context: event.context,
            state: WaitForPortState {},
        }
    }
}
impl From<PortErrorEvent> for DumpServerStateMachine<WaitForPortState> {
    fn from(event: PortErrorEvent) -> DumpServerStateMachine<WaitForPortState> {
        DumpServerStateMachine {
            context: event.context,
            state: WaitForPortState {},
        }
    }
}

impl From<SelectPortEvent> for DumpServerStateMachine<SelectPortState> {
    fn from(event: SelectPortEvent) -> DumpServerStateMachine<SelectPortState> {
        DumpServerStateMachine {
            context: event.context,
            state: SelectPortState {},
        }
    }
}

impl From<PortReadyEvent> for DumpServerStateMachine<ServiceState> {
    fn from(event: PortReadyEvent) -> DumpServerStateMachine<ServiceState> {
        DumpServerStateMachine {
            context: event.context,
            state: ServiceState {},
        }
    }
}

impl From<DoneEvent> for DumpServerStateMachine<DoneState> {
    fn from(event: DoneEvent) -> DumpServerStateMachine<DoneState> {
        DumpServerStateMachine {
            context: event.context,
            state: DoneState {
                with_error: event.with_errors,
                should_exit: false,
            },
        }
    }
}
impl From<ExitEvent> for DumpServerStateMachine<DoneState> {
    fn from(event: ExitEvent) -> DumpServerStateMachine<DoneState> {
        DumpServerStateMachine {
            context: event.context,
            state: DoneState {
                with_error: event.with_error,
                should_exit: true,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettingsBuilder;

    #[test]
    fn init_waits_for_a_named_port() {
        let mut sm = DumpServerStates::Init(DumpServerStateMachine::new(
            SettingsBuilder::new().path("/dev/ttyUSB0").finalize(),
        ));
        assert!(matches!(sm.step(), DumpServerStates::WaitForPort(_)));
    }

    #[test]
    fn done_exits_with_error_status() {
        let settings = SettingsBuilder::new().finalize();
        let mut server = DumpServer {
            sm: DumpServerStates::Done(
                DoneEvent {
                    context: Context {
                        settings,
                        summary: Summary::default(),
                    },
                    with_errors: true,
                }
                .into(),
            ),
        };
        assert_eq!(server.run(), 1);
    }
}
