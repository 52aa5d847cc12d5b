//! States for the `macdump` dump server state machine.
//!
//! This modules is private and restricted to the
//! [`dump_server`](crate::dump_server) scope. The public interface of the state
//! machine is provided by [`dump_server`](crate::dump_server).
//!
//! ```ignore
//! use super::states::*;
//! ```
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use console::style;
use log::{error, info};

use crate::errors::{Error, Result};
use crate::settings::Settings;
use crate::summary::Summary;
use crate::transfer::{Outcome, Transfer};
use crate::utils::{self, DirectorySink, SerialLines};

use super::events::*;

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Trait adding the ability for a state to be `run` after a transition into it.
pub(crate) trait Runnable {
    /// A state implements this method so it can be `run` after the state
    /// machine transitions into it.
    ///
    /// During this call, the state can do any work that needs to be done and
    /// when finished, requests transition to a new state by returning the
    /// appropriate `event`. The `event` is then consumed to create the new
    /// `state` using the corresponding `From` trait implementation.
    fn run(&mut self, context: &Context) -> Event;
}

// Init State ==================================================================

/// Represents the initial state of the dump server state machine.
///
/// From the `InitState`, the state machine can evolve via the following
/// transitions:
///
///  * **`WaitForPortEvent` => `WaitForPortState`** when a specific device path
///    was provided in the settings,
///  * **`SelectPortEvent` => `SelectPortState`** when no device path was
///    provided in the settings.
#[derive(Debug)]
pub(crate) struct InitState {}
impl Runnable for InitState {
    fn run(&mut self, context: &Context) -> Event {
        info!("=> Init");
        match context.settings.path {
            Some(_) => Event::WaitForPort(WaitForPortEvent {
                context: context.clone(),
            }),
            None => Event::SelectPort(SelectPortEvent {
                context: context.clone(),
            }),
        }
    }
}

// WaitForPortState ============================================================

/// Waits for the configured device to show up. The user can cancel the wait
/// with `ESC` to pick another port instead.
#[derive(Debug)]
pub(crate) struct WaitForPortState {}
impl Runnable for WaitForPortState {
    fn run(&mut self, context: &Context) -> Event {
        info!("=> WaitForPort");
        let canceled = match &context.settings.path {
            Some(path) => utils::wait_for_port(path),
            None => true,
        };
        if canceled {
            Event::SelectPort(SelectPortEvent {
                context: context.clone(),
            })
        } else {
            Event::PortReady(PortReadyEvent {
                context: context.clone(),
            })
        }
    }
}

// SelectPortState =============================================================

/// Presents the connected serial devices for the user to pick one.
#[derive(Debug)]
pub(crate) struct SelectPortState {}
impl Runnable for SelectPortState {
    fn run(&mut self, context: &Context) -> Event {
        info!("=> SelectPort");
        match utils::select_port() {
            // Remember the selection so that a reconnection waits on the same
            // device.
            Some(path) => {
                let mut context = context.clone();
                context.settings.path = Some(path);
                Event::PortReady(PortReadyEvent { context })
            }
            None => Event::SelectPort(SelectPortEvent {
                context: context.clone(),
            }),
        }
    }
}

// ServiceState ================================================================

/// Opens the port and runs the receive loop, writing every completed file to
/// the output directory.
///
///  * **`DoneEvent` => `DoneState`** when a dump session completed, or on a
///    stalled session or a storage failure,
///  * **`PortErrorEvent` => `WaitForPortState`** when the port could not be
///    opened, failed or was closed.
#[derive(Debug)]
pub(crate) struct ServiceState {}
impl Runnable for ServiceState {
    fn run(&mut self, context: &Context) -> Event {
        info!("=> Service");

        let mut summary = context.summary;
        let outcome = receive(&context.settings, &mut summary);
        let context = Context {
            settings: context.settings.clone(),
            summary,
        };

        match outcome {
            // Normal termination -> we're done.
            Ok(Outcome::SessionComplete(_)) => Event::Done(DoneEvent {
                context,
                with_errors: false,
            }),
            Ok(Outcome::Exhausted) => {
                info!("the serial port stopped delivering data");
                Event::PortError(PortErrorEvent { context })
            }
            // A port error -> wait for the device to be ready again
            Err(Error::Io(e)) => {
                info!("error: {}", e);
                println!("{}", style("[MD] 🔌 Serial connection lost").yellow());
                Event::PortError(PortErrorEvent { context })
            }
            Err(Error::Serial(e)) => {
                info!("error: {}", e);
                Event::PortError(PortErrorEvent { context })
            }
            Err(e) => {
                error!("{}", e);
                println!("{}", style(format!("[MD] 💥 {}", e)).red());
                Event::Done(DoneEvent {
                    context,
                    with_errors: true,
                })
            }
        }
    }
}

// Done State ==================================================================

/// Reached when `macdump` is about to terminate (normally or abnormally).
///
/// Prints the totals of the run, then triggers the [`ExitEvent`] to terminate
/// the event loop.
#[derive(Debug, Copy, Clone)]
pub(crate) struct DoneState {
    /// When `true`, indicates an abnormal completion caused by an error.
    pub with_error: bool,
    /// When `true` instructs the state machine to exit its event loop.
    pub should_exit: bool,
}
impl Runnable for DoneState {
    fn run(&mut self, context: &Context) -> Event {
        info!(
            "=> Done with{}errors",
            if self.with_error { " " } else { " no " }
        );
        println!(
            "[MD] 📦 Received {}, saved to {}",
            context.summary,
            style(context.settings.output_dir.display()).cyan()
        );
        Event::Exit(ExitEvent {
            context: context.clone(),
            with_error: self.with_error,
        })
    }
}

// =============================================================================
// Private stuff
// =============================================================================

fn receive(settings: &Settings, summary: &mut Summary) -> Result<Outcome> {
    let port = utils::open_and_setup_port(settings)?;
    println!(
        "[MD] 📡 Listening on {}, files will be saved to {}",
        style(settings.path.as_deref().unwrap_or_default()).green(),
        style(settings.output_dir.display()).cyan()
    );

    let mut lines = SerialLines::new(port);
    let mut sink = DirectorySink::new(&settings.output_dir);
    let mut transfer = Transfer::new(settings).with_progress();
    transfer.run(&mut lines, &mut sink, summary)
}
