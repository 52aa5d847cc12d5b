//! Macdump receives the storage dumps of a MAC address sniffer streamed over
//! a serial connection, and turns the binary MAC lists into text.
//!
//! The sniffer firmware dumps its files as hex-encoded `CHUNK:` lines framed
//! by sentinel lines (see [`dump_protocol`]). Macdump listens on the serial
//! port, reconstructs every file of the dump and writes it into an output
//! directory. The companion [`mac_convert`] module lists the MAC addresses of
//! the received dumps in text files.
//!
//! Macdump offers interactive selection menus to chose the serial port to be
//! used, waits for the sniffer to be plugged, and goes back to waiting if it
//! is unplugged in the middle of a dump, all without restarting.
//!
//! Both the dump receiver and the device management are implemented as state
//! machines. State machines are implemented in terms of **states** and
//! **transitions** between them with the following characteristics:
//!
//! * Can only be in one state at any time.
//! * Each state can have its own associated data if needed.
//! * It is possible to have some shared data between **all** states.
//! * Transitions between states are triggered via typed **events** and follow
//!   defined semantics.
//! * Only explicitly defined transitions should be permitted and as many errors
//!   should be detected at **compile-time**.
//! * Transitioning from one state to another consumes the original state and
//!   renders it unusable. Any transition back to that state would create a new
//!   state.
//! * Data can be transferred from one state to the next by attaching it to the
//!   transition event. Such data is statically defined as part of the event
//!   type.
//!
//! The implementation of state transitions leverages `rust`'s `From` and `Into`
//! pattern. Only transitions for which the `From` trait is implemented are
//! authorized and any other transition would be detected at compile-time as an
//! error.

pub mod dump_protocol;
mod dump_server;
mod errors;
pub mod mac_convert;
mod settings;
mod summary;
mod transfer;
mod utils;

pub use dump_protocol::{
    decode_pairs, DumpReceiver, Emission, FileArtifact, Phase, SessionReport, Validation,
};
pub use dump_server::{factory, DeviceManager, DumpServer};
pub use errors::{Error, Result};
pub use settings::{Settings, SettingsBuilder};
pub use summary::Summary;
pub use transfer::{Outcome, Transfer};
pub use utils::{DirectorySink, FileSink, LineSource, SerialLines};
