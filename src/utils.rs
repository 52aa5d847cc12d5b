//! Collaborators around the dump receiver: serial ports, line splitting and
//! file storage.

mod keyboard;
mod lines;
mod ports;
mod sink;

pub(crate) use keyboard::*;
pub use lines::{LineSource, SerialLines};
pub(crate) use ports::{open_and_setup_port, select_port, wait_for_port};
pub use sink::{DirectorySink, FileSink};
