//! `macdump` dump server: serial device lifecycle around the dump receiver.
//!
//! **Example** - Executing the state machine event loop:
//! ```no_run
//! use macdump::{self as md, DeviceManager};
//!
//! let settings = md::SettingsBuilder::default()
//!     .path("/dev/ttyUSB0")
//!     .output_dir("./dump")
//!     .finalize();
//! let mut server = md::factory(settings);
//! let status = server.run(); // status code returned after the `Exit` event
//! std::process::exit(status.into());
//! ```

mod events;
mod state_machine;
mod states;

pub use state_machine::{factory, DeviceManager, DumpServer};
