//! Errors surfaced by the transport, sink and converter collaborators.
//!
//! The dump receiver itself never fails: malformed or out-of-order directives
//! are ignored. Everything that can go wrong lives around it.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    /// A session was active but no line arrived within the idle timeout.
    #[error("session stalled: no data received for {0:?}")]
    Stalled(Duration),
    /// A completed file could not be stored.
    #[error("cannot store `{name}`: {source}")]
    Sink {
        name: String,
        #[source]
        source: Box<Error>,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
