//! Non-blocking keyboard polling while waiting on a device.

use std::io::stdout;
use std::{process, time::Duration};

use crossterm::{
    cursor::{Hide, MoveToColumn, Show},
    event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
    Result,
};

/// Wait up to `timeout` for a key press and tell whether it was `Esc`.
///
/// The terminal is in raw mode only for the duration of the poll. As raw mode
/// swallows the `Ctrl+C` signal, that key combination is handled here by
/// terminating the process.
pub(crate) fn poll_escape(timeout: Duration) -> Result<bool> {
    enable_raw_mode()?;
    execute!(stdout(), Hide)?;
    let ready = poll(timeout);
    execute!(stdout(), MoveToColumn(0), Show)?;
    disable_raw_mode()?;

    if !ready? {
        return Ok(false);
    }

    // `read()` won't block after `poll` returned `Ok(true)`
    match read()? {
        Event::Key(KeyEvent {
            code: KeyCode::Esc, ..
        }) => Ok(true),
        Event::Key(KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            code: KeyCode::Char('c'),
        }) => {
            println!("\n[MD] 🛑 Aborted by user");
            process::exit(130);
        }
        _ => Ok(false),
    }
}
