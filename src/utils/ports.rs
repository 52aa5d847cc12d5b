//! Serial port device discovery, selection and opening.

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use serialport::{available_ports, SerialPort, SerialPortType};

use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::Duration,
};

use crate::{errors::Result, utils::poll_escape, Settings};

//==============================================================================
// Public Interface
//==============================================================================

/// Let the user pick one of the connected serial ports.
///
/// Waits for at least one port to show up, then presents the list. Returns
/// `None` when the user cancels the selection so that the caller can refresh
/// the list and ask again, e.g. after plugging the sniffer.
pub(crate) fn select_port() -> Option<String> {
    let waiting_period: u64 = 1;
    let pb = spinner();

    // Avoid cursor flicker during the waiting
    let _ = Term::stdout().hide_cursor();
    let mut attempt: u64 = 1;
    let found_ports = loop {
        let ports = enumerate_serial_ports();
        if !ports.is_empty() {
            pb.finish_with_message("Select the port the sniffer is connected to:");
            break ports;
        }
        pb.set_message(format!(
            "[{:03}s] ⌛ Waiting for a serial device to be connected...",
            style(attempt * waiting_period).dim(),
        ));
        attempt += 1;
        thread::sleep(Duration::from_secs(waiting_period));
    };
    let _ = Term::stdout().show_cursor();

    let selection = select_port_interactive(&found_ports);
    match &selection {
        Some(path) => {
            pb.finish_with_message(format!("👍 Serial port {} is ready", style(path).green()));
        }
        None => {
            pb.finish_with_message("❌ Selection canceled -> refreshing...");
        }
    }
    selection
}

/// Wait until a device with the given path shows up in the system. While
/// waiting, the user can cancel by pressing the `ESC` key.
///
/// Returns `true` when the wait was cancelled.
pub(crate) fn wait_for_port(path: &str) -> bool {
    let waiting_period: u64 = 2;
    let pb = spinner();
    pb.set_message(format!(
        "⏳ Waiting for {} to be ready (ESC to cancel)...",
        style(path).cyan()
    ));

    // The main thread enumerates the ports while a second one listens for the
    // `ESC` key. Each side tells the other when it is done over its own
    // channel.
    let (cancel_tx, cancel_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();

    let cancelation_thread = thread::spawn(move || {
        watch_escape(poll_escape, Duration::from_millis(500), &done_rx, &cancel_tx)
    });

    let mut cancelled = false;
    let mut attempt: u64 = 1;
    loop {
        let found_ports = enumerate_serial_ports();
        if found_ports.iter().any(|port| port_path(port) == path) {
            let _ = done_tx.send(());
            pb.finish_with_message(format!("👍 Serial port {} is ready", style(path).green()));
            break;
        }

        let waited = attempt * waiting_period;
        pb.set_message(format!(
            "[{:03}s {}] ⏳ Waiting for {} to be ready (ESC to cancel)...",
            style(waited).dim(),
            found_ports.len(),
            style(path).cyan()
        ));

        match cancel_rx.recv_timeout(Duration::from_secs(waiting_period)) {
            Ok(()) => {
                pb.finish_with_message(format!(
                    "❌ Waiting on port {} canceled after {} seconds",
                    style(path).cyan(),
                    style(waited).dim()
                ));
                cancelled = true;
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                cancelled = true;
                break;
            }
        }
        attempt += 1;
    }

    if cancelation_thread.join().is_err() {
        debug!("the ESC listener thread panicked");
    }
    cancelled
}

/// Open the port described by `settings`, retrying a few times as a freshly
/// plugged USB serial adapter may not accept connections right away.
pub(crate) fn open_and_setup_port(settings: &Settings) -> Result<Box<dyn SerialPort>> {
    use retry::{delay, retry_with_index};

    let path = settings.path.clone().unwrap_or_default();
    let result = retry_with_index(
        delay::Fixed::from_millis(1000).take(4),
        |index| -> std::result::Result<Box<dyn SerialPort>, serialport::Error> {
            debug!("Trying to connect to {} ({})", path, index);
            serialport::new(&path, settings.baud_rate)
                .data_bits(settings.data_bits)
                .stop_bits(settings.stop_bits)
                .parity(settings.parity)
                .flow_control(settings.flow_control)
                .timeout(settings.read_timeout)
                .open()
        },
    );

    match result {
        Ok(mut port) => {
            // Apply the settings again, some drivers ignore them on `open`.
            port.set_baud_rate(settings.baud_rate)?;
            port.set_data_bits(settings.data_bits)?;
            port.set_stop_bits(settings.stop_bits)?;
            port.set_parity(settings.parity)?;
            port.set_flow_control(settings.flow_control)?;
            port.set_timeout(settings.read_timeout)?;

            info!("Connected to {} at {} baud", path, port.baud_rate()?);
            debug!("data_bits    : {:#?}", port.data_bits()?);
            debug!("stop_bits    : {:#?}", port.stop_bits()?);
            debug!("parity       : {:#?}", port.parity()?);
            debug!("flow control : {:#?}", port.flow_control()?);
            Ok(port)
        }
        Err(retry::Error::Operation {
            error,
            total_delay,
            tries,
        }) => {
            info!(
                "Failed to open the port after {:?} and {} tries: {}",
                total_delay, tries, error,
            );
            Err(error.into())
        }
        Err(retry::Error::Internal(message)) => {
            info!("Internal retry error while opening port: {}", message);
            Err(serialport::Error::new(
                serialport::ErrorKind::Unknown,
                "internal error while retrying to open the port",
            )
            .into())
        }
    }
}

//==============================================================================
// Private stuff
//==============================================================================

/// Listen for `ESC` until `done` is signalled, and report it over `cancel`.
///
/// Without a usable terminal `poll` fails right away; the watcher then waits a
/// `period` before trying again.
fn watch_escape<P>(mut poll: P, period: Duration, done: &Receiver<()>, cancel: &Sender<()>)
where
    P: FnMut(Duration) -> crossterm::Result<bool>,
{
    let mut reported = false;
    loop {
        if done.try_recv().is_ok() {
            break;
        }
        match poll(period) {
            Ok(true) => {
                // The receiving side may already be gone if the port just
                // showed up, there is nothing left to cancel then.
                let _ = cancel.send(());
                break;
            }
            Ok(false) => {}
            Err(e) => {
                if !reported {
                    debug!("cannot poll the keyboard: {}", e);
                    reported = true;
                }
                thread::sleep(period);
            }
        }
    }
}

/// The device path of an entry listed by [`enumerate_serial_ports`].
fn port_path(entry: &str) -> &str {
    entry.split(": (").next().unwrap_or(entry)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(120);
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"])
            .template("[MD] {spinner:.blue} {msg}"),
    );
    pb
}

/// Enumerates the serial devices of the system. USB adapters are listed with
/// their manufacturer and product to make the right one easy to spot.
fn enumerate_serial_ports() -> Vec<String> {
    match available_ports() {
        Ok(ports) => ports
            .into_iter()
            .map(|p| match p.port_type {
                SerialPortType::UsbPort(info) => format!(
                    "{}: ({} / {})",
                    p.port_name,
                    info.manufacturer.as_ref().map_or("", String::as_str),
                    info.product.as_ref().map_or("", String::as_str)
                ),
                // Other devices, such as virtual ports, are useful for testing
                _ => p.port_name,
            })
            .collect(),
        Err(ref e) => {
            info!("error: {}", e.to_string());
            vec![]
        }
    }
}

fn select_port_interactive(ports: &[String]) -> Option<String> {
    use dialoguer::{theme::ColorfulTheme, Select};

    let term = Term::buffered_stderr();
    let theme = ColorfulTheme::default();

    let mut select = Select::with_theme(&theme);
    for item in ports {
        select.item(item);
    }

    match select.default(0).interact_on_opt(&term) {
        Ok(Some(index)) => ports
            .get(index)
            .map(|port| port_path(port).to_owned()),
        Ok(None) => None,
        Err(ref e) => {
            info!("error: {}", e.to_string());
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn port_path_strips_usb_description() {
        assert_eq!(
            port_path("/dev/ttyUSB1: (Silicon Labs / CP2102 USB to UART)"),
            "/dev/ttyUSB1"
        );
        assert_eq!(port_path("/dev/ttyS0"), "/dev/ttyS0");
    }

    #[test]
    fn waited_port_must_match_exactly() {
        let found = vec!["/dev/ttyUSB10: (FTDI / FT232R)".to_owned()];
        assert!(!found.iter().any(|port| port_path(port) == "/dev/ttyUSB1"));
        assert!(found.iter().any(|port| port_path(port) == "/dev/ttyUSB10"));
    }

    #[test]
    fn escape_watcher_reports_escape() {
        let (cancel_tx, cancel_rx) = mpsc::channel();
        let (_done_tx, done_rx) = mpsc::channel::<()>();

        watch_escape(|_| Ok(true), Duration::from_millis(1), &done_rx, &cancel_tx);

        assert!(cancel_rx.try_recv().is_ok());
    }

    #[test]
    fn escape_watcher_backs_off_without_terminal() {
        let (cancel_tx, cancel_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);

        let watcher = thread::spawn(move || {
            watch_escape(
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(io::Error::new(io::ErrorKind::Other, "not a tty").into())
                },
                Duration::from_millis(20),
                &done_rx,
                &cancel_tx,
            )
        });
        thread::sleep(Duration::from_millis(200));
        done_tx.send(()).unwrap();
        watcher.join().unwrap();

        // One attempt per period, not a busy loop.
        assert!(polls.load(Ordering::SeqCst) <= 20);
        assert!(cancel_rx.try_recv().is_err());
    }
}
