//! Settings related to the serial port and to the dump receiver.
//!
//! Use the [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values.

use std::{path::PathBuf, time::Duration};

pub use serialport::{DataBits, FlowControl, Parity, StopBits};

use crate::dump_protocol::Validation;

// =============================================================================
// Public Interface
// =============================================================================

/// Groups all settings used by `macdump` and acts as a
/// [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for the settings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// The port name, usually the device path.
    pub path: Option<String>,
    /// The baud rate in symbols-per-second.
    pub baud_rate: u32,
    /// Number of bits used to represent a character sent on the line.
    pub data_bits: DataBits,
    /// The type of signalling to use for controlling data transfer.
    pub flow_control: FlowControl,
    /// The type of parity to use for error checking.
    pub parity: Parity,
    /// Number of bits to use to signal the end of a character.
    pub stop_bits: StopBits,
    /// How long a single read on the port may block before giving up. Short
    /// enough to notice stalls, long enough to not spin.
    pub read_timeout: Duration,

    /// Directory where received files are written. Created if absent.
    pub output_dir: PathBuf,
    /// When `false`, `macdump` terminates after the first complete dump
    /// session; otherwise it goes back to waiting for the next one.
    pub keep_listening: bool,
    /// Maximum time without any line while a dump session is active. When
    /// exceeded the session is reported as stalled. No limit when `None`.
    pub idle_timeout: Option<Duration>,
    /// Whether declared file sizes are enforced.
    pub validation: Validation,

    /// Restrict creation of `Settings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}

/// The builder for the `Settings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// let settings = macdump::SettingsBuilder::new()
///     .path("/dev/ttyUSB0")
///     .output_dir("./dump")
///     .finalize();
/// assert_eq!(settings.baud_rate, 115_200);
/// ```
pub struct SettingsBuilder {
    settings: Settings,
}
impl SettingsBuilder {
    /// Start building the settings using default values and no path for the
    /// port.
    pub fn new() -> Self {
        SettingsBuilder {
            settings: Settings {
                path: None,
                baud_rate: 115_200,
                data_bits: DataBits::Eight,
                flow_control: FlowControl::None,
                parity: Parity::None,
                stop_bits: StopBits::One,
                read_timeout: Duration::from_secs(1),
                output_dir: PathBuf::from("./dump"),
                keep_listening: false,
                idle_timeout: None,
                validation: Validation::Lenient,
                _private_use_builder: (),
            },
        }
    }

    /// Set the path to the serial port
    pub fn path<'a>(mut self, path: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.path = Some(path.into().as_ref().to_owned());
        self
    }

    /// Set the baud rate in symbols-per-second
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.settings.baud_rate = baud_rate;
        self
    }

    /// Set the number of bits used to represent a character sent on the line
    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.settings.data_bits = data_bits;
        self
    }

    /// Set the type of signalling to use for controlling data transfer
    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.settings.flow_control = flow_control;
        self
    }

    /// Set the type of parity to use for error checking
    pub fn parity(mut self, parity: Parity) -> Self {
        self.settings.parity = parity;
        self
    }

    /// Set the number of bits to use to signal the end of a character
    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.settings.stop_bits = stop_bits;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.settings.read_timeout = read_timeout;
        self
    }

    /// Set the directory where received files are written
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.settings.output_dir = output_dir.into();
        self
    }

    /// Keep waiting for new dump sessions after one completes
    pub fn keep_listening(mut self, keep_listening: bool) -> Self {
        self.settings.keep_listening = keep_listening;
        self
    }

    /// Report an active session as stalled after this long without data
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.settings.idle_timeout = Some(idle_timeout);
        self
    }

    pub fn validation(mut self, validation: Validation) -> Self {
        self.settings.validation = validation;
        self
    }

    pub fn finalize(self) -> Settings {
        self.settings
    }
}
impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        Settings {
            path: None,
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            read_timeout: Duration::from_secs(1),
            output_dir: PathBuf::from("./dump"),
            keep_listening: false,
            idle_timeout: None,
            validation: Validation::Lenient,
            _private_use_builder: (),
        }
    )
}

#[test]
fn path() {
    let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
    assert_eq!(settings.path.unwrap(), "/dev/ttyUSB0");
}

#[test]
fn baud_rate() {
    let baud_rate = 230_400;
    let settings = SettingsBuilder::new().baud_rate(baud_rate).finalize();
    assert_eq!(settings.baud_rate, baud_rate);
}

#[test]
fn data_bits() {
    let data_bits = DataBits::Seven;
    let settings = SettingsBuilder::new().data_bits(data_bits).finalize();
    assert_eq!(settings.data_bits, data_bits);
}

#[test]
fn flow_control() {
    let flow_control = FlowControl::Hardware;
    let settings = SettingsBuilder::new().flow_control(flow_control).finalize();
    assert_eq!(settings.flow_control, flow_control);
}

#[test]
fn stop_bits() {
    let stop_bits = StopBits::Two;
    let settings = SettingsBuilder::new().stop_bits(stop_bits).finalize();
    assert_eq!(settings.stop_bits, stop_bits);
}

#[test]
fn parity() {
    let parity = Parity::Even;
    let settings = SettingsBuilder::new().parity(parity).finalize();
    assert_eq!(settings.parity, parity);
}

#[test]
fn output_dir() {
    let settings = SettingsBuilder::new().output_dir("/tmp/macs").finalize();
    assert_eq!(settings.output_dir, PathBuf::from("/tmp/macs"));
}

#[test]
fn keep_listening() {
    let settings = SettingsBuilder::new().keep_listening(true).finalize();
    assert!(settings.keep_listening);
}

#[test]
fn idle_timeout() {
    let settings = SettingsBuilder::new()
        .idle_timeout(Duration::from_secs(30))
        .finalize();
    assert_eq!(settings.idle_timeout, Some(Duration::from_secs(30)));
}

#[test]
fn validation() {
    let settings = SettingsBuilder::new()
        .validation(Validation::Strict)
        .finalize();
    assert_eq!(settings.validation, Validation::Strict);
}
