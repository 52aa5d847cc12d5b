//! The receive loop: pulls lines from a [`LineSource`], feeds them to the
//! [`DumpReceiver`] and hands completed files to a [`FileSink`].
//!
//! Lines are processed strictly one at a time, in arrival order. The only
//! place where the loop waits is inside [`LineSource::next_line`].

use std::time::{Duration, Instant};

use console::style;
use hexplay::HexViewBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, log_enabled, warn, Level::Debug};

use crate::dump_protocol::{DumpReceiver, Emission, FileArtifact, Phase, SessionReport};
use crate::errors::{Error, Result};
use crate::summary::Summary;
use crate::utils::{FileSink, LineSource};
use crate::Settings;

/// Why [`Transfer::run`] returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A dump session completed and the transfer was not asked to keep
    /// listening.
    SessionComplete(SessionReport),
    /// The line source has nothing more to give. Any file being received at
    /// that moment is lost.
    Exhausted,
}

/// Drives one [`DumpReceiver`] over a line source.
pub struct Transfer {
    receiver: DumpReceiver,
    idle_timeout: Option<Duration>,
    keep_listening: bool,
    progress: ProgressBar,
    interactive: bool,
}
impl Transfer {
    pub fn new(settings: &Settings) -> Self {
        Transfer {
            receiver: DumpReceiver::with_validation(settings.validation),
            idle_timeout: settings.idle_timeout,
            keep_listening: settings.keep_listening,
            progress: ProgressBar::hidden(),
            interactive: false,
        }
    }

    /// Show a spinner with the number of bytes received for the open file.
    pub fn with_progress(mut self) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(120);
        pb.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"])
                .template("[MD] {spinner:.blue} {msg}"),
        );
        pb.set_message("⌛ Waiting for a dump (MAC_SNIFF_DUMP_BEGIN)...");
        self.progress = pb;
        self.interactive = true;
        self
    }

    pub fn receiver(&self) -> &DumpReceiver {
        &self.receiver
    }

    /// Run the receive loop until a session completes (unless keeping on
    /// listening), the source is exhausted, or something fails.
    ///
    /// Every completed file is written to `sink` and recorded in `summary` as
    /// soon as its `FILE_END` is consumed.
    pub fn run<L, K>(&mut self, lines: &mut L, sink: &mut K, summary: &mut Summary) -> Result<Outcome>
    where
        L: LineSource,
        K: FileSink,
    {
        let mut last_activity = Instant::now();
        loop {
            let line = match lines.next_line()? {
                Some(line) => line,
                None => {
                    if self.receiver.in_session() {
                        warn!("line source exhausted in the middle of a dump session");
                    }
                    self.progress.finish_and_clear();
                    return Ok(Outcome::Exhausted);
                }
            };

            if line.is_empty() {
                if let Some(timeout) = self.idle_timeout {
                    if self.receiver.in_session() && last_activity.elapsed() >= timeout {
                        self.receiver.reset();
                        self.progress.finish_and_clear();
                        return Err(Error::Stalled(timeout));
                    }
                }
                continue;
            }
            last_activity = Instant::now();

            match self.receiver.consume(&line) {
                Some(Emission::File(artifact)) => {
                    let path = sink.write(&artifact).map_err(|e| Error::Sink {
                        name: artifact.name.clone(),
                        source: Box::new(e),
                    })?;
                    summary.record_file(&artifact);
                    self.report(format!(
                        "[MD] 💾 Saved {} ({} bytes)",
                        style(path.display()).green(),
                        artifact.bytes.len()
                    ));
                    dump_hex(&artifact);
                }
                Some(Emission::SessionEnd(report)) => {
                    summary.record_session(&report);
                    let marker = if report.is_consistent() {
                        style("✔").green()
                    } else {
                        style("⚠").yellow()
                    };
                    self.report(format!("[MD] {} Transfer completed: {}", marker, report));
                    if !self.keep_listening {
                        self.progress.finish_and_clear();
                        return Ok(Outcome::SessionComplete(report));
                    }
                }
                None => {}
            }
            self.update_progress();
        }
    }

    fn report(&self, message: String) {
        if self.interactive {
            self.progress.println(message);
        } else {
            println!("{}", message);
        }
    }

    fn update_progress(&self) {
        match self.receiver.phase() {
            Phase::Idle => self
                .progress
                .set_message("⌛ Waiting for a dump (MAC_SNIFF_DUMP_BEGIN)..."),
            Phase::InSession => self.progress.set_message("📡 Transfer started"),
            Phase::FileOpen => self.progress.set_message(format!(
                "📥 Receiving ({} bytes)",
                self.receiver.buffered_bytes()
            )),
        }
    }
}

/// Dump the head of a received file in a hex table for debugging.
fn dump_hex(artifact: &FileArtifact) {
    if log_enabled!(Debug) {
        let head = &artifact.bytes[..std::cmp::min(artifact.bytes.len(), 256)];
        let view = HexViewBuilder::new(head)
            .address_offset(0)
            .row_width(16)
            .finish();
        debug!("`{}`:\n{}", artifact.name, view);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettingsBuilder;
    use std::collections::VecDeque;
    use std::io;
    use std::path::PathBuf;

    struct Script(VecDeque<io::Result<String>>);
    impl Script {
        fn new(lines: &[&str]) -> Self {
            Script(lines.iter().map(|l| Ok(l.to_string())).collect())
        }
    }
    impl LineSource for Script {
        fn next_line(&mut self) -> io::Result<Option<String>> {
            self.0.pop_front().transpose()
        }
    }

    #[derive(Default)]
    struct Memory(Vec<FileArtifact>);
    impl FileSink for Memory {
        fn write(&mut self, artifact: &FileArtifact) -> Result<PathBuf> {
            self.0.push(artifact.clone());
            Ok(PathBuf::from(&artifact.name))
        }
    }

    const TWO_FILES: &[&str] = &[
        "MAC_SNIFF_DUMP_BEGIN",
        "NUM_FILES:2",
        "FILE_BEGIN:/spiffs/a.bin",
        "CHUNK:0102",
        "FILE_END",
        "FILE_BEGIN:/spiffs/b.bin",
        "CHUNK:03",
        "FILE_END",
        "MAC_SNIFF_DUMP_END",
    ];

    #[test]
    fn stops_after_first_session() {
        let mut lines = TWO_FILES.to_vec();
        lines.extend_from_slice(TWO_FILES);
        let mut source = Script::new(&lines);
        let mut sink = Memory::default();
        let mut summary = Summary::default();
        let mut transfer = Transfer::new(&SettingsBuilder::new().finalize());

        let outcome = transfer.run(&mut source, &mut sink, &mut summary).unwrap();

        match outcome {
            Outcome::SessionComplete(report) => assert_eq!(report.files_emitted, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.0[0].name, "a.bin");
        assert_eq!(sink.0[0].bytes, vec![1, 2]);
        assert_eq!(sink.0[1].name, "b.bin");
        assert_eq!(sink.0[1].bytes, vec![3]);
        assert_eq!(summary.sessions, 1);
        assert_eq!(source.0.len(), TWO_FILES.len());
    }

    #[test]
    fn keeps_listening_until_exhausted() {
        let mut lines = TWO_FILES.to_vec();
        lines.extend_from_slice(TWO_FILES);
        let mut source = Script::new(&lines);
        let mut sink = Memory::default();
        let mut summary = Summary::default();
        let settings = SettingsBuilder::new().keep_listening(true).finalize();
        let mut transfer = Transfer::new(&settings);

        let outcome = transfer.run(&mut source, &mut sink, &mut summary).unwrap();

        assert_eq!(outcome, Outcome::Exhausted);
        assert_eq!(
            summary,
            Summary {
                files: 4,
                bytes: 6,
                sessions: 2,
                rejected: 0,
            }
        );
    }

    #[test]
    fn idle_session_is_reported_as_stalled() {
        let mut source = Script::new(&["MAC_SNIFF_DUMP_BEGIN", "FILE_BEGIN:a.bin", ""]);
        let settings = SettingsBuilder::new()
            .idle_timeout(Duration::from_secs(0))
            .finalize();
        let mut transfer = Transfer::new(&settings);

        let result = transfer.run(&mut source, &mut Memory::default(), &mut Summary::default());

        assert!(matches!(result, Err(Error::Stalled(_))));
        assert_eq!(transfer.receiver().phase(), Phase::Idle);
    }

    #[test]
    fn idle_outside_of_session_is_not_a_stall() {
        let mut source = Script::new(&["", "", "boot messages", ""]);
        let settings = SettingsBuilder::new()
            .idle_timeout(Duration::from_secs(0))
            .finalize();
        let mut transfer = Transfer::new(&settings);

        let outcome = transfer
            .run(&mut source, &mut Memory::default(), &mut Summary::default())
            .unwrap();

        assert_eq!(outcome, Outcome::Exhausted);
    }

    #[test]
    fn transport_error_is_propagated() {
        let mut source = Script(
            vec![
                Ok("MAC_SNIFF_DUMP_BEGIN".to_owned()),
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")),
            ]
            .into_iter()
            .collect(),
        );
        let mut transfer = Transfer::new(&SettingsBuilder::new().finalize());

        let result = transfer.run(&mut source, &mut Memory::default(), &mut Summary::default());

        assert!(matches!(result, Err(Error::Io(_))));
    }

    struct Full;
    impl FileSink for Full {
        fn write(&mut self, _artifact: &FileArtifact) -> Result<PathBuf> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device").into())
        }
    }

    #[test]
    fn sink_failure_names_the_file() {
        let mut source = Script::new(TWO_FILES);
        let mut transfer = Transfer::new(&SettingsBuilder::new().finalize());

        let result = transfer.run(&mut source, &mut Full, &mut Summary::default());

        match result {
            Err(Error::Sink { name, .. }) => assert_eq!(name, "a.bin"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
