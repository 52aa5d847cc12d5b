//! Totals over a whole run of the receiver.

use std::fmt;

use crate::dump_protocol::{FileArtifact, SessionReport};

/// Counts the files written and the sessions completed during a run. Purely
/// observational: nothing in the protocol depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: u64,
    pub bytes: u64,
    pub sessions: u64,
    /// Files dropped by strict size validation.
    pub rejected: u64,
}
impl Summary {
    pub fn record_file(&mut self, artifact: &FileArtifact) {
        self.files += 1;
        self.bytes += artifact.bytes.len() as u64;
    }

    pub fn record_session(&mut self, report: &SessionReport) {
        self.sessions += 1;
        self.rejected += report.files_rejected;
    }
}
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s), {} byte(s) in {} session(s)",
            self.files, self.bytes, self.sessions
        )?;
        if self.rejected > 0 {
            write!(f, ", {} rejected", self.rejected)?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn accumulates_files_and_sessions() {
    let mut summary = Summary::default();
    for size in &[6, 12] {
        summary.record_file(&FileArtifact {
            name: "macs.bin".into(),
            relative_path: "/spiffs/macs.bin".into(),
            declared_size: None,
            bytes: vec![0; *size],
        });
    }
    summary.record_session(&SessionReport::default());

    assert_eq!(
        summary,
        Summary {
            files: 2,
            bytes: 18,
            sessions: 1,
            rejected: 0,
        }
    );
    assert_eq!(summary.to_string(), "2 file(s), 18 byte(s) in 1 session(s)");
}

#[test]
fn accumulates_rejected_files_of_sessions() {
    let mut summary = Summary::default();
    for rejected in &[2, 0, 1] {
        summary.record_session(&SessionReport {
            files_rejected: *rejected,
            ..SessionReport::default()
        });
    }

    assert_eq!(summary.sessions, 3);
    assert_eq!(summary.rejected, 3);
    assert_eq!(
        summary.to_string(),
        "0 file(s), 0 byte(s) in 3 session(s), 3 rejected"
    );
}
