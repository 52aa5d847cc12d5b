//! Text lines out of a byte oriented transport.

use std::io::{self, BufRead, BufReader, ErrorKind, Read};

use log::{trace, warn};

/// A lazy, potentially endless, source of text lines.
pub trait LineSource {
    /// Pull the next line, without its terminator and surrounding whitespace.
    ///
    /// * `Ok(Some(line))` - a line, possibly empty when the transport had
    ///   nothing complete to offer before its read timeout,
    /// * `Ok(None)` - the transport is exhausted and will never yield again,
    /// * `Err(e)` - the transport failed.
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Longest line kept, terminator included. Anything longer is line noise.
const MAX_LINE_LEN: usize = 16 * 1024;

/// Splits the bytes read from `R` into lines.
///
/// Bytes of an incomplete line are kept across read timeouts, so a line
/// arriving in several pieces over a slow link comes out whole. A line longer
/// than 16 KiB is dropped entirely, up to and including its terminator.
pub struct SerialLines<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    /// Set while skipping the rest of an over-long line.
    discarding: bool,
}
impl<R: Read> SerialLines<R> {
    pub fn new(inner: R) -> Self {
        SerialLines {
            reader: BufReader::new(inner),
            pending: Vec::new(),
            discarding: false,
        }
    }

    fn take_line(&mut self) -> String {
        let raw = std::mem::take(&mut self.pending);
        // Invalid UTF-8 sequences are dropped rather than replaced, line noise
        // must not end up inside a directive.
        let text = String::from_utf8_lossy(&raw).replace('\u{FFFD}', "");
        text.trim().to_owned()
    }

    /// The pending line, or nothing if it is the tail of a dropped one.
    fn finish_line(&mut self) -> String {
        if self.discarding {
            self.discarding = false;
            self.pending.clear();
            return String::new();
        }
        self.take_line()
    }
}
impl<R: Read> LineSource for SerialLines<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let room = MAX_LINE_LEN.saturating_sub(self.pending.len()) as u64;
        match (&mut self.reader)
            .take(room)
            .read_until(b'\n', &mut self.pending)
        {
            Ok(0) => {
                if self.pending.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(self.finish_line()))
                }
            }
            Ok(_) if !self.pending.ends_with(b"\n") && self.pending.len() >= MAX_LINE_LEN => {
                if !self.discarding {
                    warn!("dropping a line longer than {} bytes", MAX_LINE_LEN);
                    self.discarding = true;
                }
                self.pending.clear();
                Ok(Some(String::new()))
            }
            // A whole line, or what was left when the stream ended mid-line.
            Ok(_) => Ok(Some(self.finish_line())),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                trace!("read timed out with {} byte(s) pending", self.pending.len());
                Ok(Some(String::new()))
            }
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;

    fn collect<S: LineSource>(source: &mut S) -> Vec<String> {
        let mut lines = vec![];
        while let Some(line) = source.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn splits_and_trims_lines() {
        let mut source = SerialLines::new(Cursor::new(b"BEGIN\r\n  CHUNK:0a \n\nlast".to_vec()));
        assert_eq!(collect(&mut source), vec!["BEGIN", "CHUNK:0a", "", "last"]);
    }

    #[test]
    fn drops_invalid_utf8() {
        let mut source = SerialLines::new(Cursor::new(b"FILE\xffEND\n".to_vec()));
        assert_eq!(collect(&mut source), vec!["FILEEND"]);
    }

    #[test]
    fn drops_over_long_line() {
        let mut stream = vec![b'A'; MAX_LINE_LEN + 10];
        stream.extend_from_slice(b"\nFILE_END\n");
        let mut source = SerialLines::new(Cursor::new(stream));

        assert_eq!(collect(&mut source), vec!["", "", "FILE_END"]);
        assert!(source.pending.capacity() <= 2 * MAX_LINE_LEN);
    }

    /// Replays scripted reads, a `None` standing for a read timeout.
    struct Flaky {
        reads: VecDeque<Option<&'static [u8]>>,
    }
    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Some(data)) => {
                    buf[..data.len()].copy_from_slice(data);
                    Ok(data.len())
                }
                Some(None) => Err(io::Error::new(ErrorKind::TimedOut, "timeout")),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn keeps_partial_line_across_timeouts() {
        let mut source = SerialLines::new(Flaky {
            reads: vec![Some(&b"CHUNK:0a"[..]), None, Some(&b"1b\nFILE_END\n"[..])]
                .into_iter()
                .collect(),
        });

        assert_eq!(source.next_line().unwrap(), Some(String::new()));
        assert_eq!(source.next_line().unwrap(), Some("CHUNK:0a1b".to_owned()));
        assert_eq!(source.next_line().unwrap(), Some("FILE_END".to_owned()));
        assert_eq!(source.next_line().unwrap(), None);
    }

    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "unplugged"))
        }
    }

    #[test]
    fn transport_failure_is_an_error() {
        let mut source = SerialLines::new(Broken);
        assert_eq!(
            source.next_line().unwrap_err().kind(),
            ErrorKind::BrokenPipe
        );
    }
}
