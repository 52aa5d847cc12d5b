//! Recognition of the sentinel lines of the dump protocol.
//!
//! Parsing here is purely lexical: a line is classified into a [`Directive`]
//! regardless of the receiver's current state. Whether a directive has any
//! effect is decided by the states.

use log::warn;

pub(crate) const DUMP_BEGIN: &str = "MAC_SNIFF_DUMP_BEGIN";
pub(crate) const DUMP_END: &str = "MAC_SNIFF_DUMP_END";
pub(crate) const TOTAL_BYTES: &str = "TOTAL_BYTES:";
pub(crate) const NUM_FILES: &str = "NUM_FILES:";
pub(crate) const FILE_BEGIN: &str = "FILE_BEGIN:";
pub(crate) const FILE_SIZE: &str = "FILE_SIZE:";
pub(crate) const CHUNK: &str = "CHUNK:";
pub(crate) const FILE_END: &str = "FILE_END";

/// One line of the dump protocol.
///
/// Numeric fields hold `None` when the value could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Directive<'a> {
    Empty,
    DumpBegin,
    DumpEnd { total_bytes: Option<u64> },
    NumFiles(Option<u64>),
    FileBegin(&'a str),
    FileSize(Option<u64>),
    Chunk(&'a str),
    FileEnd,
    Unknown(&'a str),
}

impl<'a> Directive<'a> {
    /// Classify a line. Surrounding whitespace, including any leftover `\r`,
    /// is ignored.
    pub(crate) fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Directive::Empty;
        }
        if line == DUMP_BEGIN {
            return Directive::DumpBegin;
        }
        if line == FILE_END {
            return Directive::FileEnd;
        }
        if let Some(rest) = line.strip_prefix(DUMP_END) {
            if let Some(total_bytes) = parse_end_suffix(rest) {
                return Directive::DumpEnd { total_bytes };
            }
            return Directive::Unknown(line);
        }
        if let Some(value) = line.strip_prefix(NUM_FILES) {
            return Directive::NumFiles(parse_count(NUM_FILES, value));
        }
        if let Some(path) = line.strip_prefix(FILE_BEGIN) {
            return Directive::FileBegin(path);
        }
        if let Some(value) = line.strip_prefix(FILE_SIZE) {
            return Directive::FileSize(parse_count(FILE_SIZE, value));
        }
        if let Some(payload) = line.strip_prefix(CHUNK) {
            return Directive::Chunk(payload);
        }
        Directive::Unknown(line)
    }
}

/// Parse what follows `MAC_SNIFF_DUMP_END` on the same line.
///
/// Returns `None` when the suffix is not recognized, meaning the line is not
/// an END directive at all, and `Some(total)` otherwise, where `total` is
/// itself `None` when no usable `TOTAL_BYTES:<n>` field is present.
fn parse_end_suffix(rest: &str) -> Option<Option<u64>> {
    if rest.is_empty() {
        return Some(None);
    }
    let field = rest.trim_start_matches(|c: char| matches!(c, ' ' | '\t' | ':' | ',' | ';'));
    if field.len() == rest.len() {
        return None;
    }
    field
        .strip_prefix(TOTAL_BYTES)
        .map(|value| parse_count(TOTAL_BYTES, value))
}

fn parse_count(directive: &str, value: &str) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("ignoring malformed `{}` value `{}`: {}", directive, value, e);
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
    use rstest::rstest;

    #[rstest]
    #[case("", Directive::Empty)]
    #[case("  \r", Directive::Empty)]
    #[case("MAC_SNIFF_DUMP_BEGIN", Directive::DumpBegin)]
    #[case("MAC_SNIFF_DUMP_BEGIN\r", Directive::DumpBegin)]
    #[case("MAC_SNIFF_DUMP_END", Directive::DumpEnd { total_bytes: None })]
    #[case("NUM_FILES:3", Directive::NumFiles(Some(3)))]
    #[case("NUM_FILES: 3", Directive::NumFiles(Some(3)))]
    #[case("NUM_FILES:three", Directive::NumFiles(None))]
    #[case("NUM_FILES:-1", Directive::NumFiles(None))]
    #[case("FILE_BEGIN:/spiffs/a.bin", Directive::FileBegin("/spiffs/a.bin"))]
    #[case("FILE_BEGIN:/c:/odd", Directive::FileBegin("/c:/odd"))]
    #[case("FILE_SIZE:1024", Directive::FileSize(Some(1024)))]
    #[case("FILE_SIZE:", Directive::FileSize(None))]
    #[case("CHUNK:0a1b", Directive::Chunk("0a1b"))]
    #[case("CHUNK:", Directive::Chunk(""))]
    #[case("FILE_END", Directive::FileEnd)]
    #[case("FILE_ENDING", Directive::Unknown("FILE_ENDING"))]
    #[case("chunk:0a", Directive::Unknown("chunk:0a"))]
    #[case("I (1234) wifi: sniffing", Directive::Unknown("I (1234) wifi: sniffing"))]
    fn classifies_lines(#[case] line: &str, #[case] expected: Directive) {
        assert_eq!(Directive::parse(line), expected);
    }

    #[rstest]
    #[case("MAC_SNIFF_DUMP_END TOTAL_BYTES:4096", Some(4096))]
    #[case("MAC_SNIFF_DUMP_END:TOTAL_BYTES:4096", Some(4096))]
    #[case("MAC_SNIFF_DUMP_END, TOTAL_BYTES:12", Some(12))]
    #[case("MAC_SNIFF_DUMP_END TOTAL_BYTES:lots", None)]
    fn end_carries_optional_total(#[case] line: &str, #[case] total_bytes: Option<u64>) {
        assert_eq!(Directive::parse(line), Directive::DumpEnd { total_bytes });
    }

    #[rstest]
    #[case("MAC_SNIFF_DUMP_ENDED")]
    #[case("MAC_SNIFF_DUMP_END garbage")]
    fn end_with_unknown_suffix_is_not_end(#[case] line: &str) {
        assert_eq!(Directive::parse(line), Directive::Unknown(line));
    }
}
