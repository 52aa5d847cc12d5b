//! Conversion of binary MAC address dumps into readable text files.
//!
//! A dump is a sequence of 6-byte records, one per sniffed MAC address. The
//! text output starts with a 3-line comment header followed by a blank line,
//! then lists one address per line:
//!
//! ```text
//! # MAC addresses extracted from macs.bin
//! # Extracted on 2024-05-01 12:00:00
//! # Total MAC addresses: 2
//!
//! a4:cf:12:34:56:78
//! de:ad:be:ef:00:01
//! ```

use std::convert::TryInto;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use log::{debug, error, info, warn};

use crate::errors::{Error, Result};

/// Size of one MAC address record.
pub const MAC_LEN: usize = 6;

/// Size of the little-endian record count some firmware versions write in
/// front of the records.
const COUNT_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Skip a leading little-endian `u32` record count before the records.
    pub skip_count_header: bool,
}

/// Totals over a batch conversion. Only files with at least one address
/// count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub files: usize,
    pub macs: usize,
}

/// Format a MAC address as lowercase colon-separated octets.
pub fn format_mac(mac: &[u8; MAC_LEN]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Render the text listing of the records in `data`. A trailing incomplete
/// record is ignored. Returns the text and the number of addresses listed.
pub fn render(source_name: &str, data: &[u8], generated_at: NaiveDateTime) -> (String, usize) {
    let count = data.len() / MAC_LEN;
    let mut text = String::with_capacity(128 + count * 18);
    // Writing into a `String` cannot fail.
    let _ = writeln!(text, "# MAC addresses extracted from {}", source_name);
    let _ = writeln!(
        text,
        "# Extracted on {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(text, "# Total MAC addresses: {}", count);
    text.push('\n');

    for record in data.chunks_exact(MAC_LEN) {
        if let Ok(mac) = record.try_into() {
            text.push_str(&format_mac(mac));
            text.push('\n');
        }
    }
    if data.len() % MAC_LEN != 0 {
        debug!(
            "{}: ignoring {} trailing byte(s)",
            source_name,
            data.len() % MAC_LEN
        );
    }
    (text, count)
}

/// Convert one dump into `<output_dir>/<stem>.txt`. Returns the number of
/// addresses written.
pub fn convert_file(input: &Path, output_dir: &Path, options: ConvertOptions) -> Result<usize> {
    let source_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidInput(format!("`{}` is not a file", input.display())))?;
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_name.clone());

    let data = fs::read(input)?;
    let records = if options.skip_count_header {
        strip_count_header(&source_name, &data)
    } else {
        &data[..]
    };

    let (text, count) = render(&source_name, records, Local::now().naive_local());
    let output = output_dir.join(format!("{}.txt", stem));
    fs::write(&output, text)?;
    info!(
        "Processed {} MAC addresses from {} into {}",
        count,
        input.display(),
        output.display()
    );
    Ok(count)
}

/// Convert a single dump, or every `*.bin` dump of a directory (not
/// recursively, in name order), into `output_dir`, which is created if absent.
///
/// In directory mode, a dump that cannot be converted is reported and
/// skipped.
pub fn convert_path(input: &Path, output_dir: &Path, options: ConvertOptions) -> Result<Totals> {
    fs::create_dir_all(output_dir)?;
    let mut totals = Totals::default();

    if input.is_dir() {
        for path in bin_files(input)? {
            match convert_file(&path, output_dir, options) {
                Ok(count) => totals.add(count),
                Err(e) => error!("Error processing {}: {}", path.display(), e),
            }
        }
    } else {
        totals.add(convert_file(input, output_dir, options)?);
    }
    Ok(totals)
}

// =============================================================================
// Private stuff
// =============================================================================

impl Totals {
    fn add(&mut self, count: usize) {
        if count > 0 {
            self.files += 1;
            self.macs += count;
        }
    }
}

fn strip_count_header<'a>(source_name: &str, data: &'a [u8]) -> &'a [u8] {
    if data.len() < COUNT_HEADER_LEN {
        warn!("{}: too short for a record count header", source_name);
        return &[];
    }
    let (header, records) = data.split_at(COUNT_HEADER_LEN);
    let mut count = [0_u8; COUNT_HEADER_LEN];
    count.copy_from_slice(header);
    let announced = u32::from_le_bytes(count) as usize;
    if announced != records.len() / MAC_LEN {
        warn!(
            "{}: header announces {} record(s), {} found",
            source_name,
            announced,
            records.len() / MAC_LEN
        );
    }
    records
}

fn bin_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "bin") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempdir::TempDir;

    const TWO_MACS: [u8; 12] = [
        0xa4, 0xcf, 0x12, 0x34, 0x56, 0x78, 0xde, 0xad, 0xbe, 0xef, 0x00, 0x01,
    ];

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn formats_lowercase_octets() {
        assert_eq!(
            format_mac(&[0xA4, 0xCF, 0x12, 0x00, 0x0b, 0xFF]),
            "a4:cf:12:00:0b:ff"
        );
    }

    #[test]
    fn renders_header_and_addresses() {
        let (text, count) = render("macs.bin", &TWO_MACS, noon());
        assert_eq!(count, 2);
        assert_eq!(
            text,
            "# MAC addresses extracted from macs.bin\n\
             # Extracted on 2024-05-01 12:00:00\n\
             # Total MAC addresses: 2\n\
             \n\
             a4:cf:12:34:56:78\n\
             de:ad:be:ef:00:01\n"
        );
    }

    #[test]
    fn ignores_trailing_partial_record() {
        let (text, count) = render("macs.bin", &TWO_MACS[..9], noon());
        assert_eq!(count, 1);
        assert!(text.ends_with("\na4:cf:12:34:56:78\n"));
    }

    #[test]
    fn strips_count_header() {
        let mut data = 2_u32.to_le_bytes().to_vec();
        data.extend_from_slice(&TWO_MACS);
        assert_eq!(strip_count_header("macs.bin", &data), &TWO_MACS[..]);
        assert!(strip_count_header("macs.bin", &[1, 0]).is_empty());
    }

    #[test]
    fn converts_single_file() {
        let dir = TempDir::new("macconv").unwrap();
        let input = dir.path().join("macs.bin");
        fs::write(&input, &TWO_MACS).unwrap();
        let output_dir = dir.path().join("converted");

        let totals = convert_path(&input, &output_dir, ConvertOptions::default()).unwrap();

        assert_eq!(totals, Totals { files: 1, macs: 2 });
        let text = fs::read_to_string(output_dir.join("macs.txt")).unwrap();
        assert!(text.contains("# Total MAC addresses: 2\n"));
        assert!(text.ends_with("de:ad:be:ef:00:01\n"));
    }

    #[test]
    fn converts_every_bin_file_of_a_directory() {
        let dir = TempDir::new("macconv").unwrap();
        fs::write(dir.path().join("a.bin"), &TWO_MACS).unwrap();
        fs::write(dir.path().join("b.bin"), &TWO_MACS[..6]).unwrap();
        fs::write(dir.path().join("empty.bin"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"not a dump").unwrap();
        let output_dir = dir.path().join("out");

        let totals = convert_path(dir.path(), &output_dir, ConvertOptions::default()).unwrap();

        assert_eq!(totals, Totals { files: 2, macs: 3 });
        assert!(output_dir.join("a.txt").exists());
        assert!(output_dir.join("b.txt").exists());
        assert!(output_dir.join("empty.txt").exists());
        assert!(!output_dir.join("notes.txt").exists());
    }

    #[test]
    fn missing_single_file_is_an_error() {
        let dir = TempDir::new("macconv").unwrap();
        let result = convert_path(
            &dir.path().join("missing.bin"),
            &dir.path().join("out"),
            ConvertOptions::default(),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
