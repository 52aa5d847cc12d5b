//! Receive whole dumps through the public interface: raw serial bytes in,
//! files on disk out.

use std::fs;
use std::io::Cursor;

use macdump::{
    DirectorySink, DumpReceiver, Emission, Outcome, SerialLines, SettingsBuilder, Summary,
    Transfer,
};
use rstest::rstest;
use tempdir::TempDir;

const BOOT_NOISE: &str = "ets Jun  8 2016 00:22:57\r\n\
    rst:0x1 (POWERON_RESET),boot:0x13 (SPI_FAST_FLASH_BOOT)\r\n\
    I (31) boot: ESP-IDF v4.4 2nd stage bootloader\r\n";

fn dump(files: &[(&str, &[u8])]) -> String {
    let mut text = String::from("MAC_SNIFF_DUMP_BEGIN\r\n");
    text.push_str(&format!("NUM_FILES:{}\r\n", files.len()));
    let mut total = 0;
    for (path, bytes) in files {
        text.push_str(&format!("FILE_BEGIN:{}\r\n", path));
        text.push_str(&format!("FILE_SIZE:{}\r\n", bytes.len()));
        for chunk in bytes.chunks(4) {
            text.push_str("CHUNK:");
            text.push_str(&hex::encode_upper(chunk));
            text.push_str("\r\n");
        }
        text.push_str("FILE_END\r\n");
        total += bytes.len();
    }
    text.push_str(&format!("MAC_SNIFF_DUMP_END TOTAL_BYTES:{}\r\n", total));
    text
}

fn receive(stream: String, keep_listening: bool) -> (TempDir, Summary, Outcome) {
    let dir = TempDir::new("macdump").unwrap();
    let settings = SettingsBuilder::new()
        .output_dir(dir.path().join("dump"))
        .keep_listening(keep_listening)
        .finalize();
    let mut lines = SerialLines::new(Cursor::new(stream.into_bytes()));
    let mut sink = DirectorySink::new(&settings.output_dir);
    let mut summary = Summary::default();
    let outcome = Transfer::new(&settings)
        .run(&mut lines, &mut sink, &mut summary)
        .unwrap();
    (dir, summary, outcome)
}

#[test]
fn files_land_in_the_output_directory() {
    let macs: &[u8] = &[0xa4, 0xcf, 0x12, 0x34, 0x56, 0x78, 0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];
    let stream = format!(
        "{}{}",
        BOOT_NOISE,
        dump(&[("/spiffs/macs.bin", macs), ("/spiffs/log/boot.txt", b"ok")])
    );

    let (dir, summary, outcome) = receive(stream, false);

    match outcome {
        Outcome::SessionComplete(report) => {
            assert_eq!(report.files_emitted, 2);
            assert_eq!(report.bytes_emitted, 14);
            assert!(report.is_consistent());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(summary.files, 2);
    assert_eq!(summary.sessions, 1);
    let out = dir.path().join("dump");
    assert_eq!(fs::read(out.join("macs.bin")).unwrap(), macs);
    assert_eq!(fs::read(out.join("boot.txt")).unwrap(), b"ok");
    assert!(!out.join("spiffs").exists());
    assert!(!out.join("log").exists());
}

#[test]
fn later_file_with_same_name_replaces_earlier_one() {
    let stream = dump(&[("/a/data.bin", b"first"), ("/b/data.bin", b"second")]);

    let (dir, summary, _) = receive(stream, false);

    assert_eq!(summary.files, 2);
    assert_eq!(
        fs::read(dir.path().join("dump").join("data.bin")).unwrap(),
        b"second"
    );
}

#[test]
fn keeps_listening_across_sessions_until_the_stream_ends() {
    let stream = format!(
        "{}{}{}",
        dump(&[("one.bin", b"\x01")]),
        BOOT_NOISE,
        dump(&[("two.bin", b"\x02\x02")])
    );

    let (dir, summary, outcome) = receive(stream, true);

    assert_eq!(outcome, Outcome::Exhausted);
    assert_eq!(summary.sessions, 2);
    assert_eq!(summary.files, 2);
    assert_eq!(summary.bytes, 3);
    assert!(dir.path().join("dump").join("one.bin").exists());
    assert!(dir.path().join("dump").join("two.bin").exists());
}

#[test]
fn interrupted_dump_writes_nothing_for_the_open_file() {
    let stream = String::from(
        "MAC_SNIFF_DUMP_BEGIN\nFILE_BEGIN:done.bin\nCHUNK:0102\nFILE_END\n\
         FILE_BEGIN:cut.bin\nCHUNK:0304\n",
    );

    let (dir, summary, outcome) = receive(stream, false);

    assert_eq!(outcome, Outcome::Exhausted);
    assert_eq!(summary.files, 1);
    assert_eq!(summary.sessions, 0);
    assert!(dir.path().join("dump").join("done.bin").exists());
    assert!(!dir.path().join("dump").join("cut.bin").exists());
}

#[rstest]
#[case::lowercase("CHUNK:0aff\n", vec![0x0a, 0xff])]
#[case::uppercase("CHUNK:0AFF\n", vec![0x0a, 0xff])]
#[case::odd_length("CHUNK:0aff1\n", vec![0x0a, 0xff])]
#[case::split_over_chunks("CHUNK:0a\nCHUNK:ff\n", vec![0x0a, 0xff])]
#[case::empty_chunk("CHUNK:\nCHUNK:0aff\n", vec![0x0a, 0xff])]
fn chunk_payloads_decode_to_file_bytes(#[case] chunks: &str, #[case] expected: Vec<u8>) {
    let mut receiver = DumpReceiver::new();
    let stream = format!(
        "MAC_SNIFF_DUMP_BEGIN\nFILE_BEGIN:f.bin\n{}FILE_END\n",
        chunks
    );
    let mut emitted = None;
    for line in stream.lines() {
        if let Some(emission) = receiver.consume(line) {
            emitted = Some(emission);
        }
    }
    match emitted {
        Some(Emission::File(artifact)) => assert_eq!(artifact.bytes, expected),
        other => panic!("unexpected emission {:?}", other),
    }
}

#[test]
fn lines_outside_a_session_change_nothing() {
    let mut receiver = DumpReceiver::new();
    for line in BOOT_NOISE
        .lines()
        .chain(vec!["CHUNK:0102", "FILE_BEGIN:x.bin", "FILE_END", "MAC_SNIFF_DUMP_END"])
    {
        assert_eq!(receiver.consume(line), None);
    }
    assert!(!receiver.in_session());
    assert_eq!(receiver.buffered_bytes(), 0);
}
