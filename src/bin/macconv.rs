//! Converts MAC sniffer binary dumps into readable text files.

use std::{path::Path, process};

use clap::{crate_authors, crate_version, App, AppSettings::*, Arg};
use console::style;
use log::LevelFilter;
use simplelog::*;

use macdump::mac_convert::{convert_path, ConvertOptions};

fn main() {
    let matches = App::new("macconv")
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about("Convert MAC address binary dumps to readable text files")
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("INPUT")
                .help("binary dump, or directory of `.bin` dumps, to convert")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("OUTPUT_DIR")
                .help("output directory for the text files")
                .short("o")
                .long("output-dir")
                .takes_value(true)
                .default_value("converted"),
        )
        .arg(
            Arg::with_name("COUNT_HEADER")
                .help("dumps start with a 4-byte little-endian record count")
                .long("count-header"),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // The per-file progress is logged at `Info`, shown by default.
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("{}: cannot set up logging: {}", style("warning").yellow(), e);
    }

    // Both have a value: one is required, the other has a default.
    let input = Path::new(matches.value_of("INPUT").unwrap());
    let output_dir = Path::new(matches.value_of("OUTPUT_DIR").unwrap());
    let options = ConvertOptions {
        skip_count_header: matches.is_present("COUNT_HEADER"),
    };

    match convert_path(input, output_dir, options) {
        Ok(totals) => {
            println!(
                "Conversion complete: {} files processed, {} MAC addresses extracted",
                totals.files, totals.macs
            );
            let saved_to = output_dir
                .canonicalize()
                .unwrap_or_else(|_| output_dir.to_path_buf());
            println!("Output files saved to {}", style(saved_to.display()).cyan());
        }
        Err(e) => {
            println!("{}: {}", style("error").red(), e);
            process::exit(1);
        }
    }
}
