//! Macdump command line interface.

use std::{process, time::Duration};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings::*, Arg,
};
use console::style;
use log::{debug, trace, LevelFilter};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use simplelog::*;

use macdump::{self as md, DeviceManager, Validation};

fn main() {
    println!("[MD] macdump v{}", crate_version!());

    ctrlc::set_handler(move || {
        println!("\n[MD] 🛑 Aborted by user");
        process::exit(130);
    })
    .expect("Failed to install my Ctrl-C handler!");

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Macdump receives the content of the MAC sniffer storage when the \
            sniffer is asked to dump it over its serial port. The dump is made \
            of text lines: \n\
               \t* MAC_SNIFF_DUMP_BEGIN starts the dump \n\
               \t* NUM_FILES:<n> announces the number of files \n\
               \t* FILE_BEGIN:<path>, FILE_SIZE:<n>, CHUNK:<hex>... and \
               FILE_END carry each file \n\
               \t* MAC_SNIFF_DUMP_END ends the dump \n\
            \n\
            Every received file is written into the output directory under \
            its own name; the directories of the sniffer are not recreated. \
            Anything printed on the serial port outside of a dump is ignored.\n\
            \n\
            Macdump can be started before or after the sniffer is plugged. It \
            also waits for the sniffer to come back if the USB cable is \
            unplugged.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("DEVICE_TTY")
                .help("the serial device the sniffer is connected to")
                .long_help(
                    "the serial device the sniffer is connected to; may change \
                     when the board is unplugged and re-plugged and may differ \
                     between systems. When not set, the device is selected \
                     from the list of connected ones.",
                )
                .short("t")
                .long("tty")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("BAUD_RATE")
                .help("serial port baud rate")
                .short("b")
                .long("baud-rate")
                .takes_value(true)
                .default_value("115200")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("DATA_BITS")
                .help("number of bits per character")
                .short("d")
                .long("data-bits")
                .takes_value(true)
                .possible_values(&["5", "6", "7", "8"])
                .default_value("8")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("STOP_BITS")
                .help("number of stop bits per byte")
                .short("s")
                .long("stop-bits")
                .takes_value(true)
                .possible_values(&["1", "2"])
                .default_value("1")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("PARITY")
                .help("parity checking protocol")
                .short("p")
                .long("parity")
                .takes_value(true)
                .possible_values(&["none", "odd", "even"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("FLOW_CONTROL")
                .help("flow control mode")
                .short("f")
                .long("flow-control")
                .takes_value(true)
                .possible_values(&["none", "soft", "hard"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("OUTPUT_DIR")
                .help("directory where received files are saved")
                .short("o")
                .long("output")
                .takes_value(true)
                .default_value("./dump"),
        )
        .arg(
            Arg::with_name("KEEP_LISTENING")
                .help("wait for another dump after one completes")
                .short("k")
                .long("keep-listening"),
        )
        .arg(
            Arg::with_name("IDLE_TIMEOUT")
                .help("seconds without data before a dump is reported as stalled")
                .long_help(
                    "seconds without data before a dump in progress is \
                     reported as stalled and `macdump` terminates with an \
                     error; by default an interrupted dump is waited for \
                     forever.",
                )
                .long("idle-timeout")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("STRICT")
                .help("reject files whose size differs from their FILE_SIZE")
                .long("strict"),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'macdump -v -v -v' or 'macdump -vvv' vs 'macdump -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
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

    trace!("{:#?}", matches);

    // Arguments with default values ===========================================

    // It's safe to call unwrap on all command line arguments with default
    // values, because the value with either be what the user input at runtime
    // or the default value

    let baud_rate = value_t!(matches.value_of("BAUD_RATE"), u32).unwrap_or_else(|_| {
        invalid_value("baud-rate", matches.value_of("BAUD_RATE").unwrap_or_default())
    });

    let data_bits = match matches.value_of("DATA_BITS").unwrap() {
        "5" => DataBits::Five,
        "6" => DataBits::Six,
        "7" => DataBits::Seven,
        "8" => DataBits::Eight,
        _ => unreachable!(),
    };

    let stop_bits = match matches.value_of("STOP_BITS").unwrap() {
        "1" => StopBits::One,
        "2" => StopBits::Two,
        _ => unreachable!(),
    };

    let parity = match matches.value_of("PARITY").unwrap() {
        "none" => Parity::None,
        "even" => Parity::Even,
        "odd" => Parity::Odd,
        _ => unreachable!(),
    };

    let flow_control = match matches.value_of("FLOW_CONTROL").unwrap() {
        "none" => FlowControl::None,
        "soft" => FlowControl::Software,
        "hard" => FlowControl::Hardware,
        _ => unreachable!(),
    };

    let validation = if matches.is_present("STRICT") {
        Validation::Strict
    } else {
        Validation::Lenient
    };

    // END - Arguments with default values =====================================

    let mut builder = md::SettingsBuilder::default()
        .baud_rate(baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity)
        .flow_control(flow_control)
        .output_dir(matches.value_of("OUTPUT_DIR").unwrap())
        .keep_listening(matches.is_present("KEEP_LISTENING"))
        .validation(validation);

    // START - Arguments with NO default values ================================

    if let Some(path) = matches.value_of("DEVICE_TTY") {
        builder = builder.path(path);
    }

    if matches.is_present("IDLE_TIMEOUT") {
        let seconds = value_t!(matches.value_of("IDLE_TIMEOUT"), u64).unwrap_or_else(|_| {
            invalid_value(
                "idle-timeout",
                matches.value_of("IDLE_TIMEOUT").unwrap_or_default(),
            )
        });
        builder = builder.idle_timeout(Duration::from_secs(seconds));
    }

    // END - Arguments =========================================================

    // Run the state machine ===================================================

    let mut server = md::factory(builder.finalize());
    let exit_code = server.run();
    debug!("exit code: {}", exit_code);
    process::exit(exit_code.into());
}

fn invalid_value(name: &str, value: &str) -> ! {
    println!(
        "{}: `{}` needs to be a numeric value",
        style("error").red(),
        style(name).cyan()
    );
    println!(
        "   {} `{}` is not a valid value",
        style("-->").cyan(),
        style(value).on_red()
    );
    process::exit(-1);
}
