#[macro_use] extern crate log;

use std::io::{self, BufWriter};
use std::path::PathBuf;
use clap::{App, Arg, ArgMatches};
use termcolor::{ColorChoice, StandardStream};
use ffs::{ErrorKind, FfsError, Config};
use ffs::compiler::{compile, compile_file, read_source};
use ffs::config::{parse_range_arg, MAX_CELLS_ARG, MAX_DEBUG_WIDTH};
use ffs::interpreter::execute;
use ffs::report::report;

fn main_execute(config: &Config) -> Result<i32, FfsError> {

    // Compile the source, either from the given file or from stdin
    let program = match config.file {
        Some(ref path) => compile_file(path, config.debug_width)?,
        None => {
            debug!("Reading source from stdin.");
            let source = read_source(io::stdin())?;
            compile(&source, config.debug_width, None)?
        }
    };

    // Aaaaand, run!
    debug!("Running program.");
    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();
    let status = execute(
        &program,
        config,
        stdin.lock(),
        BufWriter::new(stdout.lock()),
        stderr.lock()
    )?;
    debug!("Done.");

    Ok(status)
}

fn config_from_matches(matches: &ArgMatches) -> Result<Config, FfsError> {
    let mut config = Config::default();
    config.file = matches.value_of("file").map(PathBuf::from);
    if let Some(cells) = matches.value_of("cells") {
        config.cells = parse_range_arg("--cells", cells, 1, MAX_CELLS_ARG)?;
    }
    if let Some(dbg) = matches.value_of("dbg") {
        config.debug_width = parse_range_arg("--dbg", dbg, 1, MAX_DEBUG_WIDTH)?;
    }
    config.elastic = matches.is_present("elastic");
    config.strict = matches.is_present("strict");
    config.trace = matches.is_present("trace");
    config.validate()?;
    Ok(config)
}

fn argument_error(e: clap::Error) -> FfsError {
    use clap::ErrorKind as Clap;
    let kind = match e.kind {
        Clap::UnknownArgument => ErrorKind::UnknownArgument,
        Clap::EmptyValue | Clap::TooFewValues | Clap::MissingRequiredArgument => ErrorKind::MissingArgumentValue,
        _ => ErrorKind::InvalidArgumentValue
    };
    let message = e.message.lines().next().unwrap_or("").trim_start_matches("error: ").to_owned();
    FfsError::argument(kind, message).with_suggestion("Run with --help to see the accepted flags")
}

fn fail(e: &FfsError) -> ! {
    debug!("{}", e);
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    if report(e, &mut stderr).is_err() {
        error!("{}", e);
    }
    std::process::exit(1);
}

// All the cli options are here
fn app() -> App<'static, 'static> {
    App::new("ffs")
        .version(env!("CARGO_PKG_VERSION"))
        .version_short("v")
        .author("Marco Cameriero")
        .about("Compiler and virtual machine for the FFS Brainfuck dialect")
        .arg(
            Arg::with_name("file")
                .short("f")
                .long("file")
                .takes_value(true)
                .value_name("PATH")
                .help("Reads the program from the given file instead of stdin")
        )
        .arg(
            Arg::with_name("cells")
                .long("cells")
                .takes_value(true)
                .value_name("1..1000000")
                .help("Initial number of tape cells [default: 30000]")
        )
        .arg(
            Arg::with_name("dbg")
                .long("dbg")
                .takes_value(true)
                .value_name("1..1000")
                .help("Number of cells shown by the '!' instruction [default: 8]")
        )
        .arg(
            Arg::with_name("elastic")
                .long("elastic")
                .help("Grows the tape when the pointer moves past its end")
        )
        .arg(
            Arg::with_name("strict")
                .long("strict")
                .help("Fails instead of clamping when the pointer leaves the tape")
        )
        .arg(
            Arg::with_name("trace")
                .long("trace")
                .help("Prints every executed instruction to stderr")
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .multiple(true)
                .help("Sets the level of verbosity. Repeat to increase.")
        )
}

fn main() {

    let matches = match app().get_matches_safe() {
        Ok(matches) => matches,
        Err(ref e) if e.kind == clap::ErrorKind::HelpDisplayed || e.kind == clap::ErrorKind::VersionDisplayed => {
            e.exit()
        },
        Err(e) => fail(&argument_error(e))
    };

    // Initialize logger as soon as possible
    let verbosity = match matches.occurrences_of("verbose") {
        0     => "warn",
        1     => "info",
        2     => "debug",
        _     => "trace"
    };
    env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("FFS_LOG", format!("ffs={}", verbosity))
            .write_style_or("FFS_LOG_STYLE", "auto")
    )
    .init();

    match config_from_matches(&matches).and_then(|config| main_execute(&config)) {
        Ok(status) => std::process::exit(status),
        Err(e) => fail(&e)
    }
}
