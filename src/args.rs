//! Command line parsing
//!
//! One invocation describes a whole sequence of notes. Options before
//! the first `-n`/`--new` describe the first note; every `-n` finishes
//! the note and starts the next one with default values. Within a
//! note, the last occurrence of an option wins.

use std::env;
use std::mem;
use std::path::PathBuf;
use std::time::Duration;

use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::sequence::{EndDelay, ToneSequence, ToneSpec};

/// Defaults for a fresh note
const DEFAULT_FREQ_HZ: u16 = 440;
const DEFAULT_LENGTH_MS: u64 = 200;
const DEFAULT_REPS: u32 = 1;
const DEFAULT_DELAY_MS: u64 = 100;

/// Parsed invocation: global options plus the tone sequence
#[derive(Debug)]
pub struct Cli {
    /// Explicit device path, overriding probing
    pub device: Option<PathBuf>,
    /// The notes to play, in order
    pub sequence: ToneSequence,
}

/// Parse the process arguments
///
/// Prints and exits on `--help`, `--version`, and usage errors, as
/// clap does.
pub fn parse() -> Cli {
    match try_parse_from(env::args().collect()) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    }
}

fn try_parse_from(argv: Vec<String>) -> Result<Cli, clap::Error> {
    let mut device = None;
    let mut specs = Vec::new();

    for (index, section) in split_notes(argv).into_iter().enumerate() {
        let command = if index == 0 {
            note_command()
        } else {
            note_command().no_binary_name(true)
        };
        let matches = command.try_get_matches_from(section)?;
        if let Some(path) = matches.get_one::<PathBuf>("device") {
            device = Some(path.clone());
        }
        specs.push(note_spec(&matches));
    }

    Ok(Cli {
        device,
        sequence: ToneSequence::from_specs(specs),
    })
}

/// Split argv into per-note argument lists, cutting at each
/// `-n`/`--new`
///
/// The first list keeps the binary name; a trailing separator yields
/// one more, all-default note.
fn split_notes(argv: Vec<String>) -> Vec<Vec<String>> {
    let mut sections = Vec::new();
    let mut current = Vec::new();
    for arg in argv {
        if arg == "-n" || arg == "--new" {
            sections.push(mem::take(&mut current));
        } else {
            current.push(arg);
        }
    }
    sections.push(current);
    sections
}

fn note_command() -> Command {
    Command::new("pcbeep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Play tone sequences through the PC speaker")
        .after_help(
            "Job control signals steer playback: SIGTSTP pauses, SIGCONT \
             resumes, and SIGHUP/SIGINT/SIGTERM stop it with the speaker \
             silenced.",
        )
        .arg(
            Arg::new("frequency")
                .short('f')
                .long("frequency")
                .value_name("HZ")
                .help("Tone frequency in Hz")
                .value_parser(value_parser!(u16).range(1..=20000))
                .overrides_with("frequency")
                .default_value("440"),
        )
        .arg(
            Arg::new("length")
                .short('l')
                .long("length")
                .value_name("MS")
                .help("Tone length in milliseconds")
                .value_parser(value_parser!(u64))
                .overrides_with("length")
                .default_value("200"),
        )
        .arg(
            Arg::new("repeats")
                .short('r')
                .long("repeats")
                .value_name("COUNT")
                .help("How many times to repeat the tone")
                .value_parser(value_parser!(u32).range(1..))
                .overrides_with("repeats")
                .default_value("1"),
        )
        .arg(
            Arg::new("delay")
                .short('d')
                .long("delay")
                .value_name("MS")
                .help("Delay between repetitions in milliseconds")
                .value_parser(value_parser!(u64))
                .overrides_with_all(["delay", "delay-after"])
                .default_value("100"),
        )
        .arg(
            Arg::new("delay-after")
                .short('D')
                .long("delay-after")
                .value_name("MS")
                .help("Like -d, but the delay also follows the last repetition")
                .value_parser(value_parser!(u64))
                .overrides_with_all(["delay-after", "delay"]),
        )
        .arg(
            Arg::new("new")
                .short('n')
                .long("new")
                .action(ArgAction::SetTrue)
                .help("End this note and start a new one with default values"),
        )
        .arg(
            Arg::new("device")
                .short('e')
                .long("device")
                .value_name("PATH")
                .help("Beep device to use instead of probing")
                .value_parser(value_parser!(PathBuf))
                .overrides_with("device"),
        )
}

fn note_spec(matches: &ArgMatches) -> ToneSpec {
    let freq_hz = matches
        .get_one::<u16>("frequency")
        .copied()
        .unwrap_or(DEFAULT_FREQ_HZ);
    let length_ms = matches
        .get_one::<u64>("length")
        .copied()
        .unwrap_or(DEFAULT_LENGTH_MS);
    let reps = matches
        .get_one::<u32>("repeats")
        .copied()
        .unwrap_or(DEFAULT_REPS);

    // Whichever of -d/-D came later on the line wins; clap clears the
    // loser's occurrences, leaving only its default behind.
    let (delay_ms, end_delay) =
        if matches.value_source("delay-after") == Some(ValueSource::CommandLine) {
            let ms = matches
                .get_one::<u64>("delay-after")
                .copied()
                .unwrap_or(DEFAULT_DELAY_MS);
            (ms, EndDelay::Yes)
        } else {
            let ms = matches
                .get_one::<u64>("delay")
                .copied()
                .unwrap_or(DEFAULT_DELAY_MS);
            (ms, EndDelay::No)
        };

    ToneSpec {
        freq_hz,
        length: Duration::from_millis(length_ms),
        reps,
        delay: Duration::from_millis(delay_ms),
        end_delay,
    }
}
