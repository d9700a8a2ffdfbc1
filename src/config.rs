//! Command line configuration.
//!
//! Builds the argument parser and turns its matches into [`Settings`].
use std::time::Duration;

use anyhow::{Result, ensure};
use clap::{Arg, ArgAction, ArgMatches, Command, crate_version, value_parser};

use crate::keyer::{DEFAULT_COMMIT_DELAY, DEFAULT_DOT_THRESHOLD, KeyerConfig};
use crate::tone::{DEFAULT_FREQUENCY_HZ, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ, ToneConfig};

/// What the program was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action
{
    /// Run the interactive terminal UI
    Interactive,
    /// Encode the given words, or stdin when empty
    Encode(Vec<String>),
    /// Decode the given tokens, or stdin when empty
    Decode(Vec<String>),
    /// Remove the log files and exit
    ClearLog,
}

/// Settings for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings
{
    /// Keying thresholds
    pub keyer: KeyerConfig,
    /// Sidetone parameters
    pub tone: ToneConfig,
    /// Start with the key muted
    pub start_muted: bool,
    /// Use the audio device at all
    pub audio_enabled: bool,
}

impl Default for Settings
{
    fn default() -> Self
    {
        Self {
            keyer: KeyerConfig::default(),
            tone: ToneConfig::default(),
            start_muted: false,
            audio_enabled: true,
        }
    }
}

/// Builds the command line parser.
#[must_use]
pub fn command() -> Command
{
    Command::new("tactical_morse")
        .about("A terminal Morse code encoder/decoder with a telegraph key")
        .version(crate_version!())
        .after_help(
            "Without a subcommand the interactive key is started. Hold the left mouse button \
             on the key: short presses are dots, long presses dashes.",
        )
        .subcommand(
            Command::new("encode")
                .about("Encode text to Morse and print it")
                .arg(
                    Arg::new("text")
                        .help("Text to encode, read from stdin when omitted")
                        .value_name("TEXT")
                        .num_args(0..),
                ),
        )
        .subcommand(
            Command::new("decode")
                .about("Decode Morse to text and print it")
                .arg(
                    Arg::new("morse")
                        .help("Morse tokens to decode, read from stdin when omitted")
                        .value_name("MORSE")
                        .allow_hyphen_values(true)
                        .num_args(0..),
                ),
        )
        .arg(
            Arg::new("mute")
                .long("mute")
                .short('m')
                .help("Start with the key muted")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-audio")
                .long("no-audio")
                .help("Never open the audio device")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("frequency")
                .long("frequency")
                .short('f')
                .help("Sidetone pitch in hertz")
                .value_name("HZ")
                .value_parser(value_parser!(f32))
                .default_value("600"),
        )
        .arg(
            Arg::new("dot-threshold")
                .long("dot-threshold")
                .help("Presses shorter than this many milliseconds are dots")
                .value_name("MS")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("200"),
        )
        .arg(
            Arg::new("commit-delay")
                .long("commit-delay")
                .help("Milliseconds of silence before a keyed character is committed")
                .value_name("MS")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("600"),
        )
        .arg(
            Arg::new("clear-log")
                .long("clear-log")
                .help("Remove the log files and exit")
                .action(ArgAction::SetTrue),
        )
}

/// Extracts the requested action.
#[must_use]
pub fn action(matches: &ArgMatches) -> Action
{
    if matches.get_flag("clear-log")
    {
        return Action::ClearLog;
    }

    match matches.subcommand()
    {
        Some(("encode", sub)) => Action::Encode(collect_words(sub, "text")),
        Some(("decode", sub)) => Action::Decode(collect_words(sub, "morse")),
        _ => Action::Interactive,
    }
}

/// Collects the positional words of a subcommand.
fn collect_words(matches: &ArgMatches, id: &str) -> Vec<String>
{
    matches
        .get_many::<String>(id)
        .map(|words| words.cloned().collect())
        .unwrap_or_default()
}

impl Settings
{
    /// Builds settings from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the pitch is out of range or the commit delay does
    /// not exceed the dot threshold.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self>
    {
        let defaults = Self::default();

        let frequency_hz = matches
            .get_one::<f32>("frequency")
            .copied()
            .unwrap_or(DEFAULT_FREQUENCY_HZ);
        ensure!(
            (MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&frequency_hz),
            "Frequency must be between {MIN_FREQUENCY_HZ} and {MAX_FREQUENCY_HZ} Hz, got \
             {frequency_hz}"
        );

        let dot_threshold = matches
            .get_one::<u64>("dot-threshold")
            .map_or(DEFAULT_DOT_THRESHOLD, |millis| Duration::from_millis(*millis));
        let commit_delay = matches
            .get_one::<u64>("commit-delay")
            .map_or(DEFAULT_COMMIT_DELAY, |millis| Duration::from_millis(*millis));
        ensure!(
            commit_delay > dot_threshold,
            "Commit delay ({}ms) must be longer than the dot threshold ({}ms)",
            commit_delay.as_millis(),
            dot_threshold.as_millis()
        );

        Ok(Self {
            keyer: KeyerConfig {
                dot_threshold,
                commit_delay,
            },
            tone: ToneConfig {
                frequency_hz,
                ..defaults.tone
            },
            start_muted: matches.get_flag("mute"),
            audio_enabled: !matches.get_flag("no-audio"),
        })
    }
}
