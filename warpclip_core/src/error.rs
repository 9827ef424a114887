/*!
# WarpClip: Errors
*/

use std::{
	error::Error,
	fmt,
};



#[cfg(feature = "bin")]
/// # Help Text.
const HELP: &str = concat!(r#"
     .  .
    /|\/|\    "#, "WarpClip", " v", env!("CARGO_PKG_VERSION"), r#"
   ( o  o )   Sample-time/beat-time warp maps
    \  ~  /   and naive onset-peak BPM estimation.
     `--'

USAGE:
    warpclip [OPTIONS] <FILE>

OPTIONS:
    -h, --help           Print help information and exit.
    -m, --marker <S,B>   Add a user warp marker (sample time, beat time, in
                         seconds) before printing the tables. May be repeated.
    -q, --quiet          Suppress the per-sample/per-beat tables; print only
                         the duration and BPM summary.
    -s, --step <SECS>    Granularity, in seconds, of the printed sample/beat
                         tables. [default: 0.1]
    -V, --version        Print version information and exit.

ARGS:
    <FILE>                Path to a mono IEEE-float .wav file.
"#);



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
pub enum WarpClipError {
	/// # Path does not end in ".wav".
	MissingExtension,

	/// # Unable to open or read the file.
	IoFailure,

	/// # Malformed RIFF/WAVE header.
	MalformedWave(&'static str),

	/// # The clip's `AudioInfo` failed validation.
	InvalidAudioInfo,

	/// # A warp marker failed add-validation.
	MarkerRejected(&'static str),

	/// # Not enough peaks, or a degenerate sample rate/interval, for BPM.
	BpmUnavailable,

	#[cfg(feature = "bin")]
	/// # Invalid CLI argument.
	CliArg(String),

	#[cfg(feature = "bin")]
	/// # CLI parsing failure.
	CliParse(&'static str),

	#[cfg(feature = "bin")]
	/// # Print Help (Not an Error).
	PrintHelp,

	#[cfg(feature = "bin")]
	/// # Print Version (Not an Error).
	PrintVersion,
}

impl Error for WarpClipError {}

impl fmt::Display for WarpClipError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingExtension => f.write_str("File path does not end in \".wav\"."),
			Self::IoFailure => f.write_str("Unable to open or read the file."),
			Self::MalformedWave(s) => write!(f, "Malformed WAVE file: {s}."),
			Self::InvalidAudioInfo => f.write_str("Audio format info is invalid."),
			Self::MarkerRejected(s) => write!(f, "Warp marker rejected: {s}."),
			Self::BpmUnavailable => f.write_str("Not enough peaks to estimate a BPM."),

			#[cfg(feature = "bin")]
			Self::CliArg(s) => write!(f, "Invalid CLI option: {s}"),

			#[cfg(feature = "bin")]
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),

			#[cfg(feature = "bin")]
			Self::PrintHelp => f.write_str(HELP),

			#[cfg(feature = "bin")]
			Self::PrintVersion => f.write_str(concat!("WarpClip v", env!("CARGO_PKG_VERSION"))),
		}
	}
}

#[cfg(feature = "bin")]
impl From<argyle::ArgyleError> for WarpClipError {
	fn from(err: argyle::ArgyleError) -> Self {
		match err {
			argyle::ArgyleError::WantsHelp => Self::PrintHelp,
			argyle::ArgyleError::WantsVersion => Self::PrintVersion,
			_ => Self::CliParse("command-line arguments"),
		}
	}
}

impl From<WarpClipError> for fyi_msg::Msg {
	fn from(src: WarpClipError) -> Self { Self::error(src.to_string()) }
}
