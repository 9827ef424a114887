/*!
# WarpClip: CLI
*/

use argyle::{
	Argue,
	FLAG_HELP,
	FLAG_VERSION,
};
use std::path::PathBuf;
use warpclip_core::WarpClipError;



/// # Parsed Options.
pub(super) struct Options {
	/// # Path To The `.wav` File.
	pub(super) path: PathBuf,

	/// # User-Supplied Warp Markers (Sample Time, Beat Time).
	pub(super) markers: Vec<(f64, f64)>,

	/// # Table Step (Seconds).
	pub(super) step: f64,

	/// # Suppress The Sample/Beat Tables.
	pub(super) quiet: bool,
}



/// # Parse CLI Arguments.
pub(super) fn parse() -> Result<Options, WarpClipError> {
	let args = Argue::new(FLAG_HELP | FLAG_VERSION)?;

	if let Some(boo) = args.check_keys(
		&[
			b"-q",
			b"--quiet",
		],
		&[
			b"-m",
			b"--marker",
			b"-s",
			b"--step",
		],
	) {
		return Err(WarpClipError::CliArg(String::from_utf8_lossy(boo).into_owned()));
	}

	let quiet = args.switch2(b"-q", b"--quiet");

	let step = match args.option2(b"-s", b"--step") {
		Some(v) => parse_step(v)?,
		None => 0.1,
	};

	let mut markers = Vec::new();
	for raw in args.option2_values(b"-m", b"--marker", None) {
		markers.push(parse_marker(raw)?);
	}

	let path = args.args_os()
		.next()
		.map(PathBuf::from)
		.ok_or(WarpClipError::CliParse("<FILE>"))?;

	Ok(Options { path, markers, step, quiet })
}



/// # Parse `-s`/`--step`.
fn parse_step(raw: &[u8]) -> Result<f64, WarpClipError> {
	std::str::from_utf8(raw).ok()
		.and_then(|s| s.trim().parse::<f64>().ok())
		.filter(|v| v.is_finite() && *v > 0.0)
		.ok_or(WarpClipError::CliParse("-s/--step"))
}

/// # Parse A `-m`/`--marker` Value.
///
/// Expects `"<SAMPLE_TIME>,<BEAT_TIME>"`, e.g. `"1.0,2.0"`.
fn parse_marker(raw: &[u8]) -> Result<(f64, f64), WarpClipError> {
	let raw = std::str::from_utf8(raw).map_err(|_| WarpClipError::CliParse("-m/--marker"))?;
	let (sample_time, beat_time) = raw.split_once(',')
		.ok_or(WarpClipError::CliParse("-m/--marker"))?;

	let sample_time: f64 = sample_time.trim().parse()
		.map_err(|_| WarpClipError::CliParse("-m/--marker"))?;
	let beat_time: f64 = beat_time.trim().parse()
		.map_err(|_| WarpClipError::CliParse("-m/--marker"))?;

	Ok((sample_time, beat_time))
}
