/*!
# WarpClip Core

This crate builds a sample-time/beat-time warp map for a mono IEEE-float WAV
clip, driven by a causal onset-peak detector, and estimates a naive BPM from
the resulting peak list.

Three independent layers compose into [`Clip`]:

* [`wave`] reads the RIFF/WAVE header and raw samples.
* [`peak`] turns a window of raw samples into zero or more onset [`Peak`]s.
* [`warp`] holds user- and detector-derived [`WarpMarker`]s in a dual-indexed
  [`WarpMap`], queryable by either sample time or beat time.

[`Clip`] ties the three together: it owns the audio format, the peak list,
and the warp map, and exposes the sample↔beat time conversions and BPM
estimate the rest of the program actually wants.
*/

#![forbid(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	trivial_casts,
	trivial_numeric_casts,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod clip;
mod error;
mod format;
mod numeric;
mod peak;
mod warp;
mod wave;

pub use clip::Clip;
pub use error::WarpClipError;
pub use format::AudioInfo;
pub use numeric::{
	almost_equal,
	is_valid_time,
	linear_map,
	round,
	TIME_ABSOLUTE_TOLERANCE,
	TIME_RELATIVE_TOLERANCE,
	TIME_TOLERANCE,
};
pub use peak::{
	Peak,
	PeakDetector,
	SimplePeakDetector,
};
pub use warp::{
	WarpMap,
	WarpMarker,
};
pub use wave::{
	read_format,
	read_samples,
};



/// # Default Sample Rate (Hz).
///
/// Used only to size [`numeric::TIME_TOLERANCE`]; actual clips may declare
/// any sample rate in their WAVE header.
pub const SR0: u32 = 44_100;

/// # Analysis Window Size (Samples).
///
/// Every call into the peak detector is handed exactly this many samples,
/// with the tail of the clip zero-padded to fill the window if needed.
pub const INPUT_WINDOW_SIZE: usize = 65_536;

/// # Analysis Window Overlap Offset (Samples).
///
/// Successive windows advance by `INPUT_WINDOW_SIZE - INPUT_WINDOW_OFFSET`
/// samples, not a full window, so an onset straddling a window boundary is
/// never missed: the tail `INPUT_WINDOW_OFFSET` samples of one window are
/// re-analyzed as the head of the next.
pub const INPUT_WINDOW_OFFSET: usize = 4_096;
